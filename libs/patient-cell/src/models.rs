use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    /// Clinic-scoped human-readable identifier, assigned at registration.
    pub uid: String,
    pub name: String,
    pub age: i32,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub blood_group: Option<String>,
    pub allergies: Option<Vec<String>>,
    pub medical_conditions: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Patient details as the booking form collects them. Allergies and
/// conditions arrive as free-text comma-separated strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientIntake {
    pub name: String,
    pub age: i32,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub blood_group: Option<String>,
    pub allergies: Option<String>,
    pub medical_conditions: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientSearchQuery {
    pub phone: Option<String>,
    pub uid: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),
}
