use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveTime};
use std::fmt;

use queue_cell::models::{QueueError, Visit};

// ==============================================================================
// DOCTOR MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    /// Maps one-to-one onto a department name.
    pub specialization: String,
    pub status: DoctorStatus,
    pub available_days: Vec<String>,
    pub available_hours: AvailableHours,
    pub max_patients_per_day: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoctorStatus {
    Active,
    Inactive,
    OnLeave,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

// ==============================================================================
// SESSION MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSession {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub session_status: SessionStatus,
    pub current_patient_id: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Inactive,
    Break,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Inactive => write!(f, "inactive"),
            SessionStatus::Break => write!(f, "break"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: Uuid,
    pub session_id: Uuid,
    pub visit_id: Uuid,
    pub status: ConsultationStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationStatus {
    Waiting,
    InProgress,
    Completed,
    Cancelled,
}

impl fmt::Display for ConsultationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsultationStatus::Waiting => write!(f, "waiting"),
            ConsultationStatus::InProgress => write!(f, "in_progress"),
            ConsultationStatus::Completed => write!(f, "completed"),
            ConsultationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub doctor_id: Uuid,
}

/// What "call next" hands back: the visit now in service and the
/// consultation opened for it. `None` when the queue is empty.
#[derive(Debug, Clone, Serialize)]
pub struct CalledPatient {
    pub visit: Visit,
    pub consultation: Consultation,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Consultation not found")]
    ConsultationNotFound,

    #[error("Invalid session transition from {from} to {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },

    #[error("Session is {0}, not active")]
    SessionNotActive(SessionStatus),

    #[error("Consultation is {0}, not in progress")]
    ConsultationState(ConsultationStatus),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("Database error: {0}")]
    Database(String),
}
