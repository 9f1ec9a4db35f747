use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::NaiveDate;
use std::fmt;

use queue_cell::models::PaymentStatus;

/// The patient-facing booking form, as submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookVisitRequest {
    pub name: String,
    pub age: i32,
    pub phone: String,
    pub department: String,
    pub doctor_id: Option<Uuid>,
    pub payment_mode: PaymentMode,
    pub email: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub blood_group: Option<String>,
    /// Free text, comma separated.
    pub allergies: Option<String>,
    /// Free text, comma separated.
    pub medical_conditions: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    PayNow,
    PayAtClinic,
}

/// What the confirmation screen renders after a successful booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub visit_id: Uuid,
    pub patient_uid: String,
    pub stn: i32,
    pub department: String,
    pub visit_date: NaiveDate,
    pub qr_payload: String,
    pub payment_status: PaymentStatus,
    pub now_serving: i32,
    pub position: i32,
    pub estimated_wait_minutes: i32,
    /// True routes the client to the payment step before the final screen.
    pub requires_payment: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum BookingError {
    #[error("Validation failed: {}", format_issues(.0))]
    Validation(Vec<FieldIssue>),

    #[error("The clinic is currently under maintenance")]
    Maintenance,

    #[error("Online payments are not enabled")]
    OnlinePaymentsDisabled,

    #[error("Could not allocate a token number, please try again")]
    SequenceContention,

    #[error("Database error: {0}")]
    Database(String),
}

fn format_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
