use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate};
use std::fmt;

// ==============================================================================
// VISIT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub id: Uuid,
    pub patient_id: Uuid,
    /// Sequence token number, unique within (department, visit_date).
    pub stn: i32,
    pub department: String,
    pub visit_date: NaiveDate,
    pub status: VisitStatus,
    pub payment_status: PaymentStatus,
    pub qr_payload: String,
    pub doctor_id: Option<Uuid>,
    pub notes: Option<String>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    Waiting,
    CheckedIn,
    InService,
    Completed,
    Held,
    Expired,
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisitStatus::Waiting => write!(f, "waiting"),
            VisitStatus::CheckedIn => write!(f, "checked_in"),
            VisitStatus::InService => write!(f, "in_service"),
            VisitStatus::Completed => write!(f, "completed"),
            VisitStatus::Held => write!(f, "held"),
            VisitStatus::Expired => write!(f, "expired"),
        }
    }
}

impl VisitStatus {
    /// Waiting-like statuses count towards the queue length.
    pub fn is_waiting_like(&self) -> bool {
        matches!(self, VisitStatus::Waiting | VisitStatus::CheckedIn)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Pending,
    PayAtClinic,
    Refunded,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::PayAtClinic => write!(f, "pay_at_clinic"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    Online,
    Insurance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub visit_id: Uuid,
    pub amount: f64,
    pub method: PaymentMethod,
    pub recorded_by: String,
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// QUEUE STATUS
// ==============================================================================

/// The reduction every screen shows: the token currently being served and
/// how many visits are still in line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub now_serving: i32,
    pub total_waiting: i64,
}

impl QueueSnapshot {
    pub fn empty() -> Self {
        Self { now_serving: 0, total_waiting: 0 }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct QueueStatusQuery {
    pub department: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisitListQuery {
    pub department: Option<String>,
    pub status: Option<VisitStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub to: VisitStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideRequest {
    pub to: VisitStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPaymentRequest {
    pub amount: f64,
    pub method: PaymentMethod,
}

/// A visit row as the admin console renders it: the row plus the single
/// next legal action the console may offer for it.
#[derive(Debug, Clone, Serialize)]
pub struct VisitWithAction {
    #[serde(flatten)]
    pub visit: Visit,
    pub next_action: Option<VisitStatus>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum QueueError {
    #[error("Visit not found")]
    NotFound,

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: VisitStatus, to: VisitStatus },

    #[error("Status {0} is not an override target")]
    InvalidOverride(VisitStatus),

    #[error("Token could not be read")]
    InvalidToken,

    #[error("Token is not valid for today")]
    TokenNotForToday,

    #[error("Token does not match the visit record")]
    TokenMismatch,

    #[error("Visit is {0}, not waiting for check-in")]
    NotAwaitingCheckIn(VisitStatus),

    #[error("Payment status {0} does not allow this action")]
    PaymentState(PaymentStatus),

    #[error("Database error: {0}")]
    Database(String),
}
