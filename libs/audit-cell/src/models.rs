use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    VisitBooked,
    VisitStatusChanged,
    VisitOverridden,
    VisitCheckedIn,
    PaymentRecorded,
    PaymentMarkedPaid,
    SessionStarted,
    SessionPaused,
    SessionResumed,
    SessionEnded,
    ConsultationStarted,
    ConsultationCompleted,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AuditAction::VisitBooked => "visit_booked",
            AuditAction::VisitStatusChanged => "visit_status_changed",
            AuditAction::VisitOverridden => "visit_overridden",
            AuditAction::VisitCheckedIn => "visit_checked_in",
            AuditAction::PaymentRecorded => "payment_recorded",
            AuditAction::PaymentMarkedPaid => "payment_marked_paid",
            AuditAction::SessionStarted => "session_started",
            AuditAction::SessionPaused => "session_paused",
            AuditAction::SessionResumed => "session_resumed",
            AuditAction::SessionEnded => "session_ended",
            AuditAction::ConsultationStarted => "consultation_started",
            AuditAction::ConsultationCompleted => "consultation_completed",
        };
        write!(f, "{}", label)
    }
}
