use tracing::{debug, warn};

use crate::models::{QueueError, VisitStatus};

/// The canonical visit state machine. The admin console and the doctor
/// session workflow both drive visits through this one machine.
pub struct VisitLifecycleService;

impl VisitLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// All valid next statuses for a given current status.
    ///
    /// `Waiting -> InService` exists because calling the next patient from a
    /// doctor session skips the front-desk check-in; the console itself only
    /// offers [`next_action`](Self::next_action).
    pub fn valid_transitions(&self, current: &VisitStatus) -> Vec<VisitStatus> {
        match current {
            VisitStatus::Waiting => vec![VisitStatus::CheckedIn, VisitStatus::InService],
            VisitStatus::CheckedIn => vec![VisitStatus::InService],
            VisitStatus::InService => vec![VisitStatus::Completed],
            // Terminal and side states: only the administrative override
            // moves a visit out of these.
            VisitStatus::Completed | VisitStatus::Held | VisitStatus::Expired => vec![],
        }
    }

    /// The single next step the admin console offers for a row.
    pub fn next_action(&self, current: &VisitStatus) -> Option<VisitStatus> {
        match current {
            VisitStatus::Waiting => Some(VisitStatus::CheckedIn),
            VisitStatus::CheckedIn => Some(VisitStatus::InService),
            VisitStatus::InService => Some(VisitStatus::Completed),
            VisitStatus::Completed | VisitStatus::Held | VisitStatus::Expired => None,
        }
    }

    pub fn validate_transition(
        &self,
        current: &VisitStatus,
        new: &VisitStatus,
    ) -> Result<(), QueueError> {
        debug!("Validating visit transition {} -> {}", current, new);

        if !self.valid_transitions(current).contains(new) {
            warn!("Invalid visit transition attempted: {} -> {}", current, new);
            return Err(QueueError::InvalidTransition {
                from: *current,
                to: *new,
            });
        }

        Ok(())
    }

    /// Targets the administrative override accepts. `held` and `expired` are
    /// reachable only this way; `waiting` releases a hold.
    pub fn validate_override(&self, target: &VisitStatus) -> Result<(), QueueError> {
        match target {
            VisitStatus::Held | VisitStatus::Expired | VisitStatus::Waiting => Ok(()),
            other => Err(QueueError::InvalidOverride(*other)),
        }
    }
}

impl Default for VisitLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
