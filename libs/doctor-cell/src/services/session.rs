use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use audit_cell::{AuditAction, AuditService};
use queue_cell::models::VisitStatus;
use queue_cell::services::VisitService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::clock::{Clock, SystemClock};

use crate::models::{
    CalledPatient, Consultation, ConsultationStatus, DoctorSession, SessionError, SessionStatus,
};
use crate::services::doctor::DoctorService;

/// Valid next statuses for a session. A session pauses and resumes between
/// `active` and `break`; `inactive` ends that session instance for good.
pub fn valid_session_transitions(current: &SessionStatus) -> Vec<SessionStatus> {
    match current {
        SessionStatus::Active => vec![SessionStatus::Break, SessionStatus::Inactive],
        SessionStatus::Break => vec![SessionStatus::Active, SessionStatus::Inactive],
        SessionStatus::Inactive => vec![],
    }
}

pub fn validate_session_transition(
    current: &SessionStatus,
    new: &SessionStatus,
) -> Result<(), SessionError> {
    if !valid_session_transitions(current).contains(new) {
        warn!("Invalid session transition attempted: {} -> {}", current, new);
        return Err(SessionError::InvalidTransition {
            from: *current,
            to: *new,
        });
    }
    Ok(())
}

/// Whole minutes between start and completion, truncated.
pub fn consultation_duration_minutes(
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
) -> i64 {
    (completed_at - started_at).num_minutes().max(0)
}

pub struct SessionService {
    supabase: Arc<SupabaseClient>,
    visits: VisitService,
    doctors: DoctorService,
    audit: AuditService,
    clock: Arc<dyn Clock>,
}

impl SessionService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            visits: VisitService::with_clock(config, Arc::clone(&clock)),
            doctors: DoctorService::new(config),
            audit: AuditService::new(config),
            clock,
        }
    }

    /// Open a working session. Any session the doctor still has in `active`
    /// or `break` is force-closed first, so at most one is ever live.
    pub async fn start_session(
        &self,
        doctor_id: Uuid,
        actor: &str,
        auth_token: Option<&str>,
    ) -> Result<DoctorSession, SessionError> {
        let doctor = self.doctors.get_doctor(doctor_id, auth_token).await?;
        let now = self.clock.now();

        let close_path = format!(
            "/rest/v1/doctor_sessions?doctor_id=eq.{}&session_status=in.(active,break)",
            doctor_id
        );
        let closed: Vec<Value> = self
            .supabase
            .request_returning(
                Method::PATCH,
                &close_path,
                auth_token,
                Some(json!({ "session_status": "inactive", "ended_at": now.to_rfc3339() })),
            )
            .await
            .map_err(|e| SessionError::Database(e.to_string()))?;

        if !closed.is_empty() {
            debug!("Force-closed {} stale session(s) for doctor {}", closed.len(), doctor_id);
        }

        let body = json!({
            "doctor_id": doctor_id,
            "session_status": "active",
            "current_patient_id": null,
            "started_at": now.to_rfc3339(),
            "ended_at": null
        });

        let rows: Vec<Value> = self
            .supabase
            .request_returning(Method::POST, "/rest/v1/doctor_sessions", auth_token, Some(body))
            .await
            .map_err(|e| SessionError::Database(e.to_string()))?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| SessionError::Database("Session insert returned no row".to_string()))?;
        let session: DoctorSession =
            serde_json::from_value(row).map_err(|e| SessionError::Database(e.to_string()))?;

        info!("Doctor {} ({}) started session {}", doctor.name, doctor_id, session.id);

        self.audit
            .record(
                actor,
                AuditAction::SessionStarted,
                "doctor_session",
                &session.id.to_string(),
                json!({ "doctor_id": doctor_id }),
                auth_token,
            )
            .await;

        Ok(session)
    }

    pub async fn pause_session(
        &self,
        session_id: Uuid,
        actor: &str,
        auth_token: Option<&str>,
    ) -> Result<DoctorSession, SessionError> {
        self.transition_session(session_id, SessionStatus::Break, AuditAction::SessionPaused, actor, auth_token)
            .await
    }

    pub async fn resume_session(
        &self,
        session_id: Uuid,
        actor: &str,
        auth_token: Option<&str>,
    ) -> Result<DoctorSession, SessionError> {
        self.transition_session(session_id, SessionStatus::Active, AuditAction::SessionResumed, actor, auth_token)
            .await
    }

    pub async fn end_session(
        &self,
        session_id: Uuid,
        actor: &str,
        auth_token: Option<&str>,
    ) -> Result<DoctorSession, SessionError> {
        self.transition_session(session_id, SessionStatus::Inactive, AuditAction::SessionEnded, actor, auth_token)
            .await
    }

    /// Pull the lowest waiting token into service and open a consultation
    /// for it. Returns `None` when nobody is waiting.
    pub async fn call_next(
        &self,
        session_id: Uuid,
        actor: &str,
        auth_token: Option<&str>,
    ) -> Result<Option<CalledPatient>, SessionError> {
        let session = self.get_session(session_id, auth_token).await?;
        if session.session_status != SessionStatus::Active {
            return Err(SessionError::SessionNotActive(session.session_status));
        }

        let doctor = self.doctors.get_doctor(session.doctor_id, auth_token).await?;

        let waiting = self
            .visits
            .waiting_for_doctor(doctor.id, &doctor.specialization, self.clock.today(), auth_token)
            .await?;

        let Some(next) = waiting.into_iter().next() else {
            debug!("No waiting visits for doctor {}", doctor.id);
            return Ok(None);
        };

        let visit = self
            .visits
            .transition(next.id, VisitStatus::InService, actor, auth_token)
            .await?;

        let body = json!({
            "session_id": session_id,
            "visit_id": visit.id,
            "status": "in_progress",
            "started_at": self.clock.now().to_rfc3339(),
            "completed_at": null,
            "duration_minutes": null
        });

        let rows: Vec<Value> = self
            .supabase
            .request_returning(Method::POST, "/rest/v1/consultations", auth_token, Some(body))
            .await
            .map_err(|e| SessionError::Database(e.to_string()))?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| SessionError::Database("Consultation insert returned no row".to_string()))?;
        let consultation: Consultation =
            serde_json::from_value(row).map_err(|e| SessionError::Database(e.to_string()))?;

        self.patch_session(
            session_id,
            json!({ "current_patient_id": visit.patient_id }),
            auth_token,
        )
        .await?;

        self.audit
            .record(
                actor,
                AuditAction::ConsultationStarted,
                "consultation",
                &consultation.id.to_string(),
                json!({ "visit_id": visit.id, "stn": visit.stn }),
                auth_token,
            )
            .await;

        Ok(Some(CalledPatient { visit, consultation }))
    }

    /// Close out the consultation and the visit underneath it.
    pub async fn complete_consultation(
        &self,
        consultation_id: Uuid,
        actor: &str,
        auth_token: Option<&str>,
    ) -> Result<Consultation, SessionError> {
        let consultation = self.get_consultation(consultation_id, auth_token).await?;
        if consultation.status != ConsultationStatus::InProgress {
            return Err(SessionError::ConsultationState(consultation.status));
        }

        let now = self.clock.now();
        let duration = consultation_duration_minutes(consultation.started_at, now);

        let patch = json!({
            "status": "completed",
            "completed_at": now.to_rfc3339(),
            "duration_minutes": duration
        });

        let path = format!("/rest/v1/consultations?id=eq.{}", consultation_id);
        let rows: Vec<Value> = self
            .supabase
            .request_returning(Method::PATCH, &path, auth_token, Some(patch))
            .await
            .map_err(|e| SessionError::Database(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(SessionError::ConsultationNotFound)?;
        let updated: Consultation =
            serde_json::from_value(row).map_err(|e| SessionError::Database(e.to_string()))?;

        self.visits
            .transition(consultation.visit_id, VisitStatus::Completed, actor, auth_token)
            .await?;

        self.patch_session(
            consultation.session_id,
            json!({ "current_patient_id": null }),
            auth_token,
        )
        .await?;

        self.audit
            .record(
                actor,
                AuditAction::ConsultationCompleted,
                "consultation",
                &consultation_id.to_string(),
                json!({ "visit_id": consultation.visit_id, "duration_minutes": duration }),
                auth_token,
            )
            .await;

        Ok(updated)
    }

    pub async fn get_session(
        &self,
        id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<DoctorSession, SessionError> {
        let path = format!("/rest/v1/doctor_sessions?id=eq.{}", id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| SessionError::Database(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(SessionError::SessionNotFound)?;
        serde_json::from_value(row).map_err(|e| SessionError::Database(e.to_string()))
    }

    async fn get_consultation(
        &self,
        id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Consultation, SessionError> {
        let path = format!("/rest/v1/consultations?id=eq.{}", id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| SessionError::Database(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(SessionError::ConsultationNotFound)?;
        serde_json::from_value(row).map_err(|e| SessionError::Database(e.to_string()))
    }

    async fn transition_session(
        &self,
        session_id: Uuid,
        to: SessionStatus,
        action: AuditAction,
        actor: &str,
        auth_token: Option<&str>,
    ) -> Result<DoctorSession, SessionError> {
        let session = self.get_session(session_id, auth_token).await?;
        validate_session_transition(&session.session_status, &to)?;

        let mut patch = serde_json::Map::new();
        patch.insert("session_status".to_string(), json!(to));
        if to == SessionStatus::Inactive {
            patch.insert("ended_at".to_string(), json!(self.clock.now().to_rfc3339()));
        }

        let updated = self
            .patch_session(session_id, Value::Object(patch), auth_token)
            .await?;

        self.audit
            .record(
                actor,
                action,
                "doctor_session",
                &session_id.to_string(),
                json!({ "from": session.session_status, "to": to }),
                auth_token,
            )
            .await;

        Ok(updated)
    }

    async fn patch_session(
        &self,
        session_id: Uuid,
        patch: Value,
        auth_token: Option<&str>,
    ) -> Result<DoctorSession, SessionError> {
        let path = format!("/rest/v1/doctor_sessions?id=eq.{}", session_id);
        let rows: Vec<Value> = self
            .supabase
            .request_returning(Method::PATCH, &path, auth_token, Some(patch))
            .await
            .map_err(|e| SessionError::Database(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(SessionError::SessionNotFound)?;
        serde_json::from_value(row).map_err(|e| SessionError::Database(e.to_string()))
    }
}
