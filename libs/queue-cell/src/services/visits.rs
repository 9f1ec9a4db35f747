use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use audit_cell::{AuditAction, AuditService};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::clock::{Clock, SystemClock};
use shared_utils::token::parse_token;

use crate::models::{QueueError, Visit, VisitStatus, VisitWithAction};
use crate::services::lifecycle::VisitLifecycleService;

pub struct VisitService {
    supabase: Arc<SupabaseClient>,
    lifecycle: VisitLifecycleService,
    audit: AuditService,
    clock: Arc<dyn Clock>,
}

impl VisitService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            lifecycle: VisitLifecycleService::new(),
            audit: AuditService::new(config),
            clock,
        }
    }

    /// Today's visits for the admin console, each annotated with the single
    /// next legal transition.
    pub async fn list_today(
        &self,
        department: Option<&str>,
        status: Option<VisitStatus>,
        auth_token: Option<&str>,
    ) -> Result<Vec<VisitWithAction>, QueueError> {
        let today = self.clock.today();
        let mut path = format!("/rest/v1/visits?visit_date=eq.{}", today.format("%Y-%m-%d"));
        if let Some(dept) = department {
            path.push_str(&format!("&department=eq.{}", urlencoding::encode(dept)));
        }
        if let Some(status) = status {
            path.push_str(&format!("&status=eq.{}", status));
        }
        path.push_str("&order=stn.asc");

        debug!("Listing visits: {}", path);

        let visits = self.fetch_visits(&path, auth_token).await?;

        Ok(visits
            .into_iter()
            .map(|visit| {
                let next_action = self.lifecycle.next_action(&visit.status);
                VisitWithAction { visit, next_action }
            })
            .collect())
    }

    pub async fn get_visit(&self, id: Uuid, auth_token: Option<&str>) -> Result<Visit, QueueError> {
        let path = format!("/rest/v1/visits?id=eq.{}", id);
        let visits = self.fetch_visits(&path, auth_token).await?;
        visits.into_iter().next().ok_or(QueueError::NotFound)
    }

    /// Visits a doctor session draws from: today's waiting-like rows for the
    /// doctor's own id or their specialization, lowest token first.
    pub async fn waiting_for_doctor(
        &self,
        doctor_id: Uuid,
        specialization: &str,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<Visit>, QueueError> {
        let path = format!(
            "/rest/v1/visits?visit_date=eq.{}&status=in.(waiting,checked_in)&or=(doctor_id.eq.{},department.eq.{})&order=stn.asc",
            date.format("%Y-%m-%d"),
            doctor_id,
            urlencoding::encode(specialization),
        );

        self.fetch_visits(&path, auth_token).await
    }

    /// Move a visit along the canonical machine, with the timestamp side
    /// effects the console expects.
    pub async fn transition(
        &self,
        id: Uuid,
        to: VisitStatus,
        actor: &str,
        auth_token: Option<&str>,
    ) -> Result<Visit, QueueError> {
        let visit = self.get_visit(id, auth_token).await?;
        self.lifecycle.validate_transition(&visit.status, &to)?;

        let updated = self.patch_status(&visit, to, auth_token).await?;

        self.audit
            .record(
                actor,
                AuditAction::VisitStatusChanged,
                "visit",
                &id.to_string(),
                json!({ "from": visit.status, "to": to, "stn": visit.stn }),
                auth_token,
            )
            .await;

        Ok(updated)
    }

    /// Administrative override: the only path into `held`/`expired`, and the
    /// way back out of a hold.
    pub async fn override_status(
        &self,
        id: Uuid,
        to: VisitStatus,
        actor: &str,
        auth_token: Option<&str>,
    ) -> Result<Visit, QueueError> {
        self.lifecycle.validate_override(&to)?;
        let visit = self.get_visit(id, auth_token).await?;

        let updated = self.patch_status(&visit, to, auth_token).await?;

        self.audit
            .record(
                actor,
                AuditAction::VisitOverridden,
                "visit",
                &id.to_string(),
                json!({ "from": visit.status, "to": to }),
                auth_token,
            )
            .await;

        Ok(updated)
    }

    /// QR scan check-in. Bad tokens are expected scanner noise; every reject
    /// leaves the visit untouched.
    pub async fn check_in_by_scan(
        &self,
        raw_token: &str,
        actor: &str,
        auth_token: Option<&str>,
    ) -> Result<Visit, QueueError> {
        let payload = parse_token(raw_token).ok_or(QueueError::InvalidToken)?;

        if payload.visit_date != self.clock.today() {
            return Err(QueueError::TokenNotForToday);
        }

        let path = format!(
            "/rest/v1/visits?stn=eq.{}&visit_date=eq.{}",
            payload.stn,
            payload.visit_date.format("%Y-%m-%d"),
        );
        let candidates = self.fetch_visits(&path, auth_token).await?;
        if candidates.is_empty() {
            return Err(QueueError::NotFound);
        }

        // Every department's sequence restarts at 1 each day, so the same stn
        // can appear in several rows; the scanned uid picks the right one
        // against each row's own stored payload.
        let visit = candidates
            .into_iter()
            .find(|v| {
                parse_token(&v.qr_payload).map_or(false, |own| own.uid == payload.uid)
            })
            .ok_or(QueueError::TokenMismatch)?;

        if visit.status != VisitStatus::Waiting {
            return Err(QueueError::NotAwaitingCheckIn(visit.status));
        }

        let updated = self.patch_status(&visit, VisitStatus::CheckedIn, auth_token).await?;

        self.audit
            .record(
                actor,
                AuditAction::VisitCheckedIn,
                "visit",
                &visit.id.to_string(),
                json!({ "stn": visit.stn, "via": "qr_scan" }),
                auth_token,
            )
            .await;

        Ok(updated)
    }

    async fn fetch_visits(
        &self,
        path: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<Visit>, QueueError> {
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, path, auth_token, None)
            .await
            .map_err(|e| QueueError::Database(e.to_string()))?;

        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Visit>, _>>()
            .map_err(|e| QueueError::Database(e.to_string()))
    }

    async fn patch_status(
        &self,
        visit: &Visit,
        to: VisitStatus,
        auth_token: Option<&str>,
    ) -> Result<Visit, QueueError> {
        let now = self.clock.now();
        let mut patch = serde_json::Map::new();
        patch.insert("status".to_string(), json!(to));

        match to {
            VisitStatus::CheckedIn => {
                patch.insert("checked_in_at".to_string(), json!(now.to_rfc3339()));
            }
            VisitStatus::InService => {
                if visit.checked_in_at.is_none() {
                    patch.insert("checked_in_at".to_string(), json!(now.to_rfc3339()));
                }
            }
            VisitStatus::Completed => {
                patch.insert("completed_at".to_string(), json!(now.to_rfc3339()));
            }
            _ => {}
        }

        patch.insert("updated_at".to_string(), json!(now.to_rfc3339()));

        let path = format!("/rest/v1/visits?id=eq.{}", visit.id);
        let rows: Vec<Value> = self
            .supabase
            .request_returning(Method::PATCH, &path, auth_token, Some(Value::Object(patch)))
            .await
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(QueueError::NotFound)?;
        serde_json::from_value(row).map_err(|e| QueueError::Database(e.to_string()))
    }
}
