use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use audit_cell::{AuditAction, AuditService};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::clock::{Clock, SystemClock};

use crate::models::{PaymentMethod, PaymentStatus, QueueError, Visit};

/// Payment writes on visit rows. No operation here ever removes or reduces
/// a previously recorded payment.
pub struct PaymentService {
    supabase: Arc<SupabaseClient>,
    audit: AuditService,
    clock: Arc<dyn Clock>,
}

impl PaymentService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            audit: AuditService::new(config),
            clock,
        }
    }

    /// Cash-desk settlement of a pay-at-clinic visit: writes a transaction
    /// record and flips the visit to paid.
    pub async fn record_payment(
        &self,
        visit_id: Uuid,
        amount: f64,
        method: PaymentMethod,
        actor: &str,
        auth_token: Option<&str>,
    ) -> Result<Visit, QueueError> {
        let visit = self.get_visit(visit_id, auth_token).await?;

        if visit.payment_status != PaymentStatus::PayAtClinic {
            return Err(QueueError::PaymentState(visit.payment_status));
        }

        debug!("Recording payment of {} for visit {}", amount, visit_id);

        let transaction = json!({
            "visit_id": visit_id,
            "amount": amount,
            "method": method,
            "recorded_by": actor,
            "created_at": self.clock.now().to_rfc3339()
        });

        let _: Vec<Value> = self
            .supabase
            .request_returning(
                Method::POST,
                "/rest/v1/payment_transactions",
                auth_token,
                Some(transaction),
            )
            .await
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let updated = self.set_payment_status(visit_id, PaymentStatus::Paid, auth_token).await?;

        self.audit
            .record(
                actor,
                AuditAction::PaymentRecorded,
                "visit",
                &visit_id.to_string(),
                json!({ "amount": amount, "method": method }),
                auth_token,
            )
            .await;

        Ok(updated)
    }

    /// Direct `pending -> paid` flip for online payments confirmed out of
    /// band. No transaction amount is captured on this path.
    pub async fn mark_paid(
        &self,
        visit_id: Uuid,
        actor: &str,
        auth_token: Option<&str>,
    ) -> Result<Visit, QueueError> {
        let visit = self.get_visit(visit_id, auth_token).await?;

        if visit.payment_status != PaymentStatus::Pending {
            return Err(QueueError::PaymentState(visit.payment_status));
        }

        let updated = self.set_payment_status(visit_id, PaymentStatus::Paid, auth_token).await?;

        self.audit
            .record(
                actor,
                AuditAction::PaymentMarkedPaid,
                "visit",
                &visit_id.to_string(),
                json!({ "from": PaymentStatus::Pending }),
                auth_token,
            )
            .await;

        Ok(updated)
    }

    async fn get_visit(&self, id: Uuid, auth_token: Option<&str>) -> Result<Visit, QueueError> {
        let path = format!("/rest/v1/visits?id=eq.{}", id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(QueueError::NotFound)?;
        serde_json::from_value(row).map_err(|e| QueueError::Database(e.to_string()))
    }

    async fn set_payment_status(
        &self,
        visit_id: Uuid,
        status: PaymentStatus,
        auth_token: Option<&str>,
    ) -> Result<Visit, QueueError> {
        let patch = json!({
            "payment_status": status,
            "updated_at": self.clock.now().to_rfc3339()
        });

        let path = format!("/rest/v1/visits?id=eq.{}", visit_id);
        let rows: Vec<Value> = self
            .supabase
            .request_returning(Method::PATCH, &path, auth_token, Some(patch))
            .await
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(QueueError::NotFound)?;
        serde_json::from_value(row).map_err(|e| QueueError::Database(e.to_string()))
    }
}
