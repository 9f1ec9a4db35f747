use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{info, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::AuditAction;

/// Best-effort audit trail. Every mutation in the admin console and the
/// doctor workflow is recorded here; a failed write is logged locally and
/// never blocks or rolls back the primary mutation.
pub struct AuditService {
    supabase: SupabaseClient,
}

impl AuditService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn record(
        &self,
        actor: &str,
        action: AuditAction,
        resource_type: &str,
        resource_id: &str,
        payload: Value,
        auth_token: Option<&str>,
    ) {
        info!(
            actor = %actor,
            resource_type = %resource_type,
            resource_id = %resource_id,
            "AUDIT: {}", action
        );

        let body = json!({
            "actor": actor,
            "action_type": action,
            "resource_type": resource_type,
            "resource_id": resource_id,
            "payload": payload,
            "created_at": Utc::now().to_rfc3339()
        });

        let result: anyhow::Result<Vec<Value>> = self
            .supabase
            .request_returning(Method::POST, "/rest/v1/audit_logs", auth_token, Some(body))
            .await;

        if let Err(e) = result {
            warn!("Failed to persist audit record for {}: {}", action, e);
        }
    }
}
