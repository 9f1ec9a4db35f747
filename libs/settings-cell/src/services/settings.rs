use std::sync::Arc;

use anyhow::Result;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{ClinicSettings, SettingRow};

/// Fold key-value rows into typed settings. Unknown keys are ignored and
/// junk values keep the default; the table has no schema to lean on.
pub fn fold_settings(rows: &[SettingRow]) -> ClinicSettings {
    let mut settings = ClinicSettings::default();

    for row in rows {
        match row.key.as_str() {
            "maintenance_mode" => {
                if let Some(flag) = as_bool(&row.value) {
                    settings.maintenance_mode = flag;
                }
            }
            "auto_refresh_interval" => {
                if let Some(seconds) = as_i64(&row.value).filter(|s| *s > 0) {
                    settings.auto_refresh_interval = seconds;
                }
            }
            "enable_online_payments" => {
                if let Some(flag) = as_bool(&row.value) {
                    settings.enable_online_payments = flag;
                }
            }
            _ => {}
        }
    }

    settings
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub struct SettingsService {
    supabase: Arc<SupabaseClient>,
}

impl SettingsService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub async fn load(&self, auth_token: Option<&str>) -> Result<ClinicSettings> {
        debug!("Loading clinic settings");

        let rows: Vec<SettingRow> = self
            .supabase
            .request(Method::GET, "/rest/v1/clinic_settings", auth_token, None)
            .await?;

        Ok(fold_settings(&rows))
    }
}
