use std::sync::Arc;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::warn;

use shared_config::AppConfig;

use crate::models::ClinicSettings;
use crate::services::SettingsService;

/// Public settings read. The patient-facing screens poll this at startup;
/// a store failure serves the defaults rather than an error page.
#[axum::debug_handler]
pub async fn get_settings(State(config): State<Arc<AppConfig>>) -> Json<Value> {
    let service = SettingsService::new(&config);

    let settings = match service.load(None).await {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Failed to load settings, serving defaults: {}", e);
            ClinicSettings::default()
        }
    };

    Json(json!(settings))
}
