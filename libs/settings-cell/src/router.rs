use std::sync::Arc;
use axum::{routing::get, Router};
use shared_config::AppConfig;

use crate::handlers::get_settings;

pub fn settings_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(get_settings))
        .with_state(config)
}
