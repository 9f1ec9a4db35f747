use std::sync::Arc;
use axum::{middleware, routing::{get, post}, Router};
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

/// Public queue board routes.
pub fn queue_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/status", get(queue_status))
        .with_state(config)
}

/// Staff console routes; everything here requires a valid bearer token.
pub fn admin_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/visits", get(list_visits))
        .route("/visits/{id}/transition", post(transition_visit))
        .route("/visits/{id}/override", post(override_visit))
        .route("/visits/{id}/payment", post(record_payment))
        .route("/visits/{id}/mark-paid", post(mark_paid))
        .route("/checkin/scan", post(scan_check_in))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
