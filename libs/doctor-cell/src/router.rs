use std::sync::Arc;
use axum::{middleware, routing::{get, post}, Router};
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn doctor_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/doctors/{id}", get(get_doctor))
        .route("/sessions/start", post(start_session))
        .route("/sessions/{id}/break", post(pause_session))
        .route("/sessions/{id}/resume", post(resume_session))
        .route("/sessions/{id}/end", post(end_session))
        .route("/sessions/{id}/call-next", post(call_next))
        .route("/consultations/{id}/complete", post(complete_consultation))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
