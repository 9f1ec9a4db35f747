use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use booking_cell::router::booking_routes;
use doctor_cell::router::doctor_routes;
use patient_cell::router::patient_routes;
use queue_cell::router::{admin_routes, queue_routes};
use settings_cell::router::settings_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic Queue API is running!" }))
        .nest("/settings", settings_routes(state.clone()))
        .nest("/queue", queue_routes(state.clone()))
        .nest("/bookings", booking_routes(state.clone()))
        .nest("/admin", admin_routes(state.clone()))
        .nest("/doctor", doctor_routes(state.clone()))
        .nest("/patients", patient_routes(state.clone()))
}
