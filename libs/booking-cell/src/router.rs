use std::sync::Arc;
use axum::{routing::post, Router};
use shared_config::AppConfig;

use crate::handlers::book_visit;

pub fn booking_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(book_visit))
        .with_state(config)
}
