use std::sync::Arc;
use axum::{extract::State, Json};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{BookVisitRequest, BookingError};
use crate::services::BookingService;

fn map_booking_error(err: BookingError) -> AppError {
    match &err {
        BookingError::Validation(_) => AppError::ValidationError(err.to_string()),
        BookingError::Maintenance => AppError::Unavailable(err.to_string()),
        BookingError::OnlinePaymentsDisabled => AppError::BadRequest(err.to_string()),
        BookingError::SequenceContention => AppError::Conflict(err.to_string()),
        BookingError::Database(msg) => AppError::Database(msg.clone()),
    }
}

/// Public booking endpoint; the patient-facing form posts here.
#[axum::debug_handler]
pub async fn book_visit(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<BookVisitRequest>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&config);

    let confirmation = service
        .book_visit(request)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!(confirmation)))
}
