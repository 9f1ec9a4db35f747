use std::sync::Arc;
use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::clock::{Clock, SystemClock};

use crate::models::{
    QueueError, QueueSnapshot, QueueStatusQuery, RecordPaymentRequest, ScanRequest,
    TransitionRequest, OverrideRequest, VisitListQuery,
};
use crate::services::{PaymentService, QueueStatusService, VisitService};

fn map_queue_error(err: QueueError) -> AppError {
    match err {
        QueueError::NotFound => AppError::NotFound(err.to_string()),
        QueueError::InvalidTransition { .. }
        | QueueError::InvalidOverride(_)
        | QueueError::NotAwaitingCheckIn(_)
        | QueueError::PaymentState(_) => AppError::Conflict(err.to_string()),
        QueueError::InvalidToken
        | QueueError::TokenNotForToday
        | QueueError::TokenMismatch => AppError::BadRequest(err.to_string()),
        QueueError::Database(msg) => AppError::Database(msg),
    }
}

/// Public queue board. Degrades to a zeroed snapshot when the store is
/// unreachable; the board stays up either way.
#[axum::debug_handler]
pub async fn queue_status(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<QueueStatusQuery>,
) -> Json<Value> {
    let service = QueueStatusService::new(&config);
    let today = SystemClock.today();

    let snapshot = match service
        .queue_status(query.department.as_deref(), today, None)
        .await
    {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Failed to load queue status, serving zeros: {}", e);
            QueueSnapshot::empty()
        }
    };

    Json(json!(snapshot))
}

#[axum::debug_handler]
pub async fn list_visits(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Query(query): Query<VisitListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = VisitService::new(&config);

    let visits = service
        .list_today(query.department.as_deref(), query.status, Some(auth.token()))
        .await
        .map_err(map_queue_error)?;

    Ok(Json(json!({
        "visits": visits,
        "total": visits.len()
    })))
}

#[axum::debug_handler]
pub async fn transition_visit(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(visit_id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Value>, AppError> {
    let service = VisitService::new(&config);

    let visit = service
        .transition(visit_id, request.to, &user.actor_label(), Some(auth.token()))
        .await
        .map_err(map_queue_error)?;

    Ok(Json(json!(visit)))
}

#[axum::debug_handler]
pub async fn override_visit(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(visit_id): Path<Uuid>,
    Json(request): Json<OverrideRequest>,
) -> Result<Json<Value>, AppError> {
    let service = VisitService::new(&config);

    let visit = service
        .override_status(visit_id, request.to, &user.actor_label(), Some(auth.token()))
        .await
        .map_err(map_queue_error)?;

    Ok(Json(json!(visit)))
}

#[axum::debug_handler]
pub async fn scan_check_in(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<ScanRequest>,
) -> Result<Json<Value>, AppError> {
    let service = VisitService::new(&config);

    let visit = service
        .check_in_by_scan(&request.token, &user.actor_label(), Some(auth.token()))
        .await
        .map_err(map_queue_error)?;

    Ok(Json(json!(visit)))
}

#[axum::debug_handler]
pub async fn record_payment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(visit_id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<Json<Value>, AppError> {
    if request.amount <= 0.0 {
        return Err(AppError::ValidationError("Amount must be positive".to_string()));
    }

    let service = PaymentService::new(&config);

    let visit = service
        .record_payment(
            visit_id,
            request.amount,
            request.method,
            &user.actor_label(),
            Some(auth.token()),
        )
        .await
        .map_err(map_queue_error)?;

    Ok(Json(json!(visit)))
}

#[axum::debug_handler]
pub async fn mark_paid(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(visit_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = PaymentService::new(&config);

    let visit = service
        .mark_paid(visit_id, &user.actor_label(), Some(auth.token()))
        .await
        .map_err(map_queue_error)?;

    Ok(Json(json!(visit)))
}
