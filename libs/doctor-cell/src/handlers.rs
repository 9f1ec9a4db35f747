use std::sync::Arc;
use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use queue_cell::models::QueueError;

use crate::models::{SessionError, StartSessionRequest};
use crate::services::{DoctorService, SessionService};

fn map_session_error(err: SessionError) -> AppError {
    match &err {
        SessionError::DoctorNotFound
        | SessionError::SessionNotFound
        | SessionError::ConsultationNotFound => AppError::NotFound(err.to_string()),
        SessionError::InvalidTransition { .. }
        | SessionError::SessionNotActive(_)
        | SessionError::ConsultationState(_) => AppError::Conflict(err.to_string()),
        SessionError::Queue(QueueError::NotFound) => AppError::NotFound(err.to_string()),
        SessionError::Queue(QueueError::Database(msg)) => AppError::Database(msg.clone()),
        SessionError::Queue(queue_err) => AppError::Conflict(queue_err.to_string()),
        SessionError::Database(msg) => AppError::Database(msg.clone()),
    }
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&config);

    let doctor = service
        .get_doctor(doctor_id, Some(auth.token()))
        .await
        .map_err(map_session_error)?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn start_session(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<StartSessionRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SessionService::new(&config);

    let session = service
        .start_session(request.doctor_id, &user.actor_label(), Some(auth.token()))
        .await
        .map_err(map_session_error)?;

    Ok(Json(json!(session)))
}

#[axum::debug_handler]
pub async fn pause_session(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = SessionService::new(&config);

    let session = service
        .pause_session(session_id, &user.actor_label(), Some(auth.token()))
        .await
        .map_err(map_session_error)?;

    Ok(Json(json!(session)))
}

#[axum::debug_handler]
pub async fn resume_session(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = SessionService::new(&config);

    let session = service
        .resume_session(session_id, &user.actor_label(), Some(auth.token()))
        .await
        .map_err(map_session_error)?;

    Ok(Json(json!(session)))
}

#[axum::debug_handler]
pub async fn end_session(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = SessionService::new(&config);

    let session = service
        .end_session(session_id, &user.actor_label(), Some(auth.token()))
        .await
        .map_err(map_session_error)?;

    Ok(Json(json!(session)))
}

#[axum::debug_handler]
pub async fn call_next(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = SessionService::new(&config);

    let called = service
        .call_next(session_id, &user.actor_label(), Some(auth.token()))
        .await
        .map_err(map_session_error)?;

    Ok(Json(json!(called)))
}

#[axum::debug_handler]
pub async fn complete_consultation(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(consultation_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = SessionService::new(&config);

    let consultation = service
        .complete_consultation(consultation_id, &user.actor_label(), Some(auth.token()))
        .await
        .map_err(map_session_error)?;

    Ok(Json(json!(consultation)))
}
