use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::models::{SessionError, SessionStatus};
use doctor_cell::services::SessionService;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

#[tokio::test]
async fn test_start_session_force_closes_stale_ones() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let doctor_id = Uuid::new_v4();
    let session_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(&doctor_id.to_string(), "Dr. Mehta", "General Medicine")
        ])))
        .mount(&mock_server)
        .await;

    // One stale session gets swept inactive before the new one opens.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctor_sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::session_response(&Uuid::new_v4().to_string(), &doctor_id.to_string(), "inactive")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_sessions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::session_response(&session_id.to_string(), &doctor_id.to_string(), "active")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/audit_logs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{}])))
        .mount(&mock_server)
        .await;

    let service = SessionService::new(&config);
    let session = service
        .start_session(doctor_id, "doctor@example.com", None)
        .await
        .expect("session should start");

    assert_eq!(session.id, session_id);
    assert_eq!(session.session_status, SessionStatus::Active);
}

#[tokio::test]
async fn test_start_session_for_unknown_doctor_fails() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = SessionService::new(&config);
    let result = service
        .start_session(Uuid::new_v4(), "doctor@example.com", None)
        .await;

    assert_matches!(result, Err(SessionError::DoctorNotFound));
}

#[tokio::test]
async fn test_call_next_with_empty_queue_returns_none() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let doctor_id = Uuid::new_v4();
    let session_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::session_response(&session_id.to_string(), &doctor_id.to_string(), "active")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_response(&doctor_id.to_string(), "Dr. Mehta", "General Medicine")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/visits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = SessionService::new(&config);
    let called = service
        .call_next(session_id, "doctor@example.com", None)
        .await
        .expect("empty queue is not an error");

    assert!(called.is_none());
}

#[tokio::test]
async fn test_call_next_requires_active_session() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let session_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::session_response(&session_id.to_string(), &Uuid::new_v4().to_string(), "break")
        ])))
        .mount(&mock_server)
        .await;

    let service = SessionService::new(&config);
    let result = service.call_next(session_id, "doctor@example.com", None).await;

    assert_matches!(result, Err(SessionError::SessionNotActive(SessionStatus::Break)));
}

#[tokio::test]
async fn test_pause_inactive_session_is_rejected() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let session_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::session_response(&session_id.to_string(), &Uuid::new_v4().to_string(), "inactive")
        ])))
        .mount(&mock_server)
        .await;

    let service = SessionService::new(&config);
    let result = service
        .pause_session(session_id, "doctor@example.com", None)
        .await;

    assert_matches!(result, Err(SessionError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_complete_consultation_requires_in_progress() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let consultation_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/consultations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": consultation_id,
            "session_id": Uuid::new_v4(),
            "visit_id": Uuid::new_v4(),
            "status": "completed",
            "started_at": "2025-01-15T10:00:00Z",
            "completed_at": "2025-01-15T10:20:00Z",
            "duration_minutes": 20
        }])))
        .mount(&mock_server)
        .await;

    let service = SessionService::new(&config);
    let result = service
        .complete_consultation(consultation_id, "doctor@example.com", None)
        .await;

    assert_matches!(result, Err(SessionError::ConsultationState(_)));
}
