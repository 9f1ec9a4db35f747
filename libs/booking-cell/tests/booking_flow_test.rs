use assert_matches::assert_matches;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::models::{BookVisitRequest, BookingError, PaymentMode};
use booking_cell::services::BookingService;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};
use shared_utils::token::{parse_token, TOKEN_PREFIX};

fn request(payment_mode: PaymentMode) -> BookVisitRequest {
    BookVisitRequest {
        name: "Asha Rao".to_string(),
        age: 34,
        phone: "9876543210".to_string(),
        department: "General Medicine".to_string(),
        doctor_id: None,
        payment_mode,
        email: Some("asha@example.com".to_string()),
        address: None,
        emergency_contact: None,
        blood_group: None,
        allergies: None,
        medical_conditions: None,
        notes: None,
    }
}

fn today_string() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Settings read that leaves every gate open.
async fn mount_default_settings(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/clinic_settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

async fn mount_audit_sink(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/rest/v1/audit_logs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{}])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_first_booking_of_the_day() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let patient_id = Uuid::new_v4().to_string();
    let visit_id = Uuid::new_v4().to_string();
    let today = today_string();

    mount_default_settings(&mock_server).await;
    mount_audit_sink(&mock_server).await;

    // No patient on file for this phone, then the insert echoes the new row.
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::patient_response(&patient_id, "CLINICABC1234", "Asha Rao", "9876543210")
        ])))
        .mount(&mock_server)
        .await;

    // No tokens allocated yet today.
    Mock::given(method("GET"))
        .and(path("/rest/v1/visits"))
        .and(query_param("select", "stn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/visits"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "id": visit_id }])))
        .mount(&mock_server)
        .await;

    // The confirmation re-read sees the fresh visit in the queue.
    Mock::given(method("GET"))
        .and(path("/rest/v1/visits"))
        .and(query_param("order", "stn.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::visit_response(&visit_id, &patient_id, 1, "General Medicine", &today, "waiting")
        ])))
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config);
    let confirmation = service
        .book_visit(request(PaymentMode::PayAtClinic))
        .await
        .expect("booking should succeed");

    assert_eq!(confirmation.stn, 1);
    assert_eq!(confirmation.patient_uid, "CLINICABC1234");
    assert_eq!(confirmation.now_serving, 0);
    assert_eq!(confirmation.position, 1);
    assert_eq!(confirmation.estimated_wait_minutes, 10);
    assert!(!confirmation.requires_payment);
    assert!(confirmation.qr_payload.starts_with(TOKEN_PREFIX));

    // The QR payload carries the allocated token, not a placeholder.
    let token = parse_token(&confirmation.qr_payload).expect("confirmation QR should parse");
    assert_eq!(token.stn, 1);
    assert_eq!(token.uid, "CLINICABC1234");
}

#[tokio::test]
async fn test_second_booking_queues_behind_the_first() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let patient_id = Uuid::new_v4().to_string();
    let visit_id = Uuid::new_v4().to_string();
    let today = today_string();

    mount_default_settings(&mock_server).await;
    mount_audit_sink(&mock_server).await;

    // This phone is already on file: the patient row is reused, not re-created.
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_response(&patient_id, "CLINICXYZ9876", "Asha Rao", "9876543210")
        ])))
        .mount(&mock_server)
        .await;

    // The form supplies an email the stored row lacks, so the booking
    // merges it into the existing patient.
    let mut merged = MockSupabaseResponses::patient_response(
        &patient_id, "CLINICXYZ9876", "Asha Rao", "9876543210");
    merged["email"] = json!("asha@example.com");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([merged])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/visits"))
        .and(query_param("select", "stn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "stn": 1 }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/visits"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "id": visit_id }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/visits"))
        .and(query_param("order", "stn.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::visit_response(&Uuid::new_v4().to_string(), &Uuid::new_v4().to_string(), 1, "General Medicine", &today, "waiting"),
            MockSupabaseResponses::visit_response(&visit_id, &patient_id, 2, "General Medicine", &today, "waiting"),
        ])))
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config);
    let confirmation = service
        .book_visit(request(PaymentMode::PayAtClinic))
        .await
        .expect("booking should succeed");

    assert_eq!(confirmation.stn, 2);
    assert_eq!(confirmation.patient_uid, "CLINICXYZ9876");
    assert_eq!(confirmation.position, 2);
    assert_eq!(confirmation.estimated_wait_minutes, 20);
}

#[tokio::test]
async fn test_token_conflict_retries_and_succeeds() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let patient_id = Uuid::new_v4().to_string();
    let visit_id = Uuid::new_v4().to_string();
    let today = today_string();

    mount_default_settings(&mock_server).await;
    mount_audit_sink(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_response(&patient_id, "CLINICXYZ9876", "Asha Rao", "9876543210")
        ])))
        .mount(&mock_server)
        .await;

    let mut merged = MockSupabaseResponses::patient_response(
        &patient_id, "CLINICXYZ9876", "Asha Rao", "9876543210");
    merged["email"] = json!("asha@example.com");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([merged])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/visits"))
        .and(query_param("select", "stn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "stn": 1 }])))
        .mount(&mock_server)
        .await;

    // A racing booking takes the token first; the unique index rejects ours
    // once, then the retry lands.
    Mock::given(method("POST"))
        .and(path("/rest/v1/visits"))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/visits"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "id": visit_id }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/visits"))
        .and(query_param("order", "stn.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::visit_response(&visit_id, &patient_id, 2, "General Medicine", &today, "waiting")
        ])))
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config);
    let confirmation = service
        .book_visit(request(PaymentMode::PayAtClinic))
        .await
        .expect("retry should succeed");

    assert_eq!(confirmation.visit_id.to_string(), visit_id);
}

#[tokio::test]
async fn test_maintenance_mode_blocks_booking() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/clinic_settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "key": "maintenance_mode", "value": true }
        ])))
        .mount(&mock_server)
        .await;

    let service = BookingService::new(&config);
    let result = service.book_visit(request(PaymentMode::PayAtClinic)).await;

    assert_matches!(result, Err(BookingError::Maintenance));
}

#[tokio::test]
async fn test_pay_now_requires_online_payments_enabled() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    mount_default_settings(&mock_server).await;

    let service = BookingService::new(&config);
    let result = service.book_visit(request(PaymentMode::PayNow)).await;

    assert_matches!(result, Err(BookingError::OnlinePaymentsDisabled));
}

#[tokio::test]
async fn test_invalid_form_fails_before_any_write() {
    // No mocks mounted: a validation failure must not touch the store.
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let mut bad = request(PaymentMode::PayAtClinic);
    bad.phone = "123".to_string();

    let service = BookingService::new(&config);
    let result = service.book_visit(bad).await;

    assert_matches!(result, Err(BookingError::Validation(issues)) if issues.len() == 1);
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}
