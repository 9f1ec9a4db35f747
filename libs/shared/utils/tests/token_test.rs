use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::NaiveDate;
use serde_json::json;

use shared_utils::token::{generate_token, parse_token, TokenPayload, TOKEN_PREFIX};

fn payload() -> TokenPayload {
    TokenPayload {
        clinic: "CLINIC".to_string(),
        uid: "CLINICABC1234".to_string(),
        stn: 7,
        visit_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        issued_at: 1736899200000,
    }
}

#[test]
fn test_generated_token_parses_back() {
    let original = payload();
    let token = generate_token(&original);

    assert!(token.starts_with(TOKEN_PREFIX));

    let parsed = parse_token(&token).expect("generated token should parse");
    assert_eq!(parsed, original);
}

#[test]
fn test_parse_token_from_url_form() {
    let token = generate_token(&payload());
    let url = format!(
        "https://clinic.example.com/checkin?token={}&source=qr",
        urlencoding::encode(&token)
    );

    let parsed = parse_token(&url).expect("URL-wrapped token should parse");
    assert_eq!(parsed.stn, 7);
    assert_eq!(parsed.uid, "CLINICABC1234");
}

#[test]
fn test_parse_token_tolerates_surrounding_whitespace() {
    let token = format!("  {}  ", generate_token(&payload()));
    assert!(parse_token(&token).is_some());
}

#[test]
fn test_parse_token_rejects_missing_prefix() {
    let token = generate_token(&payload());
    let stripped = token.strip_prefix(TOKEN_PREFIX).unwrap();

    assert!(parse_token(stripped).is_none());
}

#[test]
fn test_parse_token_rejects_garbage() {
    assert!(parse_token("").is_none());
    assert!(parse_token("CLINIC_TOKEN:!!!not-base64!!!").is_none());
    assert!(parse_token("CLINIC_TOKEN:aGVsbG8=").is_none()); // base64 of "hello", not JSON
}

#[test]
fn test_parse_token_rejects_zero_stn() {
    let body = json!({
        "clinic": "CLINIC",
        "uid": "CLINICABC1234",
        "stn": 0,
        "visit_date": "2025-01-15",
        "issued_at": 1736899200000i64
    });
    let token = format!("{}{}", TOKEN_PREFIX, STANDARD.encode(body.to_string()));

    assert!(parse_token(&token).is_none());
}

#[test]
fn test_parse_token_rejects_empty_uid() {
    let body = json!({
        "clinic": "CLINIC",
        "uid": "",
        "stn": 3,
        "visit_date": "2025-01-15",
        "issued_at": 1736899200000i64
    });
    let token = format!("{}{}", TOKEN_PREFIX, STANDARD.encode(body.to_string()));

    assert!(parse_token(&token).is_none());
}

#[test]
fn test_parse_token_defaults_missing_issued_at() {
    let body = json!({
        "clinic": "CLINIC",
        "uid": "CLINICABC1234",
        "stn": 3,
        "visit_date": "2025-01-15"
    });
    let token = format!("{}{}", TOKEN_PREFIX, STANDARD.encode(body.to_string()));

    let parsed = parse_token(&token).expect("issued_at is optional");
    assert_eq!(parsed.issued_at, 0);
}

#[test]
fn test_parse_token_rejects_bad_date() {
    let body = json!({
        "clinic": "CLINIC",
        "uid": "CLINICABC1234",
        "stn": 3,
        "visit_date": "15/01/2025",
        "issued_at": 0
    });
    let token = format!("{}{}", TOKEN_PREFIX, STANDARD.encode(body.to_string()));

    assert!(parse_token(&token).is_none());
}
