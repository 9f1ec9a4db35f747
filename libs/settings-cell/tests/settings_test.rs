use std::sync::Arc;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use settings_cell::models::{ClinicSettings, SettingRow};
use settings_cell::router::settings_routes;
use settings_cell::services::fold_settings;
use shared_utils::test_utils::TestConfig;

fn row(key: &str, value: serde_json::Value) -> SettingRow {
    SettingRow { key: key.to_string(), value }
}

#[test]
fn test_empty_table_yields_defaults() {
    assert_eq!(fold_settings(&[]), ClinicSettings::default());
}

#[test]
fn test_known_keys_are_applied() {
    let settings = fold_settings(&[
        row("maintenance_mode", json!(true)),
        row("auto_refresh_interval", json!(15)),
        row("enable_online_payments", json!(true)),
    ]);

    assert!(settings.maintenance_mode);
    assert_eq!(settings.auto_refresh_interval, 15);
    assert!(settings.enable_online_payments);
}

#[test]
fn test_stringly_typed_values_are_tolerated() {
    // The table stores free-form JSON; the console writes strings sometimes.
    let settings = fold_settings(&[
        row("maintenance_mode", json!("true")),
        row("auto_refresh_interval", json!("45")),
    ]);

    assert!(settings.maintenance_mode);
    assert_eq!(settings.auto_refresh_interval, 45);
}

#[test]
fn test_junk_values_keep_the_default() {
    let settings = fold_settings(&[
        row("maintenance_mode", json!("enabled")),
        row("auto_refresh_interval", json!(-5)),
        row("enable_online_payments", json!(1)),
    ]);

    assert_eq!(settings, ClinicSettings::default());
}

#[test]
fn test_unknown_keys_are_ignored() {
    let settings = fold_settings(&[
        row("theme_color", json!("#ff0000")),
        row("maintenance_mode", json!(true)),
    ]);

    assert!(settings.maintenance_mode);
    assert_eq!(settings.auto_refresh_interval, 30);
}

#[tokio::test]
async fn test_settings_endpoint_returns_folded_settings() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/clinic_settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "key": "maintenance_mode", "value": true },
            { "key": "auto_refresh_interval", "value": 10 }
        ])))
        .mount(&mock_server)
        .await;

    let app = settings_routes(Arc::new(config));
    let request = Request::builder()
        .method("GET")
        .uri("/")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let settings: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(settings["maintenance_mode"], true);
    assert_eq!(settings["auto_refresh_interval"], 10);
    assert_eq!(settings["enable_online_payments"], false);
}

#[tokio::test]
async fn test_settings_endpoint_serves_defaults_when_store_is_down() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/clinic_settings"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let app = settings_routes(Arc::new(config));
    let request = Request::builder()
        .method("GET")
        .uri("/")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let settings: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(settings["maintenance_mode"], false);
    assert_eq!(settings["auto_refresh_interval"], 30);
}
