use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// Fixed literal tag in front of every serialized visit token.
pub const TOKEN_PREFIX: &str = "CLINIC_TOKEN:";

/// The descriptor carried inside a visit's QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub clinic: String,
    pub uid: String,
    pub stn: i32,
    pub visit_date: NaiveDate,
    pub issued_at: i64,
}

/// Serialize a token payload: prefix + base64 of the JSON body.
pub fn generate_token(payload: &TokenPayload) -> String {
    let body = json!({
        "clinic": payload.clinic,
        "uid": payload.uid,
        "stn": payload.stn,
        "visit_date": payload.visit_date.format("%Y-%m-%d").to_string(),
        "issued_at": payload.issued_at,
    });

    format!("{}{}", TOKEN_PREFIX, STANDARD.encode(body.to_string()))
}

/// Decode a scanned token. Accepts the raw serialized form or a URL that
/// carries it in a `token` query parameter. Malformed input is expected
/// scanner noise: the result is `None`, never an error.
pub fn parse_token(input: &str) -> Option<TokenPayload> {
    let body = extract_body(input)?;

    let bytes = STANDARD.decode(body.trim()).ok()?;
    let value: Value = serde_json::from_slice(&bytes).ok()?;

    let clinic = non_empty(&value, "clinic")?;
    let uid = non_empty(&value, "uid")?;
    let stn = value.get("stn")?.as_i64().filter(|s| *s != 0)?;
    let visit_date = value.get("visit_date")?.as_str()?;
    let visit_date = NaiveDate::parse_from_str(visit_date, "%Y-%m-%d").ok()?;
    let issued_at = value.get("issued_at").and_then(Value::as_i64).unwrap_or(0);

    Some(TokenPayload {
        clinic,
        uid,
        stn: stn as i32,
        visit_date,
        issued_at,
    })
}

/// Strip everything but the base64 body. The prefix is required; a URL form
/// is unwrapped from its `token` query parameter first.
fn extract_body(input: &str) -> Option<String> {
    let candidate = if let Some(idx) = input.find("token=") {
        let raw = &input[idx + "token=".len()..];
        let raw = raw.split('&').next().unwrap_or(raw);
        match urlencoding::decode(raw) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => {
                debug!("Token parameter was not valid percent-encoding");
                return None;
            }
        }
    } else {
        input.trim().to_string()
    };

    candidate
        .trim()
        .strip_prefix(TOKEN_PREFIX)
        .map(|body| body.to_string())
}

fn non_empty(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
