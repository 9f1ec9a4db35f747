use std::sync::Arc;

use rand::{distributions::Alphanumeric, Rng};
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::clock::{Clock, SystemClock};

use crate::models::{Patient, PatientError, PatientIntake};

/// Split a free-text comma-separated field into trimmed, non-empty entries.
/// A blank or absent field stays absent.
pub fn split_list(raw: Option<&str>) -> Option<Vec<String>> {
    let items: Vec<String> = raw?
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Clinic-scoped patient identifier: clinic code, base36 epoch millis, four
/// random alphanumerics, all uppercased. Uniqueness rides on the timestamp
/// plus randomness; there is no formal collision bound.
pub fn generate_uid(clinic_code: &str, now_millis: i64) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(char::from)
        .collect();

    format!("{}{}{}", clinic_code, to_base36(now_millis.max(0) as u64), suffix).to_uppercase()
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Patch for a returning patient: only optional fields that were supplied
/// and differ from what is stored. Never overwrites with blank.
pub fn build_merge_patch(existing: &Patient, intake: &PatientIntake) -> Map<String, Value> {
    let mut patch = Map::new();

    let text_fields = [
        ("email", &intake.email, &existing.email),
        ("address", &intake.address, &existing.address),
        ("emergency_contact", &intake.emergency_contact, &existing.emergency_contact),
        ("blood_group", &intake.blood_group, &existing.blood_group),
    ];

    for (key, supplied, stored) in text_fields {
        if let Some(value) = supplied {
            let trimmed = value.trim();
            if !trimmed.is_empty() && stored.as_deref() != Some(trimmed) {
                patch.insert(key.to_string(), json!(trimmed));
            }
        }
    }

    if let Some(allergies) = split_list(intake.allergies.as_deref()) {
        if existing.allergies.as_ref() != Some(&allergies) {
            patch.insert("allergies".to_string(), json!(allergies));
        }
    }

    if let Some(conditions) = split_list(intake.medical_conditions.as_deref()) {
        if existing.medical_conditions.as_ref() != Some(&conditions) {
            patch.insert("medical_conditions".to_string(), json!(conditions));
        }
    }

    patch
}

pub struct PatientService {
    supabase: Arc<SupabaseClient>,
    clinic_code: String,
    clock: Arc<dyn Clock>,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            clinic_code: config.clinic_code.clone(),
            clock,
        }
    }

    /// Exact phone match; first row wins. Phone is the booking flow's
    /// natural dedup key.
    pub async fn find_by_phone(
        &self,
        phone: &str,
        auth_token: Option<&str>,
    ) -> Result<Option<Patient>, PatientError> {
        let path = format!("/rest/v1/patients?phone=eq.{}", urlencoding::encode(phone));
        let patients = self.fetch_patients(&path, auth_token).await?;
        Ok(patients.into_iter().next())
    }

    pub async fn get_patient(
        &self,
        id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Patient, PatientError> {
        let path = format!("/rest/v1/patients?id=eq.{}", id);
        let patients = self.fetch_patients(&path, auth_token).await?;
        patients.into_iter().next().ok_or(PatientError::NotFound)
    }

    pub async fn search(
        &self,
        phone: Option<&str>,
        uid: Option<&str>,
        auth_token: Option<&str>,
    ) -> Result<Vec<Patient>, PatientError> {
        let mut filters = Vec::new();
        if let Some(phone) = phone {
            filters.push(format!("phone=eq.{}", urlencoding::encode(phone)));
        }
        if let Some(uid) = uid {
            filters.push(format!("uid=eq.{}", urlencoding::encode(uid)));
        }

        let path = if filters.is_empty() {
            "/rest/v1/patients?order=created_at.desc&limit=50".to_string()
        } else {
            format!("/rest/v1/patients?{}&limit=50", filters.join("&"))
        };

        self.fetch_patients(&path, auth_token).await
    }

    /// First booking for this phone number: mint a uid and insert the row.
    pub async fn register(
        &self,
        intake: &PatientIntake,
        auth_token: Option<&str>,
    ) -> Result<Patient, PatientError> {
        let now = self.clock.now();
        let uid = generate_uid(&self.clinic_code, now.timestamp_millis());

        debug!("Registering new patient {} for phone {}", uid, intake.phone);

        let body = json!({
            "uid": uid,
            "name": intake.name.trim(),
            "age": intake.age,
            "phone": intake.phone,
            "email": intake.email.as_deref().map(str::trim).filter(|s| !s.is_empty()),
            "address": intake.address.as_deref().map(str::trim).filter(|s| !s.is_empty()),
            "emergency_contact": intake.emergency_contact.as_deref().map(str::trim).filter(|s| !s.is_empty()),
            "blood_group": intake.blood_group.as_deref().map(str::trim).filter(|s| !s.is_empty()),
            "allergies": split_list(intake.allergies.as_deref()),
            "medical_conditions": split_list(intake.medical_conditions.as_deref()),
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let rows: Vec<Value> = self
            .supabase
            .request_returning(Method::POST, "/rest/v1/patients", auth_token, Some(body))
            .await
            .map_err(|e| PatientError::Database(e.to_string()))?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| PatientError::Database("Insert returned no row".to_string()))?;
        serde_json::from_value(row).map_err(|e| PatientError::Database(e.to_string()))
    }

    /// Returning patient: apply the non-destructive merge of newly supplied
    /// optional fields. A patch with nothing in it is skipped entirely.
    pub async fn merge_details(
        &self,
        existing: &Patient,
        intake: &PatientIntake,
        auth_token: Option<&str>,
    ) -> Result<Patient, PatientError> {
        let mut patch = build_merge_patch(existing, intake);
        if patch.is_empty() {
            return Ok(existing.clone());
        }

        patch.insert("updated_at".to_string(), json!(self.clock.now().to_rfc3339()));

        let path = format!("/rest/v1/patients?id=eq.{}", existing.id);
        let rows: Vec<Value> = self
            .supabase
            .request_returning(Method::PATCH, &path, auth_token, Some(Value::Object(patch)))
            .await
            .map_err(|e| PatientError::Database(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(PatientError::NotFound)?;
        serde_json::from_value(row).map_err(|e| PatientError::Database(e.to_string()))
    }

    async fn fetch_patients(
        &self,
        path: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<Patient>, PatientError> {
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, path, auth_token, None)
            .await
            .map_err(|e| PatientError::Database(e.to_string()))?;

        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Patient>, _>>()
            .map_err(|e| PatientError::Database(e.to_string()))
    }
}
