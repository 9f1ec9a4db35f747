use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Doctor, SessionError};

pub struct DoctorService {
    supabase: Arc<SupabaseClient>,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub async fn get_doctor(
        &self,
        id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Doctor, SessionError> {
        debug!("Fetching doctor {}", id);

        let path = format!("/rest/v1/doctors?id=eq.{}", id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| SessionError::Database(e.to_string()))?;

        let row = rows.into_iter().next().ok_or(SessionError::DoctorNotFound)?;
        serde_json::from_value(row).map_err(|e| SessionError::Database(e.to_string()))
    }
}
