use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{QueueSnapshot, Visit, VisitStatus};

pub const DEFAULT_PER_PATIENT_MINUTES: i32 = 10;

/// Reduce a day's visit rows to `{now_serving, total_waiting}`.
///
/// Serving order is derived, not stored: an in-service row pins the counter
/// to the lowest token being served; with nothing in service the counter
/// trails the highest completed token; a queue nobody has entered yet sits
/// one below its lowest token.
pub fn compute_queue_status(visits: &[Visit]) -> QueueSnapshot {
    let in_service_min = visits
        .iter()
        .filter(|v| v.status == VisitStatus::InService)
        .map(|v| v.stn)
        .min();

    let completed_max = visits
        .iter()
        .filter(|v| v.status == VisitStatus::Completed)
        .map(|v| v.stn)
        .max();

    let now_serving = if let Some(min) = in_service_min {
        min
    } else if let Some(max) = completed_max {
        max
    } else if let Some(min_all) = visits.iter().map(|v| v.stn).min() {
        min_all - 1
    } else {
        0
    };

    let total_waiting = visits.iter().filter(|v| v.status.is_waiting_like()).count() as i64;

    QueueSnapshot { now_serving, total_waiting }
}

/// Position of a token relative to the serving counter. Never negative.
pub fn queue_position(own_stn: i32, now_serving: i32) -> i32 {
    (own_stn - now_serving).max(0)
}

/// Estimated wait in minutes for a queue position. Never negative.
pub fn estimate_wait_minutes(position: i32, per_patient_minutes: i32) -> i32 {
    (position * per_patient_minutes).max(0)
}

pub struct QueueStatusService {
    supabase: Arc<SupabaseClient>,
}

impl QueueStatusService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// All visit rows for a date, optionally narrowed to one department.
    pub async fn fetch_day(
        &self,
        department: Option<&str>,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<Visit>> {
        let mut path = format!("/rest/v1/visits?visit_date=eq.{}", date.format("%Y-%m-%d"));
        if let Some(dept) = department {
            path.push_str(&format!("&department=eq.{}", urlencoding::encode(dept)));
        }
        path.push_str("&order=stn.asc");

        debug!("Fetching queue rows: {}", path);

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        let visits = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Visit>, _>>()?;

        Ok(visits)
    }

    pub async fn queue_status(
        &self,
        department: Option<&str>,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<QueueSnapshot> {
        let visits = self.fetch_day(department, date, auth_token).await?;
        Ok(compute_queue_status(&visits))
    }
}
