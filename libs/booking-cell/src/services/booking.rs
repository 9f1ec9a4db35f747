use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use audit_cell::{AuditAction, AuditService};
use patient_cell::models::{Patient, PatientIntake};
use patient_cell::services::PatientService;
use queue_cell::models::PaymentStatus;
use queue_cell::services::status::{
    compute_queue_status, estimate_wait_minutes, queue_position, QueueStatusService,
};
use settings_cell::services::SettingsService;
use shared_config::AppConfig;
use shared_database::supabase::{is_conflict, SupabaseClient};
use shared_utils::clock::{Clock, SystemClock};
use shared_utils::token::{generate_token, TokenPayload};

use crate::models::{BookVisitRequest, BookingConfirmation, BookingError, PaymentMode};
use crate::services::sequence::next_sequence_number;
use crate::services::validation::validate_booking;

/// Bounded retries when two bookings race for the same token number and the
/// store's unique index rejects the loser.
const MAX_ALLOCATION_ATTEMPTS: u32 = 3;

pub struct BookingService {
    supabase: Arc<SupabaseClient>,
    patients: PatientService,
    queue: QueueStatusService,
    settings: SettingsService,
    audit: AuditService,
    clock: Arc<dyn Clock>,
    clinic_code: String,
    per_patient_minutes: i32,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));

        Self {
            patients: PatientService::with_clock(config, Arc::clone(&clock)),
            queue: QueueStatusService::with_client(Arc::clone(&supabase)),
            settings: SettingsService::new(config),
            audit: AuditService::new(config),
            supabase,
            clock,
            clinic_code: config.clinic_code.clone(),
            per_patient_minutes: config.per_patient_minutes,
        }
    }

    /// The whole booking flow: validate, gate, upsert the patient, allocate
    /// a token, write the visit, and compute the confirmation numbers.
    ///
    /// Steps are independent writes, not a transaction: a failure aborts and
    /// surfaces, and earlier steps are not compensated.
    pub async fn book_visit(
        &self,
        request: BookVisitRequest,
    ) -> Result<BookingConfirmation, BookingError> {
        let issues = validate_booking(&request);
        if !issues.is_empty() {
            return Err(BookingError::Validation(issues));
        }

        let settings = match self.settings.load(None).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings during booking, using defaults: {}", e);
                Default::default()
            }
        };

        if settings.maintenance_mode {
            return Err(BookingError::Maintenance);
        }
        if request.payment_mode == PaymentMode::PayNow && !settings.enable_online_payments {
            return Err(BookingError::OnlinePaymentsDisabled);
        }

        let department = request.department.trim().to_string();
        let patient = self.upsert_patient(&request).await?;

        let visit_date = self.clock.today();
        let payment_status = match request.payment_mode {
            PaymentMode::PayNow => PaymentStatus::Pending,
            PaymentMode::PayAtClinic => PaymentStatus::PayAtClinic,
        };

        let mut attempt = 0;
        let (visit_id, stn, qr_payload) = loop {
            attempt += 1;

            let stn = next_sequence_number(&self.existing_stns(&department, visit_date).await?);

            let token = TokenPayload {
                clinic: self.clinic_code.clone(),
                uid: patient.uid.clone(),
                stn,
                visit_date,
                issued_at: self.clock.now().timestamp_millis(),
            };
            let qr_payload = generate_token(&token);

            match self
                .insert_visit(&request, &patient, stn, &department, visit_date, payment_status, &qr_payload)
                .await
            {
                Ok(visit_id) => break (visit_id, stn, qr_payload),
                Err(e) if is_conflict(&e) && attempt < MAX_ALLOCATION_ATTEMPTS => {
                    debug!("Token number {} for {} was taken, retrying", stn, department);
                    continue;
                }
                Err(e) if is_conflict(&e) => return Err(BookingError::SequenceContention),
                Err(e) => return Err(BookingError::Database(e.to_string())),
            }
        };

        // Re-read the department's rows so the confirmation shows the queue
        // as it stands with this visit in it.
        let rows = self
            .queue
            .fetch_day(Some(&department), visit_date, None)
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;
        let snapshot = compute_queue_status(&rows);
        let position = queue_position(stn, snapshot.now_serving);
        let estimated_wait_minutes = estimate_wait_minutes(position, self.per_patient_minutes);

        info!(
            "Booked visit {} stn {} for department {} (position {})",
            visit_id, stn, department, position
        );

        self.audit
            .record(
                &patient.uid,
                AuditAction::VisitBooked,
                "visit",
                &visit_id.to_string(),
                json!({ "stn": stn, "department": department, "payment_mode": request.payment_mode }),
                None,
            )
            .await;

        Ok(BookingConfirmation {
            visit_id,
            patient_uid: patient.uid.clone(),
            stn,
            department,
            visit_date,
            qr_payload,
            payment_status,
            now_serving: snapshot.now_serving,
            position,
            estimated_wait_minutes,
            requires_payment: request.payment_mode == PaymentMode::PayNow,
        })
    }

    async fn upsert_patient(&self, request: &BookVisitRequest) -> Result<Patient, BookingError> {
        let intake = PatientIntake {
            name: request.name.clone(),
            age: request.age,
            phone: request.phone.clone(),
            email: request.email.clone(),
            address: request.address.clone(),
            emergency_contact: request.emergency_contact.clone(),
            blood_group: request.blood_group.clone(),
            allergies: request.allergies.clone(),
            medical_conditions: request.medical_conditions.clone(),
        };

        let existing = self
            .patients
            .find_by_phone(&request.phone, None)
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        match existing {
            Some(patient) => self
                .patients
                .merge_details(&patient, &intake, None)
                .await
                .map_err(|e| BookingError::Database(e.to_string())),
            None => self
                .patients
                .register(&intake, None)
                .await
                .map_err(|e| BookingError::Database(e.to_string())),
        }
    }

    async fn existing_stns(
        &self,
        department: &str,
        visit_date: chrono::NaiveDate,
    ) -> Result<Vec<i32>, BookingError> {
        #[derive(serde::Deserialize)]
        struct StnRow {
            stn: i32,
        }

        let path = format!(
            "/rest/v1/visits?department=eq.{}&visit_date=eq.{}&select=stn",
            urlencoding::encode(department),
            visit_date.format("%Y-%m-%d"),
        );

        let rows: Vec<StnRow> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|row| row.stn).collect())
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_visit(
        &self,
        request: &BookVisitRequest,
        patient: &Patient,
        stn: i32,
        department: &str,
        visit_date: chrono::NaiveDate,
        payment_status: PaymentStatus,
        qr_payload: &str,
    ) -> anyhow::Result<uuid::Uuid> {
        let now = self.clock.now();
        let body = json!({
            "patient_id": patient.id,
            "stn": stn,
            "department": department,
            "visit_date": visit_date.format("%Y-%m-%d").to_string(),
            "status": "waiting",
            "payment_status": payment_status,
            "qr_payload": qr_payload,
            "doctor_id": request.doctor_id,
            "notes": request.notes.as_deref().map(str::trim).filter(|s| !s.is_empty()),
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let rows: Vec<Value> = self
            .supabase
            .request_returning(Method::POST, "/rest/v1/visits", None, Some(body))
            .await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Visit insert returned no row"))?;

        let id = row
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("Visit insert returned no id"))?;

        Ok(id.parse()?)
    }
}
