use serde::{Deserialize, Serialize};

/// Typed view over the flat `clinic_settings` key-value table. Anything
/// missing or unreadable falls back to the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicSettings {
    /// Gates the whole patient-facing surface behind a maintenance message.
    pub maintenance_mode: bool,
    /// Poll cadence for the public screens, in seconds.
    pub auto_refresh_interval: i64,
    /// Gates the pay-now path at booking time.
    pub enable_online_payments: bool,
}

impl Default for ClinicSettings {
    fn default() -> Self {
        Self {
            maintenance_mode: false,
            auto_refresh_interval: 30,
            enable_online_payments: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingRow {
    pub key: String,
    pub value: serde_json::Value,
}
