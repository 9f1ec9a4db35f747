pub mod settings;

pub use settings::{fold_settings, SettingsService};
