pub mod patient;

pub use patient::PatientService;
pub use patient::{build_merge_patch, generate_uid, split_list};
