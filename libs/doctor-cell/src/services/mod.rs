pub mod doctor;
pub mod session;

pub use doctor::DoctorService;
pub use session::SessionService;
pub use session::{consultation_duration_minutes, valid_session_transitions};
