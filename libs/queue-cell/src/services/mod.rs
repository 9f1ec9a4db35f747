pub mod lifecycle;
pub mod payments;
pub mod status;
pub mod visits;

pub use lifecycle::VisitLifecycleService;
pub use payments::PaymentService;
pub use status::QueueStatusService;
pub use visits::VisitService;
