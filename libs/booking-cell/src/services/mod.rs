pub mod booking;
pub mod sequence;
pub mod validation;

pub use booking::BookingService;
pub use sequence::next_sequence_number;
pub use validation::validate_booking;
