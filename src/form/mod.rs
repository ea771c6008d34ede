pub mod submission;
pub mod export;

pub use submission::{AppointmentRequest, BookingError, BookingRequest, validate_submission};
pub use export::{export_appointment_to_csv, write_bookings_to_csv};
