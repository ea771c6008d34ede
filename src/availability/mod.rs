pub mod types;
pub mod hours;
pub mod clock;
pub mod resolver;
pub mod suggestion;

pub use types::{BookedSlot, BookedSlots, SlotChoice};
pub use hours::BusinessHours;
pub use clock::{Clock, SystemClock};
pub use resolver::{parse_candidate_date, AvailabilityResolver, DayAvailability};
