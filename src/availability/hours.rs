use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Serialize, Deserialize};

/// First bookable hour of the office day
pub const OPENING_HOUR: u32 = 8;
/// Last bookable hour; at or after this time the current day is closed
pub const CLOSING_HOUR: u32 = 18;
/// Hour used when the suggestion rolls over to another day
pub const DEFAULT_SUGGESTED_HOUR: u32 = 9;

/// Daily window in which appointments may start, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    pub open: u32,
    pub close: u32,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            open: OPENING_HOUR,
            close: CLOSING_HOUR,
        }
    }
}

impl BusinessHours {
    pub fn contains(&self, hour: u32) -> bool {
        hour >= self.open && hour <= self.close
    }

    pub fn hours(&self) -> impl Iterator<Item = u32> {
        self.open..=self.close
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Advances day by day until the date is a weekday
pub fn skip_weekend(mut date: NaiveDate) -> NaiveDate {
    while is_weekend(date) {
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    date
}
