use chrono::{NaiveDate, NaiveDateTime, Timelike};
use super::hours::{skip_weekend, BusinessHours, DEFAULT_SUGGESTED_HOUR};
use super::resolver::AvailabilityResolver;
use super::types::SlotChoice;

/// How far ahead the suggestion may look for a free hour
pub const SEARCH_HORIZON_DAYS: u32 = 366;

/// Initial pick for the time widget, ignoring bookings:
/// after closing -> 09:00 tomorrow, before opening -> 09:00 today,
/// otherwise the top of the next hour (09:00 tomorrow past closing),
/// moved off weekends
pub fn default_suggestion(now: NaiveDateTime, hours: BusinessHours) -> SlotChoice {
    let today = now.date();
    let tomorrow = today.succ_opt().unwrap_or(today);
    let current_hour = now.hour();

    let choice = if current_hour >= hours.close {
        SlotChoice::at_hour(tomorrow, DEFAULT_SUGGESTED_HOUR)
    } else if current_hour < hours.open {
        SlotChoice::at_hour(today, DEFAULT_SUGGESTED_HOUR)
    } else {
        let next_hour = current_hour + 1;
        if next_hour > hours.close {
            SlotChoice::at_hour(tomorrow, DEFAULT_SUGGESTED_HOUR)
        } else {
            SlotChoice::at_hour(today, next_hour)
        }
    };

    SlotChoice {
        date: skip_weekend(choice.date),
        ..choice
    }
}

impl<'a> AvailabilityResolver<'a> {
    /// Default pick that respects bookings and the minimum date.
    /// Starts from [`default_suggestion`] and moves forward (later hours the
    /// same day, then following days from opening) until a free hour is found.
    pub fn suggested_default(&self) -> Option<SlotChoice> {
        let mut start = default_suggestion(self.now, self.hours);
        if start.date < self.min_date {
            start = SlotChoice::at_hour(skip_weekend(self.min_date), DEFAULT_SUGGESTED_HOUR);
        }

        if !self.is_hour_blocked(start.date, start.hour) {
            return Some(start);
        }

        if let Some(hour) = self.first_free_hour_from(start.date, start.hour) {
            return Some(SlotChoice::at_hour(start.date, hour));
        }

        self.next_available_after(start.date)
    }

    /// First free slot on any date strictly after `date`
    pub fn next_available_after(&self, date: NaiveDate) -> Option<SlotChoice> {
        date.iter_days()
            .skip(1)
            .take(SEARCH_HORIZON_DAYS as usize)
            .filter(|day| !self.is_date_disabled(*day))
            .find_map(|day| {
                self.best_available_hour(day)
                    .map(|hour| SlotChoice::at_hour(day, hour))
            })
    }
}
