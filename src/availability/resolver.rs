use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;
use super::hours::{is_weekend, BusinessHours};
use super::types::BookedSlots;

/// Format used for dates coming from the calendar widget
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Eligibility of one hour on a candidate date
#[derive(Debug, Clone, Serialize)]
pub struct HourStatus {
    pub hour: u32,
    pub booked: bool,
    pub blocked: bool,
}

/// Everything the time picker needs to render a single date
#[derive(Debug, Clone, Serialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub disabled: bool,
    pub fully_booked: bool,
    pub hours: Vec<HourStatus>,
    pub best_hour: Option<u32>,
}

impl DayAvailability {
    /// A date can be picked when it is enabled and still has a free hour
    pub fn is_selectable(&self) -> bool {
        !self.disabled && !self.fully_booked
    }
}

/// Answers date and hour eligibility questions for one agent at a fixed "now"
#[derive(Debug, Clone, Copy)]
pub struct AvailabilityResolver<'a> {
    pub(super) now: NaiveDateTime,
    pub(super) min_date: NaiveDate,
    pub(super) hours: BusinessHours,
    pub(super) booked: &'a BookedSlots,
}

impl<'a> AvailabilityResolver<'a> {
    /// Creates a resolver whose minimum date is the day of `now`
    pub fn new(now: NaiveDateTime, booked: &'a BookedSlots) -> Self {
        Self {
            now,
            min_date: now.date(),
            hours: BusinessHours::default(),
            booked,
        }
    }

    pub fn with_min_date(mut self, min_date: NaiveDate) -> Self {
        self.min_date = min_date;
        self
    }

    pub fn business_hours(&self) -> BusinessHours {
        self.hours
    }

    fn is_today(&self, date: NaiveDate) -> bool {
        date == self.now.date()
    }

    /// Weekends, dates before the minimum date and today once the office has
    /// closed are never selectable
    pub fn is_date_disabled(&self, date: NaiveDate) -> bool {
        if is_weekend(date) || date < self.min_date {
            return true;
        }
        self.is_today(date) && self.now.hour() >= self.hours.close
    }

    /// Same as [`is_date_disabled`](Self::is_date_disabled) for raw widget input;
    /// anything unparseable counts as disabled
    pub fn is_date_str_disabled(&self, raw: &str) -> bool {
        match parse_candidate_date(raw) {
            Some(date) => self.is_date_disabled(date),
            None => true,
        }
    }

    /// An hour is blocked when it is booked, when the following hour is booked
    /// (buffer before every appointment), or when it is already past today
    pub fn is_hour_blocked(&self, date: NaiveDate, hour: u32) -> bool {
        if !self.hours.contains(hour) || self.is_date_disabled(date) {
            return true;
        }
        let next_booked = hour
            .checked_add(1)
            .map_or(false, |next| self.booked.is_booked(date, next));
        if self.booked.is_booked(date, hour) || next_booked {
            return true;
        }
        self.is_today(date) && hour <= self.now.hour()
    }

    /// First free hour of the day, or None when every hour is blocked
    pub fn best_available_hour(&self, date: NaiveDate) -> Option<u32> {
        self.first_free_hour_from(date, self.hours.open)
    }

    pub(super) fn first_free_hour_from(&self, date: NaiveDate, from: u32) -> Option<u32> {
        self.hours
            .hours()
            .filter(|&hour| hour >= from)
            .find(|&hour| !self.is_hour_blocked(date, hour))
    }

    /// Free hours remain on an enabled date
    pub fn is_date_selectable(&self, date: NaiveDate) -> bool {
        !self.is_date_disabled(date) && self.best_available_hour(date).is_some()
    }

    fn hour_statuses(&self, date: NaiveDate) -> Vec<HourStatus> {
        self.hours
            .hours()
            .map(|hour| HourStatus {
                hour,
                booked: self.booked.is_booked(date, hour),
                blocked: self.is_hour_blocked(date, hour),
            })
            .collect()
    }

    /// Hour grid for raw widget input; anything unparseable comes back with
    /// every hour blocked
    pub fn hour_statuses_str(&self, raw: &str) -> Vec<HourStatus> {
        match parse_candidate_date(raw) {
            Some(date) => self.hour_statuses(date),
            None => self
                .hours
                .hours()
                .map(|hour| HourStatus { hour, booked: false, blocked: true })
                .collect(),
        }
    }

    pub fn day_availability(&self, date: NaiveDate) -> DayAvailability {
        let disabled = self.is_date_disabled(date);
        let hours = self.hour_statuses(date);
        let best_hour = first_free(&hours);

        DayAvailability {
            date,
            disabled,
            fully_booked: !disabled && best_hour.is_none(),
            hours,
            best_hour,
        }
    }

    /// Availability for `days` consecutive dates starting at `from`
    pub fn calendar(&self, from: NaiveDate, days: u32) -> Vec<DayAvailability> {
        from.iter_days()
            .take(days as usize)
            .map(|date| self.day_availability(date))
            .collect()
    }
}

/// First unblocked hour of a grid
pub fn first_free(hours: &[HourStatus]) -> Option<u32> {
    hours.iter().find(|status| !status.blocked).map(|status| status.hour)
}

pub fn parse_candidate_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveTime};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
        date.and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap())
    }

    #[test]
    fn weekends_are_disabled() {
        let booked = BookedSlots::new();
        let resolver = AvailabilityResolver::new(at(date(2025, 6, 2), 9, 0), &booked);

        for offset in 0..28 {
            let day = date(2025, 6, 2) + Duration::days(offset);
            if is_weekend(day) {
                assert!(resolver.is_date_disabled(day), "{day} should be disabled");
            }
        }
        assert!(resolver.is_date_disabled(date(2025, 6, 7)));
        assert!(resolver.is_date_disabled(date(2025, 6, 8)));
    }

    #[test]
    fn dates_before_minimum_are_disabled() {
        let booked = BookedSlots::new();
        let resolver = AvailabilityResolver::new(at(date(2025, 6, 4), 9, 0), &booked)
            .with_min_date(date(2025, 6, 4));

        assert!(resolver.is_date_disabled(date(2025, 6, 3)));
        assert!(resolver.is_date_disabled(date(2025, 5, 28)));
        assert!(!resolver.is_date_disabled(date(2025, 6, 4)));
        assert!(!resolver.is_date_disabled(date(2025, 6, 5)));
    }

    #[test]
    fn today_closes_at_six() {
        let booked = BookedSlots::new();
        let today = date(2025, 6, 4);

        let before = AvailabilityResolver::new(at(today, 17, 59), &booked);
        assert!(!before.is_date_disabled(today));

        let closing = AvailabilityResolver::new(at(today, 18, 0), &booked);
        assert!(closing.is_date_disabled(today));

        let late = AvailabilityResolver::new(at(today, 21, 15), &booked);
        assert!(late.is_date_disabled(today));
        assert!(!late.is_date_disabled(date(2025, 6, 5)));
    }

    #[test]
    fn booking_blocks_its_hour_and_the_one_before() {
        let monday = date(2025, 6, 2);
        let booked = BookedSlots::from_starts([at(monday, 10, 0)]);
        let resolver = AvailabilityResolver::new(at(date(2025, 5, 30), 12, 0), &booked);

        assert!(!resolver.is_date_disabled(monday));
        assert!(resolver.is_hour_blocked(monday, 9));
        assert!(resolver.is_hour_blocked(monday, 10));
        assert!(!resolver.is_hour_blocked(monday, 8));
        assert!(!resolver.is_hour_blocked(monday, 11));
    }

    #[test]
    fn every_booking_blocks_its_buffer_hour() {
        let tuesday = date(2025, 6, 3);
        let starts = [at(tuesday, 9, 0), at(tuesday, 12, 30), at(tuesday, 18, 0)];
        let booked = BookedSlots::from_starts(starts);
        let resolver = AvailabilityResolver::new(at(date(2025, 6, 2), 8, 0), &booked);

        for start in starts {
            let hour = start.hour();
            assert!(resolver.is_hour_blocked(tuesday, hour));
            assert!(resolver.is_hour_blocked(tuesday, hour - 1));
        }
    }

    #[test]
    fn past_and_current_hours_are_blocked_today() {
        let today = date(2025, 6, 4);
        let booked = BookedSlots::new();
        let resolver = AvailabilityResolver::new(at(today, 13, 20), &booked);

        for hour in 8..=13 {
            assert!(resolver.is_hour_blocked(today, hour), "hour {hour}");
        }
        for hour in 14..=18 {
            assert!(!resolver.is_hour_blocked(today, hour), "hour {hour}");
        }
        assert_eq!(resolver.best_available_hour(today), Some(14));
    }

    #[test]
    fn hours_outside_the_office_day_are_blocked() {
        let booked = BookedSlots::new();
        let resolver = AvailabilityResolver::new(at(date(2025, 6, 2), 8, 0), &booked);
        let wednesday = date(2025, 6, 4);

        assert!(resolver.is_hour_blocked(wednesday, 7));
        assert!(resolver.is_hour_blocked(wednesday, 19));
        assert!(!resolver.is_hour_blocked(wednesday, 18));
        assert!(resolver.is_hour_blocked(wednesday, u32::MAX));
    }

    #[test]
    fn unparseable_dates_count_as_disabled() {
        let booked = BookedSlots::new();
        let resolver = AvailabilityResolver::new(at(date(2025, 6, 2), 8, 0), &booked);

        assert!(resolver.is_date_str_disabled("not a date"));
        assert!(resolver.is_date_str_disabled("2025-02-30"));
        assert!(!resolver.is_date_str_disabled("2025-06-04"));

        let grid = resolver.hour_statuses_str("2025-02-30");
        assert_eq!(grid.len(), 11);
        assert!(grid.iter().all(|status| status.blocked && !status.booked));
        assert_eq!(first_free(&grid), None);

        let grid = resolver.hour_statuses_str("2025-06-04");
        assert_eq!(first_free(&grid), Some(8));
    }

    #[test]
    fn fully_booked_day_has_no_best_hour() {
        let thursday = date(2025, 6, 5);
        let booked = BookedSlots::from_starts([9, 11, 13, 15, 17].map(|hour| at(thursday, hour, 0)));
        let resolver = AvailabilityResolver::new(at(date(2025, 6, 2), 8, 0), &booked);

        // 18 is the only hour not covered by a booking or its buffer
        assert_eq!(resolver.best_available_hour(thursday), Some(18));

        let booked = BookedSlots::from_starts([9, 11, 13, 15, 17, 18].map(|hour| at(thursday, hour, 0)));
        let resolver = AvailabilityResolver::new(at(date(2025, 6, 2), 8, 0), &booked);
        let day = resolver.day_availability(thursday);

        assert_eq!(day.best_hour, None);
        assert!(day.fully_booked);
        assert!(!day.disabled);
        assert!(!day.is_selectable());
        assert!(!resolver.is_date_selectable(thursday));
    }

    #[test]
    fn calendar_covers_requested_days() {
        let booked = BookedSlots::new();
        let resolver = AvailabilityResolver::new(at(date(2025, 6, 2), 8, 0), &booked);
        let days = resolver.calendar(date(2025, 6, 2), 7);

        assert_eq!(days.len(), 7);
        assert!(days[0].is_selectable());
        assert!(days[5].disabled);
        assert!(days[6].disabled);
        assert_eq!(days[6].date, date(2025, 6, 8));
    }
}
