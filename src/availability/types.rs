use std::collections::{BTreeSet, HashMap};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Serialize, Deserialize};

/// An existing appointment start time for one agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedSlot {
    pub agent_id: String,
    pub start: NaiveDateTime,
}

/// Booked hours for a single agent, indexed by date
#[derive(Debug, Clone, Default)]
pub struct BookedSlots {
    by_date: HashMap<NaiveDate, BTreeSet<u32>>, // date -> booked start hours
}

impl BookedSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_starts<I>(starts: I) -> Self
    where
        I: IntoIterator<Item = NaiveDateTime>,
    {
        let mut slots = Self::new();
        for start in starts {
            slots.insert(start);
        }
        slots
    }

    /// Records a booking. Minutes are dropped, a 10:30 booking occupies hour 10.
    pub fn insert(&mut self, start: NaiveDateTime) {
        self.by_date
            .entry(start.date())
            .or_default()
            .insert(start.hour());
    }

    pub fn is_booked(&self, date: NaiveDate, hour: u32) -> bool {
        self.by_date
            .get(&date)
            .map(|hours| hours.contains(&hour))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.by_date.values().map(|hours| hours.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> FromIterator<&'a BookedSlot> for BookedSlots {
    fn from_iter<T: IntoIterator<Item = &'a BookedSlot>>(iter: T) -> Self {
        Self::from_starts(iter.into_iter().map(|slot| slot.start))
    }
}

/// A concrete date/hour/minute pick, as bound to the time widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotChoice {
    pub date: NaiveDate,
    pub hour: u32,
    pub minute: u32,
}

impl SlotChoice {
    pub fn at_hour(date: NaiveDate, hour: u32) -> Self {
        Self { date, hour, minute: 0 }
    }

    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).map(|time| self.date.and_time(time))
    }
}
