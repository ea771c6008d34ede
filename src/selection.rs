use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use serde::{Serialize, Deserialize};
use crate::availability::{AvailabilityResolver, BookedSlots, SlotChoice};

/// Where a selection is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPhase {
    Unset,
    Suggested,
    UserPicked,
    AutoCorrected,
    /// The selected date has no free hour left
    FullyBooked,
}

/// The date and time currently chosen in the booking form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub date: Option<NaiveDate>,
    pub hour: Option<u32>,
    pub minute: u32,
    pub phase: SelectionPhase,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            date: None,
            hour: None,
            minute: 0,
            phase: SelectionPhase::Unset,
        }
    }
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills the selection with the resolver's default pick
    pub fn suggest(&mut self, resolver: &AvailabilityResolver) -> SelectionPhase {
        match resolver.suggested_default() {
            Some(choice) => {
                self.date = Some(choice.date);
                self.hour = Some(choice.hour);
                self.minute = choice.minute;
                self.phase = SelectionPhase::Suggested;
            }
            None => {
                self.hour = None;
                self.phase = SelectionPhase::FullyBooked;
            }
        }
        self.phase
    }

    /// Records a user pick and immediately revalidates it
    pub fn pick(
        &mut self,
        choice: SlotChoice,
        resolver: &AvailabilityResolver,
    ) -> SelectionPhase {
        self.date = Some(choice.date);
        self.hour = Some(choice.hour);
        self.minute = choice.minute;
        self.phase = SelectionPhase::UserPicked;
        self.revalidate(resolver)
    }

    /// Changes the date, keeping the hour if it is still free there
    pub fn change_date(
        &mut self,
        date: NaiveDate,
        resolver: &AvailabilityResolver,
    ) -> SelectionPhase {
        self.date = Some(date);
        if self.hour.is_none() {
            self.hour = resolver.best_available_hour(date);
        }
        self.phase = SelectionPhase::UserPicked;
        self.revalidate(resolver)
    }

    /// Moves the hour to the next (or previous) unblocked hour.
    /// Leaves the selection untouched when there is none in that direction.
    pub fn step_hour(&mut self, forward: bool, resolver: &AvailabilityResolver) -> SelectionPhase {
        let (Some(date), Some(hour)) = (self.date, self.hour) else {
            return self.phase;
        };

        let mut candidates: Vec<u32> = resolver
            .business_hours()
            .hours()
            .filter(|&h| if forward { h > hour } else { h < hour })
            .collect();
        if !forward {
            candidates.reverse();
        }

        if let Some(next) = candidates
            .into_iter()
            .find(|&h| !resolver.is_hour_blocked(date, h))
        {
            self.hour = Some(next);
            self.minute = 0;
            self.phase = SelectionPhase::UserPicked;
        }
        self.phase
    }

    /// Re-checks the selection against fresh resolver output. A blocked hour is
    /// replaced by the first free hour of the day; with no free hour left the
    /// hour is cleared and the phase becomes `FullyBooked`.
    pub fn revalidate(&mut self, resolver: &AvailabilityResolver) -> SelectionPhase {
        let Some(date) = self.date else {
            return self.phase;
        };

        let blocked = match self.hour {
            Some(hour) => resolver.is_hour_blocked(date, hour),
            None => true,
        };
        if !blocked {
            if self.phase == SelectionPhase::FullyBooked {
                self.phase = SelectionPhase::UserPicked;
            }
            return self.phase;
        }

        match resolver.best_available_hour(date) {
            Some(hour) => {
                debug!("auto-correcting selection on {date} from {:?} to {hour}", self.hour);
                self.hour = Some(hour);
                self.minute = 0;
                self.phase = SelectionPhase::AutoCorrected;
            }
            None => {
                self.hour = None;
                self.minute = 0;
                self.phase = SelectionPhase::FullyBooked;
            }
        }
        self.phase
    }

    /// The selection as a concrete slot, when it can be submitted
    pub fn resolved(&self) -> Option<SlotChoice> {
        match self.phase {
            SelectionPhase::Unset | SelectionPhase::FullyBooked => None,
            _ => Some(SlotChoice {
                date: self.date?,
                hour: self.hour?,
                minute: self.minute,
            }),
        }
    }
}

/// Ticket for one booked-slot request; only the latest ticket is honoured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchToken {
    generation: u64,
    agent_id: String,
}

impl FetchToken {
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedState {
    #[default]
    Empty,
    Pending,
    Fresh,
    Failed,
}

/// Booked-slot data for the agent currently shown, guarded by a generation
/// counter so a slow response for a previous agent or date cannot overwrite
/// newer data
#[derive(Debug, Default)]
pub struct SlotFeed {
    generation: u64,
    agent_id: Option<String>,
    state: FeedState,
    slots: BookedSlots,
}

impl SlotFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FeedState {
        self.state
    }

    pub fn is_fresh(&self) -> bool {
        self.state() == FeedState::Fresh
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.agent_id.as_deref()
    }

    pub fn slots(&self) -> &BookedSlots {
        &self.slots
    }

    /// Starts a new request. Any earlier token becomes stale.
    pub fn begin(&mut self, agent_id: &str) -> FetchToken {
        self.generation += 1;
        if self.agent_id.as_deref() != Some(agent_id) {
            self.slots = BookedSlots::new();
        }
        self.agent_id = Some(agent_id.to_string());
        self.state = FeedState::Pending;
        FetchToken {
            generation: self.generation,
            agent_id: agent_id.to_string(),
        }
    }

    fn is_current(&self, token: &FetchToken) -> bool {
        token.generation == self.generation
            && self.agent_id.as_deref() == Some(token.agent_id.as_str())
    }

    /// Applies a response. Returns false when the token is stale.
    pub fn complete(&mut self, token: &FetchToken, slots: BookedSlots) -> bool {
        if !self.is_current(token) {
            debug!(
                "dropping stale slot response for {} (generation {}, current {})",
                token.agent_id, token.generation, self.generation
            );
            return false;
        }
        self.slots = slots;
        self.state = FeedState::Fresh;
        true
    }

    /// Marks the current request as failed; stale failures are ignored
    pub fn fail(&mut self, token: &FetchToken) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.state = FeedState::Failed;
        true
    }
}

/// A booking form's state: the agent's booked-slot feed plus the selection
#[derive(Debug, Default)]
pub struct BookingSession {
    pub feed: SlotFeed,
    pub selection: SelectionState,
}

impl BookingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switching agents starts a fresh fetch and invalidates older ones
    pub fn switch_agent(&mut self, agent_id: &str) -> FetchToken {
        self.feed.begin(agent_id)
    }

    /// Feeds a fetch result in and revalidates the selection against it.
    /// Returns None when the result was stale.
    pub fn receive_slots(
        &mut self,
        token: &FetchToken,
        slots: BookedSlots,
        now: NaiveDateTime,
    ) -> Option<SelectionPhase> {
        if !self.feed.complete(token, slots) {
            return None;
        }
        let resolver = AvailabilityResolver::new(now, self.feed.slots());
        let phase = if self.selection.phase == SelectionPhase::Unset {
            self.selection.suggest(&resolver)
        } else {
            self.selection.revalidate(&resolver)
        };
        Some(phase)
    }

    /// A slot ready to submit: data must be fresh and the selection resolved
    pub fn submittable(&self) -> Option<SlotChoice> {
        if !self.feed.is_fresh() {
            return None;
        }
        self.selection.resolved()
    }
}
