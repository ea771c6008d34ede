use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::availability::{parse_candidate_date, AvailabilityResolver, SlotChoice};

/// Minutes the time widget can step to
pub const ALLOWED_MINUTES: [u32; 2] = [0, 30];

/// Booking form payload from the frontend
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub agent_id: String,
    pub client_name: String,
    pub client_email: String,
    pub property_id: Option<String>,
    pub date: String,
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
    pub notes: Option<String>,
}

/// A validated appointment, ready to be sent on and recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRequest {
    pub agent_id: String,
    pub client_name: String,
    pub client_email: String,
    pub property_id: Option<String>,
    pub start: NaiveDateTime,
    pub notes: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum BookingError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("client email looks invalid")]
    InvalidEmail,
    #[error("minute must be one of 0 or 30, got {0}")]
    InvalidMinute(u32),
    #[error("hour must be between {open:02}:00 and {close:02}:00, got {hour}")]
    InvalidHour { hour: u32, open: u32, close: u32 },
    #[error("could not read date {0:?}")]
    InvalidDate(String),
    #[error("{0} cannot be booked")]
    DateUnavailable(NaiveDate),
    #[error("{date} is fully booked")]
    FullyBooked { date: NaiveDate },
    #[error("{date} {hour:02}:00 is not available, next free hour is {suggested:02}:00")]
    HourBlocked { date: NaiveDate, hour: u32, suggested: u32 },
    #[error("availability for this agent is still loading, try again")]
    StaleAvailability,
}

impl BookingError {
    /// Conflicts with existing bookings, as opposed to malformed input
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            BookingError::FullyBooked { .. }
                | BookingError::HourBlocked { .. }
                | BookingError::StaleAvailability
        )
    }
}

/// Validates a booking request against the resolver. `availability_fresh`
/// must be false while the agent's booked slots are still being fetched.
pub fn validate_submission(
    req: &BookingRequest,
    resolver: &AvailabilityResolver,
    availability_fresh: bool,
) -> Result<AppointmentRequest, BookingError> {
    if req.agent_id.trim().is_empty() {
        return Err(BookingError::MissingField("agent"));
    }
    if req.client_name.trim().is_empty() {
        return Err(BookingError::MissingField("client name"));
    }

    let email = req.client_email.trim();
    if email.is_empty() {
        return Err(BookingError::MissingField("client email"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => return Err(BookingError::InvalidEmail),
    }

    if !ALLOWED_MINUTES.contains(&req.minute) {
        return Err(BookingError::InvalidMinute(req.minute));
    }
    let office = resolver.business_hours();
    if !office.contains(req.hour) {
        return Err(BookingError::InvalidHour {
            hour: req.hour,
            open: office.open,
            close: office.close,
        });
    }

    let date = parse_candidate_date(&req.date).ok_or_else(|| BookingError::InvalidDate(req.date.clone()))?;
    if resolver.is_date_disabled(date) {
        return Err(BookingError::DateUnavailable(date));
    }

    if !availability_fresh {
        return Err(BookingError::StaleAvailability);
    }

    if resolver.is_hour_blocked(date, req.hour) {
        return Err(match resolver.best_available_hour(date) {
            Some(suggested) => BookingError::HourBlocked {
                date,
                hour: req.hour,
                suggested,
            },
            None => BookingError::FullyBooked { date },
        });
    }

    let choice = SlotChoice {
        date,
        hour: req.hour,
        minute: req.minute,
    };
    let start = choice
        .to_datetime()
        .ok_or_else(|| BookingError::InvalidDate(req.date.clone()))?;

    Ok(AppointmentRequest {
        agent_id: req.agent_id.trim().to_string(),
        client_name: req.client_name.trim().to_string(),
        client_email: email.to_string(),
        property_id: req.property_id.clone().filter(|id| !id.trim().is_empty()),
        start,
        notes: req.notes.clone().filter(|notes| !notes.trim().is_empty()),
    })
}
