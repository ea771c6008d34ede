use csv::{Reader, ReaderBuilder, StringRecord};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use chrono::{DateTime, NaiveDateTime};
use log::warn;
use thiserror::Error;
use crate::availability::{BookedSlot, BookedSlots};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read bookings CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("bookings CSV has no `{0}` column")]
    MissingColumn(&'static str),
}

/// Timestamp layouts accepted for booking start times, besides RFC 3339
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses an appointment start time. Offsets are dropped and the wall time
/// in the given offset is kept.
pub fn parse_start_time(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(with_offset.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
}

fn column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.trim().to_lowercase();
        names.iter().any(|name| h == *name)
    })
}

/// Loads booked slots from a CSV file
pub fn load_bookings<P: AsRef<Path>>(csv_path: P) -> Result<Vec<BookedSlot>, ImportError> {
    let reader = ReaderBuilder::new().flexible(true).from_path(csv_path)?;
    read_bookings(reader)
}

/// Loads booked slots from any CSV source (e.g. an uploaded body)
pub fn load_bookings_from_reader<R: Read>(source: R) -> Result<Vec<BookedSlot>, ImportError> {
    read_bookings(ReaderBuilder::new().flexible(true).from_reader(source))
}

/// Reads `agent_id` and `start` columns. Rows too short to hold both, rows
/// with a missing agent and rows with an unparseable start are skipped;
/// exact duplicates are merged.
fn read_bookings<R: Read>(mut reader: Reader<R>) -> Result<Vec<BookedSlot>, ImportError> {
    let headers = reader.headers()?.clone();
    let agent_col = column(&headers, &["agent_id", "agent"]).ok_or(ImportError::MissingColumn("agent_id"))?;
    let start_col = column(&headers, &["start", "start_time", "date"]).ok_or(ImportError::MissingColumn("start"))?;

    let mut seen = HashSet::new();
    let mut bookings = Vec::new();

    for (line, result) in reader.records().enumerate() {
        let record = result?;

        let (Some(agent_id), Some(raw_start)) = (record.get(agent_col), record.get(start_col)) else {
            // header is line 1
            warn!(
                "skipping booking on line {}: expected at least {} fields, found {}",
                line + 2,
                agent_col.max(start_col) + 1,
                record.len()
            );
            continue;
        };
        let agent_id = agent_id.trim().to_string();
        if agent_id.is_empty() {
            continue;
        }

        let Some(start) = parse_start_time(raw_start) else {
            warn!("skipping booking on line {}: unparseable start {raw_start:?}", line + 2);
            continue;
        };

        if seen.insert((agent_id.clone(), start)) {
            bookings.push(BookedSlot { agent_id, start });
        }
    }

    Ok(bookings)
}

/// Booked hours of a single agent
pub fn slots_for_agent(bookings: &[BookedSlot], agent_id: &str) -> BookedSlots {
    bookings
        .iter()
        .filter(|booking| booking.agent_id == agent_id)
        .collect()
}

/// Distinct agent ids, sorted
pub fn agent_ids(bookings: &[BookedSlot]) -> Vec<String> {
    let mut ids: Vec<String> = bookings
        .iter()
        .map(|booking| booking.agent_id.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    ids.sort();
    ids
}
