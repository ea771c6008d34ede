use crate::availability::BookedSlot;
use crate::form::submission::AppointmentRequest;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Column layout of the appointment ledger; `parser::load_bookings` reads it back
pub const LEDGER_HEADERS: [&str; 6] = [
    "agent_id",
    "start",
    "client_name",
    "client_email",
    "property_id",
    "notes",
];

const START_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Appends an accepted appointment to the CSV ledger, writing the header
/// first when the file does not exist yet
pub fn export_appointment_to_csv(
    appointment: &AppointmentRequest,
    csv_path: &Path,
) -> Result<(), csv::Error> {
    let is_new = !csv_path.exists();

    if let Some(parent) = csv_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if is_new {
        wtr.write_record(LEDGER_HEADERS)?;
    }

    let start = appointment.start.format(START_FORMAT).to_string();
    wtr.write_record([
        appointment.agent_id.as_str(),
        start.as_str(),
        appointment.client_name.as_str(),
        appointment.client_email.as_str(),
        appointment.property_id.as_deref().unwrap_or(""),
        appointment.notes.as_deref().unwrap_or(""),
    ])?;

    wtr.flush()?;
    Ok(())
}

/// Replaces the ledger with a plain list of booked slots (after an import)
pub fn write_bookings_to_csv(bookings: &[BookedSlot], csv_path: &Path) -> Result<(), csv::Error> {
    if let Some(parent) = csv_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_path(csv_path)?;

    wtr.write_record(LEDGER_HEADERS)?;
    for booking in bookings {
        let start = booking.start.format(START_FORMAT).to_string();
        wtr.write_record([booking.agent_id.as_str(), start.as_str(), "", "", "", ""])?;
    }

    wtr.flush()?;
    Ok(())
}
