use std::fs::File;
use std::io::Write;
use crate::availability::{DayAvailability, SlotChoice};

/// One line per date: `2025-06-02 Mon  08 09 -- -- 12 ...`, with `--` for a
/// blocked hour and a trailing marker for closed or fully booked days
pub fn format_day_line(day: &DayAvailability) -> String {
    let mut line = day.date.format("%Y-%m-%d %a ").to_string();

    if day.disabled {
        line.push_str(" [CLOSED]");
        return line;
    }

    for status in &day.hours {
        if status.blocked {
            line.push_str(" --");
        } else {
            line.push_str(&format!(" {:02}", status.hour));
        }
    }

    if day.fully_booked {
        line.push_str(" [FULLY BOOKED]");
    }
    line
}

pub fn format_choice(choice: &SlotChoice) -> String {
    format!(
        "{} {:02}:{:02}",
        choice.date.format("%a %Y-%m-%d"),
        choice.hour,
        choice.minute
    )
}

/// Prints an agent's availability in a readable format
pub fn print_availability(agent_id: &str, days: &[DayAvailability], suggestion: Option<&SlotChoice>) {
    println!("\n=== Availability for {} ===", agent_id);

    let open_days = days.iter().filter(|d| d.is_selectable()).count();
    println!("Bookable days: {} of {}", open_days, days.len());

    match suggestion {
        Some(choice) => println!("Suggested slot: {}", format_choice(choice)),
        None => println!("⚠️  No free slot found"),
    }

    println!();
    for day in days {
        println!("  {}", format_day_line(day));
    }
}

/// Writes the availability grid to a file, one date per line
pub fn write_availability_to_file(
    agent_id: &str,
    days: &[DayAvailability],
    filename: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = File::create(filename)?;

    writeln!(file, "** {} **", agent_id)?;
    for day in days {
        writeln!(file, "{}", format_day_line(day))?;
    }

    Ok(())
}
