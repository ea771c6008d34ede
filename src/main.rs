use std::env;
use estate_booking::availability::clock::FixedClock;
use estate_booking::availability::{AvailabilityResolver, Clock, SystemClock};
use estate_booking::config::Config;
use estate_booking::display::{print_availability, write_availability_to_file};
use estate_booking::parser::{agent_ids, load_bookings, parse_start_time, slots_for_agent};
use estate_booking::web;

fn setup_logging() {
    if env::var("LOG").is_err() {
        env::set_var("LOG", "estate_booking=info,actix_web=info");
    }

    pretty_env_logger::init_custom_env("LOG");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logging();

    let mut config = Config::from_env();
    let args: Vec<String> = env::args().collect();

    // Check if we should run in web mode
    if args.len() > 1 && args[1] == "web" {
        if let Some(port) = args.get(2).and_then(|p| p.parse::<u16>().ok()) {
            config.port = port;
        }

        println!("Starting booking API on port {}...", config.port);
        println!("Bookings ledger: {}", config.bookings_csv.display());
        println!("Access the API at http://localhost:{}/api", config.port);

        web::start_server(config).await?;
        return Ok(());
    }

    // Report mode: `report [agent] [YYYY-MM-DDTHH:MM]`
    let agent_filter = args.get(2).filter(|_| args.get(1).map(String::as_str) == Some("report"));
    let clock: Box<dyn Clock> = match args.get(3).and_then(|raw| parse_start_time(raw)) {
        Some(now) => Box::new(FixedClock(now)),
        None => Box::new(SystemClock),
    };

    println!("Loading bookings from {}...", config.bookings_csv.display());
    let bookings = if config.bookings_csv.exists() {
        load_bookings(&config.bookings_csv)?
    } else {
        println!("No ledger found, every agent is fully open");
        Vec::new()
    };
    println!("Loaded {} booked slots", bookings.len());

    let agents = match agent_filter {
        Some(agent) => vec![agent.clone()],
        None => agent_ids(&bookings),
    };

    let now = clock.now();
    println!("\n=== Availability as of {} ===", now.format("%Y-%m-%d %H:%M"));

    for agent in &agents {
        let slots = slots_for_agent(&bookings, agent);
        if slots.is_empty() {
            println!("\n{} has no bookings on record", agent);
        }
        let resolver = AvailabilityResolver::new(now, &slots);
        let days = resolver.calendar(now.date(), config.calendar_days);
        let suggestion = resolver.suggested_default();

        print_availability(agent, &days, suggestion.as_ref());

        let filename = format!("availability_{}.txt", agent);
        write_availability_to_file(agent, &days, &filename)?;
        println!("Saved to {}", filename);
    }

    Ok(())
}
