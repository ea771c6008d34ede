use actix_web::{web, App, HttpServer, HttpResponse, Result, HttpRequest, middleware};
use chrono::{NaiveDate, Timelike};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use crate::availability::resolver::{first_free, HourStatus};
use crate::availability::{
    parse_candidate_date, AvailabilityResolver, BookedSlot, Clock, DayAvailability, SlotChoice, SystemClock,
};
use crate::compare::{normalize_scores, PropertyRecord};
use crate::config::Config;
use crate::form::{export_appointment_to_csv, validate_submission, write_bookings_to_csv, BookingRequest};
use crate::parser::{agent_ids, load_bookings, load_bookings_from_reader, slots_for_agent};
use crate::selection::SelectionState;

/// Longest calendar range served in one request
const MAX_CALENDAR_DAYS: u32 = 62;

// In-memory booked slots, mirrored to the CSV ledger
pub struct AppState {
    pub bookings: Mutex<Vec<BookedSlot>>,
    pub admin_password: String,
    pub ledger_path: PathBuf,
    pub calendar_days: u32,
    pub clock: Box<dyn Clock>,
}

impl AppState {
    pub fn new(config: &Config, bookings: Vec<BookedSlot>, clock: Box<dyn Clock>) -> Self {
        Self {
            bookings: Mutex::new(bookings),
            admin_password: config.admin_password.clone(),
            ledger_path: config.bookings_csv.clone(),
            calendar_days: config.calendar_days,
            clock,
        }
    }

    fn lock_bookings(&self) -> Result<MutexGuard<'_, Vec<BookedSlot>>> {
        self.bookings
            .lock()
            .map_err(|_| actix_web::error::ErrorInternalServerError("booking state poisoned"))
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    password: String,
}

#[derive(Deserialize)]
pub struct CalendarQuery {
    from: Option<String>,
    days: Option<u32>,
}

#[derive(Serialize)]
pub struct CalendarDay {
    date: NaiveDate,
    disabled: bool,
    fully_booked: bool,
    selectable: bool,
    best_hour: Option<u32>,
}

#[derive(Serialize)]
pub struct CalendarResponse {
    agent_id: String,
    days: Vec<CalendarDay>,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    agent_id: String,
    date: String,
    disabled: bool,
    fully_booked: bool,
    hours: Vec<HourStatus>,
    best_hour: Option<u32>,
}

#[derive(Serialize)]
pub struct SuggestionResponse {
    agent_id: String,
    suggestion: Option<SlotChoice>,
}

#[derive(Deserialize)]
pub struct SelectionRequest {
    date: String,
    hour: Option<u32>,
    #[serde(default)]
    minute: u32,
}

#[derive(Serialize)]
pub struct StatsResponse {
    agents: BTreeMap<String, AgentStats>,
    hour_popularity: BTreeMap<u32, u32>,
}

#[derive(Serialize, Default)]
pub struct AgentStats {
    total_bookings: u32,
    upcoming_bookings: u32,
}

fn failure(message: impl ToString) -> serde_json::Value {
    serde_json::json!({"success": false, "error": message.to_string()})
}

impl From<DayAvailability> for CalendarDay {
    fn from(day: DayAvailability) -> Self {
        Self {
            selectable: day.is_selectable(),
            date: day.date,
            disabled: day.disabled,
            fully_booked: day.fully_booked,
            best_hour: day.best_hour,
        }
    }
}

// Calendar endpoint: which dates can be picked
async fn get_calendar(
    agent: web::Path<String>,
    query: web::Query<CalendarQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let now = state.clock.now();
    let from = query
        .from
        .as_deref()
        .and_then(parse_candidate_date)
        .unwrap_or_else(|| now.date());
    let days = query.days.unwrap_or(state.calendar_days).clamp(1, MAX_CALENDAR_DAYS);

    let slots = slots_for_agent(&state.lock_bookings()?, &agent);
    let resolver = AvailabilityResolver::new(now, &slots);

    Ok(HttpResponse::Ok().json(CalendarResponse {
        agent_id: agent.into_inner(),
        days: resolver.calendar(from, days).into_iter().map(CalendarDay::from).collect(),
    }))
}

// Hour grid for one date; unreadable dates come back fully blocked
async fn get_availability(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (agent_id, raw_date) = path.into_inner();
    let now = state.clock.now();
    let slots = slots_for_agent(&state.lock_bookings()?, &agent_id);
    let resolver = AvailabilityResolver::new(now, &slots);

    let disabled = resolver.is_date_str_disabled(&raw_date);
    let hours = resolver.hour_statuses_str(&raw_date);
    let best_hour = first_free(&hours);

    Ok(HttpResponse::Ok().json(AvailabilityResponse {
        agent_id,
        date: raw_date,
        disabled,
        fully_booked: !disabled && best_hour.is_none(),
        hours,
        best_hour,
    }))
}

async fn get_suggestion(
    agent: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let slots = slots_for_agent(&state.lock_bookings()?, &agent);
    let resolver = AvailabilityResolver::new(state.clock.now(), &slots);

    Ok(HttpResponse::Ok().json(SuggestionResponse {
        suggestion: resolver.suggested_default(),
        agent_id: agent.into_inner(),
    }))
}

// Revalidates the form's current pick, auto-correcting a blocked hour
async fn post_selection(
    agent: web::Path<String>,
    req: web::Json<SelectionRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let slots = slots_for_agent(&state.lock_bookings()?, &agent);
    let resolver = AvailabilityResolver::new(state.clock.now(), &slots);
    let mut selection = SelectionState::new();

    match (parse_candidate_date(&req.date), req.hour) {
        (Some(date), Some(hour)) => {
            selection.pick(SlotChoice { date, hour, minute: req.minute }, &resolver);
        }
        (Some(date), None) => {
            selection.change_date(date, &resolver);
        }
        (None, _) => {
            selection.suggest(&resolver);
        }
    }

    Ok(HttpResponse::Ok().json(selection))
}

// Booking submission endpoint
async fn post_appointment(
    req: web::Json<BookingRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let now = state.clock.now();
    let mut bookings = state.lock_bookings()?;
    let slots = slots_for_agent(&bookings, req.agent_id.trim());
    let resolver = AvailabilityResolver::new(now, &slots);

    // The server holds the booked slots itself, so they are always current here
    let appointment = match validate_submission(&req, &resolver, true) {
        Ok(appointment) => appointment,
        Err(e) => {
            info!("rejected booking for {}: {}", req.agent_id, e);
            let body = failure(&e);
            return Ok(if e.is_conflict() {
                HttpResponse::Conflict().json(body)
            } else {
                HttpResponse::BadRequest().json(body)
            });
        }
    };

    if let Err(e) = export_appointment_to_csv(&appointment, &state.ledger_path) {
        error!("failed to record appointment in {}: {}", state.ledger_path.display(), e);
        return Ok(HttpResponse::InternalServerError().json(failure("Failed to record appointment")));
    }

    bookings.push(BookedSlot {
        agent_id: appointment.agent_id.clone(),
        start: appointment.start,
    });
    info!("booked {} at {}", appointment.agent_id, appointment.start);

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "appointment": appointment,
    })))
}

async fn post_compare(req: web::Json<Vec<PropertyRecord>>) -> Result<HttpResponse> {
    match normalize_scores(&req) {
        Ok(scores) => Ok(HttpResponse::Ok().json(scores)),
        Err(e) => Ok(HttpResponse::BadRequest().json(failure(e))),
    }
}

// Admin login endpoint
async fn admin_login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    if req.password == state.admin_password {
        Ok(HttpResponse::Ok().json(serde_json::json!({"success": true})))
    } else {
        Ok(HttpResponse::Unauthorized().json(failure("Invalid password")))
    }
}

// Admin CSV upload endpoint, replaces every booked slot
async fn admin_upload(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let password = req
        .headers()
        .get("X-Admin-Password")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if password != state.admin_password {
        return Ok(HttpResponse::Unauthorized().json(failure("Unauthorized")));
    }

    let imported = match load_bookings_from_reader(&body[..]) {
        Ok(imported) => imported,
        Err(e) => {
            warn!("booking import rejected: {}", e);
            return Ok(HttpResponse::BadRequest().json(failure(format!("Failed to process CSV: {}", e))));
        }
    };

    // Held across the rewrite so no appointment lands between file and memory
    let mut bookings = state.lock_bookings()?;
    write_bookings_to_csv(&imported, &state.ledger_path)
        .map_err(|e| actix_web::error::ErrorInternalServerError(format!("Failed to save ledger: {}", e)))?;

    let agents = agent_ids(&imported);
    info!("imported {} bookings for {} agents", imported.len(), agents.len());
    let count = imported.len();
    *bookings = imported;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "bookings": count,
        "agents": agents,
    })))
}

// Stats endpoint
async fn get_stats(state: web::Data<AppState>) -> Result<HttpResponse> {
    let now = state.clock.now();
    let bookings = state.lock_bookings()?;

    let mut agents: HashMap<String, AgentStats> = HashMap::new();
    let mut hour_popularity: BTreeMap<u32, u32> = BTreeMap::new();

    for booking in bookings.iter() {
        let stats = agents.entry(booking.agent_id.clone()).or_default();
        stats.total_bookings += 1;
        if booking.start >= now {
            stats.upcoming_bookings += 1;
        }
        *hour_popularity.entry(booking.start.hour()).or_insert(0) += 1;
    }

    Ok(HttpResponse::Ok().json(StatsResponse {
        agents: agents.into_iter().collect(),
        hour_popularity,
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/login", web::post().to(admin_login))
        .route("/api/upload", web::post().to(admin_upload))
        .route("/api/stats", web::get().to(get_stats))
        .route("/api/compare", web::post().to(post_compare))
        .route("/api/appointments", web::post().to(post_appointment))
        .route("/api/agents/{agent}/calendar", web::get().to(get_calendar))
        .route("/api/agents/{agent}/suggestion", web::get().to(get_suggestion))
        .route("/api/agents/{agent}/selection", web::post().to(post_selection))
        .route("/api/agents/{agent}/availability/{date}", web::get().to(get_availability));
}

/// Reads the ledger the server starts from. A missing file means no bookings
/// yet; a file that cannot be read is an error, never an empty set.
fn load_ledger(path: &Path) -> std::io::Result<Vec<BookedSlot>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let bookings = load_bookings(path).map_err(|e| {
        error!("cannot load ledger {}: {}", path.display(), e);
        std::io::Error::new(std::io::ErrorKind::InvalidData, e)
    })?;
    info!("loaded {} bookings from {}", bookings.len(), path.display());
    Ok(bookings)
}

/// Loads the ledger (if any) and serves the booking API
pub async fn start_server(config: Config) -> std::io::Result<()> {
    let bookings = load_ledger(&config.bookings_csv)?;

    let app_state = web::Data::new(AppState::new(&config, bookings, Box::new(SystemClock)));

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", config.port))?
    .run()
    .await
}
