//! Human-readable flight summary lines
//!
//! Line layout is consumed by downstream tooling and must stay stable:
//!
//! ```text
//! 2024-06-01: KDTW → KORD (DAL123) | start 2024-06-01 10:00 EDT | end 2024-06-01 12:30 EDT | dur 2.50 h
//! ```
use crate::domain::{FlightRecord, ProcessedFlight};
use chrono::{DateTime, NaiveDateTime, Offset, Utc};
use chrono_tz::Tz;

pub const DEFAULT_DECIMALS: usize = 2;

/// Format flights as summary lines, in input order.
///
/// Flights without both airports, and flights whose local duration is
/// negative or not finite, are left out. This never fails.
pub fn summarize(flights: &[FlightRecord], timezone: &str, decimals: usize) -> Vec<String> {
    let zone = resolve_zone(timezone);
    if zone.is_none() {
        tracing::warn!(timezone, "Unknown time zone, summarizing in UTC");
    }

    flights
        .iter()
        .filter(|f| has_route(f))
        .filter_map(|f| process(f, zone))
        .filter(is_summarizable)
        .map(|p| summary_line(&p, decimals))
        .collect()
}

/// IANA zone lookup; names match regardless of case (`america/detroit`).
pub fn resolve_zone(timezone: &str) -> Option<Tz> {
    timezone
        .parse::<Tz>()
        .ok()
        .or_else(|| Tz::from_str_insensitive(timezone).ok())
}

/// A flight can only be summarized with both airports known
pub fn has_route(flight: &FlightRecord) -> bool {
    let known = |code: &Option<String>| code.as_deref().is_some_and(|c| !c.is_empty());
    known(&flight.est_departure_airport) && known(&flight.est_arrival_airport)
}

/// Duration must be a finite, non-negative number of hours.
///
/// Wall-clock differences go negative across a DST fall-back, and those
/// flights are dropped instead of reported.
pub fn is_summarizable(flight: &ProcessedFlight) -> bool {
    flight.duration_hours.is_finite() && flight.duration_hours >= 0.0
}

/// Convert a flight into `zone` wall-clock times; `None` zone means UTC with
/// no abbreviation. Returns `None` only for timestamps outside chrono's range.
pub fn process(flight: &FlightRecord, zone: Option<Tz>) -> Option<ProcessedFlight> {
    let first_seen = DateTime::<Utc>::from_timestamp(flight.first_seen, 0)?;
    let last_seen = DateTime::<Utc>::from_timestamp(flight.last_seen, 0)?;

    let (dep_local, dep_tz) = localize(first_seen, zone);
    let (arr_local, arr_tz) = localize(last_seen, zone);
    let duration_hours = (arr_local - dep_local).num_seconds() as f64 / 3600.0;

    Some(ProcessedFlight {
        departure: flight.est_departure_airport.clone().unwrap_or_default(),
        arrival: flight.est_arrival_airport.clone().unwrap_or_default(),
        callsign: flight
            .callsign
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        first_seen,
        last_seen,
        dep_local,
        arr_local,
        dep_tz,
        arr_tz,
        duration_hours,
    })
}

/// Abbreviations shown as-is; every other zone is labelled by its offset.
const NAMED_ABBREVIATIONS: &[&str] = &[
    "UTC", "GMT", "AST", "ADT", "EST", "EDT", "CST", "CDT", "MST", "MDT", "PST", "PDT", "AKST",
    "AKDT", "HST", "HDT",
];

fn localize(instant: DateTime<Utc>, zone: Option<Tz>) -> (NaiveDateTime, String) {
    match zone {
        Some(tz) => {
            let local = instant.with_timezone(&tz);
            let abbreviation = local.format("%Z").to_string();
            let label = if NAMED_ABBREVIATIONS.contains(&abbreviation.as_str()) {
                abbreviation
            } else {
                offset_label(local.offset().fix().local_minus_utc())
            };
            (local.naive_local(), label)
        }
        None => (instant.naive_utc(), String::new()),
    }
}

/// `GMT`, `GMT+2`, `GMT-3`, `GMT+5:30`
fn offset_label(offset_seconds: i32) -> String {
    if offset_seconds == 0 {
        return "GMT".to_string();
    }
    let sign = if offset_seconds < 0 { '-' } else { '+' };
    let minutes = offset_seconds.unsigned_abs() / 60;
    match minutes % 60 {
        0 => format!("GMT{}{}", sign, minutes / 60),
        m => format!("GMT{}{}:{:02}", sign, minutes / 60, m),
    }
}

pub fn summary_line(flight: &ProcessedFlight, decimals: usize) -> String {
    let callsign = flight
        .callsign
        .as_ref()
        .map(|c| format!(" ({})", c))
        .unwrap_or_default();

    format!(
        "{day}: {dep} → {arr}{callsign} | start {start} {dep_tz} | end {end} {arr_tz} | dur {dur} h",
        day = flight.arr_local.format("%Y-%m-%d"),
        dep = flight.departure,
        arr = flight.arrival,
        start = flight.dep_local.format("%Y-%m-%d %H:%M"),
        dep_tz = flight.dep_tz,
        end = flight.arr_local.format("%Y-%m-%d %H:%M"),
        arr_tz = flight.arr_tz,
        dur = format_hours(flight.duration_hours, decimals),
    )
}

/// Round half away from zero, then print exactly `decimals` places
pub fn format_hours(hours: f64, decimals: usize) -> String {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (hours * factor).round() / factor;
    format!("{:.*}", decimals, rounded)
}
