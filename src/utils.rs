//! Utility functions
use crate::config::WindowSettings;
use crate::domain::FlightRecord;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashSet;

pub const MIN_HISTORY_DAYS: i64 = 1;
pub const MAX_HISTORY_DAYS: i64 = 30;

/// Half-open time range `[start, end)` used for history queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn begin_epoch(&self) -> i64 {
        self.start.timestamp()
    }

    pub fn end_epoch(&self) -> i64 {
        self.end.timestamp()
    }
}

pub fn clamp_days(days: i64) -> i64 {
    days.clamp(MIN_HISTORY_DAYS, MAX_HISTORY_DAYS)
}

/// Midnight UTC at the start of the day containing `now`
pub fn utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}

/// The `days` complete UTC days before today; today's partial data is excluded
pub fn history_range(now: DateTime<Utc>, days: i64) -> TimeWindow {
    let end = utc_midnight(now);
    let start = end - Duration::days(clamp_days(days));
    TimeWindow { start, end }
}

/// Split `range` into overlapping windows.
///
/// Each window spans `span_days` and starts `step_days` after the previous
/// one, so a flight crossing a window boundary is fully inside the next
/// window. The last window is clipped to the range end.
pub fn plan_windows(range: TimeWindow, settings: WindowSettings) -> Vec<TimeWindow> {
    let span = Duration::days(settings.span_days.max(1) as i64);
    let step = Duration::days(settings.step_days.max(1) as i64);

    let mut windows = Vec::new();
    let mut start = range.start;
    while start < range.end {
        let end = (start + span).min(range.end);
        windows.push(TimeWindow { start, end });
        start += step;
    }
    windows
}

/// Drop repeated `(icao24, firstSeen, lastSeen)` entries, keeping the first
/// occurrence, then stable-sort by `firstSeen`.
pub fn dedup_and_sort(flights: Vec<FlightRecord>) -> Vec<FlightRecord> {
    let mut seen = HashSet::new();
    let mut unique: Vec<FlightRecord> = flights
        .into_iter()
        .filter(|f| {
            let (icao24, first_seen, last_seen) = f.key();
            seen.insert((icao24.to_string(), first_seen, last_seen))
        })
        .collect();
    unique.sort_by_key(|f| f.first_seen);
    unique
}

/// ICAO24 transponder address: exactly six hex digits
pub fn is_icao24(hex: &str) -> bool {
    hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Collect up to `limit` distinct aircraft ids from state vectors.
///
/// The id is the first element of each vector. Entries without a non-empty
/// string there are skipped. First-occurrence order is kept.
pub fn extract_icao24s(states: &[Vec<Value>], limit: usize) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    if limit == 0 {
        return ids;
    }
    for state in states {
        let Some(id) = state.first().and_then(Value::as_str) else {
            continue;
        };
        if id.is_empty() || ids.iter().any(|seen| seen == id) {
            continue;
        }
        ids.push(id.to_string());
        if ids.len() >= limit {
            break;
        }
    }
    ids
}
