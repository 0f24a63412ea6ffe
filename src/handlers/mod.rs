//! HTTP request handlers
use crate::domain::{
    BoundingBox, FlightSummaryBody, FlightsBody, Health, Location, NearbyBody, RawFlightsBody,
};
use crate::errors::{ApiError, ApiResult};
use crate::services::summary::DEFAULT_DECIMALS;
use crate::services::FlightService;
use crate::utils::{is_icao24, MAX_HISTORY_DAYS, MIN_HISTORY_DAYS};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

const DEFAULT_DAYS: i64 = 7;
const MAX_DECIMALS: usize = 10;
const DEFAULT_DELTA_DEGREES: f64 = 0.25;
const DEFAULT_NEARBY_LIMIT: usize = 10;
const MAX_NEARBY_LIMIT: usize = 100;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub flight_service: Arc<FlightService>,
}

/// Successful response wrapper
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { ok: true, data }
    }
}

/// Health check handler
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        now: Utc::now(),
    })
}

/// Flight history for one aircraft, as summary lines or raw records
pub async fn get_flights(
    Path(hex): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> ApiResult<Json<SuccessResponse<FlightsBody>>> {
    if !is_icao24(&hex) {
        return Err(ApiError::InvalidInput(
            "Invalid ICAO24 hex code format. Must be 6 hexadecimal characters.".to_string(),
        ));
    }

    let days: i64 = param(&params, "days", DEFAULT_DAYS)?;
    if !(MIN_HISTORY_DAYS..=MAX_HISTORY_DAYS).contains(&days) {
        return Err(ApiError::InvalidInput(format!(
            "Days must be between {} and {}",
            MIN_HISTORY_DAYS, MAX_HISTORY_DAYS
        )));
    }

    let decimals: usize = param(&params, "decimals", DEFAULT_DECIMALS)?;
    if decimals > MAX_DECIMALS {
        return Err(ApiError::InvalidInput(format!(
            "Decimals must be between 0 and {}",
            MAX_DECIMALS
        )));
    }

    let timezone = params
        .get("timezone")
        .map(|tz| tz.trim())
        .filter(|tz| !tz.is_empty())
        .unwrap_or(state.flight_service.default_timezone())
        .to_string();

    let raw = params.get("format").map(String::as_str) == Some("raw");

    let flights = state.flight_service.flight_history(&hex, days).await?;

    let body = if raw {
        FlightsBody::Raw(RawFlightsBody {
            hex,
            days,
            count: flights.len(),
            flights,
        })
    } else {
        let summary = state
            .flight_service
            .summarize(&flights, &timezone, decimals);
        FlightsBody::Summary(FlightSummaryBody {
            hex,
            days,
            timezone,
            summary,
        })
    };

    Ok(Json(SuccessResponse::new(body)))
}

/// Aircraft currently inside a box around a point
pub async fn get_nearby_aircraft(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> ApiResult<Json<SuccessResponse<NearbyBody>>> {
    let lat: f64 = param(&params, "lat", 0.0)?;
    let lon: f64 = param(&params, "lon", 0.0)?;
    let dlat: f64 = param(&params, "dlat", DEFAULT_DELTA_DEGREES)?;
    let dlon: f64 = param(&params, "dlon", DEFAULT_DELTA_DEGREES)?;
    let limit: usize = param(&params, "limit", DEFAULT_NEARBY_LIMIT)?;

    if [lat, lon, dlat, dlon].iter().any(|v| !v.is_finite()) {
        return Err(ApiError::InvalidInput(
            "Coordinates must be finite numbers".to_string(),
        ));
    }
    if lat == 0.0 || lon == 0.0 {
        return Err(ApiError::InvalidInput(
            "Latitude and longitude parameters are required".to_string(),
        ));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(ApiError::InvalidInput(
            "Latitude must be between -90 and 90 degrees".to_string(),
        ));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(ApiError::InvalidInput(
            "Longitude must be between -180 and 180 degrees".to_string(),
        ));
    }
    if !(1..=MAX_NEARBY_LIMIT).contains(&limit) {
        return Err(ApiError::InvalidInput(format!(
            "Limit must be between 1 and {}",
            MAX_NEARBY_LIMIT
        )));
    }

    let aircraft = state
        .flight_service
        .find_nearby(lat, lon, dlat, dlon, limit)
        .await?;

    Ok(Json(SuccessResponse::new(NearbyBody {
        location: Location { lat, lon },
        bounding_box: BoundingBox::around(lat, lon, dlat, dlon),
        count: aircraft.len(),
        aircraft,
    })))
}

/// Parse an optional query parameter, falling back to `default` when absent
fn param<T: FromStr>(params: &HashMap<String, String>, key: &str, default: T) -> ApiResult<T> {
    match params.get(key).map(|v| v.trim()) {
        None | Some("") => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::InvalidInput(format!("Invalid value for '{}': {}", key, raw))),
    }
}
