//! Domain models for the application
use crate::errors::{OpenSkyError, OpenSkyResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// OAuth2 client credentials for the OpenSky identity endpoint.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    /// Build credentials, failing when either part is missing or blank.
    pub fn resolve(client_id: Option<&str>, client_secret: Option<&str>) -> OpenSkyResult<Self> {
        let client_id = client_id.map(str::trim).unwrap_or_default();
        let client_secret = client_secret.map(str::trim).unwrap_or_default();

        if client_id.is_empty() || client_secret.is_empty() {
            return Err(OpenSkyError::Configuration(
                "OPENSKY_CLIENT_ID and OPENSKY_CLIENT_SECRET environment variables must be set"
                    .to_string(),
            ));
        }

        Ok(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// One flight as reported by the flights-by-aircraft endpoint.
///
/// Fields beyond the ones the summarizer needs are kept in `extra` so raw
/// output mirrors what upstream sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightRecord {
    pub icao24: String,
    #[serde(default)]
    pub callsign: Option<String>,
    #[serde(default)]
    pub est_departure_airport: Option<String>,
    #[serde(default)]
    pub est_arrival_airport: Option<String>,
    pub first_seen: i64,
    pub last_seen: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FlightRecord {
    /// Composite identity used to drop duplicates returned by overlapping windows
    pub fn key(&self) -> (&str, i64, i64) {
        (self.icao24.as_str(), self.first_seen, self.last_seen)
    }
}

/// A flight with its times converted into the report's time zone.
#[derive(Debug, Clone)]
pub struct ProcessedFlight {
    pub departure: String,
    pub arrival: String,
    pub callsign: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub dep_local: NaiveDateTime,
    pub arr_local: NaiveDateTime,
    pub dep_tz: String,
    pub arr_tz: String,
    pub duration_hours: f64,
}

/// Geographic query box, edges in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    pub fn around(lat: f64, lon: f64, dlat: f64, dlon: f64) -> Self {
        Self {
            north: lat + dlat,
            south: lat - dlat,
            east: lon + dlon,
            west: lon - dlon,
        }
    }

    /// Query parameters in the order the states endpoint documents them
    pub fn query(&self) -> [(&'static str, f64); 4] {
        [
            ("lamin", self.south),
            ("lomin", self.west),
            ("lamax", self.north),
            ("lomax", self.east),
        ]
    }
}

/// States endpoint response; each state vector is a heterogeneous array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatesResponse {
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub states: Option<Vec<Vec<Value>>>,
}

/// Health check response
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RawFlightsBody {
    pub hex: String,
    pub days: i64,
    pub flights: Vec<FlightRecord>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct FlightSummaryBody {
    pub hex: String,
    pub days: i64,
    pub timezone: String,
    pub summary: Vec<String>,
}

/// `/flights/{hex}` body; which variant depends on the `format` parameter
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FlightsBody {
    Raw(RawFlightsBody),
    Summary(FlightSummaryBody),
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyBody {
    pub location: Location,
    pub bounding_box: BoundingBox,
    pub aircraft: Vec<String>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flight_record_parses_upstream_json() {
        let json = serde_json::json!({
            "icao24": "ab0356",
            "firstSeen": 1717250400,
            "estDepartureAirport": "KDTW",
            "lastSeen": 1717259400,
            "estArrivalAirport": null,
            "callsign": "DAL123  ",
            "departureAirportCandidatesCount": 1
        });
        let flight: FlightRecord = serde_json::from_value(json).unwrap();
        assert_eq!(flight.icao24, "ab0356");
        assert_eq!(flight.est_departure_airport.as_deref(), Some("KDTW"));
        assert_eq!(flight.est_arrival_airport, None);
        assert_eq!(flight.extra.get("departureAirportCandidatesCount"), Some(&serde_json::json!(1)));
    }

    #[test]
    fn test_flight_record_serializes_camel_case() {
        let flight = FlightRecord {
            icao24: "ab0356".to_string(),
            callsign: None,
            est_departure_airport: Some("KDTW".to_string()),
            est_arrival_airport: Some("KORD".to_string()),
            first_seen: 10,
            last_seen: 20,
            extra: Map::new(),
        };
        let value = serde_json::to_value(&flight).unwrap();
        assert_eq!(value["firstSeen"], 10);
        assert_eq!(value["estArrivalAirport"], "KORD");
    }

    #[test]
    fn test_flights_body_has_no_variant_tag() {
        let body = FlightsBody::Summary(FlightSummaryBody {
            hex: "ab0356".to_string(),
            days: 7,
            timezone: "UTC".to_string(),
            summary: vec![],
        });
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["hex"], "ab0356");
        assert!(value.get("Summary").is_none());
    }

    #[test]
    fn test_bounding_box_around() {
        let bbox = BoundingBox::around(42.3, -83.0, 0.25, 0.5);
        assert!((bbox.north - 42.55).abs() < 1e-9);
        assert!((bbox.south - 42.05).abs() < 1e-9);
        assert!((bbox.east - -82.5).abs() < 1e-9);
        assert!((bbox.west - -83.5).abs() < 1e-9);
    }

    #[test]
    fn test_credentials_reject_blank() {
        assert!(Credentials::resolve(Some("id"), None).is_err());
        assert!(Credentials::resolve(Some(" "), Some("secret")).is_err());
        let creds = Credentials::resolve(Some(" id "), Some("hunter2")).unwrap();
        assert_eq!(creds.client_id, "id");
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }

    #[test]
    fn test_token_response_without_expiry() {
        let resp: TokenResponse =
            serde_json::from_value(serde_json::json!({"access_token": "abc"})).unwrap();
        assert_eq!(resp.expires_in, None);
    }
}
