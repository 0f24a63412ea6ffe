//! Fake OpenSky upstream for integration tests.
//!
//! Serves the token, flights-by-aircraft and states endpoints on an
//! ephemeral local port and records every request it sees.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use flightbrief::cache::TokenCache;
use flightbrief::config::OpenSkyConfig;
use flightbrief::handlers::AppState;
use flightbrief::routes::build_router;
use flightbrief::services::FlightService;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const CLIENT_ID: &str = "test-id";
pub const CLIENT_SECRET: &str = "test-secret";

/// What the fake upstream answers with
#[derive(Clone, Default)]
pub struct Fixture {
    pub flights: Vec<Value>,
    pub states: Value,
    pub token_expires_in: Option<i64>,
    /// Aircraft for which the flights endpoint answers 500
    pub failing_icao24: Option<String>,
    /// Status returned by the states endpoint instead of 200
    pub states_status: Option<u16>,
}

#[derive(Clone, Default)]
pub struct Recorder {
    pub token_requests: Arc<AtomicUsize>,
    pub flight_queries: Arc<Mutex<Vec<(String, i64, i64)>>>,
    pub states_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

#[allow(dead_code)]
impl Recorder {
    pub fn token_count(&self) -> usize {
        self.token_requests.load(Ordering::SeqCst)
    }

    pub fn flight_queries(&self) -> Vec<(String, i64, i64)> {
        self.flight_queries.lock().unwrap().clone()
    }

    pub fn states_queries(&self) -> Vec<HashMap<String, String>> {
        self.states_queries.lock().unwrap().clone()
    }
}

#[derive(Clone)]
struct Upstream {
    fixture: Arc<Fixture>,
    recorder: Recorder,
}

pub struct FakeOpenSky {
    pub base_url: String,
    pub recorder: Recorder,
}

#[allow(dead_code)]
impl FakeOpenSky {
    pub async fn start(fixture: Fixture) -> Self {
        let recorder = Recorder::default();
        let upstream = Upstream {
            fixture: Arc::new(fixture),
            recorder: recorder.clone(),
        };

        let app = Router::new()
            .route("/token", post(token))
            .route("/api/flights/aircraft", get(flights))
            .route("/api/states/all", get(states))
            .with_state(upstream);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake upstream");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake upstream crashed");
        });

        Self {
            base_url: format!("http://{}", addr),
            recorder,
        }
    }

    /// Client configuration pointing at this fake, with valid credentials
    pub fn config(&self) -> OpenSkyConfig {
        OpenSkyConfig {
            client_id: Some(CLIENT_ID.to_string()),
            client_secret: Some(CLIENT_SECRET.to_string()),
            token_url: format!("{}/token", self.base_url),
            api_url: format!("{}/api", self.base_url),
            ..OpenSkyConfig::default()
        }
    }

    pub fn service(&self) -> FlightService {
        self.service_with(self.config())
    }

    pub fn service_with(&self, config: OpenSkyConfig) -> FlightService {
        FlightService::new(&config, Arc::new(TokenCache::new()), "America/Detroit".to_string())
            .expect("build flight service")
    }

    pub fn app(&self) -> Router {
        self.app_with(self.config())
    }

    pub fn app_with(&self, config: OpenSkyConfig) -> Router {
        build_router(AppState {
            flight_service: Arc::new(self.service_with(config)),
        })
    }
}

async fn token(
    State(upstream): State<Upstream>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let valid = form.get("grant_type").map(String::as_str) == Some("client_credentials")
        && form.get("client_id").map(String::as_str) == Some(CLIENT_ID)
        && form.get("client_secret").map(String::as_str) == Some(CLIENT_SECRET);
    if !valid {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let n = upstream.recorder.token_requests.fetch_add(1, Ordering::SeqCst) + 1;
    let mut body = json!({
        "access_token": format!("token-{}", n),
        "token_type": "Bearer",
    });
    if let Some(expires_in) = upstream.fixture.token_expires_in {
        body["expires_in"] = json!(expires_in);
    }
    Json(body).into_response()
}

async fn flights(
    State(upstream): State<Upstream>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer token-"));
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let icao24 = query.get("icao24").cloned().unwrap_or_default();
    let begin: i64 = query.get("begin").and_then(|v| v.parse().ok()).unwrap_or(0);
    let end: i64 = query.get("end").and_then(|v| v.parse().ok()).unwrap_or(0);
    upstream
        .recorder
        .flight_queries
        .lock()
        .unwrap()
        .push((icao24.clone(), begin, end));

    if upstream.fixture.failing_icao24.as_deref() == Some(icao24.as_str()) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let matching: Vec<Value> = upstream
        .fixture
        .flights
        .iter()
        .filter(|f| f["icao24"] == icao24.as_str())
        .filter(|f| {
            let first = f["firstSeen"].as_i64().unwrap_or(0);
            let last = f["lastSeen"].as_i64().unwrap_or(0);
            first < end && last > begin
        })
        .cloned()
        .collect();

    if matching.is_empty() {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(Value::Array(matching)).into_response()
}

async fn states(
    State(upstream): State<Upstream>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    upstream.recorder.states_queries.lock().unwrap().push(query);

    if let Some(status) = upstream.fixture.states_status {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return status.into_response();
    }
    Json(upstream.fixture.states.clone()).into_response()
}

/// Upstream-shaped flight JSON
#[allow(dead_code)]
pub fn flight_json(
    icao24: &str,
    callsign: &str,
    dep: &str,
    arr: &str,
    first_seen: i64,
    last_seen: i64,
) -> Value {
    json!({
        "icao24": icao24,
        "firstSeen": first_seen,
        "estDepartureAirport": dep,
        "lastSeen": last_seen,
        "estArrivalAirport": arr,
        "callsign": callsign,
        "estDepartureAirportHorizDistance": 1200,
        "departureAirportCandidatesCount": 1,
    })
}
