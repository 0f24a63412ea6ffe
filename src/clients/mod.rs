//! External API clients module
use crate::config::{OpenSkyConfig, Timeouts};
use crate::domain::{BoundingBox, Credentials, FlightRecord, StatesResponse, TokenResponse};
use crate::errors::{OpenSkyError, OpenSkyResult};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

/// HTTP client wrapper with common configuration
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> OpenSkyResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("flightbrief/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn get_client(&self) -> &Client {
        &self.client
    }
}

/// OpenSky Network REST client.
///
/// Only performs single calls and classifies their status; caching,
/// windowing and merging live in the services layer.
#[derive(Clone)]
pub struct OpenSkyClient {
    http_client: HttpClient,
    token_url: String,
    api_url: String,
    timeouts: Timeouts,
}

impl OpenSkyClient {
    pub fn new(config: &OpenSkyConfig) -> OpenSkyResult<Self> {
        Ok(Self {
            http_client: HttpClient::new()?,
            token_url: config.token_url.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            timeouts: config.timeouts.clone(),
        })
    }

    /// Exchange client credentials for a bearer token.
    ///
    /// Any failure to reach the identity endpoint is an auth failure; there
    /// is no HTTP status then, so `status` is 0.
    pub async fn request_token(&self, credentials: &Credentials) -> OpenSkyResult<TokenResponse> {
        let resp = self
            .http_client
            .get_client()
            .post(&self.token_url)
            .timeout(self.timeouts.token)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|err| OpenSkyError::UpstreamAuth {
                status: err.status().map(|s| s.as_u16()).unwrap_or_default(),
                text: err.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(OpenSkyError::UpstreamAuth {
                status: status.as_u16(),
                text: OpenSkyError::reason(status),
            });
        }

        Ok(resp.json().await?)
    }

    /// Fetch the flights of one aircraft between `begin` and `end` (epoch seconds).
    ///
    /// Upstream answers 404 when the window holds no flights; that is
    /// returned as an empty list.
    pub async fn fetch_flights(
        &self,
        token: &str,
        icao24: &str,
        begin: i64,
        end: i64,
    ) -> OpenSkyResult<Vec<FlightRecord>> {
        let url = format!("{}/flights/aircraft", self.api_url);
        let resp = self
            .http_client
            .get_client()
            .get(&url)
            .timeout(self.timeouts.flights)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("icao24", icao24.to_string())])
            .query(&[("begin", begin), ("end", end)])
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            debug!(icao24, begin, end, "No flights in window");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(OpenSkyError::UpstreamFlights {
                status: status.as_u16(),
                text: OpenSkyError::reason(status),
            });
        }

        let json: Value = resp.json().await?;
        match json {
            Value::Array(_) => Ok(serde_json::from_value(json)?),
            _ => Ok(Vec::new()),
        }
    }

    /// Fetch current state vectors inside a bounding box (no authentication)
    pub async fn fetch_states(&self, bbox: &BoundingBox) -> OpenSkyResult<StatesResponse> {
        let url = format!("{}/states/all", self.api_url);
        let resp = self
            .http_client
            .get_client()
            .get(&url)
            .timeout(self.timeouts.states)
            .query(&bbox.query())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(OpenSkyError::UpstreamStates {
                status: status.as_u16(),
                text: OpenSkyError::reason(status),
            });
        }

        let json: Value = resp.json().await?;
        if json.is_null() {
            return Ok(StatesResponse::default());
        }
        Ok(serde_json::from_value(json)?)
    }
}
