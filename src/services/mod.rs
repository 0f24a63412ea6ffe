//! Business logic services layer
pub mod summary;

use crate::cache::TokenCache;
use crate::clients::OpenSkyClient;
use crate::config::{OpenSkyConfig, WindowSettings};
use crate::domain::{BoundingBox, Credentials, FlightRecord};
use crate::errors::OpenSkyResult;
use crate::utils::{dedup_and_sort, extract_icao24s, history_range, plan_windows, TimeWindow};
use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, info};

/// Lifetime assumed when the token endpoint omits `expires_in`
pub const DEFAULT_TOKEN_LIFETIME_SECONDS: i64 = 1200;

/// Hands out bearer tokens, refreshing through the identity endpoint when
/// the cached one is missing or about to expire.
pub struct TokenManager {
    client: OpenSkyClient,
    cache: Arc<TokenCache>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl TokenManager {
    pub fn new(client: OpenSkyClient, cache: Arc<TokenCache>, config: &OpenSkyConfig) -> Self {
        Self {
            client,
            cache,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    pub async fn token(&self) -> OpenSkyResult<String> {
        self.token_at(Utc::now()).await
    }

    pub async fn token_at(&self, now: DateTime<Utc>) -> OpenSkyResult<String> {
        if let Some(token) = self.cache.valid_token(now).await {
            debug!("Using cached OpenSky token");
            return Ok(token);
        }

        let _guard = self.cache.refresh_guard().await;
        // Someone else may have refreshed while we waited
        if let Some(token) = self.cache.valid_token(now).await {
            return Ok(token);
        }

        let credentials =
            Credentials::resolve(self.client_id.as_deref(), self.client_secret.as_deref())?;
        let response = self.client.request_token(&credentials).await?;

        let lifetime = response
            .expires_in
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECONDS);
        let cached = self
            .cache
            .store(response.access_token, lifetime, now)
            .await;
        info!(expires_at = %cached.expires_at, "Refreshed OpenSky token");

        Ok(cached.access_token)
    }
}

/// Flight history and nearby-aircraft queries against OpenSky
pub struct FlightService {
    client: OpenSkyClient,
    tokens: TokenManager,
    windows: WindowSettings,
    fetch_concurrency: usize,
    default_timezone: String,
}

impl FlightService {
    pub fn new(
        config: &OpenSkyConfig,
        cache: Arc<TokenCache>,
        default_timezone: String,
    ) -> OpenSkyResult<Self> {
        let client = OpenSkyClient::new(config)?;
        Ok(Self {
            tokens: TokenManager::new(client.clone(), cache, config),
            client,
            windows: config.windows,
            fetch_concurrency: config.fetch_concurrency.max(1),
            default_timezone,
        })
    }

    pub fn default_timezone(&self) -> &str {
        &self.default_timezone
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Flights of one aircraft over the last `days` complete UTC days
    pub async fn flight_history(&self, hex: &str, days: i64) -> OpenSkyResult<Vec<FlightRecord>> {
        self.flight_history_at(hex, days, Utc::now()).await
    }

    /// Like [`flight_history`](Self::flight_history) with the range anchored at `now`.
    ///
    /// Any window failing with something other than 404 fails the whole call.
    pub async fn flight_history_at(
        &self,
        hex: &str,
        days: i64,
        now: DateTime<Utc>,
    ) -> OpenSkyResult<Vec<FlightRecord>> {
        let icao24 = hex.to_lowercase();
        let range = history_range(now, days);
        let windows = plan_windows(range, self.windows);
        let token = self.tokens.token().await?;

        info!(
            icao24 = %icao24,
            start = %range.start,
            end = %range.end,
            windows = windows.len(),
            "Fetching flight history"
        );

        let batches: Vec<Vec<FlightRecord>> = if self.fetch_concurrency > 1 {
            stream::iter(windows.iter().copied())
                .map(|window| self.fetch_window(&token, &icao24, window))
                .buffered(self.fetch_concurrency)
                .try_collect()
                .await?
        } else {
            let mut batches = Vec::with_capacity(windows.len());
            for window in windows.iter().copied() {
                batches.push(self.fetch_window(&token, &icao24, window).await?);
            }
            batches
        };

        let merged: Vec<FlightRecord> = batches.into_iter().flatten().collect();
        let fetched = merged.len();
        let flights = dedup_and_sort(merged);
        debug!(icao24 = %icao24, fetched, unique = flights.len(), "Merged flight windows");

        Ok(flights)
    }

    async fn fetch_window(
        &self,
        token: &str,
        icao24: &str,
        window: TimeWindow,
    ) -> OpenSkyResult<Vec<FlightRecord>> {
        self.client
            .fetch_flights(token, icao24, window.begin_epoch(), window.end_epoch())
            .await
    }

    /// Summary lines for `flights` in `timezone`
    pub fn summarize(&self, flights: &[FlightRecord], timezone: &str, decimals: usize) -> Vec<String> {
        summary::summarize(flights, timezone, decimals)
    }

    /// Up to `limit` distinct aircraft currently inside the box around `(lat, lon)`
    pub async fn find_nearby(
        &self,
        lat: f64,
        lon: f64,
        dlat: f64,
        dlon: f64,
        limit: usize,
    ) -> OpenSkyResult<Vec<String>> {
        let bbox = BoundingBox::around(lat, lon, dlat, dlon);
        let response = self.client.fetch_states(&bbox).await?;
        let states = response.states.unwrap_or_default();
        let ids = extract_icao24s(&states, limit);
        debug!(states = states.len(), matched = ids.len(), "Nearby aircraft");
        Ok(ids)
    }
}
