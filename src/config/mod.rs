//! Application configuration module
use std::env;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_TOKEN_URL: &str =
    "https://auth.opensky-network.org/auth/realms/opensky-network/protocol/openid-connect/token";
pub const DEFAULT_API_URL: &str = "https://opensky-network.org/api";
pub const DEFAULT_TIMEZONE: &str = "America/Detroit";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub default_timezone: String,
    pub opensky: OpenSkyConfig,
}

/// Upstream endpoints, credentials and fetch tuning for the OpenSky client.
#[derive(Clone)]
pub struct OpenSkyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_url: String,
    pub api_url: String,
    pub timeouts: Timeouts,
    pub windows: WindowSettings,
    pub fetch_concurrency: usize,
}

#[derive(Clone, Debug)]
pub struct Timeouts {
    pub token: Duration,
    pub flights: Duration,
    pub states: Duration,
}

/// Sliding window used to walk a flight-history range.
///
/// The upstream range limit is undocumented, so both values are tunable.
/// `step_days` never exceeds `span_days`, otherwise the windows would
/// leave gaps between them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowSettings {
    pub span_days: u64,
    pub step_days: u64,
}

impl WindowSettings {
    pub fn new(span_days: u64, step_days: u64) -> Self {
        let span_days = span_days.max(1);
        let step_days = step_days.clamp(1, span_days);
        Self {
            span_days,
            step_days,
        }
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self::new(2, 1)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            token: Duration::from_secs(20),
            flights: Duration::from_secs(30),
            states: Duration::from_secs(20),
        }
    }
}

impl Default for OpenSkyConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            timeouts: Timeouts::default(),
            windows: WindowSettings::default(),
            fetch_concurrency: 1,
        }
    }
}

impl OpenSkyConfig {
    pub fn has_credentials(&self) -> bool {
        non_empty(self.client_id.as_deref()) && non_empty(self.client_secret.as_deref())
    }
}

impl fmt::Debug for OpenSkyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenSkyConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("token_url", &self.token_url)
            .field("api_url", &self.api_url)
            .field("timeouts", &self.timeouts)
            .field("windows", &self.windows)
            .field("fetch_concurrency", &self.fetch_concurrency)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Missing OpenSky credentials are not an error here: the nearby-aircraft
    /// query works without them, and token-requiring calls report the
    /// problem when they run.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let default_timezone =
            env::var("DEFAULT_TIMEZONE").unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string());

        let opensky = OpenSkyConfig {
            client_id: env_opt("OPENSKY_CLIENT_ID"),
            client_secret: env_opt("OPENSKY_CLIENT_SECRET"),
            token_url: env::var("OPENSKY_TOKEN_URL")
                .unwrap_or_else(|_| DEFAULT_TOKEN_URL.to_string()),
            api_url: env::var("OPENSKY_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            timeouts: Timeouts {
                token: Duration::from_secs(env_u64("OPENSKY_TOKEN_TIMEOUT_SECONDS", 20)),
                flights: Duration::from_secs(env_u64("OPENSKY_FLIGHTS_TIMEOUT_SECONDS", 30)),
                states: Duration::from_secs(env_u64("OPENSKY_STATES_TIMEOUT_SECONDS", 20)),
            },
            windows: WindowSettings::new(
                env_u64("OPENSKY_WINDOW_DAYS", 2),
                env_u64("OPENSKY_STEP_DAYS", 1),
            ),
            fetch_concurrency: env_u64("OPENSKY_FETCH_CONCURRENCY", 1).max(1) as usize,
        };

        Ok(Self {
            bind_addr,
            default_timezone,
            opensky,
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn non_empty(value: Option<&str>) -> bool {
    value.map(|v| !v.trim().is_empty()).unwrap_or(false)
}
