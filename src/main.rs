//! Service entry point
use flightbrief::cache::TokenCache;
use flightbrief::config::AppConfig;
use flightbrief::handlers::AppState;
use flightbrief::routes::build_router;
use flightbrief::services::FlightService;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load configuration
    let config = AppConfig::from_env()?;
    info!(
        api_url = %config.opensky.api_url,
        window_days = config.opensky.windows.span_days,
        step_days = config.opensky.windows.step_days,
        "Configuration loaded successfully"
    );
    if !config.opensky.has_credentials() {
        warn!("OPENSKY_CLIENT_ID / OPENSKY_CLIENT_SECRET not set; flight history requests will fail");
    }

    // One token cache for the whole process
    let token_cache = Arc::new(TokenCache::new());
    let flight_service = Arc::new(FlightService::new(
        &config.opensky,
        token_cache,
        config.default_timezone.clone(),
    )?);

    let state = AppState { flight_service };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("flightbrief service listening on {}", config.bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
