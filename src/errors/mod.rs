//! Unified error handling module
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Errors raised by the OpenSky data-access layer.
///
/// Upstream variants carry the HTTP status and reason phrase of the failed
/// call. Transport failures (DNS, connect, timeout) on the data endpoints are
/// passed through as-is; on the token endpoint they become `UpstreamAuth`.
#[derive(Debug, thiserror::Error)]
pub enum OpenSkyError {
    #[error("{0}")]
    Configuration(String),

    #[error("OpenSky token request failed: {status} {text}")]
    UpstreamAuth { status: u16, text: String },

    #[error("OpenSky flights request failed: {status} {text}")]
    UpstreamFlights { status: u16, text: String },

    #[error("OpenSky states request failed: {status} {text}")]
    UpstreamStates { status: u16, text: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("unexpected OpenSky response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl OpenSkyError {
    pub(crate) fn reason(status: reqwest::StatusCode) -> String {
        status.canonical_reason().unwrap_or_default().to_string()
    }
}

/// Unified error response format.
///
/// `message` repeats `error.message` at the top level for clients that only
/// read a plain string.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub message: String,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    OpenSky(#[from] OpenSkyError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone()),
            ApiError::OpenSky(err) => {
                tracing::error!(error = %err, "OpenSky request failed");
                let code = match err {
                    OpenSkyError::Configuration(_) => "CONFIGURATION_ERROR",
                    OpenSkyError::UpstreamAuth { .. } => "UPSTREAM_AUTH_ERROR",
                    OpenSkyError::UpstreamFlights { .. } => "UPSTREAM_FLIGHTS_ERROR",
                    OpenSkyError::UpstreamStates { .. } => "UPSTREAM_STATES_ERROR",
                    OpenSkyError::Transport(_) => "UPSTREAM_ERROR",
                    OpenSkyError::Decode(_) => "UPSTREAM_DECODE_ERROR",
                };
                let message = match err {
                    OpenSkyError::Configuration(_) => {
                        "OpenSky API credentials not configured".to_string()
                    }
                    other => other.to_string(),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, code, message)
            }
        };

        let error_response = ErrorResponse {
            ok: false,
            message: message.clone(),
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

/// Result alias for the OpenSky data-access layer
pub type OpenSkyResult<T> = Result<T, OpenSkyError>;
