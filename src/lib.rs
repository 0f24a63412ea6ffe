//! FlightBrief backend: an OpenSky Network proxy producing flight reports.
//!
//! The core is the OpenSky data-access layer in [`services`]: cached
//! client-credentials tokens, windowed flight-history queries, summary
//! formatting and bounding-box aircraft lookups. [`routes`] exposes it over HTTP.
pub mod cache;
pub mod clients;
pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod utils;
