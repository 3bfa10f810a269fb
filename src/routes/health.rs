// src/routes/health.rs
//! Liveness endpoint for the scale telemetry service.
//!
//! This module defines the `/health` route used by container orchestrators
//! and load balancers to verify that the service is running and able to
//! respond to HTTP requests. It follows the Explicit Module Boundary Pattern
//! (EMBP):
//! - Internal to this file: the endpoint handler
//! - Exports to the gateway (`mod.rs`): a subrouter containing `/health`

use axum::{http::StatusCode, routing::get, Router};

/// Handle `GET /health`.
///
/// Returns a plain-text `OK`. Does not touch the reading store.
async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Create a subrouter containing the `/health` route.
///
/// Generic over the application state so it merges cleanly with the gateway
/// router regardless of which reading store backs it.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
