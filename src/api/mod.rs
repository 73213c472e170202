//! REST boundary for the calculation engine.
//!
//! Endpoints:
//! - `GET /health` — liveness probe
//! - `GET /api/ping` — service identity
//! - `POST /api/calculate` — sizing and profitability run

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::config::EngineConfig;

/// Response schema checked against outgoing payloads.
const RESPONSE_SCHEMA: &str = include_str!("../../schemas/calc_response.schema.json");

/// Immutable application state shared across all request handlers.
///
/// Constructed once at startup and wrapped in `Arc`. The compiled
/// response validator is optional: when the embedded schema cannot be
/// compiled the boundary serves responses unvalidated and marks them
/// accordingly.
pub struct AppState {
    /// Engine configuration applied to every request.
    pub config: EngineConfig,
    /// Compiled response schema, if it compiled.
    pub validator: Option<jsonschema::Validator>,
}

impl AppState {
    /// State with the embedded response schema compiled once.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            validator: compile_response_schema(),
        }
    }
}

fn compile_response_schema() -> Option<jsonschema::Validator> {
    let schema = match serde_json::from_str::<serde_json::Value>(RESPONSE_SCHEMA) {
        Ok(schema) => schema,
        Err(error) => {
            tracing::warn!(%error, "embedded response schema is not valid JSON");
            return None;
        }
    };
    match jsonschema::validator_for(&schema) {
        Ok(validator) => Some(validator),
        Err(error) => {
            tracing::warn!(%error, "embedded response schema failed to compile");
            None
        }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/ping", get(handlers::ping))
        .route("/api/calculate", post(handlers::calculate))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Panics
///
/// Panics if the TCP listener cannot bind to `addr`.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {addr}: {e}"));
    tracing::info!("API server listening on http://{addr}");
    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| panic!("server error: {e}"));
}
