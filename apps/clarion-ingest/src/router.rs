//! [apps/clarion-ingest/src/router.rs]
//! HTTP surface: the C10 edge-agent endpoint, the internal
//! identity-ingest and candidate-query endpoints the rest of the
//! fleet pulls from, and `/health`.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::candidates::{get_candidate, list_candidates};
use crate::edge_ingest::ingest_sketch;
use crate::health::health;
use crate::identity_ingest::{ingest_directory, ingest_session};
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let max_envelope_bytes = state.config.transport.max_envelope_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/sketches", post(ingest_sketch))
        .route("/internal/identity/session", post(ingest_session))
        .route("/internal/identity/directory", post(ingest_directory))
        .route("/internal/candidates", get(list_candidates))
        .route("/internal/candidates/:endpoint_id", get(get_candidate))
        .layer(RequestBodyLimitLayer::new(max_envelope_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
