//! [apps/clarion-ingest/src/health.rs]

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub tracked_endpoints: usize,
    pub known_endpoint_keys: usize,
    pub identity_pending: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    let identity_pending = state.identity.lock().expect("identity resolver mutex poisoned").pending_count();
    Json(HealthReport {
        tracked_endpoints: state.sketches.len(),
        known_endpoint_keys: state.registry.len(),
        identity_pending,
    })
}
