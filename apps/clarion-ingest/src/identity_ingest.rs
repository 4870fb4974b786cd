//! [apps/clarion-ingest/src/identity_ingest.rs]
//! Identity source ingest: push-based session events and pull-applied
//! directory snapshots, both landing on the shared resolver so flow
//! processing sees identity bindings as soon as they arrive.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{info, warn};

use clarion_identity::SessionEvent;
use clarion_model::user::DirectorySnapshot;

use crate::state::AppState;

/// `POST /internal/identity/session`: a session start/end event from
/// an access-control or DHCP source.
pub async fn ingest_session(State(state): State<Arc<AppState>>, Json(event): Json<SessionEvent>) -> Response {
    let mut resolver = state.identity.lock().expect("identity resolver mutex poisoned");
    let resolved = resolver.record_session(event);
    info!(resolved_count = resolved.len(), "applied session event");
    StatusCode::ACCEPTED.into_response()
}

/// `POST /internal/identity/directory`: a full directory snapshot,
/// replacing whatever was installed for earlier `as_of` times.
pub async fn ingest_directory(State(state): State<Arc<AppState>>, Json(snapshot): Json<DirectorySnapshot>) -> Response {
    let mut resolver = state.identity.lock().expect("identity resolver mutex poisoned");
    match resolver.install_directory_snapshot(snapshot) {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(err) => {
            warn!(error = %err, "rejected directory snapshot");
            (StatusCode::BAD_REQUEST, err.to_string()).into_response()
        }
    }
}
