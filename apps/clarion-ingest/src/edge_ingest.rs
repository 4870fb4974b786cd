//! [apps/clarion-ingest/src/edge_ingest.rs]
//! The edge-agent ingest endpoint: `POST /api/v1/sketches`. Accepts a
//! bincode-encoded `SketchEnvelope`, resolves its endpoint key to the
//! internal id, merges the partial sketch into the store under the
//! envelope's sequence number, and answers with a bincode-encoded
//! `SubmissionOutcome`. A shape mismatch between the agent's sketch
//! and this process's configured shape is the one rejection a
//! well-behaved agent should never trigger outside of a
//! misconfiguration, so it is surfaced as 422 rather than 500.
//! Delivery is at-least-once; a duplicate or out-of-order envelope
//! still answers 200, just with `duplicates` incremented instead of
//! `accepted`.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::{instrument, warn};

use clarion_store::{MergeOutcome, StoreError};
use clarion_transport::{decode, SubmissionOutcome};

use crate::state::AppState;

#[instrument(skip(state, body))]
pub async fn ingest_sketch(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let envelope = match decode(&body) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(error = %err, "rejecting malformed sketch envelope");
            return (StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }
    };

    let endpoint_id = state.registry.resolve(envelope.endpoint_key.clone());

    let merged = state.sketches.merge_partial(
        endpoint_id,
        envelope.agent_id,
        envelope.sequence,
        envelope.window_start,
        &envelope.sketch,
    );

    match merged {
        Ok(MergeOutcome::Applied) => outcome_response(SubmissionOutcome { accepted: 1, duplicates: 0 }),
        Ok(MergeOutcome::Duplicate) => outcome_response(SubmissionOutcome { accepted: 0, duplicates: 1 }),
        Err(StoreError::InvalidShape(reason)) => {
            warn!(%endpoint_id, %reason, "edge agent submitted a sketch with an incompatible shape");
            (StatusCode::UNPROCESSABLE_ENTITY, reason.to_string()).into_response()
        }
        Err(err) => {
            warn!(%endpoint_id, error = %err, "failed to merge edge-agent sketch");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

fn outcome_response(outcome: SubmissionOutcome) -> Response {
    match bincode::serialize(&outcome) {
        Ok(bytes) => ([("content-type", "application/octet-stream")], bytes).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}
