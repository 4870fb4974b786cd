//! [apps/clarion-ingest/src/candidates.rs]
//! Internal query surface for the batch and incremental clustering
//! workers, which run as separate processes and never see this
//! process's in-memory sketch store directly. Each candidate already
//! carries its projected feature vector so a worker only ever needs
//! `clarion-cluster`'s pure math, not this crate's sketch internals.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use clarion_model::candidate::{DominantRole, EligibleCandidate};
use clarion_model::endpoint::EndpointId;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CandidateQuery {
    #[serde(default)]
    min_flow_count: Option<u64>,
}

/// `GET /internal/candidates?min_flow_count=N`: every endpoint with at
/// least `min_flow_count` flows (defaulting to the configured
/// clustering minimum), projected to a candidate record.
pub async fn list_candidates(State(state): State<Arc<AppState>>, Query(query): Query<CandidateQuery>) -> Json<Vec<EligibleCandidate>> {
    let min_flow_count = query.min_flow_count.unwrap_or(state.config.sketch.min_flows_for_clustering);
    let endpoints = state.sketches.eligible_endpoints(min_flow_count);

    let candidates = endpoints
        .into_iter()
        .filter_map(|endpoint_id| build_candidate(&state, endpoint_id))
        .collect();

    Json(candidates)
}

/// `GET /internal/candidates/:endpoint_id`: a single endpoint's
/// candidate record, for the incremental worker re-scoring one
/// recently-updated endpoint rather than pulling the whole population.
pub async fn get_candidate(State(state): State<Arc<AppState>>, Path(endpoint_id): Path<Uuid>) -> Response {
    match build_candidate(&state, EndpointId(endpoint_id)) {
        Some(candidate) => Json(candidate).into_response(),
        None => (StatusCode::NOT_FOUND, "no sketch for that endpoint").into_response(),
    }
}

fn build_candidate(state: &AppState, endpoint_id: EndpointId) -> Option<EligibleCandidate> {
    let sketch = state.sketches.snapshot(endpoint_id)?;
    let features = clarion_sketch::extract(&sketch, &state.feature_config);

    let dominant_role = if sketch.bytes_out == 0 && sketch.bytes_in > 0 {
        DominantRole::Server
    } else if sketch.bytes_in == 0 && sketch.bytes_out > 0 {
        DominantRole::Client
    } else {
        DominantRole::Mixed
    };

    Some(EligibleCandidate {
        endpoint_id,
        features: features.as_slice().to_vec(),
        flow_count: sketch.flow_count,
        device_type: None,
        identity_profile: None,
        directory_group: None,
        dominant_role,
        dominant_service_class: None,
    })
}
