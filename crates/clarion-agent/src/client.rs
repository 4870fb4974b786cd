//! [crates/clarion-agent/src/client.rs]
//! HTTP client an edge agent uses to deliver partial sketches to the
//! ingest service. The wire body is the Bincode envelope from
//! `clarion-transport`; there is no JSON on this path.

use clarion_transport::{SketchEnvelope, SubmissionOutcome};
use reqwest::{Client, StatusCode};
use tracing::{instrument, warn};

use crate::errors::AgentError;

pub struct AgentClient {
    http: Client,
    ingest_base_url: String,
}

impl AgentClient {
    pub fn new(ingest_base_url: String) -> Self {
        AgentClient {
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("reqwest client configuration is static and always builds"),
            ingest_base_url: ingest_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Delivers one envelope. Delivery is at-least-once from the
    /// agent's perspective: a network error here leaves the caller free
    /// to retry with the same envelope, since the sequence number makes
    /// the merge idempotent on the receiving end.
    #[instrument(skip(self, envelope), fields(agent_id = %envelope.agent_id, sequence = envelope.sequence))]
    pub async fn submit(&self, envelope: &SketchEnvelope) -> Result<SubmissionOutcome, AgentError> {
        let body = clarion_transport::encode(envelope)?;
        let url = format!("{}/api/v1/sketches", self.ingest_base_url);

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/octet-stream")
            .body(body)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let bytes = response.bytes().await?;
                bincode::deserialize(&bytes).map_err(AgentError::DecodeOutcome)
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                warn!("ingest service rejected envelope as InvalidShape");
                Err(AgentError::InvalidShape)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AgentError::ServerRejected { status: status.as_u16(), body })
            }
        }
    }
}
