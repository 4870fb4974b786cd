//! [apps/clarion-ingest/src/udp_listener.rs]
//! Flow-export intake: one receive task per UDP socket (NetFlow v5/v9
//! on 2055, IPFIX on 4739 by default), decoding through a template
//! cache shared across every receive task, then dispatching decoded
//! records to a fixed pool of sketch-update workers sharded by a hash
//! of the endpoint key. Records for the same endpoint always land on
//! the same worker, so that endpoint's sketch is only ever touched by
//! one task at a time and updates apply in arrival order; there is no
//! ordering guarantee across distinct endpoints.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use clarion_model::endpoint::EndpointKey;
use clarion_model::flow::FlowRecord;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use crate::state::AppState;

/// Max UDP datagram the decoder will accept; larger exporters send
/// multiple packets rather than fragmenting at this layer.
const RECV_BUFFER_SIZE: usize = 65_535;
/// Bounded per-worker queue; once full the oldest undecoded packet's
/// records are dropped rather than letting the queue grow unbounded.
const WORKER_QUEUE_CAPACITY: usize = 4_096;

pub struct ShardedUpdate {
    pub flow: FlowRecord,
    pub as_source: bool,
    pub key: EndpointKey,
}

/// Spawns `worker_count` sketch-update workers and returns their
/// inbound senders. Each worker owns a single-consumer channel so
/// per-endpoint ordering is a property of the channel, not of any
/// lock held across the worker's lifetime.
pub fn spawn_sketch_workers(state: Arc<AppState>, worker_count: usize) -> Vec<mpsc::Sender<ShardedUpdate>> {
    let mut senders = Vec::with_capacity(worker_count);
    for worker_id in 0..worker_count {
        let (tx, mut rx) = mpsc::channel::<ShardedUpdate>(WORKER_QUEUE_CAPACITY);
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                let endpoint_id = state.registry.resolve(update.key);
                state.sketches.record_flow(endpoint_id, &update.flow, update.as_source);
            }
            debug!(worker_id, "sketch-update worker channel closed");
        });
        senders.push(tx);
    }
    senders
}

fn shard_for(key: &EndpointKey, shard_count: usize) -> usize {
    let digest = clarion_sketch::hash64(key.to_string().as_bytes());
    (digest % shard_count as u64) as usize
}

fn route(senders: &[mpsc::Sender<ShardedUpdate>], flow: &FlowRecord, exporter_id: &str) {
    let source_key = endpoint_key_for(exporter_id, flow.source_addr);
    let dest_key = endpoint_key_for(exporter_id, flow.dest_addr);

    for (key, as_source) in [(source_key, true), (dest_key, false)] {
        let shard = shard_for(&key, senders.len());
        let update = ShardedUpdate { flow: flow.clone(), as_source, key };
        if senders[shard].try_send(update).is_err() {
            warn!(exporter_id, "sketch worker queue full, dropping one endpoint-side update");
        }
    }
}

fn endpoint_key_for(exporter_id: &str, addr: std::net::IpAddr) -> EndpointKey {
    EndpointKey::ExporterScopedAddress { exporter_id: exporter_id.to_string(), addr }
}

/// Runs one UDP receive loop until the socket errors. `exporter_hint`
/// labels every packet received on this socket when the wire record
/// itself carries no better exporter identity.
#[instrument(skip(state, senders))]
pub async fn run_udp_listener(
    state: Arc<AppState>,
    bind_addr: SocketAddr,
    exporter_hint: String,
    senders: Arc<Vec<mpsc::Sender<ShardedUpdate>>>,
) -> std::io::Result<()> {
    let socket = UdpSocket::bind(bind_addr).await?;
    tracing::info!(%bind_addr, exporter_hint, "flow-export listener bound");
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];

    loop {
        let (len, peer) = socket.recv_from(&mut buf).await?;
        let exporter_id = exporter_hint.clone();
        let now = Utc::now();

        let outcome = {
            let mut decoder = state.decoder.lock().expect("decoder mutex poisoned");
            decoder.decode_packet(&buf[..len], &exporter_id, now)
        };

        match outcome {
            Ok(outcome) => {
                for flow in &outcome.records {
                    route(&senders, flow, &exporter_id);
                }
                if outcome.templates_learned > 0 {
                    debug!(%peer, templates_learned = outcome.templates_learned, "learned new export templates");
                }
            }
            Err(err) => {
                warn!(%peer, error = %err, "discarding undecodable flow-export packet");
            }
        }
    }
}
