//! [apps/clarion-ingest/src/main.rs]

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use clarion_config::ClarionConfig;
use clarion_ingest::router::build_router;
use clarion_ingest::udp_listener::{run_udp_listener, spawn_sketch_workers};
use clarion_ingest::AppState;

/// Default ports per RFC/IANA convention for the two flow-export
/// families this process listens for.
const DEFAULT_NETFLOW_PORT: u16 = 2055;
const DEFAULT_IPFIX_PORT: u16 = 4739;

#[derive(Parser, Debug)]
#[command(name = "clarion-ingest", about = "NetFlow/IPFIX flow intake and edge-agent sketch collection")]
struct Args {
    /// Path to a TOML configuration file; falls back to built-in
    /// defaults when omitted.
    #[arg(long, env = "CLARION_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "CLARION_BIND_ADDR", default_value = "0.0.0.0")]
    bind_addr: IpAddr,

    #[arg(long, env = "CLARION_NETFLOW_PORT", default_value_t = DEFAULT_NETFLOW_PORT)]
    netflow_port: u16,

    #[arg(long, env = "CLARION_IPFIX_PORT", default_value_t = DEFAULT_IPFIX_PORT)]
    ipfix_port: u16,

    #[arg(long, env = "CLARION_HTTP_PORT")]
    http_port: Option<u16>,

    /// Number of sketch-update workers decoded records are sharded
    /// across. Defaults to the number of available CPUs.
    #[arg(long, env = "CLARION_SKETCH_WORKERS")]
    sketch_workers: Option<usize>,
}

fn spawn_listener(
    state: Arc<AppState>,
    addr: SocketAddr,
    exporter_hint: &'static str,
    senders: Arc<Vec<tokio::sync::mpsc::Sender<clarion_ingest::udp_listener::ShardedUpdate>>>,
) {
    tokio::spawn(async move {
        if let Err(err) = run_udp_listener(state, addr, exporter_hint.to_string(), senders).await {
            tracing::error!(%addr, exporter_hint, error = %err, "flow-export listener exited");
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    clarion_telemetry::init_tracing("clarion-ingest");

    let config = ClarionConfig::load(args.config.as_deref())?;
    let http_port = args.http_port.unwrap_or(config.transport.listen_port);
    let worker_count = args.sketch_workers.unwrap_or_else(num_cpus::get).max(1);

    let state = Arc::new(AppState::new(config));
    let senders = Arc::new(spawn_sketch_workers(Arc::clone(&state), worker_count));
    info!(worker_count, "sketch-update workers started");

    let netflow_addr = SocketAddr::new(args.bind_addr, args.netflow_port);
    let ipfix_addr = SocketAddr::new(args.bind_addr, args.ipfix_port);

    spawn_listener(Arc::clone(&state), netflow_addr, "netflow", Arc::clone(&senders));
    spawn_listener(Arc::clone(&state), ipfix_addr, "ipfix", Arc::clone(&senders));

    let http_addr = SocketAddr::new(args.bind_addr, http_port);
    let listener = TcpListener::bind(http_addr).await?;
    info!(%http_addr, "ingest HTTP surface listening");

    let router = build_router(state);
    axum::serve(listener, router).await?;

    Ok(())
}
