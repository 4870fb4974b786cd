//! [crates/clarion-telemetry/src/init.rs]
//! Process-wide tracing setup: compact output in development, flat
//! JSON in release, plus a panic hook so a thread abort still leaves a
//! structured log line behind.

use std::panic;

use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global tracing subscriber and panic hook for
/// `service_name`. Panics if a subscriber is already installed.
pub fn init_tracing(service_name: &str) {
    let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{service_name}={default_level},tower_http=warn,hyper=warn,libsql=error").into());

    if cfg!(debug_assertions) {
        tracing_subscriber::registry().with(filter).with(fmt::layer().compact().with_target(false)).init();
    } else {
        tracing_subscriber::registry().with(filter).with(fmt::layer().json().flatten_event(true)).init();
    }

    let service = service_name.to_string();
    panic::set_hook(Box::new(move |info| {
        let location = info.location().map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column())).unwrap_or_else(|| "unknown".to_string());
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");
        error!(target: "panic", service = %service, location = %location, "thread panicked: {payload}");
    }));

    info!(service = service_name, "tracing initialized");
}
