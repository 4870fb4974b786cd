//! [crates/clarion-telemetry/src/suppression.rs]
//! At most one log line per error kind per source per second, per the
//! recovery policy: callers should log every occurrence for metrics
//! purposes but rely on this to decide whether the occurrence is also
//! worth a line in the log stream.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{error, warn};

use clarion_model::error::ClarionError;

const WINDOW: Duration = Duration::from_secs(1);

/// Tracks the last time each `(kind, source)` pair was logged so
/// repeated errors of the same kind from the same source collapse
/// into one line per window instead of flooding the log.
pub struct LogSuppressor {
    last_emitted: DashMap<(&'static str, String), Instant>,
}

impl LogSuppressor {
    pub fn new() -> Self {
        LogSuppressor { last_emitted: DashMap::new() }
    }

    /// Logs `error` at error level, attributed to `source`, unless an
    /// error of the same kind from the same source was already logged
    /// within the suppression window. Always returns whether it logged,
    /// so callers can still bump a metric unconditionally.
    pub fn log(&self, source: &str, error: &ClarionError) -> bool {
        let key = (error.kind(), source.to_string());
        let now = Instant::now();
        let should_log = match self.last_emitted.get(&key) {
            Some(last) if now.duration_since(*last) < WINDOW => false,
            _ => true,
        };
        if should_log {
            self.last_emitted.insert(key, now);
            error!(source, kind = error.kind(), "{error}");
        }
        should_log
    }

    /// Variant for non-fatal, informational conditions (e.g. the
    /// stability guard tripping) that still shouldn't spam at warn
    /// level under repeated occurrences.
    pub fn log_warning(&self, source: &str, kind: &'static str, message: &str) -> bool {
        let key = (kind, source.to_string());
        let now = Instant::now();
        let should_log = match self.last_emitted.get(&key) {
            Some(last) if now.duration_since(*last) < WINDOW => false,
            _ => true,
        };
        if should_log {
            self.last_emitted.insert(key, now);
            warn!(source, kind, "{message}");
        }
        should_log
    }
}

impl Default for LogSuppressor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_error() -> ClarionError {
        ClarionError::MalformedRecord { exporter: "exp-1".to_string(), reason: "short packet".to_string() }
    }

    #[test]
    fn suppresses_repeated_errors_of_the_same_kind_and_source_within_the_window() {
        let suppressor = LogSuppressor::new();
        assert!(suppressor.log("decoder", &sample_error()));
        assert!(!suppressor.log("decoder", &sample_error()));
    }

    #[test]
    fn different_sources_are_tracked_independently() {
        let suppressor = LogSuppressor::new();
        assert!(suppressor.log("decoder-a", &sample_error()));
        assert!(suppressor.log("decoder-b", &sample_error()));
    }
}
