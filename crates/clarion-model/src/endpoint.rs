//! Endpoint identity: a stable handle for an observed network
//! endpoint, keyed preferentially by hardware address, then by
//! exporter-scoped network address, then by a minted UUID.

use std::collections::VecDeque;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bound on the recent-address history kept per endpoint.
pub const MAX_ADDRESS_HISTORY: usize = 16;

/// The preference-ordered key an endpoint is resolved by. Hardware
/// addresses are globally stable; bare network addresses are only
/// stable within the exporter that observed them; everything else
/// falls back to a minted identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndpointKey {
    HardwareAddress(String),
    ExporterScopedAddress { exporter_id: String, addr: IpAddr },
    Minted(Uuid),
}

impl EndpointKey {
    pub fn minted() -> Self {
        EndpointKey::Minted(Uuid::new_v4())
    }
}

impl std::fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointKey::HardwareAddress(mac) => write!(f, "hw:{mac}"),
            EndpointKey::ExporterScopedAddress { exporter_id, addr } => {
                write!(f, "addr:{exporter_id}:{addr}")
            }
            EndpointKey::Minted(id) => write!(f, "uuid:{id}"),
        }
    }
}

/// Opaque endpoint identifier used as the primary key everywhere else
/// in the system (sketch store, membership table, matrix cells).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointId(pub Uuid);

impl EndpointId {
    pub fn new() -> Self {
        EndpointId(Uuid::new_v4())
    }
}

impl Default for EndpointId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EndpointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Device-type label contributed by identity sources or inferred
/// behaviorally; used as an input to semantic cluster labeling.
pub type DeviceType = String;

/// An observed endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointIdentity {
    pub id: EndpointId,
    pub key: EndpointKey,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub recent_addresses: VecDeque<IpAddr>,
    pub hostname: Option<String>,
    pub device_type: Option<DeviceType>,
}

impl EndpointIdentity {
    pub fn new(key: EndpointKey, observed_at: DateTime<Utc>) -> Self {
        EndpointIdentity {
            id: EndpointId::new(),
            key,
            first_seen: observed_at,
            last_seen: observed_at,
            recent_addresses: VecDeque::with_capacity(4),
            hostname: None,
            device_type: None,
        }
    }

    /// Records a fresh sighting. `first_seen` only moves backward,
    /// `last_seen` only moves forward, matching the store's
    /// first-/last-seen monotonicity invariant.
    pub fn observe(&mut self, addr: IpAddr, at: DateTime<Utc>) {
        if at < self.first_seen {
            self.first_seen = at;
        }
        if at > self.last_seen {
            self.last_seen = at;
        }
        if self.recent_addresses.back() != Some(&addr) {
            self.recent_addresses.push_back(addr);
            while self.recent_addresses.len() > MAX_ADDRESS_HISTORY {
                self.recent_addresses.pop_front();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn observe_is_first_last_seen_monotonic() {
        let t0 = Utc::now();
        let mut ep = EndpointIdentity::new(EndpointKey::minted(), t0);
        let addr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5));

        ep.observe(addr, t0 - chrono::Duration::seconds(10));
        assert!(ep.first_seen <= t0 - chrono::Duration::seconds(10));

        ep.observe(addr, t0 + chrono::Duration::seconds(10));
        assert!(ep.last_seen >= t0 + chrono::Duration::seconds(10));
    }

    #[test]
    fn address_history_is_bounded() {
        let t0 = Utc::now();
        let mut ep = EndpointIdentity::new(EndpointKey::minted(), t0);
        for i in 0..(MAX_ADDRESS_HISTORY as u8 + 10) {
            ep.observe(IpAddr::V4(Ipv4Addr::new(10, 0, 0, i)), t0);
        }
        assert_eq!(ep.recent_addresses.len(), MAX_ADDRESS_HISTORY);
    }
}
