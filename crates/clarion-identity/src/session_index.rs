//! [crates/clarion-identity/src/session_index.rs]
//! Time-scoped `(address, time) -> session` index, populated from
//! access-control session events. Sessions are appended in arrival
//! order, not necessarily time order, so lookups scan rather than
//! assume a sorted structure per address.

use std::collections::BTreeMap;
use std::net::IpAddr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use clarion_model::confidence::Confidence;
use clarion_model::endpoint::EndpointId;
use clarion_model::user::GroupSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub address: IpAddr,
    pub endpoint_id: EndpointId,
    pub principal_name: String,
    pub groups: GroupSet,
    pub start: DateTime<Utc>,
    /// `None` means the session is still open ("current").
    pub end: Option<DateTime<Utc>>,
    pub source_confidence: Confidence,
}

impl SessionEvent {
    fn covers(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && self.end.map_or(true, |end| at <= end)
    }
}

#[derive(Default)]
pub struct SessionIndex {
    by_address: BTreeMap<IpAddr, Vec<SessionEvent>>,
}

impl SessionIndex {
    pub fn new() -> Self {
        SessionIndex::default()
    }

    pub fn insert(&mut self, event: SessionEvent) {
        self.by_address.entry(event.address).or_default().push(event);
    }

    /// The session covering `at`, or failing that, the most recently
    /// closed session for `address` ending within `grace_window` of
    /// `at`.
    pub fn query(&self, address: IpAddr, at: DateTime<Utc>, grace_window: Duration) -> Option<&SessionEvent> {
        let sessions = self.by_address.get(&address)?;

        if let Some(covering) = sessions.iter().filter(|s| s.covers(at)).max_by_key(|s| s.start) {
            return Some(covering);
        }

        sessions
            .iter()
            .filter(|s| s.end.is_some_and(|end| end <= at && at - end <= grace_window))
            .max_by_key(|s| s.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clarion_model::user::GroupSet;
    use std::net::Ipv4Addr;

    fn addr() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5))
    }

    fn session(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> SessionEvent {
        SessionEvent {
            address: addr(),
            endpoint_id: EndpointId::new(),
            principal_name: "alice".to_string(),
            groups: GroupSet::new(),
            start,
            end,
            source_confidence: Confidence::new(0.9),
        }
    }

    #[test]
    fn query_returns_the_session_covering_the_query_time() {
        let mut index = SessionIndex::new();
        let t0 = Utc::now();
        index.insert(session(t0, Some(t0 + Duration::minutes(30))));

        let found = index.query(addr(), t0 + Duration::minutes(10), Duration::seconds(60)).unwrap();
        assert_eq!(found.principal_name, "alice");
    }

    #[test]
    fn query_falls_back_within_the_grace_window_after_session_end() {
        let mut index = SessionIndex::new();
        let t0 = Utc::now();
        index.insert(session(t0, Some(t0 + Duration::minutes(5))));

        let within = index.query(addr(), t0 + Duration::minutes(5) + Duration::seconds(30), Duration::seconds(60));
        assert!(within.is_some());

        let beyond = index.query(addr(), t0 + Duration::minutes(5) + Duration::seconds(90), Duration::seconds(60));
        assert!(beyond.is_none());
    }

    #[test]
    fn query_on_unknown_address_is_none() {
        let index = SessionIndex::new();
        assert!(index.query(addr(), Utc::now(), Duration::seconds(60)).is_none());
    }
}
