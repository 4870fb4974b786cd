//! [crates/clarion-identity/src/pending_queue.rs]
//! Bounded FIFO of endpoints that couldn't be resolved at observation
//! time. When a later session event covers the `(address, time)` of a
//! queued attribution, the resolver re-derives identity for it without
//! touching the endpoint's sketch.

use std::collections::VecDeque;
use std::net::IpAddr;

use chrono::{DateTime, Utc};

use clarion_model::endpoint::EndpointId;

use crate::session_index::SessionEvent;

pub const DEFAULT_CAPACITY: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAttribution {
    pub endpoint_id: EndpointId,
    pub address: IpAddr,
    pub at: DateTime<Utc>,
}

pub struct PendingAttributionQueue {
    capacity: usize,
    queue: VecDeque<PendingAttribution>,
    dropped: u64,
}

impl PendingAttributionQueue {
    pub fn new(capacity: usize) -> Self {
        PendingAttributionQueue { capacity, queue: VecDeque::new(), dropped: 0 }
    }

    /// Pushes onto the queue, dropping the oldest entry if at capacity.
    pub fn push(&mut self, attribution: PendingAttribution) {
        if self.queue.len() >= self.capacity {
            self.queue.pop_front();
            self.dropped += 1;
        }
        self.queue.push_back(attribution);
    }

    /// Removes and returns every queued attribution that `event`'s
    /// window now covers.
    pub fn drain_matching(&mut self, event: &SessionEvent) -> Vec<PendingAttribution> {
        let mut matched = Vec::new();
        let mut remaining = VecDeque::with_capacity(self.queue.len());
        while let Some(item) = self.queue.pop_front() {
            let covered = item.address == event.address
                && event.start <= item.at
                && event.end.map_or(true, |end| item.at <= end);
            if covered {
                matched.push(item);
            } else {
                remaining.push_back(item);
            }
        }
        self.queue = remaining;
        matched
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Default for PendingAttributionQueue {
    fn default() -> Self {
        PendingAttributionQueue::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clarion_model::user::GroupSet;
    use clarion_model::confidence::Confidence;
    use std::net::Ipv4Addr;

    fn addr() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, 9))
    }

    #[test]
    fn drops_oldest_entry_past_capacity() {
        let mut queue = PendingAttributionQueue::new(2);
        let t0 = Utc::now();
        queue.push(PendingAttribution { endpoint_id: EndpointId::new(), address: addr(), at: t0 });
        queue.push(PendingAttribution { endpoint_id: EndpointId::new(), address: addr(), at: t0 });
        queue.push(PendingAttribution { endpoint_id: EndpointId::new(), address: addr(), at: t0 });

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.dropped(), 1);
    }

    #[test]
    fn drain_matching_extracts_only_covered_attributions() {
        let mut queue = PendingAttributionQueue::new(10);
        let t0 = Utc::now();
        let covered = PendingAttribution { endpoint_id: EndpointId::new(), address: addr(), at: t0 };
        let uncovered = PendingAttribution {
            endpoint_id: EndpointId::new(),
            address: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 10)),
            at: t0,
        };
        queue.push(covered);
        queue.push(uncovered);

        let event = SessionEvent {
            address: addr(),
            endpoint_id: EndpointId::new(),
            principal_name: "alice".to_string(),
            groups: GroupSet::new(),
            start: t0 - chrono::Duration::minutes(1),
            end: Some(t0 + chrono::Duration::minutes(1)),
            source_confidence: Confidence::new(0.9),
        };

        let matched = queue.drain_matching(&event);
        assert_eq!(matched.len(), 1);
        assert_eq!(queue.len(), 1);
    }
}
