//! [crates/clarion-agent/src/sequence.rs]
//! Monotonic sequence allocation, one counter per endpoint this agent
//! reports on. The ingest store gates merges on these sequences being
//! strictly increasing per (agent, endpoint); this is the agent-side
//! half of that contract.

use std::collections::HashMap;

use clarion_model::endpoint::EndpointKey;

/// Hands out strictly increasing sequence numbers per endpoint. Starts
/// at 1 so a store that initializes "last applied" at 0 always accepts
/// an endpoint's first envelope.
#[derive(Debug, Default)]
pub struct SequenceAllocator {
    next: HashMap<EndpointKey, u64>,
}

impl SequenceAllocator {
    pub fn new() -> Self {
        SequenceAllocator { next: HashMap::new() }
    }

    pub fn next_sequence(&mut self, key: &EndpointKey) -> u64 {
        let entry = self.next.entry(key.clone()).or_insert(0);
        *entry += 1;
        *entry
    }

    pub fn current(&self, key: &EndpointKey) -> Option<u64> {
        self.next.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn sequences_increase_strictly_per_key() {
        let mut allocator = SequenceAllocator::new();
        let key = EndpointKey::Minted(Uuid::new_v4());

        assert_eq!(allocator.next_sequence(&key), 1);
        assert_eq!(allocator.next_sequence(&key), 2);
        assert_eq!(allocator.next_sequence(&key), 3);
    }

    #[test]
    fn distinct_keys_have_independent_counters() {
        let mut allocator = SequenceAllocator::new();
        let a = EndpointKey::Minted(Uuid::new_v4());
        let b = EndpointKey::Minted(Uuid::new_v4());

        assert_eq!(allocator.next_sequence(&a), 1);
        assert_eq!(allocator.next_sequence(&b), 1);
        assert_eq!(allocator.next_sequence(&a), 2);
        assert_eq!(allocator.current(&b), Some(1));
    }
}
