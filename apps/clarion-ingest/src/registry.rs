//! [apps/clarion-ingest/src/registry.rs]
//! Maps the wire-level `EndpointKey` a decoder or edge agent observes
//! to the internal `EndpointId` every other component keys on. Minted
//! once per key, on first sighting, and never revised afterward.

use dashmap::DashMap;

use clarion_model::endpoint::{EndpointId, EndpointKey};

#[derive(Default)]
pub struct EndpointRegistry {
    by_key: DashMap<EndpointKey, EndpointId>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        EndpointRegistry { by_key: DashMap::new() }
    }

    /// Returns the endpoint id for `key`, minting and recording a new
    /// one the first time `key` is seen.
    pub fn resolve(&self, key: EndpointKey) -> EndpointId {
        if let Some(existing) = self.by_key.get(&key) {
            return *existing;
        }
        *self.by_key.entry(key).or_insert_with(EndpointId::new)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn same_key_resolves_to_the_same_endpoint_id() {
        let registry = EndpointRegistry::new();
        let key = EndpointKey::ExporterScopedAddress {
            exporter_id: "exp-1".to_string(),
            addr: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
        };

        let first = registry.resolve(key.clone());
        let second = registry.resolve(key);
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn distinct_keys_resolve_to_distinct_endpoint_ids() {
        let registry = EndpointRegistry::new();
        let a = registry.resolve(EndpointKey::HardwareAddress("aa:bb".to_string()));
        let b = registry.resolve(EndpointKey::HardwareAddress("cc:dd".to_string()));
        assert_ne!(a, b);
    }
}
