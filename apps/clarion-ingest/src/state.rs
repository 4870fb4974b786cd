//! [apps/clarion-ingest/src/state.rs]
//! Composition root for the ingest process: the sketch store, the
//! endpoint registry, the shared flow decoder (its template cache is
//! per-exporter, not per-worker, so every receive task shares one
//! instance), and the identity resolver. Everything else in this
//! crate borrows from an `Arc<AppState>`.

use std::sync::Mutex;

use clarion_config::ClarionConfig;
use clarion_decoder::FlowDecoder;
use clarion_identity::{IdentityResolver, ResolverConfig};
use clarion_sketch::FeatureConfig;
use clarion_store::SketchStore;

use crate::registry::EndpointRegistry;

pub struct AppState {
    pub config: ClarionConfig,
    pub sketches: SketchStore,
    pub registry: EndpointRegistry,
    pub decoder: Mutex<FlowDecoder>,
    pub identity: Mutex<IdentityResolver>,
    pub feature_config: FeatureConfig,
}

impl AppState {
    pub fn new(config: ClarionConfig) -> Self {
        let shape = clarion_sketch::SketchShape::new(
            config.sketch.hll_precision,
            config.sketch.cms_width,
            config.sketch.cms_depth,
        );
        let decoder = FlowDecoder::new(
            config.decoder.template_ttl,
            config.decoder.template_cache_capacity,
            config.decoder.pending_template_buffer_capacity,
        );
        let resolver_config = ResolverConfig {
            grace_window: chrono::Duration::from_std(config.identity.grace_window)
                .unwrap_or_else(|_| chrono::Duration::minutes(15)),
            pending_capacity: config.identity.pending_attribution_capacity,
            ..ResolverConfig::default()
        };

        AppState {
            sketches: SketchStore::new(shape),
            registry: EndpointRegistry::new(),
            decoder: Mutex::new(decoder),
            identity: Mutex::new(IdentityResolver::new(resolver_config)),
            feature_config: FeatureConfig::default(),
            config,
        }
    }
}
