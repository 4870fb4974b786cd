//! [crates/clarion-decoder/src/template.rs]
//! Per-exporter template cache for NetFlow v9 and IPFIX. Both formats
//! decouple a data record's wire layout from its meaning: a template
//! flowset defines the layout once, data flowsets reference it by ID
//! until the exporter resends or replaces it. A data flowset can
//! legitimately arrive before its template (UDP has no ordering
//! guarantee), so unresolved records are buffered rather than dropped
//! outright, up to a bound.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use lru::LruCache;
use std::num::NonZeroUsize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateField {
    pub field_type: u16,
    pub length: u16,
}

#[derive(Debug, Clone)]
pub struct Template {
    pub template_id: u16,
    pub fields: Vec<TemplateField>,
    pub learned_at: DateTime<Utc>,
}

impl Template {
    pub fn record_length(&self) -> usize {
        self.fields.iter().map(|f| f.length as usize).sum()
    }
}

/// A data record that arrived before its template was known, held
/// until the template shows up or the buffer fills and the oldest
/// entry is dropped.
#[derive(Debug, Clone)]
pub struct PendingRecord {
    pub template_id: u16,
    pub raw: Vec<u8>,
    pub received_at: DateTime<Utc>,
}

pub struct TemplateCache {
    ttl: Duration,
    pending_capacity: usize,
    templates: HashMap<String, LruCache<u16, Template>>,
    pending: HashMap<String, VecDeque<PendingRecord>>,
    templates_per_exporter: NonZeroUsize,
}

impl TemplateCache {
    pub fn new(ttl: Duration, templates_per_exporter: usize, pending_capacity: usize) -> Self {
        TemplateCache {
            ttl,
            pending_capacity: pending_capacity.max(1),
            templates: HashMap::new(),
            pending: HashMap::new(),
            templates_per_exporter: NonZeroUsize::new(templates_per_exporter.max(1)).unwrap(),
        }
    }

    pub fn learn(&mut self, exporter_id: &str, template: Template) {
        let cache = self
            .templates
            .entry(exporter_id.to_string())
            .or_insert_with(|| LruCache::new(self.templates_per_exporter));
        cache.put(template.template_id, template);
    }

    /// Looks up a template, treating an expired one the same as a
    /// missing one: callers should not build records off stale field
    /// layouts.
    pub fn get(&mut self, exporter_id: &str, template_id: u16, now: DateTime<Utc>) -> Option<Template> {
        let cache = self.templates.get_mut(exporter_id)?;
        let template = cache.get(&template_id)?;
        if now.signed_duration_since(template.learned_at).to_std().unwrap_or(Duration::MAX) > self.ttl {
            return None;
        }
        Some(template.clone())
    }

    /// Buffers a data record whose template hasn't arrived yet. Drops
    /// the oldest pending record for this exporter once at capacity:
    /// favors bounded memory over completeness under sustained
    /// template loss.
    pub fn buffer_pending(&mut self, exporter_id: &str, record: PendingRecord) {
        let queue = self.pending.entry(exporter_id.to_string()).or_default();
        if queue.len() >= self.pending_capacity {
            queue.pop_front();
        }
        queue.push_back(record);
    }

    /// Drains and returns every pending record for `template_id` now
    /// that its template has been learned.
    pub fn drain_pending_for(&mut self, exporter_id: &str, template_id: u16) -> Vec<PendingRecord> {
        let Some(queue) = self.pending.get_mut(exporter_id) else {
            return Vec::new();
        };
        let (matching, rest): (VecDeque<_>, VecDeque<_>) =
            queue.drain(..).partition(|r| r.template_id == template_id);
        *queue = rest;
        matching.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(field_type: u16, length: u16) -> TemplateField {
        TemplateField { field_type, length }
    }

    #[test]
    fn learned_template_is_retrievable_within_ttl() {
        let mut cache = TemplateCache::new(Duration::from_secs(1800), 16, 16);
        let now = Utc::now();
        cache.learn(
            "exp-1",
            Template {
                template_id: 256,
                fields: vec![field(8, 4), field(12, 4)],
                learned_at: now,
            },
        );
        assert!(cache.get("exp-1", 256, now).is_some());
    }

    #[test]
    fn expired_template_is_treated_as_missing() {
        let mut cache = TemplateCache::new(Duration::from_secs(60), 16, 16);
        let learned_at = Utc::now() - chrono::Duration::seconds(120);
        cache.learn(
            "exp-1",
            Template {
                template_id: 256,
                fields: vec![field(8, 4)],
                learned_at,
            },
        );
        assert!(cache.get("exp-1", 256, Utc::now()).is_none());
    }

    #[test]
    fn pending_buffer_drops_oldest_when_full() {
        let mut cache = TemplateCache::new(Duration::from_secs(1800), 16, 2);
        for i in 0..3u8 {
            cache.buffer_pending(
                "exp-1",
                PendingRecord {
                    template_id: 256,
                    raw: vec![i],
                    received_at: Utc::now(),
                },
            );
        }
        let drained = cache.drain_pending_for("exp-1", 256);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].raw, vec![1]);
        assert_eq!(drained[1].raw, vec![2]);
    }

    #[test]
    fn drain_leaves_other_templates_pending() {
        let mut cache = TemplateCache::new(Duration::from_secs(1800), 16, 16);
        cache.buffer_pending(
            "exp-1",
            PendingRecord {
                template_id: 256,
                raw: vec![1],
                received_at: Utc::now(),
            },
        );
        cache.buffer_pending(
            "exp-1",
            PendingRecord {
                template_id: 257,
                raw: vec![2],
                received_at: Utc::now(),
            },
        );
        let drained = cache.drain_pending_for("exp-1", 256);
        assert_eq!(drained.len(), 1);
        assert_eq!(cache.drain_pending_for("exp-1", 257).len(), 1);
    }
}
