//! [crates/clarion-identity/src/resolver.rs]
//! Resolution of a flow endpoint to a user and group set (C4).
//! Confidence combines source agreement (session alone, session and
//! directory agreeing, or contradicting) with freshness decay of the
//! session data; both are independent evidence so they're composed
//! with `Confidence::combine`.

use std::net::IpAddr;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, instrument};

use clarion_model::confidence::Confidence;
use clarion_model::endpoint::EndpointId;
use clarion_model::user::{DirectorySnapshot, GroupSet};

use crate::directory_index::DirectoryIndex;
use crate::errors::IdentityError;
use crate::pending_queue::{PendingAttribution, PendingAttributionQueue};
use crate::session_index::{SessionEvent, SessionIndex};

/// Session-alone confidence: no directory corroboration available.
const AGREEMENT_SESSION_ONLY: f64 = 0.7;
/// Session and directory group sets agree.
const AGREEMENT_CORROBORATED: f64 = 0.95;
/// Session and directory disagree; trust the session but discount it.
const AGREEMENT_CONTRADICTED: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    pub endpoint_id: EndpointId,
    pub principal_name: String,
    pub groups: GroupSet,
    pub confidence: Confidence,
}

#[derive(Debug, Clone)]
pub enum ResolutionOutcome {
    Resolved(ResolvedIdentity),
    Pending(PendingAttribution),
}

pub struct ResolverConfig {
    pub grace_window: Duration,
    pub confidence_threshold: Confidence,
    pub freshness_half_life: Duration,
    pub pending_capacity: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            grace_window: Duration::seconds(60),
            confidence_threshold: Confidence::new(Confidence::LOW_MAX),
            freshness_half_life: Duration::hours(4),
            pending_capacity: crate::pending_queue::DEFAULT_CAPACITY,
        }
    }
}

pub struct IdentityResolver {
    sessions: SessionIndex,
    directory: DirectoryIndex,
    pending: PendingAttributionQueue,
    config: ResolverConfig,
}

impl IdentityResolver {
    pub fn new(config: ResolverConfig) -> Self {
        IdentityResolver {
            sessions: SessionIndex::new(),
            directory: DirectoryIndex::new(),
            pending: PendingAttributionQueue::new(config.pending_capacity),
            config,
        }
    }

    pub fn install_directory_snapshot(&mut self, snapshot: DirectorySnapshot) -> Result<(), IdentityError> {
        self.directory.install(snapshot)
    }

    /// Records a session event and retries resolution for any queued
    /// pending attribution it now covers. Returns identities that
    /// resolved as a result; attributions that still fall short of the
    /// confidence threshold are re-queued rather than dropped.
    #[instrument(skip(self, event), fields(address = %event.address))]
    pub fn record_session(&mut self, event: SessionEvent) -> Vec<ResolvedIdentity> {
        let matched = self.pending.drain_matching(&event);
        self.sessions.insert(event);

        matched
            .into_iter()
            .filter_map(|attribution| match self.resolve(attribution.endpoint_id, attribution.address, attribution.at) {
                ResolutionOutcome::Resolved(identity) => Some(identity),
                ResolutionOutcome::Pending(_) => None,
            })
            .collect()
    }

    /// Resolves `endpoint_id` at `address`/`at`. On low confidence or a
    /// missing session, the attribution is queued for lazy resolution
    /// and also returned so the caller can mark the sketch pending.
    #[instrument(skip(self))]
    pub fn resolve(&mut self, endpoint_id: EndpointId, address: IpAddr, at: DateTime<Utc>) -> ResolutionOutcome {
        let session = match self.sessions.query(address, at, self.config.grace_window) {
            Some(session) => session.clone(),
            None => {
                let pending = PendingAttribution { endpoint_id, address, at };
                self.pending.push(pending);
                return ResolutionOutcome::Pending(pending);
            }
        };

        let directory_groups = self.directory.groups_at(&session.principal_name, at);
        let confidence = score_confidence(&session, directory_groups.as_ref(), at, self.config.freshness_half_life);

        if confidence.value() >= self.config.confidence_threshold.value() {
            let groups = directory_groups.unwrap_or_else(|| session.groups.clone());
            ResolutionOutcome::Resolved(ResolvedIdentity {
                endpoint_id,
                principal_name: session.principal_name,
                groups,
                confidence,
            })
        } else {
            debug!(confidence = confidence.value(), "resolution below threshold, queueing");
            let pending = PendingAttribution { endpoint_id, address, at };
            self.pending.push(pending);
            ResolutionOutcome::Pending(pending)
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_dropped(&self) -> u64 {
        self.pending.dropped()
    }
}

fn score_confidence(
    session: &SessionEvent,
    directory_groups: Option<&GroupSet>,
    at: DateTime<Utc>,
    half_life: Duration,
) -> Confidence {
    let agreement = match directory_groups {
        None => AGREEMENT_SESSION_ONLY,
        Some(groups) if *groups == session.groups => AGREEMENT_CORROBORATED,
        Some(_) => AGREEMENT_CONTRADICTED,
    };

    let age = (at - session.start).max(Duration::zero());
    let half_life_secs = half_life.num_seconds().max(1) as f64;
    let decay = 0.5_f64.powf(age.num_seconds() as f64 / half_life_secs);

    Confidence::new(agreement).combine(Confidence::new(decay)).combine(session.source_confidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clarion_model::user::DirectoryEntry;
    use std::net::Ipv4Addr;

    fn addr() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7))
    }

    fn session_at(start: DateTime<Utc>, groups: &[&str]) -> SessionEvent {
        SessionEvent {
            address: addr(),
            endpoint_id: EndpointId::new(),
            principal_name: "alice".to_string(),
            groups: groups.iter().map(|g| g.to_string()).collect(),
            start,
            end: None,
            source_confidence: Confidence::new(1.0),
        }
    }

    #[test]
    fn resolves_immediately_when_a_covering_session_exists() {
        let mut resolver = IdentityResolver::new(ResolverConfig::default());
        let t0 = Utc::now();
        resolver.record_session(session_at(t0, &["engineering"]));

        let outcome = resolver.resolve(EndpointId::new(), addr(), t0 + Duration::minutes(1));
        match outcome {
            ResolutionOutcome::Resolved(identity) => assert_eq!(identity.principal_name, "alice"),
            ResolutionOutcome::Pending(_) => panic!("expected a resolved identity"),
        }
    }

    #[test]
    fn queues_pending_attribution_when_no_session_covers_the_query() {
        let mut resolver = IdentityResolver::new(ResolverConfig::default());
        let endpoint_id = EndpointId::new();
        let outcome = resolver.resolve(endpoint_id, addr(), Utc::now());

        assert!(matches!(outcome, ResolutionOutcome::Pending(_)));
        assert_eq!(resolver.pending_count(), 1);
    }

    #[test]
    fn a_later_session_event_resolves_a_previously_pending_attribution() {
        let mut resolver = IdentityResolver::new(ResolverConfig::default());
        let endpoint_id = EndpointId::new();
        let t0 = Utc::now();
        resolver.resolve(endpoint_id, addr(), t0);
        assert_eq!(resolver.pending_count(), 1);

        let mut covering = session_at(t0 - Duration::minutes(5), &["engineering"]);
        covering.end = Some(t0 + Duration::minutes(5));
        let resolved = resolver.record_session(covering);

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolver.pending_count(), 0);
    }

    #[test]
    fn directory_corroboration_raises_confidence_over_session_alone() {
        let mut with_directory = IdentityResolver::new(ResolverConfig::default());
        let t0 = Utc::now();
        with_directory.install_directory_snapshot(DirectorySnapshot {
            as_of: t0,
            entries: vec![DirectoryEntry {
                principal_name: "alice".to_string(),
                groups: ["engineering".to_string()].into_iter().collect(),
                department: None,
                title: None,
            }],
        }).unwrap();
        with_directory.record_session(session_at(t0, &["engineering"]));

        let mut session_only = IdentityResolver::new(ResolverConfig::default());
        session_only.record_session(session_at(t0, &["engineering"]));

        let at = t0 + Duration::minutes(1);
        let resolved_with_directory = match with_directory.resolve(EndpointId::new(), addr(), at) {
            ResolutionOutcome::Resolved(identity) => identity,
            ResolutionOutcome::Pending(_) => panic!("expected resolution"),
        };
        let resolved_session_only = match session_only.resolve(EndpointId::new(), addr(), at) {
            ResolutionOutcome::Resolved(identity) => identity,
            ResolutionOutcome::Pending(_) => panic!("expected resolution"),
        };

        assert!(resolved_with_directory.confidence.value() > resolved_session_only.confidence.value());
    }
}
