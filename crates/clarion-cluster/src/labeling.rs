//! [crates/clarion-cluster/src/labeling.rs]
//! Semantic labeling priority chain for a freshly clustered group of
//! endpoints: prefer an agreed identity-source profile, fall back to
//! device type, then directory group, then infer from traffic
//! behavior. Each step records the deciding counts in a rationale
//! string so the label is auditable.

use std::collections::HashMap;

use clarion_model::endpoint::EndpointId;

const PROFILE_THRESHOLD: f64 = 0.8;
const DEVICE_TYPE_THRESHOLD: f64 = 0.7;
const DIRECTORY_GROUP_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficRole {
    Client,
    Server,
    Mixed,
}

/// Per-endpoint context a cluster's label is derived from. Fields are
/// optional because not every endpoint has identity or directory
/// correlation by the time the batch run executes.
#[derive(Debug, Clone)]
pub struct LabelingContext {
    pub endpoint_id: EndpointId,
    pub identity_profile: Option<String>,
    pub device_type: Option<String>,
    pub directory_group: Option<String>,
    pub dominant_role: TrafficRole,
    pub dominant_service_class: Option<String>,
}

pub struct SemanticLabel {
    pub label: String,
    pub rationale: String,
    /// The agreement share that decided the label (the majority
    /// fraction for the three source-based rules, or a fixed moderate
    /// value for the behavioral fallback, which has no natural share
    /// of its own). Feeds the per-endpoint confidence calculation
    /// alongside the clustering assignment probability.
    pub strength: f64,
}

fn majority_share<'a, I: Iterator<Item = &'a str>>(values: I, _total: usize) -> Option<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts.into_iter().max_by_key(|(_, count)| *count).map(|(v, count)| (v.to_string(), count))
}

pub fn label_cluster(members: &[LabelingContext]) -> SemanticLabel {
    let total = members.len();
    if total == 0 {
        return SemanticLabel { label: "Empty".to_string(), rationale: "cluster has no members".to_string(), strength: 0.0 };
    }

    if let Some((profile, count)) = majority_share(members.iter().filter_map(|m| m.identity_profile.as_deref()), total) {
        let share = count as f64 / total as f64;
        if share >= PROFILE_THRESHOLD {
            return SemanticLabel {
                label: profile.clone(),
                rationale: format!("{count}/{total} members ({:.0}%) share identity profile {profile:?}", share * 100.0),
                strength: share,
            };
        }
    }

    if let Some((device_type, count)) = majority_share(members.iter().filter_map(|m| m.device_type.as_deref()), total) {
        let share = count as f64 / total as f64;
        if share >= DEVICE_TYPE_THRESHOLD {
            return SemanticLabel {
                label: device_type.clone(),
                rationale: format!("{count}/{total} members ({:.0}%) share device type {device_type:?}", share * 100.0),
                strength: share,
            };
        }
    }

    if let Some((group, count)) = majority_share(members.iter().filter_map(|m| m.directory_group.as_deref()), total) {
        let share = count as f64 / total as f64;
        if share >= DIRECTORY_GROUP_THRESHOLD {
            return SemanticLabel {
                label: format!("{group}-Devices"),
                rationale: format!("{count}/{total} members ({:.0}%) share directory group {group:?}", share * 100.0),
                strength: share,
            };
        }
    }

    let client_count = members.iter().filter(|m| m.dominant_role == TrafficRole::Client).count();
    let server_count = members.iter().filter(|m| m.dominant_role == TrafficRole::Server).count();
    let role = if server_count > client_count { "Servers" } else { "Clients" };

    let service_class = majority_share(members.iter().filter_map(|m| m.dominant_service_class.as_deref()), total);
    let label = match &service_class {
        Some((class, _)) => format!("Behavioral-{class}-{role}"),
        None => format!("Behavioral-{role}"),
    };
    let rationale = match service_class {
        Some((class, count)) => {
            format!("no profile/device-type/group majority; behavior inferred: {server_count} servers, {client_count} clients, dominant service class {class:?} ({count}/{total})")
        }
        None => format!("no profile/device-type/group majority; behavior inferred: {server_count} servers, {client_count} clients"),
    };

    let strength = (server_count.max(client_count) as f64 / total as f64).max(0.5);

    SemanticLabel { label, rationale, strength }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(profile: Option<&str>, device: Option<&str>, group: Option<&str>, role: TrafficRole) -> LabelingContext {
        LabelingContext {
            endpoint_id: EndpointId::new(),
            identity_profile: profile.map(String::from),
            device_type: device.map(String::from),
            directory_group: group.map(String::from),
            dominant_role: role,
            dominant_service_class: None,
        }
    }

    #[test]
    fn prefers_identity_profile_when_majority_agree() {
        let members: Vec<_> = (0..10).map(|i| ctx(Some(if i < 9 { "finance-workstation" } else { "other" }), None, None, TrafficRole::Client)).collect();
        let label = label_cluster(&members);
        assert_eq!(label.label, "finance-workstation");
    }

    #[test]
    fn falls_back_to_device_type_when_profile_is_not_a_majority() {
        let members: Vec<_> = (0..10)
            .map(|i| ctx(if i < 3 { Some("a") } else { None }, Some(if i < 8 { "printer" } else { "other" }), None, TrafficRole::Client))
            .collect();
        let label = label_cluster(&members);
        assert_eq!(label.label, "printer");
    }

    #[test]
    fn falls_back_to_directory_group_with_devices_suffix() {
        let members: Vec<_> = (0..10).map(|i| ctx(None, None, Some(if i < 7 { "engineering" } else { "other" }), TrafficRole::Client)).collect();
        let label = label_cluster(&members);
        assert_eq!(label.label, "engineering-Devices");
    }

    #[test]
    fn falls_back_to_behavioral_inference_when_nothing_agrees() {
        let members: Vec<_> = (0..10).map(|_| ctx(None, None, None, TrafficRole::Server)).collect();
        let label = label_cluster(&members);
        assert!(label.label.starts_with("Behavioral-"));
        assert!(label.label.ends_with("Servers"));
    }
}
