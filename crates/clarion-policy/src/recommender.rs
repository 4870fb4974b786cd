//! [crates/clarion-policy/src/recommender.rs]
//! Policy recommender (C9): turns a matrix snapshot plus an optional
//! brownfield catalog into a neutral permit/deny rule set, least-
//! privilege "tighten" suggestions, and an impact analysis of flows
//! the proposal would newly block.

use std::collections::HashMap;

use async_trait::async_trait;

use clarion_model::confidence::Confidence;
use clarion_model::flow::Protocol;
use clarion_model::matrix::{MatrixCell, MatrixSnapshot, PortShare};
use clarion_model::policy::{
    DefaultPosture, ImpactAnalysis, PolicyRecommendation, PolicyRule, PortConstraint,
    RegressionRisk, RegressionSeverity, RuleAction, RuleOrigin, TightenRecommendation,
};
use clarion_model::sgt::SgtValue;

use crate::errors::PolicyError;

/// An existing policy a brownfield site already enforces for a
/// `(src, dst)` SGT pair. Empty `constraints` with `action: Permit`
/// means "permit any", the case the least-privilege delta looks for.
#[derive(Debug, Clone)]
pub struct InheritedPolicy {
    pub action: RuleAction,
    pub constraints: Vec<PortConstraint>,
    pub summary: String,
}

#[async_trait]
pub trait ExternalPolicyCatalog: Send + Sync {
    async fn inherited_rule(&self, src: SgtValue, dst: SgtValue) -> Result<Option<InheritedPolicy>, PolicyError>;
}

#[derive(Debug, Clone, Copy)]
pub struct RecommenderConfig {
    /// Minimum combined flow share the selected top ports must cover
    /// before the remainder is left to the default rule.
    pub port_coverage_threshold: f64,
    pub default_posture: DefaultPosture,
    /// Flow count at or above which volume sufficiency reaches 1.0 in
    /// the confidence calculation.
    pub full_confidence_flow_count: u64,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        RecommenderConfig { port_coverage_threshold: 0.9, default_posture: DefaultPosture::Deny, full_confidence_flow_count: 50 }
    }
}

fn default_action(posture: DefaultPosture) -> RuleAction {
    match posture {
        DefaultPosture::Permit => RuleAction::Permit,
        DefaultPosture::Deny => RuleAction::Deny,
    }
}

/// Splits a cell's ranked top ports into the prefix needed to reach
/// `threshold` combined flow share and the remainder left uncovered.
fn split_at_coverage(top_ports: &[PortShare], threshold: f64) -> (Vec<PortConstraint>, f64, Vec<PortShare>) {
    let mut constraints = Vec::new();
    let mut leftover = Vec::new();
    let mut cumulative = 0.0;
    for port in top_ports {
        if cumulative >= threshold {
            leftover.push(port.clone());
            continue;
        }
        constraints.push(PortConstraint { protocol: port.protocol, port: Some(port.port) });
        cumulative += port.flow_share;
    }
    (constraints, cumulative.min(1.0), leftover)
}

fn severity_of(flow_share: f64) -> RegressionSeverity {
    if flow_share >= 0.05 {
        RegressionSeverity::High
    } else if flow_share >= 0.01 {
        RegressionSeverity::Medium
    } else {
        RegressionSeverity::Low
    }
}

fn observed_confidence(cell: &MatrixCell, sgt_confidence: &HashMap<SgtValue, Confidence>, config: &RecommenderConfig) -> Confidence {
    let endpoint_confidence = Confidence::weighted_average(&[
        (sgt_confidence.get(&cell.src_sgt).copied().unwrap_or(Confidence::zero()), 1.0),
        (sgt_confidence.get(&cell.dst_sgt).copied().unwrap_or(Confidence::zero()), 1.0),
    ]);
    let sufficiency = Confidence::new(cell.flow_count as f64 / config.full_confidence_flow_count.max(1) as f64);
    endpoint_confidence.combine(sufficiency)
}

fn justification(cell: &MatrixCell, constraints: &[PortConstraint], coverage: f64) -> String {
    let ports: Vec<String> = constraints.iter().map(|c| match c.port {
        Some(p) => format!("{}/{}", p, c.protocol.as_str()),
        None => format!("any/{}", c.protocol.as_str()),
    }).collect();
    format!(
        "{} flows, {} bytes observed; top ports {:?} cover {:.0}% of flow volume",
        cell.flow_count, cell.byte_count, ports, coverage * 100.0
    )
}

/// Produces recommendations for every `(src, dst)` pair in `pairs`.
/// Pairs with neither an inherited policy nor a matrix cell receive a
/// single terminal default rule.
pub async fn recommend(
    matrix: &MatrixSnapshot,
    pairs: &[(SgtValue, SgtValue)],
    catalog: Option<&dyn ExternalPolicyCatalog>,
    sgt_confidence: &HashMap<SgtValue, Confidence>,
    config: &RecommenderConfig,
) -> Result<PolicyRecommendation, PolicyError> {
    let mut rules = Vec::new();
    let mut tighten_recommendations = Vec::new();
    let mut regression_risks = Vec::new();

    for &(src, dst) in pairs {
        let cell = matrix.cells.iter().find(|c| c.src_sgt == src && c.dst_sgt == dst);
        let inherited = match catalog {
            Some(catalog) => catalog.inherited_rule(src, dst).await?,
            None => None,
        };

        match (inherited, cell) {
            (Some(inherited), cell) => {
                rules.push(PolicyRule {
                    src_sgt: src,
                    dst_sgt: dst,
                    action: inherited.action,
                    constraints: inherited.constraints.clone(),
                    justification: format!("inherited policy: {}", inherited.summary),
                    confidence: Confidence::new(1.0),
                    origin: RuleOrigin::Inherited,
                    sequence: 0,
                });

                if let Some(cell) = cell {
                    if inherited.action == RuleAction::Permit && inherited.constraints.is_empty() {
                        let (recommended_constraints, coverage, _) = split_at_coverage(&cell.top_ports, config.port_coverage_threshold);
                        tighten_recommendations.push(TightenRecommendation {
                            src_sgt: src,
                            dst_sgt: dst,
                            inherited_summary: inherited.summary.clone(),
                            recommended_constraints,
                            coverage_fraction: coverage,
                            rationale: format!(
                                "inherited rule permits any traffic but observed flows use only {} port/protocol combination(s)",
                                cell.top_ports.len()
                            ),
                        });
                    }
                }
            }
            (None, Some(cell)) => {
                let (constraints, coverage, leftover) = split_at_coverage(&cell.top_ports, config.port_coverage_threshold);
                let confidence = observed_confidence(cell, sgt_confidence, config);
                let rule_justification = justification(cell, &constraints, coverage);

                rules.push(PolicyRule {
                    src_sgt: src,
                    dst_sgt: dst,
                    action: RuleAction::Permit,
                    constraints,
                    justification: rule_justification,
                    confidence,
                    origin: RuleOrigin::Observed,
                    sequence: 0,
                });
                rules.push(PolicyRule {
                    src_sgt: src,
                    dst_sgt: dst,
                    action: default_action(config.default_posture),
                    constraints: Vec::new(),
                    justification: "default posture applied to traffic outside the observed top ports".to_string(),
                    confidence: Confidence::new(1.0),
                    origin: RuleOrigin::Default,
                    sequence: 1,
                });

                if matches!(config.default_posture, DefaultPosture::Deny) {
                    for port in leftover {
                        regression_risks.push(RegressionRisk {
                            src_sgt: src,
                            dst_sgt: dst,
                            protocol: port.protocol,
                            port: Some(port.port),
                            observed_flow_count: (port.flow_share * cell.flow_count as f64).round() as u64,
                            observed_byte_count: (port.byte_share * cell.byte_count as f64).round() as u64,
                            severity: severity_of(port.flow_share),
                        });
                    }
                }
            }
            (None, None) => {
                rules.push(PolicyRule {
                    src_sgt: src,
                    dst_sgt: dst,
                    action: default_action(config.default_posture),
                    constraints: Vec::new(),
                    justification: "no observed flows and no inherited policy".to_string(),
                    confidence: Confidence::new(1.0),
                    origin: RuleOrigin::Default,
                    sequence: 0,
                });
            }
        }
    }

    let permit_count = rules.iter().filter(|r| r.action == RuleAction::Permit).count();
    let deny_count = rules.iter().filter(|r| r.action == RuleAction::Deny).count();

    Ok(PolicyRecommendation {
        matrix_version: matrix.version,
        rules,
        tighten_recommendations,
        impact: ImpactAnalysis { permit_count, deny_count, regression_risks },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn cell(src: u16, dst: u16, flow_count: u64, ports: Vec<(u16, f64)>) -> MatrixCell {
        MatrixCell {
            src_sgt: SgtValue(src),
            dst_sgt: SgtValue(dst),
            flow_count,
            byte_count: flow_count * 100,
            top_ports: ports.into_iter().map(|(port, flow_share)| PortShare { port, protocol: Protocol::Tcp, flow_share, byte_share: flow_share }).collect(),
            dominant_protocols: vec![],
        }
    }

    fn matrix(cells: Vec<MatrixCell>) -> MatrixSnapshot {
        MatrixSnapshot { version: 1, window_start: Utc::now(), window_end: Utc::now(), cells, unknown: Default::default(), approximate: false }
    }

    #[tokio::test]
    async fn emits_permit_and_default_for_observed_traffic_without_inheritance() {
        let snapshot = matrix(vec![cell(10, 20, 100, vec![(443, 0.95), (22, 0.05)])]);
        let recommendation = recommend(&snapshot, &[(SgtValue(10), SgtValue(20))], None, &HashMap::new(), &RecommenderConfig::default()).await.unwrap();

        assert_eq!(recommendation.rules.len(), 2);
        assert_eq!(recommendation.rules[0].origin, RuleOrigin::Observed);
        assert_eq!(recommendation.rules[0].action, RuleAction::Permit);
        assert_eq!(recommendation.rules[1].origin, RuleOrigin::Default);
        assert_eq!(recommendation.impact.permit_count, 1);
        assert_eq!(recommendation.impact.deny_count, 1);
    }

    #[tokio::test]
    async fn pair_with_no_flows_and_no_inheritance_gets_a_single_default_rule() {
        let snapshot = matrix(vec![]);
        let recommendation = recommend(&snapshot, &[(SgtValue(10), SgtValue(20))], None, &HashMap::new(), &RecommenderConfig::default()).await.unwrap();

        assert_eq!(recommendation.rules.len(), 1);
        assert_eq!(recommendation.rules[0].origin, RuleOrigin::Default);
        assert_eq!(recommendation.rules[0].action, RuleAction::Deny);
    }

    struct PermitAnyCatalog;

    #[async_trait]
    impl ExternalPolicyCatalog for PermitAnyCatalog {
        async fn inherited_rule(&self, _src: SgtValue, _dst: SgtValue) -> Result<Option<InheritedPolicy>, PolicyError> {
            Ok(Some(InheritedPolicy { action: RuleAction::Permit, constraints: vec![], summary: "legacy permit any".to_string() }))
        }
    }

    #[tokio::test]
    async fn narrower_observed_traffic_under_a_permit_any_inheritance_yields_a_tighten_recommendation() {
        let snapshot = matrix(vec![cell(10, 20, 100, vec![(443, 1.0)])]);
        let catalog = PermitAnyCatalog;
        let recommendation = recommend(&snapshot, &[(SgtValue(10), SgtValue(20))], Some(&catalog), &HashMap::new(), &RecommenderConfig::default()).await.unwrap();

        assert_eq!(recommendation.rules.len(), 1);
        assert_eq!(recommendation.rules[0].origin, RuleOrigin::Inherited);
        assert_eq!(recommendation.tighten_recommendations.len(), 1);
        assert_eq!(recommendation.tighten_recommendations[0].recommended_constraints.len(), 1);
    }

    #[tokio::test]
    async fn leftover_ports_below_coverage_threshold_become_regression_risks() {
        let snapshot = matrix(vec![cell(10, 20, 100, vec![(443, 0.5), (8080, 0.3), (9999, 0.2)])]);
        let recommendation = recommend(&snapshot, &[(SgtValue(10), SgtValue(20))], None, &HashMap::new(), &RecommenderConfig::default()).await.unwrap();

        assert!(!recommendation.impact.regression_risks.is_empty());
        assert!(recommendation.impact.regression_risks.iter().any(|r| r.port == Some(9999)));
    }
}
