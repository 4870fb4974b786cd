//! Neutral policy IR: the vendor-agnostic permit/deny rule set emitted
//! by the recommender. External per-vendor renderers consume this;
//! they are out of scope here.

use serde::{Deserialize, Serialize};

use crate::confidence::Confidence;
use crate::flow::Protocol;
use crate::sgt::SgtValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleAction {
    Permit,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleOrigin {
    Observed,
    Default,
    Inherited,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortConstraint {
    pub protocol: Protocol,
    /// `None` means "any port for this protocol".
    pub port: Option<u16>,
}

/// One rule within an `(src SGT, dst SGT)` cell's totally ordered rule
/// list. The last rule for any pair is always a terminal default so
/// evaluation is unambiguous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRule {
    pub src_sgt: SgtValue,
    pub dst_sgt: SgtValue,
    pub action: RuleAction,
    pub constraints: Vec<PortConstraint>,
    pub justification: String,
    pub confidence: Confidence,
    pub origin: RuleOrigin,
    /// Ordering position within the `(src, dst)` pair's rule list;
    /// lower evaluates first.
    pub sequence: u32,
}

impl PolicyRule {
    pub fn is_terminal_default(&self) -> bool {
        self.constraints.is_empty() && matches!(self.origin, RuleOrigin::Default)
    }
}

/// A "tighten" recommendation surfaced during brownfield reconciliation
/// when observed flows are strictly narrower than an inherited permit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TightenRecommendation {
    pub src_sgt: SgtValue,
    pub dst_sgt: SgtValue,
    pub inherited_summary: String,
    pub recommended_constraints: Vec<PortConstraint>,
    pub coverage_fraction: f64,
    pub rationale: String,
}

/// Severity classification for a flow the proposed rules would block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegressionSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionRisk {
    pub src_sgt: SgtValue,
    pub dst_sgt: SgtValue,
    pub protocol: Protocol,
    pub port: Option<u16>,
    pub observed_flow_count: u64,
    pub observed_byte_count: u64,
    pub severity: RegressionSeverity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactAnalysis {
    pub permit_count: usize,
    pub deny_count: usize,
    pub regression_risks: Vec<RegressionRisk>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRecommendation {
    pub matrix_version: u64,
    pub rules: Vec<PolicyRule>,
    pub tighten_recommendations: Vec<TightenRecommendation>,
    pub impact: ImpactAnalysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultPosture {
    Permit,
    Deny,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_default_has_no_constraints() {
        let rule = PolicyRule {
            src_sgt: SgtValue(10),
            dst_sgt: SgtValue(20),
            action: RuleAction::Deny,
            constraints: vec![],
            justification: "global default posture".into(),
            confidence: Confidence::new(1.0),
            origin: RuleOrigin::Default,
            sequence: 99,
        };
        assert!(rule.is_terminal_default());
    }
}
