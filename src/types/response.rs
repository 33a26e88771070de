//! Typed verdicts returned by the detection endpoint.
//!
//! Server payloads are validated at the boundary: [`GuardrailResponse`] only
//! deserializes from bodies that satisfy its invariants, so holders of a value
//! never need to re-check them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Severity of a detection result, ordered from `None` to `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum RiskLevel {
    #[default]
    #[serde(rename = "no_risk", alias = "none")]
    None,
    #[serde(rename = "low_risk", alias = "low")]
    Low,
    #[serde(rename = "medium_risk", alias = "medium")]
    Medium,
    #[serde(rename = "high_risk", alias = "high")]
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Default action for a verdict at this level.
    pub fn default_action(&self) -> SuggestAction {
        match self {
            Self::None => SuggestAction::Pass,
            Self::Low | Self::Medium => SuggestAction::Substitute,
            Self::High => SuggestAction::Block,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the service recommends doing with the checked content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuggestAction {
    #[serde(rename = "pass")]
    Pass,
    #[serde(rename = "reject", alias = "block")]
    Block,
    #[serde(rename = "replace", alias = "substitute")]
    Substitute,
}

impl SuggestAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Block => "block",
            Self::Substitute => "substitute",
        }
    }
}

impl fmt::Display for SuggestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result for one detection dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCategoryResult {
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub categories: BTreeSet<String>,
}

/// Per-dimension results: compliance, security and data leakage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailResult {
    pub compliance: RiskCategoryResult,
    pub security: RiskCategoryResult,
    /// Older deployments omit the data-leak dimension; it then reads as no risk.
    #[serde(default)]
    pub data: RiskCategoryResult,
}

impl GuardrailResult {
    /// Highest severity across the three dimensions.
    pub fn max_risk_level(&self) -> RiskLevel {
        self.compliance
            .risk_level
            .max(self.security.risk_level)
            .max(self.data.risk_level)
    }
}

/// A validated guardrail verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGuardrailResponse")]
pub struct GuardrailResponse {
    pub id: String,
    pub result: GuardrailResult,
    pub overall_risk_level: RiskLevel,
    pub suggest_action: SuggestAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggest_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl GuardrailResponse {
    pub fn is_safe(&self) -> bool {
        self.overall_risk_level == RiskLevel::None
    }

    pub fn is_blocked(&self) -> bool {
        self.suggest_action == SuggestAction::Block
    }

    pub fn has_substitute(&self) -> bool {
        self.suggest_answer.is_some()
    }

    /// Union of the category labels of all three dimensions.
    pub fn all_categories(&self) -> BTreeSet<String> {
        let r = &self.result;
        r.compliance
            .categories
            .iter()
            .chain(r.security.categories.iter())
            .chain(r.data.categories.iter())
            .cloned()
            .collect()
    }

    /// Action implied by `overall_risk_level` when the server does not override it.
    pub fn expected_action(&self) -> SuggestAction {
        self.overall_risk_level.default_action()
    }
}

#[derive(Deserialize)]
struct RawGuardrailResponse {
    id: String,
    result: GuardrailResult,
    overall_risk_level: RiskLevel,
    suggest_action: SuggestAction,
    #[serde(default)]
    suggest_answer: Option<String>,
    #[serde(default)]
    score: Option<f64>,
}

impl TryFrom<RawGuardrailResponse> for GuardrailResponse {
    type Error = String;

    fn try_from(raw: RawGuardrailResponse) -> Result<Self, Self::Error> {
        let max = raw.result.max_risk_level();
        if raw.overall_risk_level != max {
            return Err(format!(
                "overall_risk_level '{}' does not match the highest dimension level '{}'",
                raw.overall_risk_level, max
            ));
        }
        if raw.overall_risk_level == RiskLevel::None && raw.suggest_action == SuggestAction::Block {
            return Err(
                "suggest_action 'reject' contradicts overall_risk_level 'none'".to_string(),
            );
        }
        if let Some(score) = raw.score {
            if !(0.0..=1.0).contains(&score) {
                return Err(format!("score {} is outside [0, 1]", score));
            }
        }
        Ok(Self {
            id: raw.id,
            result: raw.result,
            overall_risk_level: raw.overall_risk_level,
            suggest_action: raw.suggest_action,
            suggest_answer: raw.suggest_answer,
            score: raw.score,
        })
    }
}

/// Model catalogue returned by the models endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(default)]
    pub data: Vec<ModelInfo>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ModelList {
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.data.iter().map(|m| m.id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
