use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{DomainId, RuleId};
use crate::models::risk_level::RiskLevel;

/// The determination for one score: either a matching rule was found, or
/// the score falls outside every configured range.
///
/// `Unscored` is a valid display state ("not configured for this range"),
/// not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "status", rename_all = "snake_case")]
#[ts(export)]
pub enum Outcome {
    Scored {
        #[ts(type = "number")]
        score: i64,
        result_level: RiskLevel,
        recommendation: String,
        rule_id: RuleId,
    },
    Unscored {
        #[ts(type = "number")]
        score: i64,
    },
}

impl Outcome {
    pub fn score(&self) -> i64 {
        match self {
            Self::Scored { score, .. } | Self::Unscored { score } => *score,
        }
    }

    pub fn result_level(&self) -> Option<RiskLevel> {
        match self {
            Self::Scored { result_level, .. } => Some(*result_level),
            Self::Unscored { .. } => None,
        }
    }

    pub fn recommendation(&self) -> Option<&str> {
        match self {
            Self::Scored { recommendation, .. } => Some(recommendation),
            Self::Unscored { .. } => None,
        }
    }

    pub fn rule_id(&self) -> Option<&RuleId> {
        match self {
            Self::Scored { rule_id, .. } => Some(rule_id),
            Self::Unscored { .. } => None,
        }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, Self::Scored { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DomainOutcome {
    pub domain_id: DomainId,
    pub domain_name: String,
    pub outcome: Outcome,
}

/// Per-domain and total determinations for one scored response set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AssessmentResult {
    /// In the instrument's domain order.
    pub domains: Vec<DomainOutcome>,
    pub total: Outcome,
    /// False when the subject's population was absent or not one of the
    /// instrument's target populations, so only `All` rules were considered.
    pub population_matched: bool,
}

impl AssessmentResult {
    pub fn domain(&self, domain_id: &DomainId) -> Option<&Outcome> {
        self.domains
            .iter()
            .find(|d| &d.domain_id == domain_id)
            .map(|d| &d.outcome)
    }

    /// The most severe level determined anywhere in the result.
    pub fn highest_level(&self) -> Option<RiskLevel> {
        self.domains
            .iter()
            .map(|d| &d.outcome)
            .chain(std::iter::once(&self.total))
            .filter_map(Outcome::result_level)
            .max()
    }
}
