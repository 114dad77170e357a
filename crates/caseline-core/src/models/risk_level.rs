use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

/// Result level of a scoring rule. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RiskLevel {
    Low,
    #[serde(alias = "Medium")]
    Moderate,
    High,
    #[serde(rename = "Very High", alias = "VeryHigh")]
    VeryHigh,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [Self::Low, Self::Moderate, Self::High, Self::VeryHigh];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient parse used for labels from older documents (`"medium"`, `"very_high"`).
///
/// Compound bands such as `Low-Moderate` or `Moderate-High` map to their
/// higher level.
impl FromStr for RiskLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "low" => Ok(Self::Low),
            "moderate" | "medium" | "lowmoderate" | "lowmedium" => Ok(Self::Moderate),
            "high" | "moderatehigh" | "mediumhigh" => Ok(Self::High),
            "veryhigh" | "highveryhigh" => Ok(Self::VeryHigh),
            _ => Err(CoreError::UnknownRiskLevel(s.to_string())),
        }
    }
}
