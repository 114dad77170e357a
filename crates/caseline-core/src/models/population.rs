use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A population tag such as `Male` or `Female`.
///
/// Matching is exact after trimming; the engine does not case-fold tags.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Population(String);

impl Population {
    /// Build a tag from free text. Returns `None` for blank input.
    pub fn new(tag: impl AsRef<str>) -> Option<Self> {
        let trimmed = tag.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the tag is blank, which can only happen for deserialized values.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which subjects a scoring rule applies to.
///
/// On the wire this is a plain string: `"All"` or a population tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PopulationFilter {
    #[default]
    All,
    Only(Population),
}

impl PopulationFilter {
    pub const ALL: &'static str = "All";

    pub fn only(tag: impl AsRef<str>) -> Self {
        Population::new(tag).map_or(Self::All, Self::Only)
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// The specific population this filter names, if any.
    pub fn population(&self) -> Option<&Population> {
        match self {
            Self::All => None,
            Self::Only(p) => Some(p),
        }
    }

    /// True for a deserialized filter that named no population.
    pub fn is_blank(&self) -> bool {
        self.population().is_some_and(Population::is_blank)
    }
}

/// A blank string is kept as a blank `Only` filter so validation can report
/// it; it never matches a subject and does not widen to `All`.
impl From<String> for PopulationFilter {
    fn from(raw: String) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case(Self::ALL) {
            Self::All
        } else {
            Self::Only(Population(trimmed.to_string()))
        }
    }
}

impl From<PopulationFilter> for String {
    fn from(filter: PopulationFilter) -> Self {
        match filter {
            PopulationFilter::All => PopulationFilter::ALL.to_string(),
            PopulationFilter::Only(p) => p.0,
        }
    }
}

impl fmt::Display for PopulationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(Self::ALL),
            Self::Only(p) => f.write_str(p.as_str()),
        }
    }
}
