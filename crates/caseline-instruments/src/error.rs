use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

use caseline_core::error::CoreError;
use caseline_core::ids::{DomainId, ItemId, RuleId};
use caseline_core::models::population::Population;

/// A structurally invalid authoring edit or instrument document.
///
/// Mutators that return this have left the instrument untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Blank { field: String },

    #[error("option value '{value}' is already used by item {item_id}")]
    DuplicateOptionValue { item_id: ItemId, value: String },

    #[error("rule {rule_id}: min_score {min_score} is greater than max_score {max_score}")]
    InvertedRange {
        rule_id: RuleId,
        #[ts(type = "number")]
        min_score: i64,
        #[ts(type = "number")]
        max_score: i64,
    },

    #[error("no domain with id {domain_id}")]
    UnknownDomain { domain_id: DomainId },

    #[error("no item with id {item_id}")]
    UnknownItem { item_id: ItemId },

    #[error("item {item_id} has no option with value '{value}'")]
    UnknownOption { item_id: ItemId, value: String },

    #[error("no scoring rule with id {rule_id}")]
    UnknownRule { rule_id: RuleId },

    #[error("id {id} is used more than once")]
    DuplicateId { id: String },

    #[error("numeric item {item_id} cannot carry options")]
    OptionsNotAllowed { item_id: ItemId },

    #[error("only numeric items take bounds (item {item_id})")]
    BoundsNotAllowed { item_id: ItemId },

    #[error("item {item_id}: min_value {min_value} is greater than max_value {max_value}")]
    InvertedBounds {
        item_id: ItemId,
        #[ts(type = "number")]
        min_value: i64,
        #[ts(type = "number")]
        max_value: i64,
    },

    #[error("rules {first} and {second} overlap for the same scope and population")]
    OverlappingRanges { first: RuleId, second: RuleId },

    #[error("rule {rule_id} targets population '{population}', which the instrument does not declare")]
    UndeclaredPopulation {
        rule_id: RuleId,
        population: Population,
    },
}

impl ValidationError {
    pub(crate) fn blank(field: &str) -> Self {
        Self::Blank {
            field: field.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("instrument document has {} validation error(s): {}", .0.len(), join(.0))]
    InvalidDocument(Vec<ValidationError>),

    #[error("schema_version {found} is newer than this build supports ({supported})")]
    UnsupportedVersion { found: u64, supported: u32 },

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
