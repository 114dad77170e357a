use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use caseline_core::ids::{DomainId, InstrumentId, ItemId, RuleId};
use caseline_core::models::population::{Population, PopulationFilter};
use caseline_core::models::risk_level::RiskLevel;

/// How item points combine into domain and total scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ScoringMethod {
    /// Plain sum of item points.
    #[default]
    Additive,
}

/// The input control an item is answered with.
///
/// Older documents use the form-control names, accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ControlType {
    #[serde(alias = "Radio")]
    SingleSelect,
    #[serde(alias = "Checkbox")]
    MultiSelect,
    #[serde(alias = "NumberInput")]
    Numeric,
}

impl ControlType {
    pub fn has_options(&self) -> bool {
        !matches!(self, Self::Numeric)
    }
}

/// One selectable answer to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AnswerOption {
    pub label: String,
    /// Identifier returned in a response. Unique within the item.
    pub value: String,
    #[ts(type = "number")]
    pub points: i64,
}

/// A single question within a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Item {
    #[serde(rename = "item_id", alias = "id", default = "ItemId::generate")]
    pub id: ItemId,
    pub text: String,
    pub control_type: ControlType,
    /// Always empty for numeric items.
    #[serde(default)]
    pub options: Vec<AnswerOption>,
    /// Clamp bounds for numeric answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub min_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub max_value: Option<i64>,
}

impl Item {
    pub fn option(&self, value: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.value == value)
    }

    /// Apply the numeric bounds, if any.
    pub fn clamp(&self, raw: i64) -> i64 {
        let mut value = raw;
        if let Some(min) = self.min_value {
            value = value.max(min);
        }
        if let Some(max) = self.max_value {
            value = value.min(max);
        }
        value
    }
}

/// A named group of related items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Domain {
    #[serde(rename = "domain_id", alias = "id", default = "DomainId::generate")]
    pub id: DomainId,
    pub name: String,
    /// Mirrors the domain's position in the instrument.
    #[serde(default)]
    pub order_index: u32,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Domain {
    pub fn item(&self, item_id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|i| &i.id == item_id)
    }
}

/// What a scoring rule is evaluated against.
///
/// Serialized as the nullable `domain_id` column: `null` means the
/// instrument total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<DomainId>", into = "Option<DomainId>")]
pub enum Scope {
    #[default]
    Total,
    Domain(DomainId),
}

impl Scope {
    pub fn domain_id(&self) -> Option<&DomainId> {
        match self {
            Self::Total => None,
            Self::Domain(id) => Some(id),
        }
    }
}

impl From<Option<DomainId>> for Scope {
    fn from(domain_id: Option<DomainId>) -> Self {
        domain_id.map_or(Self::Total, Self::Domain)
    }
}

impl From<Scope> for Option<DomainId> {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Total => None,
            Scope::Domain(id) => Some(id),
        }
    }
}

/// One row of the scoring table: an inclusive score range, for a scope and
/// population, mapped to a level and recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScoringRule {
    #[serde(rename = "rule_id", default = "RuleId::generate")]
    pub id: RuleId,
    #[serde(rename = "domain_id", default)]
    #[ts(as = "Option<DomainId>")]
    pub scope: Scope,
    #[serde(default)]
    #[ts(as = "String")]
    pub population_filter: PopulationFilter,
    #[ts(type = "number")]
    pub min_score: i64,
    #[ts(type = "number")]
    pub max_score: i64,
    pub result_level: RiskLevel,
    #[serde(default)]
    pub recommendation: String,
}

impl ScoringRule {
    pub fn new(
        scope: Scope,
        population_filter: PopulationFilter,
        min_score: i64,
        max_score: i64,
        result_level: RiskLevel,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            id: RuleId::generate(),
            scope,
            population_filter,
            min_score,
            max_score,
            result_level,
            recommendation: recommendation.into(),
        }
    }

    /// Inclusive on both ends.
    pub fn contains(&self, score: i64) -> bool {
        self.min_score <= score && score <= self.max_score
    }

    /// Same scope and population filter, and the ranges share a score.
    pub fn overlaps(&self, other: &ScoringRule) -> bool {
        self.scope == other.scope
            && self.population_filter == other.population_filter
            && self.min_score <= other.max_score
            && other.min_score <= self.max_score
    }
}

/// A versioned risk/needs assessment definition.
///
/// Fields are read through accessors; all mutation goes through the
/// validated methods in [`crate::authoring`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Instrument {
    #[serde(rename = "instrument_id", default = "InstrumentId::generate")]
    pub(crate) id: InstrumentId,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) version: String,
    #[serde(default)]
    pub(crate) scoring_method: ScoringMethod,
    #[serde(default)]
    pub(crate) target_populations: BTreeSet<Population>,
    #[serde(default = "active_by_default")]
    pub(crate) is_active: bool,
    #[serde(default)]
    pub(crate) domains: Vec<Domain>,
    #[serde(default)]
    pub(crate) scoring_tables: Vec<ScoringRule>,
}

fn active_by_default() -> bool {
    true
}

impl Instrument {
    pub fn id(&self) -> &InstrumentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn scoring_method(&self) -> ScoringMethod {
        self.scoring_method
    }

    pub fn target_populations(&self) -> &BTreeSet<Population> {
        &self.target_populations
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Domains in display order.
    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    /// Scoring rules in insertion order.
    pub fn scoring_tables(&self) -> &[ScoringRule] {
        &self.scoring_tables
    }

    pub fn domain(&self, domain_id: &DomainId) -> Option<&Domain> {
        self.domains.iter().find(|d| &d.id == domain_id)
    }

    pub fn item(&self, item_id: &ItemId) -> Option<&Item> {
        self.domains.iter().find_map(|d| d.item(item_id))
    }

    pub fn rule(&self, rule_id: &RuleId) -> Option<&ScoringRule> {
        self.scoring_tables.iter().find(|r| &r.id == rule_id)
    }

    /// Rules evaluated against the given scope, in insertion order.
    pub fn rules_for<'a>(&'a self, scope: &'a Scope) -> impl Iterator<Item = &'a ScoringRule> + 'a {
        self.scoring_tables.iter().filter(move |r| &r.scope == scope)
    }

    /// Whether `population` is one this instrument is normed for. An
    /// instrument with no declared populations accepts any.
    pub fn supports_population(&self, population: &Population) -> bool {
        self.target_populations.is_empty() || self.target_populations.contains(population)
    }

    pub(crate) fn domain_mut(&mut self, domain_id: &DomainId) -> Option<&mut Domain> {
        self.domains.iter_mut().find(|d| &d.id == domain_id)
    }

    pub(crate) fn item_mut(&mut self, item_id: &ItemId) -> Option<&mut Item> {
        self.domains
            .iter_mut()
            .find_map(|d| d.items.iter_mut().find(|i| &i.id == item_id))
    }

    /// Keep `order_index` equal to each domain's position.
    pub(crate) fn renumber_domains(&mut self) {
        for (index, domain) in self.domains.iter_mut().enumerate() {
            domain.order_index = index as u32;
        }
    }
}
