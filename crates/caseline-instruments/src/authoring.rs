//! Validated mutators for [`Instrument`].
//!
//! Every method either applies its whole change or returns a
//! [`ValidationError`] and leaves the instrument as it was.

use std::collections::BTreeSet;

use serde::Serialize;
use ts_rs::TS;

use caseline_core::ids::{DomainId, InstrumentId, ItemId, RuleId};
use caseline_core::models::population::Population;

use crate::config::AuthoringPolicy;
use crate::error::ValidationError;
use crate::model::{
    AnswerOption, ControlType, Domain, Instrument, Item, Scope, ScoringMethod, ScoringRule,
};

/// What [`Instrument::remove_domain`] took out of the instrument.
#[derive(Debug, Clone)]
pub struct RemovedDomain {
    pub domain: Domain,
    /// Rules scoped to the domain, dropped with it.
    pub rules: Vec<ScoringRule>,
}

/// A pair of rules whose ranges share at least one score for the same
/// scope and population filter. The earlier rule wins at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct RuleOverlap {
    pub first: RuleId,
    pub second: RuleId,
}

fn required(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::blank(field));
    }
    Ok(trimmed.to_string())
}

impl Instrument {
    /// Create an empty instrument with no domains or rules.
    pub fn new(name: &str, version: &str) -> Result<Self, ValidationError> {
        let name = required("instrument name", name)?;
        let instrument = Self {
            id: InstrumentId::generate(),
            name,
            version: version.trim().to_string(),
            scoring_method: ScoringMethod::Additive,
            target_populations: BTreeSet::new(),
            is_active: true,
            domains: Vec::new(),
            scoring_tables: Vec::new(),
        };
        tracing::info!(instrument_id = %instrument.id, name = %instrument.name, "instrument created");
        Ok(instrument)
    }

    pub fn rename(&mut self, name: &str) -> Result<(), ValidationError> {
        self.name = required("instrument name", name)?;
        Ok(())
    }

    pub fn set_version(&mut self, version: &str) {
        self.version = version.trim().to_string();
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    pub fn set_target_populations<I>(&mut self, populations: I)
    where
        I: IntoIterator<Item = Population>,
    {
        self.target_populations = populations.into_iter().collect();
    }

    // ── domains ─────────────────────────────────────────────────────────

    /// Append a domain at the end of the display order.
    pub fn create_domain(&mut self, name: &str) -> Result<DomainId, ValidationError> {
        let name = required("domain name", name)?;
        let domain = Domain {
            id: DomainId::generate(),
            name,
            order_index: self.domains.len() as u32,
            items: Vec::new(),
        };
        let id = domain.id.clone();
        tracing::info!(instrument_id = %self.id, domain_id = %id, "domain created");
        self.domains.push(domain);
        Ok(id)
    }

    pub fn rename_domain(&mut self, domain_id: &DomainId, name: &str) -> Result<(), ValidationError> {
        let name = required("domain name", name)?;
        let domain = self.domain_mut(domain_id).ok_or_else(|| unknown_domain(domain_id))?;
        domain.name = name;
        Ok(())
    }

    /// Move a domain to `position` in the display order. Positions past the
    /// end move it last.
    pub fn move_domain(&mut self, domain_id: &DomainId, position: usize) -> Result<(), ValidationError> {
        let from = self
            .domains
            .iter()
            .position(|d| &d.id == domain_id)
            .ok_or_else(|| unknown_domain(domain_id))?;
        let domain = self.domains.remove(from);
        let to = position.min(self.domains.len());
        self.domains.insert(to, domain);
        self.renumber_domains();
        Ok(())
    }

    /// Rules that [`Self::remove_domain`] would delete along with the domain.
    /// The editor shows these before asking for confirmation.
    pub fn cascade_preview(&self, domain_id: &DomainId) -> Vec<&ScoringRule> {
        let scope = Scope::Domain(domain_id.clone());
        self.scoring_tables.iter().filter(|r| r.scope == scope).collect()
    }

    /// Remove a domain, its items, and every rule scoped to it.
    pub fn remove_domain(&mut self, domain_id: &DomainId) -> Result<RemovedDomain, ValidationError> {
        let index = self
            .domains
            .iter()
            .position(|d| &d.id == domain_id)
            .ok_or_else(|| unknown_domain(domain_id))?;
        let domain = self.domains.remove(index);
        self.renumber_domains();

        let scope = Scope::Domain(domain_id.clone());
        let (rules, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.scoring_tables)
            .into_iter()
            .partition(|r| r.scope == scope);
        self.scoring_tables = kept;

        tracing::info!(
            instrument_id = %self.id,
            domain_id = %domain_id,
            items = domain.items.len(),
            rules = rules.len(),
            "domain removed"
        );
        Ok(RemovedDomain { domain, rules })
    }

    // ── items ───────────────────────────────────────────────────────────

    pub fn add_item(
        &mut self,
        domain_id: &DomainId,
        text: &str,
        control_type: ControlType,
    ) -> Result<ItemId, ValidationError> {
        let text = required("item text", text)?;
        let domain = self.domain_mut(domain_id).ok_or_else(|| unknown_domain(domain_id))?;
        let item = Item {
            id: ItemId::generate(),
            text,
            control_type,
            options: Vec::new(),
            min_value: None,
            max_value: None,
        };
        let id = item.id.clone();
        domain.items.push(item);
        tracing::debug!(domain_id = %domain_id, item_id = %id, ?control_type, "item added");
        Ok(id)
    }

    pub fn set_item_text(&mut self, item_id: &ItemId, text: &str) -> Result<(), ValidationError> {
        let text = required("item text", text)?;
        let item = self.item_mut(item_id).ok_or_else(|| unknown_item(item_id))?;
        item.text = text;
        Ok(())
    }

    /// Change an item's control. Switching to `Numeric` requires the item to
    /// have no options; switching away from it drops the numeric bounds.
    pub fn set_control_type(
        &mut self,
        item_id: &ItemId,
        control_type: ControlType,
    ) -> Result<(), ValidationError> {
        let item = self.item_mut(item_id).ok_or_else(|| unknown_item(item_id))?;
        if !control_type.has_options() && !item.options.is_empty() {
            return Err(ValidationError::OptionsNotAllowed {
                item_id: item_id.clone(),
            });
        }
        if control_type.has_options() {
            item.min_value = None;
            item.max_value = None;
        }
        item.control_type = control_type;
        Ok(())
    }

    pub fn set_numeric_bounds(
        &mut self,
        item_id: &ItemId,
        min_value: Option<i64>,
        max_value: Option<i64>,
    ) -> Result<(), ValidationError> {
        let item = self.item_mut(item_id).ok_or_else(|| unknown_item(item_id))?;
        if item.control_type.has_options() {
            return Err(ValidationError::BoundsNotAllowed {
                item_id: item_id.clone(),
            });
        }
        if let (Some(min_value), Some(max_value)) = (min_value, max_value)
            && min_value > max_value
        {
            return Err(ValidationError::InvertedBounds {
                item_id: item_id.clone(),
                min_value,
                max_value,
            });
        }
        item.min_value = min_value;
        item.max_value = max_value;
        Ok(())
    }

    /// Move an item to `position` within its domain.
    pub fn move_item(&mut self, item_id: &ItemId, position: usize) -> Result<(), ValidationError> {
        let items = self
            .domains
            .iter_mut()
            .map(|d| &mut d.items)
            .find(|items| items.iter().any(|i| &i.id == item_id))
            .ok_or_else(|| unknown_item(item_id))?;
        let Some(from) = items.iter().position(|i| &i.id == item_id) else {
            return Err(unknown_item(item_id));
        };
        let item = items.remove(from);
        let to = position.min(items.len());
        items.insert(to, item);
        Ok(())
    }

    pub fn remove_item(&mut self, item_id: &ItemId) -> Result<Item, ValidationError> {
        for domain in &mut self.domains {
            if let Some(index) = domain.items.iter().position(|i| &i.id == item_id) {
                tracing::debug!(domain_id = %domain.id, item_id = %item_id, "item removed");
                return Ok(domain.items.remove(index));
            }
        }
        Err(unknown_item(item_id))
    }

    // ── options ─────────────────────────────────────────────────────────

    pub fn add_option(
        &mut self,
        item_id: &ItemId,
        label: &str,
        value: &str,
        points: i64,
    ) -> Result<(), ValidationError> {
        let value = required("option value", value)?;
        let item = self.item_mut(item_id).ok_or_else(|| unknown_item(item_id))?;
        if !item.control_type.has_options() {
            return Err(ValidationError::OptionsNotAllowed {
                item_id: item_id.clone(),
            });
        }
        if item.option(&value).is_some() {
            return Err(ValidationError::DuplicateOptionValue {
                item_id: item_id.clone(),
                value,
            });
        }
        item.options.push(AnswerOption {
            label: label.trim().to_string(),
            value,
            points,
        });
        Ok(())
    }

    pub fn set_option_points(
        &mut self,
        item_id: &ItemId,
        value: &str,
        points: i64,
    ) -> Result<(), ValidationError> {
        let item = self.item_mut(item_id).ok_or_else(|| unknown_item(item_id))?;
        let option = item
            .options
            .iter_mut()
            .find(|o| o.value == value)
            .ok_or_else(|| ValidationError::UnknownOption {
                item_id: item_id.clone(),
                value: value.to_string(),
            })?;
        option.points = points;
        Ok(())
    }

    pub fn remove_option(&mut self, item_id: &ItemId, value: &str) -> Result<AnswerOption, ValidationError> {
        let item = self.item_mut(item_id).ok_or_else(|| unknown_item(item_id))?;
        let index = item
            .options
            .iter()
            .position(|o| o.value == value)
            .ok_or_else(|| ValidationError::UnknownOption {
                item_id: item_id.clone(),
                value: value.to_string(),
            })?;
        Ok(item.options.remove(index))
    }

    // ── scoring rules ───────────────────────────────────────────────────

    /// Append a rule. Overlapping ranges are accepted here; the resolver's
    /// first-in-order tie-break covers them.
    pub fn add_scoring_rule(&mut self, rule: ScoringRule) -> Result<RuleId, ValidationError> {
        if self.rule(&rule.id).is_some() {
            return Err(ValidationError::DuplicateId {
                id: rule.id.to_string(),
            });
        }
        self.check_rule(&rule)?;
        let id = rule.id.clone();
        if let Some(existing) = self.scoring_tables.iter().find(|r| r.overlaps(&rule)) {
            tracing::warn!(
                instrument_id = %self.id,
                rule_id = %id,
                overlaps = %existing.id,
                "scoring rule overlaps an earlier rule"
            );
        }
        self.scoring_tables.push(rule);
        Ok(id)
    }

    /// Replace the rule with the same id, keeping its position.
    pub fn update_scoring_rule(&mut self, rule: ScoringRule) -> Result<(), ValidationError> {
        self.check_rule(&rule)?;
        let slot = self
            .scoring_tables
            .iter_mut()
            .find(|r| r.id == rule.id)
            .ok_or_else(|| ValidationError::UnknownRule {
                rule_id: rule.id.clone(),
            })?;
        *slot = rule;
        Ok(())
    }

    pub fn remove_scoring_rule(&mut self, rule_id: &RuleId) -> Result<ScoringRule, ValidationError> {
        let index = self
            .scoring_tables
            .iter()
            .position(|r| &r.id == rule_id)
            .ok_or_else(|| ValidationError::UnknownRule {
                rule_id: rule_id.clone(),
            })?;
        Ok(self.scoring_tables.remove(index))
    }

    fn check_rule(&self, rule: &ScoringRule) -> Result<(), ValidationError> {
        if rule.min_score > rule.max_score {
            return Err(ValidationError::InvertedRange {
                rule_id: rule.id.clone(),
                min_score: rule.min_score,
                max_score: rule.max_score,
            });
        }
        if let Scope::Domain(domain_id) = &rule.scope
            && self.domain(domain_id).is_none()
        {
            return Err(unknown_domain(domain_id));
        }
        if rule.population_filter.is_blank() {
            return Err(ValidationError::blank("population filter"));
        }
        Ok(())
    }

    // ── whole-document checks ───────────────────────────────────────────

    /// Every pair of rules that overlap, in table order.
    pub fn overlapping_rules(&self) -> Vec<RuleOverlap> {
        let mut overlaps = Vec::new();
        for (i, first) in self.scoring_tables.iter().enumerate() {
            for second in &self.scoring_tables[i + 1..] {
                if first.overlaps(second) {
                    overlaps.push(RuleOverlap {
                        first: first.id.clone(),
                        second: second.id.clone(),
                    });
                }
            }
        }
        overlaps
    }

    /// Check a complete instrument, typically one that arrived from storage
    /// rather than through the mutators. Returns every problem found.
    pub fn validate(&self, policy: &AuthoringPolicy) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(ValidationError::blank("instrument name"));
        }
        if self.target_populations.iter().any(Population::is_blank) {
            errors.push(ValidationError::blank("target population"));
        }

        // ids are unique per kind; storage may number each table from 1
        let mut domain_ids = BTreeSet::new();
        let mut item_ids = BTreeSet::new();
        let mut rule_ids = BTreeSet::new();

        for domain in &self.domains {
            note_id(&mut domain_ids, domain.id.as_str(), &mut errors);
            if domain.name.trim().is_empty() {
                errors.push(ValidationError::blank("domain name"));
            }
            for item in &domain.items {
                note_id(&mut item_ids, item.id.as_str(), &mut errors);
                validate_item(item, &mut errors);
            }
        }

        for rule in &self.scoring_tables {
            note_id(&mut rule_ids, rule.id.as_str(), &mut errors);
            if let Err(e) = self.check_rule(rule) {
                errors.push(e);
            }
            if policy.require_known_populations
                && let Some(population) = rule.population_filter.population()
                && !population.is_blank()
                && !self.target_populations.contains(population)
            {
                errors.push(ValidationError::UndeclaredPopulation {
                    rule_id: rule.id.clone(),
                    population: population.clone(),
                });
            }
        }

        if policy.reject_overlapping_ranges {
            errors.extend(
                self.overlapping_rules()
                    .into_iter()
                    .map(|o| ValidationError::OverlappingRanges {
                        first: o.first,
                        second: o.second,
                    }),
            );
        }

        errors
    }
}

fn note_id<'a>(seen: &mut BTreeSet<&'a str>, id: &'a str, errors: &mut Vec<ValidationError>) {
    if !seen.insert(id) {
        errors.push(ValidationError::DuplicateId { id: id.to_string() });
    }
}

fn validate_item(item: &Item, errors: &mut Vec<ValidationError>) {
    if item.text.trim().is_empty() {
        errors.push(ValidationError::blank("item text"));
    }
    if item.control_type.has_options() {
        if item.min_value.is_some() || item.max_value.is_some() {
            errors.push(ValidationError::BoundsNotAllowed {
                item_id: item.id.clone(),
            });
        }
    } else if !item.options.is_empty() {
        errors.push(ValidationError::OptionsNotAllowed {
            item_id: item.id.clone(),
        });
    }
    if let (Some(min_value), Some(max_value)) = (item.min_value, item.max_value)
        && min_value > max_value
    {
        errors.push(ValidationError::InvertedBounds {
            item_id: item.id.clone(),
            min_value,
            max_value,
        });
    }

    let mut values = BTreeSet::new();
    for option in &item.options {
        if option.value.trim().is_empty() {
            errors.push(ValidationError::blank("option value"));
        } else if !values.insert(option.value.as_str()) {
            errors.push(ValidationError::DuplicateOptionValue {
                item_id: item.id.clone(),
                value: option.value.clone(),
            });
        }
    }
}

fn unknown_domain(domain_id: &DomainId) -> ValidationError {
    ValidationError::UnknownDomain {
        domain_id: domain_id.clone(),
    }
}

fn unknown_item(item_id: &ItemId) -> ValidationError {
    ValidationError::UnknownItem {
        item_id: item_id.clone(),
    }
}
