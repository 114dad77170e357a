//! Point totals for a response set.
//!
//! Everything here is pure: no allocation is shared between calls and the
//! inputs are never mutated, so response sets can be scored in parallel.

use std::collections::BTreeSet;

use serde::Serialize;
use ts_rs::TS;

use caseline_core::ids::{DomainId, ItemId};
use caseline_core::models::response::{Answer, Answers};

use crate::model::{ControlType, Domain, Instrument, Item};

/// Points contributed by one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ItemScore {
    pub item_id: ItemId,
    #[ts(type = "number")]
    pub points: i64,
    pub answered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct DomainScore {
    pub domain_id: DomainId,
    #[ts(type = "number")]
    pub score: i64,
    pub items: Vec<ItemScore>,
}

/// Item, domain and total points for one response set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ScoreSheet {
    /// In the instrument's domain order.
    pub domains: Vec<DomainScore>,
    #[ts(type = "number")]
    pub total: i64,
}

/// Points for a single item. Missing, stale or malformed answers score 0.
pub fn score_item(item: &Item, answer: Option<&Answer>) -> i64 {
    let Some(answer) = answer else {
        return 0;
    };
    match item.control_type {
        ControlType::SingleSelect => {
            let values = answer.selected_values();
            if values.len() > 1 {
                tracing::warn!(
                    item_id = %item.id,
                    count = values.len(),
                    "several values for a single-select item"
                );
            }
            match values.iter().find_map(|v| item.option(v)) {
                Some(option) => option.points,
                None => {
                    tracing::debug!(item_id = %item.id, ?answer, "answer matches no option");
                    0
                }
            }
        }
        ControlType::MultiSelect => {
            let selected: BTreeSet<String> = answer.selected_values().into_iter().collect();
            item.options
                .iter()
                .filter(|o| selected.contains(&o.value))
                .fold(0i64, |sum, o| sum.saturating_add(o.points))
        }
        ControlType::Numeric => match answer.as_integer() {
            Some(raw) => item.clamp(raw),
            None => {
                tracing::warn!(
                    item_id = %item.id,
                    ?answer,
                    "non-integer answer for numeric item"
                );
                0
            }
        },
    }
}

pub fn score_domain(domain: &Domain, answers: &Answers) -> i64 {
    domain
        .items
        .iter()
        .map(|item| score_item(item, answers.get(&item.id)))
        .fold(0, i64::saturating_add)
}

pub fn score_total(instrument: &Instrument, answers: &Answers) -> i64 {
    instrument
        .domains()
        .iter()
        .map(|domain| score_domain(domain, answers))
        .fold(0, i64::saturating_add)
}

/// Full breakdown. `total` equals [`score_total`] for the same inputs.
pub fn score_sheet(instrument: &Instrument, answers: &Answers) -> ScoreSheet {
    let domains: Vec<DomainScore> = instrument
        .domains()
        .iter()
        .map(|domain| {
            let items: Vec<ItemScore> = domain
                .items
                .iter()
                .map(|item| {
                    let answer = answers.get(&item.id);
                    ItemScore {
                        item_id: item.id.clone(),
                        points: score_item(item, answer),
                        answered: answer.is_some(),
                    }
                })
                .collect();
            DomainScore {
                domain_id: domain.id.clone(),
                score: items.iter().map(|i| i.points).fold(0, i64::saturating_add),
                items,
            }
        })
        .collect();

    let total = domains.iter().map(|d| d.score).fold(0, i64::saturating_add);
    ScoreSheet { domains, total }
}
