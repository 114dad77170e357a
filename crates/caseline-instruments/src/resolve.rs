use caseline_core::models::outcome::{AssessmentResult, DomainOutcome, Outcome};
use caseline_core::models::population::{Population, PopulationFilter};
use caseline_core::models::response::ResponseSet;

use crate::model::{Instrument, Scope, ScoringRule};
use crate::scoring::score_sheet;

/// Pick the rule that applies to `score` for `scope` and `population`.
///
/// Only rules with the same scope whose inclusive range contains the score
/// are considered. A rule filtered to exactly `population` beats an `All`
/// rule; within either tier the earliest rule in table order wins. `None`
/// means no rule covers the score.
pub fn resolve<'a>(
    rules: &'a [ScoringRule],
    scope: &Scope,
    population: Option<&Population>,
    score: i64,
) -> Option<&'a ScoringRule> {
    let mut fallback = None;
    for rule in rules.iter().filter(|r| &r.scope == scope && r.contains(score)) {
        match &rule.population_filter {
            PopulationFilter::Only(p) if Some(p) == population => return Some(rule),
            PopulationFilter::All if fallback.is_none() => fallback = Some(rule),
            _ => {}
        }
    }
    fallback
}

/// Score every domain and the total, and resolve each against its rules.
pub fn resolve_all(instrument: &Instrument, responses: &ResponseSet) -> AssessmentResult {
    let population = responses
        .population
        .as_ref()
        .filter(|p| instrument.supports_population(p));
    if population.is_none()
        && let Some(given) = &responses.population
    {
        tracing::warn!(
            instrument_id = %instrument.id(),
            population = %given,
            "population not targeted by instrument, only 'All' rules apply"
        );
    }

    let sheet = score_sheet(instrument, &responses.answers);
    let rules = instrument.scoring_tables();

    let domains = instrument
        .domains()
        .iter()
        .zip(&sheet.domains)
        .map(|(domain, scored)| {
            let scope = Scope::Domain(domain.id.clone());
            DomainOutcome {
                domain_id: domain.id.clone(),
                domain_name: domain.name.clone(),
                outcome: outcome(resolve(rules, &scope, population, scored.score), scored.score),
            }
        })
        .collect();

    let total = outcome(resolve(rules, &Scope::Total, population, sheet.total), sheet.total);
    tracing::debug!(
        instrument_id = %instrument.id(),
        total = sheet.total,
        level = ?total.result_level(),
        "assessment resolved"
    );

    AssessmentResult {
        domains,
        total,
        population_matched: population.is_some(),
    }
}

fn outcome(rule: Option<&ScoringRule>, score: i64) -> Outcome {
    match rule {
        Some(rule) => Outcome::Scored {
            score,
            result_level: rule.result_level,
            recommendation: rule.recommendation.clone(),
            rule_id: rule.id.clone(),
        },
        None => Outcome::Unscored { score },
    }
}
