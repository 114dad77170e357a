use caseline_core::ids::{DomainId, ItemId, RuleId};
use caseline_core::models::population::{Population, PopulationFilter};
use caseline_core::models::response::{Answer, ResponseSet};
use caseline_core::models::risk_level::RiskLevel;
use caseline_instruments::document::save_instrument;
use caseline_instruments::{
    AuthoringPolicy, ControlType, Instrument, Scope, ScoringRule, ValidationError, resolve_all,
};

fn two_domain_instrument() -> (Instrument, DomainId, DomainId) {
    let mut instrument = Instrument::new("ORAS-CST", "v1.0").unwrap();
    let history = instrument.create_domain("Criminal History").unwrap();
    let employment = instrument.create_domain("Employment").unwrap();
    (instrument, history, employment)
}

#[test]
fn instrument_and_domain_names_are_required() {
    assert_eq!(
        Instrument::new("   ", "v1").unwrap_err(),
        ValidationError::Blank {
            field: "instrument name".into()
        }
    );

    let (mut instrument, history, _) = two_domain_instrument();
    assert!(matches!(
        instrument.create_domain(" \t"),
        Err(ValidationError::Blank { .. })
    ));
    assert_eq!(instrument.domains().len(), 2);

    assert!(instrument.rename_domain(&history, "").is_err());
    assert_eq!(instrument.domain(&history).unwrap().name, "Criminal History");
}

#[test]
fn domains_get_sequential_order_index() {
    let (mut instrument, history, employment) = two_domain_instrument();
    let substance = instrument.create_domain("  Substance Abuse ").unwrap();

    let order: Vec<_> = instrument.domains().iter().map(|d| d.order_index).collect();
    assert_eq!(order, vec![0, 1, 2]);
    assert_eq!(instrument.domain(&substance).unwrap().name, "Substance Abuse");

    instrument.move_domain(&substance, 0).unwrap();
    let ids: Vec<_> = instrument.domains().iter().map(|d| d.id.clone()).collect();
    assert_eq!(ids, vec![substance.clone(), history.clone(), employment.clone()]);
    let order: Vec<_> = instrument.domains().iter().map(|d| d.order_index).collect();
    assert_eq!(order, vec![0, 1, 2]);

    instrument.move_domain(&substance, 99).unwrap();
    assert_eq!(instrument.domains().last().unwrap().id, substance);
}

#[test]
fn duplicate_option_value_is_rejected() {
    let (mut instrument, history, _) = two_domain_instrument();
    let item = instrument
        .add_item(&history, "Prior felony?", ControlType::SingleSelect)
        .unwrap();
    instrument.add_option(&item, "No", "0", 0).unwrap();
    instrument.add_option(&item, "Yes", "1", 3).unwrap();

    let err = instrument.add_option(&item, "Yes again", "1", 5).unwrap_err();
    assert_eq!(
        err,
        ValidationError::DuplicateOptionValue {
            item_id: item.clone(),
            value: "1".into()
        }
    );
    assert_eq!(instrument.item(&item).unwrap().options.len(), 2);
}

#[test]
fn numeric_items_take_bounds_not_options() {
    let (mut instrument, history, _) = two_domain_instrument();
    let arrests = instrument
        .add_item(&history, "Number of prior arrests", ControlType::Numeric)
        .unwrap();

    assert!(matches!(
        instrument.add_option(&arrests, "One", "1", 1),
        Err(ValidationError::OptionsNotAllowed { .. })
    ));
    assert!(matches!(
        instrument.set_numeric_bounds(&arrests, Some(5), Some(1)),
        Err(ValidationError::InvertedBounds { .. })
    ));
    instrument.set_numeric_bounds(&arrests, Some(0), Some(4)).unwrap();
    assert_eq!(instrument.item(&arrests).unwrap().max_value, Some(4));

    let yes_no = instrument
        .add_item(&history, "On probation?", ControlType::SingleSelect)
        .unwrap();
    assert!(matches!(
        instrument.set_numeric_bounds(&yes_no, None, Some(1)),
        Err(ValidationError::BoundsNotAllowed { .. })
    ));
    instrument.add_option(&yes_no, "Yes", "yes", 1).unwrap();
    assert!(matches!(
        instrument.set_control_type(&yes_no, ControlType::Numeric),
        Err(ValidationError::OptionsNotAllowed { .. })
    ));
    assert_eq!(
        instrument.item(&yes_no).unwrap().control_type,
        ControlType::SingleSelect
    );

    instrument
        .set_control_type(&arrests, ControlType::MultiSelect)
        .unwrap();
    let item = instrument.item(&arrests).unwrap();
    assert_eq!(item.min_value, None);
    assert_eq!(item.max_value, None);
}

#[test]
fn items_and_options_are_removed_without_cascade() {
    let (mut instrument, history, _) = two_domain_instrument();
    let first = instrument
        .add_item(&history, "First", ControlType::SingleSelect)
        .unwrap();
    let second = instrument
        .add_item(&history, "Second", ControlType::SingleSelect)
        .unwrap();
    instrument.add_option(&first, "A", "a", 1).unwrap();
    instrument.add_option(&first, "B", "b", 2).unwrap();
    instrument
        .add_scoring_rule(ScoringRule::new(
            Scope::Domain(history.clone()),
            PopulationFilter::All,
            0,
            5,
            RiskLevel::Low,
            "",
        ))
        .unwrap();

    let removed = instrument.remove_option(&first, "a").unwrap();
    assert_eq!(removed.points, 1);
    assert!(matches!(
        instrument.remove_option(&first, "a"),
        Err(ValidationError::UnknownOption { .. })
    ));

    instrument.move_item(&second, 0).unwrap();
    let ids: Vec<_> = instrument.domain(&history).unwrap().items.iter().map(|i| i.id.clone()).collect();
    assert_eq!(ids, vec![second.clone(), first.clone()]);

    let removed = instrument.remove_item(&first).unwrap();
    assert_eq!(removed.text, "First");
    assert!(instrument.item(&first).is_none());
    assert_eq!(instrument.scoring_tables().len(), 1);

    assert_eq!(
        instrument.remove_item(&ItemId::from("missing")).unwrap_err(),
        ValidationError::UnknownItem {
            item_id: ItemId::from("missing")
        }
    );
}

#[test]
fn scoring_rules_are_checked_on_entry() {
    let (mut instrument, history, _) = two_domain_instrument();

    let inverted = ScoringRule::new(Scope::Total, PopulationFilter::All, 10, 5, RiskLevel::High, "");
    assert!(matches!(
        instrument.add_scoring_rule(inverted),
        Err(ValidationError::InvertedRange {
            min_score: 10,
            max_score: 5,
            ..
        })
    ));

    let dangling = ScoringRule::new(
        Scope::Domain(DomainId::from("nope")),
        PopulationFilter::All,
        0,
        5,
        RiskLevel::Low,
        "",
    );
    assert!(matches!(
        instrument.add_scoring_rule(dangling),
        Err(ValidationError::UnknownDomain { .. })
    ));
    assert!(instrument.scoring_tables().is_empty());

    let rule = ScoringRule::new(
        Scope::Domain(history.clone()),
        PopulationFilter::All,
        0,
        5,
        RiskLevel::Low,
        "Minimum supervision",
    );
    let id = instrument.add_scoring_rule(rule.clone()).unwrap();
    assert!(matches!(
        instrument.add_scoring_rule(rule),
        Err(ValidationError::DuplicateId { .. })
    ));

    let mut edited = instrument.rule(&id).unwrap().clone();
    edited.result_level = RiskLevel::Moderate;
    edited.max_score = 8;
    instrument.update_scoring_rule(edited).unwrap();
    assert_eq!(instrument.rule(&id).unwrap().max_score, 8);

    let mut broken = instrument.rule(&id).unwrap().clone();
    broken.min_score = 9;
    assert!(instrument.update_scoring_rule(broken).is_err());
    assert_eq!(instrument.rule(&id).unwrap().min_score, 0);

    assert!(matches!(
        instrument.remove_scoring_rule(&RuleId::from("missing")),
        Err(ValidationError::UnknownRule { .. })
    ));
    instrument.remove_scoring_rule(&id).unwrap();
    assert!(instrument.scoring_tables().is_empty());
}

#[test]
fn removing_a_domain_cascades_to_its_rules() {
    let (mut instrument, history, employment) = two_domain_instrument();
    let item = instrument
        .add_item(&history, "Prior felony?", ControlType::SingleSelect)
        .unwrap();
    instrument.add_option(&item, "Yes", "yes", 3).unwrap();

    let history_rule = instrument
        .add_scoring_rule(ScoringRule::new(
            Scope::Domain(history.clone()),
            PopulationFilter::All,
            0,
            10,
            RiskLevel::High,
            "Refer to cognitive program",
        ))
        .unwrap();
    let employment_rule = instrument
        .add_scoring_rule(ScoringRule::new(
            Scope::Domain(employment.clone()),
            PopulationFilter::All,
            0,
            10,
            RiskLevel::Low,
            "",
        ))
        .unwrap();
    let total_rule = instrument
        .add_scoring_rule(ScoringRule::new(
            Scope::Total,
            PopulationFilter::All,
            0,
            10,
            RiskLevel::Moderate,
            "",
        ))
        .unwrap();

    let preview: Vec<_> = instrument.cascade_preview(&history).iter().map(|r| r.id.clone()).collect();
    assert_eq!(preview, vec![history_rule.clone()]);

    let removed = instrument.remove_domain(&history).unwrap();
    assert_eq!(removed.domain.items.len(), 1);
    assert_eq!(removed.rules.len(), 1);
    assert_eq!(removed.rules[0].id, history_rule);

    let remaining: Vec<_> = instrument.scoring_tables().iter().map(|r| r.id.clone()).collect();
    assert_eq!(remaining, vec![employment_rule, total_rule]);
    assert_eq!(instrument.domains()[0].order_index, 0);
    assert!(instrument.validate(&AuthoringPolicy::default()).is_empty());

    let responses = ResponseSet::new(None).with_answer(item, Answer::choice("yes"));
    let result = resolve_all(&instrument, &responses);
    assert!(result.domain(&history).is_none());
    assert_eq!(result.domains.len(), 1);
    assert_eq!(result.total.score(), 0);

    assert!(matches!(
        instrument.remove_domain(&history),
        Err(ValidationError::UnknownDomain { .. })
    ));
}

#[test]
fn validate_reports_overlaps_only_under_strict_policy() {
    let (mut instrument, _, _) = two_domain_instrument();
    instrument.set_target_populations([Population::new("Male").unwrap()]);
    let first = instrument
        .add_scoring_rule(ScoringRule::new(Scope::Total, PopulationFilter::All, 0, 10, RiskLevel::Low, ""))
        .unwrap();
    let second = instrument
        .add_scoring_rule(ScoringRule::new(Scope::Total, PopulationFilter::All, 10, 20, RiskLevel::High, ""))
        .unwrap();
    instrument
        .add_scoring_rule(ScoringRule::new(
            Scope::Total,
            PopulationFilter::only("Female"),
            0,
            20,
            RiskLevel::Moderate,
            "",
        ))
        .unwrap();

    let overlaps = instrument.overlapping_rules();
    assert_eq!(overlaps.len(), 1);
    assert_eq!(overlaps[0].first, first);
    assert_eq!(overlaps[0].second, second);

    assert!(instrument.validate(&AuthoringPolicy::default()).is_empty());

    let errors = instrument.validate(&AuthoringPolicy::strict());
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| matches!(e, ValidationError::OverlappingRanges { .. })));
    assert!(errors.iter().any(|e| matches!(
        e,
        ValidationError::UndeclaredPopulation { population, .. } if population.as_str() == "Female"
    )));
}

#[test]
fn accepted_edits_always_save() {
    let (mut instrument, history, _) = two_domain_instrument();
    let item = instrument
        .add_item(&history, "Prior felony?", ControlType::SingleSelect)
        .unwrap();
    instrument.add_option(&item, "Yes", "yes", 3).unwrap();

    // a rule id may repeat a domain or item id; only rule ids must be unique
    let mut rule = ScoringRule::new(
        Scope::Domain(history.clone()),
        PopulationFilter::All,
        0,
        5,
        RiskLevel::Low,
        "",
    );
    rule.id = RuleId::from(history.as_str());
    instrument.add_scoring_rule(rule).unwrap();
    let mut rule = ScoringRule::new(Scope::Total, PopulationFilter::All, 0, 5, RiskLevel::Low, "");
    rule.id = RuleId::from(item.as_str());
    instrument.add_scoring_rule(rule).unwrap();

    assert!(instrument.validate(&AuthoringPolicy::default()).is_empty());
    assert!(save_instrument(&instrument, &AuthoringPolicy::default()).is_ok());
}

#[test]
fn blank_population_filter_is_rejected() {
    let (mut instrument, _, _) = two_domain_instrument();
    let mut rule = ScoringRule::new(Scope::Total, PopulationFilter::All, 0, 5, RiskLevel::Low, "");
    rule.population_filter = serde_json::from_str("\"\"").unwrap();

    assert_eq!(
        instrument.add_scoring_rule(rule),
        Err(ValidationError::Blank {
            field: "population filter".to_string()
        })
    );
    assert!(instrument.scoring_tables().is_empty());
}
