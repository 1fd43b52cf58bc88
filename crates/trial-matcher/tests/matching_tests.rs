//! Integration tests for trial loading and matching.
//!
//! Trials are curated as text, loaded against a mock rule registry and
//! matched against mock patients.

use std::collections::BTreeSet;

use trial_criteria::{CompileError, InMemoryTreatmentDatabase};
use trial_criteria_evaluator::{Evaluation, EvaluationResult, ParameterType, ParameterValue, RuleRegistry};
use trial_matcher::{
    CohortDefinition, CohortMetadata, CriterionDefinition, MatcherConfig, Trial, TrialDefinition,
    TrialIdentification, TrialLoader, TrialMatch, TrialMatcher,
};

/// Mock patient record for matching tests.
#[derive(Default)]
struct TestPatient {
    age: i64,
    has_measurable_disease: Option<bool>,
    previous_trials: BTreeSet<String>,
    on_anticoagulants: bool,
}

impl TestPatient {
    fn aged(age: i64) -> Self {
        TestPatient {
            age,
            has_measurable_disease: Some(true),
            ..Default::default()
        }
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn registry() -> RuleRegistry<TestPatient> {
    RuleRegistry::builder()
        .rule(
            "IS_AT_LEAST_X_YEARS_OLD",
            &[ParameterType::Integer],
            |parameters: &[ParameterValue], patient: &TestPatient| match parameters[0].as_integer() {
                Some(min_age) if patient.age >= min_age => Evaluation::pass("Patient is old enough"),
                Some(_) => Evaluation::fail("Patient is too young"),
                None => Evaluation::undetermined("Minimum age could not be read"),
            },
        )
        .rule(
            "HAS_MEASURABLE_DISEASE",
            &[],
            |_: &[ParameterValue], patient: &TestPatient| match patient.has_measurable_disease {
                Some(true) => Evaluation::pass("Patient has measurable disease"),
                Some(false) => Evaluation::fail("Patient has no measurable disease"),
                None => Evaluation::undetermined("Measurable disease unknown"),
            },
        )
        .rule(
            "IS_NOT_ON_ANTICOAGULANTS",
            &[],
            |_: &[ParameterValue], patient: &TestPatient| {
                if patient.on_anticoagulants {
                    Evaluation::recoverable_fail("Patient may use anticoagulants")
                } else {
                    Evaluation::pass("Patient does not use anticoagulants")
                }
            },
        )
        .rule(
            "HAS_PREVIOUSLY_PARTICIPATED_IN_TRIAL",
            &[ParameterType::String],
            |parameters: &[ParameterValue], patient: &TestPatient| match parameters[0].as_str() {
                Some(acronym) if patient.previous_trials.contains(acronym) => {
                    Evaluation::pass(format!("Patient has participated in {}", acronym))
                }
                Some(acronym) => Evaluation::fail(format!("Patient has not participated in {}", acronym)),
                None => Evaluation::undetermined("Trial acronym missing"),
            },
        )
        .build()
        .unwrap()
}

fn criterion(reference: &str, text: &str) -> CriterionDefinition {
    CriterionDefinition::new([reference], text)
}

fn cohort(metadata: CohortMetadata, criteria: Vec<CriterionDefinition>) -> CohortDefinition {
    CohortDefinition { metadata, criteria }
}

fn definition(
    trial_id: &str,
    acronym: &str,
    general: Vec<CriterionDefinition>,
    cohorts: Vec<CohortDefinition>,
) -> TrialDefinition {
    TrialDefinition {
        identification: TrialIdentification::new(trial_id, acronym, format!("{} study", acronym)),
        general_criteria: general,
        cohorts,
    }
}

fn load(registry: &RuleRegistry<TestPatient>, definitions: Vec<TrialDefinition>) -> Vec<Trial> {
    let treatments = InMemoryTreatmentDatabase::new();
    let outcome = TrialLoader::new(registry, &treatments).load(definitions);
    assert!(outcome.is_complete(), "unexpected load failures: {:?}", outcome);
    outcome.trials
}

/// Three trials covering no cohorts, several cohorts and a non-evaluable cohort.
fn trial_database() -> Vec<TrialDefinition> {
    vec![
        definition(
            "NCT03",
            "GAMMA",
            vec![criterion("I-01", "IS_AT_LEAST_X_YEARS_OLD[18]")],
            vec![
                cohort(
                    CohortMetadata::new("B", "Measurable disease"),
                    vec![criterion("B-01", "HAS_MEASURABLE_DISEASE")],
                ),
                cohort(
                    CohortMetadata::new("A", "Elderly").with_open(false),
                    vec![criterion("A-01", "IS_AT_LEAST_X_YEARS_OLD[70]")],
                ),
                cohort(
                    CohortMetadata::new("C", "Expansion").with_evaluable(false),
                    vec![],
                ),
            ],
        ),
        definition(
            "NCT01",
            "ALPHA",
            vec![
                criterion("I-01", "IS_AT_LEAST_X_YEARS_OLD[18]"),
                criterion("I-02", "IS_NOT_ON_ANTICOAGULANTS"),
            ],
            vec![],
        ),
        definition(
            "NCT02",
            "BETA",
            vec![criterion("I-01", "AND(IS_AT_LEAST_X_YEARS_OLD[18], HAS_MEASURABLE_DISEASE)")],
            vec![
                cohort(
                    CohortMetadata::new("A", "Elderly"),
                    vec![criterion("A-01", "IS_AT_LEAST_X_YEARS_OLD[65]")],
                ),
                cohort(
                    CohortMetadata::new("B", "Very elderly"),
                    vec![criterion("B-01", "IS_AT_LEAST_X_YEARS_OLD[80]")],
                ),
            ],
        ),
    ]
}

fn find<'a>(matches: &'a [TrialMatch], trial_id: &str) -> &'a TrialMatch {
    matches
        .iter()
        .find(|m| m.identification.trial_id == trial_id)
        .unwrap_or_else(|| panic!("no match for {}", trial_id))
}

// ==================== Eligibility rules ====================

#[test]
fn test_trial_without_cohorts() {
    init_logging();
    let registry = registry();
    let trials = load(&registry, trial_database());
    let matcher = TrialMatcher::new(&registry);

    let adult = matcher.match_trials(&TestPatient::aged(40), &trials);
    let alpha = find(&adult, "NCT01");
    assert!(alpha.cohorts.is_empty());
    assert!(alpha.is_potentially_eligible);

    let minor = matcher.match_trials(&TestPatient::aged(16), &trials);
    assert!(!find(&minor, "NCT01").is_potentially_eligible);
}

#[test]
fn test_cohorts_inherit_trial_level_failure() {
    let registry = registry();
    let trials = load(&registry, trial_database());
    let matcher = TrialMatcher::new(&registry);

    // Old enough for every cohort, but no measurable disease for BETA's general criterion.
    let patient = TestPatient {
        has_measurable_disease: Some(false),
        ..TestPatient::aged(85)
    };
    let matches = matcher.match_trials(&patient, &trials);
    let beta = find(&matches, "NCT02");

    assert!(!beta.is_potentially_eligible);
    assert_eq!(beta.cohorts.len(), 2);
    for cohort in &beta.cohorts {
        assert!(cohort.evaluations.values().all(|e| e.result == EvaluationResult::Pass));
        assert!(!cohort.is_potentially_eligible);
    }
}

#[test]
fn test_trial_requires_an_eligible_cohort() {
    let registry = registry();
    let trials = load(&registry, trial_database());
    let matcher = TrialMatcher::new(&registry);

    let young = matcher.match_trials(&TestPatient::aged(50), &trials);
    let beta = find(&young, "NCT02");
    assert!(beta.cohorts.iter().all(|cohort| !cohort.is_potentially_eligible));
    assert!(!beta.is_potentially_eligible);

    let elderly = matcher.match_trials(&TestPatient::aged(70), &trials);
    let beta = find(&elderly, "NCT02");
    let eligible: Vec<_> = beta
        .eligible_cohorts()
        .map(|cohort| cohort.metadata.cohort_id.as_str())
        .collect();
    assert_eq!(eligible, vec!["A"]);
    assert!(beta.is_potentially_eligible);
}

#[test]
fn test_non_evaluable_cohort_follows_trial_level() {
    let registry = registry();
    let trials = load(&registry, trial_database());
    let matcher = TrialMatcher::new(&registry);

    let patient = TestPatient {
        has_measurable_disease: Some(false),
        ..TestPatient::aged(40)
    };
    let matches = matcher.match_trials(&patient, &trials);
    let gamma = find(&matches, "NCT03");

    let expansion = gamma
        .cohorts
        .iter()
        .find(|cohort| cohort.metadata.cohort_id == "C")
        .unwrap();
    assert!(expansion.evaluations.is_empty());
    assert!(expansion.is_potentially_eligible);
    assert!(gamma.is_potentially_eligible);

    let minor = matcher.match_trials(&TestPatient::aged(12), &trials);
    let expansion = find(&minor, "NCT03")
        .cohorts
        .iter()
        .find(|cohort| cohort.metadata.cohort_id == "C")
        .unwrap();
    assert!(!expansion.is_potentially_eligible);
}

#[test]
fn test_recoverable_failure_is_advisory() {
    let registry = registry();
    let trials = load(&registry, trial_database());
    let matcher = TrialMatcher::new(&registry);

    let patient = TestPatient {
        on_anticoagulants: true,
        ..TestPatient::aged(40)
    };
    let matches = matcher.match_trials(&patient, &trials);
    let alpha = find(&matches, "NCT01");

    assert!(alpha
        .evaluations
        .values()
        .any(|e| e.result == EvaluationResult::Fail && e.recoverable));
    assert!(alpha.is_potentially_eligible);
}

#[test]
fn test_undetermined_does_not_disqualify() {
    let registry = registry();
    let trials = load(&registry, trial_database());
    let matcher = TrialMatcher::new(&registry);

    let patient = TestPatient {
        has_measurable_disease: None,
        ..TestPatient::aged(70)
    };
    let matches = matcher.match_trials(&patient, &trials);
    let beta = find(&matches, "NCT02");

    assert!(beta
        .evaluations
        .values()
        .any(|e| e.result == EvaluationResult::Undetermined));
    assert!(beta.is_potentially_eligible);
}

// ==================== Previous participation ====================

#[test]
fn test_previous_participation_warns() {
    let registry = registry();
    let trials = load(&registry, trial_database());
    let matcher = TrialMatcher::new(&registry);

    let patient = TestPatient {
        previous_trials: ["ALPHA".to_string()].into_iter().collect(),
        ..TestPatient::aged(40)
    };
    let matches = matcher.match_trials(&patient, &trials);
    let alpha = find(&matches, "NCT01");

    let warning = alpha
        .evaluations
        .iter()
        .find(|(eligibility, _)| eligibility.references.is_empty())
        .map(|(_, evaluation)| evaluation)
        .unwrap();
    assert_eq!(warning.result, EvaluationResult::Warn);
    assert!(warning.warn_messages.contains("Patient has participated in ALPHA"));
    assert!(alpha.is_potentially_eligible);

    let beta = find(&matches, "NCT02");
    assert!(beta
        .evaluations
        .values()
        .all(|evaluation| evaluation.result != EvaluationResult::Warn));
}

#[test]
fn test_participation_check_can_be_disabled() {
    let registry = registry();
    let trials = load(&registry, trial_database());
    let config = MatcherConfig::builder().with_participation_check(false).build();
    let matcher = TrialMatcher::with_config(&registry, config);

    let matches = matcher.match_trials(&TestPatient::aged(40), &trials);
    assert_eq!(find(&matches, "NCT01").evaluations.len(), 2);

    let default_matches = TrialMatcher::new(&registry).match_trials(&TestPatient::aged(40), &trials);
    assert_eq!(find(&default_matches, "NCT01").evaluations.len(), 3);
}

// ==================== Ordering and determinism ====================

#[test]
fn test_result_ordering() {
    let registry = registry();
    let trials = load(&registry, trial_database());
    let matches = TrialMatcher::new(&registry).match_trials(&TestPatient::aged(40), &trials);

    let trial_ids: Vec<_> = matches
        .iter()
        .map(|m| m.identification.trial_id.as_str())
        .collect();
    assert_eq!(trial_ids, vec!["NCT01", "NCT02", "NCT03"]);

    let cohort_ids: Vec<_> = find(&matches, "NCT03")
        .cohorts
        .iter()
        .map(|cohort| cohort.metadata.cohort_id.as_str())
        .collect();
    assert_eq!(cohort_ids, vec!["B", "C", "A"]);

    let references: Vec<_> = find(&matches, "NCT01")
        .evaluations
        .keys()
        .map(|eligibility| eligibility.references.iter().cloned().collect::<Vec<_>>())
        .collect();
    assert_eq!(references, vec![vec![], vec!["I-01".to_string()], vec!["I-02".to_string()]]);
}

#[test]
fn test_matching_is_deterministic() {
    let registry = registry();
    let trials = load(&registry, trial_database());
    let matcher = TrialMatcher::new(&registry);
    let patient = TestPatient::aged(72);

    let first = matcher.match_trials(&patient, &trials);
    let second = matcher.match_trials(&patient, &trials);
    assert_eq!(first, second);

    let mut reversed = trials.clone();
    reversed.reverse();
    for trial in &mut reversed {
        trial.cohorts.reverse();
        trial.general_eligibility.reverse();
    }
    assert_eq!(first, matcher.match_trials(&patient, &reversed));
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_matches_sequential() {
    let registry = registry();
    let trials = load(&registry, trial_database());
    let sequential = TrialMatcher::new(&registry);
    let parallel = TrialMatcher::with_config(&registry, MatcherConfig::builder().with_parallel(true).build());

    for age in [12, 40, 66, 90] {
        let patient = TestPatient::aged(age);
        assert_eq!(
            sequential.match_trials(&patient, &trials),
            parallel.match_trials(&patient, &trials)
        );
    }
}

// ==================== Loading ====================

#[test]
fn test_load_then_match_skips_unmappable() {
    init_logging();
    let registry = registry();
    let treatments = InMemoryTreatmentDatabase::new();
    let loader = TrialLoader::new(&registry, &treatments);

    let mut definitions = trial_database();
    definitions.push(definition(
        "NCT04",
        "DELTA",
        vec![criterion("I-01", "IS_PREGNANT"), criterion("I-02", "NOT(A, B)")],
        vec![],
    ));
    definitions.push(definition(
        "NCT05",
        "EPSILON",
        vec![criterion("I-01", "IS_AT_LEAST_X_YEARS_OLD[18]")],
        vec![
            cohort(CohortMetadata::new("A", "Broken"), vec![criterion("A-01", "HAS_MEASURABLE_DISEASE[1]")]),
            cohort(CohortMetadata::new("B", "Fine"), vec![criterion("B-01", "HAS_MEASURABLE_DISEASE")]),
        ],
    ));

    let outcome = loader.load(definitions);
    assert_eq!(outcome.trials.len(), 4);

    assert_eq!(outcome.unmappable_trials.len(), 1);
    let delta = &outcome.unmappable_trials[0];
    assert_eq!(delta.identification.acronym, "DELTA");
    assert_eq!(delta.errors.len(), 2);
    assert_eq!(delta.errors[0], CompileError::UnknownRule("IS_PREGNANT".to_string()));

    assert_eq!(outcome.unmappable_cohorts.len(), 1);
    assert_eq!(outcome.unmappable_cohorts[0].trial_id, "NCT05");
    assert_eq!(outcome.unmappable_cohorts[0].cohort_id, "A");

    // Repeated criterion texts compile once
    assert!(loader.cache_stats().hits >= 3);

    let matches = TrialMatcher::new(&registry).match_trials(&TestPatient::aged(40), &outcome.trials);
    assert!(matches.iter().all(|m| m.identification.trial_id != "NCT04"));
    let epsilon = find(&matches, "NCT05");
    assert_eq!(epsilon.cohorts.len(), 1);
    assert!(epsilon.is_potentially_eligible);
}

#[cfg(feature = "serde")]
#[test]
fn test_match_serializes_evaluations_as_entries() {
    let registry = registry();
    let trials = load(&registry, trial_database());
    let matches = TrialMatcher::new(&registry).match_trials(&TestPatient::aged(40), &trials);

    let json = serde_json::to_value(&matches).unwrap();
    let entries = json[0]["evaluations"].as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries[1]["eligibility"]["references"].is_array());
    assert_eq!(entries[1]["evaluation"]["result"], "PASS");

    let back: Vec<TrialMatch> = serde_json::from_value(json).unwrap();
    assert_eq!(back, matches);
}
