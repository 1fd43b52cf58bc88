//! Trial and cohort matching for one patient.

use log::debug;
use trial_criteria::{CompositeRule, Eligibility, EligibilityFunction, ParameterValue, RuleId, ScalarValue};
use trial_criteria_evaluator::{is_potentially_eligible, EvaluationMap, Interpreter, RuleRegistry};

use crate::config::MatcherConfig;
use crate::model::{Cohort, Trial};
use crate::result::{CohortMatch, TrialMatch};
use crate::sort::{compare_cohorts, compare_trials};

const LOG_TARGET: &str = "trials::match";

/// Leaf rule used to flag previous participation in a trial.
///
/// Registries that do not register it leave the flag `NOT_EVALUATED`.
pub const PREVIOUS_PARTICIPATION_RULE: &str = "HAS_PREVIOUSLY_PARTICIPATED_IN_TRIAL";

/// Builds `WARN_IF(HAS_PREVIOUSLY_PARTICIPATED_IN_TRIAL[<acronym>])`.
pub fn participation_criterion(acronym: &str) -> Eligibility {
    let rule = RuleId::from_static(PREVIOUS_PARTICIPATION_RULE);
    let parameter = ParameterValue::Scalar(ScalarValue::String(acronym.to_string()));
    let function = EligibilityFunction::composite(
        CompositeRule::WarnIf,
        vec![EligibilityFunction::leaf(rule, vec![parameter])],
    );
    Eligibility::new(Vec::<String>::new(), function)
}

/// Matches a patient against compiled trials.
///
/// A trial is potentially eligible when no trial-level criterion fails
/// non-recoverably and, if it has cohorts, at least one cohort is
/// potentially eligible. A cohort is potentially eligible only when the
/// trial-level criteria are.
///
/// # Example
///
/// ```rust
/// use trial_criteria_evaluator::RuleRegistry;
/// use trial_matcher::{Trial, TrialIdentification, TrialMatcher};
///
/// struct Patient;
///
/// let registry = RuleRegistry::<Patient>::builder().build().unwrap();
/// let trials = vec![Trial {
///     identification: TrialIdentification::new("NCT01", "ALPHA", "Alpha study"),
///     general_eligibility: vec![],
///     cohorts: vec![],
/// }];
///
/// let matches = TrialMatcher::new(&registry).match_trials(&Patient, &trials);
/// assert!(matches[0].is_potentially_eligible);
/// ```
pub struct TrialMatcher<'a, P> {
    interpreter: Interpreter<'a, P>,
    config: MatcherConfig,
}

impl<'a, P> TrialMatcher<'a, P> {
    /// Creates a matcher with default configuration.
    pub fn new(registry: &'a RuleRegistry<P>) -> Self {
        Self::with_config(registry, MatcherConfig::default())
    }

    /// Creates a matcher with custom configuration.
    pub fn with_config(registry: &'a RuleRegistry<P>, config: MatcherConfig) -> Self {
        Self {
            interpreter: Interpreter::new(registry),
            config,
        }
    }

    /// Returns a reference to the matcher configuration.
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }
}

impl<P: Sync> TrialMatcher<'_, P> {
    /// Matches `patient` against every trial.
    ///
    /// Results are sorted by trial id, then acronym; cohorts within a trial
    /// are sorted open first, then by slots available, then by id.
    pub fn match_trials(&self, patient: &P, trials: &[Trial]) -> Vec<TrialMatch> {
        let mut matches = self.match_all(patient, trials);
        matches.sort_by(compare_trials);
        matches
    }

    #[cfg(feature = "parallel")]
    fn match_all(&self, patient: &P, trials: &[Trial]) -> Vec<TrialMatch> {
        use rayon::prelude::*;

        if self.config.parallel {
            trials
                .par_iter()
                .map(|trial| self.match_trial(patient, trial))
                .collect()
        } else {
            trials.iter().map(|trial| self.match_trial(patient, trial)).collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn match_all(&self, patient: &P, trials: &[Trial]) -> Vec<TrialMatch> {
        trials.iter().map(|trial| self.match_trial(patient, trial)).collect()
    }

    /// Matches `patient` against a single trial.
    pub fn match_trial(&self, patient: &P, trial: &Trial) -> TrialMatch {
        let evaluations = self.evaluate_general(patient, trial);
        let trial_eligible = is_potentially_eligible(evaluations.values());

        let mut cohorts: Vec<CohortMatch> = trial
            .cohorts
            .iter()
            .map(|cohort| self.match_cohort(patient, cohort, trial_eligible))
            .collect();
        cohorts.sort_by(compare_cohorts);

        let is_potentially_eligible = trial_eligible
            && (cohorts.is_empty() || cohorts.iter().any(|cohort| cohort.is_potentially_eligible));

        debug!(
            target: LOG_TARGET,
            "Trial {}: eligible={}, {} evaluation(s), {}/{} cohort(s) eligible",
            trial.identification.trial_id,
            is_potentially_eligible,
            evaluations.len(),
            cohorts.iter().filter(|cohort| cohort.is_potentially_eligible).count(),
            cohorts.len()
        );

        TrialMatch {
            identification: trial.identification.clone(),
            is_potentially_eligible,
            evaluations,
            cohorts,
        }
    }

    fn evaluate_general(&self, patient: &P, trial: &Trial) -> EvaluationMap {
        if self.config.participation_check {
            let mut criteria = trial.general_eligibility.clone();
            criteria.push(participation_criterion(&trial.identification.acronym));
            self.interpreter.evaluate_set(&criteria, patient)
        } else {
            self.interpreter.evaluate_set(&trial.general_eligibility, patient)
        }
    }

    fn match_cohort(&self, patient: &P, cohort: &Cohort, trial_eligible: bool) -> CohortMatch {
        let evaluations = if cohort.metadata.evaluable {
            self.interpreter.evaluate_set(&cohort.eligibility, patient)
        } else {
            EvaluationMap::default()
        };

        CohortMatch {
            metadata: cohort.metadata.clone(),
            is_potentially_eligible: trial_eligible && is_potentially_eligible(evaluations.values()),
            evaluations,
        }
    }
}
