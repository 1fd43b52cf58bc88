//! Match results for one patient.

use trial_criteria_evaluator::EvaluationMap;

use crate::model::{CohortMetadata, TrialIdentification};

/// Outcome of matching a patient against one cohort.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CohortMatch {
    /// The cohort matched.
    pub metadata: CohortMetadata,
    /// No disqualifying failure in the cohort or at trial level.
    pub is_potentially_eligible: bool,
    /// Cohort-specific evaluations; empty for a non-evaluable cohort.
    #[cfg_attr(
        feature = "serde",
        serde(with = "trial_criteria_evaluator::evaluation_entries")
    )]
    pub evaluations: EvaluationMap,
}

/// Outcome of matching a patient against one trial.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrialMatch {
    /// The trial matched.
    pub identification: TrialIdentification,
    /// No disqualifying trial-level failure, and some cohort eligible when
    /// the trial has cohorts.
    pub is_potentially_eligible: bool,
    /// Trial-level evaluations.
    #[cfg_attr(
        feature = "serde",
        serde(with = "trial_criteria_evaluator::evaluation_entries")
    )]
    pub evaluations: EvaluationMap,
    /// Cohort matches, open cohorts with slots first.
    pub cohorts: Vec<CohortMatch>,
}

impl TrialMatch {
    /// Cohorts the patient is potentially eligible for.
    pub fn eligible_cohorts(&self) -> impl Iterator<Item = &CohortMatch> {
        self.cohorts.iter().filter(|cohort| cohort.is_potentially_eligible)
    }

    /// Returns true if the trial is eligible and open, and has an eligible
    /// open cohort when it has cohorts.
    pub fn is_open_and_eligible(&self) -> bool {
        self.is_potentially_eligible
            && self.identification.open
            && (self.cohorts.is_empty() || self.eligible_cohorts().any(|cohort| cohort.metadata.open))
    }
}
