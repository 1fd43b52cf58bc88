//! Deterministic ordering of match results.

use std::cmp::Ordering;

use crate::result::{CohortMatch, TrialMatch};

/// Orders cohorts open first, then those with slots available, then by id.
pub fn compare_cohorts(a: &CohortMatch, b: &CohortMatch) -> Ordering {
    b.metadata
        .open
        .cmp(&a.metadata.open)
        .then_with(|| b.metadata.slots_available.cmp(&a.metadata.slots_available))
        .then_with(|| a.metadata.cohort_id.cmp(&b.metadata.cohort_id))
}

/// Orders trials by trial id, then by acronym.
pub fn compare_trials(a: &TrialMatch, b: &TrialMatch) -> Ordering {
    a.identification
        .trial_id
        .cmp(&b.identification.trial_id)
        .then_with(|| a.identification.acronym.cmp(&b.identification.acronym))
}
