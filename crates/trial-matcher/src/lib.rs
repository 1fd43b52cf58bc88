//! # trial-matcher
//!
//! Trial loading and trial/cohort matching on top of `trial-criteria-evaluator`.
//!
//! This crate turns curated trial definitions into compiled trials and
//! matches a patient against them:
//!
//! - **Loading**: [`TrialLoader`] compiles every criterion, collecting all
//!   errors into [`UnmappableTrial`]s and [`UnmappableCohort`]s instead of
//!   aborting, and memoises compilation in a [`CriterionCache`]
//! - **Matching**: [`TrialMatcher`] evaluates trial-level and cohort
//!   criteria, conjoins cohort eligibility with trial eligibility and sorts
//!   the results deterministically
//!
//! ## Quick Start
//!
//! ```rust
//! use trial_criteria::{InMemoryTreatmentDatabase, ParameterType};
//! use trial_criteria_evaluator::{Evaluation, RuleRegistry};
//! use trial_matcher::{
//!     CohortDefinition, CohortMetadata, CriterionDefinition, TrialDefinition, TrialIdentification,
//!     TrialLoader, TrialMatcher,
//! };
//!
//! struct Patient {
//!     age: i64,
//! }
//!
//! let registry = RuleRegistry::<Patient>::builder()
//!     .rule("IS_AT_LEAST_X_YEARS_OLD", &[ParameterType::Integer], |parameters, patient: &Patient| {
//!         if parameters[0].as_integer().is_some_and(|min| patient.age >= min) {
//!             Evaluation::pass("Patient is old enough")
//!         } else {
//!             Evaluation::fail("Patient is too young")
//!         }
//!     })
//!     .build()
//!     .unwrap();
//! let treatments = InMemoryTreatmentDatabase::new();
//!
//! let outcome = TrialLoader::new(&registry, &treatments).load(vec![TrialDefinition {
//!     identification: TrialIdentification::new("NCT01", "ALPHA", "Alpha study"),
//!     general_criteria: vec![CriterionDefinition::new(["I-01"], "IS_AT_LEAST_X_YEARS_OLD[18]")],
//!     cohorts: vec![CohortDefinition {
//!         metadata: CohortMetadata::new("A", "Elderly"),
//!         criteria: vec![CriterionDefinition::new(["A-01"], "IS_AT_LEAST_X_YEARS_OLD[65]")],
//!     }],
//! }]);
//!
//! let matches = TrialMatcher::new(&registry).match_trials(&Patient { age: 40 }, &outcome.trials);
//! assert!(!matches[0].is_potentially_eligible);
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel` - Match trials on the rayon thread pool when [`MatcherConfig::parallel`] is set
//! - `serde` - Serialize/Deserialize for definitions and match results

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod cache;
mod config;
mod loader;
mod matcher;
mod model;
mod result;
mod sort;

// Public re-exports
pub use cache::{normalize_cache_key, CacheStats, CriterionCache};
pub use config::{CacheConfig, MatcherConfig, MatcherConfigBuilder};
pub use loader::{TrialLoadOutcome, TrialLoader};
pub use matcher::{participation_criterion, TrialMatcher, PREVIOUS_PARTICIPATION_RULE};
pub use model::{
    Cohort, CohortDefinition, CohortMetadata, CriterionDefinition, Trial, TrialDefinition,
    TrialIdentification, UnmappableCohort, UnmappableTrial,
};
pub use result::{CohortMatch, TrialMatch};
pub use sort::{compare_cohorts, compare_trials};
