//! Compilation of curated trial definitions.

use log::{debug, warn};
use trial_criteria::{
    CompileError, CompileResult, CriterionCompiler, Eligibility, SignatureSource, TreatmentDatabase,
};

use crate::cache::{normalize_cache_key, CacheStats, CriterionCache};
use crate::config::MatcherConfig;
use crate::model::{
    Cohort, CohortDefinition, CriterionDefinition, Trial, TrialDefinition, UnmappableCohort,
    UnmappableTrial,
};

const LOG_TARGET: &str = "trials::load";

/// Everything a load produced: the trials ready for matching and the
/// trials and cohorts that had to be left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrialLoadOutcome {
    /// Trials whose general criteria all compiled, in input order.
    pub trials: Vec<Trial>,
    /// Trials left out, with every general-criterion error.
    pub unmappable_trials: Vec<UnmappableTrial>,
    /// Cohorts left out of otherwise loaded trials.
    pub unmappable_cohorts: Vec<UnmappableCohort>,
}

impl TrialLoadOutcome {
    /// Returns true if nothing was left out.
    pub fn is_complete(&self) -> bool {
        self.unmappable_trials.is_empty() && self.unmappable_cohorts.is_empty()
    }
}

/// Compiles [`TrialDefinition`]s into [`Trial`]s, collecting every
/// compile error instead of stopping at the first one.
///
/// A failing general criterion makes its whole trial unmappable. A failing
/// cohort criterion only drops that cohort; the trial is kept with its
/// remaining cohorts.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use trial_criteria::{InMemoryTreatmentDatabase, ParameterType, RuleId};
/// use trial_matcher::{CriterionDefinition, TrialDefinition, TrialIdentification, TrialLoader};
///
/// let mut signatures = HashMap::new();
/// signatures.insert(RuleId::new("IS_MALE").unwrap(), Vec::<ParameterType>::new());
/// let treatments = InMemoryTreatmentDatabase::new();
///
/// let loader = TrialLoader::new(&signatures, &treatments);
/// let outcome = loader.load(vec![TrialDefinition {
///     identification: TrialIdentification::new("NCT01", "ALPHA", "Alpha study"),
///     general_criteria: vec![CriterionDefinition::new(["I-01"], "IS_MALE")],
///     cohorts: vec![],
/// }]);
///
/// assert_eq!(outcome.trials.len(), 1);
/// assert!(outcome.is_complete());
/// ```
pub struct TrialLoader<'a> {
    compiler: CriterionCompiler<'a>,
    cache: Option<CriterionCache>,
}

impl<'a> TrialLoader<'a> {
    /// Creates a loader with default configuration.
    pub fn new(signatures: &'a dyn SignatureSource, treatments: &'a dyn TreatmentDatabase) -> Self {
        Self::with_config(signatures, treatments, &MatcherConfig::default())
    }

    /// Creates a loader with custom configuration.
    pub fn with_config(
        signatures: &'a dyn SignatureSource,
        treatments: &'a dyn TreatmentDatabase,
        config: &MatcherConfig,
    ) -> Self {
        Self {
            compiler: CriterionCompiler::new(signatures, treatments),
            cache: config.cache.clone().map(CriterionCache::new),
        }
    }

    /// Returns a reference to the cache if enabled.
    pub fn cache(&self) -> Option<&CriterionCache> {
        self.cache.as_ref()
    }

    /// Returns cache statistics, or all zeros when caching is disabled.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.as_ref().map(CriterionCache::stats).unwrap_or_default()
    }

    /// Compiles every trial definition.
    pub fn load<I>(&self, definitions: I) -> TrialLoadOutcome
    where
        I: IntoIterator<Item = TrialDefinition>,
    {
        let mut outcome = TrialLoadOutcome::default();

        for definition in definitions {
            let identification = definition.identification;
            let general_eligibility = match self.compile_all(&definition.general_criteria) {
                Ok(eligibility) => eligibility,
                Err(errors) => {
                    warn!(
                        target: LOG_TARGET,
                        "Trial {} is unmappable: {} criterion error(s)",
                        identification.trial_id,
                        errors.len()
                    );
                    outcome.unmappable_trials.push(UnmappableTrial {
                        identification,
                        errors,
                    });
                    continue;
                }
            };

            let mut cohorts = Vec::with_capacity(definition.cohorts.len());
            for cohort in definition.cohorts {
                match self.compile_cohort(cohort) {
                    Ok(cohort) => cohorts.push(cohort),
                    Err((cohort_id, errors)) => {
                        warn!(
                            target: LOG_TARGET,
                            "Cohort {} of trial {} is unmappable: {} criterion error(s)",
                            cohort_id,
                            identification.trial_id,
                            errors.len()
                        );
                        outcome.unmappable_cohorts.push(UnmappableCohort {
                            trial_id: identification.trial_id.clone(),
                            cohort_id,
                            errors,
                        });
                    }
                }
            }

            debug!(
                target: LOG_TARGET,
                "Loaded trial {} with {} general criteria and {} cohort(s)",
                identification.trial_id,
                general_eligibility.len(),
                cohorts.len()
            );
            outcome.trials.push(Trial {
                identification,
                general_eligibility,
                cohorts,
            });
        }

        debug!(
            target: LOG_TARGET,
            "Load finished: {} trial(s), {} unmappable trial(s), {} unmappable cohort(s), cache {:?}",
            outcome.trials.len(),
            outcome.unmappable_trials.len(),
            outcome.unmappable_cohorts.len(),
            self.cache_stats()
        );
        outcome
    }

    fn compile_cohort(&self, cohort: CohortDefinition) -> Result<Cohort, (String, Vec<CompileError>)> {
        match self.compile_all(&cohort.criteria) {
            Ok(eligibility) => Ok(Cohort {
                metadata: cohort.metadata,
                eligibility,
            }),
            Err(errors) => Err((cohort.metadata.cohort_id, errors)),
        }
    }

    /// Compiles all criteria, or returns every error met.
    fn compile_all(&self, criteria: &[CriterionDefinition]) -> Result<Vec<Eligibility>, Vec<CompileError>> {
        let mut compiled = Vec::with_capacity(criteria.len());
        let mut errors = Vec::new();

        for definition in criteria {
            match self.compile_criterion(definition) {
                Ok(eligibility) => compiled.push(eligibility),
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() {
            Ok(compiled)
        } else {
            Err(errors)
        }
    }

    fn compile_criterion(&self, definition: &CriterionDefinition) -> CompileResult<Eligibility> {
        let key = normalize_cache_key(&definition.criterion);

        let cached = self.cache.as_ref().and_then(|cache| cache.get(&key));
        let function = match cached {
            Some(function) => function,
            None => {
                let function = self.compiler.compile(&definition.criterion)?;
                if let Some(cache) = &self.cache {
                    cache.set(key, function.clone());
                }
                function
            }
        };

        Ok(Eligibility {
            references: definition.references.clone(),
            function,
        })
    }
}
