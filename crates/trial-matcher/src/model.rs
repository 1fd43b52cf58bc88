//! Trial definitions as curated, and trials as compiled.

use std::collections::BTreeSet;

use trial_criteria::{CompileError, Eligibility};

/// Identification of a trial.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrialIdentification {
    /// Registry identifier, e.g. "NCT01234567".
    pub trial_id: String,
    /// Short name; also used to detect previous participation.
    pub acronym: String,
    /// Full title.
    pub title: String,
    /// Whether the trial is recruiting.
    pub open: bool,
}

impl TrialIdentification {
    /// Creates an open trial identification.
    pub fn new(trial_id: impl Into<String>, acronym: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            trial_id: trial_id.into(),
            acronym: acronym.into(),
            title: title.into(),
            open: true,
        }
    }

    /// Marks the trial as open or closed.
    pub fn with_open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }
}

/// Descriptive data for one cohort.
///
/// A cohort that is not `evaluable` has no curated criteria worth
/// evaluating; it inherits the trial-level outcome. `blacklist` is carried
/// for reporting and never consulted by the matcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CohortMetadata {
    /// Identifier, unique within its trial.
    pub cohort_id: String,
    /// Human-readable description.
    pub description: String,
    /// Whether the cohort's criteria are evaluated.
    pub evaluable: bool,
    /// Whether the cohort is recruiting.
    pub open: bool,
    /// Whether the cohort has slots left.
    pub slots_available: bool,
    /// Whether the cohort is hidden from reports.
    pub blacklist: bool,
}

impl CohortMetadata {
    /// Creates metadata for an evaluable, open cohort with slots available.
    pub fn new(cohort_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            cohort_id: cohort_id.into(),
            description: description.into(),
            evaluable: true,
            open: true,
            slots_available: true,
            blacklist: false,
        }
    }

    /// Sets whether the cohort is evaluable.
    pub fn with_evaluable(mut self, evaluable: bool) -> Self {
        self.evaluable = evaluable;
        self
    }

    /// Sets whether the cohort is open.
    pub fn with_open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }

    /// Sets whether the cohort has slots available.
    pub fn with_slots_available(mut self, slots_available: bool) -> Self {
        self.slots_available = slots_available;
        self
    }
}

// =============================================================================
// Definitions (input)
// =============================================================================

/// One curated criterion in its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CriterionDefinition {
    /// Protocol sections the criterion was curated from.
    pub references: BTreeSet<String>,
    /// Criterion text, e.g. `AND(IS_MALE, IS_AT_LEAST_X_YEARS_OLD[18])`.
    pub criterion: String,
}

impl CriterionDefinition {
    /// Creates a criterion definition.
    pub fn new<I, S>(references: I, criterion: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            references: references.into_iter().map(Into::into).collect(),
            criterion: criterion.into(),
        }
    }
}

/// A cohort as curated.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CohortDefinition {
    /// Cohort metadata.
    pub metadata: CohortMetadata,
    /// Cohort-specific criteria.
    pub criteria: Vec<CriterionDefinition>,
}

/// A trial as curated.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrialDefinition {
    /// Trial identification.
    pub identification: TrialIdentification,
    /// Criteria applying to every cohort.
    pub general_criteria: Vec<CriterionDefinition>,
    /// Cohorts; may be empty.
    pub cohorts: Vec<CohortDefinition>,
}

// =============================================================================
// Compiled trials
// =============================================================================

/// A cohort with compiled criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cohort {
    /// Cohort metadata.
    pub metadata: CohortMetadata,
    /// Compiled cohort-specific criteria.
    pub eligibility: Vec<Eligibility>,
}

/// A trial with compiled criteria, ready for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trial {
    /// Trial identification.
    pub identification: TrialIdentification,
    /// Compiled general criteria.
    pub general_eligibility: Vec<Eligibility>,
    /// Compiled cohorts.
    pub cohorts: Vec<Cohort>,
}

// =============================================================================
// Load failures
// =============================================================================

/// A trial left out because a general criterion did not compile.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct UnmappableTrial {
    /// The trial that was left out.
    pub identification: TrialIdentification,
    /// Every error met while compiling its general criteria.
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_errors"))]
    pub errors: Vec<CompileError>,
}

/// A cohort left out because one of its criteria did not compile.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct UnmappableCohort {
    /// The trial the cohort belongs to.
    pub trial_id: String,
    /// The cohort that was left out.
    pub cohort_id: String,
    /// Every error met while compiling its criteria.
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_errors"))]
    pub errors: Vec<CompileError>,
}

#[cfg(feature = "serde")]
fn serialize_errors<S>(errors: &[CompileError], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(errors.iter().map(ToString::to_string))
}
