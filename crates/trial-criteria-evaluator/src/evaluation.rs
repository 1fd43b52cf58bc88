//! Evaluation result types.

use std::collections::BTreeSet;
use std::fmt;

/// Outcome of evaluating one criterion.
///
/// Ordered from worst to best: `Fail`, `Undetermined`, `Warn`, `Pass`,
/// `NotEvaluated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum EvaluationResult {
    /// The patient meets the criterion.
    Pass,
    /// The patient meets the criterion, with a caveat for the clinician.
    Warn,
    /// The patient record lacks the data to decide.
    Undetermined,
    /// The patient does not meet the criterion.
    Fail,
    /// The criterion was not evaluated.
    NotEvaluated,
}

impl EvaluationResult {
    /// All results, worst first.
    pub const WORST_FIRST: [EvaluationResult; 5] = [
        EvaluationResult::Fail,
        EvaluationResult::Undetermined,
        EvaluationResult::Warn,
        EvaluationResult::Pass,
        EvaluationResult::NotEvaluated,
    ];

    /// Rank in the worst-case ordering; higher is worse.
    pub fn severity(&self) -> u8 {
        match self {
            EvaluationResult::NotEvaluated => 0,
            EvaluationResult::Pass => 1,
            EvaluationResult::Warn => 2,
            EvaluationResult::Undetermined => 3,
            EvaluationResult::Fail => 4,
        }
    }

    /// Returns true if `self` ranks worse than `other`.
    pub fn is_worse_than(&self, other: EvaluationResult) -> bool {
        self.severity() > other.severity()
    }

    /// Returns true if `self` ranks better than `other`.
    pub fn is_better_than(&self, other: EvaluationResult) -> bool {
        self.severity() < other.severity()
    }
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvaluationResult::Pass => "PASS",
            EvaluationResult::Warn => "WARN",
            EvaluationResult::Undetermined => "UNDETERMINED",
            EvaluationResult::Fail => "FAIL",
            EvaluationResult::NotEvaluated => "NOT_EVALUATED",
        };
        f.write_str(name)
    }
}

/// Result of evaluating a criterion against a patient.
///
/// `recoverable` marks a failure that is advisory: it is reported, but it
/// never disqualifies a trial or cohort on its own. Messages are kept per
/// result category in sorted sets so reports are stable across runs.
///
/// # Example
///
/// ```rust
/// use trial_criteria_evaluator::{Evaluation, EvaluationResult};
///
/// let evaluation = Evaluation::fail("Patient is younger than 18 years");
/// assert_eq!(evaluation.result, EvaluationResult::Fail);
/// assert!(evaluation.is_disqualifying());
///
/// let advisory = Evaluation::recoverable_fail("Washout period may not be respected");
/// assert!(!advisory.is_disqualifying());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Evaluation {
    /// The outcome.
    pub result: EvaluationResult,
    /// Whether a failure is advisory rather than disqualifying.
    pub recoverable: bool,
    /// Messages explaining a pass.
    pub pass_messages: BTreeSet<String>,
    /// Messages explaining a warning.
    pub warn_messages: BTreeSet<String>,
    /// Messages explaining why the outcome could not be determined.
    pub undetermined_messages: BTreeSet<String>,
    /// Messages explaining a failure.
    pub fail_messages: BTreeSet<String>,
}

impl Evaluation {
    /// Creates an evaluation without messages.
    pub fn new(result: EvaluationResult, recoverable: bool) -> Self {
        Self {
            result,
            recoverable,
            pass_messages: BTreeSet::new(),
            warn_messages: BTreeSet::new(),
            undetermined_messages: BTreeSet::new(),
            fail_messages: BTreeSet::new(),
        }
    }

    /// A pass with an explanatory message.
    pub fn pass(message: impl Into<String>) -> Self {
        Self::new(EvaluationResult::Pass, false).with_message(EvaluationResult::Pass, message)
    }

    /// A warning with an explanatory message.
    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(EvaluationResult::Warn, false).with_message(EvaluationResult::Warn, message)
    }

    /// An undetermined outcome with an explanatory message.
    pub fn undetermined(message: impl Into<String>) -> Self {
        Self::new(EvaluationResult::Undetermined, false)
            .with_message(EvaluationResult::Undetermined, message)
    }

    /// A disqualifying failure with an explanatory message.
    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(EvaluationResult::Fail, false).with_message(EvaluationResult::Fail, message)
    }

    /// An advisory failure with an explanatory message.
    pub fn recoverable_fail(message: impl Into<String>) -> Self {
        Self::new(EvaluationResult::Fail, true).with_message(EvaluationResult::Fail, message)
    }

    /// An outcome for a criterion that was not evaluated.
    pub fn not_evaluated() -> Self {
        Self::new(EvaluationResult::NotEvaluated, true)
    }

    /// Adds a message to the given category.
    pub fn with_message(mut self, category: EvaluationResult, message: impl Into<String>) -> Self {
        if let Some(messages) = self.messages_mut(category) {
            messages.insert(message.into());
        }
        self
    }

    /// Merges all messages of `other` into `self`, category by category.
    pub fn with_messages_from(mut self, other: &Evaluation) -> Self {
        self.pass_messages.extend(other.pass_messages.iter().cloned());
        self.warn_messages.extend(other.warn_messages.iter().cloned());
        self.undetermined_messages
            .extend(other.undetermined_messages.iter().cloned());
        self.fail_messages.extend(other.fail_messages.iter().cloned());
        self
    }

    /// Returns the messages of a category; `NotEvaluated` has none.
    pub fn messages(&self, category: EvaluationResult) -> Option<&BTreeSet<String>> {
        match category {
            EvaluationResult::Pass => Some(&self.pass_messages),
            EvaluationResult::Warn => Some(&self.warn_messages),
            EvaluationResult::Undetermined => Some(&self.undetermined_messages),
            EvaluationResult::Fail => Some(&self.fail_messages),
            EvaluationResult::NotEvaluated => None,
        }
    }

    fn messages_mut(&mut self, category: EvaluationResult) -> Option<&mut BTreeSet<String>> {
        match category {
            EvaluationResult::Pass => Some(&mut self.pass_messages),
            EvaluationResult::Warn => Some(&mut self.warn_messages),
            EvaluationResult::Undetermined => Some(&mut self.undetermined_messages),
            EvaluationResult::Fail => Some(&mut self.fail_messages),
            EvaluationResult::NotEvaluated => None,
        }
    }

    /// Returns true for a non-recoverable failure.
    pub fn is_disqualifying(&self) -> bool {
        self.result == EvaluationResult::Fail && !self.recoverable
    }
}
