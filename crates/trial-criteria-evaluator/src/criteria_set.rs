//! Evaluation of a whole criteria set for one patient.

use indexmap::IndexMap;
use trial_criteria::Eligibility;

use crate::evaluation::Evaluation;
use crate::interpreter::Interpreter;

/// Evaluations keyed by criterion, in eligibility order.
pub type EvaluationMap = IndexMap<Eligibility, Evaluation>;

impl<P> Interpreter<'_, P> {
    /// Evaluates every criterion in `criteria` for `patient`.
    ///
    /// Criteria are sorted by references, then by rendered text, before
    /// evaluation, so the returned map iterates in the same order on every
    /// run regardless of input order. Duplicate criteria collapse into one
    /// entry.
    pub fn evaluate_set(&self, criteria: &[Eligibility], patient: &P) -> EvaluationMap {
        let mut sorted: Vec<&Eligibility> = criteria.iter().collect();
        sorted.sort();
        sorted.dedup();

        sorted
            .into_iter()
            .map(|eligibility| {
                let evaluation = self.evaluate(&eligibility.function, patient);
                (eligibility.clone(), evaluation)
            })
            .collect()
    }
}

/// Returns true unless some evaluation is a non-recoverable `FAIL`.
///
/// `UNDETERMINED`, `WARN` and recoverable failures never disqualify.
pub fn is_potentially_eligible<'a, I>(evaluations: I) -> bool
where
    I: IntoIterator<Item = &'a Evaluation>,
{
    !evaluations.into_iter().any(Evaluation::is_disqualifying)
}

/// Serde adapter for [`EvaluationMap`].
///
/// Eligibility keys are structured values, so the map is written as a
/// sequence of `{ "eligibility": .., "evaluation": .. }` entries in map order.
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Report {
///     #[serde(with = "trial_criteria_evaluator::evaluation_entries")]
///     evaluations: EvaluationMap,
/// }
/// ```
#[cfg(feature = "serde")]
pub mod evaluation_entries {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use trial_criteria::Eligibility;

    use super::EvaluationMap;
    use crate::evaluation::Evaluation;

    #[derive(Serialize)]
    struct EntryRef<'a> {
        eligibility: &'a Eligibility,
        evaluation: &'a Evaluation,
    }

    #[derive(Deserialize)]
    struct Entry {
        eligibility: Eligibility,
        evaluation: Evaluation,
    }

    /// Serializes the map as a sequence of entries.
    pub fn serialize<S>(map: &EvaluationMap, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(map.len()))?;
        for (eligibility, evaluation) in map {
            seq.serialize_element(&EntryRef {
                eligibility,
                evaluation,
            })?;
        }
        seq.end()
    }

    /// Deserializes a sequence of entries, keeping their order.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<EvaluationMap, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|entry| (entry.eligibility, entry.evaluation))
            .collect())
    }
}
