//! Tree-walking interpreter for compiled criteria.

use log::warn;
use trial_criteria::{EligibilityFunction, ParameterValue, Rule, RuleId};

use crate::composite;
use crate::evaluation::{Evaluation, EvaluationResult};
use crate::registry::RuleRegistry;

const LOG_TARGET: &str = "criteria::evaluate";

/// Evaluates [`EligibilityFunction`] trees against patient records.
///
/// Leaves are dispatched to the [`RuleRegistry`]; composite nodes combine
/// their children's evaluations (see [`composite`](crate::composite)).
/// Evaluation has no side effects and is deterministic for a given tree and
/// patient, so one interpreter can serve any number of patients and threads.
///
/// # Example
///
/// ```rust
/// use trial_criteria::{compile, InMemoryTreatmentDatabase, ParameterType};
/// use trial_criteria_evaluator::{Evaluation, EvaluationResult, Interpreter, RuleRegistry};
///
/// struct Patient {
///     age: i64,
/// }
///
/// let registry = RuleRegistry::<Patient>::builder()
///     .rule("IS_AT_LEAST_X_YEARS_OLD", &[ParameterType::Integer], |parameters, patient: &Patient| {
///         if parameters[0].as_integer().is_some_and(|min| patient.age >= min) {
///             Evaluation::pass("Patient is old enough")
///         } else {
///             Evaluation::fail("Patient is too young")
///         }
///     })
///     .build()
///     .unwrap();
///
/// let function = compile(
///     "NOT(IS_AT_LEAST_X_YEARS_OLD[75])",
///     &registry,
///     &InMemoryTreatmentDatabase::new(),
/// )
/// .unwrap();
///
/// let interpreter = Interpreter::new(&registry);
/// assert_eq!(interpreter.evaluate(&function, &Patient { age: 80 }).result, EvaluationResult::Fail);
/// assert_eq!(interpreter.evaluate(&function, &Patient { age: 70 }).result, EvaluationResult::Pass);
/// ```
pub struct Interpreter<'a, P> {
    registry: &'a RuleRegistry<P>,
}

impl<'a, P> Interpreter<'a, P> {
    /// Creates an interpreter over `registry`.
    pub fn new(registry: &'a RuleRegistry<P>) -> Self {
        Self { registry }
    }

    /// Returns the registry leaves are dispatched to.
    pub fn registry(&self) -> &'a RuleRegistry<P> {
        self.registry
    }

    /// Evaluates `function` for `patient`.
    pub fn evaluate(&self, function: &EligibilityFunction, patient: &P) -> Evaluation {
        match &function.rule {
            Rule::Leaf(rule) => self.evaluate_leaf(rule, &function.parameters, patient),
            Rule::Composite(rule) => {
                let children = function
                    .children()
                    .map(|child| self.evaluate(child, patient))
                    .collect();
                composite::combine(*rule, children)
            }
        }
    }

    fn evaluate_leaf(&self, rule: &RuleId, parameters: &[ParameterValue], patient: &P) -> Evaluation {
        match self.registry.leaf_function(rule) {
            Some(function) => function.evaluate(parameters, patient),
            None => {
                warn!(target: LOG_TARGET, "No evaluator registered for rule {}", rule);
                Evaluation::not_evaluated().with_message(
                    EvaluationResult::Undetermined,
                    format!("No evaluator registered for rule {}", rule),
                )
            }
        }
    }
}

impl<P> Clone for Interpreter<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for Interpreter<'_, P> {}
