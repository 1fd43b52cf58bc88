//! # trial-criteria-evaluator
//!
//! Five-valued interpreter for compiled clinical-trial criteria.
//!
//! This crate bridges the [`trial_criteria`] compiler and caller-supplied
//! leaf rules to evaluate eligibility trees against a patient record.
//!
//! ## Key Features
//!
//! - **Rule registry** - one immutable map from rule to signature and evaluator,
//!   shared by the compiler and the interpreter
//! - **Five-valued results** - `PASS`, `WARN`, `UNDETERMINED`, `FAIL`, `NOT_EVALUATED`
//! - **Advisory failures** - recoverable `FAIL`s are reported without disqualifying
//! - **Deterministic output** - sorted messages and ordered evaluation maps
//!
//! ## Quick Start
//!
//! ```rust
//! use trial_criteria::{compile, Eligibility, InMemoryTreatmentDatabase, ParameterType};
//! use trial_criteria_evaluator::{is_potentially_eligible, Evaluation, Interpreter, RuleRegistry};
//!
//! struct Patient {
//!     age: i64,
//!     is_male: bool,
//! }
//!
//! let registry = RuleRegistry::<Patient>::builder()
//!     .rule("IS_MALE", &[], |_, patient: &Patient| {
//!         if patient.is_male {
//!             Evaluation::pass("Patient is male")
//!         } else {
//!             Evaluation::fail("Patient is not male")
//!         }
//!     })
//!     .rule("IS_AT_LEAST_X_YEARS_OLD", &[ParameterType::Integer], |parameters, patient: &Patient| {
//!         if parameters[0].as_integer().is_some_and(|min| patient.age >= min) {
//!             Evaluation::pass("Patient is old enough")
//!         } else {
//!             Evaluation::fail("Patient is too young")
//!         }
//!     })
//!     .build()
//!     .unwrap();
//!
//! let treatments = InMemoryTreatmentDatabase::new();
//! let criteria = vec![
//!     Eligibility::new(["I-01"], compile("IS_AT_LEAST_X_YEARS_OLD[18]", &registry, &treatments).unwrap()),
//!     Eligibility::new(["I-02"], compile("IS_MALE", &registry, &treatments).unwrap()),
//! ];
//!
//! let interpreter = Interpreter::new(&registry);
//! let evaluations = interpreter.evaluate_set(&criteria, &Patient { age: 64, is_male: true });
//! assert!(is_potentially_eligible(evaluations.values()));
//! ```
//!
//! ## Composite Semantics
//!
//! | Rule | Outcome |
//! |------|---------|
//! | `AND` | worst child result |
//! | `OR` | `PASS` if any child passes, else best child result |
//! | `NOT` | `PASS` and `FAIL` swap |
//! | `WARN_IF` | child `PASS` becomes a recoverable `WARN`, child `FAIL` a recoverable `PASS` |
//!
//! ## Feature Flags
//!
//! - `serde` - Serialize/Deserialize for evaluations and the [`evaluation_entries`] adapter

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod composite;
mod criteria_set;
mod error;
mod evaluation;
mod interpreter;
mod registry;

pub use composite::combine;
#[cfg(feature = "serde")]
pub use criteria_set::evaluation_entries;
pub use criteria_set::{is_potentially_eligible, EvaluationMap};
pub use error::{RegistryError, RegistryResult};
pub use evaluation::{Evaluation, EvaluationResult};
pub use interpreter::Interpreter;
pub use registry::{LeafFunction, RuleRegistry, RuleRegistryBuilder};

// Re-export the compiler types leaf rules are written against
pub use trial_criteria::{Eligibility, EligibilityFunction, ParameterType, ParameterValue, RuleId};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let _: Option<EvaluationMap> = None;
        let _: Option<RegistryResult<()>> = None;
        let _: Option<Interpreter<'_, ()>> = None;
        let _: Option<RuleRegistryBuilder<()>> = None;
    }
}
