//! # trial-criteria
//!
//! Compiler for the textual criterion language used to curate clinical-trial
//! eligibility.
//!
//! This crate provides:
//! - **Data model**: [`EligibilityFunction`] expression trees and [`Eligibility`] entries
//! - **Criterion compiler**: [`compile`] turns one criterion string into a tree,
//!   binding parameters through a [`SignatureSource`] and a [`TreatmentDatabase`]
//!
//! ## Usage
//!
//! ```rust
//! use std::collections::HashMap;
//! use trial_criteria::{compile, CompositeRule, InMemoryTreatmentDatabase, ParameterType, Rule, RuleId};
//!
//! let mut signatures = HashMap::new();
//! signatures.insert(RuleId::new("RULE_A").unwrap(), vec![ParameterType::Integer]);
//! signatures.insert(RuleId::new("RULE_B").unwrap(), vec![ParameterType::Integer, ParameterType::Integer]);
//! let treatments = InMemoryTreatmentDatabase::new();
//!
//! let tree = compile("AND(RULE_A[1],RULE_B[2,3])", &signatures, &treatments).unwrap();
//! assert_eq!(tree.rule, Rule::Composite(CompositeRule::And));
//! assert_eq!(tree.children().count(), 2);
//! ```
//!
//! ## Criterion Syntax Quick Reference
//!
//! | Form | Example |
//! |------|---------|
//! | Atomic | `IS_MALE` |
//! | Parameterized | `IS_AT_LEAST_X_YEARS_OLD[18]` |
//! | Many-valued parameter | `HAS_HAD_DRUGS[CAPECITABINE;OXALIPLATIN]` |
//! | Conjunction | `AND(A[1], B[2])` |
//! | Disjunction | `OR(A[1], B[2])` |
//! | Negation | `NOT(A[1])` |
//! | Advisory | `WARN_IF(A[1])` |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod ast;
mod error;
mod parser;
mod signature;
mod treatment;

pub use ast::{
    CompositeRule, Eligibility, EligibilityFunction, ParameterValue, Rule, RuleId, ScalarValue,
};
pub use error::{CompileError, CompileResult};
pub use parser::{compile, CriterionCompiler, MAX_NESTING_DEPTH};
pub use signature::{ParameterType, SignatureSource, MANY_SEPARATOR};
pub use treatment::{Drug, InMemoryTreatmentDatabase, Treatment, TreatmentDatabase};
