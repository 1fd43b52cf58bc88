//! Rule registry: declared signatures and leaf evaluators.
//!
//! The registry is the only place the interpreter learns about concrete
//! biomedical rules. It is built once at start-up, then shared read-only by
//! the compiler (through [`SignatureSource`]) and by the [`Interpreter`].
//!
//! # Example
//!
//! ```rust
//! use trial_criteria::ParameterType;
//! use trial_criteria_evaluator::{Evaluation, RuleRegistry};
//!
//! struct Patient {
//!     age: i64,
//! }
//!
//! let registry = RuleRegistry::<Patient>::builder()
//!     .rule("IS_AT_LEAST_X_YEARS_OLD", &[ParameterType::Integer], |parameters, patient: &Patient| {
//!         match parameters[0].as_integer() {
//!             Some(min_age) if patient.age >= min_age => Evaluation::pass("Patient is old enough"),
//!             Some(_) => Evaluation::fail("Patient is too young"),
//!             None => Evaluation::undetermined("Minimum age missing"),
//!         }
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(registry.len(), 1);
//! ```
//!
//! [`Interpreter`]: crate::Interpreter

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use trial_criteria::{CompositeRule, ParameterType, ParameterValue, RuleId, SignatureSource};

use crate::error::{RegistryError, RegistryResult};
use crate::evaluation::Evaluation;

/// Evaluator of one leaf rule against a patient record.
///
/// Implemented for every `Fn(&[ParameterValue], &P) -> Evaluation` closure,
/// so most rules are registered as closures. Parameters arrive already
/// bound to the types declared in the rule's signature.
pub trait LeafFunction<P>: Send + Sync {
    /// Evaluates the rule for `patient`.
    fn evaluate(&self, parameters: &[ParameterValue], patient: &P) -> Evaluation;
}

impl<P, F> LeafFunction<P> for F
where
    F: Fn(&[ParameterValue], &P) -> Evaluation + Send + Sync,
{
    fn evaluate(&self, parameters: &[ParameterValue], patient: &P) -> Evaluation {
        self(parameters, patient)
    }
}

struct RuleEntry<P> {
    signature: Vec<ParameterType>,
    function: Arc<dyn LeafFunction<P>>,
}

impl<P> Clone for RuleEntry<P> {
    fn clone(&self) -> Self {
        Self {
            signature: self.signature.clone(),
            function: Arc::clone(&self.function),
        }
    }
}

/// Immutable map from leaf rule to its signature and evaluator.
pub struct RuleRegistry<P> {
    rules: HashMap<RuleId, RuleEntry<P>>,
}

impl<P> RuleRegistry<P> {
    /// Creates a new builder.
    pub fn builder() -> RuleRegistryBuilder<P> {
        RuleRegistryBuilder::default()
    }

    /// Returns the evaluator registered for `rule`.
    pub fn leaf_function(&self, rule: &RuleId) -> Option<&dyn LeafFunction<P>> {
        self.rules.get(rule).map(|entry| entry.function.as_ref())
    }

    /// Returns true if `rule` is registered.
    pub fn contains(&self, rule: &RuleId) -> bool {
        self.rules.contains_key(rule)
    }

    /// Number of registered leaf rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Registered rules in sorted order.
    pub fn rule_ids(&self) -> Vec<&RuleId> {
        let mut ids: Vec<&RuleId> = self.rules.keys().collect();
        ids.sort();
        ids
    }
}

impl<P> Clone for RuleRegistry<P> {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
        }
    }
}

impl<P> fmt::Debug for RuleRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.rule_ids())
            .finish()
    }
}

impl<P> SignatureSource for RuleRegistry<P> {
    fn signature_of(&self, rule: &RuleId) -> Option<&[ParameterType]> {
        self.rules.get(rule).map(|entry| entry.signature.as_slice())
    }
}

/// Builder for [`RuleRegistry`].
///
/// Registration errors are collected and the first one is returned by
/// [`build`](Self::build).
pub struct RuleRegistryBuilder<P> {
    rules: HashMap<RuleId, RuleEntry<P>>,
    errors: Vec<RegistryError>,
}

impl<P> Default for RuleRegistryBuilder<P> {
    fn default() -> Self {
        Self {
            rules: HashMap::new(),
            errors: Vec::new(),
        }
    }
}

impl<P> RuleRegistryBuilder<P> {
    /// Registers a closure-based leaf rule.
    pub fn rule<F>(self, name: &str, signature: &[ParameterType], function: F) -> Self
    where
        F: Fn(&[ParameterValue], &P) -> Evaluation + Send + Sync + 'static,
    {
        self.leaf(name, signature, function)
    }

    /// Registers any [`LeafFunction`] implementation.
    pub fn leaf<L>(mut self, name: &str, signature: &[ParameterType], function: L) -> Self
    where
        L: LeafFunction<P> + 'static,
    {
        match self.validate(name) {
            Ok(rule) => {
                self.rules.insert(
                    rule,
                    RuleEntry {
                        signature: signature.to_vec(),
                        function: Arc::new(function),
                    },
                );
            }
            Err(e) => self.errors.push(e),
        }
        self
    }

    fn validate(&self, name: &str) -> RegistryResult<RuleId> {
        if CompositeRule::from_name(name).is_some() {
            return Err(RegistryError::CompositeRuleName(name.to_string()));
        }
        let rule = RuleId::new(name)?;
        if self.rules.contains_key(&rule) {
            return Err(RegistryError::DuplicateRule(name.to_string()));
        }
        Ok(rule)
    }

    /// Builds the registry.
    pub fn build(self) -> RegistryResult<RuleRegistry<P>> {
        match self.errors.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(RuleRegistry { rules: self.rules }),
        }
    }
}
