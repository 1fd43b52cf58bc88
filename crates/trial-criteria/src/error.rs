//! Error types for criterion compilation.

use thiserror::Error;

use crate::signature::ParameterType;

/// Errors that can occur while compiling a criterion string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Empty (or whitespace-only) criterion text.
    #[error("empty criterion")]
    EmptyCriterion,

    /// Text that is not a well-formed rule identifier.
    #[error("invalid rule identifier: '{0}'")]
    InvalidRuleIdentifier(String),

    /// Rule identifier without a registered signature.
    #[error("unknown rule: {0}")]
    UnknownRule(String),

    /// Name in front of `(...)` that is not a composite rule.
    #[error("'{0}' is not a composite rule")]
    UnknownCompositeRule(String),

    /// Composite rule written in parameterized or atomic form.
    #[error("composite rule {0} must be written as {0}(...)")]
    UnexpectedCompositeForm(String),

    /// Number of supplied parameters differs from the declared signature.
    #[error("rule {rule} expects {expected} parameter(s), found {found}")]
    ArityMismatch {
        /// Rule name.
        rule: String,
        /// Declared arity.
        expected: usize,
        /// Supplied token count.
        found: usize,
    },

    /// Parentheses or brackets do not balance.
    #[error("unbalanced delimiters in '{0}'")]
    UnbalancedDelimiters(String),

    /// Composite nesting beyond [`MAX_NESTING_DEPTH`](crate::MAX_NESTING_DEPTH).
    #[error("criterion nests deeper than {0} levels")]
    NestingTooDeep(usize),

    /// Empty argument inside a composite argument list, e.g. `AND(A,,B)`.
    #[error("empty argument in composite rule {0}")]
    EmptyArgument(String),

    /// Token that cannot be converted to the declared parameter type.
    #[error("cannot convert '{token}' to {expected}: {reason}")]
    InvalidParameter {
        /// Declared parameter type.
        expected: ParameterType,
        /// Offending token.
        token: String,
        /// Conversion failure description.
        reason: String,
    },

    /// Treatment name not known to the treatment database.
    #[error("treatment not found: {0}")]
    TreatmentNotFound(String),

    /// Treatment exists but is not a systemic treatment.
    #[error("treatment is not systemic: {0}")]
    NotSystemicTreatment(String),

    /// Drug name not known to the treatment database.
    #[error("drug not found: {0}")]
    DrugNotFound(String),
}

/// Result type for criterion compilation.
pub type CompileResult<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_arity_mismatch() {
        let err = CompileError::ArityMismatch {
            rule: "IS_AT_LEAST_X_YEARS_OLD".to_string(),
            expected: 1,
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "rule IS_AT_LEAST_X_YEARS_OLD expects 1 parameter(s), found 2"
        );
    }

    #[test]
    fn test_error_display_invalid_parameter() {
        let err = CompileError::InvalidParameter {
            expected: ParameterType::Integer,
            token: "abc".to_string(),
            reason: "invalid digit found in string".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot convert 'abc' to integer: invalid digit found in string"
        );
    }

    #[test]
    fn test_error_display_nesting() {
        assert_eq!(
            CompileError::NestingTooDeep(64).to_string(),
            "criterion nests deeper than 64 levels"
        );
    }

    #[test]
    fn test_error_display_lookup_failures() {
        assert_eq!(
            CompileError::TreatmentNotFound("FOLFOX".to_string()).to_string(),
            "treatment not found: FOLFOX"
        );
        assert_eq!(
            CompileError::DrugNotFound("ASPIRIN".to_string()).to_string(),
            "drug not found: ASPIRIN"
        );
    }
}
