//! Error types for rule registry construction.

use thiserror::Error;

/// Errors that can occur while building a [`RuleRegistry`](crate::RuleRegistry).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Rule name is not a valid identifier.
    #[error("invalid rule name: {0}")]
    InvalidRuleName(#[from] trial_criteria::CompileError),

    /// Attempt to register AND/OR/NOT/WARN_IF as a leaf rule.
    #[error("composite rule cannot be registered as a leaf: {0}")]
    CompositeRuleName(String),

    /// Rule registered twice.
    #[error("rule registered more than once: {0}")]
    DuplicateRule(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_duplicate_rule() {
        let err = RegistryError::DuplicateRule("IS_MALE".to_string());
        assert_eq!(err.to_string(), "rule registered more than once: IS_MALE");
    }

    #[test]
    fn test_error_display_composite_rule_name() {
        let err = RegistryError::CompositeRuleName("AND".to_string());
        assert_eq!(err.to_string(), "composite rule cannot be registered as a leaf: AND");
    }

    #[test]
    fn test_error_from_compile_error() {
        let compile_err = trial_criteria::CompileError::InvalidRuleIdentifier("x".to_string());
        let err: RegistryError = compile_err.into();
        assert!(matches!(err, RegistryError::InvalidRuleName(_)));
        assert_eq!(err.to_string(), "invalid rule name: invalid rule identifier: 'x'");
    }
}
