//! Criterion compiler.
//!
//! Turns one criterion string into an [`EligibilityFunction`] tree. Three
//! textual forms exist:
//!
//! | Form | Example | Meaning |
//! |------|---------|---------|
//! | composite | `AND(A[1], NOT(B))` | logical composition of sub-criteria |
//! | parameterized | `IS_AT_LEAST_X_YEARS_OLD[18]` | leaf rule with typed parameters |
//! | atomic | `IS_MALE` | leaf rule without parameters |
//!
//! Parentheses always denote composition and brackets always denote a leaf
//! parameter list. A composite argument may itself be parameterized, so the
//! argument splitter tracks both delimiter kinds.

use log::debug;
use nom::{
    bytes::complete::take_while,
    character::complete::satisfy,
    combinator::{all_consuming, recognize},
    sequence::pair,
    IResult,
};

use crate::ast::{CompositeRule, EligibilityFunction, ParameterValue, Rule, RuleId};
use crate::error::{CompileError, CompileResult};
use crate::signature::SignatureSource;
use crate::treatment::TreatmentDatabase;

const LOG_TARGET: &str = "criteria::compile";

/// Deepest composite nesting accepted; a leaf counts as one level.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Compiles a criterion string against a signature source and treatment database.
///
/// # Examples
///
/// ```rust
/// use std::collections::HashMap;
/// use trial_criteria::{compile, InMemoryTreatmentDatabase, ParameterType, RuleId};
///
/// let mut signatures = HashMap::new();
/// signatures.insert(RuleId::new("IS_AT_LEAST_X_YEARS_OLD").unwrap(), vec![ParameterType::Integer]);
/// let treatments = InMemoryTreatmentDatabase::new();
///
/// let function = compile("NOT(IS_AT_LEAST_X_YEARS_OLD[75])", &signatures, &treatments).unwrap();
/// assert_eq!(function.to_string(), "NOT(IS_AT_LEAST_X_YEARS_OLD[75])");
/// ```
pub fn compile(
    input: &str,
    signatures: &dyn SignatureSource,
    treatments: &dyn TreatmentDatabase,
) -> CompileResult<EligibilityFunction> {
    CriterionCompiler::new(signatures, treatments).compile(input)
}

/// Reusable compiler bound to a signature source and treatment database.
#[derive(Clone, Copy)]
pub struct CriterionCompiler<'a> {
    signatures: &'a dyn SignatureSource,
    treatments: &'a dyn TreatmentDatabase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CriterionForm {
    /// Position of the first `(`.
    Composite(usize),
    /// Position of the first `[`.
    Parameterized(usize),
    Atomic,
}

impl<'a> CriterionCompiler<'a> {
    /// Creates a compiler.
    pub fn new(signatures: &'a dyn SignatureSource, treatments: &'a dyn TreatmentDatabase) -> Self {
        Self {
            signatures,
            treatments,
        }
    }

    /// Compiles one criterion string.
    pub fn compile(&self, input: &str) -> CompileResult<EligibilityFunction> {
        let function = self.compile_nested(input, 1)?;
        debug!(
            target: LOG_TARGET,
            "compiled '{}' into {} (depth {})",
            input.trim(),
            function.rule,
            function.depth()
        );
        Ok(function)
    }

    fn compile_nested(&self, input: &str, level: usize) -> CompileResult<EligibilityFunction> {
        if level > MAX_NESTING_DEPTH {
            return Err(CompileError::NestingTooDeep(MAX_NESTING_DEPTH));
        }
        let text = input.trim();
        if text.is_empty() {
            return Err(CompileError::EmptyCriterion);
        }

        match classify(text) {
            CriterionForm::Composite(open) => self.compile_composite(text, open, level),
            CriterionForm::Parameterized(open) => self.compile_parameterized(text, open),
            CriterionForm::Atomic => self.compile_atomic(text),
        }
    }

    fn compile_composite(
        &self,
        text: &str,
        open: usize,
        level: usize,
    ) -> CompileResult<EligibilityFunction> {
        let name = text[..open].trim();
        let rule = CompositeRule::from_name(name).ok_or_else(|| {
            if is_rule_identifier(name) {
                CompileError::UnknownCompositeRule(name.to_string())
            } else {
                CompileError::InvalidRuleIdentifier(name.to_string())
            }
        })?;

        let body = &text[open + 1..text.len() - 1];
        let arguments = split_top_level(body)
            .ok_or_else(|| CompileError::UnbalancedDelimiters(text.to_string()))?;

        if let Some(expected) = rule.fixed_arity() {
            if arguments.len() != expected {
                return Err(CompileError::ArityMismatch {
                    rule: name.to_string(),
                    expected,
                    found: arguments.len(),
                });
            }
        }

        let mut parameters = Vec::with_capacity(arguments.len());
        for argument in arguments {
            if argument.trim().is_empty() {
                return Err(CompileError::EmptyArgument(name.to_string()));
            }
            parameters.push(ParameterValue::Function(self.compile_nested(argument, level + 1)?));
        }

        Ok(EligibilityFunction {
            rule: Rule::Composite(rule),
            parameters,
        })
    }

    fn compile_parameterized(&self, text: &str, open: usize) -> CompileResult<EligibilityFunction> {
        let rule = self.leaf_rule(text[..open].trim())?;
        let signature = self
            .signatures
            .signature_of(&rule)
            .ok_or_else(|| CompileError::UnknownRule(rule.to_string()))?;

        let body = &text[open + 1..text.len() - 1];
        let tokens = split_parameters(body);
        if tokens.len() != signature.len() {
            return Err(CompileError::ArityMismatch {
                rule: rule.to_string(),
                expected: signature.len(),
                found: tokens.len(),
            });
        }

        let parameters = signature
            .iter()
            .zip(tokens)
            .map(|(parameter_type, token)| parameter_type.bind(token, self.treatments))
            .collect::<CompileResult<Vec<_>>>()?;

        Ok(EligibilityFunction::leaf(rule, parameters))
    }

    fn compile_atomic(&self, text: &str) -> CompileResult<EligibilityFunction> {
        let rule = self.leaf_rule(text)?;
        let signature = self
            .signatures
            .signature_of(&rule)
            .ok_or_else(|| CompileError::UnknownRule(rule.to_string()))?;
        if !signature.is_empty() {
            return Err(CompileError::ArityMismatch {
                rule: rule.to_string(),
                expected: signature.len(),
                found: 0,
            });
        }
        Ok(EligibilityFunction::leaf(rule, Vec::new()))
    }

    fn leaf_rule(&self, name: &str) -> CompileResult<RuleId> {
        if CompositeRule::from_name(name).is_some() {
            return Err(CompileError::UnexpectedCompositeForm(name.to_string()));
        }
        name.parse()
    }
}

fn classify(text: &str) -> CriterionForm {
    if let (Some(open), true) = (text.find('('), text.ends_with(')')) {
        CriterionForm::Composite(open)
    } else if let (Some(open), true) = (text.find('['), text.ends_with(']')) {
        CriterionForm::Parameterized(open)
    } else {
        CriterionForm::Atomic
    }
}

/// Splits a composite argument list at commas outside any `(...)` or `[...]`.
///
/// Returns `None` when the delimiters do not balance. A blank list yields no
/// arguments.
fn split_top_level(body: &str) -> Option<Vec<&str>> {
    if body.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut arguments = Vec::new();
    let mut paren_depth = 0usize;
    let mut bracket_depth = 0usize;
    let mut start = 0;

    for (i, c) in body.char_indices() {
        match c {
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.checked_sub(1)?,
            '[' => bracket_depth += 1,
            ']' => bracket_depth = bracket_depth.checked_sub(1)?,
            ',' if paren_depth == 0 && bracket_depth == 0 => {
                arguments.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if paren_depth != 0 || bracket_depth != 0 {
        return None;
    }
    arguments.push(&body[start..]);
    Some(arguments)
}

/// Splits a leaf parameter list on plain commas, dropping trailing empty tokens.
fn split_parameters(body: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = body.split(',').map(str::trim).collect();
    while tokens.last().is_some_and(|token| token.is_empty()) {
        tokens.pop();
    }
    tokens
}

fn rule_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_uppercase()),
        take_while(|c: char| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'),
    ))(input)
}

/// Returns true if `text` is exactly one rule identifier.
pub(crate) fn is_rule_identifier(text: &str) -> bool {
    all_consuming(rule_identifier)(text).is_ok()
}
