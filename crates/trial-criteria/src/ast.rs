//! Expression tree types for compiled eligibility criteria.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{CompileError, CompileResult};
use crate::treatment::{Drug, Treatment};

// =============================================================================
// Rule identifiers
// =============================================================================

/// Rules whose arguments are themselves sub-criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompositeRule {
    /// All children must hold: `AND(...)`
    And,
    /// At least one child must hold: `OR(...)`
    Or,
    /// Negation of a single child: `NOT(...)`
    Not,
    /// Advisory flag raised when the single child holds: `WARN_IF(...)`
    WarnIf,
}

impl CompositeRule {
    /// All composite rules.
    pub const ALL: [CompositeRule; 4] = [
        CompositeRule::And,
        CompositeRule::Or,
        CompositeRule::Not,
        CompositeRule::WarnIf,
    ];

    /// Textual name as written in criteria.
    pub fn name(&self) -> &'static str {
        match self {
            CompositeRule::And => "AND",
            CompositeRule::Or => "OR",
            CompositeRule::Not => "NOT",
            CompositeRule::WarnIf => "WARN_IF",
        }
    }

    /// Looks up a composite rule by its textual name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rule| rule.name() == name)
    }

    /// Required number of children, `None` for variadic rules.
    pub fn fixed_arity(&self) -> Option<usize> {
        match self {
            CompositeRule::And | CompositeRule::Or => None,
            CompositeRule::Not | CompositeRule::WarnIf => Some(1),
        }
    }
}

impl fmt::Display for CompositeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifier of a leaf rule, e.g. `IS_AT_LEAST_X_YEARS_OLD`.
///
/// Identifiers consist of an upper-case ASCII letter followed by upper-case
/// letters, digits and underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RuleId(String);

impl RuleId {
    /// Creates a validated rule identifier.
    pub fn new(name: &str) -> CompileResult<Self> {
        name.parse()
    }

    /// Creates a rule identifier from a well-known constant without validation.
    pub fn from_static(name: &'static str) -> Self {
        Self(name.to_string())
    }

    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RuleId {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if crate::parser::is_rule_identifier(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(CompileError::InvalidRuleIdentifier(s.to_string()))
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The rule at a node of the expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rule {
    /// Logical composition of sub-criteria.
    Composite(CompositeRule),
    /// Domain predicate decided by a registered leaf evaluator.
    Leaf(RuleId),
}

impl Rule {
    /// Returns the textual rule name.
    pub fn name(&self) -> &str {
        match self {
            Rule::Composite(rule) => rule.name(),
            Rule::Leaf(id) => id.as_str(),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Parameter values
// =============================================================================

/// Scalar parameter values produced by the generic token conversion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScalarValue {
    /// Integer value: `75`
    Integer(i64),
    /// Decimal value kept exact: `2.5`
    Double(Decimal),
    /// Free text: `BRAF`
    String(String),
    /// `;`-separated integers: `1;2;3`
    Integers(Vec<i64>),
    /// `;`-separated strings: `BRAF;KRAS`
    Strings(Vec<String>),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Integer(n) => write!(f, "{}", n),
            ScalarValue::Double(d) => write!(f, "{}", d),
            ScalarValue::String(s) => f.write_str(s),
            ScalarValue::Integers(values) => write_joined(f, values.iter(), ";"),
            ScalarValue::Strings(values) => write_joined(f, values.iter(), ";"),
        }
    }
}

/// A bound parameter of an [`EligibilityFunction`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParameterValue {
    /// Integer, decimal or string value (or a list thereof).
    Scalar(ScalarValue),
    /// Nested sub-criterion of a composite rule.
    Function(EligibilityFunction),
    /// A single resolved treatment.
    Treatment(Treatment),
    /// Several resolved treatments.
    Treatments(Vec<Treatment>),
    /// A single resolved drug.
    Drug(Drug),
    /// Several resolved drugs.
    Drugs(Vec<Drug>),
}

impl ParameterValue {
    /// Returns the integer payload, if any.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ParameterValue::Scalar(ScalarValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    /// Returns the decimal payload, if any.
    pub fn as_double(&self) -> Option<Decimal> {
        match self {
            ParameterValue::Scalar(ScalarValue::Double(d)) => Some(*d),
            _ => None,
        }
    }

    /// Returns the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::Scalar(ScalarValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns the nested function, if any.
    pub fn as_function(&self) -> Option<&EligibilityFunction> {
        match self {
            ParameterValue::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Returns the treatment payload, if any.
    pub fn as_treatment(&self) -> Option<&Treatment> {
        match self {
            ParameterValue::Treatment(treatment) => Some(treatment),
            _ => None,
        }
    }

    /// Returns the drugs payload, if any.
    pub fn as_drugs(&self) -> Option<&[Drug]> {
        match self {
            ParameterValue::Drugs(drugs) => Some(drugs),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Scalar(value) => write!(f, "{}", value),
            ParameterValue::Function(function) => write!(f, "{}", function),
            ParameterValue::Treatment(treatment) => f.write_str(&treatment.name),
            ParameterValue::Treatments(treatments) => {
                write_joined(f, treatments.iter().map(|t| &t.name), ";")
            }
            ParameterValue::Drug(drug) => f.write_str(&drug.name),
            ParameterValue::Drugs(drugs) => write_joined(f, drugs.iter().map(|d| &d.name), ";"),
        }
    }
}

// =============================================================================
// Expression tree
// =============================================================================

/// A compiled criterion: a rule applied to bound parameters.
///
/// Composite rules hold [`ParameterValue::Function`] children; leaf rules
/// hold scalar and reference parameters only. The tree is immutable once
/// built and is shared across every patient evaluated against a trial.
///
/// `Display` renders the criterion grammar back, so a compiled tree can be
/// compiled again to the same structure:
///
/// ```rust
/// use trial_criteria::{CompositeRule, EligibilityFunction, RuleId};
///
/// let leaf = EligibilityFunction::leaf(RuleId::new("IS_MALE").unwrap(), vec![]);
/// let tree = EligibilityFunction::composite(CompositeRule::Not, vec![leaf]);
/// assert_eq!(tree.to_string(), "NOT(IS_MALE)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EligibilityFunction {
    /// The rule at this node.
    pub rule: Rule,
    /// Positional parameters.
    pub parameters: Vec<ParameterValue>,
}

impl EligibilityFunction {
    /// Creates a leaf node.
    pub fn leaf(rule: RuleId, parameters: Vec<ParameterValue>) -> Self {
        Self {
            rule: Rule::Leaf(rule),
            parameters,
        }
    }

    /// Creates a composite node over the given children.
    pub fn composite(rule: CompositeRule, children: Vec<EligibilityFunction>) -> Self {
        Self {
            rule: Rule::Composite(rule),
            parameters: children.into_iter().map(ParameterValue::Function).collect(),
        }
    }

    /// Returns true for AND/OR/NOT/WARN_IF nodes.
    pub fn is_composite(&self) -> bool {
        matches!(self.rule, Rule::Composite(_))
    }

    /// Iterates over nested sub-criteria.
    pub fn children(&self) -> impl Iterator<Item = &EligibilityFunction> {
        self.parameters.iter().filter_map(ParameterValue::as_function)
    }

    /// Depth of the tree; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children().map(Self::depth).max().unwrap_or(0)
    }
}

impl fmt::Display for EligibilityFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rule {
            Rule::Composite(rule) => {
                write!(f, "{}(", rule)?;
                write_joined(f, self.parameters.iter(), ", ")?;
                f.write_str(")")
            }
            Rule::Leaf(id) if self.parameters.is_empty() => write!(f, "{}", id),
            Rule::Leaf(id) => {
                write!(f, "{}[", id)?;
                write_joined(f, self.parameters.iter(), ", ")?;
                f.write_str("]")
            }
        }
    }
}

/// A criterion together with the protocol sections it was curated from.
///
/// `references` is provenance only and is never consulted during evaluation.
/// Ordering is by references, then by rendered criterion text, so criteria
/// sets sort the same way on every run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Eligibility {
    /// Source-citation identifiers (e.g. "I-01", "E-03").
    pub references: BTreeSet<String>,
    /// The compiled criterion.
    pub function: EligibilityFunction,
}

impl Eligibility {
    /// Creates an eligibility entry.
    pub fn new<I, S>(references: I, function: EligibilityFunction) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            references: references.into_iter().map(Into::into).collect(),
            function,
        }
    }
}

impl Ord for Eligibility {
    fn cmp(&self, other: &Self) -> Ordering {
        self.references
            .iter()
            .cmp(other.references.iter())
            .then_with(|| self.function.to_string().cmp(&other.function.to_string()))
            .then_with(|| self.function.cmp(&other.function))
    }
}

impl PartialOrd for Eligibility {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn write_joined<I, T>(f: &mut fmt::Formatter<'_>, items: I, separator: &str) -> fmt::Result
where
    I: IntoIterator<Item = T>,
    T: fmt::Display,
{
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str, parameters: Vec<ParameterValue>) -> EligibilityFunction {
        EligibilityFunction::leaf(RuleId::new(name).unwrap(), parameters)
    }

    fn int(n: i64) -> ParameterValue {
        ParameterValue::Scalar(ScalarValue::Integer(n))
    }

    #[test]
    fn test_composite_rule_names() {
        for rule in CompositeRule::ALL {
            assert_eq!(CompositeRule::from_name(rule.name()), Some(rule));
        }
        assert_eq!(CompositeRule::from_name("XOR"), None);
        assert_eq!(CompositeRule::from_name("and"), None);
    }

    #[test]
    fn test_composite_fixed_arity() {
        assert_eq!(CompositeRule::And.fixed_arity(), None);
        assert_eq!(CompositeRule::Or.fixed_arity(), None);
        assert_eq!(CompositeRule::Not.fixed_arity(), Some(1));
        assert_eq!(CompositeRule::WarnIf.fixed_arity(), Some(1));
    }

    #[test]
    fn test_rule_id_validation() {
        assert!(RuleId::new("IS_AT_LEAST_X_YEARS_OLD").is_ok());
        assert!(RuleId::new("HAS_KRAS_G12C").is_ok());
        assert!(RuleId::new("lower").is_err());
        assert!(RuleId::new("1ABC").is_err());
        assert!(RuleId::new("A B").is_err());
        assert!(RuleId::new("").is_err());
    }

    #[test]
    fn test_display_leaf() {
        assert_eq!(leaf("IS_MALE", vec![]).to_string(), "IS_MALE");
        assert_eq!(
            leaf("IS_AT_LEAST_X_YEARS_OLD", vec![int(18)]).to_string(),
            "IS_AT_LEAST_X_YEARS_OLD[18]"
        );
        let scalars = leaf(
            "HAS_LAB_VALUE",
            vec![
                ParameterValue::Scalar(ScalarValue::String("ALT".to_string())),
                ParameterValue::Scalar(ScalarValue::Double(Decimal::new(25, 1))),
                ParameterValue::Scalar(ScalarValue::Integers(vec![1, 2])),
            ],
        );
        assert_eq!(scalars.to_string(), "HAS_LAB_VALUE[ALT, 2.5, 1;2]");
    }

    #[test]
    fn test_display_composite() {
        let tree = EligibilityFunction::composite(
            CompositeRule::Or,
            vec![
                EligibilityFunction::composite(
                    CompositeRule::And,
                    vec![leaf("A", vec![int(1)]), leaf("B", vec![int(2)])],
                ),
                leaf("C", vec![int(3)]),
            ],
        );
        assert_eq!(tree.to_string(), "OR(AND(A[1], B[2]), C[3])");
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.children().count(), 2);
        assert!(tree.is_composite());
    }

    #[test]
    fn test_display_references() {
        let drugs = leaf(
            "HAS_HAD_DRUGS",
            vec![ParameterValue::Drugs(vec![
                Drug::new("CAPECITABINE", "CHEMOTHERAPY"),
                Drug::new("OXALIPLATIN", "CHEMOTHERAPY"),
            ])],
        );
        assert_eq!(drugs.to_string(), "HAS_HAD_DRUGS[CAPECITABINE;OXALIPLATIN]");
    }

    #[test]
    fn test_parameter_accessors() {
        assert_eq!(int(5).as_integer(), Some(5));
        assert_eq!(int(5).as_str(), None);
        let nested = ParameterValue::Function(leaf("IS_MALE", vec![]));
        assert!(nested.as_function().is_some());
        assert_eq!(nested.as_integer(), None);
    }

    #[test]
    fn test_eligibility_ordering() {
        let a = Eligibility::new(["I-01"], leaf("B", vec![]));
        let b = Eligibility::new(["I-02"], leaf("A", vec![]));
        let c = Eligibility::new(["I-02"], leaf("C", vec![]));
        let mut entries = vec![c.clone(), b.clone(), a.clone()];
        entries.sort();
        assert_eq!(entries, vec![a, b, c]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_round_trip() {
        let tree = EligibilityFunction::composite(
            CompositeRule::And,
            vec![
                leaf(
                    "HAS_HAD_TREATMENT",
                    vec![ParameterValue::Treatment(Treatment::systemic(
                        "FOLFOX",
                        [Drug::new("OXALIPLATIN", "CHEMOTHERAPY")],
                    ))],
                ),
                leaf(
                    "HAS_LAB_VALUE",
                    vec![
                        ParameterValue::Scalar(ScalarValue::String("ALT".to_string())),
                        ParameterValue::Scalar(ScalarValue::Double(Decimal::new(25, 1))),
                    ],
                ),
                EligibilityFunction::composite(CompositeRule::Not, vec![leaf("IS_MALE", vec![])]),
            ],
        );
        let eligibility = Eligibility::new(["I-01", "I-02"], tree);

        let json = serde_json::to_string(&eligibility).unwrap();
        assert!(json.contains("\"HAS_LAB_VALUE\""));

        let restored: Eligibility = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, eligibility);
        assert_eq!(restored.function.to_string(), eligibility.function.to_string());
    }
}
