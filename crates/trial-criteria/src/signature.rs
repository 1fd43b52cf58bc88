//! Rule parameter signatures and typed parameter binding.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::ast::{ParameterValue, RuleId, ScalarValue};
use crate::error::{CompileError, CompileResult};
use crate::treatment::{Drug, Treatment, TreatmentDatabase};

/// Separator between the items of a many-valued parameter token.
pub const MANY_SEPARATOR: char = ';';

/// Declared type of one positional rule parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParameterType {
    /// A single integer.
    Integer,
    /// `;`-separated integers.
    ManyIntegers,
    /// A decimal number.
    Double,
    /// Free text.
    String,
    /// `;`-separated strings.
    ManyStrings,
    /// A treatment resolved by name.
    Treatment,
    /// A treatment resolved by name that must be systemic.
    SystemicTreatment,
    /// `;`-separated treatments resolved by name.
    ManyTreatments,
    /// A drug resolved by name.
    Drug,
    /// `;`-separated drugs resolved by name.
    ManyDrugs,
}

impl ParameterType {
    /// Converts one raw parameter token into a typed value.
    ///
    /// Reference types are resolved through `treatments`; a missing name fails
    /// the conversion.
    pub fn bind(
        &self,
        token: &str,
        treatments: &dyn TreatmentDatabase,
    ) -> CompileResult<ParameterValue> {
        let token = token.trim();
        let value = match self {
            ParameterType::Integer => ParameterValue::Scalar(ScalarValue::Integer(
                self.parse_scalar::<i64>(token)?,
            )),
            ParameterType::ManyIntegers => ParameterValue::Scalar(ScalarValue::Integers(
                self.split_many(token)?
                    .into_iter()
                    .map(|item| self.parse_scalar::<i64>(item))
                    .collect::<CompileResult<_>>()?,
            )),
            ParameterType::Double => ParameterValue::Scalar(ScalarValue::Double(
                self.parse_scalar::<Decimal>(token)?,
            )),
            ParameterType::String => ParameterValue::Scalar(ScalarValue::String(token.to_string())),
            ParameterType::ManyStrings => ParameterValue::Scalar(ScalarValue::Strings(
                self.split_many(token)?.into_iter().map(str::to_string).collect(),
            )),
            ParameterType::Treatment => ParameterValue::Treatment(find_treatment(treatments, token)?),
            ParameterType::SystemicTreatment => {
                let treatment = find_treatment(treatments, token)?;
                if !treatment.is_systemic {
                    return Err(CompileError::NotSystemicTreatment(token.to_string()));
                }
                ParameterValue::Treatment(treatment)
            }
            ParameterType::ManyTreatments => ParameterValue::Treatments(
                self.split_many(token)?
                    .into_iter()
                    .map(|name| find_treatment(treatments, name))
                    .collect::<CompileResult<_>>()?,
            ),
            ParameterType::Drug => ParameterValue::Drug(find_drug(treatments, token)?),
            ParameterType::ManyDrugs => ParameterValue::Drugs(
                self.split_many(token)?
                    .into_iter()
                    .map(|name| find_drug(treatments, name))
                    .collect::<CompileResult<_>>()?,
            ),
        };
        Ok(value)
    }

    /// Splits a many-valued token on `;`, failing when no item remains.
    fn split_many<'t>(&self, token: &'t str) -> CompileResult<Vec<&'t str>> {
        let items: Vec<&str> = token
            .split(MANY_SEPARATOR)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect();
        if items.is_empty() {
            return Err(CompileError::InvalidParameter {
                expected: *self,
                token: token.to_string(),
                reason: "no items".to_string(),
            });
        }
        Ok(items)
    }

    fn parse_scalar<T>(&self, token: &str) -> CompileResult<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        token.parse::<T>().map_err(|e| CompileError::InvalidParameter {
            expected: *self,
            token: token.to_string(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterType::Integer => "integer",
            ParameterType::ManyIntegers => "many integers",
            ParameterType::Double => "double",
            ParameterType::String => "string",
            ParameterType::ManyStrings => "many strings",
            ParameterType::Treatment => "treatment",
            ParameterType::SystemicTreatment => "systemic treatment",
            ParameterType::ManyTreatments => "many treatments",
            ParameterType::Drug => "drug",
            ParameterType::ManyDrugs => "many drugs",
        };
        f.write_str(name)
    }
}

fn find_treatment(
    treatments: &dyn TreatmentDatabase,
    name: &str,
) -> CompileResult<Treatment> {
    treatments
        .find_treatment_by_name(name)
        .ok_or_else(|| CompileError::TreatmentNotFound(name.to_string()))
}

fn find_drug(treatments: &dyn TreatmentDatabase, name: &str) -> CompileResult<Drug> {
    treatments
        .find_drug_by_name(name)
        .ok_or_else(|| CompileError::DrugNotFound(name.to_string()))
}

/// Source of declared parameter signatures, keyed by leaf rule.
///
/// Composite rules (AND/OR/NOT/WARN_IF) are handled by the compiler itself
/// and never looked up here.
pub trait SignatureSource: Send + Sync {
    /// Returns the ordered parameter types of `rule`, or `None` if unknown.
    fn signature_of(&self, rule: &RuleId) -> Option<&[ParameterType]>;
}

impl SignatureSource for HashMap<RuleId, Vec<ParameterType>> {
    fn signature_of(&self, rule: &RuleId) -> Option<&[ParameterType]> {
        self.get(rule).map(Vec::as_slice)
    }
}
