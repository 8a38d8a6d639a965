//! Visibility predicates attached to conditionals and collection filters.

use crate::context::{DataContext, stringify};
use crate::template::{FunctionRegistry, Interpolator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use tracing::warn;

/// How a resolved value is compared against a condition's literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Predicate {
    Equals,
    DoesNotEqual,
    IsGreaterThan,
    IsLessThan,
    IsSet,
    IsNotSet,
    IsTrue,
    IsFalse,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Predicate::Equals => "==",
            Predicate::DoesNotEqual => "!=",
            Predicate::IsGreaterThan => ">",
            Predicate::IsLessThan => "<",
            Predicate::IsSet => "is set",
            Predicate::IsNotSet => "is not set",
            Predicate::IsTrue => "is true",
            Predicate::IsFalse => "is false",
        };
        f.write_str(symbol)
    }
}

/// `keyPath <predicate> value`, e.g. `data.stock IS_GREATER_THAN 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub key_path: String,
    pub predicate: Predicate,
    #[serde(default)]
    pub value: Option<Value>,
}

impl Condition {
    pub fn new(key_path: impl Into<String>, predicate: Predicate, value: Option<Value>) -> Self {
        Self {
            key_path: key_path.into(),
            predicate,
            value,
        }
    }

    /// Resolves the key-path in `context` and applies the predicate.
    ///
    /// A string literal is interpolated first, so it may itself reference data. If that
    /// interpolation finds a missing value the literal counts as missing; if the literal
    /// is malformed it is compared verbatim.
    pub fn is_satisfied(&self, context: &DataContext<'_>, functions: &FunctionRegistry) -> bool {
        let left = context.resolve_key_path(&self.key_path);
        let right = match &self.value {
            Some(Value::String(literal)) => {
                let interpolator = Interpolator::new(*context, functions);
                match interpolator.interpolate(literal) {
                    Ok(Some(interpolated)) => Some(Cow::Owned(Value::String(interpolated))),
                    Ok(None) => None,
                    Err(error) => {
                        warn!(key_path = %self.key_path, %error, "Comparing condition literal without interpolation.");
                        self.value.as_ref().map(Cow::Borrowed)
                    }
                }
            }
            Some(other) => Some(Cow::Borrowed(other)),
            None => None,
        };
        evaluate(self.predicate, left.as_deref(), right.as_deref())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} {} {}", self.key_path, self.predicate, value),
            None => write!(f, "{} {}", self.key_path, self.predicate),
        }
    }
}

/// True when every condition holds. An empty list is vacuously true.
pub fn all_satisfied(
    conditions: &[Condition],
    context: &DataContext<'_>,
    functions: &FunctionRegistry,
) -> bool {
    conditions
        .iter()
        .all(|condition| condition.is_satisfied(context, functions))
}

/// Applies `predicate` to a resolved left-hand value and a literal right-hand value.
/// `None` stands for a value that does not exist.
pub fn evaluate(predicate: Predicate, left: Option<&Value>, right: Option<&Value>) -> bool {
    match predicate {
        Predicate::Equals => equality(left, right).unwrap_or(false),
        Predicate::DoesNotEqual => equality(left, right).map_or(true, |equal| !equal),
        Predicate::IsGreaterThan => match (number(left), number(right)) {
            (Some(l), Some(r)) => l > r,
            _ => false,
        },
        Predicate::IsLessThan => match (number(left), number(right)) {
            (Some(l), Some(r)) => l < r,
            _ => false,
        },
        Predicate::IsSet => is_set(left),
        Predicate::IsNotSet => !is_set(left),
        Predicate::IsTrue => left.is_some_and(|value| stringify(value).eq_ignore_ascii_case("true")),
        Predicate::IsFalse => {
            left.is_some_and(|value| stringify(value).eq_ignore_ascii_case("false"))
        }
    }
}

/// `Some(equal)` when both sides exist and have comparable types, `None` otherwise.
fn equality(left: Option<&Value>, right: Option<&Value>) -> Option<bool> {
    match (left?, right?) {
        (Value::String(l), Value::String(r)) => Some(l == r),
        (Value::Number(l), Value::Number(r)) => Some(l.as_f64()? == r.as_f64()?),
        (Value::Bool(l), Value::Bool(r)) => Some(l == r),
        _ => None,
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    value?.as_f64()
}

fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => s != "null",
        Some(_) => true,
    }
}
