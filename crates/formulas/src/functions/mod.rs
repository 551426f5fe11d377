//! Standard spreadsheet functions implementation
//!
//! Every built-in checks [`get_error`](crate::get_error) on its arguments
//! before anything else, so an error operand comes back unchanged.

pub mod aggregate;
pub mod arithmetic;
pub mod logical;
pub mod math;
pub mod text;

use gridcalc_primitives::{ErrorValue, Value};
use std::cmp::Ordering;

static EMPTY: Value = Value::Empty;

/// Argument at `idx`, or `Empty` when omitted.
pub(crate) fn arg(values: &[Value], idx: usize) -> &Value {
    values.get(idx).unwrap_or(&EMPTY)
}

/// Visit every scalar, descending into ranges.
pub(crate) fn walk_values(values: &[Value], f: &mut dyn FnMut(&Value)) {
    for value in values {
        match value {
            Value::Array(items) => walk_values(items, f),
            _ => f(value),
        }
    }
}

/// A range used where one value is expected: a single cell collapses to that
/// cell, anything larger is `#VALUE!`.
pub(crate) fn scalar(value: &Value) -> Result<&Value, ErrorValue> {
    match value {
        Value::Array(items) => match items.as_slice() {
            [single] => scalar(single),
            _ => Err(ErrorValue::Value),
        },
        other => Ok(other),
    }
}

/// Coerce to a number: `Empty` is 0, booleans are 1/0, numeric text parses,
/// other text is `#VALUE!`.
pub(crate) fn to_number(value: &Value) -> Result<f64, ErrorValue> {
    match scalar(value)? {
        Value::Int(n) => Ok(*n as f64),
        Value::Float(f) => Ok(*f),
        Value::Empty => Ok(0.0),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => parse_numeric_text(s).ok_or(ErrorValue::Value),
        Value::Error(err) => Err(err.clone()),
        Value::Array(_) => Err(ErrorValue::Value),
    }
}

/// Integer view used to keep `+ - *` exact. Text is never integral here.
pub(crate) fn to_integer(value: &Value) -> Option<i64> {
    match scalar(value).ok()? {
        Value::Int(n) => Some(*n),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Empty => Some(0),
        _ => None,
    }
}

fn parse_numeric_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        // "inf" and "NaN" parse but are not spreadsheet numbers
        Ok(n) if n.is_finite() => Some(n),
        Ok(_) | Err(_) => None,
    }
}

/// Coerce to text the way a cell displays the value.
pub(crate) fn to_text(value: &Value) -> Result<String, ErrorValue> {
    match scalar(value)? {
        Value::Error(err) => Err(err.clone()),
        other => Ok(other.to_string()),
    }
}

/// Coerce a value to a boolean
pub(crate) fn to_bool(value: &Value) -> Result<bool, ErrorValue> {
    match scalar(value)? {
        Value::Bool(b) => Ok(*b),
        Value::Int(n) => Ok(*n != 0),
        Value::Float(f) => Ok(*f != 0.0),
        Value::Empty => Ok(false),
        Value::String(s) if s.eq_ignore_ascii_case("TRUE") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("FALSE") => Ok(false),
        Value::Error(err) => Err(err.clone()),
        _ => Err(ErrorValue::Value),
    }
}

/// Whole-number argument such as a character count; fractions truncate.
pub(crate) fn to_count(value: &Value) -> Result<i64, ErrorValue> {
    let n = to_number(value)?.trunc();
    if n < i64::MIN as f64 || n > i64::MAX as f64 {
        return Err(ErrorValue::Value);
    }
    Ok(n as i64)
}

/// Wrap a float result, mapping NaN and infinities to `#NUM!`.
pub(crate) fn finite(x: f64) -> Value {
    if x.is_finite() {
        Value::Float(x)
    } else {
        Value::Error(ErrorValue::Num)
    }
}

/// Unwrap a coercion result inside a built-in
macro_rules! try_value {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => return gridcalc_primitives::Value::Error(err),
        }
    };
}
pub(crate) use try_value;

/// Return the first error among the arguments, if any
macro_rules! propagate {
    ($values:expr) => {
        if let Some(err) = $crate::get_error($values) {
            return gridcalc_primitives::Value::Error(err);
        }
    };
}
pub(crate) use propagate;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TypeRank {
    Number,
    Text,
    Bool,
}

/// Total order used by comparison operators: numbers < text < booleans,
/// text case-insensitive. `Empty` takes the zero value of the other side.
pub(crate) fn compare_values(left: &Value, right: &Value) -> Result<Ordering, ErrorValue> {
    let left = scalar(left)?;
    let right = scalar(right)?;
    for value in [left, right] {
        if let Value::Error(err) = value {
            return Err(err.clone());
        }
    }

    let (left, right) = match (left, right) {
        (Value::Empty, Value::Empty) => return Ok(Ordering::Equal),
        (Value::Empty, other) => (blank_like(other), other.clone()),
        (other, Value::Empty) => (other.clone(), blank_like(other)),
        (l, r) => (l.clone(), r.clone()),
    };

    let rank = |v: &Value| match v {
        Value::String(_) => TypeRank::Text,
        Value::Bool(_) => TypeRank::Bool,
        _ => TypeRank::Number,
    };

    match (&left, &right) {
        (Value::String(a), Value::String(b)) => Ok(a.to_lowercase().cmp(&b.to_lowercase())),
        (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        _ if rank(&left) == TypeRank::Number && rank(&right) == TypeRank::Number => {
            let a = left.as_number().unwrap_or(0.0);
            let b = right.as_number().unwrap_or(0.0);
            a.partial_cmp(&b).ok_or(ErrorValue::Num)
        }
        _ => Ok(rank(&left).cmp(&rank(&right))),
    }
}

fn blank_like(other: &Value) -> Value {
    match other {
        Value::String(_) => Value::String(String::new()),
        Value::Bool(_) => Value::Bool(false),
        _ => Value::Int(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_number_coercions() {
        assert_eq!(to_number(&Value::Empty), Ok(0.0));
        assert_eq!(to_number(&Value::Bool(true)), Ok(1.0));
        assert_eq!(to_number(&Value::from(" 2.5 ")), Ok(2.5));
        assert_eq!(to_number(&Value::from("text")), Err(ErrorValue::Value));
        assert_eq!(to_number(&Value::from("inf")), Err(ErrorValue::Value));
        assert_eq!(to_number(&Value::from("")), Err(ErrorValue::Value));
        assert_eq!(
            to_number(&Value::Error(ErrorValue::Ref)),
            Err(ErrorValue::Ref)
        );
    }

    #[test]
    fn test_scalar_collapses_single_cell_range() {
        let single = Value::Array(vec![Value::Int(4)]);
        assert_eq!(to_number(&single), Ok(4.0));
        let wide = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(to_number(&wide), Err(ErrorValue::Value));
    }

    #[test]
    fn test_to_text_and_bool() {
        assert_eq!(to_text(&Value::Float(1.5)).unwrap(), "1.5");
        assert_eq!(to_text(&Value::Bool(false)).unwrap(), "FALSE");
        assert_eq!(to_text(&Value::Empty).unwrap(), "");
        assert_eq!(to_bool(&Value::from("true")), Ok(true));
        assert_eq!(to_bool(&Value::Int(0)), Ok(false));
        assert_eq!(to_bool(&Value::from("yes")), Err(ErrorValue::Value));
    }

    #[test]
    fn test_compare_values_ordering() {
        assert_eq!(
            compare_values(&Value::Int(2), &Value::Float(2.0)),
            Ok(Ordering::Equal)
        );
        assert_eq!(
            compare_values(&Value::from("abc"), &Value::from("ABC")),
            Ok(Ordering::Equal)
        );
        assert_eq!(
            compare_values(&Value::Int(1_000), &Value::from("a")),
            Ok(Ordering::Less)
        );
        assert_eq!(
            compare_values(&Value::from("z"), &Value::Bool(false)),
            Ok(Ordering::Less)
        );
        assert_eq!(
            compare_values(&Value::Empty, &Value::Int(0)),
            Ok(Ordering::Equal)
        );
        assert_eq!(
            compare_values(&Value::Empty, &Value::from("")),
            Ok(Ordering::Equal)
        );
        assert_eq!(
            compare_values(&Value::Error(ErrorValue::Div0), &Value::Int(1)),
            Err(ErrorValue::Div0)
        );
    }

    #[test]
    fn test_walk_values_flattens() {
        let values = vec![
            Value::Int(1),
            Value::Array(vec![Value::Int(2), Value::Array(vec![Value::Int(3)])]),
        ];
        let mut seen = Vec::new();
        walk_values(&values, &mut |v| seen.push(v.clone()));
        assert_eq!(seen, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn test_finite() {
        assert_eq!(finite(1.5), Value::Float(1.5));
        assert_eq!(finite(f64::NAN), Value::Error(ErrorValue::Num));
        assert_eq!(finite(f64::INFINITY), Value::Error(ErrorValue::Num));
    }
}
