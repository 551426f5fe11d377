use super::{arg, propagate, to_bool, try_value, walk_values};
use crate::context::EvaluationContext;
use gridcalc_primitives::{ErrorValue, Value};

/// IF(condition, value_if_true, [value_if_false])
///
/// Arguments are evaluated eagerly, so an error in either branch propagates
/// even when that branch is not chosen.
pub fn if_fn(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    let condition = try_value!(to_bool(arg(values, 0)));
    if condition {
        arg(values, 1).clone()
    } else {
        values.get(2).cloned().unwrap_or(Value::Bool(false))
    }
}

/// AND implementation. Text and empty cells inside ranges are ignored.
pub fn and_fn(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    match fold_logicals(values) {
        Ok(flags) if flags.is_empty() => Value::Error(ErrorValue::Value),
        Ok(flags) => Value::Bool(flags.iter().all(|b| *b)),
        Err(err) => Value::Error(err),
    }
}

/// OR implementation. Text and empty cells inside ranges are ignored.
pub fn or_fn(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    match fold_logicals(values) {
        Ok(flags) if flags.is_empty() => Value::Error(ErrorValue::Value),
        Ok(flags) => Value::Bool(flags.iter().any(|b| *b)),
        Err(err) => Value::Error(err),
    }
}

/// NOT implementation.
pub fn not_fn(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    Value::Bool(!try_value!(to_bool(arg(values, 0))))
}

/// Direct arguments must be logical-coercible; range members that are text
/// or empty are skipped.
fn fold_logicals(values: &[Value]) -> Result<Vec<bool>, ErrorValue> {
    let mut flags = Vec::new();
    for value in values {
        match value {
            Value::Array(items) => {
                let mut failed = None;
                walk_values(items, &mut |item| match item {
                    Value::Empty | Value::String(_) => {}
                    other => match to_bool(other) {
                        Ok(flag) => flags.push(flag),
                        Err(err) => {
                            failed.get_or_insert(err);
                        }
                    },
                });
                if let Some(err) = failed {
                    return Err(err);
                }
            }
            other => flags.push(to_bool(other)?),
        }
    }
    Ok(flags)
}
