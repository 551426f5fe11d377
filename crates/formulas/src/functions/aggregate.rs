//! Aggregations. Text, booleans and empty cells are skipped silently.

use super::{finite, propagate, walk_values};
use crate::context::EvaluationContext;
use gridcalc_primitives::{ErrorValue, Value};

/// Running total that stays integral until a float or an overflow shows up.
enum Accumulator {
    Int(i64),
    Float(f64),
}

impl Accumulator {
    fn fold(
        &mut self,
        value: &Value,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
    ) {
        *self = match (&*self, value) {
            (Accumulator::Int(acc), Value::Int(n)) => match int_op(*acc, *n) {
                Some(result) => Accumulator::Int(result),
                None => Accumulator::Float(float_op(*acc as f64, *n as f64)),
            },
            (Accumulator::Int(acc), Value::Float(f)) => Accumulator::Float(float_op(*acc as f64, *f)),
            (Accumulator::Float(acc), Value::Int(n)) => Accumulator::Float(float_op(*acc, *n as f64)),
            (Accumulator::Float(acc), Value::Float(f)) => Accumulator::Float(float_op(*acc, *f)),
            _ => return,
        };
    }

    fn into_value(self) -> Value {
        match self {
            Accumulator::Int(n) => Value::Int(n),
            Accumulator::Float(f) => finite(f),
        }
    }
}

fn is_number(value: &Value) -> bool {
    matches!(value, Value::Int(_) | Value::Float(_))
}

/// Sum function - adds all numeric values
pub fn sum(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    let mut total = Accumulator::Int(0);
    walk_values(values, &mut |value| {
        total.fold(value, i64::checked_add, |a, b| a + b);
    });
    total.into_value()
}

/// PRODUCT function - multiplies all numeric values, 0 when there are none
pub fn product(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    let mut result = Accumulator::Int(1);
    let mut has_number = false;
    walk_values(values, &mut |value| {
        has_number |= is_number(value);
        result.fold(value, i64::checked_mul, |a, b| a * b);
    });
    if has_number {
        result.into_value()
    } else {
        Value::Int(0)
    }
}

/// Average function - mean of numeric values, `#DIV/0!` when there are none
pub fn average(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    let mut total = 0.0;
    let mut count = 0usize;
    walk_values(values, &mut |value| {
        if let Some(num) = value.as_number() {
            total += num;
            count += 1;
        }
    });

    if count == 0 {
        Value::Error(ErrorValue::Div0)
    } else {
        finite(total / count as f64)
    }
}

/// Count function - counts numeric values
pub fn count(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    let mut count = 0i64;
    walk_values(values, &mut |value| {
        if is_number(value) {
            count += 1;
        }
    });
    Value::Int(count)
}

/// COUNTA - counts non-empty values
pub fn counta(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    let mut count = 0i64;
    walk_values(values, &mut |value| {
        if !matches!(value, Value::Empty) {
            count += 1;
        }
    });
    Value::Int(count)
}

/// Max function - largest numeric value, 0 when there are none
pub fn max(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    extreme(values, |candidate, best| candidate > best)
}

/// Min function - smallest numeric value, 0 when there are none
pub fn min(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    extreme(values, |candidate, best| candidate < best)
}

fn extreme(values: &[Value], better: fn(f64, f64) -> bool) -> Value {
    propagate!(values);
    let mut best: Option<(f64, Value)> = None;
    walk_values(values, &mut |value| {
        let Some(num) = value.as_number() else {
            return;
        };
        let replace = match &best {
            Some((current, _)) => better(num, *current),
            None => true,
        };
        if replace {
            best = Some((num, value.clone()));
        }
    });
    best.map_or(Value::Int(0), |(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EmptyGrid;
    use crate::{EngineLimits, FunctionRegistry};

    fn call(f: crate::FunctionImpl, values: &[Value]) -> Value {
        let registry = FunctionRegistry::default();
        let ctx = EvaluationContext::new(&EmptyGrid, &registry, EngineLimits::default());
        f(&ctx, values)
    }

    #[test]
    fn test_sum_skips_text() {
        let values = vec![
            Value::Int(1),
            Value::from("text"),
            Value::Int(3),
            Value::from("foo"),
            Value::Int(5),
        ];
        assert_eq!(call(sum, &values), Value::Int(9));
    }

    #[test]
    fn test_sum_ranges_and_floats() {
        let values = vec![
            Value::Array(vec![Value::Int(1), Value::Empty, Value::Bool(true)]),
            Value::Float(0.5),
        ];
        assert_eq!(call(sum, &values), Value::Float(1.5));
    }

    #[test]
    fn test_sum_propagates_first_error() {
        let values = vec![
            Value::Int(1),
            Value::Array(vec![Value::Error(ErrorValue::Num)]),
            Value::Error(ErrorValue::Div0),
        ];
        assert_eq!(call(sum, &values), Value::Error(ErrorValue::Num));
    }

    #[test]
    fn test_sum_overflow_becomes_float() {
        let values = vec![Value::Int(i64::MAX), Value::Int(i64::MAX)];
        assert!(matches!(call(sum, &values), Value::Float(_)));
    }

    #[test]
    fn test_average() {
        let values = vec![Value::Int(2), Value::from("x"), Value::Int(4)];
        assert_eq!(call(average, &values), Value::Float(3.0));
        assert_eq!(
            call(average, &[Value::from("x")]),
            Value::Error(ErrorValue::Div0)
        );
    }

    #[test]
    fn test_count_and_counta() {
        let values = vec![
            Value::Int(1),
            Value::from("a"),
            Value::Empty,
            Value::Array(vec![Value::Float(2.0), Value::Bool(true), Value::Empty]),
        ];
        assert_eq!(call(count, &values), Value::Int(2));
        assert_eq!(call(counta, &values), Value::Int(4));
    }

    #[test]
    fn test_min_max() {
        let values = vec![Value::Int(3), Value::Float(-1.5), Value::from("99")];
        assert_eq!(call(max, &values), Value::Int(3));
        assert_eq!(call(min, &values), Value::Float(-1.5));
        assert_eq!(call(max, &[Value::from("a")]), Value::Int(0));
    }

    #[test]
    fn test_product() {
        assert_eq!(
            call(product, &[Value::Int(2), Value::Int(3), Value::Int(4)]),
            Value::Int(24)
        );
        assert_eq!(
            call(product, &[Value::Int(2), Value::Float(0.5)]),
            Value::Float(1.0)
        );
        assert_eq!(call(product, &[Value::from("a")]), Value::Int(0));
    }
}
