use crate::ast::{BinaryOperator, UnaryOperator};
use crate::context::EvaluationContext;
use crate::functions::arithmetic;
use crate::functions::{compare_values, finite, scalar, to_integer, to_number, to_text};
use crate::get_error;
use gridcalc_primitives::{ErrorValue, Value};
use std::cmp::Ordering;

fn first_error(operands: &[&Value]) -> Option<ErrorValue> {
    operands
        .iter()
        .find_map(|value| get_error(std::slice::from_ref(*value)))
}

pub(crate) fn apply_unary(op: UnaryOperator, value: &Value) -> Value {
    if let Some(err) = first_error(&[value]) {
        return Value::Error(err);
    }
    let value = match scalar(value) {
        Ok(value) => value,
        Err(err) => return Value::Error(err),
    };
    match op {
        UnaryOperator::Plus => value.clone(),
        UnaryOperator::Negate => {
            if let Some(n) = to_integer(value).and_then(i64::checked_neg) {
                return Value::Int(n);
            }
            match to_number(value) {
                Ok(n) => finite(-n),
                Err(err) => Value::Error(err),
            }
        }
    }
}

pub(crate) fn apply_binary(
    ctx: &EvaluationContext<'_>,
    op: BinaryOperator,
    left: &Value,
    right: &Value,
) -> Value {
    if let Some(err) = first_error(&[left, right]) {
        return Value::Error(err);
    }
    match op {
        BinaryOperator::Add => arithmetic::add(left, right),
        BinaryOperator::Subtract => arithmetic::subtract(left, right),
        BinaryOperator::Multiply => arithmetic::multiply(left, right),
        BinaryOperator::Divide => arithmetic::divide(left, right),
        BinaryOperator::Power => arithmetic::power(left, right),
        BinaryOperator::Concat => concat(ctx, left, right),
        BinaryOperator::Equal => compare(left, right, Ordering::is_eq),
        BinaryOperator::NotEqual => compare(left, right, Ordering::is_ne),
        BinaryOperator::LessThan => compare(left, right, Ordering::is_lt),
        BinaryOperator::LessThanOrEqual => compare(left, right, Ordering::is_le),
        BinaryOperator::GreaterThan => compare(left, right, Ordering::is_gt),
        BinaryOperator::GreaterThanOrEqual => compare(left, right, Ordering::is_ge),
    }
}

fn concat(ctx: &EvaluationContext<'_>, left: &Value, right: &Value) -> Value {
    let text = match (to_text(left), to_text(right)) {
        (Ok(mut a), Ok(b)) => {
            a.push_str(&b);
            a
        }
        (Err(err), _) | (_, Err(err)) => return Value::Error(err),
    };
    if text.chars().count() > ctx.limits().max_text_length {
        return Value::Error(ErrorValue::Value);
    }
    Value::String(text)
}

fn compare(left: &Value, right: &Value, test: fn(Ordering) -> bool) -> Value {
    match compare_values(left, right) {
        Ok(ordering) => Value::Bool(test(ordering)),
        Err(err) => Value::Error(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EmptyGrid;
    use crate::{EngineLimits, FunctionRegistry};

    fn binary(op: BinaryOperator, left: Value, right: Value) -> Value {
        let registry = FunctionRegistry::default();
        let ctx = EvaluationContext::new(&EmptyGrid, &registry, EngineLimits::default());
        apply_binary(&ctx, op, &left, &right)
    }

    #[test]
    fn test_unary() {
        assert_eq!(apply_unary(UnaryOperator::Negate, &Value::Int(3)), Value::Int(-3));
        assert_eq!(
            apply_unary(UnaryOperator::Negate, &Value::from("2.5")),
            Value::Float(-2.5)
        );
        assert_eq!(
            apply_unary(UnaryOperator::Negate, &Value::from("a")),
            Value::Error(ErrorValue::Value)
        );
        assert_eq!(
            apply_unary(UnaryOperator::Plus, &Value::from("a")),
            Value::from("a")
        );
        assert_eq!(
            apply_unary(UnaryOperator::Negate, &Value::Array(vec![Value::Int(1), Value::Int(2)])),
            Value::Error(ErrorValue::Value)
        );
        assert!(matches!(
            apply_unary(UnaryOperator::Negate, &Value::Int(i64::MIN)),
            Value::Float(_)
        ));
    }

    #[test]
    fn test_concat_operator() {
        assert_eq!(
            binary(BinaryOperator::Concat, Value::from("a"), Value::Float(1.5)),
            Value::from("a1.5")
        );
        assert_eq!(
            binary(BinaryOperator::Concat, Value::Bool(true), Value::Empty),
            Value::from("TRUE")
        );
        assert_eq!(
            binary(BinaryOperator::Concat, Value::Error(ErrorValue::Num), Value::from("x")),
            Value::Error(ErrorValue::Num)
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            binary(BinaryOperator::LessThan, Value::Int(1), Value::Int(2)),
            Value::Bool(true)
        );
        assert_eq!(
            binary(BinaryOperator::Equal, Value::from("A"), Value::from("a")),
            Value::Bool(true)
        );
        assert_eq!(
            binary(BinaryOperator::NotEqual, Value::Int(1), Value::from("1")),
            Value::Bool(true)
        );
        assert_eq!(
            binary(BinaryOperator::GreaterThanOrEqual, Value::Bool(false), Value::Int(100)),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_arithmetic_dispatch() {
        assert_eq!(
            binary(BinaryOperator::Subtract, Value::Int(5), Value::Int(7)),
            Value::Int(-2)
        );
        assert_eq!(
            binary(BinaryOperator::Divide, Value::Int(1), Value::Int(0)),
            Value::Error(ErrorValue::Div0)
        );
        assert_eq!(
            binary(BinaryOperator::Power, Value::Int(3), Value::Int(2)),
            Value::Int(9)
        );
    }
}
