//! Arithmetic helpers shared by the operators and `ADD`/`MINUS`/`MULTIPLY`/
//! `DIVIDE`/`POW`.
//!
//! Integer operands stay integral while the result is exact; overflow falls
//! back to float. Division always produces a float.

use super::{arg, finite, propagate, to_integer, to_number, try_value};
use crate::context::EvaluationContext;
use gridcalc_primitives::{ErrorValue, Value};

pub fn add(left: &Value, right: &Value) -> Value {
    integral_or_float(left, right, i64::checked_add, |a, b| a + b)
}

pub fn subtract(left: &Value, right: &Value) -> Value {
    integral_or_float(left, right, i64::checked_sub, |a, b| a - b)
}

pub fn multiply(left: &Value, right: &Value) -> Value {
    integral_or_float(left, right, i64::checked_mul, |a, b| a * b)
}

pub fn divide(left: &Value, right: &Value) -> Value {
    propagate!(&[left.clone(), right.clone()]);
    let dividend = try_value!(to_number(left));
    let divisor = try_value!(to_number(right));
    if divisor == 0.0 {
        return Value::Error(ErrorValue::Div0);
    }
    finite(dividend / divisor)
}

/// `0` to a negative power is `#DIV/0!`; `0^0` and complex results are `#NUM!`.
pub fn power(base: &Value, exponent: &Value) -> Value {
    propagate!(&[base.clone(), exponent.clone()]);
    let b = try_value!(to_number(base));
    let e = try_value!(to_number(exponent));
    if b == 0.0 {
        if e < 0.0 {
            return Value::Error(ErrorValue::Div0);
        }
        if e == 0.0 {
            return Value::Error(ErrorValue::Num);
        }
    }

    if let (Some(bi), Some(ei)) = (to_integer(base), to_integer(exponent)) {
        if let Ok(ei) = u32::try_from(ei) {
            if let Some(result) = bi.checked_pow(ei) {
                return Value::Int(result);
            }
        }
    }
    finite(b.powf(e))
}

fn integral_or_float(
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Value {
    propagate!(&[left.clone(), right.clone()]);
    if let (Some(a), Some(b)) = (to_integer(left), to_integer(right)) {
        if let Some(result) = int_op(a, b) {
            return Value::Int(result);
        }
    }
    let a = try_value!(to_number(left));
    let b = try_value!(to_number(right));
    finite(float_op(a, b))
}

pub fn add_fn(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    add(arg(values, 0), arg(values, 1))
}

pub fn minus_fn(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    subtract(arg(values, 0), arg(values, 1))
}

pub fn multiply_fn(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    multiply(arg(values, 0), arg(values, 1))
}

pub fn divide_fn(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    divide(arg(values, 0), arg(values, 1))
}

pub fn pow_fn(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    power(arg(values, 0), arg(values, 1))
}
