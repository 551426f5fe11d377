//! Single-value math functions with domain checks.

use super::{arg, arithmetic, finite, propagate, to_count, to_integer, to_number, try_value};
use crate::context::EvaluationContext;
use gridcalc_primitives::{ErrorValue, Value};
use std::f64::consts::PI;

fn unary(values: &[Value], f: fn(f64) -> Value) -> Value {
    propagate!(values);
    let n = try_value!(to_number(arg(values, 0)));
    f(n)
}

/// ABS function
pub fn abs(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    if let Some(n) = to_integer(arg(values, 0)).and_then(i64::checked_abs) {
        return Value::Int(n);
    }
    let n = try_value!(to_number(arg(values, 0)));
    finite(n.abs())
}

/// SQRT function - `#NUM!` for negative input
pub fn sqrt(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    unary(values, |n| {
        if n < 0.0 {
            Value::Error(ErrorValue::Num)
        } else {
            finite(n.sqrt())
        }
    })
}

/// INT function - rounds down to the nearest integer
pub fn int(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    unary(values, |n| finite(n.floor()))
}

/// SIGN function
pub fn sign(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    unary(values, |n| {
        Value::Int(if n > 0.0 {
            1
        } else if n < 0.0 {
            -1
        } else {
            0
        })
    })
}

pub fn exp(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    unary(values, |n| finite(n.exp()))
}

/// LN function - `#NUM!` for non-positive input
pub fn ln(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    unary(values, |n| if n > 0.0 { finite(n.ln()) } else { Value::Error(ErrorValue::Num) })
}

/// LOG10 function - `#NUM!` for non-positive input
pub fn log10(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    unary(values, |n| {
        if n > 0.0 {
            finite(n.log10())
        } else {
            Value::Error(ErrorValue::Num)
        }
    })
}

/// LOG(number, [base]) - base defaults to 10; base 1 is `#DIV/0!`
pub fn log(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    let n = try_value!(to_number(arg(values, 0)));
    let base = match values.get(1) {
        Some(value) => try_value!(to_number(value)),
        None => 10.0,
    };
    if n <= 0.0 || base <= 0.0 {
        return Value::Error(ErrorValue::Num);
    }
    if base == 1.0 {
        return Value::Error(ErrorValue::Div0);
    }
    finite(n.ln() / base.ln())
}

pub fn sin(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    unary(values, |n| finite(n.sin()))
}

pub fn cos(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    unary(values, |n| finite(n.cos()))
}

pub fn tan(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    unary(values, |n| finite(n.tan()))
}

/// ASIN function - `#NUM!` outside [-1, 1]
pub fn asin(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    unary(values, |n| {
        if (-1.0..=1.0).contains(&n) {
            finite(n.asin())
        } else {
            Value::Error(ErrorValue::Num)
        }
    })
}

/// ACOS function - `#NUM!` outside [-1, 1]
pub fn acos(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    unary(values, |n| {
        if (-1.0..=1.0).contains(&n) {
            finite(n.acos())
        } else {
            Value::Error(ErrorValue::Num)
        }
    })
}

pub fn atan(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    unary(values, |n| finite(n.atan()))
}

/// ATAN2(x, y) - angle of the point (x, y); the origin is `#DIV/0!`
pub fn atan2(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    let x = try_value!(to_number(arg(values, 0)));
    let y = try_value!(to_number(arg(values, 1)));
    if x == 0.0 && y == 0.0 {
        return Value::Error(ErrorValue::Div0);
    }
    finite(y.atan2(x))
}

pub fn degrees(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    unary(values, |n| finite(n.to_degrees()))
}

pub fn radians(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    unary(values, |n| finite(n.to_radians()))
}

pub fn pi(_: &EvaluationContext<'_>, _: &[Value]) -> Value {
    Value::Float(PI)
}

/// FACT function - factorial of the truncated input
pub fn fact(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    unary(values, |n| {
        if !(0.0..=170.0).contains(&n) {
            return Value::Error(ErrorValue::Num);
        }
        let n = n.trunc() as u32;
        let exact = (1..=i64::from(n)).try_fold(1i64, i64::checked_mul);
        match exact {
            Some(result) => Value::Int(result),
            None => finite((1..=n).fold(1.0, |acc, i| acc * f64::from(i))),
        }
    })
}

/// ROUND function - rounds half away from zero to `digits` places
pub fn round(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    rounded(values, f64::round)
}

/// ROUNDUP function - rounds away from zero
pub fn roundup(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    rounded(values, |x| if x < 0.0 { x.floor() } else { x.ceil() })
}

/// ROUNDDOWN function - rounds toward zero
pub fn rounddown(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    rounded(values, f64::trunc)
}

/// TRUNC function - same as ROUNDDOWN
pub fn trunc(ctx: &EvaluationContext<'_>, values: &[Value]) -> Value {
    rounddown(ctx, values)
}

fn rounded(values: &[Value], op: fn(f64) -> f64) -> Value {
    propagate!(values);
    let n = try_value!(to_number(arg(values, 0)));
    let digits = try_value!(to_count(arg(values, 1))).clamp(-308, 308) as i32;
    let factor = 10f64.powi(digits.abs());
    let result = if digits >= 0 {
        let scaled = n * factor;
        if !scaled.is_finite() {
            // more places than an f64 holds
            return finite(n);
        }
        op(scaled) / factor
    } else {
        op(n / factor) * factor
    };
    finite(result)
}

/// FLOOR(number, [significance]) - round down to a multiple of significance
pub fn floor(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    let n = try_value!(to_number(arg(values, 0)));
    let significance = match values.get(1) {
        Some(value) => try_value!(to_number(value)),
        None => 1.0,
    };
    if significance == 0.0 {
        return Value::Error(ErrorValue::Div0);
    }
    if n > 0.0 && significance < 0.0 {
        return Value::Error(ErrorValue::Num);
    }
    finite((n / significance).floor() * significance)
}

/// CEILING(number, [significance]) - round up to a multiple of significance
pub fn ceiling(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    let n = try_value!(to_number(arg(values, 0)));
    let significance = match values.get(1) {
        Some(value) => try_value!(to_number(value)),
        None => 1.0,
    };
    if significance == 0.0 {
        return Value::Int(0);
    }
    if n > 0.0 && significance < 0.0 {
        return Value::Error(ErrorValue::Num);
    }
    finite((n / significance).ceil() * significance)
}

/// POWER function
pub fn power(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    arithmetic::power(arg(values, 0), arg(values, 1))
}

/// MOD function - remainder carrying the sign of the divisor
pub fn mod_fn(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    let (dividend, divisor) = (arg(values, 0), arg(values, 1));
    if let (Some(a), Some(b)) = (to_integer(dividend), to_integer(divisor)) {
        if b == 0 {
            return Value::Error(ErrorValue::Div0);
        }
        if let Some(r) = a.checked_rem(b) {
            return Value::Int(if r != 0 && (r < 0) != (b < 0) { r + b } else { r });
        }
    }
    let a = try_value!(to_number(dividend));
    let b = try_value!(to_number(divisor));
    if b == 0.0 {
        return Value::Error(ErrorValue::Div0);
    }
    finite(a - b * (a / b).floor())
}
