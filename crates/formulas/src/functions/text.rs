//! Text functions. Positions and counts are in characters, not bytes.

use super::{arg, propagate, to_bool, to_count, to_text, try_value, walk_values};
use crate::context::EvaluationContext;
use gridcalc_primitives::{ErrorValue, Value};

/// Wrap built text, enforcing the configured length ceiling.
fn bounded(ctx: &EvaluationContext<'_>, text: String) -> Value {
    if text.chars().count() > ctx.limits().max_text_length {
        tracing::debug!(
            limit = ctx.limits().max_text_length,
            "text result exceeds length limit"
        );
        return Value::Error(ErrorValue::Value);
    }
    Value::String(text)
}

/// Non-negative count argument, `default` when omitted
fn count_arg(values: &[Value], idx: usize, default: usize) -> Result<usize, ErrorValue> {
    match values.get(idx) {
        None => Ok(default),
        Some(value) => usize::try_from(to_count(value)?).map_err(|_| ErrorValue::Value),
    }
}

/// 1-based position argument
fn position_arg(values: &[Value], idx: usize) -> Result<usize, ErrorValue> {
    let pos = to_count(arg(values, idx))?;
    if pos < 1 {
        return Err(ErrorValue::Value);
    }
    usize::try_from(pos - 1).map_err(|_| ErrorValue::Value)
}

/// LEN function - character count
pub fn len(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    let text = try_value!(to_text(arg(values, 0)));
    Value::Int(text.chars().count() as i64)
}

/// LEFT(text, [count]) - count defaults to 1
pub fn left(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    let text = try_value!(to_text(arg(values, 0)));
    let count = try_value!(count_arg(values, 1, 1));
    Value::String(text.chars().take(count).collect())
}

/// RIGHT(text, [count]) - count defaults to 1
pub fn right(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    let text = try_value!(to_text(arg(values, 0)));
    let count = try_value!(count_arg(values, 1, 1));
    let total = text.chars().count();
    Value::String(text.chars().skip(total.saturating_sub(count)).collect())
}

/// MID(text, start, count) - substring from a 1-based position
pub fn mid(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    let text = try_value!(to_text(arg(values, 0)));
    let start = try_value!(position_arg(values, 1));
    let count = try_value!(count_arg(values, 2, 0));
    Value::String(text.chars().skip(start).take(count).collect())
}

/// REPLACE(text, start, count, new_text)
pub fn replace(ctx: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    let text = try_value!(to_text(arg(values, 0)));
    let start = try_value!(position_arg(values, 1));
    let count = try_value!(count_arg(values, 2, 0));
    let new_text = try_value!(to_text(arg(values, 3)));

    let mut result: String = text.chars().take(start).collect();
    result.push_str(&new_text);
    result.extend(text.chars().skip(start.saturating_add(count)));
    bounded(ctx, result)
}

/// SUBSTITUTE(text, old_text, new_text, [instance])
///
/// Without `instance` every occurrence is replaced; with it only the n-th.
pub fn substitute(ctx: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    let text = try_value!(to_text(arg(values, 0)));
    let old_text = try_value!(to_text(arg(values, 1)));
    let new_text = try_value!(to_text(arg(values, 2)));
    if old_text.is_empty() {
        return Value::String(text);
    }

    let Some(instance) = values.get(3) else {
        return bounded(ctx, text.replace(&old_text, &new_text));
    };
    let instance = try_value!(to_count(instance));
    if instance < 1 {
        return Value::Error(ErrorValue::Value);
    }
    let nth = usize::try_from(instance - 1).unwrap_or(usize::MAX);
    match text.match_indices(&old_text).nth(nth) {
        Some((idx, _)) => {
            let mut result = String::with_capacity(text.len());
            result.push_str(&text[..idx]);
            result.push_str(&new_text);
            result.push_str(&text[idx + old_text.len()..]);
            bounded(ctx, result)
        }
        None => Value::String(text),
    }
}

pub fn upper(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    Value::String(try_value!(to_text(arg(values, 0))).to_uppercase())
}

pub fn lower(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    Value::String(try_value!(to_text(arg(values, 0))).to_lowercase())
}

/// TRIM function - strips outer spaces and collapses inner runs to one
pub fn trim(_: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    let text = try_value!(to_text(arg(values, 0)));
    let words: Vec<&str> = text.split(' ').filter(|w| !w.is_empty()).collect();
    Value::String(words.join(" "))
}

/// REPT(text, times)
pub fn rept(ctx: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    let text = try_value!(to_text(arg(values, 0)));
    let times = try_value!(count_arg(values, 1, 0));
    // refuse before allocating
    if text.chars().count().saturating_mul(times) > ctx.limits().max_text_length {
        return Value::Error(ErrorValue::Value);
    }
    Value::String(text.repeat(times))
}

/// CONCAT / CONCATENATE - ranges contribute every cell
pub fn concat(ctx: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    // no errors remain, so every walked cell renders as text
    let mut result = String::new();
    walk_values(values, &mut |value| result.push_str(&value.to_string()));
    bounded(ctx, result)
}

/// TEXTJOIN(delimiter, ignore_empty, text, ...)
pub fn textjoin(ctx: &EvaluationContext<'_>, values: &[Value]) -> Value {
    propagate!(values);
    let delimiter = try_value!(to_text(arg(values, 0)));
    let ignore_empty = try_value!(to_bool(arg(values, 1)));

    let mut parts = Vec::new();
    walk_values(values.get(2..).unwrap_or_default(), &mut |value| {
        let text = value.to_string();
        if !(ignore_empty && text.is_empty()) {
            parts.push(text);
        }
    });
    bounded(ctx, parts.join(&delimiter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::EmptyGrid;
    use crate::{EngineLimits, FunctionImpl, FunctionRegistry};

    fn call(f: FunctionImpl, values: &[Value]) -> Value {
        call_with(EngineLimits::default(), f, values)
    }

    fn call_with(limits: EngineLimits, f: FunctionImpl, values: &[Value]) -> Value {
        let registry = FunctionRegistry::default();
        let ctx = EvaluationContext::new(&EmptyGrid, &registry, limits);
        f(&ctx, values)
    }

    fn s(text: &str) -> Value {
        Value::from(text)
    }

    #[test]
    fn test_len_counts_chars() {
        assert_eq!(call(len, &[s("héllo")]), Value::Int(5));
        assert_eq!(call(len, &[Value::Int(1234)]), Value::Int(4));
        assert_eq!(call(len, &[Value::Empty]), Value::Int(0));
    }

    #[test]
    fn test_left_right_defaults() {
        assert_eq!(call(left, &[s("hello")]), s("h"));
        assert_eq!(call(right, &[s("hello")]), s("o"));
        assert_eq!(call(left, &[s("hello"), Value::Int(3)]), s("hel"));
        assert_eq!(call(right, &[s("hello"), Value::Int(10)]), s("hello"));
        assert_eq!(
            call(left, &[s("hello"), Value::Int(-1)]),
            Value::Error(ErrorValue::Value)
        );
    }

    #[test]
    fn test_mid() {
        assert_eq!(call(mid, &[s("spreadsheet"), Value::Int(7), Value::Int(5)]), s("sheet"));
        assert_eq!(call(mid, &[s("abc"), Value::Int(5), Value::Int(2)]), s(""));
        assert_eq!(
            call(mid, &[s("abc"), Value::Int(0), Value::Int(2)]),
            Value::Error(ErrorValue::Value)
        );
    }

    #[test]
    fn test_replace_and_substitute() {
        assert_eq!(
            call(replace, &[s("abcdef"), Value::Int(2), Value::Int(3), s("XY")]),
            s("aXYef")
        );
        assert_eq!(
            call(substitute, &[s("a-b-c"), s("-"), s("+")]),
            s("a+b+c")
        );
        assert_eq!(
            call(substitute, &[s("a-b-c"), s("-"), s("+"), Value::Int(2)]),
            s("a-b+c")
        );
        assert_eq!(
            call(substitute, &[s("a-b-c"), s("-"), s("+"), Value::Int(5)]),
            s("a-b-c")
        );
        assert_eq!(
            call(substitute, &[s("abc"), s(""), s("x")]),
            s("abc")
        );
    }

    #[test]
    fn test_case_and_trim() {
        assert_eq!(call(upper, &[s("MiXed")]), s("MIXED"));
        assert_eq!(call(lower, &[s("MiXed")]), s("mixed"));
        assert_eq!(call(trim, &[s("  a   b  ")]), s("a b"));
    }

    #[test]
    fn test_concat_and_textjoin() {
        assert_eq!(
            call(concat, &[s("a"), Value::Int(1), Value::Bool(true)]),
            s("a1TRUE")
        );
        assert_eq!(
            call(
                concat,
                &[Value::Array(vec![s("x"), Value::Empty, s("y")])]
            ),
            s("xy")
        );
        let parts = Value::Array(vec![s("a"), Value::Empty, s("b")]);
        assert_eq!(
            call(textjoin, &[s(", "), Value::Bool(true), parts.clone()]),
            s("a, b")
        );
        assert_eq!(
            call(textjoin, &[s("-"), Value::Bool(false), parts]),
            s("a--b")
        );
    }

    #[test]
    fn test_concat_error_inside_range() {
        let cells = Value::Array(vec![s("a"), Value::Error(ErrorValue::Ref), s("b")]);
        assert_eq!(
            call(concat, &[s("x"), cells.clone()]),
            Value::Error(ErrorValue::Ref)
        );
        assert_eq!(
            call(textjoin, &[s(","), Value::Bool(true), cells]),
            Value::Error(ErrorValue::Ref)
        );
    }

    #[test]
    fn test_text_length_limit() {
        let limits = EngineLimits {
            max_text_length: 5,
            ..EngineLimits::default()
        };
        assert_eq!(
            call_with(limits, rept, &[s("ab"), Value::Int(3)]),
            Value::Error(ErrorValue::Value)
        );
        assert_eq!(call_with(limits, rept, &[s("ab"), Value::Int(2)]), s("abab"));
        assert_eq!(
            call_with(limits, concat, &[s("abc"), s("def")]),
            Value::Error(ErrorValue::Value)
        );
    }

    #[test]
    fn test_error_argument_propagates() {
        assert_eq!(
            call(left, &[Value::Error(ErrorValue::Div0), Value::Int(1)]),
            Value::Error(ErrorValue::Div0)
        );
    }
}
