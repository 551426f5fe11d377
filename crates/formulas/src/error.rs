//! Formula errors and the error-sentinel propagation rule.

use gridcalc_primitives::{ErrorValue, Value};

/// Failures raised while turning formula text into an AST or dispatching a
/// call. They never leave the engine: [`crate::FormulaEngine`] converts them
/// into [`ErrorValue`] sentinels.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormulaError {
    #[error("{message} at position {pos}")]
    Lex { pos: usize, message: String },
    #[error("{0}")]
    Parse(String),
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    #[error("Invalid argument count for {name}: expected {expected}, got {got}")]
    InvalidArgCount {
        name: String,
        expected: String,
        got: usize,
    },
}

impl From<FormulaError> for ErrorValue {
    fn from(err: FormulaError) -> Self {
        match err {
            FormulaError::InvalidArgCount { .. } => ErrorValue::Value,
            other => ErrorValue::Parse(other.to_string()),
        }
    }
}

impl From<FormulaError> for Value {
    fn from(err: FormulaError) -> Self {
        Value::Error(err.into())
    }
}

/// Return the first error sentinel among `values`, scanning left to right
/// and descending into arrays depth-first.
pub fn get_error(values: &[Value]) -> Option<ErrorValue> {
    for value in values {
        match value {
            Value::Error(err) => return Some(err.clone()),
            Value::Array(items) => {
                if let Some(err) = get_error(items) {
                    return Some(err);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_error_none() {
        let values = vec![Value::Int(1), Value::from("#VALUE!"), Value::Empty];
        assert_eq!(get_error(&values), None);
    }

    #[test]
    fn test_get_error_first_wins() {
        let values = vec![
            Value::Int(1),
            Value::Error(ErrorValue::Num),
            Value::Error(ErrorValue::Div0),
        ];
        assert_eq!(get_error(&values), Some(ErrorValue::Num));
    }

    #[test]
    fn test_get_error_nested_depth_first() {
        let values = vec![
            Value::Array(vec![Value::Int(2), Value::Error(ErrorValue::Ref)]),
            Value::Error(ErrorValue::Value),
        ];
        assert_eq!(get_error(&values), Some(ErrorValue::Ref));
    }

    #[test]
    fn test_formula_error_to_sentinel() {
        let err = FormulaError::Parse("Unexpected end of input".into());
        assert_eq!(
            ErrorValue::from(err),
            ErrorValue::Parse("Unexpected end of input".into())
        );

        let err = FormulaError::InvalidArgCount {
            name: "ABS".into(),
            expected: "1".into(),
            got: 3,
        };
        assert_eq!(ErrorValue::from(err), ErrorValue::Value);

        let err = FormulaError::Lex {
            pos: 3,
            message: "Unterminated string literal".into(),
        };
        assert_eq!(
            Value::from(err).to_string(),
            "#ERROR: Unterminated string literal at position 3"
        );
    }
}
