//! # Gridcalc Formulas
//!
//! Formula tokenizing, parsing and evaluation engine.
//! Includes the registry of standard functions (SUM, ROUND, TEXTJOIN, etc.)
//!
//! Evaluation never fails: every problem, from a syntax error to a circular
//! reference, comes back as a [`Value::Error`] sentinel.

use gridcalc_primitives::{CellAddress, Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod ast;
pub mod context;
pub mod error;
pub mod functions;
pub mod limits;
mod operators;
pub mod parser;
pub mod range;
pub mod registry;
pub mod tokenizer;

pub use ast::{BinaryOperator, FormulaExpr, Reference, UnaryOperator};
pub use context::{CellInput, CellValueProvider, EmptyGrid, EvaluationContext};
pub use error::{get_error, FormulaError};
pub use limits::EngineLimits;
pub use parser::{parse_formula, parse_formula_with_nesting};
pub use range::RangeResolver;
pub use registry::{
    standard_registry, FunctionDefinition, FunctionImpl, FunctionMetadata, FunctionRegistry,
    ParamType, ReturnType,
};
pub use tokenizer::{tokenize, Token, TokenKind};

/// Parsed formula together with the references it reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledFormula {
    /// The original formula text
    pub source: String,
    pub ast: FormulaExpr,
    /// Cells and ranges read by the formula, in source order
    pub dependencies: Vec<Reference>,
}

/// Entry point for evaluating formulas against a grid.
///
/// The engine itself is immutable configuration: each evaluation builds a
/// fresh [`EvaluationContext`], so no state leaks between calls.
#[derive(Debug, Clone)]
pub struct FormulaEngine {
    functions: Arc<FunctionRegistry>,
    limits: EngineLimits,
}

impl FormulaEngine {
    /// Create an engine with the standard functions and default limits
    pub fn new() -> Self {
        Self {
            functions: standard_registry(),
            limits: EngineLimits::default(),
        }
    }

    #[must_use]
    pub fn with_limits(mut self, limits: EngineLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn with_registry(mut self, functions: Arc<FunctionRegistry>) -> Self {
        self.functions = functions;
        self
    }

    pub fn limits(&self) -> &EngineLimits {
        &self.limits
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Parse a formula and collect its references
    pub fn compile(&self, formula: &str) -> Result<CompiledFormula, FormulaError> {
        let ast = parse_formula_with_nesting(formula, self.limits.max_nesting)?;
        let dependencies = ast.references();
        Ok(CompiledFormula {
            source: formula.to_string(),
            ast,
            dependencies,
        })
    }

    /// Start a context over `provider` for callers driving evaluation by hand
    pub fn context<'a>(&'a self, provider: &'a dyn CellValueProvider) -> EvaluationContext<'a> {
        EvaluationContext::new(provider, &self.functions, self.limits)
    }

    /// Evaluate formula text (leading `=` optional) against `provider`.
    pub fn evaluate_formula(&self, formula: &str, provider: &dyn CellValueProvider) -> Value {
        match parse_formula_with_nesting(formula, self.limits.max_nesting) {
            Ok(expr) => self.evaluate_expr(&expr, provider),
            Err(err) => {
                tracing::debug!(formula, error = %err, "formula failed to parse");
                err.into()
            }
        }
    }

    /// Evaluate an already parsed formula
    pub fn evaluate_expr(&self, expr: &FormulaExpr, provider: &dyn CellValueProvider) -> Value {
        self.context(provider).evaluate_root(expr)
    }

    /// Evaluate the cell at `addr` as a top-level call.
    ///
    /// Unlike [`Self::evaluate_formula`], the cell is on the evaluation path
    /// from the start, so a formula reading its own cell is `#CYCLE!`.
    /// Literal cells come back as stored; empty cells as [`Value::Empty`].
    pub fn evaluate_cell(&self, addr: CellAddress, provider: &dyn CellValueProvider) -> Value {
        self.context(provider).evaluate_cell_root(&addr)
    }
}

impl Default for FormulaEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate formula text with the standard functions and default limits
pub fn evaluate_formula(formula: &str, provider: &dyn CellValueProvider) -> Value {
    FormulaEngine::new().evaluate_formula(formula, provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcalc_primitives::{CellReference, ErrorValue, RangeReference};
    use std::collections::HashMap;

    #[test]
    fn test_compile_collects_dependencies() {
        let engine = FormulaEngine::new();
        let compiled = engine.compile("=SUM(A1:B2) + C3").unwrap();
        assert_eq!(compiled.source, "=SUM(A1:B2) + C3");
        assert_eq!(
            compiled.dependencies,
            vec![
                Reference::Range(RangeReference::new(
                    CellReference::from_a1("A1").unwrap(),
                    CellReference::from_a1("B2").unwrap(),
                )),
                Reference::Cell(CellReference::from_a1("C3").unwrap()),
            ]
        );
        assert!(engine.compile("=SUM(").is_err());
    }

    #[test]
    fn test_evaluate_formula_literals() {
        assert_eq!(evaluate_formula("=1+2*3", &EmptyGrid), Value::Int(7));
        assert_eq!(evaluate_formula("2^3^2", &EmptyGrid), Value::Int(512));
        assert_eq!(
            evaluate_formula("=\"a\"&\"b\"", &EmptyGrid),
            Value::from("ab")
        );
        assert_eq!(evaluate_formula("=A1", &EmptyGrid), Value::Int(0));
    }

    #[test]
    fn test_parse_errors_become_sentinels() {
        let result = evaluate_formula("=(1+2", &EmptyGrid);
        assert!(matches!(result, Value::Error(ErrorValue::Parse(_))));
        let result = evaluate_formula("=NOPE(1)", &EmptyGrid);
        assert_eq!(
            result,
            Value::Error(ErrorValue::Parse("Unknown function: NOPE".into()))
        );
        assert_eq!(
            evaluate_formula("=SQRT(1, 2)", &EmptyGrid),
            Value::Error(ErrorValue::Value)
        );
    }

    #[test]
    fn test_nesting_follows_engine_limits() {
        let engine = FormulaEngine::new().with_limits(EngineLimits {
            max_nesting: 3,
            ..EngineLimits::default()
        });
        assert_eq!(engine.evaluate_formula("=((1+2))", &EmptyGrid), Value::Int(3));
        assert_eq!(
            engine.evaluate_formula("=((((1))))", &EmptyGrid),
            Value::Error(ErrorValue::Parse("Formula nested too deeply".into()))
        );
        assert!(engine.compile("=1+2+3+4").is_ok());
        assert!(engine.compile("=1+2+3+4+5").is_err());
    }

    #[test]
    fn test_custom_registry() {
        fn answer(_: &EvaluationContext<'_>, _: &[Value]) -> Value {
            Value::Int(42)
        }
        let mut registry = FunctionRegistry::empty();
        registry.register(
            "answer",
            FunctionDefinition::fixed(vec![], ReturnType::Number, answer),
        );
        let engine = FormulaEngine::new().with_registry(Arc::new(registry));
        assert_eq!(engine.evaluate_formula("=ANSWER()", &EmptyGrid), Value::Int(42));
        assert!(matches!(
            engine.evaluate_formula("=SUM(1)", &EmptyGrid),
            Value::Error(ErrorValue::Parse(_))
        ));
    }

    #[test]
    fn test_evaluate_cell_reads_grid() {
        let mut grid = HashMap::new();
        grid.insert(CellAddress::new(0, 0), CellInput::parse("=B1*2"));
        grid.insert(CellAddress::new(0, 1), CellInput::parse("21"));
        let engine = FormulaEngine::new();
        assert_eq!(engine.evaluate_cell(CellAddress::new(0, 0), &grid), Value::Int(42));
        assert_eq!(engine.evaluate_cell(CellAddress::new(0, 1), &grid), Value::Int(21));
        assert_eq!(engine.evaluate_cell(CellAddress::new(5, 5), &grid), Value::Empty);
    }
}
