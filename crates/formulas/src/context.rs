//! Evaluation context: per-call guard state and the recursive evaluator.
//!
//! A context is created for one top-level evaluation. It threads the
//! recursion depth, the evaluation budget, the set of cells currently being
//! evaluated (for cycle detection) and a memo of finished cell values through
//! every nested cell lookup, including lookups made by range resolution.

use crate::ast::FormulaExpr;
use crate::functions::scalar;
use crate::operators::{apply_binary, apply_unary};
use crate::parser::parse_formula_with_nesting;
use crate::range::RangeResolver;
use crate::registry::FunctionRegistry;
use crate::{EngineLimits, FormulaError};
use gridcalc_primitives::{CellAddress, ErrorValue, Value};
use std::collections::{HashMap, HashSet};
use std::ops::{Deref, DerefMut};

/// Raw content of one grid cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellInput {
    Empty,
    /// Literal value
    Value(Value),
    /// Formula source, with or without the leading `=`
    Formula(String),
}

impl CellInput {
    /// Classify raw cell text: empty, formula (leading `=`), boolean, integer,
    /// float, otherwise text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellInput::Empty;
        }
        if trimmed.starts_with('=') {
            return CellInput::Formula(trimmed.to_string());
        }
        if trimmed.eq_ignore_ascii_case("TRUE") {
            return CellInput::Value(Value::Bool(true));
        }
        if trimmed.eq_ignore_ascii_case("FALSE") {
            return CellInput::Value(Value::Bool(false));
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return CellInput::Value(Value::Int(n));
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => CellInput::Value(Value::Float(f)),
            _ => CellInput::Value(Value::String(raw.to_string())),
        }
    }
}

/// The grid as seen by the engine.
///
/// Providers hand back raw cell content; the context evaluates formula cells
/// itself so depth, budget and cycle state thread through every lookup.
/// Evaluation only reads through this trait.
pub trait CellValueProvider {
    /// Content at `addr`, or `None` when the address is outside the grid.
    fn cell_input(&self, addr: &CellAddress) -> Option<CellInput>;
}

impl<P: CellValueProvider + ?Sized> CellValueProvider for &P {
    fn cell_input(&self, addr: &CellAddress) -> Option<CellInput> {
        (**self).cell_input(addr)
    }
}

/// Unbounded sparse grid; missing cells are empty.
impl CellValueProvider for HashMap<CellAddress, CellInput> {
    fn cell_input(&self, addr: &CellAddress) -> Option<CellInput> {
        Some(self.get(addr).cloned().unwrap_or(CellInput::Empty))
    }
}

/// A grid with no content at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyGrid;

impl CellValueProvider for EmptyGrid {
    fn cell_input(&self, _: &CellAddress) -> Option<CellInput> {
        Some(CellInput::Empty)
    }
}

/// Transient state for one top-level evaluation
pub struct EvaluationContext<'a> {
    provider: &'a dyn CellValueProvider,
    registry: &'a FunctionRegistry,
    limits: EngineLimits,
    resolver: RangeResolver,
    depth: usize,
    evaluations: usize,
    visiting: HashSet<CellAddress>,
    cache: HashMap<CellAddress, Value>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(
        provider: &'a dyn CellValueProvider,
        registry: &'a FunctionRegistry,
        limits: EngineLimits,
    ) -> Self {
        Self {
            provider,
            registry,
            limits,
            resolver: RangeResolver::new(limits.max_range_cells),
            depth: 0,
            evaluations: 0,
            visiting: HashSet::new(),
            cache: HashMap::new(),
        }
    }

    pub fn limits(&self) -> &EngineLimits {
        &self.limits
    }

    /// Current cell-to-cell nesting depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Formula cells evaluated so far in this call
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Whether `addr` is on the current evaluation path
    pub fn is_visiting(&self, addr: &CellAddress) -> bool {
        self.visiting.contains(addr)
    }

    /// Clear counters, the visitation set and the memo so the context can
    /// serve another top-level call.
    pub fn reset(&mut self) {
        self.depth = 0;
        self.evaluations = 0;
        self.visiting.clear();
        self.cache.clear();
    }

    /// Evaluate an expression as a whole formula and reset the context.
    ///
    /// Ranges collapse to a scalar and an empty result reads as `0`.
    pub fn evaluate_root(&mut self, expr: &FormulaExpr) -> Value {
        let value = finalize(self.evaluate(expr));
        self.reset();
        value
    }

    /// Evaluate a grid cell as the root of a call and reset the context.
    ///
    /// The cell itself is on the evaluation path, so a self-reference is
    /// `#CYCLE!`.
    pub fn evaluate_cell_root(&mut self, addr: &CellAddress) -> Value {
        let value = self.cell_value(addr);
        self.reset();
        value
    }

    /// Evaluate an expression node. Range references yield [`Value::Array`].
    pub fn evaluate(&mut self, expr: &FormulaExpr) -> Value {
        match expr {
            FormulaExpr::Literal(value) => value.clone(),
            FormulaExpr::CellRef(reference) => self.cell_value(&reference.addr),
            FormulaExpr::RangeRef(range) => {
                let resolver = self.resolver;
                match resolver.resolve(self, &range.start, &range.end) {
                    Ok(values) => Value::Array(values),
                    Err(err) => Value::Error(err),
                }
            }
            FormulaExpr::UnaryOp { op, expr } => {
                let value = self.evaluate(expr);
                apply_unary(*op, &value)
            }
            FormulaExpr::BinaryOp { op, left, right } => {
                let left = self.evaluate(left);
                if let Value::Error(err) = left {
                    return Value::Error(err);
                }
                let right = self.evaluate(right);
                apply_binary(self, *op, &left, &right)
            }
            FormulaExpr::FunctionCall { name, args } => self.call_function(name, args),
        }
    }

    fn call_function(&mut self, name: &str, args: &[FormulaExpr]) -> Value {
        let registry = self.registry;
        let Some(def) = registry.get(name) else {
            return FormulaError::UnknownFunction(name.to_uppercase()).into();
        };
        if let Err(expected) = def.validate_arg_count(args.len()) {
            let err = FormulaError::InvalidArgCount {
                name: name.to_uppercase(),
                expected,
                got: args.len(),
            };
            tracing::debug!(error = %err, "function arity mismatch");
            return err.into();
        }

        let values: Vec<Value> = args.iter().map(|arg| self.evaluate(arg)).collect();
        (def.eval)(self, &values)
    }

    /// Value of the cell at `addr`, evaluating its formula under the cycle,
    /// depth and budget guards. Out-of-grid addresses are `#REF!`.
    pub fn cell_value(&mut self, addr: &CellAddress) -> Value {
        match self.provider.cell_input(addr) {
            None => {
                tracing::debug!(cell = %addr, "reference outside grid");
                Value::Error(ErrorValue::Ref)
            }
            Some(CellInput::Empty) => Value::Empty,
            Some(CellInput::Value(value)) => value,
            Some(CellInput::Formula(source)) => self.formula_cell_value(*addr, &source),
        }
    }

    fn formula_cell_value(&mut self, addr: CellAddress, source: &str) -> Value {
        if let Some(value) = self.cache.get(&addr) {
            return value.clone();
        }
        if self.visiting.contains(&addr) {
            tracing::debug!(cell = %addr, "circular reference");
            return Value::Error(ErrorValue::Cycle);
        }
        if self.depth >= self.limits.max_depth {
            tracing::debug!(cell = %addr, limit = self.limits.max_depth, "dependency chain too deep");
            return Value::Error(ErrorValue::Depth);
        }
        if self.evaluations >= self.limits.max_evaluations {
            tracing::debug!(
                cell = %addr,
                limit = self.limits.max_evaluations,
                "evaluation budget exhausted"
            );
            return Value::Error(ErrorValue::Calc);
        }

        let value = {
            let max_nesting = self.limits.max_nesting;
            let mut scope = self.enter(addr);
            match parse_formula_with_nesting(source, max_nesting) {
                Ok(expr) => finalize(scope.evaluate(&expr)),
                Err(err) => err.into(),
            }
        };

        let path_dependent = matches!(&value, Value::Error(err) if err.is_path_dependent());
        if !path_dependent {
            self.cache.insert(addr, value.clone());
        }
        value
    }

    /// Put `addr` on the evaluation path until the returned scope drops.
    fn enter(&mut self, addr: CellAddress) -> CellScope<'_, 'a> {
        self.visiting.insert(addr);
        self.depth += 1;
        self.evaluations += 1;
        CellScope { ctx: self, addr }
    }
}

/// Keeps a cell on the evaluation path; leaving the scope, by any route,
/// takes it off again.
struct CellScope<'c, 'a> {
    ctx: &'c mut EvaluationContext<'a>,
    addr: CellAddress,
}

impl<'a> Deref for CellScope<'_, 'a> {
    type Target = EvaluationContext<'a>;

    fn deref(&self) -> &Self::Target {
        &*self.ctx
    }
}

impl DerefMut for CellScope<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.ctx
    }
}

impl Drop for CellScope<'_, '_> {
    fn drop(&mut self) {
        self.ctx.visiting.remove(&self.addr);
        self.ctx.depth -= 1;
    }
}

/// Shape a formula result for a cell: ranges collapse to one value and an
/// empty result reads as `0`.
fn finalize(value: Value) -> Value {
    let value = match &value {
        Value::Array(_) => match scalar(&value) {
            Ok(single) => single.clone(),
            Err(err) => Value::Error(err),
        },
        _ => value,
    };
    match value {
        Value::Empty => Value::Int(0),
        other => other,
    }
}
