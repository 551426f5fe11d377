use gridcalc_primitives::{CellReference, RangeReference, Value};
use serde::{Deserialize, Serialize};

/// Formula expression AST
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FormulaExpr {
    /// Literal value
    Literal(Value),
    /// Cell reference
    CellRef(CellReference),
    /// Range reference, always normalized
    RangeRef(RangeReference),
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        expr: Box<FormulaExpr>,
    },
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Function call; the name is kept as written
    FunctionCall {
        name: String,
        args: Vec<FormulaExpr>,
    },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Concat,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    Negate,
    Plus,
}

/// A grid location read by a formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reference {
    Cell(CellReference),
    Range(RangeReference),
}

impl FormulaExpr {
    /// Cells and ranges this expression reads, in source order.
    ///
    /// The engine keeps no dependency graph; a grid that wants targeted
    /// invalidation can build one from this list.
    pub fn references(&self) -> Vec<Reference> {
        let mut refs = Vec::new();
        collect_references(self, &mut refs);
        refs
    }
}

fn collect_references(expr: &FormulaExpr, refs: &mut Vec<Reference>) {
    match expr {
        FormulaExpr::Literal(_) => {}
        FormulaExpr::CellRef(r) => refs.push(Reference::Cell(*r)),
        FormulaExpr::RangeRef(r) => refs.push(Reference::Range(*r)),
        FormulaExpr::UnaryOp { expr, .. } => collect_references(expr, refs),
        FormulaExpr::BinaryOp { left, right, .. } => {
            collect_references(left, refs);
            collect_references(right, refs);
        }
        FormulaExpr::FunctionCall { args, .. } => {
            for arg in args {
                collect_references(arg, refs);
            }
        }
    }
}
