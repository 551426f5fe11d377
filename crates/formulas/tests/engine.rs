use std::cell::Cell;
use std::collections::HashMap;

use gridcalc_formulas::{
    evaluate_formula, parse_formula, CellInput, CellValueProvider, EmptyGrid, EngineLimits,
    FormulaEngine,
};
use gridcalc_primitives::{CellAddress, ErrorValue, Value};

fn grid(cells: &[(&str, &str)]) -> HashMap<CellAddress, CellInput> {
    cells
        .iter()
        .map(|(a1, raw)| {
            (
                CellAddress::from_a1(a1).expect("valid address"),
                CellInput::parse(raw),
            )
        })
        .collect()
}

fn addr(a1: &str) -> CellAddress {
    CellAddress::from_a1(a1).expect("valid address")
}

/// Counts every cell lookup the engine makes.
struct SpyGrid {
    calls: Cell<usize>,
}

impl SpyGrid {
    fn new() -> Self {
        Self {
            calls: Cell::new(0),
        }
    }
}

impl CellValueProvider for SpyGrid {
    fn cell_input(&self, _: &CellAddress) -> Option<CellInput> {
        self.calls.set(self.calls.get() + 1);
        Some(CellInput::Value(Value::Int(1)))
    }
}

/// A grid that ends after `rows` x `cols`
struct BoundedGrid {
    rows: u32,
    cols: u32,
}

impl CellValueProvider for BoundedGrid {
    fn cell_input(&self, addr: &CellAddress) -> Option<CellInput> {
        (addr.row < self.rows && addr.col < self.cols).then_some(CellInput::Value(Value::Int(2)))
    }
}

#[test]
fn test_division_by_zero() {
    assert_eq!(
        evaluate_formula("=1/0", &EmptyGrid),
        Value::Error(ErrorValue::Div0)
    );
}

#[test]
fn test_sqrt_of_negative() {
    assert_eq!(
        evaluate_formula("=SQRT(-1)", &EmptyGrid),
        Value::Error(ErrorValue::Num)
    );
}

#[test]
fn test_abs_of_text() {
    assert_eq!(
        evaluate_formula("=ABS(\"text\")", &EmptyGrid),
        Value::Error(ErrorValue::Value)
    );
}

#[test]
fn test_sum_skips_text() {
    assert_eq!(
        evaluate_formula("=SUM(1, \"text\", 3, \"foo\", 5)", &EmptyGrid),
        Value::Int(9)
    );
}

#[test]
fn test_two_cell_cycle() {
    let cells = grid(&[("A1", "=B1"), ("B1", "=A1")]);
    let engine = FormulaEngine::new();
    assert_eq!(
        engine.evaluate_cell(addr("A1"), &cells),
        Value::Error(ErrorValue::Cycle)
    );
    assert_eq!(
        engine.evaluate_cell(addr("B1"), &cells),
        Value::Error(ErrorValue::Cycle)
    );
    assert_eq!(
        engine.evaluate_formula("=A1", &cells),
        Value::Error(ErrorValue::Cycle)
    );
}

#[test]
fn test_oversized_range_never_reads_grid() {
    let spy = SpyGrid::new();
    let value = evaluate_formula("=SUM(A1:Z1000)", &spy);
    assert_eq!(value, Value::Error(ErrorValue::Ref));
    assert_eq!(spy.calls.get(), 0);
}

#[test]
fn test_range_guard_boundary() {
    let spy = SpyGrid::new();
    assert_eq!(evaluate_formula("=SUM(A1:A10000)", &spy), Value::Int(10_000));
    assert_eq!(spy.calls.get(), 10_000);

    let spy = SpyGrid::new();
    assert_eq!(
        evaluate_formula("=SUM(A1:A10001)", &spy),
        Value::Error(ErrorValue::Ref)
    );
    assert_eq!(spy.calls.get(), 0);

    let engine = FormulaEngine::new().with_limits(EngineLimits {
        max_range_cells: 6,
        ..EngineLimits::default()
    });
    assert_eq!(engine.evaluate_formula("=COUNT(B3:A1)", &spy), Value::Int(6));
    assert_eq!(
        engine.evaluate_formula("=COUNT(A1:A7)", &spy),
        Value::Error(ErrorValue::Ref)
    );
}

#[test]
fn test_transitive_cycle_symmetry() {
    let cells = grid(&[("A1", "=B1+1"), ("B1", "=C1*2"), ("C1", "=SUM(A1:A2)")]);
    let engine = FormulaEngine::new();
    for cell in ["A1", "B1", "C1"] {
        assert_eq!(
            engine.evaluate_cell(addr(cell), &cells),
            Value::Error(ErrorValue::Cycle),
            "cell {cell}"
        );
    }
}

#[test]
fn test_self_reference_is_cycle() {
    let cells = grid(&[("A1", "=A1")]);
    let engine = FormulaEngine::new();
    assert_eq!(
        engine.evaluate_cell(addr("A1"), &cells),
        Value::Error(ErrorValue::Cycle)
    );
}

#[test]
fn test_diamond_is_not_a_cycle() {
    let cells = grid(&[
        ("A1", "=B1+C1"),
        ("B1", "=D1"),
        ("C1", "=D1"),
        ("D1", "=5"),
    ]);
    let engine = FormulaEngine::new();
    assert_eq!(engine.evaluate_cell(addr("A1"), &cells), Value::Int(10));
}

#[test]
fn test_out_of_grid_reference() {
    let bounded = BoundedGrid { rows: 2, cols: 2 };
    assert_eq!(evaluate_formula("=A1+B2", &bounded), Value::Int(4));
    assert_eq!(
        evaluate_formula("=C1", &bounded),
        Value::Error(ErrorValue::Ref)
    );
    assert_eq!(
        evaluate_formula("=SUM(A1:C3)", &bounded),
        Value::Error(ErrorValue::Ref)
    );
}

#[test]
fn test_determinism() {
    let cells = grid(&[
        ("A1", "3"),
        ("A2", "4.5"),
        ("A3", "=A1*A2"),
        ("B1", "=TEXTJOIN(\"-\", TRUE, A1:A3)"),
    ]);
    let engine = FormulaEngine::new();
    for formula in ["=A3+1", "=B1", "=ROUND(A3/7, 3)", "=A1>A2"] {
        let first = engine.evaluate_formula(formula, &cells);
        let second = engine.evaluate_formula(formula, &cells);
        assert_eq!(first, second, "{formula}");
    }
    assert_eq!(
        engine.evaluate_formula("=B1", &cells),
        Value::from("3-4.5-13.5")
    );
}

#[test]
fn test_error_propagation_closure() {
    let cells = grid(&[("A1", "=1/0"), ("A2", "7")]);
    let engine = FormulaEngine::new();
    let div0 = Value::Error(ErrorValue::Div0);
    for formula in [
        "=A1+1",
        "=1-A1",
        "=A1*0",
        "=A1^0",
        "=-A1",
        "=A1&\"x\"",
        "=A1=A1",
        "=SUM(A2, A1)",
        "=SUM(A1:A2)",
        "=MAX(A1:A2)",
        "=ROUND(A1, 2)",
        "=LEN(A1)",
        "=IF(TRUE, 1, A1)",
        "=NOT(A1)",
    ] {
        assert_eq!(engine.evaluate_formula(formula, &cells), div0, "{formula}");
    }
}

#[test]
fn test_first_error_wins() {
    assert_eq!(
        evaluate_formula("=SQRT(-1)+1/0", &EmptyGrid),
        Value::Error(ErrorValue::Num)
    );
    assert_eq!(
        evaluate_formula("=SUM(1/0, SQRT(-1))", &EmptyGrid),
        Value::Error(ErrorValue::Div0)
    );
}

#[test]
fn test_error_looking_text_is_not_an_error() {
    let cells = grid(&[("A1", "#DIV/0!")]);
    assert_eq!(
        evaluate_formula("=A1&\"x\"", &cells),
        Value::from("#DIV/0!x")
    );
    assert_eq!(evaluate_formula("=LEN(A1)", &cells), Value::Int(7));
}

#[test]
fn test_idempotent_parse() {
    for formula in [
        "=SUM(A1:B10, 3) * -2 ^ 2",
        "=IF(A1 >= 10, \"big\", \"small\") & \"!\"",
        "=$A$1 + a2",
        "=PI()",
    ] {
        assert_eq!(parse_formula(formula), parse_formula(formula));
        assert!(parse_formula(formula).is_ok(), "{formula}");
    }
}

#[test]
fn test_formula_cells_and_ranges() {
    let cells = grid(&[
        ("A1", "10"),
        ("A2", "=A1*2"),
        ("A3", "=A2+A1"),
        ("B1", "label"),
        ("B2", "TRUE"),
    ]);
    let engine = FormulaEngine::new();
    assert_eq!(engine.evaluate_formula("=SUM(A1:A3)", &cells), Value::Int(60));
    assert_eq!(engine.evaluate_formula("=AVERAGE(A1:B3)", &cells), Value::Float(20.0));
    assert_eq!(engine.evaluate_formula("=COUNTA(A1:B3)", &cells), Value::Int(5));
    assert_eq!(engine.evaluate_formula("=A1:A1 * 2", &cells), Value::Int(20));
    assert_eq!(
        engine.evaluate_formula("=A1:A2", &cells),
        Value::Error(ErrorValue::Value)
    );
}

#[test]
fn test_case_insensitive_names_and_refs() {
    let cells = grid(&[("A1", "-4")]);
    assert_eq!(evaluate_formula("=abs(a1)", &cells), Value::Int(4));
    assert_eq!(evaluate_formula("=Abs($a$1)", &cells), Value::Int(4));
}
