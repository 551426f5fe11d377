use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gridcalc_formulas::{parse_formula, CellInput, EmptyGrid, FormulaEngine};
use gridcalc_primitives::{CellAddress, Value};
use std::collections::HashMap;

/// Column A filled with `size` numbers
fn number_column(size: usize) -> HashMap<CellAddress, CellInput> {
    (0..size)
        .map(|i| {
            (
                CellAddress::new(i as u32, 0),
                CellInput::Value(Value::Float((i as f64) * 1.5)),
            )
        })
        .collect()
}

/// Column A where every cell adds one to the cell below it
fn formula_chain(len: usize) -> HashMap<CellAddress, CellInput> {
    let mut cells: HashMap<CellAddress, CellInput> = (0..len)
        .map(|i| {
            (
                CellAddress::new(i as u32, 0),
                CellInput::Formula(format!("=A{}+1", i + 2)),
            )
        })
        .collect();
    cells.insert(CellAddress::new(len as u32, 0), CellInput::Value(Value::Int(0)));
    cells
}

fn bench_parse_formulas(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    group.bench_function("simple", |b| b.iter(|| parse_formula(black_box("=1+2"))));

    group.bench_function("cell_ref", |b| {
        b.iter(|| parse_formula(black_box("=A1+B2")))
    });

    group.bench_function("function_call", |b| {
        b.iter(|| parse_formula(black_box("=SUM(A1:A10)")))
    });

    group.bench_function("complex", |b| {
        b.iter(|| {
            parse_formula(black_box(
                "=IF(AND(A1>0,B1<100),SUM(C1:C10)*1.1,MAX(D1:D10)/MIN(E1:E10))",
            ))
        })
    });

    group.finish();
}

fn bench_evaluate_formulas(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let engine = FormulaEngine::new();
    let grid = number_column(10);

    // Pre-parse formulas
    let simple = parse_formula("=1+2").unwrap();
    let cell_add = parse_formula("=A1+A2").unwrap();
    let text = parse_formula("=TEXTJOIN(\", \", TRUE, UPPER(\"a\"), LEFT(\"Hello\", 3))").unwrap();
    let logical = parse_formula("=IF(AND(A1>=0, A2<100), ROUND(A3/7, 2), 0)").unwrap();

    group.bench_function("literal", |b| {
        b.iter(|| engine.evaluate_expr(black_box(&simple), &EmptyGrid))
    });

    group.bench_function("cell_add", |b| {
        b.iter(|| engine.evaluate_expr(black_box(&cell_add), &grid))
    });

    group.bench_function("text", |b| {
        b.iter(|| engine.evaluate_expr(black_box(&text), &EmptyGrid))
    });

    group.bench_function("logical", |b| {
        b.iter(|| engine.evaluate_expr(black_box(&logical), &grid))
    });

    group.finish();
}

fn bench_range_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_ops");
    let engine = FormulaEngine::new();

    for size in [10, 100, 1000, 10000] {
        let grid = number_column(size);
        let sum = parse_formula(&format!("=SUM(A1:A{size})")).unwrap();
        group.bench_with_input(BenchmarkId::new("sum", size), &size, |b, _| {
            b.iter(|| engine.evaluate_expr(black_box(&sum), &grid))
        });
    }

    // rejected by the range guard before any cell is read
    let oversized = parse_formula("=SUM(A1:ZZ100000)").unwrap();
    group.bench_function("oversized", |b| {
        b.iter(|| engine.evaluate_expr(black_box(&oversized), &EmptyGrid))
    });

    group.finish();
}

fn bench_dependency_chains(c: &mut Criterion) {
    let mut group = c.benchmark_group("chains");
    let engine = FormulaEngine::new();

    for len in [10, 50, 100] {
        let grid = formula_chain(len);
        group.bench_with_input(BenchmarkId::new("depth", len), &len, |b, _| {
            b.iter(|| engine.evaluate_cell(black_box(CellAddress::new(0, 0)), &grid))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_formulas,
    bench_evaluate_formulas,
    bench_range_operations,
    bench_dependency_chains
);
criterion_main!(benches);
