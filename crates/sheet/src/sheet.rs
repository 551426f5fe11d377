use crate::error::{Result, SheetError};
use crate::style::CellStyle;
use gridcalc_formulas::{CellInput, CellValueProvider, FormulaEngine, Reference};
use gridcalc_primitives::{column_index_to_letters, CellAddress, ErrorValue, Value};
use indexmap::IndexMap;

/// A rectangular grid of raw cell text with per-cell styles.
///
/// Cells hold exactly what the user typed: a literal or a formula starting
/// with `=`. Values are computed on demand by the sheet's [`FormulaEngine`];
/// nothing computed is stored, so edits never leave stale results behind.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub(crate) columns: Vec<String>,
    pub(crate) data: Vec<Vec<String>>,
    pub(crate) styles: IndexMap<(usize, usize), CellStyle>,
    engine: FormulaEngine,
}

impl Sheet {
    /// Create an empty grid of `rows` x `cols` with lettered column headers
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            columns: (0..cols).map(default_column_name).collect(),
            data: vec![vec![String::new(); cols]; rows],
            styles: IndexMap::new(),
            engine: FormulaEngine::new(),
        }
    }

    /// Build a grid from raw rows; short rows are padded with empty cells
    /// and missing headers are lettered.
    pub fn from_rows(columns: Vec<String>, data: Vec<Vec<String>>) -> Self {
        let mut sheet = Self {
            columns,
            data,
            styles: IndexMap::new(),
            engine: FormulaEngine::new(),
        };
        sheet.normalize();
        sheet
    }

    /// Replace the engine used for evaluation
    #[must_use]
    pub fn with_engine(mut self, engine: FormulaEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn engine(&self) -> &FormulaEngine {
        &self.engine
    }

    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    pub fn col_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn data(&self) -> &[Vec<String>] {
        &self.data
    }

    /// Pad every row to the widest of the header and the rows
    pub(crate) fn normalize(&mut self) {
        let width = self
            .data
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(self.columns.len());
        for idx in self.columns.len()..width {
            self.columns.push(default_column_name(idx));
        }
        for row in &mut self.data {
            row.resize(width, String::new());
        }
    }

    fn check_bounds(&self, row: usize, col: usize) -> Result<()> {
        if row < self.row_count() && col < self.col_count() {
            Ok(())
        } else {
            Err(self.out_of_bounds(row, col))
        }
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> SheetError {
        SheetError::IndexOutOfBounds {
            row,
            col,
            rows: self.row_count(),
            cols: self.col_count(),
        }
    }

    /// Engine address of an in-bounds cell
    fn address(&self, row: usize, col: usize) -> Result<CellAddress> {
        self.check_bounds(row, col)?;
        cell_address(row, col).ok_or_else(|| self.out_of_bounds(row, col))
    }

    // ===== Cell Access =====

    /// Raw text of a cell (0-based)
    pub fn raw(&self, row: usize, col: usize) -> Result<&str> {
        self.check_bounds(row, col)?;
        Ok(&self.data[row][col])
    }

    /// Replace the raw text of a cell (0-based)
    pub fn set_cell(&mut self, row: usize, col: usize, raw: impl Into<String>) -> Result<()> {
        self.check_bounds(row, col)?;
        self.data[row][col] = raw.into();
        Ok(())
    }

    pub fn style(&self, row: usize, col: usize) -> Option<&CellStyle> {
        self.styles.get(&(row, col))
    }

    pub fn set_style(&mut self, row: usize, col: usize, style: CellStyle) -> Result<()> {
        self.check_bounds(row, col)?;
        self.styles.insert((row, col), style);
        Ok(())
    }

    pub fn clear_style(&mut self, row: usize, col: usize) -> Option<CellStyle> {
        self.styles.shift_remove(&(row, col))
    }

    // ===== A1-Style Notation Access =====

    /// Zero-based (row, col) for an A1 address such as `"B3"` or `"$B$3"`
    pub fn a1_to_index(notation: &str) -> Result<(usize, usize)> {
        let addr = CellAddress::from_a1(notation)?;
        Ok((addr.row as usize, addr.col as usize))
    }

    /// A1 address for a zero-based (row, col); `None` past the addressable grid
    pub fn index_to_a1(row: usize, col: usize) -> Option<String> {
        cell_address(row, col).map(|addr| addr.to_a1())
    }

    pub fn raw_a1(&self, notation: &str) -> Result<&str> {
        let (row, col) = Self::a1_to_index(notation)?;
        self.raw(row, col)
    }

    pub fn set_a1(&mut self, notation: &str, raw: impl Into<String>) -> Result<()> {
        let (row, col) = Self::a1_to_index(notation)?;
        self.set_cell(row, col, raw)
    }

    pub fn evaluate_a1(&self, notation: &str) -> Result<Value> {
        let (row, col) = Self::a1_to_index(notation)?;
        self.evaluate(row, col)
    }

    pub fn display_a1(&self, notation: &str) -> Result<String> {
        let (row, col) = Self::a1_to_index(notation)?;
        self.display(row, col)
    }

    // ===== Evaluation =====

    /// Current value of a cell: literals as typed, formulas evaluated.
    ///
    /// Each call is an independent top-level evaluation.
    pub fn evaluate(&self, row: usize, col: usize) -> Result<Value> {
        let addr = self.address(row, col)?;
        Ok(self.engine.evaluate_cell(addr, self))
    }

    /// Evaluate ad-hoc formula text against this grid
    pub fn evaluate_formula(&self, formula: &str) -> Value {
        self.engine.evaluate_formula(formula, self)
    }

    /// Text shown for a cell.
    ///
    /// Error sentinels render verbatim. Numbers use the cell's `decimals`
    /// style when set.
    pub fn display(&self, row: usize, col: usize) -> Result<String> {
        let value = self.evaluate(row, col)?;
        Ok(self.format_value(row, col, &value))
    }

    fn format_value(&self, row: usize, col: usize, value: &Value) -> String {
        let fixed = value
            .as_number()
            .and_then(|n| self.style(row, col).and_then(|style| style.format_number(n)));
        fixed.unwrap_or_else(|| value.to_string())
    }

    /// Evaluate every cell, row-major
    pub fn recalculate(&self) -> Vec<Vec<Value>> {
        let values: Vec<Vec<Value>> = (0..self.row_count())
            .map(|row| {
                (0..self.col_count())
                    .map(|col| {
                        self.evaluate(row, col)
                            .unwrap_or(Value::Error(ErrorValue::Ref))
                    })
                    .collect()
            })
            .collect();
        let errors = values.iter().flatten().filter(|v| v.is_error()).count();
        tracing::debug!(
            rows = self.row_count(),
            cols = self.col_count(),
            errors,
            "recalculated sheet"
        );
        values
    }

    /// Display text of every cell, row-major
    pub fn display_grid(&self) -> Vec<Vec<String>> {
        self.format_values(&self.recalculate())
    }

    /// Display text for values already computed by [`Self::recalculate`]
    pub fn format_values(&self, values: &[Vec<Value>]) -> Vec<Vec<String>> {
        values
            .iter()
            .enumerate()
            .map(|(row, values)| {
                values
                    .iter()
                    .enumerate()
                    .map(|(col, value)| self.format_value(row, col, value))
                    .collect()
            })
            .collect()
    }

    /// Cells and ranges a formula cell reads; empty for literal cells.
    ///
    /// A formula that fails to parse has no references.
    pub fn precedents(&self, row: usize, col: usize) -> Result<Vec<Reference>> {
        let raw = self.raw(row, col)?;
        match CellInput::parse(raw) {
            CellInput::Formula(source) => Ok(self
                .engine
                .compile(&source)
                .map(|compiled| compiled.dependencies)
                .unwrap_or_default()),
            _ => Ok(Vec::new()),
        }
    }
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

/// Cells outside the grid are `#REF!` to formulas.
impl CellValueProvider for Sheet {
    fn cell_input(&self, addr: &CellAddress) -> Option<CellInput> {
        self.data
            .get(addr.row as usize)
            .and_then(|row| row.get(addr.col as usize))
            .map(|raw| CellInput::parse(raw))
    }
}

/// Engine address for a zero-based position, if both indices fit in `u32`
fn cell_address(row: usize, col: usize) -> Option<CellAddress> {
    let row = u32::try_from(row).ok()?;
    let col = u32::try_from(col).ok()?;
    Some(CellAddress::new(row, col))
}

fn default_column_name(idx: usize) -> String {
    u32::try_from(idx).map_or_else(|_| idx.to_string(), column_index_to_letters)
}
