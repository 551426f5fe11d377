//! # gridcalc primitives
//!
//! Core primitives shared by the formula engine and the grid: cell addresses,
//! references with absolute markers, normalized ranges, and the value and
//! error-sentinel types that flow through evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A zero-based cell position in the grid (`A1` is row 0, col 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    /// Create a new cell address
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse from A1 notation (e.g., "A1", "$B$2"), ignoring absolute markers.
    pub fn from_a1(s: &str) -> Result<Self, AddressError> {
        CellReference::from_a1(s).map(|r| r.addr)
    }

    /// Convert to A1 notation
    pub fn to_a1(&self) -> String {
        format!("{}{}", column_index_to_letters(self.col), self.row + 1)
    }
}

/// A cell reference as written in a formula.
///
/// The absolute flags are kept for fill-down tooling; they never change which
/// cell is read during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellReference {
    pub addr: CellAddress,
    pub row_absolute: bool,
    pub col_absolute: bool,
}

impl CellReference {
    /// A relative reference to `addr`.
    pub fn relative(addr: CellAddress) -> Self {
        Self {
            addr,
            row_absolute: false,
            col_absolute: false,
        }
    }

    /// Parse A1 notation preserving absolute/mixed markers (e.g., $A$1, A$1, $A1).
    /// Column letters are case-insensitive.
    pub fn from_a1(s: &str) -> Result<Self, AddressError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AddressError::InvalidRange("Empty A1 reference".to_string()));
        }

        let mut chars = trimmed.chars().peekable();

        let col_absolute = chars.next_if_eq(&'$').is_some();

        let mut col_letters = String::new();
        while let Some(ch) = chars.next_if(char::is_ascii_alphabetic) {
            col_letters.push(ch);
        }
        if col_letters.is_empty() {
            return Err(AddressError::InvalidColumn(trimmed.to_string()));
        }

        let row_absolute = chars.next_if_eq(&'$').is_some();

        let mut row_digits = String::new();
        while let Some(ch) = chars.next_if(char::is_ascii_digit) {
            row_digits.push(ch);
        }
        if row_digits.is_empty() || chars.peek().is_some() {
            return Err(AddressError::InvalidRow(trimmed.to_string()));
        }

        let row_num: u32 = row_digits
            .parse()
            .map_err(|_| AddressError::InvalidRow(row_digits.clone()))?;
        if row_num == 0 {
            return Err(AddressError::InvalidRow(row_digits));
        }

        let col = column_letters_to_index(&col_letters)?;
        Ok(Self {
            addr: CellAddress::new(row_num - 1, col),
            row_absolute,
            col_absolute,
        })
    }

    /// Render back to A1 notation including `$` markers.
    pub fn to_a1(&self) -> String {
        format!(
            "{}{}{}{}",
            if self.col_absolute { "$" } else { "" },
            column_index_to_letters(self.addr.col),
            if self.row_absolute { "$" } else { "" },
            self.addr.row + 1
        )
    }
}

/// A range as written in a formula: two corner references, normalized so
/// `start` is the top-left corner and `end` the bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeReference {
    pub start: CellReference,
    pub end: CellReference,
}

impl RangeReference {
    /// Build a normalized range reference. Each axis keeps the absolute flag
    /// of the corner that supplied it.
    pub fn new(a: CellReference, b: CellReference) -> Self {
        let (top, bottom) = if a.addr.row <= b.addr.row { (a, b) } else { (b, a) };
        let (left, right) = if a.addr.col <= b.addr.col { (a, b) } else { (b, a) };
        Self {
            start: CellReference {
                addr: CellAddress::new(top.addr.row, left.addr.col),
                row_absolute: top.row_absolute,
                col_absolute: left.col_absolute,
            },
            end: CellReference {
                addr: CellAddress::new(bottom.addr.row, right.addr.col),
                row_absolute: bottom.row_absolute,
                col_absolute: right.col_absolute,
            },
        }
    }

    /// The addressed span without reference markers.
    pub fn to_range(&self) -> CellRange {
        CellRange::new(self.start.addr, self.end.addr)
    }
}

impl fmt::Display for RangeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// A rectangular, inclusive range of cells (e.g., A1:B10).
///
/// Always normalized: `start` is the top-left corner and `end` the
/// bottom-right, whatever order the corners were written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    /// Create a normalized range from two corners in any order.
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        Self {
            start: CellAddress::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellAddress::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// Parse `A1:B2` notation (a single address is a one-cell range).
    pub fn from_a1(s: &str) -> Result<Self, AddressError> {
        match s.split_once(':') {
            Some((a, b)) => Ok(Self::new(
                CellAddress::from_a1(a)?,
                CellAddress::from_a1(b)?,
            )),
            None => {
                let addr = CellAddress::from_a1(s)?;
                Ok(Self::new(addr, addr))
            }
        }
    }

    /// Number of rows in the range
    pub fn rows(&self) -> u64 {
        u64::from(self.end.row - self.start.row) + 1
    }

    /// Number of columns in the range
    pub fn cols(&self) -> u64 {
        u64::from(self.end.col - self.start.col) + 1
    }

    /// Total number of cells, saturating at `u64::MAX` for the full `u32` span.
    pub fn size(&self) -> u64 {
        self.rows().saturating_mul(self.cols())
    }

    /// Check if a cell is within this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// Iterate over all addresses in row-major order
    pub fn iter(&self) -> CellRangeIter {
        CellRangeIter {
            current: self.start,
            start: self.start,
            end: self.end,
            done: false,
        }
    }
}

/// Iterator over a cell range in row-major order
pub struct CellRangeIter {
    current: CellAddress,
    start: CellAddress,
    end: CellAddress,
    done: bool,
}

impl Iterator for CellRangeIter {
    type Item = CellAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;

        if self.current == self.end {
            self.done = true;
            return Some(result);
        }

        if self.current.col < self.end.col {
            self.current.col += 1;
        } else {
            self.current.col = self.start.col;
            self.current.row += 1;
        }

        Some(result)
    }
}

/// Values produced and consumed by formula evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Error(ErrorValue),
    /// Cells of a resolved range, row-major.
    Array(Vec<Value>),
}

impl Value {
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Numeric view of a number value; other variants yield `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<ErrorValue> for Value {
    fn from(err: ErrorValue) -> Self {
        Value::Error(err)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Bool(true) => f.write_str("TRUE"),
            Value::Bool(false) => f.write_str("FALSE"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => f.write_str(&format_number(*x)),
            Value::String(s) => f.write_str(s),
            Value::Error(err) => write!(f, "{err}"),
            Value::Array(items) => match items.as_slice() {
                [single] => write!(f, "{single}"),
                _ => f.write_str(ErrorValue::Value.label()),
            },
        }
    }
}

/// Render a float the way a spreadsheet cell shows it: integral values
/// without a fractional part, everything else in shortest round-trip form.
pub fn format_number(x: f64) -> String {
    if x == 0.0 {
        return "0".to_string();
    }
    if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{x}")
    }
}

/// The closed set of error sentinels a formula can evaluate to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorValue {
    /// `#VALUE!` type or coercion failure
    Value,
    /// `#DIV/0!`
    Div0,
    /// `#NUM!` math domain violation or non-finite result
    Num,
    /// `#REF!` out-of-grid reference or oversized range
    Ref,
    /// `#CYCLE!` circular dependency
    Cycle,
    /// `#DEPTH!` dependency chain too deep
    Depth,
    /// `#CALC!` evaluation budget exhausted
    Calc,
    /// `#ERROR:` malformed formula, with a description
    Parse(String),
}

impl ErrorValue {
    /// Sentinel text (without the parse-error description)
    pub fn label(&self) -> &'static str {
        match self {
            Self::Value => "#VALUE!",
            Self::Div0 => "#DIV/0!",
            Self::Num => "#NUM!",
            Self::Ref => "#REF!",
            Self::Cycle => "#CYCLE!",
            Self::Depth => "#DEPTH!",
            Self::Calc => "#CALC!",
            Self::Parse(_) => "#ERROR:",
        }
    }

    /// Errors raised by evaluation guards rather than by formula semantics.
    /// Their presence depends on the evaluation path, not only on the cell.
    pub fn is_path_dependent(&self) -> bool {
        matches!(self, Self::Depth | Self::Calc)
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "#ERROR: {message}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Errors that can occur when parsing addresses
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("Invalid column: {0}")]
    InvalidColumn(String),
    #[error("Invalid row: {0}")]
    InvalidRow(String),
    #[error("Invalid range: {0}")]
    InvalidRange(String),
}

/// Convert column letters to a zero-based index (`A` → 0, `AA` → 26).
pub fn column_letters_to_index(col: &str) -> Result<u32, AddressError> {
    if col.is_empty() {
        return Err(AddressError::InvalidColumn(col.to_string()));
    }
    let mut result: u32 = 0;
    for ch in col.chars() {
        let upper = ch.to_ascii_uppercase();
        if !upper.is_ascii_uppercase() {
            return Err(AddressError::InvalidColumn(col.to_string()));
        }
        let value = u32::from(upper as u8 - b'A' + 1);
        result = result
            .checked_mul(26)
            .and_then(|v| v.checked_add(value))
            .ok_or_else(|| AddressError::InvalidColumn(col.to_string()))?;
    }
    Ok(result - 1)
}

/// Convert a zero-based column index to letters (0 → `A`, 26 → `AA`).
pub fn column_index_to_letters(index: u32) -> String {
    let mut letters = Vec::new();
    let mut index = u64::from(index) + 1;
    while index > 0 {
        let rem = ((index - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        index = (index - 1) / 26;
    }
    letters.iter().rev().collect()
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

impl fmt::Display for CellReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}
