//! JSON grid documents.
//!
//! ```json
//! {
//!   "columns": ["A", "B"],
//!   "data": [["1", "=A1*2"], ["label", ""]],
//!   "styles": {"0,1": {"bold": true, "decimals": 2}}
//! }
//! ```
//!
//! Loading validates the shape before any cell is built: a document that is
//! not an object, or a row that is not a list, is rejected. Non-scalar cells
//! are replaced by empty cells and malformed style entries are dropped, both
//! with a warning.

use crate::error::{Result, SheetError};
use crate::sheet::Sheet;
use crate::style::{format_style_key, parse_style_key, CellStyle};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Serialize)]
struct GridDocument<'a> {
    columns: &'a [String],
    data: &'a [Vec<String>],
    styles: IndexMap<String, &'a CellStyle>,
}

impl Sheet {
    /// Load a grid from a JSON document file
    ///
    /// # Example
    /// ```no_run
    /// use gridcalc_sheet::Sheet;
    ///
    /// let sheet = Sheet::from_json_path("budget.json").unwrap();
    /// println!("{}", sheet.display_a1("B7").unwrap());
    /// ```
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let value: JsonValue = serde_json::from_reader(BufReader::new(file))?;
        Self::from_json_value(&value)
    }

    /// Load a grid from a JSON document string
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(content)?;
        Self::from_json_value(&value)
    }

    /// Build a grid from an already parsed JSON document
    pub fn from_json_value(value: &JsonValue) -> Result<Self> {
        let doc = value
            .as_object()
            .ok_or_else(|| SheetError::Parse("Grid document must be an object".to_string()))?;

        let columns = parse_columns(doc.get("columns"))?;
        let data = parse_data(doc.get("data"))?;
        let mut sheet = Sheet::from_rows(columns, data);
        sheet.styles = parse_styles(doc.get("styles"), sheet.row_count(), sheet.col_count())?;
        Ok(sheet)
    }

    /// Serialize the grid as a pretty-printed JSON document
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.document())?)
    }

    /// Write the grid as a JSON document file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.document())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    fn document(&self) -> GridDocument<'_> {
        GridDocument {
            columns: &self.columns,
            data: &self.data,
            styles: self
                .styles
                .iter()
                .map(|(&(row, col), style)| (format_style_key(row, col), style))
                .collect(),
        }
    }
}

fn parse_columns(value: Option<&JsonValue>) -> Result<Vec<String>> {
    match value {
        None | Some(JsonValue::Null) => Ok(Vec::new()),
        Some(JsonValue::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                scalar_text(item).ok_or_else(|| {
                    SheetError::Parse(format!("Column name at index {idx} must be a scalar"))
                })
            })
            .collect(),
        Some(_) => Err(SheetError::Parse("\"columns\" must be a list".to_string())),
    }
}

fn parse_data(value: Option<&JsonValue>) -> Result<Vec<Vec<String>>> {
    let rows = match value {
        None | Some(JsonValue::Null) => return Ok(Vec::new()),
        Some(JsonValue::Array(rows)) => rows,
        Some(_) => return Err(SheetError::Parse("\"data\" must be a list of rows".to_string())),
    };

    let mut data = Vec::with_capacity(rows.len());
    for (row_idx, row) in rows.iter().enumerate() {
        let cells = row
            .as_array()
            .ok_or_else(|| SheetError::Parse(format!("Row {row_idx} must be a list")))?;
        let cells = cells
            .iter()
            .enumerate()
            .map(|(col_idx, cell)| {
                scalar_text(cell).unwrap_or_else(|| {
                    tracing::warn!(
                        row = row_idx,
                        col = col_idx,
                        "non-scalar cell value replaced with empty cell"
                    );
                    String::new()
                })
            })
            .collect();
        data.push(cells);
    }
    Ok(data)
}

fn parse_styles(
    value: Option<&JsonValue>,
    rows: usize,
    cols: usize,
) -> Result<IndexMap<(usize, usize), CellStyle>> {
    let entries: &Map<String, JsonValue> = match value {
        None | Some(JsonValue::Null) => return Ok(IndexMap::new()),
        Some(JsonValue::Object(entries)) => entries,
        Some(_) => return Err(SheetError::Parse("\"styles\" must be an object".to_string())),
    };

    let mut styles = IndexMap::with_capacity(entries.len());
    for (key, raw) in entries {
        let Some((row, col)) = parse_style_key(key) else {
            tracing::warn!(key = %key, "malformed style key dropped");
            continue;
        };
        if row >= rows || col >= cols {
            tracing::warn!(key = %key, rows, cols, "style outside grid dropped");
            continue;
        }
        match serde_json::from_value::<CellStyle>(raw.clone()) {
            Ok(style) => {
                styles.insert((row, col), style);
            }
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "invalid style dropped");
            }
        }
    }
    Ok(styles)
}

/// Cell text for a JSON scalar; `None` for lists and objects.
fn scalar_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => Some(String::new()),
        JsonValue::Bool(true) => Some("TRUE".to_string()),
        JsonValue::Bool(false) => Some("FALSE".to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}
