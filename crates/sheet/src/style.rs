//! Per-cell visual attributes and the `"row,col"` keys they are stored under.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::sync::OnceLock;

/// Visual attributes of one cell.
///
/// Only `decimals` affects evaluation output (see [`crate::Sheet::display`]);
/// everything else is carried for the UI. Attributes this type does not know
/// are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    /// Fixed number of fractional digits for numeric results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl CellStyle {
    /// Format a number with the style's fixed decimals, if any
    pub fn format_number(&self, n: f64) -> Option<String> {
        self.decimals
            .map(|decimals| format!("{:.*}", usize::from(decimals), n))
    }
}

fn style_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d+)\s*,\s*(\d+)\s*$").expect("valid regex"))
}

/// Parse a `"row,col"` style key into zero-based coordinates.
pub fn parse_style_key(key: &str) -> Option<(usize, usize)> {
    let caps = style_key_regex().captures(key)?;
    let row = caps.get(1)?.as_str().parse().ok()?;
    let col = caps.get(2)?.as_str().parse().ok()?;
    Some((row, col))
}

pub fn format_style_key(row: usize, col: usize) -> String {
    format!("{row},{col}")
}
