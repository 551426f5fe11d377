//! Grid collaborator for gridcalc
//!
//! A [`Sheet`] holds raw cell text (literals and `=` formulas), per-cell
//! styles and a [`gridcalc_formulas::FormulaEngine`]. It is the engine's
//! [`gridcalc_formulas::CellValueProvider`]: formulas read other cells
//! through it, and references outside the grid are `#REF!`.
//!
//! # Examples
//!
//! ```
//! use gridcalc_sheet::Sheet;
//! use gridcalc_primitives::Value;
//!
//! let mut sheet = Sheet::new(3, 2);
//! sheet.set_a1("A1", "10").unwrap();
//! sheet.set_a1("A2", "32").unwrap();
//! sheet.set_a1("B1", "=SUM(A1:A2)").unwrap();
//!
//! assert_eq!(sheet.evaluate_a1("B1").unwrap(), Value::Int(42));
//! assert_eq!(sheet.display_a1("B1").unwrap(), "42");
//! ```
//!
//! ## Loading a grid document
//!
//! ```
//! use gridcalc_sheet::Sheet;
//!
//! let sheet = Sheet::from_json_str(
//!     r#"{"columns": ["A"], "data": [["=1/0"]], "styles": {}}"#,
//! ).unwrap();
//! assert_eq!(sheet.display(0, 0).unwrap(), "#DIV/0!");
//! ```

mod error;
mod json;
mod sheet;
mod style;

/// Re-export sheet error types.
pub use error::{Result, SheetError};
/// Re-export the grid.
pub use sheet::Sheet;
/// Re-export style types.
pub use style::{format_style_key, parse_style_key, CellStyle};
