//! Evaluation budgets.
//!
//! Evaluation has no cooperative cancellation, so pathological formulas are
//! bounded structurally by these ceilings instead of by wall-clock time.

use serde::{Deserialize, Serialize};

/// Default ceiling on the number of cells a single range may span.
pub const DEFAULT_MAX_RANGE_CELLS: usize = 10_000;
/// Default ceiling on nested cell-to-cell dependency depth.
pub const DEFAULT_MAX_DEPTH: usize = 100;
/// Default ceiling on formula-cell evaluations per top-level call.
pub const DEFAULT_MAX_EVALUATIONS: usize = 5_000;
/// Default ceiling on the length (in chars) of text built by text functions.
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 32_767;
/// Default ceiling on expression nesting within one formula.
pub const DEFAULT_MAX_NESTING: usize = 128;

/// Guard configuration for one [`crate::FormulaEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineLimits {
    /// Ranges larger than this resolve to `#REF!` without touching the grid.
    pub max_range_cells: usize,
    /// Deeper dependency chains resolve to `#DEPTH!`.
    pub max_depth: usize,
    /// More formula-cell evaluations in one call resolve to `#CALC!`.
    pub max_evaluations: usize,
    /// Longer text results resolve to `#VALUE!`.
    pub max_text_length: usize,
    /// Formulas nested deeper than this fail to parse.
    pub max_nesting: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_range_cells: DEFAULT_MAX_RANGE_CELLS,
            max_depth: DEFAULT_MAX_DEPTH,
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let limits = EngineLimits::default();
        assert_eq!(limits.max_range_cells, 10_000);
        assert_eq!(limits.max_depth, 100);
        assert_eq!(limits.max_evaluations, 5_000);
        assert_eq!(limits.max_nesting, 128);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let limits: EngineLimits = serde_json::from_str(r#"{"max_depth": 8}"#).unwrap();
        assert_eq!(limits.max_depth, 8);
        assert_eq!(limits.max_range_cells, DEFAULT_MAX_RANGE_CELLS);
        assert_eq!(limits.max_text_length, DEFAULT_MAX_TEXT_LENGTH);
        assert_eq!(limits.max_nesting, DEFAULT_MAX_NESTING);
    }
}
