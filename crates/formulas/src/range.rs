//! Range resolution with a cell-count ceiling.

use crate::context::EvaluationContext;
use gridcalc_primitives::{CellReference, ErrorValue, RangeReference, Value};

/// Enumerates the cells of a rectangular span through an evaluation context.
#[derive(Debug, Clone, Copy)]
pub struct RangeResolver {
    max_cells: usize,
}

impl RangeResolver {
    pub fn new(max_cells: usize) -> Self {
        Self { max_cells }
    }

    pub fn max_cells(&self) -> usize {
        self.max_cells
    }

    /// Values of every cell between the two corners, row-major.
    ///
    /// A span larger than the ceiling is `#REF!` and the grid is never
    /// queried. Formula members go through the context's cell guards.
    pub fn resolve(
        &self,
        ctx: &mut EvaluationContext<'_>,
        start: &CellReference,
        end: &CellReference,
    ) -> Result<Vec<Value>, ErrorValue> {
        let range = RangeReference::new(*start, *end).to_range();
        let size = range.size();
        if size > self.max_cells as u64 {
            tracing::debug!(
                range = %range,
                cells = size,
                limit = self.max_cells,
                "range exceeds cell limit"
            );
            return Err(ErrorValue::Ref);
        }

        let mut values = Vec::with_capacity(size as usize);
        for addr in range.iter() {
            values.push(ctx.cell_value(&addr));
        }
        Ok(values)
    }
}
