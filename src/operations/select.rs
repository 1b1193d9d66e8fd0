use crate::error::Result;
use crate::math::{select_with_ranges, AxisRange};
use crate::vertices::VertexPool;

/// Finds the vertices inside an axis-aligned box.
#[derive(Debug, Clone)]
pub struct SelectVertices {
    ranges: Vec<AxisRange>,
}

impl SelectVertices {
    /// Creates a new `SelectVertices` query with one range per axis.
    #[must_use]
    pub fn new(ranges: Vec<AxisRange>) -> Self {
        Self { ranges }
    }

    /// Executes the query, returning matching vertex indices in ascending
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError::DimensionMismatch` unless there is one range per
    /// axis of the pool.
    pub fn execute(&self, pool: &VertexPool) -> Result<Vec<usize>> {
        let ids = select_with_ranges(pool.vertices(), &self.ranges)?;
        tracing::trace!(selected = ids.len(), of = pool.len(), "selected vertices");
        Ok(ids)
    }
}
