use super::{AxisVector, Float, Positions};
use crate::error::{OperationError, Result};

/// Axis-aligned bounds of a point set.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    /// Per-axis minimum.
    pub min: AxisVector,
    /// Per-axis maximum.
    pub max: AxisVector,
}

impl Bounds {
    /// Returns `max - min`.
    #[must_use]
    pub fn diagonal(&self) -> AxisVector {
        &self.max - &self.min
    }
}

/// Computes the per-axis minimum and maximum over all rows.
///
/// # Errors
///
/// Returns `OperationError::Empty` if `positions` has no rows.
pub fn bounds(positions: &Positions) -> Result<Bounds> {
    if positions.nrows() == 0 {
        return Err(OperationError::Empty("vertex set").into());
    }
    let dim = positions.ncols();
    let mut min = AxisVector::from_element(dim, Float::INFINITY);
    let mut max = AxisVector::from_element(dim, Float::NEG_INFINITY);
    for (axis, column) in positions.column_iter().enumerate() {
        for &value in column.iter() {
            min[axis] = min[axis].min(value);
            max[axis] = max[axis].max(value);
        }
    }
    Ok(Bounds { min, max })
}
