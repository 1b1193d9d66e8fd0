use super::{Float, Positions};
use crate::error::{Result, ShapeError};

/// Inclusive bounds along one axis; `None` leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisRange {
    /// Lower bound, if any.
    pub low: Option<Float>,
    /// Upper bound, if any.
    pub high: Option<Float>,
}

impl AxisRange {
    /// Creates a range bounded on both sides.
    #[must_use]
    pub fn new(low: Float, high: Float) -> Self {
        Self {
            low: Some(low),
            high: Some(high),
        }
    }

    /// A range that accepts every value.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Returns `true` if `value` lies within the range.
    #[must_use]
    pub fn contains(&self, value: Float) -> bool {
        self.low.map_or(true, |low| value >= low) && self.high.map_or(true, |high| value <= high)
    }
}

impl From<(Option<Float>, Option<Float>)> for AxisRange {
    fn from((low, high): (Option<Float>, Option<Float>)) -> Self {
        Self { low, high }
    }
}

/// Returns the indices of rows that lie inside `ranges` on every axis.
///
/// # Errors
///
/// Returns `ShapeError::DimensionMismatch` if `ranges` does not have one entry
/// per column of `positions`.
pub fn select_with_ranges(positions: &Positions, ranges: &[AxisRange]) -> Result<Vec<usize>> {
    if ranges.len() != positions.ncols() {
        return Err(ShapeError::DimensionMismatch {
            expected: positions.ncols(),
            found: ranges.len(),
        }
        .into());
    }
    Ok(positions
        .row_iter()
        .enumerate()
        .filter(|(_, row)| row.iter().zip(ranges).all(|(&v, range)| range.contains(v)))
        .map(|(i, _)| i)
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn grid() -> Positions {
        Positions::from_row_slice(4, 2, &[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 2.0, 3.0])
    }

    #[test]
    fn bounds_are_inclusive() {
        let ranges = [AxisRange::new(1.0, 2.0), AxisRange::new(0.0, 1.0)];
        let ids = select_with_ranges(&grid(), &ranges).unwrap();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn open_sides_are_unbounded() {
        let ranges = [AxisRange::from((None, Some(1.0))), AxisRange::unbounded()];
        assert_eq!(select_with_ranges(&grid(), &ranges).unwrap(), vec![0, 1, 2]);

        let ranges = [AxisRange::unbounded(), AxisRange::from((Some(1.0), None))];
        assert_eq!(select_with_ranges(&grid(), &ranges).unwrap(), vec![2, 3]);
    }

    #[test]
    fn nan_only_passes_open_ranges() {
        let pts = Positions::from_row_slice(2, 1, &[Float::NAN, 0.5]);
        let ids = select_with_ranges(&pts, &[AxisRange::unbounded()]).unwrap();
        assert_eq!(ids, vec![0, 1]);
        let ids = select_with_ranges(&pts, &[AxisRange::new(0.0, 1.0)]).unwrap();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn wrong_number_of_ranges_fails() {
        assert!(select_with_ranges(&grid(), &[AxisRange::unbounded()]).is_err());
    }
}
