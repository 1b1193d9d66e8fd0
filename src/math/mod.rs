//! Numeric settings and pure array routines over row-major point sets.

pub mod bounds;
pub mod close_rows;
pub mod ranges;

pub use bounds::{bounds, Bounds};
pub use close_rows::{close_rows, UniqueVertices};
pub use ranges::{select_with_ranges, AxisRange};

/// Floating-point type used for positions and attached data.
#[cfg(not(feature = "single-precision"))]
pub type Float = f64;

/// Floating-point type used for positions and attached data.
#[cfg(feature = "single-precision")]
pub type Float = f32;

/// Dense position matrix: one row per vertex, one column per axis.
pub type Positions = nalgebra::DMatrix<Float>;

/// Per-axis vector (bounds corners, diagonals).
pub type AxisVector = nalgebra::DVector<Float>;

/// Default tolerance for merging near-duplicate vertices.
#[cfg(not(feature = "single-precision"))]
pub const TOLERANCE: Float = 1e-10;

/// Default tolerance for merging near-duplicate vertices.
#[cfg(feature = "single-precision")]
pub const TOLERANCE: Float = 1e-6;

/// Distance used to decide whether two rows are close.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Metric {
    /// L2 distance between rows.
    #[default]
    Euclidean,
    /// Largest per-axis difference.
    Chebyshev,
}

impl Metric {
    /// Returns `true` if rows `a` and `b` are within `tolerance` of each other.
    #[must_use]
    pub fn within<'a, I>(self, a: I, b: I, tolerance: Float) -> bool
    where
        I: IntoIterator<Item = &'a Float>,
    {
        let mut diffs = a.into_iter().zip(b).map(|(x, y)| (x - y).abs());
        match self {
            Self::Euclidean => diffs.map(|d| d * d).sum::<Float>() <= tolerance * tolerance,
            Self::Chebyshev => diffs.all(|d| d <= tolerance),
        }
    }
}

/// Parameters controlling near-duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeParams {
    /// Maximum distance between a vertex and its representative.
    pub tolerance: Float,
    /// Distance used for the comparison.
    pub metric: Metric,
}

impl MergeParams {
    /// Creates parameters with the given tolerance and the default metric.
    #[must_use]
    pub fn with_tolerance(tolerance: Float) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }

    /// Bit pattern identifying these parameters in the derived-data cache.
    pub(crate) fn fingerprint(self) -> u64 {
        let metric = match self.metric {
            Metric::Euclidean => 0,
            Metric::Chebyshev => 1,
        };
        (u64::from(self.tolerance.to_bits()) << 1) | metric
    }
}

impl Default for MergeParams {
    fn default() -> Self {
        Self {
            tolerance: TOLERANCE,
            metric: Metric::default(),
        }
    }
}
