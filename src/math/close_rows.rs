//! Tolerance-based clustering of near-duplicate rows.
//!
//! Rows are visited in ascending index order. A row that no earlier row has
//! claimed becomes a representative and claims every unclaimed row within
//! tolerance of it. Representatives are therefore always the smallest index
//! of their cluster, and any two representatives are farther apart than the
//! tolerance, so clustering the representatives again changes nothing.
//!
//! Candidate pairs come from a uniform hash grid whose cell size equals the
//! tolerance: every row within tolerance of a query lies in the 3^D block of
//! cells around it. The grid is skipped for high dimensions, a zero or
//! non-finite tolerance, or coordinates that cannot be keyed; a sweep over
//! rows sorted by their first coordinate is used instead.

use rustc_hash::FxHashMap;

use super::{Float, MergeParams, Positions};
use crate::error::{OperationError, Result, ShapeError};

/// Largest dimension searched with the hash grid (3^D neighbour cells).
const MAX_GRID_DIMENSION: usize = 5;

/// Cell coordinates beyond this magnitude lose unit resolution.
const MAX_CELL_COORDINATE: Float = 1.0 / Float::EPSILON;

/// Result of clustering rows that lie within tolerance of each other.
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueVertices {
    /// Representative rows, in order of their original index.
    pub values: Positions,
    /// Original index of each representative.
    pub ids: Vec<usize>,
    /// For every original row, the position of its representative in `values`.
    pub inverse: Vec<usize>,
    /// For every original row, whether its cluster has more than one member.
    pub merged: Vec<bool>,
}

impl UniqueVertices {
    /// Number of representatives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if there are no rows at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns `true` if at least two rows were merged.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.ids.len() < self.inverse.len()
    }
}

/// Clusters rows of `positions` that are within `params.tolerance` of each other.
///
/// # Errors
///
/// Returns `OperationError::InvalidInput` for a negative or NaN tolerance and
/// `ShapeError::ZeroDimension` for rows without columns.
pub fn close_rows(positions: &Positions, params: MergeParams) -> Result<UniqueVertices> {
    let index = CandidateIndex::build(positions, params.tolerance)?;
    cluster(positions, params, &index)
}

fn cluster(
    positions: &Positions,
    params: MergeParams,
    index: &CandidateIndex,
) -> Result<UniqueVertices> {
    let n = positions.nrows();
    let dim = positions.ncols();
    let rows = row_major(positions);
    let row = |i: usize| &rows[i * dim..(i + 1) * dim];

    let mut owner: Vec<Option<usize>> = vec![None; n];
    let mut ids = Vec::new();
    let mut sizes = Vec::new();

    for i in 0..n {
        if owner[i].is_some() {
            continue;
        }
        let slot = ids.len();
        owner[i] = Some(slot);
        ids.push(i);
        let mut size = 1_usize;

        index.for_each_candidate(i, |j| {
            if owner[j].is_none() && params.metric.within(row(i), row(j), params.tolerance) {
                owner[j] = Some(slot);
                size += 1;
            }
        });
        sizes.push(size);
    }

    let inverse: Vec<usize> = owner.into_iter().flatten().collect();
    let merged = inverse.iter().map(|&slot| sizes[slot] > 1).collect();
    let values = Positions::from_fn(ids.len(), dim, |r, c| positions[(ids[r], c)]);

    tracing::debug!(
        rows = n,
        unique = ids.len(),
        strategy = index.name(),
        "clustered close rows"
    );

    Ok(UniqueVertices {
        values,
        ids,
        inverse,
        merged,
    })
}

fn row_major(positions: &Positions) -> Vec<Float> {
    positions.transpose().as_slice().to_vec()
}

/// Source of candidate neighbours for a row.
enum CandidateIndex {
    Grid(HashGrid),
    Sweep(AxisSweep),
}

impl CandidateIndex {
    fn build(positions: &Positions, tolerance: Float) -> Result<Self> {
        if tolerance.is_nan() || tolerance < 0.0 {
            return Err(OperationError::InvalidInput(format!(
                "tolerance must be non-negative, got {tolerance}"
            ))
            .into());
        }
        if positions.nrows() > 0 && positions.ncols() == 0 {
            return Err(ShapeError::ZeroDimension {
                rows: positions.nrows(),
            }
            .into());
        }
        Ok(match HashGrid::build(positions, tolerance) {
            Some(grid) => Self::Grid(grid),
            None => Self::Sweep(AxisSweep::build(positions, tolerance)),
        })
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Grid(_) => "grid",
            Self::Sweep(_) => "sweep",
        }
    }

    fn for_each_candidate<F>(&self, row: usize, f: F)
    where
        F: FnMut(usize),
    {
        match self {
            Self::Grid(grid) => grid.for_each_candidate(row, f),
            Self::Sweep(sweep) => sweep.for_each_candidate(row, f),
        }
    }
}

/// Uniform grid mapping integer cell coordinates to the rows inside them.
struct HashGrid {
    keys: Vec<Vec<i64>>,
    cells: FxHashMap<Vec<i64>, Vec<usize>>,
}

impl HashGrid {
    /// Returns `None` if the grid cannot represent every row exactly.
    fn build(positions: &Positions, cell_size: Float) -> Option<Self> {
        if positions.ncols() > MAX_GRID_DIMENSION || !cell_size.is_finite() || cell_size <= 0.0 {
            return None;
        }
        let mut keys = Vec::with_capacity(positions.nrows());
        let mut cells: FxHashMap<Vec<i64>, Vec<usize>> = FxHashMap::default();
        for (i, row) in positions.row_iter().enumerate() {
            let key = row
                .iter()
                .map(|&c| cell_coordinate(c, cell_size))
                .collect::<Option<Vec<i64>>>()?;
            cells.entry(key.clone()).or_default().push(i);
            keys.push(key);
        }
        Some(Self { keys, cells })
    }

    fn for_each_candidate<F>(&self, row: usize, mut f: F)
    where
        F: FnMut(usize),
    {
        let base = &self.keys[row];
        let mut current = base.clone();
        self.visit_neighbor_cells(0, base, &mut current, &mut f);
    }

    fn visit_neighbor_cells<F>(&self, axis: usize, base: &[i64], current: &mut [i64], f: &mut F)
    where
        F: FnMut(usize),
    {
        if axis == base.len() {
            if let Some(bucket) = self.cells.get(&*current) {
                bucket.iter().for_each(|&j| f(j));
            }
            return;
        }
        for offset in [-1, 0, 1] {
            current[axis] = base[axis] + offset;
            self.visit_neighbor_cells(axis + 1, base, current, f);
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn cell_coordinate(coordinate: Float, cell_size: Float) -> Option<i64> {
    let cell = (coordinate / cell_size).floor();
    (cell.is_finite() && cell.abs() < MAX_CELL_COORDINATE).then_some(cell as i64)
}

/// Rows sorted by their first coordinate; candidates are the rows whose first
/// coordinate is within tolerance.
struct AxisSweep {
    tolerance: Float,
    first_axis: Vec<Float>,
    order: Vec<usize>,
    rank: Vec<usize>,
}

impl AxisSweep {
    fn build(positions: &Positions, tolerance: Float) -> Self {
        let n = positions.nrows();
        let first_axis: Vec<Float> = if positions.ncols() == 0 {
            Vec::new()
        } else {
            positions.column(0).iter().copied().collect()
        };
        let mut order: Vec<usize> = (0..first_axis.len()).collect();
        order.sort_by(|&a, &b| first_axis[a].total_cmp(&first_axis[b]).then(a.cmp(&b)));
        let mut rank = vec![0; n];
        for (r, &i) in order.iter().enumerate() {
            rank[i] = r;
        }
        Self {
            tolerance,
            first_axis,
            order,
            rank,
        }
    }

    fn for_each_candidate<F>(&self, row: usize, mut f: F)
    where
        F: FnMut(usize),
    {
        let x = self.first_axis[row];
        let r = self.rank[row];
        let near = |j: &&usize| (self.first_axis[**j] - x).abs() <= self.tolerance;
        self.order[r + 1..].iter().take_while(near).for_each(|&j| f(j));
        self.order[..r].iter().rev().take_while(near).for_each(|&j| f(j));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Metric;

    fn sweep(positions: &Positions, params: MergeParams) -> UniqueVertices {
        let index = CandidateIndex::Sweep(AxisSweep::build(positions, params.tolerance));
        cluster(positions, params, &index).unwrap()
    }

    /// Deterministic pseudo-random cloud with exact and jittered duplicates.
    fn noisy_cloud(n: usize, dim: usize) -> Positions {
        let mut state = 0x2545_f491_4f6c_dd1d_u64;
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            #[allow(clippy::cast_precision_loss)]
            let unit = (state >> 11) as Float / (1_u64 << 53) as Float;
            unit
        };
        let mut data = Vec::with_capacity(n * dim);
        let mut base = 0.0;
        for i in 0..n {
            if i % 4 == 3 {
                let source = (i - 3) * dim;
                for c in 0..dim {
                    data.push(data[source + c] + 1e-4 * next());
                }
            } else {
                // First axis keeps distinct base rows at least 0.09 apart.
                data.push(base + 0.01 * next());
                base += 0.1;
                for _ in 1..dim {
                    data.push(next() * 10.0);
                }
            }
        }
        Positions::from_row_slice(n, dim, &data)
    }

    #[test]
    fn merges_near_duplicate_pair() {
        let pts = Positions::from_row_slice(3, 2, &[0.0, 0.0, 0.0, 0.0001, 5.0, 5.0]);
        let unique = close_rows(&pts, MergeParams::with_tolerance(0.001)).unwrap();
        assert_eq!(unique.len(), 2);
        assert_eq!(unique.ids, vec![0, 2]);
        assert_eq!(unique.inverse, vec![0, 0, 1]);
        assert_eq!(unique.merged, vec![true, true, false]);
        assert_eq!(unique.values.row(1), pts.row(2));
    }

    #[test]
    fn smallest_index_represents_cluster() {
        let pts = Positions::from_row_slice(4, 1, &[3.0, 1.0, 3.0, 1.0]);
        let unique = close_rows(&pts, MergeParams::with_tolerance(0.5)).unwrap();
        assert_eq!(unique.ids, vec![0, 1]);
        assert_eq!(unique.inverse, vec![0, 1, 0, 1]);
    }

    #[test]
    fn chain_does_not_merge_beyond_tolerance() {
        // 0 claims 1, but 2 is too far from 0 and becomes its own representative.
        let pts = Positions::from_row_slice(3, 1, &[0.0, 0.8, 1.6]);
        let unique = close_rows(&pts, MergeParams::with_tolerance(1.0)).unwrap();
        assert_eq!(unique.ids, vec![0, 2]);
        assert_eq!(unique.inverse, vec![0, 0, 1]);
    }

    #[test]
    fn chebyshev_merges_diagonal_offsets() {
        let pts = Positions::from_row_slice(2, 2, &[0.0, 0.0, 0.9, 0.9]);
        let euclid = close_rows(&pts, MergeParams::with_tolerance(1.0)).unwrap();
        assert_eq!(euclid.len(), 2);

        let params = MergeParams {
            tolerance: 1.0,
            metric: Metric::Chebyshev,
        };
        assert_eq!(close_rows(&pts, params).unwrap().len(), 1);
    }

    #[test]
    fn zero_tolerance_merges_exact_duplicates_only() {
        let pts = Positions::from_row_slice(3, 2, &[1.0, 2.0, 1.0, 2.0, 1.0, 2.000_001]);
        let unique = close_rows(&pts, MergeParams::with_tolerance(0.0)).unwrap();
        assert_eq!(unique.ids, vec![0, 2]);
    }

    #[test]
    fn nan_rows_stay_alone() {
        let pts = Positions::from_row_slice(3, 2, &[Float::NAN, 0.0, Float::NAN, 0.0, 0.0, 0.0]);
        let unique = close_rows(&pts, MergeParams::with_tolerance(0.1)).unwrap();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn high_dimension_uses_sweep() {
        let pts = noisy_cloud(40, 7);
        let params = MergeParams::with_tolerance(1e-3);
        assert!(HashGrid::build(&pts, params.tolerance).is_none());
        let unique = close_rows(&pts, params).unwrap();
        assert_eq!(unique.len(), 30);
    }

    #[test]
    fn grid_and_sweep_agree() {
        for dim in 1..=3 {
            let pts = noisy_cloud(200, dim);
            let params = MergeParams::with_tolerance(1e-3);
            let grid = close_rows(&pts, params).unwrap();
            assert_eq!(grid, sweep(&pts, params));
            assert_eq!(grid.len(), 150);
        }
    }

    #[test]
    fn inverse_points_within_tolerance() {
        let pts = noisy_cloud(120, 3);
        let params = MergeParams::with_tolerance(1e-3);
        let unique = close_rows(&pts, params).unwrap();
        for (i, &slot) in unique.inverse.iter().enumerate() {
            let original: Vec<Float> = pts.row(i).iter().copied().collect();
            let rep: Vec<Float> = unique.values.row(slot).iter().copied().collect();
            assert!(Metric::Euclidean.within(&original, &rep, params.tolerance));
        }
    }

    #[test]
    fn representatives_are_stable_under_second_pass() {
        let pts = noisy_cloud(80, 2);
        let params = MergeParams::with_tolerance(0.5);
        let first = close_rows(&pts, params).unwrap();
        let second = close_rows(&first.values, params).unwrap();
        assert_eq!(second.len(), first.len());
        assert!(!second.has_duplicates());
    }

    #[test]
    fn rejects_negative_tolerance() {
        let pts = Positions::from_row_slice(1, 1, &[0.0]);
        assert!(close_rows(&pts, MergeParams::with_tolerance(-1.0)).is_err());
        assert!(close_rows(&pts, MergeParams::with_tolerance(Float::NAN)).is_err());
    }

    #[test]
    fn empty_input_yields_empty_result() {
        let unique = close_rows(&Positions::zeros(0, 3), MergeParams::default()).unwrap();
        assert!(unique.is_empty());
        assert!(unique.inverse.is_empty());
        assert_eq!(unique.values.ncols(), 3);
    }
}
