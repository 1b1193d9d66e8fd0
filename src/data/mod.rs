//! Storage owned by a vertex pool: the tracked position buffer, the cache of
//! derived quantities and the per-vertex data table.

pub mod computed;
pub mod mask;
pub mod tracked_buffer;
pub mod vertex_data;

pub use computed::{ComputedData, Fingerprint, Memo};
pub use mask::Mask;
pub use tracked_buffer::{positions_from_row_slice, positions_from_rows, TrackedBuffer};
pub use vertex_data::{DataArray, VertexData};

use nalgebra::{DMatrix, Scalar};

/// Stacks matrices with `cols` columns on top of each other, in order.
pub(crate) fn vstack<T: Scalar>(parts: &[&DMatrix<T>], cols: usize) -> DMatrix<T> {
    let rows = parts.iter().map(|p| p.nrows()).sum();
    let mut values = Vec::with_capacity(rows * cols);
    for part in parts {
        values.extend_from_slice(part.transpose().as_slice());
    }
    DMatrix::from_row_slice(rows, cols, &values)
}

/// Copies the listed rows of `matrix`, in order.
pub(crate) fn select_rows<T: Scalar>(matrix: &DMatrix<T>, rows: &[usize]) -> DMatrix<T> {
    DMatrix::from_fn(rows.len(), matrix.ncols(), |r, c| matrix[(rows[r], c)].clone())
}
