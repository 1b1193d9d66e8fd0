use crate::data::{self, Mask};
use crate::error::{OperationError, Result, ShapeError};
use crate::vertices::VertexPool;

/// Keeps the vertices selected by a mask and reindexes everything that
/// refers to them.
///
/// Positions and per-vertex data are reduced to the selected rows, in mask
/// order. Elements are remapped through the inverse map; an element touching
/// a removed vertex is dropped.
#[derive(Debug, Clone)]
pub struct UpdateVertices {
    mask: Mask,
    inverse: Option<Vec<Option<usize>>>,
}

impl UpdateVertices {
    /// Creates a new `UpdateVertices` operation.
    #[must_use]
    pub fn new(mask: impl Into<Mask>) -> Self {
        Self {
            mask: mask.into(),
            inverse: None,
        }
    }

    /// Uses `inverse` as the old-to-new index map instead of deriving one
    /// from the mask. `None` marks a removed vertex.
    #[must_use]
    pub fn with_inverse(mut self, inverse: Vec<Option<usize>>) -> Self {
        self.inverse = Some(inverse);
        self
    }

    /// Executes the update, modifying the pool in place.
    ///
    /// An all-`true` or empty mask leaves the pool untouched, version
    /// included.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError::LengthMismatch` if a flag mask or the inverse map
    /// does not have one entry per vertex, and
    /// `OperationError::IndexOutOfRange` for ids or inverse entries out of
    /// range. The pool is unchanged on error.
    pub fn execute(&self, pool: &mut VertexPool) -> Result<()> {
        let n = pool.len();
        if self.mask.is_noop(n) {
            tracing::trace!("mask keeps every vertex, skipping update");
            return Ok(());
        }

        let selected = self.mask.resolve(n)?;
        let map = match &self.inverse {
            Some(inverse) => checked_inverse(inverse, n, selected.len())?,
            None => derived_inverse(&selected, n),
        };

        let elements = pool.elements().map(|e| e.remap(&map)).transpose()?;
        let positions = data::select_rows(pool.vertices(), &selected);
        let vertex_data = pool.vertex_data().select_rows(&selected);

        tracing::debug!(
            before = n,
            after = selected.len(),
            elements = elements.as_ref().map(crate::connectivity::Elements::len),
            "updated vertices"
        );
        pool.commit(positions, elements, vertex_data)
    }
}

/// Old-to-new map for a plain selection. A vertex selected more than once
/// maps to its last new position.
fn derived_inverse(selected: &[usize], n: usize) -> Vec<Option<usize>> {
    let mut map = vec![None; n];
    for (new, &old) in selected.iter().enumerate() {
        map[old] = Some(new);
    }
    map
}

fn checked_inverse(
    inverse: &[Option<usize>],
    n: usize,
    kept: usize,
) -> Result<Vec<Option<usize>>> {
    if inverse.len() != n {
        return Err(ShapeError::LengthMismatch {
            what: "inverse",
            expected: n,
            found: inverse.len(),
        }
        .into());
    }
    if let Some(index) = inverse.iter().flatten().copied().find(|&i| i >= kept) {
        return Err(OperationError::IndexOutOfRange { index, len: kept }.into());
    }
    Ok(inverse.to_vec())
}
