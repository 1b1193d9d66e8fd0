use nalgebra::DMatrixViewMut;

use crate::error::{Result, ShapeError};
use crate::math::{Float, Positions};

/// Owner of a position matrix that counts every change to its contents.
///
/// There are exactly two ways to change the contents: [`TrackedBuffer::set`]
/// replaces the whole matrix and [`TrackedBuffer::modify`] edits values in
/// place through a view whose shape cannot change. Both bump
/// [`TrackedBuffer::version`], which is what dependent caches compare against.
/// Readers get a shared borrow from [`TrackedBuffer::view`], so nothing can
/// write through it.
///
/// ```compile_fail
/// use vertexpool::data::TrackedBuffer;
/// use vertexpool::math::Positions;
///
/// let buffer = TrackedBuffer::new(Positions::zeros(2, 2)).unwrap();
/// buffer.view()[(0, 0)] = 1.0;
/// ```
#[derive(Debug, Clone)]
pub struct TrackedBuffer {
    positions: Positions,
    version: u64,
}

impl TrackedBuffer {
    /// Creates a buffer owning `positions`.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError::ZeroDimension` if `positions` has rows but no columns.
    pub fn new(positions: Positions) -> Result<Self> {
        validate(&positions)?;
        Ok(Self {
            positions,
            version: 0,
        })
    }

    /// Creates a buffer with no rows and no columns.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            positions: Positions::zeros(0, 0),
            version: 0,
        }
    }

    /// Replaces the contents and returns the new version.
    ///
    /// The version changes even if `positions` equals the current contents.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError::ZeroDimension` if `positions` has rows but no
    /// columns. The buffer is unchanged on error.
    pub fn set(&mut self, positions: Positions) -> Result<u64> {
        validate(&positions)?;
        self.positions = positions;
        Ok(self.touch())
    }

    /// Edits values in place and bumps the version.
    pub fn modify<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(DMatrixViewMut<'_, Float>) -> R,
    {
        let shape = self.positions.shape();
        let result = f(self.positions.view_mut((0, 0), shape));
        self.touch();
        result
    }

    /// Read-only access to the current contents.
    #[must_use]
    pub fn view(&self) -> &Positions {
        &self.positions
    }

    /// Consumes the buffer, returning the owned matrix.
    #[must_use]
    pub fn into_inner(self) -> Positions {
        self.positions
    }

    /// Counter identifying the current contents.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of rows (vertices).
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.nrows()
    }

    /// Returns `true` if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.nrows() == 0
    }

    /// Number of columns (spatial dimension).
    #[must_use]
    pub fn dim(&self) -> usize {
        self.positions.ncols()
    }

    fn touch(&mut self) -> u64 {
        self.version = self.version.wrapping_add(1);
        self.version
    }
}

impl Default for TrackedBuffer {
    fn default() -> Self {
        Self::empty()
    }
}

pub(crate) fn validate(positions: &Positions) -> Result<()> {
    if positions.nrows() > 0 && positions.ncols() == 0 {
        return Err(ShapeError::ZeroDimension {
            rows: positions.nrows(),
        }
        .into());
    }
    Ok(())
}

/// Builds a position matrix from rows of equal length.
///
/// # Errors
///
/// Returns `ShapeError::Ragged` if the rows differ in length and
/// `ShapeError::ZeroDimension` if they are all empty.
pub fn positions_from_rows<R>(rows: &[R]) -> Result<Positions>
where
    R: AsRef<[Float]>,
{
    let dim = rows.first().map_or(0, |r| r.as_ref().len());
    if let Some((row, r)) = rows
        .iter()
        .enumerate()
        .find(|(_, r)| r.as_ref().len() != dim)
    {
        return Err(ShapeError::Ragged {
            row,
            expected: dim,
            found: r.as_ref().len(),
        }
        .into());
    }
    let positions = Positions::from_fn(rows.len(), dim, |r, c| rows[r].as_ref()[c]);
    validate(&positions)?;
    Ok(positions)
}

/// Builds a position matrix from row-major values with `dim` columns.
///
/// # Errors
///
/// Returns `ShapeError::NotRank2` if `values` cannot be split into rows of
/// `dim` columns.
pub fn positions_from_row_slice(dim: usize, values: &[Float]) -> Result<Positions> {
    if dim == 0 {
        if values.is_empty() {
            return Ok(Positions::zeros(0, 0));
        }
        return Err(ShapeError::NotRank2 {
            len: values.len(),
            width: dim,
        }
        .into());
    }
    if values.len() % dim != 0 {
        return Err(ShapeError::NotRank2 {
            len: values.len(),
            width: dim,
        }
        .into());
    }
    Ok(Positions::from_row_slice(values.len() / dim, dim, values))
}
