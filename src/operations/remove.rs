use crate::data::Mask;
use crate::error::Result;
use crate::operations::UpdateVertices;
use crate::vertices::VertexPool;

/// Removes vertices by index.
#[derive(Debug, Clone)]
pub struct RemoveVertices {
    ids: Vec<usize>,
}

impl RemoveVertices {
    /// Creates a new `RemoveVertices` operation. Repeated ids are fine.
    #[must_use]
    pub fn new(ids: Vec<usize>) -> Self {
        Self { ids }
    }

    /// Executes the removal, modifying the pool in place.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::IndexOutOfRange` for an id past the end; the
    /// pool is unchanged.
    pub fn execute(&self, pool: &mut VertexPool) -> Result<()> {
        let mask = Mask::excluding(pool.len(), &self.ids)?;
        UpdateVertices::new(mask).execute(pool)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::data::DataArray;

    fn pool() -> VertexPool {
        let mut pool = VertexPool::from_rows(&[[0.0], [1.0], [2.0]]).unwrap();
        pool.insert_vertex_data("w", DataArray::from_column_slice(3, 1, &[5.0, 6.0, 7.0]))
            .unwrap();
        pool
    }

    #[test]
    fn matches_flag_update() {
        let mut removed = pool();
        RemoveVertices::new(vec![1]).execute(&mut removed).unwrap();
        let mut updated = pool();
        UpdateVertices::new([true, false, true]).execute(&mut updated).unwrap();
        assert_eq!(removed.vertices(), updated.vertices());
        assert_eq!(removed.vertex_data(), updated.vertex_data());
    }

    #[test]
    fn nothing_to_remove_is_a_noop() {
        let mut p = pool();
        let version = p.version();
        RemoveVertices::new(Vec::new()).execute(&mut p).unwrap();
        assert_eq!(p.version(), version);
    }

    #[test]
    fn out_of_range_id_fails() {
        let mut p = pool();
        assert!(RemoveVertices::new(vec![3]).execute(&mut p).is_err());
        assert_eq!(p.len(), 3);
    }
}
