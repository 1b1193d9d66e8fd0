use crate::data::Mask;
use crate::error::Result;
use crate::math::MergeParams;
use crate::operations::UpdateVertices;
use crate::vertices::VertexPool;

/// Collapses each cluster of nearby vertices onto its lowest-index member.
///
/// Elements are re-pointed at the surviving representatives and per-vertex
/// data keeps the representatives' rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeVertices {
    params: MergeParams,
}

impl MergeVertices {
    /// Creates a new `MergeVertices` operation.
    #[must_use]
    pub fn new(params: MergeParams) -> Self {
        Self { params }
    }

    /// Executes the merge, modifying the pool in place.
    ///
    /// A pool without duplicates is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` for a negative or NaN tolerance.
    pub fn execute(&self, pool: &mut VertexPool) -> Result<()> {
        let unique = pool.unique_vertices_with(self.params, false)?;
        if !unique.has_duplicates() {
            tracing::debug!(vertices = pool.len(), "no vertices to merge");
            return Ok(());
        }

        let before = pool.len();
        let inverse = unique.inverse.iter().copied().map(Some).collect();
        UpdateVertices::new(Mask::Ids(unique.ids.clone()))
            .with_inverse(inverse)
            .execute(pool)?;
        tracing::debug!(
            before,
            after = pool.len(),
            tolerance = ?self.params.tolerance,
            "merged vertices"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::connectivity::{ElementKind, Elements, IndexMatrix};
    use crate::data::DataArray;
    use crate::math::Positions;

    #[test]
    fn merges_close_pair() {
        crate::init_test_tracing();
        let mut pool = VertexPool::from_rows(&[[0.0, 0.0], [0.0, 0.0001], [5.0, 5.0]]).unwrap();
        pool.insert_vertex_data("t", DataArray::from_column_slice(3, 1, &[1.0, 2.0, 3.0]))
            .unwrap();
        MergeVertices::new(MergeParams::with_tolerance(0.001))
            .execute(&mut pool)
            .unwrap();
        assert_eq!(pool.vertices(), &Positions::from_row_slice(2, 2, &[0.0, 0.0, 5.0, 5.0]));
        assert_eq!(pool.vertex_data().get("t").unwrap().as_slice(), &[1.0, 3.0]);
    }

    #[test]
    fn second_merge_is_a_noop() {
        let mut pool = VertexPool::from_rows(&[[0.0], [0.05], [0.1], [3.0]]).unwrap();
        let merge = MergeVertices::new(MergeParams::with_tolerance(0.06));
        merge.execute(&mut pool).unwrap();
        let len = pool.len();
        let version = pool.version();
        merge.execute(&mut pool).unwrap();
        assert_eq!(pool.len(), len);
        assert_eq!(pool.version(), version);
    }

    #[test]
    fn elements_follow_representatives() {
        crate::init_test_tracing();
        // Two triangles that share an edge, stored with duplicated vertices.
        let positions = Positions::from_row_slice(
            6,
            2,
            &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
        );
        let tri = Elements::from_rows(ElementKind::Triangles, &[[0, 1, 2], [3, 4, 5]]).unwrap();
        let mut pool = VertexPool::with_elements(positions, tri).unwrap();

        MergeVertices::default().execute(&mut pool).unwrap();

        assert_eq!(pool.len(), 4);
        assert_eq!(
            pool.elements().unwrap().indices(),
            &IndexMatrix::from_row_slice(2, 3, &[0, 1, 2, 1, 3, 2])
        );
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let mut pool = VertexPool::from_rows(&[[0.0], [0.0]]).unwrap();
        assert!(MergeVertices::new(MergeParams::with_tolerance(-1.0)).execute(&mut pool).is_err());
        assert_eq!(pool.len(), 2);
    }
}
