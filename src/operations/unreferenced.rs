use crate::error::Result;
use crate::operations::UpdateVertices;
use crate::vertices::VertexPool;

/// Drops vertices that no element references.
///
/// Point pools have no elements and are left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveUnreferencedVertices;

impl RemoveUnreferencedVertices {
    /// Executes the pass, modifying the pool in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool fails to reindex.
    pub fn execute(self, pool: &mut VertexPool) -> Result<()> {
        let Some(elements) = pool.elements() else {
            return Ok(());
        };
        let keep: Vec<bool> = elements
            .unreferenced_vertices(pool.len())
            .into_iter()
            .map(|unreferenced| !unreferenced)
            .collect();
        let dropped = keep.iter().filter(|&&k| !k).count();
        if dropped > 0 {
            tracing::debug!(dropped, "removing unreferenced vertices");
        }
        UpdateVertices::new(keep).execute(pool)
    }
}
