use crate::connectivity::Elements;
use crate::data::{vstack, VertexData};
use crate::error::{OperationError, Result, ShapeError};
use crate::math::Positions;
use crate::operations::RemoveUnreferencedVertices;
use crate::vertices::VertexPool;

/// Joins pools of one kind into a new pool.
///
/// Inputs are stacked in order. Each input first loses the vertices its own
/// elements leave unreferenced, then its element indices are shifted by the
/// number of vertices stacked before it. Per-vertex data survives only for
/// keys present in every input with matching widths.
///
/// The inputs are not modified.
#[derive(Debug, Clone)]
pub struct Concat<'a> {
    pools: Vec<&'a VertexPool>,
}

impl<'a> Concat<'a> {
    /// Creates a new `Concat` operation over `pools`, in order.
    #[must_use]
    pub fn new(pools: Vec<&'a VertexPool>) -> Self {
        Self { pools }
    }

    /// Executes the concatenation, returning the joined pool.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::Empty` for no inputs,
    /// `OperationError::KindMismatch` if the inputs are of different kinds and
    /// `ShapeError::DimensionMismatch` if non-empty inputs differ in
    /// dimension.
    pub fn execute(&self) -> Result<VertexPool> {
        let Some(first) = self.pools.first() else {
            return Err(OperationError::Empty("pool list").into());
        };
        let kind = first.kind();
        if let Some(other) = self.pools.iter().find(|p| p.kind() != kind) {
            return Err(OperationError::KindMismatch {
                expected: kind.to_string(),
                found: other.kind().to_string(),
            }
            .into());
        }
        let dim = common_dimension(&self.pools)?;

        let mut parts = Vec::with_capacity(self.pools.len());
        for pool in &self.pools {
            let mut part = (*pool).clone();
            RemoveUnreferencedVertices.execute(&mut part)?;
            parts.push(part);
        }

        let blocks: Vec<&Positions> = parts
            .iter()
            .filter(|p| !p.is_empty())
            .map(VertexPool::vertices)
            .collect();
        let positions = vstack(&blocks, dim);

        let mut offset = 0;
        let mut shifted = Vec::new();
        for part in &parts {
            if let Some(elements) = part.elements() {
                shifted.push(elements.offset(offset));
            }
            offset += part.len();
        }
        let elements = if shifted.is_empty() {
            None
        } else {
            Some(Elements::stack(&shifted.iter().collect::<Vec<_>>())?)
        };

        let tables: Vec<&VertexData> = parts.iter().map(VertexPool::vertex_data).collect();
        let vertex_data = VertexData::merge_on_concat(&tables);

        tracing::debug!(
            inputs = self.pools.len(),
            vertices = positions.nrows(),
            %kind,
            keys = vertex_data.len(),
            "concatenated pools"
        );
        VertexPool::from_parts(positions, elements, Some(vertex_data))
    }
}

/// Dimension shared by every input that has vertices.
fn common_dimension(pools: &[&VertexPool]) -> Result<usize> {
    let mut with_rows = pools.iter().filter(|p| !p.is_empty());
    let Some(first) = with_rows.next() else {
        return Ok(pools.first().map_or(0, |p| p.dim()));
    };
    let dim = first.dim();
    if let Some(other) = with_rows.find(|p| p.dim() != dim) {
        return Err(ShapeError::DimensionMismatch {
            expected: dim,
            found: other.dim(),
        }
        .into());
    }
    Ok(dim)
}
