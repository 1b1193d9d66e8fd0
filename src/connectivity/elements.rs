use nalgebra::DMatrix;

use crate::data::vstack;
use crate::error::{OperationError, Result, ShapeError};

/// Index matrix: one row per element, one column per element node.
pub type IndexMatrix = DMatrix<usize>;

/// Type of element a connectivity array describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Line segments.
    Edges,
    /// Three-node faces.
    Triangles,
    /// Four-node faces.
    Quadrilaterals,
    /// Four-node volumes.
    Tetrahedra,
    /// Eight-node volumes.
    Hexahedra,
}

impl ElementKind {
    /// Number of vertex indices per element.
    #[must_use]
    pub fn nodes(self) -> usize {
        match self {
            Self::Edges => 2,
            Self::Triangles => 3,
            Self::Quadrilaterals | Self::Tetrahedra => 4,
            Self::Hexahedra => 8,
        }
    }

    /// Lowercase plural name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Edges => "edges",
            Self::Triangles => "triangles",
            Self::Quadrilaterals => "quadrilaterals",
            Self::Tetrahedra => "tetrahedra",
            Self::Hexahedra => "hexahedra",
        }
    }
}

/// Connectivity of a mesh: which vertices each element joins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Elements {
    kind: ElementKind,
    indices: IndexMatrix,
}

impl Elements {
    /// Creates elements of `kind` from an index matrix.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError::ElementWidth` if the column count does not match
    /// the node count of `kind`.
    pub fn new(kind: ElementKind, indices: IndexMatrix) -> Result<Self> {
        check_width(kind, &indices)?;
        Ok(Self { kind, indices })
    }

    /// Creates elements of `kind` from rows of vertex indices.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError::ElementWidth` if any row has the wrong length.
    pub fn from_rows<R>(kind: ElementKind, rows: &[R]) -> Result<Self>
    where
        R: AsRef<[usize]>,
    {
        let width = kind.nodes();
        if let Some(row) = rows.iter().find(|r| r.as_ref().len() != width) {
            return Err(ShapeError::ElementWidth {
                kind,
                expected: width,
                found: row.as_ref().len(),
            }
            .into());
        }
        let indices = IndexMatrix::from_fn(rows.len(), width, |r, c| rows[r].as_ref()[c]);
        Ok(Self { kind, indices })
    }

    /// Element type.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Read-only index matrix.
    #[must_use]
    pub fn indices(&self) -> &IndexMatrix {
        &self.indices
    }

    /// Replaces the index matrix.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError::ElementWidth` if the column count is wrong; the
    /// current indices are kept.
    pub fn set_indices(&mut self, indices: IndexMatrix) -> Result<()> {
        check_width(self.kind, &indices)?;
        self.indices = indices;
        Ok(())
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.nrows()
    }

    /// Returns `true` if there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.nrows() == 0
    }

    /// Largest referenced vertex index.
    #[must_use]
    pub fn max_index(&self) -> Option<usize> {
        self.indices.iter().copied().max()
    }

    /// Checks that every index addresses one of `vertex_count` vertices.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::IndexOutOfRange` for the first bad index.
    pub fn check_range(&self, vertex_count: usize) -> Result<()> {
        match self.indices.iter().find(|&&i| i >= vertex_count) {
            Some(&index) => Err(OperationError::IndexOutOfRange {
                index,
                len: vertex_count,
            }
            .into()),
            None => Ok(()),
        }
    }

    /// Flags, for each of `vertex_count` vertices, whether no element uses it.
    ///
    /// Indices outside `0..vertex_count` are ignored.
    #[must_use]
    pub fn unreferenced_vertices(&self, vertex_count: usize) -> Vec<bool> {
        let mut unreferenced = vec![true; vertex_count];
        for &i in &self.indices {
            if let Some(flag) = unreferenced.get_mut(i) {
                *flag = false;
            }
        }
        unreferenced
    }

    /// Applies `map` to every index; elements touching a removed vertex
    /// (`None`) are dropped.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::IndexOutOfRange` if an index has no entry in
    /// `map`.
    pub fn remap(&self, map: &[Option<usize>]) -> Result<Self> {
        let width = self.indices.ncols();
        let mut kept = Vec::with_capacity(self.indices.len());
        let mut rows = 0;
        for element in self.indices.row_iter() {
            let mut mapped = Vec::with_capacity(width);
            for &old in &element {
                let entry = map.get(old).ok_or(OperationError::IndexOutOfRange {
                    index: old,
                    len: map.len(),
                })?;
                mapped.push(*entry);
            }
            if let Some(mapped) = mapped.into_iter().collect::<Option<Vec<usize>>>() {
                kept.extend(mapped);
                rows += 1;
            }
        }
        Ok(Self {
            kind: self.kind,
            indices: IndexMatrix::from_row_slice(rows, width, &kept),
        })
    }

    /// Copy with `by` added to every index.
    #[must_use]
    pub fn offset(&self, by: usize) -> Self {
        Self {
            kind: self.kind,
            indices: self.indices.map(|i| i + by),
        }
    }

    /// Stacks element blocks of one kind in order, without re-indexing.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::KindMismatch` if the blocks differ in kind and
    /// `OperationError::Empty` for no blocks.
    pub fn stack(parts: &[&Elements]) -> Result<Self> {
        let Some(first) = parts.first() else {
            return Err(OperationError::Empty("element list").into());
        };
        if let Some(other) = parts.iter().find(|p| p.kind != first.kind) {
            return Err(OperationError::KindMismatch {
                expected: first.kind.name().to_owned(),
                found: other.kind.name().to_owned(),
            }
            .into());
        }
        let blocks: Vec<&IndexMatrix> = parts.iter().map(|p| &p.indices).collect();
        Ok(Self {
            kind: first.kind,
            indices: vstack(&blocks, first.kind.nodes()),
        })
    }
}

fn check_width(kind: ElementKind, indices: &IndexMatrix) -> Result<()> {
    if indices.ncols() != kind.nodes() {
        return Err(ShapeError::ElementWidth {
            kind,
            expected: kind.nodes(),
            found: indices.ncols(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn strip() -> Elements {
        Elements::from_rows(ElementKind::Triangles, &[[0, 1, 2], [1, 3, 2]]).unwrap()
    }

    #[test]
    fn width_must_match_kind() {
        assert!(Elements::new(ElementKind::Edges, IndexMatrix::zeros(1, 3)).is_err());
        assert!(Elements::from_rows(ElementKind::Edges, &[vec![0, 1], vec![1]]).is_err());
        let mut e = strip();
        assert!(e.set_indices(IndexMatrix::zeros(2, 4)).is_err());
        assert_eq!(e.len(), 2);
    }

    #[test]
    fn unreferenced_flags() {
        assert_eq!(strip().unreferenced_vertices(5), vec![false, false, false, false, true]);
    }

    #[test]
    fn remap_drops_elements_with_removed_vertices() {
        // Vertex 0 removed, the rest shift down.
        let map = [None, Some(0), Some(1), Some(2)];
        let remapped = strip().remap(&map).unwrap();
        assert_eq!(remapped.len(), 1);
        assert_eq!(remapped.indices(), &IndexMatrix::from_row_slice(1, 3, &[0, 2, 1]));
    }

    #[test]
    fn remap_rejects_short_map() {
        assert!(strip().remap(&[Some(0), Some(1)]).is_err());
    }

    #[test]
    fn check_range_reports_bad_index() {
        assert!(strip().check_range(4).is_ok());
        assert!(strip().check_range(3).is_err());
        assert_eq!(strip().max_index(), Some(3));
    }

    #[test]
    fn stack_and_offset() {
        let a = strip();
        let b = strip().offset(4);
        let stacked = Elements::stack(&[&a, &b]).unwrap();
        assert_eq!(stacked.len(), 4);
        assert_eq!(stacked.indices().row(2).iter().copied().collect::<Vec<_>>(), vec![4, 5, 6]);

        let edges = Elements::from_rows(ElementKind::Edges, &[[0, 1]]).unwrap();
        assert!(Elements::stack(&[&a, &edges]).is_err());
        assert!(Elements::stack(&[]).is_err());
    }
}
