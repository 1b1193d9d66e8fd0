use std::fmt;
use std::ops::Add;
use std::sync::Arc;

use nalgebra::DMatrixViewMut;

use crate::connectivity::{ElementKind, Elements};
use crate::data::{
    positions_from_row_slice, positions_from_rows, tracked_buffer, ComputedData, DataArray,
    Fingerprint, Mask, TrackedBuffer, VertexData,
};
use crate::error::{OperationError, Result, ShapeError};
use crate::math::{
    self, AxisRange, AxisVector, Bounds, Float, MergeParams, Positions, UniqueVertices,
};
use crate::operations::{
    Concat, MergeVertices, RemoveUnreferencedVertices, RemoveVertices, SelectVertices,
    UpdateVertices,
};
use crate::show::{Backend, ShowOptions};

/// What a pool holds besides its vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    /// A bare point pool.
    Vertices,
    /// A mesh whose elements reference the vertices.
    Elements(ElementKind),
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertices => f.write_str("vertices"),
            Self::Elements(kind) => f.write_str(kind.name()),
        }
    }
}

/// A pool of vertex positions with attached per-vertex data and, for mesh
/// pools, element connectivity.
///
/// Positions live in a [`TrackedBuffer`]. Every replacement goes through the
/// pool so that the derived-data cache is dropped and the per-vertex data is
/// revalidated in the same step. Derived quantities such as [`Self::bounds`]
/// are computed on first use and cached until the positions change.
///
/// Reads of derived quantities take `&mut self` because they fill the cache.
/// A pool is a single unit of ownership; share it across threads only behind
/// one lock around the whole pool.
#[derive(Debug)]
pub struct VertexPool {
    buffer: TrackedBuffer,
    elements: Option<Elements>,
    vertex_data: VertexData,
    computed: ComputedData,
    show_options: ShowOptions,
}

impl VertexPool {
    /// Creates a point pool owning `positions`.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError::ZeroDimension` if `positions` has rows but no columns.
    pub fn new(positions: Positions) -> Result<Self> {
        Self::from_parts(positions, None, None)
    }

    /// Creates a point pool with no vertices.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            buffer: TrackedBuffer::empty(),
            elements: None,
            vertex_data: VertexData::new(0),
            computed: ComputedData::default(),
            show_options: ShowOptions::default(),
        }
    }

    /// Creates a point pool from rows of coordinates.
    ///
    /// # Errors
    ///
    /// Returns a `ShapeError` if the rows are ragged or empty.
    pub fn from_rows<R>(rows: &[R]) -> Result<Self>
    where
        R: AsRef<[Float]>,
    {
        Self::new(positions_from_rows(rows)?)
    }

    /// Creates a point pool from row-major values with `dim` columns.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError::NotRank2` if `values` cannot be split into rows of
    /// `dim` columns.
    pub fn from_row_slice(dim: usize, values: &[Float]) -> Result<Self> {
        Self::new(positions_from_row_slice(dim, values)?)
    }

    /// Creates a mesh pool whose `elements` index into `positions`.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::IndexOutOfRange` if an element references a
    /// missing vertex.
    pub fn with_elements(positions: Positions, elements: Elements) -> Result<Self> {
        Self::from_parts(positions, Some(elements), None)
    }

    pub(crate) fn from_parts(
        positions: Positions,
        elements: Option<Elements>,
        vertex_data: Option<VertexData>,
    ) -> Result<Self> {
        let n = positions.nrows();
        if let Some(elements) = &elements {
            elements.check_range(n)?;
        }
        let vertex_data = vertex_data.unwrap_or_else(|| VertexData::new(n));
        check_data_rows(&vertex_data, n)?;
        Ok(Self {
            buffer: TrackedBuffer::new(positions)?,
            elements,
            vertex_data,
            computed: ComputedData::default(),
            show_options: ShowOptions::default(),
        })
    }

    /// Whether this is a point pool or which elements it carries.
    #[must_use]
    pub fn kind(&self) -> PoolKind {
        self.elements
            .as_ref()
            .map_or(PoolKind::Vertices, |e| PoolKind::Elements(e.kind()))
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if the pool has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Spatial dimension.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.buffer.dim()
    }

    /// Read-only positions, one row per vertex.
    #[must_use]
    pub fn vertices(&self) -> &Positions {
        self.buffer.view()
    }

    /// Version of the positions; changes on every replacement or edit.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.buffer.version()
    }

    /// Replaces the positions, dropping per-vertex data that no longer fits.
    ///
    /// # Errors
    ///
    /// Returns a `ShapeError` for positions with rows but no columns, or
    /// `OperationError::IndexOutOfRange` if existing elements would reference
    /// missing vertices. Nothing changes on error.
    pub fn set_vertices(&mut self, positions: Positions) -> Result<()> {
        self.replace_vertices(positions, false)
    }

    /// Replaces the positions, failing instead of dropping per-vertex data
    /// that no longer fits.
    ///
    /// # Errors
    ///
    /// As [`Self::set_vertices`], plus `DataError::LengthMismatch` if any
    /// per-vertex array has a different row count. Nothing changes on error.
    pub fn set_vertices_strict(&mut self, positions: Positions) -> Result<()> {
        self.replace_vertices(positions, true)
    }

    fn replace_vertices(&mut self, positions: Positions, strict: bool) -> Result<()> {
        tracing::debug!(rows = positions.nrows(), cols = positions.ncols(), "setting vertices");
        tracked_buffer::validate(&positions)?;
        if let Some(elements) = &self.elements {
            elements.check_range(positions.nrows())?;
        }
        self.vertex_data.revalidate(positions.nrows(), strict)?;
        self.buffer.set(positions)?;
        self.computed.invalidate();
        Ok(())
    }

    /// Edits positions in place. The shape is fixed, so per-vertex data stays
    /// valid, but every cached quantity is dropped.
    pub fn modify_vertices<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(DMatrixViewMut<'_, Float>) -> R,
    {
        let result = self.buffer.modify(f);
        self.computed.invalidate();
        result
    }

    /// Swaps in a new set of positions together with matching elements and
    /// per-vertex data.
    pub(crate) fn commit(
        &mut self,
        positions: Positions,
        elements: Option<Elements>,
        vertex_data: VertexData,
    ) -> Result<()> {
        tracked_buffer::validate(&positions)?;
        if let Some(elements) = &elements {
            elements.check_range(positions.nrows())?;
        }
        check_data_rows(&vertex_data, positions.nrows())?;
        self.buffer.set(positions)?;
        self.computed.invalidate();
        self.elements = elements;
        self.vertex_data = vertex_data;
        Ok(())
    }

    /// Element connectivity, for mesh pools.
    #[must_use]
    pub fn elements(&self) -> Option<&Elements> {
        self.elements.as_ref()
    }

    /// Replaces the element connectivity of a mesh pool.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::KindMismatch` if the pool is a point pool or
    /// holds another element kind, and `OperationError::IndexOutOfRange` if an
    /// element references a missing vertex.
    pub fn set_elements(&mut self, elements: Elements) -> Result<()> {
        let expected = self.kind();
        let found = PoolKind::Elements(elements.kind());
        if expected != found {
            return Err(OperationError::KindMismatch {
                expected: expected.to_string(),
                found: found.to_string(),
            }
            .into());
        }
        elements.check_range(self.len())?;
        self.elements = Some(elements);
        Ok(())
    }

    /// Per-vertex data.
    #[must_use]
    pub fn vertex_data(&self) -> &VertexData {
        &self.vertex_data
    }

    /// Attaches `values` to the vertices under `key`.
    ///
    /// # Errors
    ///
    /// Returns `DataError::LengthMismatch` if `values` does not have one row
    /// per vertex.
    pub fn insert_vertex_data(
        &mut self,
        key: impl Into<String>,
        values: DataArray,
    ) -> Result<Option<DataArray>> {
        self.vertex_data.insert(key, values)
    }

    /// Detaches the data stored under `key`.
    pub fn remove_vertex_data(&mut self, key: &str) -> Option<DataArray> {
        self.vertex_data.remove(key)
    }

    /// Display options.
    #[must_use]
    pub fn show_options(&self) -> &ShowOptions {
        &self.show_options
    }

    /// Mutable display options.
    pub fn show_options_mut(&mut self) -> &mut ShowOptions {
        &mut self.show_options
    }

    /// Hands the read-only positions and display options to `backend`.
    pub fn showable<B: Backend>(&self, backend: &B) -> B::Showable {
        backend.points(self.buffer.view(), &self.show_options)
    }

    /// Cached derived quantities.
    #[must_use]
    pub fn computed(&self) -> &ComputedData {
        &self.computed
    }

    // --- Derived quantities ---

    /// Per-axis minimum and maximum of the positions.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::Empty` for a pool without vertices.
    pub fn bounds(&mut self) -> Result<Bounds> {
        let fingerprint = Fingerprint::new(self.buffer.version());
        let positions = self.buffer.view();
        self.computed.bounds.compute_or_fetch(fingerprint, false, || {
            tracing::debug!("computing bounds");
            math::bounds(positions)
        })
    }

    /// `bounds().max - bounds().min`.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::Empty` for a pool without vertices.
    pub fn bounds_diagonal(&mut self) -> Result<AxisVector> {
        let bounds = self.bounds()?;
        let fingerprint = Fingerprint::new(self.buffer.version());
        self.computed
            .bounds_diagonal
            .compute_or_fetch(fingerprint, false, || {
                tracing::debug!("computing bounds diagonal");
                Ok(bounds.diagonal())
            })
    }

    /// Euclidean length of [`Self::bounds_diagonal`].
    ///
    /// # Errors
    ///
    /// Returns `OperationError::Empty` for a pool without vertices.
    pub fn bounds_diagonal_norm(&mut self) -> Result<Float> {
        let diagonal = self.bounds_diagonal()?;
        let fingerprint = Fingerprint::new(self.buffer.version());
        self.computed
            .bounds_diagonal_norm
            .compute_or_fetch(fingerprint, false, || {
                tracing::debug!("computing bounds diagonal norm");
                Ok(diagonal.norm())
            })
    }

    /// Clusters vertices within `tolerance` (default [`math::TOLERANCE`]) of
    /// each other.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` for a negative tolerance.
    pub fn unique_vertices(&mut self, tolerance: Option<Float>) -> Result<Arc<UniqueVertices>> {
        let params = tolerance.map_or_else(MergeParams::default, MergeParams::with_tolerance);
        self.unique_vertices_with(params, false)
    }

    /// Clusters vertices under `params`; `recompute` bypasses the cache.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` for a negative tolerance.
    pub fn unique_vertices_with(
        &mut self,
        params: MergeParams,
        recompute: bool,
    ) -> Result<Arc<UniqueVertices>> {
        let fingerprint = Fingerprint::with_parameters(self.buffer.version(), params.fingerprint());
        let positions = self.buffer.view();
        self.computed
            .unique_vertices
            .compute_or_fetch(fingerprint, recompute, || {
                tracing::debug!(tolerance = ?params.tolerance, "computing unique vertices");
                math::close_rows(positions, params).map(Arc::new)
            })
    }

    // --- Operations ---

    /// Keeps only the vertices selected by `mask`, in place.
    ///
    /// `inverse` maps each current vertex to its new index, `None` for
    /// removed vertices; without it the map is derived from `mask`. See
    /// [`UpdateVertices`].
    ///
    /// # Errors
    ///
    /// Returns an error if `mask` or `inverse` do not fit the pool.
    pub fn update_vertices(
        &mut self,
        mask: impl Into<Mask>,
        inverse: Option<&[Option<usize>]>,
    ) -> Result<&mut Self> {
        let mut update = UpdateVertices::new(mask);
        if let Some(inverse) = inverse {
            update = update.with_inverse(inverse.to_vec());
        }
        update.execute(self)?;
        Ok(self)
    }

    /// Indices of vertices inside `ranges` on every axis.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError::DimensionMismatch` unless there is one range per axis.
    pub fn select_vertices(&self, ranges: &[AxisRange]) -> Result<Vec<usize>> {
        SelectVertices::new(ranges.to_vec()).execute(self)
    }

    /// Removes the vertices with the given ids.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::IndexOutOfRange` for an id past the end.
    pub fn remove_vertices(&mut self, ids: &[usize]) -> Result<&mut Self> {
        RemoveVertices::new(ids.to_vec()).execute(self)?;
        Ok(self)
    }

    /// Merges vertices within `tolerance` (default [`math::TOLERANCE`]).
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` for a negative tolerance.
    pub fn merge_vertices(&mut self, tolerance: Option<Float>) -> Result<&mut Self> {
        let params = tolerance.map_or_else(MergeParams::default, MergeParams::with_tolerance);
        self.merge_vertices_with(params)
    }

    /// Merges vertices under `params`.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` for a negative tolerance.
    pub fn merge_vertices_with(&mut self, params: MergeParams) -> Result<&mut Self> {
        MergeVertices::new(params).execute(self)?;
        Ok(self)
    }

    /// Removes vertices no element references. No-op for point pools.
    ///
    /// # Errors
    ///
    /// Returns an error if the elements reference missing vertices.
    pub fn remove_unreferenced_vertices(&mut self) -> Result<&mut Self> {
        RemoveUnreferencedVertices.execute(self)?;
        Ok(self)
    }

    /// Concatenates pools of one kind into a new pool. See [`Concat`].
    ///
    /// # Errors
    ///
    /// Returns `OperationError::KindMismatch` for mixed kinds,
    /// `ShapeError::DimensionMismatch` for mixed dimensions and
    /// `OperationError::Empty` for no pools.
    pub fn concat(pools: &[&VertexPool]) -> Result<VertexPool> {
        Concat::new(pools.to_vec()).execute()
    }
}

fn check_data_rows(vertex_data: &VertexData, rows: usize) -> Result<()> {
    if vertex_data.rows() != rows {
        return Err(ShapeError::LengthMismatch {
            what: "vertex data",
            expected: rows,
            found: vertex_data.rows(),
        }
        .into());
    }
    Ok(())
}

impl Default for VertexPool {
    fn default() -> Self {
        Self::empty()
    }
}

/// Deep copy. Cached quantities are not carried over; they are recomputed on
/// demand.
impl Clone for VertexPool {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
            elements: self.elements.clone(),
            vertex_data: self.vertex_data.clone(),
            computed: ComputedData::default(),
            show_options: self.show_options.clone(),
        }
    }
}

impl Add for &VertexPool {
    type Output = Result<VertexPool>;

    fn add(self, rhs: Self) -> Self::Output {
        VertexPool::concat(&[self, rhs])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{DataError, PoolError};
    use approx::assert_relative_eq;

    fn pool() -> VertexPool {
        crate::init_test_tracing();
        VertexPool::from_rows(&[[0.0, 0.0], [0.0, 0.0001], [5.0, 5.0]]).unwrap()
    }

    fn column(values: &[Float]) -> DataArray {
        DataArray::from_column_slice(values.len(), 1, values)
    }

    #[test]
    fn construction_and_accessors() {
        let p = pool();
        assert_eq!(p.len(), 3);
        assert_eq!(p.dim(), 2);
        assert_eq!(p.kind(), PoolKind::Vertices);
        assert_eq!(p.kind().to_string(), "vertices");
        assert!(VertexPool::empty().is_empty());
        assert!(VertexPool::new(Positions::zeros(2, 0)).is_err());
        assert_eq!(VertexPool::from_row_slice(3, &[0.0; 6]).unwrap().len(), 2);
        assert!(VertexPool::from_row_slice(3, &[0.0; 5]).is_err());
    }

    #[test]
    fn bounds_are_cached_until_positions_change() {
        let mut p = pool();
        let b = p.bounds().unwrap();
        assert_relative_eq!(b.max, AxisVector::from_vec(vec![5.0, 5.0]));
        assert!(p.computed().bounds.get(Fingerprint::new(p.version())).is_some());

        p.set_vertices(Positions::from_row_slice(1, 2, &[-1.0, 2.0])).unwrap();
        assert!(p.computed().is_empty());
        let b = p.bounds().unwrap();
        assert_relative_eq!(b.min, AxisVector::from_vec(vec![-1.0, 2.0]));
    }

    #[test]
    fn identical_reassignment_still_invalidates() {
        let mut p = pool();
        p.bounds().unwrap();
        let version = p.version();
        let same = p.vertices().clone();
        p.set_vertices(same).unwrap();
        assert_ne!(p.version(), version);
        assert!(p.computed().is_empty());
        let expected = (50.0 as Float).sqrt();
        assert_relative_eq!(p.bounds_diagonal_norm().unwrap(), expected, epsilon = 1e-6);
    }

    #[test]
    fn modify_vertices_invalidates_cache() {
        let mut p = pool();
        p.bounds().unwrap();
        p.modify_vertices(|mut v| v[(2, 0)] = 9.0);
        assert!(p.computed().is_empty());
        assert_relative_eq!(p.bounds_diagonal().unwrap(), AxisVector::from_vec(vec![9.0, 5.0]));
    }

    #[test]
    fn bounds_of_empty_pool_fail() {
        let mut p = VertexPool::empty();
        assert!(matches!(
            p.bounds(),
            Err(PoolError::Operation(OperationError::Empty(_)))
        ));
    }

    #[test]
    fn unique_vertices_example() {
        let mut p = pool();
        let unique = p.unique_vertices(Some(0.001)).unwrap();
        assert_eq!(unique.ids, vec![0, 2]);
        assert_eq!(unique.inverse, vec![0, 0, 1]);

        // Cached per tolerance.
        let again = p.unique_vertices(Some(0.001)).unwrap();
        assert!(Arc::ptr_eq(&unique, &again));
        let tighter = p.unique_vertices(None).unwrap();
        assert_eq!(tighter.len(), 3);
        let forced = p.unique_vertices_with(MergeParams::default(), true).unwrap();
        assert!(!Arc::ptr_eq(&tighter, &forced));
    }

    #[test]
    fn set_vertices_drops_mismatched_data() {
        let mut p = pool();
        p.insert_vertex_data("t", column(&[1.0, 2.0, 3.0])).unwrap();
        p.set_vertices(Positions::zeros(2, 2)).unwrap();
        assert!(p.vertex_data().is_empty());
        assert_eq!(p.vertex_data().rows(), 2);
    }

    #[test]
    fn strict_set_vertices_fails_without_changes() {
        let mut p = pool();
        p.insert_vertex_data("t", column(&[1.0, 2.0, 3.0])).unwrap();
        let version = p.version();
        let err = p.set_vertices_strict(Positions::zeros(2, 2)).unwrap_err();
        assert!(matches!(err, PoolError::Data(DataError::LengthMismatch { .. })));
        assert_eq!(p.version(), version);
        assert_eq!(p.len(), 3);
        assert!(p.vertex_data().contains_key("t"));
    }

    #[test]
    fn insert_vertex_data_checks_rows() {
        let mut p = pool();
        assert!(p.insert_vertex_data("bad", column(&[1.0])).is_err());
        assert!(p.insert_vertex_data("good", column(&[1.0, 2.0, 3.0])).is_ok());
        assert!(p.remove_vertex_data("good").is_some());
    }

    #[test]
    fn clone_is_deep_and_drops_cache() {
        let mut p = pool();
        p.insert_vertex_data("t", column(&[1.0, 2.0, 3.0])).unwrap();
        p.show_options_mut().set_radius(3).unwrap();
        p.bounds().unwrap();

        let mut copy = p.clone();
        assert!(copy.computed().is_empty());
        assert_eq!(copy.show_options(), p.show_options());
        copy.remove_vertices(&[0]).unwrap();
        copy.show_options_mut().set_radius(8).unwrap();

        assert_eq!(p.len(), 3);
        assert_eq!(p.vertex_data().get("t").unwrap().nrows(), 3);
        assert_ne!(copy.show_options(), p.show_options());
    }

    #[test]
    fn mesh_pool_kind_and_element_checks() {
        let positions = Positions::from_row_slice(3, 2, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
        let tri = Elements::from_rows(ElementKind::Triangles, &[[0, 1, 2]]).unwrap();
        let mut mesh = VertexPool::with_elements(positions.clone(), tri).unwrap();
        assert_eq!(mesh.kind(), PoolKind::Elements(ElementKind::Triangles));

        let bad = Elements::from_rows(ElementKind::Triangles, &[[0, 1, 3]]).unwrap();
        assert!(VertexPool::with_elements(positions, bad.clone()).is_err());
        assert!(mesh.set_elements(bad).is_err());

        let edges = Elements::from_rows(ElementKind::Edges, &[[0, 1]]).unwrap();
        assert!(mesh.set_elements(edges.clone()).is_err());
        assert!(pool().set_elements(edges).is_err());

        // Shrinking positions below what elements reference is rejected.
        assert!(mesh.set_vertices(Positions::zeros(2, 2)).is_err());
        assert_eq!(mesh.len(), 3);
    }

    struct RecordingBackend;

    impl Backend for RecordingBackend {
        type Showable = (usize, Option<u32>);

        fn points(&self, positions: &Positions, options: &ShowOptions) -> Self::Showable {
            (positions.nrows(), options.radius().map(std::num::NonZeroU32::get))
        }
    }

    #[test]
    fn showable_receives_positions_and_options() {
        let mut p = pool();
        p.show_options_mut().set_radius(6).unwrap();
        assert_eq!(p.showable(&RecordingBackend), (3, Some(6)));
    }
}
