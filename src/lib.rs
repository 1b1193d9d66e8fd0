//! Vertex pools: point clouds and mesh vertices with per-vertex data, cached
//! derived quantities, tolerance merging and structure-preserving
//! concatenation.
//!
//! ```
//! use vertexpool::VertexPool;
//!
//! let mut pool = VertexPool::from_rows(&[[0.0, 0.0], [0.0, 0.0001], [5.0, 5.0]])?;
//! pool.merge_vertices(Some(0.001))?;
//! assert_eq!(pool.len(), 2);
//! assert_eq!(pool.bounds_diagonal()?.as_slice(), &[5.0, 5.0]);
//! # Ok::<(), vertexpool::PoolError>(())
//! ```

pub mod connectivity;
pub mod data;
pub mod error;
pub mod math;
pub mod operations;
pub mod show;
pub mod vertices;

pub use connectivity::{ElementKind, Elements};
pub use data::{Mask, VertexData};
pub use error::{PoolError, Result};
pub use math::{AxisRange, Float, MergeParams, Metric, Positions, UniqueVertices, TOLERANCE};
pub use vertices::{PoolKind, VertexPool};

#[cfg(test)]
pub(crate) fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
