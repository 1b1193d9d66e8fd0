//! Memoization of values derived from vertex positions.
//!
//! Each derived quantity owns a [`Memo`] slot. A slot remembers the
//! [`Fingerprint`] it was computed under: the version of the positions buffer
//! plus a bit pattern for any parameters of the computation. A lookup under a
//! different fingerprint recomputes. Replacing the positions clears every slot
//! regardless.

use std::sync::Arc;

use crate::error::Result;
use crate::math::{AxisVector, Bounds, Float, UniqueVertices};

/// Dependency state a cached value was computed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// Version of the positions buffer.
    pub version: u64,
    /// Encoded parameters of the computation, zero if it has none.
    pub parameters: u64,
}

impl Fingerprint {
    /// Fingerprint for a parameterless quantity.
    #[must_use]
    pub fn new(version: u64) -> Self {
        Self {
            version,
            parameters: 0,
        }
    }

    /// Fingerprint for a quantity that depends on `parameters`.
    #[must_use]
    pub fn with_parameters(version: u64, parameters: u64) -> Self {
        Self {
            version,
            parameters,
        }
    }
}

/// A single memoized value.
#[derive(Debug, Clone)]
pub struct Memo<T> {
    entry: Option<(Fingerprint, T)>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self { entry: None }
    }
}

impl<T: Clone> Memo<T> {
    /// Returns the cached value if it was computed under `fingerprint`,
    /// otherwise runs `compute` and caches its result.
    ///
    /// `force` recomputes even if the cached value is current.
    ///
    /// # Errors
    ///
    /// Propagates errors from `compute`; the slot keeps its previous value.
    pub fn compute_or_fetch<F>(
        &mut self,
        fingerprint: Fingerprint,
        force: bool,
        compute: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        if !force {
            if let Some(value) = self.get(fingerprint) {
                tracing::trace!(?fingerprint, "returning cached value");
                return Ok(value.clone());
            }
        }
        let value = compute()?;
        self.entry = Some((fingerprint, value.clone()));
        Ok(value)
    }
}

impl<T> Memo<T> {
    /// Cached value, only if it was computed under `fingerprint`.
    #[must_use]
    pub fn get(&self, fingerprint: Fingerprint) -> Option<&T> {
        self.entry
            .as_ref()
            .filter(|(recorded, _)| *recorded == fingerprint)
            .map(|(_, value)| value)
    }

    /// Returns `true` if a value is stored, current or not.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.entry.is_some()
    }

    /// Drops the stored value.
    pub fn clear(&mut self) {
        self.entry = None;
    }
}

/// Cache of every quantity derived from a pool's positions.
#[derive(Debug, Clone, Default)]
pub struct ComputedData {
    pub(crate) bounds: Memo<Bounds>,
    pub(crate) bounds_diagonal: Memo<AxisVector>,
    pub(crate) bounds_diagonal_norm: Memo<Float>,
    pub(crate) unique_vertices: Memo<Arc<UniqueVertices>>,
}

impl ComputedData {
    /// Drops every cached value.
    pub fn invalidate(&mut self) {
        self.bounds.clear();
        self.bounds_diagonal.clear();
        self.bounds_diagonal_norm.clear();
        self.unique_vertices.clear();
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.bounds.is_set()
            || self.bounds_diagonal.is_set()
            || self.bounds_diagonal_norm.is_set()
            || self.unique_vertices.is_set())
    }
}
