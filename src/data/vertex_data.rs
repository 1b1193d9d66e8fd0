use std::collections::BTreeMap;

use nalgebra::DMatrix;

use super::{select_rows, vstack, Mask};
use crate::error::{DataError, Result};
use crate::math::{AxisVector, Float};

/// Per-vertex array: one row per vertex, any number of columns.
pub type DataArray = DMatrix<Float>;

/// Named per-vertex arrays kept row-aligned with a pool's positions.
///
/// Every stored array has exactly [`VertexData::rows`] rows. When the pool's
/// vertex count changes, [`VertexData::revalidate`] either drops the arrays
/// that no longer fit or reports the first one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexData {
    rows: usize,
    entries: BTreeMap<String, DataArray>,
}

impl VertexData {
    /// Creates an empty table for `rows` vertices.
    #[must_use]
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            entries: BTreeMap::new(),
        }
    }

    /// Row count every array must have.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of stored arrays.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no arrays are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stores `values` under `key`, returning the array it replaces.
    ///
    /// # Errors
    ///
    /// Returns `DataError::LengthMismatch` if `values` does not have
    /// [`VertexData::rows`] rows.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        values: DataArray,
    ) -> Result<Option<DataArray>> {
        let key = key.into();
        if values.nrows() != self.rows {
            return Err(DataError::LengthMismatch {
                key,
                expected: self.rows,
                found: values.nrows(),
            }
            .into());
        }
        Ok(self.entries.insert(key, values))
    }

    /// Array stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&DataArray> {
        self.entries.get(key)
    }

    /// Returns `true` if an array is stored under `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes and returns the array stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<DataArray> {
        self.entries.remove(key)
    }

    /// Removes every array.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Stored keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Stored `(key, array)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataArray)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Re-synchronizes the table with a vertex count of `rows`.
    ///
    /// Without `strict`, arrays whose row count differs are dropped and their
    /// keys returned. With `strict`, the first mismatch is reported and the
    /// table is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `DataError::LengthMismatch` in strict mode.
    pub fn revalidate(&mut self, rows: usize, strict: bool) -> Result<Vec<String>> {
        let stale: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, values)| values.nrows() != rows)
            .map(|(key, _)| key.clone())
            .collect();

        if strict {
            if let Some(key) = stale.into_iter().next() {
                let found = self.entries.get(&key).map_or(0, DataArray::nrows);
                return Err(DataError::LengthMismatch {
                    key,
                    expected: rows,
                    found,
                }
                .into());
            }
            self.rows = rows;
            return Ok(Vec::new());
        }

        for key in &stale {
            tracing::warn!(key = %key, rows, "dropping vertex data with mismatched length");
            self.entries.remove(key);
        }
        self.rows = rows;
        Ok(stale)
    }

    /// New table holding the rows selected by `mask`, keys preserved.
    ///
    /// # Errors
    ///
    /// Returns an error if `mask` does not fit [`VertexData::rows`].
    pub fn apply_mask(&self, mask: &Mask) -> Result<Self> {
        let selected = mask.resolve(self.rows)?;
        Ok(self.select_rows(&selected))
    }

    pub(crate) fn select_rows(&self, selected: &[usize]) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|(key, values)| (key.clone(), select_rows(values, selected)))
            .collect();
        Self {
            rows: selected.len(),
            entries,
        }
    }

    /// Stacks the tables row-wise in order.
    ///
    /// Only keys present in every table survive, and only if their column
    /// counts agree. Missing rows are never fabricated.
    #[must_use]
    pub fn merge_on_concat(tables: &[&VertexData]) -> Self {
        let rows = tables.iter().map(|t| t.rows).sum();
        let Some((first, rest)) = tables.split_first() else {
            return Self::new(rows);
        };

        let mut entries = BTreeMap::new();
        for (key, values) in &first.entries {
            let parts: Option<Vec<&DataArray>> = std::iter::once(Some(values))
                .chain(rest.iter().map(|t| t.entries.get(key)))
                .collect();
            let Some(parts) = parts else {
                tracing::debug!(key = %key, "vertex data missing from a concat input, dropping");
                continue;
            };
            let cols = values.ncols();
            if parts.iter().any(|p| p.ncols() != cols) {
                tracing::debug!(
                    key = %key,
                    "vertex data widths differ across concat inputs, dropping"
                );
                continue;
            }
            entries.insert(key.clone(), vstack(&parts, cols));
        }
        Self { rows, entries }
    }

    /// Per-row Euclidean norm of the array under `key`; single-column arrays
    /// are returned as they are.
    ///
    /// # Errors
    ///
    /// Returns `DataError::MissingKey` if nothing is stored under `key`.
    pub fn as_scalar(&self, key: &str) -> Result<AxisVector> {
        let values = self
            .entries
            .get(key)
            .ok_or_else(|| DataError::MissingKey(key.to_owned()))?;
        if values.ncols() == 1 {
            return Ok(values.column(0).into_owned());
        }
        Ok(AxisVector::from_iterator(
            values.nrows(),
            values.row_iter().map(|row| row.norm()),
        ))
    }
}
