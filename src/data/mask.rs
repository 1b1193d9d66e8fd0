use crate::error::{OperationError, Result, ShapeError};

/// Selection of vertex rows, either as a keep-flag per row or as row indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mask {
    /// One flag per row; `true` keeps the row.
    Keep(Vec<bool>),
    /// Indices of the rows to keep, in output order.
    Ids(Vec<usize>),
}

impl Mask {
    /// Mask keeping every one of `len` rows except `ids`.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::IndexOutOfRange` if any id is `>= len`.
    pub fn excluding(len: usize, ids: &[usize]) -> Result<Self> {
        let mut keep = vec![true; len];
        for &id in ids {
            *keep
                .get_mut(id)
                .ok_or(OperationError::IndexOutOfRange { index: id, len })? = false;
        }
        Ok(Self::Keep(keep))
    }

    /// Number of flags or ids.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Keep(flags) => flags.len(),
            Self::Ids(ids) => ids.len(),
        }
    }

    /// Returns `true` if the mask holds no flags or ids.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` for masks that leave every one of `len` rows in place:
    /// empty masks and all-`true` flag masks with one flag per row.
    #[must_use]
    pub fn is_noop(&self, len: usize) -> bool {
        match self {
            Self::Keep(flags) => {
                flags.is_empty() || (flags.len() == len && flags.iter().all(|&keep| keep))
            }
            Self::Ids(ids) => ids.is_empty(),
        }
    }

    /// Resolves the mask into the indices of the selected rows out of `len`.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError::LengthMismatch` if a flag mask does not have `len`
    /// entries and `OperationError::IndexOutOfRange` if an id is `>= len`.
    pub fn resolve(&self, len: usize) -> Result<Vec<usize>> {
        match self {
            Self::Keep(flags) => {
                if flags.len() != len {
                    return Err(ShapeError::LengthMismatch {
                        what: "mask",
                        expected: len,
                        found: flags.len(),
                    }
                    .into());
                }
                Ok(flags
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &keep)| keep.then_some(i))
                    .collect())
            }
            Self::Ids(ids) => {
                if let Some(&index) = ids.iter().find(|&&id| id >= len) {
                    return Err(OperationError::IndexOutOfRange { index, len }.into());
                }
                Ok(ids.clone())
            }
        }
    }
}

impl From<Vec<bool>> for Mask {
    fn from(flags: Vec<bool>) -> Self {
        Self::Keep(flags)
    }
}

impl From<&[bool]> for Mask {
    fn from(flags: &[bool]) -> Self {
        Self::Keep(flags.to_vec())
    }
}

impl<const N: usize> From<[bool; N]> for Mask {
    fn from(flags: [bool; N]) -> Self {
        Self::Keep(flags.to_vec())
    }
}

impl From<Vec<usize>> for Mask {
    fn from(ids: Vec<usize>) -> Self {
        Self::Ids(ids)
    }
}

impl From<&[usize]> for Mask {
    fn from(ids: &[usize]) -> Self {
        Self::Ids(ids.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Mask {
    fn from(ids: [usize; N]) -> Self {
        Self::Ids(ids.to_vec())
    }
}
