use thiserror::Error;

use crate::connectivity::ElementKind;

/// Top-level error type for vertex pool operations.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Errors related to array shapes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("row {row} has {found} columns, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("{len} values cannot be split into rows of width {width}")]
    NotRank2 { len: usize, width: usize },

    #[error("positions with {rows} rows must have at least one column")]
    ZeroDimension { rows: usize },

    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("{what} has length {found}, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{kind:?} elements have {expected} nodes, found {found} columns")]
    ElementWidth {
        kind: ElementKind,
        expected: usize,
        found: usize,
    },
}

/// Errors related to attached vertex data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataError {
    #[error("vertex data `{key}` has {found} rows, expected {expected}")]
    LengthMismatch {
        key: String,
        expected: usize,
        found: usize,
    },

    #[error("no vertex data named `{0}`")]
    MissingKey(String),
}

/// Errors related to pool operations.
#[derive(Debug, Error, PartialEq)]
pub enum OperationError {
    #[error("cannot combine {expected} with {found}")]
    KindMismatch { expected: String, found: String },

    #[error("index {index} is out of range for {len} vertices")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} is empty")]
    Empty(&'static str),
}

/// Convenience type alias for results using [`PoolError`].
pub type Result<T> = std::result::Result<T, PoolError>;
