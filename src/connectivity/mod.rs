//! Element connectivity carried by non-point pools.

mod elements;

pub use elements::{ElementKind, Elements, IndexMatrix};
