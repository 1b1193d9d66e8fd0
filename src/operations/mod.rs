//! Operations that reindex a vertex pool.
//!
//! Each operation is a small struct built with `new` and run with `execute`.
//! In-place operations take the pool mutably and leave it untouched on error.

mod concat;
mod merge;
mod remove;
mod select;
mod unreferenced;
mod update;

pub use concat::Concat;
pub use merge::MergeVertices;
pub use remove::RemoveVertices;
pub use select::SelectVertices;
pub use unreferenced::RemoveUnreferencedVertices;
pub use update::UpdateVertices;
