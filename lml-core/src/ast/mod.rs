//! Core data structures for the LML document model.

pub mod bibliography;
pub mod blocks;
pub mod document;
pub mod metadata;

pub use bibliography::{BibEntry, EntryType};
pub use blocks::{Block, BlockKind, ColumnAlignment};
pub use document::DocumentData;
pub use metadata::{DocumentMeta, PageSize};
