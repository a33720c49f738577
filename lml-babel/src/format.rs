//! Format trait definition
//!
//! The core trait every format implementation provides: a uniform interface
//! for parsing source into [`DocumentData`] and serializing it back out. All
//! formats here are textual; binary targets (PDF and friends) are produced by
//! the host application, not this crate.

use crate::error::FormatError;
use lml_core::DocumentData;

/// Trait for document formats
///
/// Implementors provide conversion between a string representation and the
/// block model. Formats can support parsing, serialization, or both.
pub trait Format: Send + Sync {
    /// The name of this format (e.g., "lml", "latex", "html")
    fn name(&self) -> &str;

    /// Optional description of this format
    fn description(&self) -> &str {
        ""
    }

    /// File extensions associated with this format, without the leading dot.
    /// Used for automatic format detection from filenames.
    fn file_extensions(&self) -> &[&str] {
        &[]
    }

    /// Whether this format supports parsing (source → DocumentData)
    fn supports_parsing(&self) -> bool {
        false
    }

    /// Whether this format supports serialization (DocumentData → source)
    fn supports_serialization(&self) -> bool {
        false
    }

    /// Parse source text into a document.
    ///
    /// Default implementation returns NotSupported; formats that support
    /// parsing override it.
    fn parse(&self, _source: &str) -> Result<DocumentData, FormatError> {
        Err(FormatError::NotSupported(format!(
            "Format '{}' does not support parsing",
            self.name()
        )))
    }

    /// Serialize a document into source text.
    ///
    /// Default implementation returns NotSupported; formats that support
    /// serialization override it.
    fn serialize(&self, _doc: &DocumentData) -> Result<String, FormatError> {
        Err(FormatError::NotSupported(format!(
            "Format '{}' does not support serialization",
            self.name()
        )))
    }
}
