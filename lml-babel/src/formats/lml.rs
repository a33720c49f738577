//! The native text format, as a [`Format`].
//!
//! A thin adapter: the grammar itself lives in `lml-core`. Parsing is
//! infallible there (malformed input degrades to paragraphs), so this
//! `parse` never returns an error.

use crate::error::FormatError;
use crate::format::Format;
use lml_core::text;
use lml_core::DocumentData;

pub struct LmlFormat;

impl Format for LmlFormat {
    fn name(&self) -> &str {
        "lml"
    }

    fn description(&self) -> &str {
        "LML text format"
    }

    fn file_extensions(&self) -> &[&str] {
        &["lml"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<DocumentData, FormatError> {
        Ok(text::parse_text(source))
    }

    fn serialize(&self, doc: &DocumentData) -> Result<String, FormatError> {
        Ok(text::serialize(doc))
    }
}
