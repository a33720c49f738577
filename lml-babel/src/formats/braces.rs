//! The brace syntax, as a parse-only [`Format`].
//!
//! Brace-syntax documents are machine-written (round-tripped through
//! external tools); the canonical writer always emits the text format, so
//! this format deliberately has no serializer.

use crate::error::FormatError;
use crate::format::Format;
use lml_core::braces;
use lml_core::DocumentData;

pub struct BracesFormat;

impl Format for BracesFormat {
    fn name(&self) -> &str {
        "braces"
    }

    fn description(&self) -> &str {
        "LML brace syntax (machine-written documents)"
    }

    fn file_extensions(&self) -> &[&str] {
        &["lmlb"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<DocumentData, FormatError> {
        Ok(braces::parse_braces(source))
    }
}
