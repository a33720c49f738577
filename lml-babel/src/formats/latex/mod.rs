//! LaTeX format: import via the tokenizing importer, export via the thin
//! writer.
//!
//! Conversion is inherently lossy in both directions; the [`Format`]
//! adapter logs what could not be carried over and only fails on
//! structurally broken input. Callers that need the full report use
//! [`import_latex`] directly.

pub mod importer;
pub mod writer;

pub use importer::{import_latex, validate_latex, ImportIssue, ImportOptions, LatexImport};
pub use writer::write_latex;

use crate::error::FormatError;
use crate::format::Format;
use lml_core::DocumentData;

pub struct LatexFormat;

impl Format for LatexFormat {
    fn name(&self) -> &str {
        "latex"
    }

    fn description(&self) -> &str {
        "LaTeX (lossy import and export)"
    }

    fn file_extensions(&self) -> &[&str] {
        &["tex"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<DocumentData, FormatError> {
        let import = import_latex(source, &ImportOptions::default());
        for warning in &import.warnings {
            log::warn!("latex import: {warning}");
        }
        if !import.errors.is_empty() {
            let joined = import
                .errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(FormatError::ParseError(joined));
        }
        Ok(DocumentData {
            meta: import.meta,
            blocks: import.blocks,
            bibliography: import.bibliography,
        })
    }

    fn serialize(&self, doc: &DocumentData) -> Result<String, FormatError> {
        Ok(write_latex(doc))
    }
}
