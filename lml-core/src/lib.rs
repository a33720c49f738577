//! The LML language core: block model, grammars and validation.
//!
//! LML is a structured markup language for academic and technical writing
//! with a live preview. This crate is the language's home: everything that
//! defines what an LML document *is* lives here, pure and synchronous, with
//! no I/O.
//!
//! The file structure:
//!
//! ```text
//! .
//! ├── ast             # Block model, metadata, bibliography entries
//! ├── context.rs      # ParseContext: id and sort-key generation
//! ├── props.rs        # key: value micro-parser shared by everything
//! ├── scanner.rs      # the one shared block-boundary state machine
//! ├── text            # text-format parser and canonical serializer
//! ├── braces.rs       # brace-syntax parser (machine-written documents)
//! ├── bibtex.rs       # BibTeX records, read and write
//! └── validate.rs     # line-tagged diagnostics over the scanner
//! ```
//!
//! Two grammars (text format and brace syntax) parse into one block model;
//! the serializer writes the canonical text form back out. Parsing never
//! fails: malformed input degrades to paragraphs, and callers that want
//! strictness use [`text::parse_text_with_report`] or [`validate::validate`].
//!
//! Format conversion (LaTeX, Markdown, HTML preview) lives in `lml-babel`,
//! which consumes this crate through `parse`/`serialize` and the scanner.

pub mod ast;
pub mod bibtex;
pub mod braces;
pub mod context;
pub mod props;
pub mod scanner;
pub mod text;
pub mod validate;

pub use ast::{
    BibEntry, Block, BlockKind, ColumnAlignment, DocumentData, DocumentMeta, EntryType, PageSize,
};
pub use bibtex::{parse_bibtex, to_bibtex};
pub use braces::parse_braces;
pub use context::ParseContext;
pub use scanner::{BlockEvent, BlockScanner, BlockSignal, DirectiveKind, TheoremKind};
pub use text::{parse_text, serialize, SerializeOptions};
pub use validate::{validate, Diagnostic, Severity, Validation};
