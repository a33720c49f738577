//! Multi-format interoperability for LML documents
//!
//! This crate provides a uniform interface for converting between the
//! LML block model and other document formats (LaTeX, Markdown, HTML
//! preview markup).
//!
//! The file structure:
//!
//! ```text
//! .
//! ├── error.rs
//! ├── format.rs               # Format trait definition
//! ├── registry.rs             # FormatRegistry for discovery and selection
//! ├── formats
//! │   ├── lml.rs              # native text format (parse + serialize)
//! │   ├── braces.rs           # brace syntax (parse only)
//! │   ├── latex               # tokenizing importer + thin writer
//! │   ├── markdown.rs         # CommonMark export via comrak
//! │   └── html                # two-pass preview renderer
//! └── lib.rs
//! ```
//!
//! This is a pure lib: it powers lml-cli but is shell agnostic; no code here
//! supposes a shell environment, be it std print, env vars or file I/O.
//! Conversions that lose information report it through `log` or, for LaTeX
//! import, through the structured warning lists on [`formats::LatexImport`].

pub mod error;
pub mod format;
pub mod formats;
pub mod registry;

pub use error::FormatError;
pub use format::Format;
pub use formats::{
    import_latex, render_to_markup, BracesFormat, HtmlFormat, ImportIssue, ImportOptions,
    LatexFormat, LatexImport, LmlFormat, MarkdownFormat, MathRenderer, RenderOptions,
};
pub use registry::FormatRegistry;
