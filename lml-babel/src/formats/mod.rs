//! Format implementations
//!
//! Every format converts between LML's block model and one text
//! representation.

pub mod braces;
pub mod html;
pub mod latex;
pub mod lml;
pub mod markdown;

pub use braces::BracesFormat;
pub use html::{render_to_markup, HtmlFormat, MathRenderer, RenderOptions};
pub use latex::{import_latex, ImportIssue, ImportOptions, LatexFormat, LatexImport};
pub use lml::LmlFormat;
pub use markdown::MarkdownFormat;
