//! The block model: one tagged union over every structural unit.

use serde::{Deserialize, Serialize};

/// Horizontal alignment of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnAlignment {
    Left,
    Center,
    Right,
}

/// One structural unit of a document.
///
/// The base fields are shared by every variant. `sort_key` is a zero-padded,
/// lexicographically comparable string; sibling order is derived from it, so
/// an editor can insert between two blocks without renumbering the rest.
/// `parent_id`, when present, must reference a block that appears earlier in
/// document order, and the parent chain must be acyclic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    /// Cross-reference label, e.g. `eq:energy`.
    pub label: Option<String>,
    pub sort_key: String,
    pub parent_id: Option<String>,
    /// Nesting depth. Redundant with the parent chain, kept so renderers can
    /// indent without walking it.
    pub depth: usize,
    #[serde(flatten)]
    pub kind: BlockKind,
}

impl Block {
    /// Short name of the variant, stable across releases ("paragraph", "eq"
    /// style names are not used here).
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            BlockKind::Section { .. } => "section",
            BlockKind::Paragraph { .. } => "paragraph",
            BlockKind::Heading { .. } => "heading",
            BlockKind::Equation { .. } => "equation",
            BlockKind::Figure { .. } => "figure",
            BlockKind::Table { .. } => "table",
            BlockKind::Code { .. } => "code",
            BlockKind::List { .. } => "list",
            BlockKind::Quote { .. } => "quote",
            BlockKind::Hr => "hr",
        }
    }
}

/// Variant-specific payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockKind {
    Section {
        title: String,
        /// 1..=4.
        level: u8,
    },
    Paragraph {
        /// Text with embedded inline-formatting markers.
        text: String,
    },
    Heading {
        text: String,
        /// 1..=6.
        level: u8,
    },
    Equation {
        latex: String,
        /// True iff a label was supplied.
        numbered: bool,
    },
    Figure {
        src: String,
        alt: String,
        caption: String,
        /// Width as a percentage of the text width.
        width: Option<u8>,
    },
    Table {
        caption: String,
        headers: Vec<String>,
        /// Ragged input rows are normalized to the header column count.
        rows: Vec<Vec<String>>,
        align: Option<Vec<ColumnAlignment>>,
    },
    Code {
        source: String,
        language: String,
        caption: Option<String>,
        line_numbers: bool,
    },
    List {
        ordered: bool,
        items: Vec<String>,
    },
    Quote {
        text: String,
        attribution: Option<String>,
    },
    Hr,
}
