//! Document-level metadata.

use serde::{Deserialize, Serialize};

/// Target page size for the rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    A4,
    Letter,
}

impl PageSize {
    /// Parse a page-size token as authored in a document header.
    ///
    /// Unknown tokens fall back to A4 rather than failing; the header is
    /// user-typed text and the document must still open.
    pub fn parse(value: &str) -> PageSize {
        match value.trim().to_ascii_lowercase().as_str() {
            "letter" => PageSize::Letter,
            _ => PageSize::A4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PageSize::A4 => "a4",
            PageSize::Letter => "letter",
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::A4
    }
}

/// Immutable metadata captured from the `@document` header.
///
/// Created once per parse; fields that the header omits keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub title: String,
    pub author: Option<String>,
    pub date: Option<String>,
    /// BCP-47-ish language code, e.g. "en" or "pt-BR".
    pub language: String,
    pub page_size: PageSize,
    /// Base font size in points.
    pub font_size: f32,
    pub font_family: String,
    pub template: Option<String>,
}

impl Default for DocumentMeta {
    fn default() -> Self {
        DocumentMeta {
            title: String::new(),
            author: None,
            date: None,
            language: "en".to_string(),
            page_size: PageSize::default(),
            font_size: 11.0,
            font_family: "serif".to_string(),
            template: None,
        }
    }
}
