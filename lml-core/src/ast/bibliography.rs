//! Bibliography entries.

use serde::{Deserialize, Serialize};

/// BibTeX-style entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Article,
    Book,
    Inproceedings,
    Thesis,
    Misc,
}

impl EntryType {
    /// Map a BibTeX record type to the supported set. Unknown and
    /// vendor-specific types collapse to `Misc`.
    pub fn parse(value: &str) -> EntryType {
        match value.trim().to_ascii_lowercase().as_str() {
            "article" => EntryType::Article,
            "book" => EntryType::Book,
            "inproceedings" | "conference" => EntryType::Inproceedings,
            "thesis" | "phdthesis" | "mastersthesis" => EntryType::Thesis,
            _ => EntryType::Misc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Article => "article",
            EntryType::Book => "book",
            EntryType::Inproceedings => "inproceedings",
            EntryType::Thesis => "thesis",
            EntryType::Misc => "misc",
        }
    }
}

/// One bibliography record. The citation key is unique within a document's
/// bibliography; duplicates keep the first occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BibEntry {
    pub key: String,
    pub entry_type: EntryType,
    pub author: String,
    pub title: String,
    /// Publication year; 0 means unknown.
    pub year: u32,
    pub journal: Option<String>,
    pub booktitle: Option<String>,
    pub publisher: Option<String>,
    pub volume: Option<String>,
    pub pages: Option<String>,
    pub doi: Option<String>,
    pub url: Option<String>,
    pub isbn: Option<String>,
}

impl BibEntry {
    /// A blank entry of the given type, for field-by-field population.
    pub fn new(key: impl Into<String>, entry_type: EntryType) -> Self {
        BibEntry {
            key: key.into(),
            entry_type,
            author: String::new(),
            title: String::new(),
            year: 0,
            journal: None,
            booktitle: None,
            publisher: None,
            volume: None,
            pages: None,
            doi: None,
            url: None,
            isbn: None,
        }
    }
}
