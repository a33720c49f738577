//! The document aggregate.

use serde::{Deserialize, Serialize};

use super::bibliography::BibEntry;
use super::blocks::Block;
use super::metadata::DocumentMeta;

/// A parsed document: metadata, blocks in document order, bibliography.
///
/// `blocks` holds every block, roots and children alike, in document order;
/// root blocks have `parent_id == None` and children point at their owning
/// section. A fresh instance is built by each parse call and nothing in it
/// outlives the instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentData {
    pub meta: DocumentMeta,
    pub blocks: Vec<Block>,
    pub bibliography: Vec<BibEntry>,
}

impl DocumentData {
    pub fn new(meta: DocumentMeta) -> Self {
        DocumentData {
            meta,
            blocks: Vec::new(),
            bibliography: Vec::new(),
        }
    }

    /// Root-level blocks, in document order.
    pub fn roots(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|b| b.parent_id.is_none())
    }

    /// Direct children of the block with the given id, in document order.
    pub fn children_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Block> {
        self.blocks
            .iter()
            .filter(move |b| b.parent_id.as_deref() == Some(id))
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }
}

impl Default for DocumentData {
    fn default() -> Self {
        DocumentData::new(DocumentMeta::default())
    }
}
