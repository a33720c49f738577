//! Per-parse id and sort-key generation.

/// Counter state threaded through every block constructor during a parse.
///
/// The counters live in a value passed explicitly rather than in process
/// globals, so independent documents can be parsed concurrently. Each parse
/// call starts from a fresh context, which also makes ids deterministic for
/// a given source.
#[derive(Debug, Clone)]
pub struct ParseContext {
    next_id: u32,
    next_key: u32,
}

/// Gap left between consecutive sort keys. An editor inserting between two
/// siblings picks a key inside the gap instead of renumbering.
const SORT_KEY_STRIDE: u32 = 100;

impl ParseContext {
    pub fn new() -> Self {
        ParseContext {
            next_id: 1,
            next_key: 1,
        }
    }

    /// Next unique block id.
    pub fn next_id(&mut self) -> String {
        let id = format!("b{:04}", self.next_id);
        self.next_id += 1;
        id
    }

    /// Next sort key. Zero-padded so lexicographic order equals numeric
    /// order, strictly increasing within one context.
    pub fn next_sort_key(&mut self) -> String {
        let key = format!("{:08}", self.next_key * SORT_KEY_STRIDE);
        self.next_key += 1;
        key
    }
}

impl Default for ParseContext {
    fn default() -> Self {
        ParseContext::new()
    }
}
