//! Property micro-parser shared by every grammar.
//!
//! Two shapes come up everywhere in LML: a single `key: value` header line
//! and a comma-separated inline list `key1: v1, key2: v2` inside directive
//! parentheses. Both are permissive by design: user-authored markup
//! routinely contains stray text that only looks like a key, so malformed
//! entries are skipped silently. Values stay strings; callers convert
//! integers and enums themselves.

use std::collections::HashMap;

/// Split a comma-separated list at the top level, leaving commas inside
/// single or double quotes alone.
pub fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    for (i, c) in input.char_indices() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => quote = Some(c),
                ',' => {
                    parts.push(&input[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    parts.push(&input[start..]);
    parts
}

/// Strip one layer of matching surrounding quotes.
pub fn strip_quotes(value: &str) -> &str {
    let v = value.trim();
    if v.len() >= 2 {
        let bytes = v.as_bytes();
        if (bytes[0] == b'"' && bytes[v.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[v.len() - 1] == b'\'')
        {
            return &v[1..v.len() - 1];
        }
    }
    v
}

/// Parse one `key: value` line. Returns None when there is no colon.
pub fn parse_header_line(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((key.to_string(), strip_quotes(value).to_string()))
}

/// Parse an inline `key1: v1, key2: v2` list into a map.
pub fn parse_inline(input: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for part in split_top_level(input) {
        if let Some((key, value)) = parse_header_line(part) {
            out.insert(key, value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inline_list() {
        let map = parse_inline("label: eq:a, mode: display");
        assert_eq!(map.get("label").map(String::as_str), Some("eq:a"));
        assert_eq!(map.get("mode").map(String::as_str), Some("display"));
    }

    #[test]
    fn strips_one_quote_layer() {
        let map = parse_inline(r#"caption: "Results, 2024""#);
        assert_eq!(
            map.get("caption").map(String::as_str),
            Some("Results, 2024")
        );
    }

    #[test]
    fn skips_entries_without_colon() {
        let map = parse_inline("python, caption: Listing");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("caption").map(String::as_str), Some("Listing"));
    }

    #[test]
    fn value_keeps_embedded_colons() {
        let (key, value) = parse_header_line("label: eq:energy").unwrap();
        assert_eq!(key, "label");
        assert_eq!(value, "eq:energy");
    }

    #[test]
    fn rejects_keys_with_spaces() {
        // A prose sentence with a colon is not a property.
        assert_eq!(parse_header_line("note that: this is prose"), None);
    }
}
