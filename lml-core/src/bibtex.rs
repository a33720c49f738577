//! BibTeX record parsing and writing.
//!
//! `@type{key, field = value, ..}` records. Field values may be brace
//! groups (scanned with a depth counter, so nested braces survive), quoted
//! strings, or bare words. Consumed by the bibliography feature and by the
//! LaTeX importer's reference pipeline; the writer exists because the host
//! application round-trips `.bib` files back to disk.

use crate::ast::{BibEntry, EntryType};
use crate::text::parser::apply_bib_field;

/// Parse every recognizable record in `source`. Malformed records are
/// skipped, not reported; duplicate keys keep the first occurrence.
pub fn parse_bibtex(source: &str) -> Vec<BibEntry> {
    let mut entries: Vec<BibEntry> = Vec::new();
    let bytes = source.as_bytes();
    let mut pos = 0;
    while let Some(at) = source[pos..].find('@') {
        let start = pos + at;
        match parse_record(&source[start..]) {
            Some((entry, consumed)) => {
                if !entries.iter().any(|e| e.key == entry.key) {
                    entries.push(entry);
                }
                pos = start + consumed;
            }
            None => pos = start + 1,
        }
        if pos >= bytes.len() {
            break;
        }
    }
    entries
}

/// Parse one record beginning at `@`. Returns the entry and the number of
/// bytes consumed.
fn parse_record(input: &str) -> Option<(BibEntry, usize)> {
    let rest = input.strip_prefix('@')?;
    let brace = rest.find('{')?;
    let entry_type = EntryType::parse(rest[..brace].trim());
    if rest[..brace].trim().is_empty() {
        return None;
    }

    // Body is everything up to the brace that closes the record.
    let body_start = brace + 1;
    let mut depth = 1;
    let mut body_end = None;
    for (i, c) in rest[body_start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    body_end = Some(body_start + i);
                    break;
                }
            }
            _ => {}
        }
    }
    let body_end = body_end?;
    let body = &rest[body_start..body_end];

    let comma = body.find(',').unwrap_or(body.len());
    let key = body[..comma].trim();
    if key.is_empty() {
        return None;
    }
    let mut entry = BibEntry::new(key, entry_type);

    let mut fields = &body[comma..];
    loop {
        fields = fields.trim_start_matches([',', ' ', '\t', '\n', '\r']);
        if fields.is_empty() {
            break;
        }
        let Some(eq) = fields.find('=') else {
            break;
        };
        let name = fields[..eq].trim().to_ascii_lowercase();
        let (value, consumed) = read_value(fields[eq + 1..].trim_start());
        let skipped = fields[eq + 1..].len() - fields[eq + 1..].trim_start().len();
        apply_bib_field(&mut entry, &name, value);
        fields = &fields[eq + 1 + skipped + consumed..];
    }

    // +1 for '@', +1 past the closing brace.
    Some((entry, 1 + body_end + 1))
}

/// Read a field value: `{balanced}`, `"quoted"`, or bare up to the next
/// top-level comma. Returns the cleaned value and bytes consumed.
fn read_value(input: &str) -> (String, usize) {
    if let Some(rest) = input.strip_prefix('{') {
        let mut depth = 1;
        for (i, c) in rest.char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return (strip_inner_braces(&rest[..i]), i + 2);
                    }
                }
                _ => {}
            }
        }
        (strip_inner_braces(rest), input.len())
    } else if let Some(rest) = input.strip_prefix('"') {
        match rest.find('"') {
            Some(i) => (rest[..i].trim().to_string(), i + 2),
            None => (rest.trim().to_string(), input.len()),
        }
    } else {
        let end = input.find(',').unwrap_or(input.len());
        (input[..end].trim().to_string(), end)
    }
}

/// Drop grouping braces BibTeX uses for case protection, keep the text.
fn strip_inner_braces(value: &str) -> String {
    value
        .chars()
        .filter(|&c| c != '{' && c != '}')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Write entries back out as BibTeX records.
pub fn to_bibtex(entries: &[BibEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!("@{}{{{},\n", entry.entry_type.as_str(), entry.key));
        let mut field = |name: &str, value: &str| {
            out.push_str(&format!("  {name} = {{{value}}},\n"));
        };
        if !entry.author.is_empty() {
            field("author", &entry.author);
        }
        if !entry.title.is_empty() {
            field("title", &entry.title);
        }
        if entry.year != 0 {
            field("year", &entry.year.to_string());
        }
        let optional = [
            ("journal", &entry.journal),
            ("booktitle", &entry.booktitle),
            ("publisher", &entry.publisher),
            ("volume", &entry.volume),
            ("pages", &entry.pages),
            ("doi", &entry.doi),
            ("url", &entry.url),
            ("isbn", &entry.isbn),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                field(name, value);
            }
        }
        out.push_str("}\n\n");
    }
    out
}
