//! Serialization: block model back to canonical text-format source.
//!
//! The output is not byte-identical to arbitrary hand-written input (table
//! cells are re-padded, parameter lists re-ordered into canonical order),
//! but `parse(serialize(parse(x)))` is structurally equal to `parse(x)` for
//! any valid text-format `x`, and the tests hold the serializer to that.

use std::collections::HashMap;

use crate::ast::{BibEntry, Block, BlockKind, ColumnAlignment, DocumentData, DocumentMeta};
use crate::scanner::TheoremKind;

/// Knobs for the canonical writer.
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Paragraphs shorter than this (and without newlines) stay on one line.
    pub compact_paragraph_limit: usize,
    /// Blank lines between consecutive blocks.
    pub blank_lines_between: usize,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        SerializeOptions {
            compact_paragraph_limit: 80,
            blank_lines_between: 1,
        }
    }
}

/// Serialize a document with default options.
pub fn serialize(doc: &DocumentData) -> String {
    serialize_with_options(doc, &SerializeOptions::default())
}

pub fn serialize_with_options(doc: &DocumentData, options: &SerializeOptions) -> String {
    let mut writer = Writer {
        out: String::new(),
        options,
        consecutive_newlines: 2,
    };
    writer.document_header(&doc.meta);

    // Rebuild the parent → children index; emission order within each level
    // comes from the sort keys, not from storage order.
    let mut children: HashMap<&str, Vec<&Block>> = HashMap::new();
    let mut roots: Vec<&Block> = Vec::new();
    for block in &doc.blocks {
        match &block.parent_id {
            Some(parent) => children.entry(parent.as_str()).or_default().push(block),
            None => roots.push(block),
        }
    }
    roots.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
    for list in children.values_mut() {
        list.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
    }

    for root in roots {
        writer.block(root, &children);
    }

    if !doc.bibliography.is_empty() {
        writer.bibliography(&doc.bibliography);
    }

    writer.out
}

struct Writer<'a> {
    out: String,
    options: &'a SerializeOptions,
    consecutive_newlines: usize,
}

impl<'a> Writer<'a> {
    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
        self.consecutive_newlines = if text.is_empty() {
            self.consecutive_newlines + 1
        } else {
            1
        };
    }

    fn separate(&mut self) {
        let target = self.options.blank_lines_between + 1;
        while self.consecutive_newlines < target {
            self.out.push('\n');
            self.consecutive_newlines += 1;
        }
    }

    fn document_header(&mut self, meta: &DocumentMeta) {
        self.line("@document");
        self.line(&format!("title: {}", meta.title));
        if let Some(author) = &meta.author {
            self.line(&format!("author: {author}"));
        }
        if let Some(date) = &meta.date {
            self.line(&format!("date: {date}"));
        }
        self.line(&format!("lang: {}", meta.language));
        self.line(&format!("pagesize: {}", meta.page_size.as_str()));
        self.line(&format!("fontsize: {}", format_font_size(meta.font_size)));
        self.line(&format!("font: {}", meta.font_family));
        if let Some(template) = &meta.template {
            self.line(&format!("template: {template}"));
        }
    }

    fn block(&mut self, block: &Block, children: &HashMap<&str, Vec<&Block>>) {
        self.separate();
        match &block.kind {
            BlockKind::Section { title, level } => {
                self.line(&format!("{} {}", "#".repeat(*level as usize), title));
                if let Some(kids) = children.get(block.id.as_str()) {
                    for kid in kids {
                        self.block(kid, children);
                    }
                }
            }
            BlockKind::Heading { text, level } => {
                self.line(&format!("{} {}", "#".repeat(*level as usize), text));
            }
            BlockKind::Paragraph { text } => {
                // Labeled theorem-like paragraphs go back out in directive
                // form; a bare paragraph has nowhere to carry the label.
                if let Some((kind, body)) = lowered_theorem(block, text) {
                    self.line(&format!(
                        "@{}(label: {})",
                        kind.directive_name(),
                        block.label.as_deref().unwrap_or_default()
                    ));
                    for line in body.lines() {
                        self.line(line);
                    }
                } else if text.len() < self.options.compact_paragraph_limit
                    && !text.contains('\n')
                {
                    self.line(text);
                } else {
                    for line in text.lines() {
                        self.line(line);
                    }
                }
            }
            BlockKind::Equation { latex, .. } => {
                // `numbered` is derived from the label, so only the label is
                // written out.
                match &block.label {
                    Some(label) => self.line(&format!("@equation(label: {label})")),
                    None => self.line("@equation"),
                }
                for line in latex.lines() {
                    self.line(line);
                }
            }
            BlockKind::Figure {
                src,
                alt,
                caption,
                width,
            } => {
                let mut params = vec![format!("src: {}", quote_value(src))];
                if !alt.is_empty() {
                    params.push(format!("alt: {}", quote_value(alt)));
                }
                if !caption.is_empty() {
                    params.push(format!("caption: {}", quote_value(caption)));
                }
                if let Some(w) = width {
                    params.push(format!("width: {w}"));
                }
                if let Some(label) = &block.label {
                    params.push(format!("label: {label}"));
                }
                self.line(&format!("@figure({})", params.join(", ")));
            }
            BlockKind::Table {
                caption,
                headers,
                rows,
                align,
            } => {
                let mut params = Vec::new();
                if !caption.is_empty() {
                    params.push(format!("caption: {}", quote_value(caption)));
                }
                if let Some(label) = &block.label {
                    params.push(format!("label: {label}"));
                }
                if params.is_empty() {
                    self.line("@table");
                } else {
                    self.line(&format!("@table({})", params.join(", ")));
                }
                self.table_rows(headers, rows, align.as_deref());
            }
            BlockKind::Code {
                source,
                language,
                caption,
                line_numbers,
            } => {
                let mut params = vec![language.clone()];
                if let Some(caption) = caption {
                    params.push(format!("caption: {}", quote_value(caption)));
                }
                if *line_numbers {
                    params.push("numbers: true".to_string());
                }
                if let Some(label) = &block.label {
                    params.push(format!("label: {label}"));
                }
                self.line(&format!("@code({})", params.join(", ")));
                for line in source.lines() {
                    self.line(line);
                }
            }
            BlockKind::List { ordered, items } => {
                self.line(if *ordered { "@list(ordered)" } else { "@list" });
                for (i, item) in items.iter().enumerate() {
                    if *ordered {
                        self.line(&format!("{}. {item}", i + 1));
                    } else {
                        self.line(&format!("- {item}"));
                    }
                }
            }
            BlockKind::Quote { text, attribution } => {
                // An empty quote still needs a line, or the block vanishes
                // from the reparse.
                if text.is_empty() && attribution.is_none() {
                    self.line(">");
                }
                for line in text.lines() {
                    self.line(&format!("> {line}"));
                }
                if let Some(attribution) = attribution {
                    self.line(&format!("> -- {attribution}"));
                }
            }
            BlockKind::Hr => self.line("---"),
        }
    }

    /// Re-pad table cells so columns line up; widths are recomputed from the
    /// current content, not preserved from the input.
    fn table_rows(&mut self, headers: &[String], rows: &[Vec<String>], align: Option<&[ColumnAlignment]>) {
        if headers.is_empty() && rows.is_empty() {
            return;
        }
        let columns = headers.len();
        let mut widths: Vec<usize> = headers.iter().map(|h| h.len().max(3)).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate().take(columns) {
                if cell.len() > widths[i] {
                    widths[i] = cell.len();
                }
            }
        }

        self.line(&format_row(headers, &widths));
        // A separator row is only written back when the source declared one;
        // otherwise reparsing would invent a left alignment.
        if let Some(align) = align {
            let separator: Vec<String> = (0..columns)
                .map(|i| {
                    let dashes = "-".repeat(widths[i].max(3));
                    match align.get(i) {
                        Some(ColumnAlignment::Center) => {
                            format!(":{}:", &dashes[..dashes.len() - 2])
                        }
                        Some(ColumnAlignment::Right) => format!("{}:", &dashes[..dashes.len() - 1]),
                        _ => dashes,
                    }
                })
                .collect();
            self.line(&format!("| {} |", separator.join(" | ")));
        }
        for row in rows {
            self.line(&format_row(row, &widths));
        }
    }

    fn bibliography(&mut self, entries: &[BibEntry]) {
        self.separate();
        self.line("@bibliography {");
        for entry in entries {
            self.line(&format!("@entry {} {{", entry.key));
            self.line(&format!("type: {}", entry.entry_type.as_str()));
            if !entry.author.is_empty() {
                self.line(&format!("author: {}", entry.author));
            }
            if !entry.title.is_empty() {
                self.line(&format!("title: {}", entry.title));
            }
            if entry.year != 0 {
                self.line(&format!("year: {}", entry.year));
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
                    self.line(&format!("{name}: {value}"));
                }
            }
            self.line("}");
        }
        self.line("}");
    }
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            format!("{cell:<w$}", w = w)
        })
        .collect();
    format!("| {} |", padded.join(" | "))
}

fn format_font_size(size: f32) -> String {
    if size.fract() == 0.0 {
        format!("{}", size as u32)
    } else {
        format!("{size}")
    }
}

/// Recognize a labeled paragraph produced by theorem-directive lowering:
/// the `**Name.**` prefix gives back the kind, the remainder the body.
fn lowered_theorem<'t>(block: &Block, text: &'t str) -> Option<(TheoremKind, &'t str)> {
    block.label.as_ref()?;
    for kind in TheoremKind::ALL {
        let prefix = format!("**{}.**", kind.display_name());
        if let Some(body) = text.strip_prefix(prefix.as_str()) {
            return Some((kind, body.trim_start()));
        }
    }
    None
}

/// Quote a parameter value when it would otherwise be split or re-keyed by
/// the property parser.
fn quote_value(value: &str) -> String {
    if value.contains(',') || value.contains(':') {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}
