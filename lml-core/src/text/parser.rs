//! Text-format parsing: source lines into the block model.
//!
//! Built on the shared [`BlockScanner`]; this module only decides what each
//! detected block becomes. It never fails: anything that does not match a
//! known construct degrades to a paragraph, which is the right trade inside
//! a live-typing editor: something always renders.

use std::collections::HashMap;

use crate::ast::{
    BibEntry, Block, BlockKind, ColumnAlignment, DocumentData, DocumentMeta, EntryType, PageSize,
};
use crate::context::ParseContext;
use crate::props;
use crate::scanner::{BlockEvent, BlockScanner, BlockSignal, DirectiveKind};

/// A fragment that did not match any grammar rule and fell back to a
/// paragraph. The parse itself still succeeds; callers that want strictness
/// inspect the report.
#[derive(Debug, Clone, PartialEq)]
pub struct DegradedSpan {
    /// 1-based source line where the fragment starts.
    pub line: usize,
    /// The original text of the fragment.
    pub text: String,
}

/// Parse text-format source into a document.
pub fn parse_text(source: &str) -> DocumentData {
    parse_text_with_report(source).0
}

/// Like [`parse_text`], additionally reporting fragments that degraded to
/// paragraphs (stray `@endlatex`, unknown directives).
pub fn parse_text_with_report(source: &str) -> (DocumentData, Vec<DegradedSpan>) {
    let mut ctx = ParseContext::new();
    let mut doc = DocumentData::default();
    let mut degraded = Vec::new();

    for event in BlockScanner::new(source) {
        match event.signal {
            BlockSignal::DocumentHeader => {
                doc.meta = meta_from_lines(&event.lines);
            }
            BlockSignal::Heading(level) => {
                let text = event
                    .param_line
                    .trim_start_matches('#')
                    .trim()
                    .to_string();
                push(&mut doc, &mut ctx, None, BlockKind::Heading { text, level });
            }
            BlockSignal::Hr => {
                push(&mut doc, &mut ctx, None, BlockKind::Hr);
            }
            BlockSignal::Quote => {
                let (text, attribution) = quote_payload(&event.lines);
                push(
                    &mut doc,
                    &mut ctx,
                    None,
                    BlockKind::Quote { text, attribution },
                );
            }
            BlockSignal::Directive(kind) => {
                build_directive(&mut doc, &mut ctx, kind, &event);
            }
            BlockSignal::LatexPassthrough { .. } => {
                // Opaque region: keep the raw span so serialization and a
                // later reparse see the exact same passthrough.
                let mut text = String::from("@latex");
                for line in &event.lines {
                    text.push('\n');
                    text.push_str(line);
                }
                text.push_str("\n@endlatex");
                push(&mut doc, &mut ctx, None, BlockKind::Paragraph { text });
            }
            BlockSignal::LatexEnd => {
                degraded.push(DegradedSpan {
                    line: event.start_line,
                    text: event.param_line.clone(),
                });
                push(
                    &mut doc,
                    &mut ctx,
                    None,
                    BlockKind::Paragraph {
                        text: event.param_line,
                    },
                );
            }
            BlockSignal::Bibliography => {
                doc.bibliography.extend(parse_entry_lines(&event.lines));
            }
            BlockSignal::Paragraph => {
                let text = joined_trimmed(&event.lines);
                if text.trim_start().starts_with('@') {
                    degraded.push(DegradedSpan {
                        line: event.start_line,
                        text: text.clone(),
                    });
                }
                push(&mut doc, &mut ctx, None, BlockKind::Paragraph { text });
            }
        }
    }

    (doc, degraded)
}

fn push(doc: &mut DocumentData, ctx: &mut ParseContext, label: Option<String>, kind: BlockKind) {
    doc.blocks.push(Block {
        id: ctx.next_id(),
        label,
        sort_key: ctx.next_sort_key(),
        parent_id: None,
        depth: 0,
        kind,
    });
}

fn joined_trimmed(lines: &[String]) -> String {
    lines
        .iter()
        .map(|l| l.trim())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Populate metadata from `key: value` header lines.
pub(crate) fn meta_from_lines(lines: &[String]) -> DocumentMeta {
    let mut meta = DocumentMeta::default();
    for line in lines {
        let Some((key, value)) = props::parse_header_line(line.trim()) else {
            continue;
        };
        match key.as_str() {
            "title" => meta.title = value,
            "author" => meta.author = Some(value),
            "date" => meta.date = Some(value),
            "lang" | "language" => meta.language = value,
            "pagesize" => meta.page_size = PageSize::parse(&value),
            "fontsize" => {
                if let Ok(size) = value.parse::<f32>() {
                    meta.font_size = size;
                }
            }
            "font" => meta.font_family = value,
            "template" => meta.template = Some(value),
            _ => {}
        }
    }
    meta
}

/// Split a quote's `>`-prefixed lines into text and optional attribution
/// (a trailing `> -- name` line).
fn quote_payload(lines: &[String]) -> (String, Option<String>) {
    let mut stripped: Vec<String> = lines
        .iter()
        .map(|l| {
            l.trim()
                .trim_start_matches('>')
                .trim_start()
                .to_string()
        })
        .collect();
    let attribution = match stripped.last() {
        Some(last) if last.starts_with("--") => {
            let name = last.trim_start_matches('-').trim().to_string();
            stripped.pop();
            if name.is_empty() {
                None
            } else {
                Some(name)
            }
        }
        _ => None,
    };
    (stripped.join("\n"), attribution)
}

/// The `(..)` parameter section of a directive line, split into positional
/// tokens and `key: value` properties.
fn directive_params(param_line: &str) -> (Vec<String>, HashMap<String, String>) {
    let inner = match (param_line.find('('), param_line.rfind(')')) {
        (Some(open), Some(close)) if close > open => &param_line[open + 1..close],
        _ => return (Vec::new(), HashMap::new()),
    };
    let mut positional = Vec::new();
    let mut keyed = HashMap::new();
    for part in props::split_top_level(inner) {
        if let Some((key, value)) = props::parse_header_line(part) {
            keyed.insert(key, value);
        } else if !part.trim().is_empty() {
            positional.push(part.trim().to_string());
        }
    }
    (positional, keyed)
}

fn build_directive(
    doc: &mut DocumentData,
    ctx: &mut ParseContext,
    kind: DirectiveKind,
    event: &BlockEvent,
) {
    let (positional, params) = directive_params(&event.param_line);
    match kind {
        DirectiveKind::Equation => {
            let label = params.get("label").cloned();
            let numbered = label.is_some();
            push(
                doc,
                ctx,
                label,
                BlockKind::Equation {
                    latex: joined_trimmed(&event.lines),
                    numbered,
                },
            );
        }
        DirectiveKind::Figure => {
            let width = params
                .get("width")
                .and_then(|w| w.trim_end_matches('%').trim().parse::<u8>().ok());
            push(
                doc,
                ctx,
                params.get("label").cloned(),
                BlockKind::Figure {
                    src: params.get("src").cloned().unwrap_or_default(),
                    alt: params.get("alt").cloned().unwrap_or_default(),
                    caption: params.get("caption").cloned().unwrap_or_default(),
                    width,
                },
            );
        }
        DirectiveKind::Code => {
            let language = positional
                .first()
                .cloned()
                .unwrap_or_else(|| "text".to_string());
            let line_numbers = params
                .get("numbers")
                .map(|v| v == "true")
                .unwrap_or(false);
            push(
                doc,
                ctx,
                params.get("label").cloned(),
                BlockKind::Code {
                    source: event.lines.join("\n"),
                    language,
                    caption: params.get("caption").cloned(),
                    line_numbers,
                },
            );
        }
        DirectiveKind::Table => {
            let (headers, rows, align) = table_payload(&event.lines);
            push(
                doc,
                ctx,
                params.get("label").cloned(),
                BlockKind::Table {
                    caption: params.get("caption").cloned().unwrap_or_default(),
                    headers,
                    rows,
                    align,
                },
            );
        }
        DirectiveKind::List => {
            // Ordered-list detection is by literal substring, matching the
            // shipped grammar; `@list(ordered)` and `@list(type: ordered)`
            // both count.
            let ordered = event.param_line.contains("ordered");
            let items = event
                .lines
                .iter()
                .map(|l| strip_item_marker(l.trim()).to_string())
                .filter(|l| !l.is_empty())
                .collect();
            push(doc, ctx, None, BlockKind::List { ordered, items });
        }
        DirectiveKind::Abstract => {
            let text = format!("**Abstract.** {}", joined_trimmed(&event.lines));
            push(doc, ctx, None, BlockKind::Paragraph { text });
        }
        DirectiveKind::Theorem(theorem) => {
            let text = format!(
                "**{}.** {}",
                theorem.display_name(),
                joined_trimmed(&event.lines)
            );
            push(doc, ctx, params.get("label").cloned(), BlockKind::Paragraph { text });
        }
        DirectiveKind::Pagebreak | DirectiveKind::Toc | DirectiveKind::Footnote => {
            // Presentation-only directives carry no model payload. Keeping
            // the raw lines as a paragraph lets serialize∘parse reproduce
            // them for the renderer, which resolves them itself.
            let mut text = event.param_line.clone();
            for line in &event.lines {
                text.push('\n');
                text.push_str(line.trim());
            }
            push(doc, ctx, None, BlockKind::Paragraph { text });
        }
    }
}

pub fn strip_item_marker(line: &str) -> &str {
    if let Some(rest) = line.strip_prefix("- ") {
        return rest;
    }
    if let Some(dot) = line.find(". ") {
        if line[..dot].chars().all(|c| c.is_ascii_digit()) && dot > 0 {
            return &line[dot + 2..];
        }
    }
    line
}

/// Parse `|`-delimited rows. A `:---:`-style separator row sets column
/// alignment; the first non-separator row becomes the header; ragged body
/// rows are padded or truncated to the header column count.
pub fn table_payload(
    lines: &[String],
) -> (Vec<String>, Vec<Vec<String>>, Option<Vec<ColumnAlignment>>) {
    let mut headers: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut align: Option<Vec<ColumnAlignment>> = None;

    for line in lines {
        let trimmed = line.trim();
        if !trimmed.starts_with('|') {
            continue;
        }
        let cells: Vec<String> = trimmed
            .trim_matches('|')
            .split('|')
            .map(|c| c.trim().to_string())
            .collect();
        if is_separator_row(&cells) {
            align = Some(
                cells
                    .iter()
                    .map(|c| match (c.starts_with(':'), c.ends_with(':')) {
                        (true, true) => ColumnAlignment::Center,
                        (false, true) => ColumnAlignment::Right,
                        _ => ColumnAlignment::Left,
                    })
                    .collect(),
            );
            continue;
        }
        if headers.is_empty() {
            headers = cells;
        } else {
            rows.push(cells);
        }
    }

    let columns = headers.len();
    for row in &mut rows {
        row.resize(columns, String::new());
    }
    if let Some(a) = &mut align {
        a.resize(columns, ColumnAlignment::Left);
    }
    (headers, rows, align)
}

fn is_separator_row(cells: &[String]) -> bool {
    !cells.is_empty()
        && cells.iter().all(|c| {
            !c.is_empty() && c.chars().all(|ch| ch == '-' || ch == ':')
        })
}

/// Parse `@entry key { field: value .. }` records from a bibliography fence.
pub fn parse_entry_lines(lines: &[String]) -> Vec<BibEntry> {
    let mut entries = Vec::new();
    let mut current: Option<BibEntry> = None;
    for line in lines {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("@entry") {
            let key = rest.trim().trim_end_matches('{').trim();
            if !key.is_empty() {
                current = Some(BibEntry::new(key, EntryType::Misc));
            }
            continue;
        }
        if trimmed == "}" {
            if let Some(entry) = current.take() {
                if !entries.iter().any(|e: &BibEntry| e.key == entry.key) {
                    entries.push(entry);
                }
            }
            continue;
        }
        let Some(entry) = current.as_mut() else {
            continue;
        };
        let Some((key, value)) = props::parse_header_line(trimmed) else {
            continue;
        };
        apply_bib_field(entry, &key, value);
    }
    if let Some(entry) = current {
        if !entries.iter().any(|e| e.key == entry.key) {
            entries.push(entry);
        }
    }
    entries
}

pub(crate) fn apply_bib_field(entry: &mut BibEntry, key: &str, value: String) {
    match key {
        "type" => entry.entry_type = EntryType::parse(&value),
        "author" => entry.author = value,
        "title" => entry.title = value,
        "year" => entry.year = value.trim().parse().unwrap_or(0),
        "journal" => entry.journal = Some(value),
        "booktitle" => entry.booktitle = Some(value),
        "publisher" => entry.publisher = Some(value),
        "volume" => entry.volume = Some(value),
        "pages" => entry.pages = Some(value),
        "doi" => entry.doi = Some(value),
        "url" => entry.url = Some(value),
        "isbn" => entry.isbn = Some(value),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_heading_and_paragraph_with_title() {
        let doc = parse_text("@document\ntitle: T\n\n# Intro\n\nHello *world*.\n");
        assert_eq!(doc.meta.title, "T");
        assert_eq!(doc.blocks.len(), 2);
        assert_eq!(
            doc.blocks[0].kind,
            BlockKind::Heading {
                text: "Intro".to_string(),
                level: 1
            }
        );
        assert_eq!(
            doc.blocks[1].kind,
            BlockKind::Paragraph {
                text: "Hello *world*.".to_string()
            }
        );
    }

    #[test]
    fn labeled_equation_is_numbered() {
        let doc = parse_text("@equation(label: eq:a)\nE=mc^2\n");
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].label.as_deref(), Some("eq:a"));
        assert_eq!(
            doc.blocks[0].kind,
            BlockKind::Equation {
                latex: "E=mc^2".to_string(),
                numbered: true
            }
        );
    }

    #[test]
    fn unlabeled_equation_is_not_numbered() {
        let doc = parse_text("@equation\nx^2\n");
        assert_eq!(
            doc.blocks[0].kind,
            BlockKind::Equation {
                latex: "x^2".to_string(),
                numbered: false
            }
        );
    }

    #[test]
    fn figure_params_come_from_the_directive_line() {
        let doc =
            parse_text("@figure(src: img/a.png, alt: A plot, caption: Energy, width: 50%)\n");
        match &doc.blocks[0].kind {
            BlockKind::Figure {
                src,
                alt,
                caption,
                width,
            } => {
                assert_eq!(src, "img/a.png");
                assert_eq!(alt, "A plot");
                assert_eq!(caption, "Energy");
                assert_eq!(*width, Some(50));
            }
            other => panic!("expected figure, got {other:?}"),
        }
    }

    #[test]
    fn code_language_is_the_parenthesized_token() {
        let doc = parse_text("@code(python, caption: Listing 1, numbers: true)\nprint(1)\n");
        match &doc.blocks[0].kind {
            BlockKind::Code {
                source,
                language,
                caption,
                line_numbers,
            } => {
                assert_eq!(language, "python");
                assert_eq!(source, "print(1)");
                assert_eq!(caption.as_deref(), Some("Listing 1"));
                assert!(line_numbers);
            }
            other => panic!("expected code, got {other:?}"),
        }
    }

    #[test]
    fn table_rows_normalize_to_header_width() {
        let doc = parse_text(
            "@table(caption: Data)\n| A | B | C |\n|---|:---:|---:|\n| 1 | 2 |\n| 1 | 2 | 3 | 4 |\n",
        );
        match &doc.blocks[0].kind {
            BlockKind::Table {
                caption,
                headers,
                rows,
                align,
            } => {
                assert_eq!(caption, "Data");
                assert_eq!(headers.len(), 3);
                assert_eq!(rows[0], vec!["1", "2", ""]);
                assert_eq!(rows[1], vec!["1", "2", "3"]);
                assert_eq!(
                    align.as_deref(),
                    Some(
                        &[
                            ColumnAlignment::Left,
                            ColumnAlignment::Center,
                            ColumnAlignment::Right
                        ][..]
                    )
                );
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn ordered_list_detection_is_substring_based() {
        let doc = parse_text("@list(ordered)\n1. one\n2. two\n");
        assert_eq!(
            doc.blocks[0].kind,
            BlockKind::List {
                ordered: true,
                items: vec!["one".to_string(), "two".to_string()]
            }
        );
    }

    #[test]
    fn theorem_directives_lower_to_bold_paragraphs() {
        let doc = parse_text("@theorem\nThere are infinitely many primes.\n");
        assert_eq!(
            doc.blocks[0].kind,
            BlockKind::Paragraph {
                text: "**Theorem.** There are infinitely many primes.".to_string()
            }
        );
    }

    #[test]
    fn quote_attribution_is_the_trailing_dash_line() {
        let doc = parse_text("> Stay hungry.\n> -- S. Jobs\n");
        assert_eq!(
            doc.blocks[0].kind,
            BlockKind::Quote {
                text: "Stay hungry.".to_string(),
                attribution: Some("S. Jobs".to_string())
            }
        );
    }

    #[test]
    fn unknown_directive_degrades_and_is_reported() {
        let (doc, degraded) = parse_text_with_report("@widget(spin: 7)\n");
        assert_eq!(doc.blocks.len(), 1);
        assert!(matches!(doc.blocks[0].kind, BlockKind::Paragraph { .. }));
        assert_eq!(degraded.len(), 1);
        assert_eq!(degraded[0].line, 1);
    }

    #[test]
    fn sort_keys_increase_in_document_order() {
        let doc = parse_text("# A\n\none\n\ntwo\n\n---\n");
        let keys: Vec<_> = doc.blocks.iter().map(|b| b.sort_key.clone()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn bibliography_fence_parses_entries() {
        let src = "@bibliography {\n@entry feynman82 {\ntype: article\nauthor: R. Feynman\ntitle: QED\nyear: 1982\n}\n}\n";
        let doc = parse_text(src);
        assert_eq!(doc.bibliography.len(), 1);
        let entry = &doc.bibliography[0];
        assert_eq!(entry.key, "feynman82");
        assert_eq!(entry.entry_type, EntryType::Article);
        assert_eq!(entry.year, 1982);
    }
}
