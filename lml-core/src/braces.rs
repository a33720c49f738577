//! Brace-syntax parsing: the explicitly delimited grammar.
//!
//! `@type[#label][ "title"][ modifier] { content }` is the grammar used for
//! machine-generated and round-tripped documents, where nesting is explicit
//! instead of inferred from blank lines. Sections recurse; every other type
//! is a leaf. Matching is done with a brace-depth counter, never a regex,
//! because equation and code payloads legitimately contain braces.

use crate::ast::{Block, BlockKind, DocumentData};
use crate::context::ParseContext;
use crate::props;
use crate::text::parser as text_parser;

/// Parse brace-syntax source into a document.
///
/// Free text before the first `@` token (and between blocks) becomes
/// implicit paragraphs; unknown block types degrade to paragraphs of their
/// raw content.
pub fn parse_braces(source: &str) -> DocumentData {
    let mut ctx = ParseContext::new();
    let mut doc = DocumentData::default();
    parse_blocks(source, None, 0, &mut ctx, &mut doc);
    doc
}

/// One parsed `@type .. { .. }` header.
#[derive(Debug)]
struct BraceBlock<'a> {
    name: &'a str,
    label: Option<&'a str>,
    title: Option<&'a str>,
    modifier: Option<&'a str>,
    content: &'a str,
    /// Byte offset just past the closing brace.
    end: usize,
}

fn parse_blocks(
    source: &str,
    parent_id: Option<&str>,
    depth: usize,
    ctx: &mut ParseContext,
    doc: &mut DocumentData,
) {
    let mut rest = source;
    loop {
        let Some(at) = rest.find('@') else {
            flush_text(rest, parent_id, depth, ctx, doc);
            return;
        };
        flush_text(&rest[..at], parent_id, depth, ctx, doc);

        let Some(block) = read_block(&rest[at..]) else {
            // `@` that does not introduce a well-formed block: degrade the
            // remainder of the line into paragraph text.
            let line_end = rest[at..].find('\n').map(|i| at + i + 1).unwrap_or(rest.len());
            flush_paragraph(&rest[at..line_end], parent_id, depth, ctx, doc);
            rest = &rest[line_end..];
            continue;
        };
        build_block(&block, parent_id, depth, ctx, doc);
        rest = &rest[at + block.end..];
    }
}

fn flush_text(
    text: &str,
    parent_id: Option<&str>,
    depth: usize,
    ctx: &mut ParseContext,
    doc: &mut DocumentData,
) {
    // Blank-line separated runs become separate paragraphs.
    for chunk in text.split("\n\n") {
        flush_paragraph(chunk, parent_id, depth, ctx, doc);
    }
}

fn flush_paragraph(
    text: &str,
    parent_id: Option<&str>,
    depth: usize,
    ctx: &mut ParseContext,
    doc: &mut DocumentData,
) {
    let text = collapse_lines(text);
    if text.is_empty() {
        return;
    }
    push(doc, ctx, parent_id, depth, None, BlockKind::Paragraph { text });
}

fn collapse_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn push(
    doc: &mut DocumentData,
    ctx: &mut ParseContext,
    parent_id: Option<&str>,
    depth: usize,
    label: Option<String>,
    kind: BlockKind,
) -> String {
    let id = ctx.next_id();
    doc.blocks.push(Block {
        id: id.clone(),
        label,
        sort_key: ctx.next_sort_key(),
        parent_id: parent_id.map(str::to_string),
        depth,
        kind,
    });
    id
}

/// Read `@name[#label][ "title"][ modifier] { content }` from the start of
/// `input` (which begins at the `@`). Returns None when the shape does not
/// match, e.g. a missing opening brace.
fn read_block(input: &str) -> Option<BraceBlock<'_>> {
    let rest = input.strip_prefix('@')?;
    let name_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    if name_len == 0 {
        return None;
    }
    let name = &rest[..name_len];
    let mut pos = 1 + name_len;

    let mut label = None;
    if input[pos..].starts_with('#') {
        let start = pos + 1;
        let len = input[start..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == ':' || c == '-' || c == '_'))
            .unwrap_or(input.len() - start);
        label = Some(&input[start..start + len]);
        pos = start + len;
    }

    // Optional quoted title and a single bare modifier token, in either
    // order-tolerant scan up to the opening brace.
    let brace = input[pos..].find('{')? + pos;
    let head = &input[pos..brace];
    if head.contains('\n') {
        return None;
    }
    let mut title = None;
    let mut modifier = None;
    let mut scan = head;
    loop {
        scan = scan.trim_start();
        if scan.is_empty() {
            break;
        }
        if let Some(after) = scan.strip_prefix('"') {
            let close = after.find('"')?;
            title = Some(&after[..close]);
            scan = &after[close + 1..];
        } else {
            let len = scan
                .find(char::is_whitespace)
                .unwrap_or(scan.len());
            modifier = Some(&scan[..len]);
            scan = &scan[len..];
        }
    }

    // Balanced-brace scan for the block body.
    let mut depth = 0usize;
    let mut end = None;
    for (i, c) in input[brace..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(brace + i);
                    break;
                }
            }
            _ => {}
        }
    }
    let end = end?;
    Some(BraceBlock {
        name,
        label,
        title,
        modifier,
        content: &input[brace + 1..end],
        end: end + 1,
    })
}

fn build_block(
    block: &BraceBlock<'_>,
    parent_id: Option<&str>,
    depth: usize,
    ctx: &mut ParseContext,
    doc: &mut DocumentData,
) {
    let label = block.label.map(str::to_string);
    let content = block.content;
    match block.name {
        "section" | "subsection" | "subsubsection" => {
            let level = match block.name {
                "section" => 1,
                "subsection" => 2,
                _ => 3,
            };
            let title = block.title.unwrap_or("").to_string();
            let id = push(
                doc,
                ctx,
                parent_id,
                depth,
                label,
                BlockKind::Section { title, level },
            );
            parse_blocks(content, Some(&id), depth + 1, ctx, doc);
        }
        "document" => {
            let lines: Vec<String> = content.lines().map(str::to_string).collect();
            doc.meta = text_parser::meta_from_lines(&lines);
        }
        "p" => {
            push(
                doc,
                ctx,
                parent_id,
                depth,
                label,
                BlockKind::Paragraph {
                    text: collapse_lines(content),
                },
            );
        }
        "h" => {
            let level = block
                .modifier
                .and_then(|m| m.parse::<u8>().ok())
                .unwrap_or(1)
                .clamp(1, 6);
            push(
                doc,
                ctx,
                parent_id,
                depth,
                label,
                BlockKind::Heading {
                    text: content.trim().to_string(),
                    level,
                },
            );
        }
        "eq" => {
            let numbered = block.label.is_some();
            push(
                doc,
                ctx,
                parent_id,
                depth,
                label,
                BlockKind::Equation {
                    latex: content.trim().to_string(),
                    numbered,
                },
            );
        }
        "fig" => {
            let params = props::parse_inline(&content.lines().collect::<Vec<_>>().join(", "));
            let width = params
                .get("width")
                .and_then(|w| w.trim_end_matches('%').parse::<u8>().ok());
            push(
                doc,
                ctx,
                parent_id,
                depth,
                label,
                BlockKind::Figure {
                    src: params.get("src").cloned().unwrap_or_default(),
                    alt: params.get("alt").cloned().unwrap_or_default(),
                    caption: params
                        .get("caption")
                        .cloned()
                        .or_else(|| block.title.map(str::to_string))
                        .unwrap_or_default(),
                    width,
                },
            );
        }
        "tbl" => {
            let lines: Vec<String> = content.lines().map(str::to_string).collect();
            let (headers, rows, align) = text_parser::table_payload(&lines);
            push(
                doc,
                ctx,
                parent_id,
                depth,
                label,
                BlockKind::Table {
                    caption: block.title.unwrap_or("").to_string(),
                    headers,
                    rows,
                    align,
                },
            );
        }
        "code" => {
            push(
                doc,
                ctx,
                parent_id,
                depth,
                label,
                BlockKind::Code {
                    source: trim_block_newlines(content).to_string(),
                    language: block.modifier.unwrap_or("text").to_string(),
                    caption: block.title.map(str::to_string),
                    line_numbers: false,
                },
            );
        }
        "list" => {
            let ordered = block.modifier == Some("ordered");
            let items = content
                .lines()
                .map(|l| text_parser::strip_item_marker(l.trim()).to_string())
                .filter(|l| !l.is_empty())
                .collect();
            push(
                doc,
                ctx,
                parent_id,
                depth,
                label,
                BlockKind::List { ordered, items },
            );
        }
        "quote" => {
            push(
                doc,
                ctx,
                parent_id,
                depth,
                label,
                BlockKind::Quote {
                    text: collapse_lines(content),
                    attribution: block.title.map(str::to_string),
                },
            );
        }
        "hr" => {
            push(doc, ctx, parent_id, depth, label, BlockKind::Hr);
        }
        "bibliography" => {
            let lines: Vec<String> = content.lines().map(str::to_string).collect();
            doc.bibliography
                .extend(text_parser::parse_entry_lines(&lines));
        }
        _ => {
            // Unknown type: the most permissive fallback.
            flush_paragraph(content, parent_id, depth, ctx, doc);
        }
    }
}

fn trim_block_newlines(content: &str) -> &str {
    let s = content.strip_prefix('\n').unwrap_or(content);
    s.strip_suffix('\n').unwrap_or(s)
}
