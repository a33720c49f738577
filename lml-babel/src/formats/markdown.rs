//! Markdown export (block model → CommonMark)
//!
//! Export-only: LML's own text format already covers authoring, so nothing
//! imports Markdown. We use `comrak` and build its AST, then let
//! `format_commonmark` do the writing; hand-rolled Markdown emission always
//! drifts from CommonMark on escaping edge cases.
//!
//! Lossy conversions:
//! - equations become `$$..$$` paragraphs (no math in CommonMark);
//! - citations/references (`@cite{..}`, `@ref{..}`) stay as literal text;
//! - figure width and code captions are dropped;
//! - passthrough LaTeX is emitted as a fenced `latex` code block.

use std::cell::RefCell;

use comrak::nodes::{Ast, AstNode, ListDelimType, ListType, NodeValue};
use comrak::{format_commonmark, Arena, Options};

use crate::error::FormatError;
use crate::format::Format;
use lml_core::ast::{Block, BlockKind, DocumentData};

pub struct MarkdownFormat;

impl Format for MarkdownFormat {
    fn name(&self) -> &str {
        "markdown"
    }

    fn description(&self) -> &str {
        "CommonMark Markdown (export only)"
    }

    fn file_extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn serialize(&self, doc: &DocumentData) -> Result<String, FormatError> {
        serialize_to_markdown(doc)
    }
}

pub fn serialize_to_markdown(doc: &DocumentData) -> Result<String, FormatError> {
    let arena = Arena::new();
    let root = node(&arena, NodeValue::Document);

    if !doc.meta.title.is_empty() {
        let heading = node(
            &arena,
            NodeValue::Heading(comrak::nodes::NodeHeading {
                level: 1,
                setext: false,
            }),
        );
        heading.append(node(&arena, NodeValue::Text(doc.meta.title.clone())));
        root.append(heading);
    }

    for block in doc.roots() {
        append_block(&arena, root, doc, block, 0);
    }

    if !doc.bibliography.is_empty() {
        let heading = node(
            &arena,
            NodeValue::Heading(comrak::nodes::NodeHeading {
                level: 2,
                setext: false,
            }),
        );
        heading.append(node(&arena, NodeValue::Text("References".to_string())));
        root.append(heading);
        for entry in &doc.bibliography {
            let para = node(&arena, NodeValue::Paragraph);
            let mut text = format!("[{}] ", entry.key);
            if !entry.author.is_empty() {
                text.push_str(&entry.author);
                text.push_str(". ");
            }
            text.push_str(&entry.title);
            if entry.year != 0 {
                text.push_str(&format!(" ({})", entry.year));
            }
            para.append(node(&arena, NodeValue::Text(text)));
            root.append(para);
        }
    }

    let mut output = Vec::new();
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    format_commonmark(root, &options, &mut output)
        .map_err(|e| FormatError::SerializationError(format!("comrak failed: {e}")))?;
    String::from_utf8(output)
        .map_err(|e| FormatError::SerializationError(format!("invalid UTF-8: {e}")))
}

fn node<'a>(arena: &'a Arena<AstNode<'a>>, value: NodeValue) -> &'a AstNode<'a> {
    arena.alloc(AstNode::new(RefCell::new(Ast::new(value, (0, 1).into()))))
}

fn append_block<'a>(
    arena: &'a Arena<AstNode<'a>>,
    root: &'a AstNode<'a>,
    doc: &DocumentData,
    block: &Block,
    heading_offset: u8,
) {
    match &block.kind {
        BlockKind::Section { title, level } => {
            let heading = node(
                arena,
                NodeValue::Heading(comrak::nodes::NodeHeading {
                    level: (*level + heading_offset).min(6),
                    setext: false,
                }),
            );
            append_inlines(arena, heading, title);
            root.append(heading);
            for child in doc.children_of(&block.id) {
                append_block(arena, root, doc, child, heading_offset);
            }
        }
        BlockKind::Heading { text, level } => {
            let heading = node(
                arena,
                NodeValue::Heading(comrak::nodes::NodeHeading {
                    level: (*level + heading_offset).min(6),
                    setext: false,
                }),
            );
            append_inlines(arena, heading, text);
            root.append(heading);
        }
        BlockKind::Paragraph { text } => {
            // Passthrough LaTeX exports as a fenced block so it survives a
            // later hand-conversion.
            if let Some(inner) = text
                .strip_prefix("@latex\n")
                .and_then(|t| t.strip_suffix("\n@endlatex"))
            {
                root.append(code_block(arena, "latex", inner));
            } else {
                let para = node(arena, NodeValue::Paragraph);
                append_inlines(arena, para, text);
                root.append(para);
            }
        }
        BlockKind::Equation { latex, .. } => {
            let para = node(arena, NodeValue::Paragraph);
            para.append(node(arena, NodeValue::Text(format!("$${latex}$$"))));
            root.append(para);
        }
        BlockKind::Figure { src, alt, caption, .. } => {
            let para = node(arena, NodeValue::Paragraph);
            let image = node(
                arena,
                NodeValue::Image(comrak::nodes::NodeLink {
                    url: src.clone(),
                    title: caption.clone(),
                }),
            );
            image.append(node(arena, NodeValue::Text(alt.clone())));
            para.append(image);
            root.append(para);
        }
        BlockKind::Table { headers, rows, .. } => {
            // comrak's table AST requires alignment metadata per cell run;
            // emitting the pipe form as literal text is simpler and renders
            // identically for our always-left tables.
            let mut lines = Vec::new();
            lines.push(format!("| {} |", headers.join(" | ")));
            lines.push(format!(
                "| {} |",
                vec!["---"; headers.len()].join(" | ")
            ));
            for row in rows {
                lines.push(format!("| {} |", row.join(" | ")));
            }
            root.append(html_block(arena, &lines.join("\n")));
        }
        BlockKind::Code { source, language, .. } => {
            root.append(code_block(arena, language, source));
        }
        BlockKind::List { ordered, items } => {
            let list_type = if *ordered {
                ListType::Ordered
            } else {
                ListType::Bullet
            };
            let list_node = comrak::nodes::NodeList {
                list_type,
                start: 1,
                delimiter: ListDelimType::Period,
                bullet_char: b'-',
                tight: true,
                ..Default::default()
            };
            let list = node(arena, NodeValue::List(list_node));
            for item in items {
                let item_node = node(arena, NodeValue::Item(list_node));
                let para = node(arena, NodeValue::Paragraph);
                append_inlines(arena, para, item);
                item_node.append(para);
                list.append(item_node);
            }
            root.append(list);
        }
        BlockKind::Quote { text, attribution } => {
            let quote = node(arena, NodeValue::BlockQuote);
            let para = node(arena, NodeValue::Paragraph);
            append_inlines(arena, para, text);
            quote.append(para);
            if let Some(attribution) = attribution {
                let credit = node(arena, NodeValue::Paragraph);
                credit.append(node(arena, NodeValue::Text(format!("-- {attribution}"))));
                quote.append(credit);
            }
            root.append(quote);
        }
        BlockKind::Hr => root.append(node(arena, NodeValue::ThematicBreak)),
    }
}

fn code_block<'a>(arena: &'a Arena<AstNode<'a>>, language: &str, source: &str) -> &'a AstNode<'a> {
    node(
        arena,
        NodeValue::CodeBlock(comrak::nodes::NodeCodeBlock {
            fenced: true,
            fence_char: b'`',
            fence_length: 3,
            fence_offset: 0,
            info: language.to_string(),
            literal: format!("{source}\n"),
        }),
    )
}

fn html_block<'a>(arena: &'a Arena<AstNode<'a>>, literal: &str) -> &'a AstNode<'a> {
    node(
        arena,
        NodeValue::HtmlBlock(comrak::nodes::NodeHtmlBlock {
            block_type: 0,
            literal: format!("{literal}\n"),
        }),
    )
}

/// Minimal inline splitter: `**bold**`, `*italic*` and `` `code` `` become
/// comrak inline nodes; everything else stays literal text. Bold is matched
/// before italic.
fn append_inlines<'a>(arena: &'a Arena<AstNode<'a>>, parent: &'a AstNode<'a>, text: &str) {
    let mut rest = text;
    while !rest.is_empty() {
        let bold = find_span(rest, "**", "**");
        let italic = find_span(rest, "*", "*");
        let code = find_span(rest, "`", "`");

        let next = [("b", bold), ("i", italic), ("c", code)]
            .into_iter()
            .filter_map(|(tag, span)| span.map(|s| (tag, s)))
            .min_by_key(|(tag, (start, _, _))| (*start, if *tag == "b" { 0 } else { 1 }));

        let Some((tag, (start, inner, end))) = next else {
            parent.append(node(arena, NodeValue::Text(rest.to_string())));
            break;
        };
        if start > 0 {
            parent.append(node(arena, NodeValue::Text(rest[..start].to_string())));
        }
        match tag {
            "b" => {
                let strong = node(arena, NodeValue::Strong);
                strong.append(node(arena, NodeValue::Text(inner)));
                parent.append(strong);
            }
            "i" => {
                let emph = node(arena, NodeValue::Emph);
                emph.append(node(arena, NodeValue::Text(inner)));
                parent.append(emph);
            }
            _ => parent.append(node(arena, NodeValue::Code(comrak::nodes::NodeCode {
                num_backticks: 1,
                literal: inner,
            }))),
        }
        rest = &rest[end..];
    }
}

/// Find `open .. close` in `text`. Returns (start, inner, offset past close).
fn find_span(text: &str, open: &str, close: &str) -> Option<(usize, String, usize)> {
    let start = text.find(open)?;
    let inner_start = start + open.len();
    let inner_len = text[inner_start..].find(close)?;
    if inner_len == 0 {
        return None;
    }
    let inner = text[inner_start..inner_start + inner_len].to_string();
    Some((start, inner, inner_start + inner_len + close.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lml_core::text::parse_text;

    fn export(source: &str) -> String {
        MarkdownFormat.serialize(&parse_text(source)).unwrap()
    }

    #[test]
    fn headings_and_inline_formatting() {
        let md = export("@document\ntitle: T\n\n# Intro\n\nHello **bold** and *soft*.\n");
        assert!(md.contains("# T"));
        assert!(md.contains("# Intro"));
        assert!(md.contains("**bold**"));
        assert!(md.contains("*soft*"));
    }

    #[test]
    fn code_blocks_are_fenced_with_language() {
        let md = export("@code(rust)\nfn main() {}\n");
        assert!(md.contains("``` rust") || md.contains("```rust"));
        assert!(md.contains("fn main() {}"));
    }

    #[test]
    fn equations_become_display_math_text() {
        let md = export("@equation(label: eq:a)\nE=mc^2\n");
        assert!(md.contains("$$E=mc^2$$"));
    }

    #[test]
    fn lists_and_quotes() {
        let md = export("@list(ordered)\n1. one\n2. two\n\n> Words.\n> -- Someone\n");
        assert!(md.contains("1.  one") || md.contains("1. one"));
        assert!(md.contains("> Words."));
    }

    #[test]
    fn parsing_is_not_supported() {
        assert!(MarkdownFormat.parse("# x").is_err());
    }
}
