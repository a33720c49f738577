//! HTML preview rendering: raw text-format source straight to markup.
//!
//! Two passes over the same source, both driven by the shared
//! [`BlockScanner`], because the markup must resolve *forward* references: a
//! `@toc` near the top needs headings that appear later, and a footnote
//! reference needs its definition wherever it sits.
//!
//! - Pass 1 collects every heading (level, text, slugified anchor) and every
//!   `@footnote(id)` definition into an ordered map.
//! - Pass 2 replays the scanner and renders each block immediately; the
//!   outermost element of every block carries a `source-line` attribute with
//!   the 1-based line where the block began, which the embedding editor uses
//!   for scroll synchronization.
//!
//! Math goes through an injected callback so the host can plug in a real
//! typesetter; the default wraps the escaped source. A failing callback
//! produces an inline error span, never a blank preview.

mod inline;

use indexmap::IndexMap;
use std::collections::HashMap;

use lml_core::scanner::{BlockEvent, BlockScanner, BlockSignal, DirectiveKind};
use lml_core::text::parser::{parse_entry_lines, strip_item_marker, table_payload};
use lml_core::{props, ColumnAlignment};

use crate::error::FormatError;
use crate::format::Format;
use inline::{math_markup, render_inline, InlineContext};

/// Callback turning LaTeX math into HTML. `display` is true for block
/// equations. The returned markup must already be HTML-safe.
pub type MathRenderer = Box<dyn Fn(&str, bool) -> Result<String, String> + Send + Sync>;

/// The built-in renderer: escaped source in a classed span, for hosts
/// without a typesetter.
pub fn default_math_renderer() -> MathRenderer {
    Box::new(|latex, display| {
        let class = if display { "math math-display" } else { "math math-inline" };
        Ok(format!(
            "<span class=\"{class}\">{}</span>",
            html_escape::encode_text(latex)
        ))
    })
}

pub struct RenderOptions {
    pub math: MathRenderer,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            math: default_math_renderer(),
        }
    }
}

/// Render text-format source to presentation markup.
pub fn render_to_markup(source: &str) -> String {
    render_to_markup_with_options(source, &RenderOptions::default())
}

pub fn render_to_markup_with_options(source: &str, options: &RenderOptions) -> String {
    let outline = collect_outline(source);
    let mut renderer = Renderer {
        outline: &outline,
        options,
        heading_index: 0,
        out: String::new(),
    };
    for event in BlockScanner::new(source) {
        renderer.block(&event);
    }
    renderer.footnote_section();
    renderer.out
}

struct HeadingRef {
    level: u8,
    text: String,
    anchor: String,
}

struct Outline {
    headings: Vec<HeadingRef>,
    footnotes: IndexMap<String, String>,
}

/// Pass 1: headings and footnote definitions, in document order.
fn collect_outline(source: &str) -> Outline {
    let mut headings = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut footnotes = IndexMap::new();

    for event in BlockScanner::new(source) {
        match event.signal {
            BlockSignal::Heading(level) => {
                let text = event.param_line.trim_start_matches('#').trim().to_string();
                let base = slugify(&text);
                let count = seen.entry(base.clone()).or_insert(0);
                *count += 1;
                let anchor = if *count == 1 {
                    base
                } else {
                    format!("{base}-{count}")
                };
                headings.push(HeadingRef { level, text, anchor });
            }
            BlockSignal::Directive(DirectiveKind::Footnote) => {
                if let Some((id, tail)) = footnote_parts(&event.param_line) {
                    let mut text = tail;
                    for line in &event.lines {
                        if !text.is_empty() {
                            text.push(' ');
                        }
                        text.push_str(line.trim());
                    }
                    footnotes.entry(id).or_insert(text);
                }
            }
            _ => {}
        }
    }

    Outline { headings, footnotes }
}

/// `@footnote(id) optional text` → (id, text after the paren).
fn footnote_parts(line: &str) -> Option<(String, String)> {
    let open = line.find('(')?;
    let close = line[open..].find(')')? + open;
    let id = line[open + 1..close].trim();
    if id.is_empty() {
        return None;
    }
    Some((id.to_string(), line[close + 1..].trim().to_string()))
}

fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

struct Renderer<'a> {
    outline: &'a Outline,
    options: &'a RenderOptions,
    heading_index: usize,
    out: String,
}

impl<'a> Renderer<'a> {
    fn inline(&self, text: &str) -> String {
        render_inline(
            text,
            &InlineContext {
                footnotes: &self.outline.footnotes,
                math: &self.options.math,
            },
        )
    }

    fn block(&mut self, event: &BlockEvent) {
        let line = event.start_line;
        match event.signal {
            BlockSignal::DocumentHeader => {}
            BlockSignal::Heading(level) => {
                // Anchors come from pass 1; both passes walk the same scanner
                // over the same source, so the indices line up.
                let heading = &self.outline.headings[self.heading_index];
                self.heading_index += 1;
                self.out.push_str(&format!(
                    "<h{level} id=\"{}\" source-line=\"{line}\">{}</h{level}>\n",
                    heading.anchor,
                    self.inline(&heading.text)
                ));
            }
            BlockSignal::Hr => {
                self.out.push_str(&format!("<hr source-line=\"{line}\">\n"));
            }
            BlockSignal::Quote => self.quote(event),
            BlockSignal::LatexPassthrough { .. } => {
                // Only meaningful to a full LaTeX compiler; the preview shows
                // an opaque placeholder.
                self.out.push_str(&format!(
                    "<div class=\"latex-passthrough\" source-line=\"{line}\">[LaTeX block, {} line{}]</div>\n",
                    event.lines.len(),
                    if event.lines.len() == 1 { "" } else { "s" }
                ));
            }
            BlockSignal::LatexEnd => {
                self.out.push_str(&format!(
                    "<p source-line=\"{line}\">{}</p>\n",
                    self.inline(&event.param_line)
                ));
            }
            BlockSignal::Bibliography => self.bibliography(event),
            BlockSignal::Directive(kind) => self.directive(kind, event),
            BlockSignal::Paragraph => {
                let text = event
                    .lines
                    .iter()
                    .map(|l| l.trim())
                    .collect::<Vec<_>>()
                    .join("\n");
                self.out.push_str(&format!(
                    "<p source-line=\"{line}\">{}</p>\n",
                    self.inline(&text)
                ));
            }
        }
    }

    fn directive(&mut self, kind: DirectiveKind, event: &BlockEvent) {
        let line = event.start_line;
        let (positional, params) = split_params(&event.param_line);
        match kind {
            DirectiveKind::Equation => {
                let latex = event
                    .lines
                    .iter()
                    .map(|l| l.trim())
                    .collect::<Vec<_>>()
                    .join("\n");
                let id = params
                    .get("label")
                    .map(|l| format!(" id=\"{}\"", html_escape::encode_double_quoted_attribute(l)))
                    .unwrap_or_default();
                self.out.push_str(&format!(
                    "<div class=\"equation\"{id} source-line=\"{line}\">{}</div>\n",
                    math_markup(&self.options.math, &latex, true)
                ));
            }
            DirectiveKind::Figure => {
                let src = params.get("src").cloned().unwrap_or_default();
                let alt = params.get("alt").cloned().unwrap_or_default();
                let style = params
                    .get("width")
                    .map(|w| format!(" style=\"width: {}%\"", w.trim_end_matches('%')))
                    .unwrap_or_default();
                let id = params
                    .get("label")
                    .map(|l| format!(" id=\"{}\"", html_escape::encode_double_quoted_attribute(l)))
                    .unwrap_or_default();
                self.out.push_str(&format!(
                    "<figure{id} source-line=\"{line}\"><img src=\"{}\" alt=\"{}\"{style}>",
                    html_escape::encode_double_quoted_attribute(&src),
                    html_escape::encode_double_quoted_attribute(&alt),
                ));
                if let Some(caption) = params.get("caption") {
                    self.out
                        .push_str(&format!("<figcaption>{}</figcaption>", self.inline(caption)));
                }
                self.out.push_str("</figure>\n");
            }
            DirectiveKind::Code => {
                let language = positional
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "text".to_string());
                self.out.push_str(&format!(
                    "<pre source-line=\"{line}\"><code class=\"language-{language}\">{}</code></pre>\n",
                    html_escape::encode_text(&event.lines.join("\n"))
                ));
            }
            DirectiveKind::Table => self.table(event, &params),
            DirectiveKind::List => {
                let tag = if event.param_line.contains("ordered") {
                    "ol"
                } else {
                    "ul"
                };
                self.out.push_str(&format!("<{tag} source-line=\"{line}\">"));
                for item in &event.lines {
                    let item = strip_item_marker(item.trim());
                    if !item.is_empty() {
                        self.out
                            .push_str(&format!("<li>{}</li>", self.inline(item)));
                    }
                }
                self.out.push_str(&format!("</{tag}>\n"));
            }
            DirectiveKind::Abstract => {
                let text = event
                    .lines
                    .iter()
                    .map(|l| l.trim())
                    .collect::<Vec<_>>()
                    .join("\n");
                self.out.push_str(&format!(
                    "<p class=\"abstract\" source-line=\"{line}\"><strong>Abstract.</strong> {}</p>\n",
                    self.inline(&text)
                ));
            }
            DirectiveKind::Theorem(theorem) => {
                let text = event
                    .lines
                    .iter()
                    .map(|l| l.trim())
                    .collect::<Vec<_>>()
                    .join("\n");
                self.out.push_str(&format!(
                    "<p class=\"theorem\" source-line=\"{line}\"><strong>{}.</strong> {}</p>\n",
                    theorem.display_name(),
                    self.inline(&text)
                ));
            }
            DirectiveKind::Pagebreak => {
                self.out
                    .push_str(&format!("<div class=\"pagebreak\" source-line=\"{line}\"></div>\n"));
            }
            DirectiveKind::Toc => {
                self.toc(line);
                // Non-blank lines folded into the toc block are still
                // content; emit them as a paragraph after the nav.
                let trailing = event
                    .lines
                    .iter()
                    .map(|l| l.trim())
                    .collect::<Vec<_>>()
                    .join("\n");
                if !trailing.is_empty() {
                    self.out.push_str(&format!(
                        "<p source-line=\"{}\">{}</p>\n",
                        line + 1,
                        self.inline(&trailing)
                    ));
                }
            }
            // Definitions render in the trailing footnote section only.
            DirectiveKind::Footnote => {}
        }
    }

    fn quote(&mut self, event: &BlockEvent) {
        let mut lines: Vec<String> = event
            .lines
            .iter()
            .map(|l| l.trim().trim_start_matches('>').trim_start().to_string())
            .collect();
        let attribution = match lines.last() {
            Some(last) if last.starts_with("--") => {
                let name = last.trim_start_matches('-').trim().to_string();
                lines.pop();
                Some(name)
            }
            _ => None,
        };
        self.out.push_str(&format!(
            "<blockquote source-line=\"{}\"><p>{}</p>",
            event.start_line,
            self.inline(&lines.join("\n"))
        ));
        if let Some(attribution) = attribution {
            self.out.push_str(&format!(
                "<footer>{}</footer>",
                self.inline(&attribution)
            ));
        }
        self.out.push_str("</blockquote>\n");
    }

    fn table(&mut self, event: &BlockEvent, params: &HashMap<String, String>) {
        let (headers, rows, align) = table_payload(&event.lines);
        self.out
            .push_str(&format!("<table source-line=\"{}\">", event.start_line));
        if let Some(caption) = params.get("caption") {
            self.out
                .push_str(&format!("<caption>{}</caption>", self.inline(caption)));
        }
        let style = |i: usize| match align.as_ref().and_then(|a| a.get(i)) {
            Some(ColumnAlignment::Center) => " style=\"text-align: center\"",
            Some(ColumnAlignment::Right) => " style=\"text-align: right\"",
            _ => "",
        };
        self.out.push_str("<thead><tr>");
        for (i, header) in headers.iter().enumerate() {
            self.out
                .push_str(&format!("<th{}>{}</th>", style(i), self.inline(header)));
        }
        self.out.push_str("</tr></thead><tbody>");
        for row in &rows {
            self.out.push_str("<tr>");
            for (i, cell) in row.iter().enumerate() {
                self.out
                    .push_str(&format!("<td{}>{}</td>", style(i), self.inline(cell)));
            }
            self.out.push_str("</tr>");
        }
        self.out.push_str("</tbody></table>\n");
    }

    fn toc(&mut self, line: usize) {
        self.out
            .push_str(&format!("<nav class=\"toc\" source-line=\"{line}\">"));
        let mut open: u8 = 0;
        for heading in &self.outline.headings {
            while open < heading.level {
                self.out.push_str("<ul>");
                open += 1;
            }
            while open > heading.level {
                self.out.push_str("</ul>");
                open -= 1;
            }
            self.out.push_str(&format!(
                "<li><a href=\"#{}\">{}</a></li>",
                heading.anchor,
                html_escape::encode_text(&heading.text)
            ));
        }
        while open > 0 {
            self.out.push_str("</ul>");
            open -= 1;
        }
        self.out.push_str("</nav>\n");
    }

    fn bibliography(&mut self, event: &BlockEvent) {
        self.out.push_str(&format!(
            "<section class=\"bibliography\" source-line=\"{}\"><ul>",
            event.start_line
        ));
        let entries = parse_entry_lines(&event.lines);
        if !entries.is_empty() {
            for entry in entries {
                let mut parts = Vec::new();
                if !entry.author.is_empty() {
                    parts.push(html_escape::encode_text(&entry.author).into_owned());
                }
                if !entry.title.is_empty() {
                    parts.push(format!("<em>{}</em>", html_escape::encode_text(&entry.title)));
                }
                if entry.year != 0 {
                    parts.push(entry.year.to_string());
                }
                self.out.push_str(&format!(
                    "<li id=\"ref-{}\"><span class=\"ref-key\">[{}]</span> {}</li>",
                    html_escape::encode_double_quoted_attribute(&entry.key),
                    html_escape::encode_text(&entry.key),
                    parts.join(". ")
                ));
            }
        } else {
            // Raw reference lines, optionally `[key] text`.
            for raw in &event.lines {
                let raw = raw.trim();
                if raw.is_empty() {
                    continue;
                }
                if let Some(rest) = raw.strip_prefix('[') {
                    if let Some(end) = rest.find(']') {
                        let key = &rest[..end];
                        self.out.push_str(&format!(
                            "<li id=\"ref-{}\"><span class=\"ref-key\">[{}]</span>{}</li>",
                            html_escape::encode_double_quoted_attribute(key),
                            html_escape::encode_text(key),
                            self.inline(&rest[end + 1..])
                        ));
                        continue;
                    }
                }
                self.out
                    .push_str(&format!("<li>{}</li>", self.inline(raw)));
            }
        }
        self.out.push_str("</ul></section>\n");
    }

    fn footnote_section(&mut self) {
        if self.outline.footnotes.is_empty() {
            return;
        }
        self.out.push_str("<section class=\"footnotes\"><ol>");
        for (id, text) in &self.outline.footnotes {
            self.out.push_str(&format!(
                "<li id=\"fn-{id}\">{} <a class=\"footnote-backlink\" href=\"#fnref-{id}\">\u{21a9}</a></li>",
                self.inline(text)
            ));
        }
        self.out.push_str("</ol></section>\n");
    }
}

/// Positional tokens and `key: value` properties of a directive line.
fn split_params(param_line: &str) -> (Vec<String>, HashMap<String, String>) {
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
            positional.push(props::strip_quotes(part.trim()).to_string());
        }
    }
    (positional, keyed)
}

/// HTML preview as a [`Format`]: serialization renders the canonical text
/// form of the document.
pub struct HtmlFormat {
    options: RenderOptions,
}

impl Default for HtmlFormat {
    fn default() -> Self {
        HtmlFormat {
            options: RenderOptions::default(),
        }
    }
}

impl HtmlFormat {
    pub fn with_options(options: RenderOptions) -> Self {
        HtmlFormat { options }
    }
}

impl Format for HtmlFormat {
    fn name(&self) -> &str {
        "html"
    }

    fn description(&self) -> &str {
        "HTML preview markup (export only)"
    }

    fn file_extensions(&self) -> &[&str] {
        &["html", "htm"]
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn serialize(&self, doc: &lml_core::DocumentData) -> Result<String, FormatError> {
        let source = lml_core::text::serialize(doc);
        Ok(render_to_markup_with_options(&source, &self.options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_gets_anchor_and_source_line() {
        let html = render_to_markup("# Intro\n\nHello *world*.\n");
        assert!(html.contains("<h1 id=\"intro\" source-line=\"1\">Intro</h1>"));
        assert!(html.contains("<p source-line=\"3\">Hello <em>world</em>.</p>"));
    }

    #[test]
    fn duplicate_heading_slugs_are_deduped() {
        let html = render_to_markup("# Setup\n\n# Setup\n");
        assert!(html.contains("id=\"setup\""));
        assert!(html.contains("id=\"setup-2\""));
    }

    #[test]
    fn toc_anchors_match_headings() {
        let html = render_to_markup("@toc\n\n# One\n\n## Two\n");
        assert!(html.contains("<a href=\"#one\">One</a>"));
        assert!(html.contains("<a href=\"#two\">Two</a>"));
        assert!(html.contains("<nav class=\"toc\""));
    }

    #[test]
    fn passthrough_is_an_opaque_placeholder() {
        let html = render_to_markup("@latex\n\\tikz{}\n@endlatex\n");
        assert!(html.contains("latex-passthrough"));
        assert!(!html.contains("\\tikz"));
    }

    #[test]
    fn footnotes_link_both_ways() {
        let html = render_to_markup("Claim@fn(n1).\n\n@footnote(n1) The fine print.\n");
        assert!(html.contains("id=\"fnref-n1\""));
        assert!(html.contains("href=\"#fn-n1\""));
        assert!(html.contains("<li id=\"fn-n1\">The fine print."));
        assert!(html.contains("href=\"#fnref-n1\""));
    }

    #[test]
    fn equation_renders_through_the_math_callback() {
        let html = render_to_markup("@equation(label: eq:a)\nE=mc^2\n");
        assert!(html.contains("<div class=\"equation\" id=\"eq:a\" source-line=\"1\">"));
        assert!(html.contains("math-display"));
        assert!(html.contains("E=mc^2"));
    }

    #[test]
    fn table_alignment_becomes_cell_style() {
        let html = render_to_markup("@table\n| A | B |\n|:---:|---:|\n| 1 | 2 |\n");
        assert!(html.contains("<th style=\"text-align: center\">A</th>"));
        assert!(html.contains("<td style=\"text-align: right\">2</td>"));
    }

    #[test]
    fn bibliography_entry_records_render_with_anchors() {
        let html = render_to_markup(
            "@bibliography {\n@entry k1 {\ntype: book\nauthor: A. Writer\ntitle: T\nyear: 2001\n}\n}\n",
        );
        assert!(html.contains("id=\"ref-k1\""));
        assert!(html.contains("[k1]"));
        assert!(html.contains("<em>T</em>"));
    }

    #[test]
    fn bibliography_authors_and_keys_are_escaped() {
        let html = render_to_markup(
            "@bibliography {\n@entry k<1> {\nauthor: Writer <script> & Co\ntitle: T\nyear: 2001\n}\n}\n",
        );
        assert!(html.contains("Writer &lt;script&gt; &amp; Co"));
        assert!(html.contains("[k&lt;1&gt;]"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn block_labels_are_attribute_escaped() {
        let html = render_to_markup("@equation(label: eq\"a)\nE=mc^2\n");
        assert!(html.contains("id=\"eq&quot;a\""));
        let html = render_to_markup("@figure(src: a.png, label: fig\"b)\n");
        assert!(html.contains("id=\"fig&quot;b\""));
    }

    #[test]
    fn code_content_is_escaped_not_formatted() {
        let html = render_to_markup("@code(rust)\nlet x = a < b && c > d;\n");
        assert!(html.contains("language-rust"));
        assert!(html.contains("a &lt; b &amp;&amp; c &gt; d"));
    }
}
