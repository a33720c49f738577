//! LaTeX import: foreign source into the block model.
//!
//! Two phases. The preamble is scanned with regexes for the handful of
//! metadata commands worth keeping. The body is tokenized into an ordered
//! sequence of environments, one-argument commands and bare commands; every
//! token dispatches to a handler that appends zero or more blocks, and the
//! text between tokens becomes paragraphs.
//!
//! Environment spans are found by locating `\begin{name}` with a regex and
//! then scanning forward for the matching `\end{name}` with a same-name
//! nesting counter. The two command allow-lists are mutually exclusive by
//! construction; overlapping matches are never resolved, only skipped when
//! they fall inside an already-consumed span.
//!
//! Anything unrecognized degrades to a paragraph of its raw content and
//! pushes a warning (an error under `strict_mode`). Import never fails.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use lml_core::ast::{BibEntry, Block, BlockKind, DocumentMeta, EntryType, PageSize};
use lml_core::scanner::TheoremKind;
use lml_core::ParseContext;

/// Knobs for the importer.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Keep `\label{..}` values as block labels.
    pub preserve_labels: bool,
    /// Rewrite `\( .. \)` spans into `$..$` inline math.
    pub parse_inline_math: bool,
    /// Treat unrecognized environments as errors instead of degrading.
    pub strict_mode: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            preserve_labels: true,
            parse_inline_math: true,
            strict_mode: false,
        }
    }
}

/// A non-fatal finding produced during import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportIssue {
    pub message: String,
    /// 1-based source line, when known.
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl ImportIssue {
    fn new(message: impl Into<String>) -> Self {
        ImportIssue {
            message: message.into(),
            line: None,
            suggestion: None,
        }
    }

    fn at_line(message: impl Into<String>, line: usize) -> Self {
        ImportIssue {
            message: message.into(),
            line: Some(line),
            suggestion: None,
        }
    }
}

impl fmt::Display for ImportIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "line {line}: {}", self.message)?,
            None => write!(f, "{}", self.message)?,
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

/// The result of an import. Errors never abort the import; they describe
/// what could not be carried over.
#[derive(Debug, Clone, Default)]
pub struct LatexImport {
    pub meta: DocumentMeta,
    pub blocks: Vec<Block>,
    pub bibliography: Vec<BibEntry>,
    pub errors: Vec<ImportIssue>,
    pub warnings: Vec<ImportIssue>,
}

/// Structural pre-check: unbalanced braces and a mismatched document
/// environment. Escaped braces do not count.
pub fn validate_latex(source: &str) -> Vec<ImportIssue> {
    let mut issues = Vec::new();
    let mut depth: i64 = 0;
    let mut prev = '\0';
    for c in source.chars() {
        if prev != '\\' {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
        }
        prev = if prev == '\\' && c == '\\' { '\0' } else { c };
    }
    if depth != 0 {
        issues.push(ImportIssue::new(format!(
            "unbalanced braces ({} unmatched {})",
            depth.abs(),
            if depth > 0 { "opening" } else { "closing" }
        )));
    }
    let begins = source.matches("\\begin{document}").count();
    let ends = source.matches("\\end{document}").count();
    if begins != ends {
        issues.push(ImportIssue::new(
            "\\begin{document} and \\end{document} do not match",
        ));
    }
    issues
}

static ENV_BEGIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\begin\{([a-zA-Z]+\*?)\}").unwrap());
static SECTION_CMD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\(section|subsection|subsubsection)\*?\s*\{").unwrap());
static BARE_CMD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(maketitle|tableofcontents|newpage|clearpage|bigskip|medskip|noindent)\b")
        .unwrap()
});

static PRE_DOCUMENTCLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\documentclass(?:\[([^\]]*)\])?\{([a-zA-Z]+)\}").unwrap());
static PRE_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\title\{([^{}]*)\}").unwrap());
static PRE_AUTHOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\author\{([^{}]*)\}").unwrap());
static PRE_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\date\{([^{}]*)\}").unwrap());

static INCLUDEGRAPHICS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\includegraphics(?:\[([^\]]*)\])?\{([^{}]*)\}").unwrap());
static CAPTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\caption\{([^{}]*)\}").unwrap());
static LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\label\{([^{}]*)\}").unwrap());
static GRAPHICS_WIDTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"width\s*=\s*([0-9.]+)\s*\\(?:text|line|column)width").unwrap());
static BIBITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\bibitem\{([^{}]*)\}").unwrap());
static LISTING_LANGUAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"language\s*=\s*([A-Za-z+#]+)").unwrap());

/// Import LaTeX source.
pub fn import_latex(source: &str, options: &ImportOptions) -> LatexImport {
    let mut import = LatexImport::default();
    import.errors.extend(validate_latex(source));

    let (preamble, body) = split_document(source);
    import.meta = scan_preamble(preamble);

    let mut ctx = ParseContext::new();
    // Body is a slice of source; the offset turns body positions back into
    // source line numbers.
    let body_base = body.as_ptr() as usize - source.as_ptr() as usize;
    let mut state = BodyState {
        source,
        body_base,
        ctx: &mut ctx,
        options,
        import: &mut import,
    };
    state.tokenize(body);

    import
}

/// Everything before `\begin{document}` and the content of the document
/// environment. Without the environment the whole source is the body.
fn split_document(source: &str) -> (&str, &str) {
    match source.find("\\begin{document}") {
        Some(begin) => {
            let preamble = &source[..begin];
            let after = &source[begin + "\\begin{document}".len()..];
            let body = match after.rfind("\\end{document}") {
                Some(end) => &after[..end],
                None => after,
            };
            (preamble, body)
        }
        None => ("", source),
    }
}

fn scan_preamble(preamble: &str) -> DocumentMeta {
    let mut meta = DocumentMeta::default();
    if let Some(caps) = PRE_DOCUMENTCLASS.captures(preamble) {
        if let Some(class_options) = caps.get(1) {
            for option in class_options.as_str().split(',') {
                let option = option.trim();
                if let Some(points) = option.strip_suffix("pt") {
                    if let Ok(size) = points.parse::<f32>() {
                        meta.font_size = size;
                    }
                } else if option == "letterpaper" {
                    meta.page_size = PageSize::Letter;
                } else if option == "a4paper" {
                    meta.page_size = PageSize::A4;
                }
            }
        }
        meta.template = Some(caps[2].to_string());
    }
    if let Some(caps) = PRE_TITLE.captures(preamble) {
        meta.title = clean_text(&caps[1], &ImportOptions::default());
    }
    if let Some(caps) = PRE_AUTHOR.captures(preamble) {
        meta.author = Some(clean_text(&caps[1], &ImportOptions::default()));
    }
    if let Some(caps) = PRE_DATE.captures(preamble) {
        let date = caps[1].trim();
        if !date.is_empty() && date != "\\today" {
            meta.date = Some(date.to_string());
        }
    }
    meta
}

/// One recognized token in the body, ordered by start offset.
struct Token {
    start: usize,
    end: usize,
    kind: TokenKind,
}

enum TokenKind {
    Environment { name: String, content_range: (usize, usize) },
    Section { level: u8, title: String },
    Bare,
}

struct BodyState<'a, 'b> {
    source: &'a str,
    body_base: usize,
    ctx: &'b mut ParseContext,
    options: &'b ImportOptions,
    import: &'b mut LatexImport,
}

impl<'a, 'b> BodyState<'a, 'b> {
    fn tokenize(&mut self, body: &str) {
        let mut tokens: Vec<Token> = Vec::new();

        for caps in ENV_BEGIN.captures_iter(body) {
            let whole = caps.get(0).unwrap();
            let name = caps[1].to_string();
            match find_env_end(body, &name, whole.end()) {
                Some((content_end, span_end)) => tokens.push(Token {
                    start: whole.start(),
                    end: span_end,
                    kind: TokenKind::Environment {
                        name,
                        content_range: (whole.end(), content_end),
                    },
                }),
                None => {
                    self.import.errors.push(ImportIssue::at_line(
                        format!("\\begin{{{name}}} is never closed"),
                        self.line_of(body, whole.start()),
                    ));
                    // Treat the rest of the body as the environment.
                    tokens.push(Token {
                        start: whole.start(),
                        end: body.len(),
                        kind: TokenKind::Environment {
                            name,
                            content_range: (whole.end(), body.len()),
                        },
                    });
                }
            }
        }

        for caps in SECTION_CMD.captures_iter(body) {
            let whole = caps.get(0).unwrap();
            let (argument, arg_end) = read_braced(body, whole.end() - 1);
            let level = match &caps[1] {
                "section" => 1,
                "subsection" => 2,
                _ => 3,
            };
            tokens.push(Token {
                start: whole.start(),
                end: arg_end,
                kind: TokenKind::Section {
                    level,
                    title: clean_text(&argument, self.options),
                },
            });
        }

        for m in BARE_CMD.find_iter(body) {
            tokens.push(Token {
                start: m.start(),
                end: m.end(),
                kind: TokenKind::Bare,
            });
        }

        tokens.sort_by_key(|t| t.start);

        let mut cursor = 0;
        for token in tokens {
            if token.start < cursor {
                // Inside a span already consumed by an enclosing token.
                continue;
            }
            self.text_gap(&body[cursor..token.start]);
            match token.kind {
                TokenKind::Environment { name, content_range } => {
                    let content = &body[content_range.0..content_range.1];
                    let line = self.line_of(body, token.start);
                    self.environment(&name, content, line);
                }
                TokenKind::Section { level, title } => {
                    self.push(None, BlockKind::Heading { text: title, level });
                }
                TokenKind::Bare => {}
            }
            cursor = token.end;
        }
        self.text_gap(&body[cursor..]);
    }

    fn line_of(&self, body: &str, offset: usize) -> usize {
        let absolute = self.body_base + offset;
        self.source[..absolute.min(self.source.len())]
            .matches('\n')
            .count()
            + 1
    }

    fn push(&mut self, label: Option<String>, kind: BlockKind) {
        let label = if self.options.preserve_labels {
            label
        } else {
            None
        };
        self.import.blocks.push(Block {
            id: self.ctx.next_id(),
            label,
            sort_key: self.ctx.next_sort_key(),
            parent_id: None,
            depth: 0,
            kind,
        });
    }

    /// Plain text between tokens: one paragraph per blank-line-separated
    /// chunk, comments dropped.
    fn text_gap(&mut self, text: &str) {
        for chunk in text.split("\n\n") {
            let lines: Vec<&str> = chunk
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('%'))
                .collect();
            if lines.is_empty() {
                continue;
            }
            let cleaned = clean_text(&lines.join("\n"), self.options);
            if !cleaned.trim().is_empty() {
                self.push(None, BlockKind::Paragraph { text: cleaned });
            }
        }
    }

    fn environment(&mut self, name: &str, content: &str, line: usize) {
        let base = name.trim_end_matches('*');
        if let Some(theorem) = TheoremKind::parse(base) {
            let text = format!(
                "**{}.** {}",
                theorem.display_name(),
                clean_text(content, self.options).trim()
            );
            self.push(None, BlockKind::Paragraph { text });
            return;
        }
        match base {
            "equation" | "align" | "gather" | "displaymath" | "math" => {
                let (latex, label) = extract_label(content);
                let numbered = label.is_some();
                self.push(
                    label,
                    BlockKind::Equation {
                        latex: latex.trim().to_string(),
                        numbered,
                    },
                );
            }
            "figure" => self.figure(content),
            "table" => {
                // The tabular inside carries the data; caption and label sit
                // on the table environment.
                let caption = CAPTION
                    .captures(content)
                    .map(|c| clean_text(&c[1], self.options))
                    .unwrap_or_default();
                let label = LABEL.captures(content).map(|c| c[1].to_string());
                match ENV_BEGIN
                    .captures_iter(content)
                    .find(|c| &c[1] == "tabular")
                {
                    Some(caps) => {
                        let begin = caps.get(0).unwrap();
                        if let Some((content_end, _)) =
                            find_env_end(content, "tabular", begin.end())
                        {
                            let inner = &content[begin.end()..content_end];
                            self.tabular(inner, caption, label);
                            return;
                        }
                        self.degrade(name, content, line);
                    }
                    None => self.degrade(name, content, line),
                }
            }
            "tabular" => self.tabular(content, String::new(), None),
            "itemize" | "enumerate" => {
                let items: Vec<String> = content
                    .split("\\item")
                    .skip(1)
                    .map(|item| clean_text(item, self.options).trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect();
                self.push(
                    None,
                    BlockKind::List {
                        ordered: base == "enumerate",
                        items,
                    },
                );
            }
            "quote" | "quotation" => {
                let text = clean_text(content, self.options).trim().to_string();
                self.push(
                    None,
                    BlockKind::Quote {
                        text,
                        attribution: None,
                    },
                );
            }
            "verbatim" | "lstlisting" | "minted" => self.code(base, content),
            "abstract" => {
                let text = format!(
                    "**Abstract.** {}",
                    clean_text(content, self.options).trim()
                );
                self.push(None, BlockKind::Paragraph { text });
            }
            "thebibliography" => self.bibliography(content),
            "center" | "flushleft" | "flushright" => {
                // Alignment wrappers have no model counterpart; keep the
                // content.
                self.text_gap(content);
            }
            "document" => self.text_gap(content),
            _ => self.degrade(name, content, line),
        }
    }

    fn degrade(&mut self, name: &str, content: &str, line: usize) {
        log::debug!("unrecognized environment '{name}' degraded to paragraph");
        let issue = ImportIssue {
            message: format!("unrecognized environment '{name}' imported as plain text"),
            line: Some(line),
            suggestion: Some("wrap it in @latex/@endlatex to keep it compilable".to_string()),
        };
        if self.options.strict_mode {
            self.import.errors.push(issue);
        } else {
            self.import.warnings.push(issue);
        }
        let text = content.trim().to_string();
        if !text.is_empty() {
            self.push(None, BlockKind::Paragraph { text });
        }
    }

    fn figure(&mut self, content: &str) {
        let src = INCLUDEGRAPHICS
            .captures(content)
            .map(|c| c[2].trim().to_string())
            .unwrap_or_default();
        let width = INCLUDEGRAPHICS
            .captures(content)
            .and_then(|c| c.get(1).map(|o| o.as_str().to_string()))
            .and_then(|opts| {
                GRAPHICS_WIDTH
                    .captures(&opts)
                    .and_then(|c| c[1].parse::<f32>().ok())
            })
            .map(|fraction| (fraction * 100.0).round() as u8);
        let caption = CAPTION
            .captures(content)
            .map(|c| clean_text(&c[1], self.options))
            .unwrap_or_default();
        let label = LABEL.captures(content).map(|c| c[1].to_string());
        self.push(
            label,
            BlockKind::Figure {
                src,
                alt: caption.clone(),
                caption,
                width,
            },
        );
    }

    fn tabular(&mut self, content: &str, caption: String, label: Option<String>) {
        // First line is the column spec argument, e.g. {|l|c|r|}.
        let content = match content.find('}') {
            Some(end) if content[..end].trim_start().starts_with('{') => &content[end + 1..],
            _ => content,
        };
        let mut rows: Vec<Vec<String>> = content
            .split("\\\\")
            .map(|row| {
                row.split('&')
                    .map(|cell| {
                        clean_text(cell, self.options)
                            .replace("\\hline", "")
                            .trim()
                            .to_string()
                    })
                    .collect::<Vec<String>>()
            })
            .filter(|cells: &Vec<String>| cells.iter().any(|c| !c.is_empty()))
            .collect();
        if rows.is_empty() {
            return;
        }
        let headers = rows.remove(0);
        let columns = headers.len();
        for row in &mut rows {
            row.resize(columns, String::new());
        }
        self.push(
            label,
            BlockKind::Table {
                caption,
                headers,
                rows,
                align: None,
            },
        );
    }

    fn code(&mut self, env: &str, content: &str) {
        let mut content = content;
        let mut language = "text".to_string();
        match env {
            "minted" => {
                // \begin{minted}{python}: the language is a second argument
                // that lands at the start of the content.
                let trimmed = content.trim_start();
                if let Some(rest) = trimmed.strip_prefix('{') {
                    if let Some(end) = rest.find('}') {
                        language = rest[..end].trim().to_string();
                        content = &trimmed[end + 2..];
                    }
                }
            }
            "lstlisting" => {
                let trimmed = content.trim_start();
                if let Some(rest) = trimmed.strip_prefix('[') {
                    if let Some(end) = rest.find(']') {
                        if let Some(caps) = LISTING_LANGUAGE.captures(&rest[..end]) {
                            language = caps[1].to_lowercase();
                        }
                        content = &trimmed[end + 2..];
                    }
                }
            }
            _ => {}
        }
        let source = content
            .strip_prefix('\n')
            .unwrap_or(content)
            .trim_end()
            .to_string();
        self.push(
            None,
            BlockKind::Code {
                source,
                language,
                caption: None,
                line_numbers: false,
            },
        );
    }

    fn bibliography(&mut self, content: &str) {
        let mut positions: Vec<(usize, String)> = BIBITEM
            .captures_iter(content)
            .map(|c| (c.get(0).unwrap().start(), c[1].to_string()))
            .collect();
        positions.sort_by_key(|(start, _)| *start);
        for (i, (start, key)) in positions.iter().enumerate() {
            let text_start = start + "\\bibitem{".len() + key.len() + 1;
            let text_end = positions
                .get(i + 1)
                .map(|(next, _)| *next)
                .unwrap_or(content.len());
            let text = clean_text(&content[text_start..text_end], self.options)
                .trim()
                .to_string();
            let mut entry = BibEntry::new(key, EntryType::Misc);
            entry.title = text;
            if !self.import.bibliography.iter().any(|e| e.key == entry.key) {
                self.import.bibliography.push(entry);
            }
        }
    }
}

/// Find the end of an environment opened at `content_start`, honoring nested
/// environments of the same name. Returns (content_end, span_end).
fn find_env_end(body: &str, name: &str, content_start: usize) -> Option<(usize, usize)> {
    let begin = format!("\\begin{{{name}}}");
    let end = format!("\\end{{{name}}}");
    let mut depth = 1;
    let mut pos = content_start;
    loop {
        let next_begin = body[pos..].find(&begin);
        let next_end = body[pos..].find(&end)?;
        match next_begin {
            Some(b) if b < next_end => {
                depth += 1;
                pos += b + begin.len();
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return Some((pos + next_end, pos + next_end + end.len()));
                }
                pos += next_end + end.len();
            }
        }
    }
}

/// Read a braced argument starting at the `{` at `open`. Uses a depth
/// counter so nested braces survive. Returns (content, offset past `}`).
fn read_braced(body: &str, open: usize) -> (String, usize) {
    let mut depth = 0;
    for (i, c) in body[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return (body[open + 1..open + i].to_string(), open + i + 1);
                }
            }
            _ => {}
        }
    }
    (body[open + 1..].to_string(), body.len())
}

static CMD_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\textbf\{([^{}]*)\}").unwrap());
static CMD_ITALIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\(?:textit|emph)\{([^{}]*)\}").unwrap());
static CMD_MONO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\texttt\{([^{}]*)\}").unwrap());
static CMD_CITE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\cite\{([^{}]*)\}").unwrap());
static CMD_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\(?:ref|eqref)\{([^{}]*)\}").unwrap());
static CMD_GENERIC_ARG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\[a-zA-Z]+(?:\[[^\]]*\])?\{([^{}]*)\}").unwrap());
static CMD_GENERIC_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\[a-zA-Z]+(?:\[[^\]]*\])?").unwrap());

/// Rewrite common inline commands into LML inline markers, then strip
/// whatever commands remain, keeping their braced content.
pub fn clean_text(text: &str, options: &ImportOptions) -> String {
    let mut out = text.to_string();
    out = CMD_BOLD.replace_all(&out, "**$1**").into_owned();
    out = CMD_ITALIC.replace_all(&out, "*$1*").into_owned();
    out = CMD_MONO.replace_all(&out, "`$1`").into_owned();
    out = CMD_CITE.replace_all(&out, "@cite{$1}").into_owned();
    out = CMD_REF.replace_all(&out, "@ref{$1}").into_owned();

    if options.parse_inline_math {
        out = out.replace("\\(", "$").replace("\\)", "$");
    } else {
        out = out.replace("\\(", "").replace("\\)", "");
    }

    // Repeated because stripping one command can expose another (nested
    // arguments).
    loop {
        let next = CMD_GENERIC_ARG.replace_all(&out, "$1").into_owned();
        if next == out {
            break;
        }
        out = next;
    }
    out = CMD_GENERIC_BARE.replace_all(&out, "").into_owned();

    out = out
        .replace("\\{", "{")
        .replace("\\}", "}")
        .replace("\\%", "%")
        .replace("\\&", "&")
        .replace("\\_", "_")
        .replace("\\#", "#")
        .replace("\\$", "$")
        .replace('~', " ")
        .replace("``", "\"")
        .replace("''", "\"");
    out.trim().to_string()
}

/// Pull a `\label{..}` out of equation content.
fn extract_label(content: &str) -> (String, Option<String>) {
    match LABEL.captures(content) {
        Some(caps) => {
            let label = caps[1].to_string();
            let without = LABEL.replace(content, "").into_owned();
            (without, Some(label))
        }
        None => (content.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn import(source: &str) -> LatexImport {
        import_latex(source, &ImportOptions::default())
    }

    #[test]
    fn preamble_populates_metadata() {
        let result = import(
            "\\documentclass[11pt,a4paper]{article}\n\\title{My Paper}\n\\author{A. Writer}\n\\date{2024-01-05}\n\\begin{document}\nBody.\n\\end{document}\n",
        );
        assert_eq!(result.meta.title, "My Paper");
        assert_eq!(result.meta.author.as_deref(), Some("A. Writer"));
        assert_eq!(result.meta.date.as_deref(), Some("2024-01-05"));
        assert_eq!(result.meta.font_size, 11.0);
        assert_eq!(result.meta.page_size, PageSize::A4);
        assert_eq!(result.meta.template.as_deref(), Some("article"));
        assert!(result.errors.is_empty());
    }

    #[test]
    fn sections_become_headings() {
        let result = import("\\section{One}\ntext\n\\subsection{Two}\n");
        assert_eq!(
            result.blocks[0].kind,
            BlockKind::Heading {
                text: "One".to_string(),
                level: 1
            }
        );
        assert_eq!(
            result.blocks[2].kind,
            BlockKind::Heading {
                text: "Two".to_string(),
                level: 2
            }
        );
    }

    #[test]
    fn equation_with_label_is_numbered() {
        let result = import("\\begin{equation}\nE=mc^2 \\label{eq:e}\n\\end{equation}\n");
        assert_eq!(result.blocks.len(), 1);
        assert_eq!(result.blocks[0].label.as_deref(), Some("eq:e"));
        assert_eq!(
            result.blocks[0].kind,
            BlockKind::Equation {
                latex: "E=mc^2".to_string(),
                numbered: true
            }
        );
    }

    #[test]
    fn figure_extracts_graphics_caption_and_label() {
        let result = import(
            "\\begin{figure}\n\\includegraphics[width=0.5\\textwidth]{plot.png}\n\\caption{Energy}\n\\label{fig:e}\n\\end{figure}\n",
        );
        match &result.blocks[0].kind {
            BlockKind::Figure { src, caption, width, .. } => {
                assert_eq!(src, "plot.png");
                assert_eq!(caption, "Energy");
                assert_eq!(*width, Some(50));
            }
            other => panic!("expected figure, got {other:?}"),
        }
        assert_eq!(result.blocks[0].label.as_deref(), Some("fig:e"));
    }

    #[test]
    fn table_rows_split_on_backslashes_and_ampersands() {
        let result = import(
            "\\begin{table}\n\\caption{Data}\n\\begin{tabular}{|l|r|}\n\\hline\nA & B \\\\\n1 & 2 \\\\\n\\hline\n\\end{tabular}\n\\end{table}\n",
        );
        match &result.blocks[0].kind {
            BlockKind::Table { caption, headers, rows, .. } => {
                assert_eq!(caption, "Data");
                assert_eq!(headers, &["A", "B"]);
                assert_eq!(rows, &[vec!["1".to_string(), "2".to_string()]]);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn lists_split_on_item() {
        let result = import("\\begin{enumerate}\n\\item first\n\\item second\n\\end{enumerate}\n");
        assert_eq!(
            result.blocks[0].kind,
            BlockKind::List {
                ordered: true,
                items: vec!["first".to_string(), "second".to_string()]
            }
        );
    }

    #[test]
    fn verbatim_preserves_content() {
        let result = import("\\begin{verbatim}\nfn main() {}\n\\end{verbatim}\n");
        match &result.blocks[0].kind {
            BlockKind::Code { source, language, .. } => {
                assert_eq!(source, "fn main() {}");
                assert_eq!(language, "text");
            }
            other => panic!("expected code, got {other:?}"),
        }
    }

    #[test]
    fn minted_language_argument() {
        let result = import("\\begin{minted}{python}\nprint(1)\n\\end{minted}\n");
        match &result.blocks[0].kind {
            BlockKind::Code { language, .. } => assert_eq!(language, "python"),
            other => panic!("expected code, got {other:?}"),
        }
    }

    #[test]
    fn theorem_environments_lower_like_the_text_parser() {
        let result = import("\\begin{lemma}\nEvery field is a ring.\n\\end{lemma}\n");
        assert_eq!(
            result.blocks[0].kind,
            BlockKind::Paragraph {
                text: "**Lemma.** Every field is a ring.".to_string()
            }
        );
    }

    #[test]
    fn unrecognized_environment_warns_and_degrades() {
        let result = import("\\begin{tikzpicture}\n\\draw (0,0);\n\\end{tikzpicture}\n");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message.contains("tikzpicture"));
        assert_eq!(result.warnings[0].line, Some(1));
        assert!(matches!(
            result.blocks[0].kind,
            BlockKind::Paragraph { .. }
        ));
    }

    #[test]
    fn strict_mode_turns_degrades_into_errors() {
        let options = ImportOptions {
            strict_mode: true,
            ..ImportOptions::default()
        };
        let result = import_latex("\\begin{tikzpicture}\nx\n\\end{tikzpicture}\n", &options);
        assert!(result.warnings.is_empty());
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn nested_same_name_environments_are_spanned_correctly() {
        let result = import(
            "\\begin{figure}\n\\begin{figure}\ninner\n\\end{figure}\n\\caption{Outer}\n\\end{figure}\nafter\n",
        );
        // One figure token spanning everything, then the trailing paragraph.
        assert_eq!(result.blocks.len(), 2);
        assert_eq!(
            result.blocks[1].kind,
            BlockKind::Paragraph {
                text: "after".to_string()
            }
        );
    }

    #[test]
    fn inline_commands_are_rewritten() {
        let options = ImportOptions::default();
        assert_eq!(
            clean_text("\\textbf{bold} and \\emph{soft}", &options),
            "**bold** and *soft*"
        );
        assert_eq!(clean_text("see \\cite{knuth84}", &options), "see @cite{knuth84}");
        assert_eq!(clean_text("eq. \\eqref{eq:a}", &options), "eq. @ref{eq:a}");
        assert_eq!(
            clean_text("code \\texttt{ls -l} here", &options),
            "code `ls -l` here"
        );
    }

    #[test]
    fn unknown_commands_keep_their_content() {
        let options = ImportOptions::default();
        assert_eq!(clean_text("\\mbox{kept} \\vspace{1em}", &options), "kept 1em");
        assert_eq!(clean_text("a \\textsc{Small} b", &options), "a Small b");
    }

    #[test]
    fn inline_math_rewriting_follows_the_option() {
        let on = ImportOptions::default();
        let off = ImportOptions {
            parse_inline_math: false,
            ..ImportOptions::default()
        };
        assert_eq!(clean_text("\\(x^2\\)", &on), "$x^2$");
        assert_eq!(clean_text("\\(x^2\\)", &off), "x^2");
    }

    #[test]
    fn bibliography_items_become_entries() {
        let result = import(
            "\\begin{thebibliography}{9}\n\\bibitem{knuth84} D. Knuth. The TeXbook. 1984.\n\\bibitem{lamport94} L. Lamport. LaTeX. 1994.\n\\end{thebibliography}\n",
        );
        assert_eq!(result.bibliography.len(), 2);
        assert_eq!(result.bibliography[0].key, "knuth84");
        assert!(result.bibliography[0].title.contains("TeXbook"));
    }

    #[test]
    fn validate_latex_reports_structural_problems() {
        assert!(validate_latex("\\title{ok}").is_empty());
        let unbalanced = validate_latex("\\title{oops");
        assert_eq!(unbalanced.len(), 1);
        let mismatched = validate_latex("\\begin{document}");
        assert!(mismatched
            .iter()
            .any(|i| i.message.contains("do not match")));
    }

    #[test]
    fn import_never_fails_on_garbage() {
        let result = import("}{ \\weird{");
        assert!(!result.errors.is_empty());
        assert!(result.blocks.len() <= 1);
    }
}
