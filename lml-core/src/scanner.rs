//! Shared block-boundary detection.
//!
//! The text parser, the preview renderer and the validator all need the same
//! answer to the same question: where does one block end and the next begin?
//! Historically each consumer re-implemented the line state machine and the
//! three copies drifted. Here the machine exists once, as an iterator over
//! [`BlockEvent`]s; consumers decide what to build from each event.
//!
//! Boundary rules:
//! - heading markers (`#`..`######`) and `---` are single-line blocks;
//! - a directive block ends at the first blank line once it has content, so
//!   a directive line directly followed by a blank does not close an empty
//!   block;
//! - paragraphs and quotes end on any blank line;
//! - any line that starts a new block closes the current one;
//! - `@latex`..`@endlatex` content is passed through untouched;
//! - `@bibliography { .. }` is brace-fenced and consumed with a depth
//!   counter, so braces inside field values do not end it early.

/// The eight theorem-like directives. They share one lowering: a paragraph
/// with a synthesized bold prefix. There is deliberately no first-class
/// theorem block; serializer and renderer both rely on the lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TheoremKind {
    Definition,
    Theorem,
    Proof,
    Lemma,
    Proposition,
    Corollary,
    Remark,
    Example,
}

impl TheoremKind {
    pub fn parse(name: &str) -> Option<TheoremKind> {
        Some(match name {
            "definition" => TheoremKind::Definition,
            "theorem" => TheoremKind::Theorem,
            "proof" => TheoremKind::Proof,
            "lemma" => TheoremKind::Lemma,
            "proposition" => TheoremKind::Proposition,
            "corollary" => TheoremKind::Corollary,
            "remark" => TheoremKind::Remark,
            "example" => TheoremKind::Example,
            _ => return None,
        })
    }

    pub const ALL: [TheoremKind; 8] = [
        TheoremKind::Definition,
        TheoremKind::Theorem,
        TheoremKind::Proof,
        TheoremKind::Lemma,
        TheoremKind::Proposition,
        TheoremKind::Corollary,
        TheoremKind::Remark,
        TheoremKind::Example,
    ];

    /// Directive name as written in source; the inverse of [`TheoremKind::parse`].
    pub fn directive_name(&self) -> &'static str {
        match self {
            TheoremKind::Definition => "definition",
            TheoremKind::Theorem => "theorem",
            TheoremKind::Proof => "proof",
            TheoremKind::Lemma => "lemma",
            TheoremKind::Proposition => "proposition",
            TheoremKind::Corollary => "corollary",
            TheoremKind::Remark => "remark",
            TheoremKind::Example => "example",
        }
    }

    /// Capitalized label used for the bold paragraph prefix.
    pub fn display_name(&self) -> &'static str {
        match self {
            TheoremKind::Definition => "Definition",
            TheoremKind::Theorem => "Theorem",
            TheoremKind::Proof => "Proof",
            TheoremKind::Lemma => "Lemma",
            TheoremKind::Proposition => "Proposition",
            TheoremKind::Corollary => "Corollary",
            TheoremKind::Remark => "Remark",
            TheoremKind::Example => "Example",
        }
    }
}

/// Block-introducing directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Equation,
    Figure,
    Code,
    Table,
    List,
    Abstract,
    Theorem(TheoremKind),
    Pagebreak,
    Toc,
    Footnote,
}

/// What a line (or run of lines) turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSignal {
    /// `@document` metadata header.
    DocumentHeader,
    Heading(u8),
    Hr,
    Quote,
    Directive(DirectiveKind),
    /// `@latex`..`@endlatex`. `closed` is false when the end marker was
    /// never found before end of input.
    LatexPassthrough { closed: bool },
    /// A stray `@endlatex` with no matching opener.
    LatexEnd,
    /// `@bibliography { .. }` fence.
    Bibliography,
    Paragraph,
}

/// One detected block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockEvent {
    pub signal: BlockSignal,
    /// The introducing line itself (directive line, heading line, first
    /// quote line). Empty for plain paragraphs.
    pub param_line: String,
    /// Content lines, raw and untrimmed, excluding the introducing line.
    pub lines: Vec<String>,
    /// 1-based source line where the block begins.
    pub start_line: usize,
}

/// Directive name on a line beginning with `@`, or None.
pub fn directive_name(trimmed: &str) -> Option<&str> {
    let rest = trimmed.strip_prefix('@')?;
    let end = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    if end == 0 {
        None
    } else {
        Some(&rest[..end])
    }
}

/// Classify a trimmed line as a block-start signal, or None for plain text.
///
/// This is the dispatch table every consumer shares; the validator also uses
/// it to tell an unknown `@directive` from prose.
pub fn classify_line(trimmed: &str) -> Option<BlockSignal> {
    if trimmed.starts_with('#') {
        let level = trimmed.chars().take_while(|&c| c == '#').count();
        let rest = &trimmed[level..];
        if (1..=6).contains(&level) && (rest.is_empty() || rest.starts_with(' ')) {
            return Some(BlockSignal::Heading(level as u8));
        }
        return None;
    }
    if trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-') {
        return Some(BlockSignal::Hr);
    }
    if trimmed.starts_with('>') {
        return Some(BlockSignal::Quote);
    }
    let name = directive_name(trimmed)?;
    if let Some(theorem) = TheoremKind::parse(name) {
        return Some(BlockSignal::Directive(DirectiveKind::Theorem(theorem)));
    }
    Some(match name {
        "document" => BlockSignal::DocumentHeader,
        "equation" => BlockSignal::Directive(DirectiveKind::Equation),
        "figure" => BlockSignal::Directive(DirectiveKind::Figure),
        "code" => BlockSignal::Directive(DirectiveKind::Code),
        "table" => BlockSignal::Directive(DirectiveKind::Table),
        "list" => BlockSignal::Directive(DirectiveKind::List),
        "abstract" => BlockSignal::Directive(DirectiveKind::Abstract),
        "pagebreak" => BlockSignal::Directive(DirectiveKind::Pagebreak),
        "toc" => BlockSignal::Directive(DirectiveKind::Toc),
        "footnote" => BlockSignal::Directive(DirectiveKind::Footnote),
        "bibliography" => BlockSignal::Bibliography,
        "latex" => BlockSignal::LatexPassthrough { closed: true },
        "endlatex" => BlockSignal::LatexEnd,
        _ => return None,
    })
}

/// Iterator of [`BlockEvent`]s over source lines.
pub struct BlockScanner<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> BlockScanner<'a> {
    pub fn new(source: &'a str) -> Self {
        BlockScanner {
            lines: source.lines().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    /// Collect content lines until a blank line or the next block start.
    /// When `skip_leading_blank` is set, blank lines before any content are
    /// consumed instead of terminating the (still empty) block.
    fn collect_content(&mut self, skip_leading_blank: bool) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = self.peek() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                if skip_leading_blank && lines.is_empty() {
                    self.pos += 1;
                    continue;
                }
                break;
            }
            if classify_line(trimmed).is_some() {
                break;
            }
            lines.push(line.to_string());
            self.pos += 1;
        }
        lines
    }

    /// Consume until `@endlatex`. Returns (content, closed).
    fn collect_passthrough(&mut self) -> (Vec<String>, bool) {
        let mut lines = Vec::new();
        while let Some(line) = self.peek() {
            self.pos += 1;
            if line.trim() == "@endlatex" {
                return (lines, true);
            }
            lines.push(line.to_string());
        }
        (lines, false)
    }

    /// Consume a brace-fenced region starting at `first_line` (which holds
    /// the opening brace). Returns the inner lines.
    fn collect_fenced(&mut self, first_line: &str) -> Vec<String> {
        let mut depth: i32 = balance_of(first_line);
        let mut lines = Vec::new();
        if depth <= 0 {
            // Opening and closing brace on the directive line, or no brace
            // at all; fall back to blank-line termination.
            return self.collect_content(true);
        }
        while let Some(line) = self.peek() {
            self.pos += 1;
            depth += balance_of(line);
            if depth <= 0 {
                break;
            }
            lines.push(line.to_string());
        }
        lines
    }
}

fn balance_of(line: &str) -> i32 {
    let mut n = 0;
    for c in line.chars() {
        match c {
            '{' => n += 1,
            '}' => n -= 1,
            _ => {}
        }
    }
    n
}

impl<'a> Iterator for BlockScanner<'a> {
    type Item = BlockEvent;

    fn next(&mut self) -> Option<BlockEvent> {
        // Skip blank lines between blocks.
        while let Some(line) = self.peek() {
            if line.trim().is_empty() {
                self.pos += 1;
            } else {
                break;
            }
        }
        let line = self.peek()?;
        let start_line = self.pos + 1;
        let trimmed = line.trim();
        let signal = classify_line(trimmed).unwrap_or(BlockSignal::Paragraph);

        let event = match signal {
            BlockSignal::Heading(_) | BlockSignal::Hr | BlockSignal::LatexEnd => {
                self.pos += 1;
                BlockEvent {
                    signal,
                    param_line: trimmed.to_string(),
                    lines: Vec::new(),
                    start_line,
                }
            }
            BlockSignal::Quote => {
                let mut lines = Vec::new();
                while let Some(l) = self.peek() {
                    let t = l.trim();
                    if !t.starts_with('>') {
                        break;
                    }
                    lines.push(l.to_string());
                    self.pos += 1;
                }
                BlockEvent {
                    signal,
                    param_line: trimmed.to_string(),
                    lines,
                    start_line,
                }
            }
            BlockSignal::DocumentHeader => {
                self.pos += 1;
                let lines = self.collect_content(false);
                BlockEvent {
                    signal,
                    param_line: trimmed.to_string(),
                    lines,
                    start_line,
                }
            }
            BlockSignal::Directive(_) => {
                self.pos += 1;
                let lines = self.collect_content(true);
                BlockEvent {
                    signal,
                    param_line: trimmed.to_string(),
                    lines,
                    start_line,
                }
            }
            BlockSignal::LatexPassthrough { .. } => {
                self.pos += 1;
                let (lines, closed) = self.collect_passthrough();
                BlockEvent {
                    signal: BlockSignal::LatexPassthrough { closed },
                    param_line: trimmed.to_string(),
                    lines,
                    start_line,
                }
            }
            BlockSignal::Bibliography => {
                self.pos += 1;
                let lines = self.collect_fenced(trimmed);
                BlockEvent {
                    signal,
                    param_line: trimmed.to_string(),
                    lines,
                    start_line,
                }
            }
            BlockSignal::Paragraph => {
                let lines = self.collect_content(false);
                BlockEvent {
                    signal,
                    param_line: String::new(),
                    lines,
                    start_line,
                }
            }
        };
        Some(event)
    }
}
