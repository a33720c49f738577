//! Structural validation: line-tagged diagnostics without building a tree.
//!
//! Runs the shared [`BlockScanner`] over the source, so its idea of where
//! blocks begin and end can never drift from the parser's. Diagnostics are
//! returned as data; nothing here fails.

use serde::Serialize;

use crate::props;
use crate::scanner::{directive_name, BlockScanner, BlockSignal, DirectiveKind};

/// Inline directives allowed inside paragraph text.
pub const INLINE_DIRECTIVES: [&str; 7] = ["cite", "ref", "fn", "kbd", "abbr", "sc", "color"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// One finding. `line` and `column` are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub line: usize,
    pub column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column: Option<usize>,
    pub severity: Severity,
    pub message: String,
    pub code: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Validation {
    /// True when no diagnostic has error severity.
    pub valid: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Validate text-format source.
pub fn validate(source: &str) -> Validation {
    let mut diagnostics = Vec::new();

    for event in BlockScanner::new(source) {
        match event.signal {
            BlockSignal::LatexPassthrough { closed } => {
                if !closed {
                    diagnostics.push(Diagnostic {
                        line: event.start_line,
                        column: 1,
                        end_column: None,
                        severity: Severity::Error,
                        message: "@latex block is never closed with @endlatex".to_string(),
                        code: "latex-unclosed",
                    });
                }
                for (i, line) in event.lines.iter().enumerate() {
                    if line.trim() == "@latex" {
                        diagnostics.push(Diagnostic {
                            line: event.start_line + 1 + i,
                            column: 1,
                            end_column: None,
                            severity: Severity::Warning,
                            message: "@latex inside an open @latex block".to_string(),
                            code: "latex-nested",
                        });
                    }
                }
            }
            BlockSignal::LatexEnd => {
                diagnostics.push(Diagnostic {
                    line: event.start_line,
                    column: 1,
                    end_column: None,
                    severity: Severity::Warning,
                    message: "@endlatex without a matching @latex".to_string(),
                    code: "latex-unopened",
                });
            }
            BlockSignal::Heading(_) => {
                let text = event.param_line.trim_start_matches('#').trim();
                if text.is_empty() {
                    diagnostics.push(Diagnostic {
                        line: event.start_line,
                        column: 1,
                        end_column: None,
                        severity: Severity::Warning,
                        message: "heading has no text".to_string(),
                        code: "empty-heading",
                    });
                }
            }
            BlockSignal::Directive(DirectiveKind::Equation) => {
                let params = param_map(&event.param_line);
                if !params.contains_key("label") {
                    diagnostics.push(Diagnostic {
                        line: event.start_line,
                        column: 1,
                        end_column: None,
                        severity: Severity::Info,
                        message: "equation has no label: and cannot be referenced".to_string(),
                        code: "equation-no-label",
                    });
                }
                if !params.contains_key("mode") {
                    diagnostics.push(Diagnostic {
                        line: event.start_line,
                        column: 1,
                        end_column: None,
                        severity: Severity::Info,
                        message: "equation has no mode: hint (display assumed)".to_string(),
                        code: "equation-no-mode",
                    });
                }
            }
            BlockSignal::Directive(DirectiveKind::Figure) => {
                let params = param_map(&event.param_line);
                if !params.get("src").is_some_and(|s| !s.is_empty()) {
                    diagnostics.push(Diagnostic {
                        line: event.start_line,
                        column: 1,
                        end_column: None,
                        severity: Severity::Error,
                        message: "@figure requires a src: parameter".to_string(),
                        code: "figure-no-src",
                    });
                }
            }
            BlockSignal::Paragraph => {
                for (i, line) in event.lines.iter().enumerate() {
                    let line_no = event.start_line + i;
                    check_unknown_directive(line, line_no, &mut diagnostics);
                    check_inline(line, line_no, &mut diagnostics);
                }
            }
            BlockSignal::Quote => {
                check_inline(&event.param_line, event.start_line, &mut diagnostics);
                for (i, line) in event.lines.iter().enumerate().skip(1) {
                    check_inline(line, event.start_line + i, &mut diagnostics);
                }
            }
            _ => {}
        }
    }

    diagnostics.sort_by_key(|d| (d.line, d.column));
    Validation {
        valid: !diagnostics.iter().any(|d| d.severity == Severity::Error),
        diagnostics,
    }
}

/// Parameters of a `@name(..)` line, or empty when there are none.
fn param_map(line: &str) -> std::collections::HashMap<String, String> {
    match (line.find('('), line.rfind(')')) {
        (Some(open), Some(close)) if close > open => props::parse_inline(&line[open + 1..close]),
        _ => std::collections::HashMap::new(),
    }
}

/// A paragraph line opening with an `@name` that is neither a block type nor
/// an inline directive is almost certainly a typo.
fn check_unknown_directive(line: &str, line_no: usize, diagnostics: &mut Vec<Diagnostic>) {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('@') {
        return;
    }
    let Some(name) = directive_name(trimmed) else {
        return;
    };
    if INLINE_DIRECTIVES.contains(&name) {
        return;
    }
    // Block-type names never reach here as paragraphs, so any remaining name
    // is unknown.
    let column = line.len() - trimmed.len() + 1;
    diagnostics.push(Diagnostic {
        line: line_no,
        column,
        end_column: Some(column + name.len() + 1),
        severity: Severity::Warning,
        message: format!("unknown directive @{name}"),
        code: "unknown-directive",
    });
}

/// Per-line inline checks: unclosed `@name(..)` directives (paren-depth scan
/// per occurrence) and unbalanced `$..$` delimiters. Display math spanning
/// lines is out of reach for a line-local check and deliberately exempt.
fn check_inline(line: &str, line_no: usize, diagnostics: &mut Vec<Diagnostic>) {
    for name in INLINE_DIRECTIVES {
        let marker = format!("@{name}(");
        let mut search = 0;
        while let Some(found) = line[search..].find(&marker) {
            let open = search + found + marker.len() - 1;
            if !parens_close(&line[open..]) {
                diagnostics.push(Diagnostic {
                    line: line_no,
                    column: search + found + 1,
                    end_column: Some(line.len() + 1),
                    severity: Severity::Warning,
                    message: format!("@{name}( is never closed"),
                    code: "inline-unclosed",
                });
            }
            search = open + 1;
        }
    }

    let singles = line.replace("$$", "").matches('$').count();
    if singles % 2 != 0 {
        let column = line.find('$').map(|i| i + 1).unwrap_or(1);
        diagnostics.push(Diagnostic {
            line: line_no,
            column,
            end_column: None,
            severity: Severity::Warning,
            message: "unbalanced $ math delimiter".to_string(),
            code: "math-unbalanced",
        });
    }
}

/// True when the paren opening at the start of `rest` closes on this line.
fn parens_close(rest: &str) -> bool {
    let mut depth = 0;
    for c in rest.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(source: &str) -> Vec<&'static str> {
        validate(source).diagnostics.iter().map(|d| d.code).collect()
    }

    #[test]
    fn clean_document_is_valid() {
        let report = validate("@document\ntitle: T\n\n# Intro\n\nHello *world*.\n");
        assert!(report.valid);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn figure_without_src_is_an_error() {
        let report = validate("@figure(caption: A plot)\n");
        assert!(!report.valid);
        assert_eq!(report.diagnostics.len(), 1);
        let d = &report.diagnostics[0];
        assert_eq!(d.code, "figure-no-src");
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.line, 1);
    }

    #[test]
    fn unclosed_latex_block() {
        let report = validate("@latex\n\\frac{1}{2}\n");
        assert_eq!(codes("@latex\n\\frac{1}{2}\n"), vec!["latex-unclosed"]);
        assert!(!report.valid);
    }

    #[test]
    fn stray_endlatex_is_a_warning() {
        let report = validate("@endlatex\n");
        assert_eq!(report.diagnostics[0].code, "latex-unopened");
        assert!(report.valid);
    }

    #[test]
    fn nested_latex_openers() {
        assert_eq!(
            codes("@latex\n@latex\nx\n@endlatex\n"),
            vec!["latex-nested"]
        );
    }

    #[test]
    fn unknown_directive_names_the_typo() {
        let report = validate("@figur(src: a.png)\n");
        let d = &report.diagnostics[0];
        assert_eq!(d.code, "unknown-directive");
        assert!(d.message.contains("@figur"));
        assert_eq!(d.column, 1);
    }

    #[test]
    fn inline_directives_are_not_unknown() {
        assert!(codes("@cite{knuth84} says so.\n").is_empty());
    }

    #[test]
    fn unclosed_inline_directive() {
        assert_eq!(codes("Press @kbd(Ctrl+C to copy.\n"), vec!["inline-unclosed"]);
        assert!(codes("Press @kbd(Ctrl+C) to copy.\n").is_empty());
    }

    #[test]
    fn unbalanced_math_is_line_local() {
        assert_eq!(codes("The value $x is unknown.\n"), vec!["math-unbalanced"]);
        assert!(codes("The value $x$ is known.\n").is_empty());
        // Display math delimiters do not count toward the line balance.
        assert!(codes("$$\n").is_empty());
    }

    #[test]
    fn equation_hints_are_informational() {
        let report = validate("@equation\nE=mc^2\n");
        assert_eq!(codes("@equation\nE=mc^2\n"), vec!["equation-no-label", "equation-no-mode"]);
        assert!(report.valid);
    }

    #[test]
    fn empty_heading() {
        assert_eq!(codes("##\n"), vec!["empty-heading"]);
    }

    #[test]
    fn diagnostics_sorted_by_line() {
        let report = validate("@figure(alt: x)\n\ntext $a\n\n@equation\ny\n");
        let lines: Vec<_> = report.diagnostics.iter().map(|d| d.line).collect();
        let mut sorted = lines.clone();
        sorted.sort();
        assert_eq!(lines, sorted);
    }

    #[test]
    fn code_content_is_exempt_from_inline_checks() {
        assert!(codes("@code(sh)\necho $PATH\n").is_empty());
    }
}
