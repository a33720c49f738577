//! LaTeX export: a thin writer over the block model.
//!
//! Emits a compilable `article` document. The inline rewriting is the
//! inverse of the importer's `clean_text` chain; bold is rewritten before
//! italic so `**x**` is not mis-split by the italic pattern.

use once_cell::sync::Lazy;
use regex::Regex;

use lml_core::ast::{Block, BlockKind, DocumentData};

static INLINE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static INLINE_ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static INLINE_CITE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@cite\{([^{}]+)\}").unwrap());
static INLINE_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"@ref\{([^{}]+)\}").unwrap());

pub fn write_latex(doc: &DocumentData) -> String {
    let mut out = String::new();
    let meta = &doc.meta;

    let class = meta.template.as_deref().unwrap_or("article");
    let paper = match meta.page_size {
        lml_core::PageSize::A4 => "a4paper",
        lml_core::PageSize::Letter => "letterpaper",
    };
    out.push_str(&format!(
        "\\documentclass[{}pt,{}]{{{}}}\n",
        format_points(meta.font_size),
        paper,
        class
    ));
    out.push_str("\\usepackage{graphicx}\n\\usepackage{amsmath}\n");
    if !meta.title.is_empty() {
        out.push_str(&format!("\\title{{{}}}\n", inline_to_latex(&meta.title)));
    }
    if let Some(author) = &meta.author {
        out.push_str(&format!("\\author{{{}}}\n", inline_to_latex(author)));
    }
    if let Some(date) = &meta.date {
        out.push_str(&format!("\\date{{{date}}}\n"));
    }
    out.push_str("\\begin{document}\n");
    if !meta.title.is_empty() {
        out.push_str("\\maketitle\n");
    }

    for block in doc.roots() {
        write_block(&mut out, doc, block);
    }

    if !doc.bibliography.is_empty() {
        out.push_str("\n\\begin{thebibliography}{99}\n");
        for entry in &doc.bibliography {
            out.push_str(&format!("\\bibitem{{{}}} ", entry.key));
            let mut parts = Vec::new();
            if !entry.author.is_empty() {
                parts.push(entry.author.clone());
            }
            if !entry.title.is_empty() {
                parts.push(entry.title.clone());
            }
            if let Some(journal) = &entry.journal {
                parts.push(format!("\\emph{{{journal}}}"));
            }
            if entry.year != 0 {
                parts.push(entry.year.to_string());
            }
            out.push_str(&parts.join(". "));
            out.push_str(".\n");
        }
        out.push_str("\\end{thebibliography}\n");
    }

    out.push_str("\\end{document}\n");
    out
}

fn write_block(out: &mut String, doc: &DocumentData, block: &Block) {
    out.push('\n');
    match &block.kind {
        BlockKind::Section { title, level } | BlockKind::Heading { text: title, level } => {
            let command = match level {
                1 => "section",
                2 => "subsection",
                _ => "subsubsection",
            };
            out.push_str(&format!("\\{command}{{{}}}\n", inline_to_latex(title)));
            if matches!(block.kind, BlockKind::Section { .. }) {
                for child in doc.children_of(&block.id) {
                    write_block(out, doc, child);
                }
            }
        }
        BlockKind::Paragraph { text } => {
            // Passthrough regions come back out as their raw LaTeX.
            if let Some(inner) = text
                .strip_prefix("@latex\n")
                .and_then(|t| t.strip_suffix("\n@endlatex"))
            {
                out.push_str(inner);
                out.push('\n');
            } else {
                out.push_str(&inline_to_latex(text));
                out.push('\n');
            }
        }
        BlockKind::Equation { latex, numbered } => {
            let env = if *numbered { "equation" } else { "equation*" };
            out.push_str(&format!("\\begin{{{env}}}\n{latex}\n"));
            if let Some(label) = &block.label {
                out.push_str(&format!("\\label{{{label}}}\n"));
            }
            out.push_str(&format!("\\end{{{env}}}\n"));
        }
        BlockKind::Figure { src, caption, width, .. } => {
            out.push_str("\\begin{figure}[htbp]\n\\centering\n");
            let width = width.unwrap_or(100) as f32 / 100.0;
            out.push_str(&format!(
                "\\includegraphics[width={width}\\textwidth]{{{src}}}\n"
            ));
            if !caption.is_empty() {
                out.push_str(&format!("\\caption{{{}}}\n", inline_to_latex(caption)));
            }
            if let Some(label) = &block.label {
                out.push_str(&format!("\\label{{{label}}}\n"));
            }
            out.push_str("\\end{figure}\n");
        }
        BlockKind::Table { caption, headers, rows, .. } => {
            out.push_str("\\begin{table}[htbp]\n\\centering\n");
            let spec = vec!["l"; headers.len()].join("");
            out.push_str(&format!("\\begin{{tabular}}{{{spec}}}\n\\hline\n"));
            out.push_str(&format!("{} \\\\\n\\hline\n", headers.join(" & ")));
            for row in rows {
                out.push_str(&format!("{} \\\\\n", row.join(" & ")));
            }
            out.push_str("\\hline\n\\end{tabular}\n");
            if !caption.is_empty() {
                out.push_str(&format!("\\caption{{{}}}\n", inline_to_latex(caption)));
            }
            if let Some(label) = &block.label {
                out.push_str(&format!("\\label{{{label}}}\n"));
            }
            out.push_str("\\end{table}\n");
        }
        BlockKind::Code { source, .. } => {
            out.push_str("\\begin{verbatim}\n");
            out.push_str(source);
            out.push_str("\n\\end{verbatim}\n");
        }
        BlockKind::List { ordered, items } => {
            let env = if *ordered { "enumerate" } else { "itemize" };
            out.push_str(&format!("\\begin{{{env}}}\n"));
            for item in items {
                out.push_str(&format!("\\item {}\n", inline_to_latex(item)));
            }
            out.push_str(&format!("\\end{{{env}}}\n"));
        }
        BlockKind::Quote { text, attribution } => {
            out.push_str("\\begin{quote}\n");
            out.push_str(&inline_to_latex(text));
            out.push('\n');
            if let Some(attribution) = attribution {
                out.push_str(&format!("--- {attribution}\n"));
            }
            out.push_str("\\end{quote}\n");
        }
        BlockKind::Hr => out.push_str("\\noindent\\hrulefill\n"),
    }
}

fn inline_to_latex(text: &str) -> String {
    let mut out = text.to_string();
    out = INLINE_BOLD.replace_all(&out, "\\textbf{$1}").into_owned();
    out = INLINE_ITALIC.replace_all(&out, "\\textit{$1}").into_owned();
    out = INLINE_CODE.replace_all(&out, "\\texttt{$1}").into_owned();
    out = INLINE_CITE.replace_all(&out, "\\cite{$1}").into_owned();
    out = INLINE_REF.replace_all(&out, "\\ref{$1}").into_owned();
    out
}

fn format_points(size: f32) -> String {
    if size.fract() == 0.0 {
        format!("{}", size as u32)
    } else {
        format!("{size}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lml_core::text::parse_text;

    #[test]
    fn emits_a_complete_document() {
        let doc = parse_text("@document\ntitle: T\nauthor: A\n\n# Intro\n\nHello **bold**.\n");
        let tex = write_latex(&doc);
        assert!(tex.starts_with("\\documentclass[11pt,a4paper]{article}"));
        assert!(tex.contains("\\title{T}"));
        assert!(tex.contains("\\maketitle"));
        assert!(tex.contains("\\section{Intro}"));
        assert!(tex.contains("Hello \\textbf{bold}."));
        assert!(tex.trim_end().ends_with("\\end{document}"));
    }

    #[test]
    fn numbered_equations_get_the_unstarred_environment() {
        let doc = parse_text("@equation(label: eq:a)\nE=mc^2\n");
        let tex = write_latex(&doc);
        assert!(tex.contains("\\begin{equation}\nE=mc^2\n\\label{eq:a}\n\\end{equation}"));
        let doc = parse_text("@equation\nx\n");
        assert!(write_latex(&doc).contains("\\begin{equation*}"));
    }

    #[test]
    fn passthrough_paragraphs_emit_raw_latex() {
        let doc = parse_text("@latex\n\\begin{tikzpicture}\n\\end{tikzpicture}\n@endlatex\n");
        let tex = write_latex(&doc);
        assert!(tex.contains("\\begin{tikzpicture}"));
        assert!(!tex.contains("@latex"));
    }

    #[test]
    fn citations_and_references_are_rewritten() {
        let doc = parse_text("See @cite{knuth84} and @ref{eq:a}.\n");
        let tex = write_latex(&doc);
        assert!(tex.contains("\\cite{knuth84}"));
        assert!(tex.contains("\\ref{eq:a}"));
    }
}
