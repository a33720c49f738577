//! Whole-document LaTeX import.

use lml_babel::{import_latex, ImportOptions};
use lml_core::{BlockKind, PageSize};
use pretty_assertions::assert_eq;

const PAPER: &str = r"\documentclass[12pt,letterpaper]{article}
\usepackage{graphicx}
\title{A Short \textbf{Study}}
\author{R. Writer}
\date{2023-11-02}
\begin{document}
\maketitle
\tableofcontents

\section{Introduction}
We study \emph{interesting} things, see \cite{knuth84}.

\begin{equation}
E = mc^2 \label{eq:energy}
\end{equation}

\subsection{Method}
\begin{itemize}
\item collect data
\item fit model
\end{itemize}

\begin{figure}
\includegraphics[width=0.8\textwidth]{plots/fit.png}
\caption{The fit}
\label{fig:fit}
\end{figure}

\begin{tikzpicture}
\draw (0,0) -- (1,1);
\end{tikzpicture}

\begin{thebibliography}{9}
\bibitem{knuth84} D. Knuth. The TeXbook. 1984.
\end{thebibliography}
\end{document}
";

#[test]
fn imports_a_full_paper() {
    let result = import_latex(PAPER, &ImportOptions::default());

    assert_eq!(result.meta.title, "A Short **Study**");
    assert_eq!(result.meta.author.as_deref(), Some("R. Writer"));
    assert_eq!(result.meta.font_size, 12.0);
    assert_eq!(result.meta.page_size, PageSize::Letter);

    let kinds: Vec<&str> = result.blocks.iter().map(|b| b.kind_name()).collect();
    assert_eq!(
        kinds,
        vec!["heading", "paragraph", "equation", "heading", "list", "figure", "paragraph"]
    );

    assert_eq!(result.blocks[2].label.as_deref(), Some("eq:energy"));
    match &result.blocks[1].kind {
        BlockKind::Paragraph { text } => {
            assert!(text.contains("*interesting*"));
            assert!(text.contains("@cite{knuth84}"));
        }
        other => panic!("expected paragraph, got {other:?}"),
    }

    assert_eq!(result.bibliography.len(), 1);
    assert_eq!(result.bibliography[0].key, "knuth84");

    // tikzpicture is the only unknown environment in the document
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].message.contains("tikzpicture"));
    assert!(result.errors.is_empty());
}

#[test]
fn dropping_labels_is_an_option() {
    let options = ImportOptions {
        preserve_labels: false,
        ..ImportOptions::default()
    };
    let result = import_latex(PAPER, &options);
    assert!(result.blocks.iter().all(|b| b.label.is_none()));
}

#[test]
fn sort_keys_increase_in_document_order() {
    let result = import_latex(PAPER, &ImportOptions::default());
    let keys: Vec<_> = result.blocks.iter().map(|b| b.sort_key.clone()).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}
