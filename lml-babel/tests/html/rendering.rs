//! End-to-end preview rendering checks.

use lml_babel::render_to_markup;
use once_cell::sync::Lazy;
use regex::Regex;

#[test]
fn document_with_title_heading_and_paragraph() {
    let html = render_to_markup("@document\ntitle: T\n\n# Intro\n\nHello *world*.\n");
    assert!(html.contains("<h1 id=\"intro\""));
    assert!(html.contains("<em>world</em>"));
}

#[test]
fn every_top_level_element_carries_a_source_line() {
    let source = "# One\n\ntext\n\n@equation\nx^2\n\n---\n\n> quoted\n";
    let html = render_to_markup(source);
    static OPENER: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"<(h1|p|div|hr|blockquote)[^>]*source-line="(\d+)""#).unwrap());
    let lines: Vec<usize> = OPENER
        .captures_iter(&html)
        .map(|c| c[2].parse().unwrap())
        .collect();
    assert_eq!(lines, vec![1, 3, 5, 8, 10]);
}

#[test]
fn figure_markup() {
    let html =
        render_to_markup("@figure(src: img/a.png, alt: A plot, caption: Energy, width: 50%)\n");
    assert!(html.contains("<figure"));
    assert!(html.contains("src=\"img/a.png\""));
    assert!(html.contains("alt=\"A plot\""));
    assert!(html.contains("style=\"width: 50%\""));
    assert!(html.contains("<figcaption>Energy</figcaption>"));
}

#[test]
fn theorem_directive_renders_with_bold_prefix() {
    let html = render_to_markup("@lemma\nEvery vector space has a basis.\n");
    assert!(html.contains("<strong>Lemma.</strong> Every vector space has a basis."));
}

#[test]
fn broken_math_does_not_blank_the_preview() {
    use lml_babel::{MathRenderer, RenderOptions};
    let math: MathRenderer = Box::new(|_, _| Err("no renderer".to_string()));
    let html = lml_babel::formats::html::render_to_markup_with_options(
        "before\n\n@equation\n\\broken\n\nafter\n",
        &RenderOptions { math },
    );
    assert!(html.contains("math-error"));
    assert!(html.contains("before"));
    assert!(html.contains("after"));
}

#[test]
fn script_injection_is_escaped() {
    let html = render_to_markup("<script>alert(1)</script>\n");
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
}
