//! Footnote resolution is order-independent: a reference links if and only
//! if a definition exists anywhere in the source.

use lml_babel::render_to_markup;

#[test]
fn reference_before_definition_resolves() {
    let html = render_to_markup("Claim@fn(a).\n\n@footnote(a) Details below.\n");
    assert!(html.contains("href=\"#fn-a\""));
    assert!(html.contains("<li id=\"fn-a\">Details below."));
}

#[test]
fn definition_before_reference_resolves() {
    let html = render_to_markup("@footnote(a) Details above.\n\nClaim@fn(a).\n");
    assert!(html.contains("href=\"#fn-a\""));
    assert!(html.contains("<li id=\"fn-a\">Details above."));
}

#[test]
fn reference_without_definition_has_no_target() {
    let html = render_to_markup("Claim@fn(ghost).\n");
    assert!(!html.contains("id=\"fn-ghost\""));
    assert!(!html.contains("href=\"#fn-ghost\""));
    assert!(html.contains("footnote-missing"));
}

#[test]
fn footnotes_number_in_definition_order() {
    let html = render_to_markup(
        "First@fn(x) then@fn(y).\n\n@footnote(x) One.\n\n@footnote(y) Two.\n",
    );
    assert!(html.contains("<a href=\"#fn-x\">1</a>"));
    assert!(html.contains("<a href=\"#fn-y\">2</a>"));
}

#[test]
fn section_lists_definitions_with_backlinks() {
    let html = render_to_markup("x@fn(n).\n\n@footnote(n) Note text.\n");
    let section = html.find("<section class=\"footnotes\">").unwrap();
    assert!(html[section..].contains("href=\"#fnref-n\""));
}

#[test]
fn no_section_without_definitions() {
    let html = render_to_markup("Plain text.\n");
    assert!(!html.contains("class=\"footnotes\""));
}

#[test]
fn multiline_definitions_are_joined() {
    let html = render_to_markup("x@fn(n).\n\n@footnote(n) First line\nsecond line.\n");
    assert!(html.contains("<li id=\"fn-n\">First line second line."));
}
