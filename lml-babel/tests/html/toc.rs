//! Pass-1/Pass-2 consistency: the anchors `@toc` links to are exactly the
//! anchors the rendered headings carry, in document order.

use lml_babel::render_to_markup;
use once_cell::sync::Lazy;
use regex::Regex;

static TOC_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r##"href="#([^"]+)""##).unwrap());
static HEADING_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r#"<h\d id="([^"]+)""#).unwrap());

fn toc_anchors(html: &str) -> Vec<String> {
    let nav_start = html.find("<nav class=\"toc\"").expect("toc rendered");
    let nav_end = html[nav_start..].find("</nav>").unwrap() + nav_start;
    TOC_LINK
        .captures_iter(&html[nav_start..nav_end])
        .map(|c| c[1].to_string())
        .collect()
}

fn heading_anchors(html: &str) -> Vec<String> {
    HEADING_ID
        .captures_iter(html)
        .map(|c| c[1].to_string())
        .collect()
}

#[test]
fn toc_references_every_heading_in_order() {
    let source = "@toc\n\n# Alpha\n\n## Beta\n\ntext\n\n## Gamma\n\n# Delta\n";
    let html = render_to_markup(source);
    assert_eq!(toc_anchors(&html), heading_anchors(&html));
    assert_eq!(
        toc_anchors(&html),
        vec!["alpha", "beta", "gamma", "delta"]
    );
}

#[test]
fn text_after_the_toc_directive_still_renders() {
    let source = "@toc\nContents of this report.\n\n# Alpha\n";
    let html = render_to_markup(source);
    assert_eq!(toc_anchors(&html), vec!["alpha"]);
    assert!(html.contains("Contents of this report."));
}

#[test]
fn toc_agrees_even_with_duplicate_titles() {
    let source = "@toc\n\n# Setup\n\n# Setup\n\n# Setup\n";
    let html = render_to_markup(source);
    assert_eq!(toc_anchors(&html), heading_anchors(&html));
    assert_eq!(toc_anchors(&html), vec!["setup", "setup-2", "setup-3"]);
}

#[test]
fn toc_nests_by_level() {
    let html = render_to_markup("@toc\n\n# A\n\n## B\n");
    let nav_start = html.find("<nav").unwrap();
    let nav = &html[nav_start..];
    assert!(nav.contains("<ul><li><a href=\"#a\">A</a></li><ul><li><a href=\"#b\">B</a></li></ul></ul>"));
}

#[test]
fn toc_before_any_heading_still_resolves_forward() {
    let html = render_to_markup("@toc\n\n# Later\n");
    assert!(toc_anchors(&html) == vec!["later"]);
}
