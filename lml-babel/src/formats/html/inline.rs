//! Inline formatting: an ordered chain of substitutions over escaped text.
//!
//! Escaping happens first, then each pattern in a fixed order; bold must run
//! before italic so `**x**` is not mis-split by the italic pattern, and
//! images before links because the image marker contains the link marker.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::MathRenderer;

pub(crate) struct InlineContext<'a> {
    /// Footnote id → definition text, in collection order.
    pub footnotes: &'a IndexMap<String, String>,
    pub math: &'a MathRenderer,
}

static IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static MATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$([^$]+)\$").unwrap());
static FOOTNOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@fn\(([A-Za-z0-9_-]+)\)").unwrap());
static CITE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@cite\{([^{}]+)\}").unwrap());
static CROSSREF: Lazy<Regex> = Lazy::new(|| Regex::new(r"@ref\{([^{}]+)\}").unwrap());
static MARK: Lazy<Regex> = Lazy::new(|| Regex::new(r"==([^=]+)==").unwrap());
static STRIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"~~([^~]+)~~").unwrap());
static SUBSCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"~([^~\s]+)~").unwrap());
static SUPERSCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\^([^\^\s]+)\^").unwrap());
static SMALL_CAPS: Lazy<Regex> = Lazy::new(|| Regex::new(r"@sc\(([^)]+)\)").unwrap());
static COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@color\(([A-Za-z#0-9]+),\s*([^)]+)\)").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());
static KBD: Lazy<Regex> = Lazy::new(|| Regex::new(r"@kbd\(([^)]+)\)").unwrap());
static ABBR: Lazy<Regex> = Lazy::new(|| Regex::new(r"@abbr\(([^,)]+),\s*([^)]+)\)").unwrap());

/// Render one run of inline text to HTML.
pub(crate) fn render_inline(text: &str, ctx: &InlineContext) -> String {
    let mut out = html_escape::encode_text(text).into_owned();

    out = IMAGE
        .replace_all(&out, |caps: &Captures| {
            format!(
                "<img src=\"{}\" alt=\"{}\">",
                attr(&caps[2]),
                attr(&caps[1])
            )
        })
        .into_owned();
    out = BOLD.replace_all(&out, "<strong>$1</strong>").into_owned();
    out = ITALIC.replace_all(&out, "<em>$1</em>").into_owned();
    out = CODE.replace_all(&out, "<code>$1</code>").into_owned();

    out = MATH
        .replace_all(&out, |caps: &Captures| {
            let latex = html_escape::decode_html_entities(&caps[1]).into_owned();
            math_markup(ctx.math, &latex, false)
        })
        .into_owned();

    out = FOOTNOTE
        .replace_all(&out, |caps: &Captures| {
            let id = &caps[1];
            match ctx.footnotes.get_index_of(id) {
                Some(index) => format!(
                    "<sup class=\"footnote-ref\" id=\"fnref-{id}\"><a href=\"#fn-{id}\">{}</a></sup>",
                    index + 1
                ),
                // Unresolved references render visibly but link nowhere.
                None => format!("<sup class=\"footnote-ref footnote-missing\">{id}</sup>"),
            }
        })
        .into_owned();

    out = CITE
        .replace_all(&out, "<a class=\"citation\" href=\"#ref-$1\">[$1]</a>")
        .into_owned();
    out = CROSSREF
        .replace_all(&out, "<a class=\"crossref\" href=\"#$1\">$1</a>")
        .into_owned();
    out = MARK.replace_all(&out, "<mark>$1</mark>").into_owned();
    out = STRIKE.replace_all(&out, "<del>$1</del>").into_owned();
    out = SUBSCRIPT.replace_all(&out, "<sub>$1</sub>").into_owned();
    out = SUPERSCRIPT.replace_all(&out, "<sup>$1</sup>").into_owned();
    out = SMALL_CAPS
        .replace_all(&out, "<span class=\"small-caps\">$1</span>")
        .into_owned();
    out = COLOR
        .replace_all(&out, |caps: &Captures| {
            format!("<span style=\"color: {}\">{}</span>", attr(&caps[1]), &caps[2])
        })
        .into_owned();
    out = LINK
        .replace_all(&out, |caps: &Captures| {
            format!("<a href=\"{}\">{}</a>", attr(&caps[2]), &caps[1])
        })
        .into_owned();
    out = KBD.replace_all(&out, "<kbd>$1</kbd>").into_owned();
    out = ABBR
        .replace_all(&out, |caps: &Captures| {
            format!("<abbr title=\"{}\">{}</abbr>", attr(&caps[2]), &caps[1])
        })
        .into_owned();

    out
}

/// Run the math callback; a failure becomes a marked error span instead of
/// aborting the render.
pub(crate) fn math_markup(math: &MathRenderer, latex: &str, display: bool) -> String {
    match math(latex, display) {
        Ok(markup) => markup,
        Err(message) => format!(
            "<span class=\"math-error\" title=\"{}\">{}</span>",
            attr(&message),
            html_escape::encode_text(latex)
        ),
    }
}

/// Text already went through `encode_text`; attributes additionally need
/// their quotes neutralized.
fn attr(value: &str) -> String {
    value.replace('"', "&quot;")
}
