//! HTML engine. Raw-text element bodies (`script`, `style`, `pre`,
//! `textarea`) are protected before any markup rewrite runs.

use lossy_core::{FileType, Impact, ResolvedOptions, Result, Tier};
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;

use crate::pipeline::{op, Engine, OpLog};
use crate::protect::Protected;
use crate::rewrite::{replace_counted, replace_with};

const RAW_TEXT_TAGS: &[&str] = &["script", "style", "pre", "textarea"];

static RE_RAW_TEXT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    RAW_TEXT_TAGS
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)(<{tag}\b[^>]*>)(.*?)(</{tag}\s*>)")).unwrap())
        .collect()
});
static RE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--(.*?)-->").unwrap());
static RE_BETWEEN_TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">\s+<").unwrap());
static RE_WS_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}|[\t\r\n]").unwrap());
static RE_DOCTYPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<!DOCTYPE[^>]*>").unwrap());
static RE_DEFAULT_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\s+type\s*=\s*["']?text/(?:javascript|css)["']?"#).unwrap());
static RE_BOOLEAN_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(checked|disabled|selected|readonly|multiple|autofocus|autoplay|controls|loop|muted|required|hidden|defer|async|novalidate|open|reversed|nomodule)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#,
    )
    .unwrap()
});
static RE_INPUT_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(<input\b[^>]*?)\s+type\s*=\s*(?:"text"|'text'|text\b)"#).unwrap());
static RE_BUTTON_SUBMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(<button\b[^>]*?)\s+type\s*=\s*(?:"submit"|'submit'|submit\b)"#).unwrap());
static RE_OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[a-zA-Z][^<>]*>").unwrap());
static RE_QUOTED_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"=\s*(?:"([^"\s'=<>`]+)"|'([^'\s"=<>`]+)')"#).unwrap());
static RE_OPTIONAL_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(li|p|option|td|tr|th|dt|dd)\s*>").unwrap());
static RE_META: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<meta\b[^>]*>").unwrap());
static RE_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").unwrap());

const KEEP_META: &[&str] = &["charset", "viewport", "http-equiv"];
const ANALYTICS_MARKERS: &[&str] = &[
    "google-analytics.com",
    "googletagmanager.com",
    "gtag(",
    "hotjar",
    "mixpanel",
    "segment.com",
    "fbq(",
];
const P_CLOSERS: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "footer", "form", "h1", "h2", "h3", "h4",
    "h5", "h6", "header", "hr", "main", "nav", "ol", "p", "pre", "section", "table", "ul",
];

pub struct HtmlEngine;

impl Engine for HtmlEngine {
    fn file_type(&self) -> FileType {
        FileType::Html
    }

    fn run(&self, content: &str, tier: Tier, opts: &ResolvedOptions<'_>, ops: &mut OpLog) -> Result<String> {
        let mut bodies = Protected::new();
        let mut html = content.to_string();
        for re in RE_RAW_TEXT.iter() {
            html = bodies.protect(&html, re, 2);
        }
        html = match tier {
            Tier::Minimal => minimal(html, ops, opts),
            Tier::Moderate => moderate(html, ops, opts),
            Tier::Aggressive => aggressive(html, ops, opts, &bodies),
        };
        Ok(bodies.restore(&html))
    }
}

fn minimal(mut html: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>) -> String {
    if opts.flag("removeComments") {
        html = ops.apply(html, op("remove_comments", Impact::Low), remove_comments);
    }
    if opts.flag("collapseWhitespace") {
        html = ops.apply(html, op("collapse_whitespace", Impact::Low), collapse_whitespace);
    }
    html
}

fn moderate(html: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>) -> String {
    let mut html = minimal(html, ops, opts);

    if opts.flag("normalizeDoctype") {
        html = ops.apply(html, op("normalize_doctype", Impact::Medium), |h| {
            replace_with(&RE_DOCTYPE, h, |caps| (caps[0].len() > 15).then(|| "<!DOCTYPE html>".to_string()))
        });
    }
    if opts.flag("removeDefaultTypes") {
        html = ops.apply(html, op("remove_default_types", Impact::Medium), |h| replace_counted(&RE_DEFAULT_TYPE, h, ""));
    }
    if opts.flag("collapseBooleanAttributes") {
        html = ops.apply(html, op("collapse_boolean_attributes", Impact::Medium), collapse_boolean_attributes);
        html = ops.apply(html, op("remove_default_input_types", Impact::Medium), |h| {
            let (a, n) = replace_counted(&RE_INPUT_TEXT, h, "$1");
            let (b, m) = replace_counted(&RE_BUTTON_SUBMIT, &a, "$1");
            (b, n + m)
        });
    }
    if opts.flag("removeAttributeQuotes") {
        html = ops.apply(html, op("remove_attribute_quotes", Impact::Medium), remove_attribute_quotes);
    }
    if opts.flag("removeOptionalTags") {
        html = ops.apply(html, op("remove_optional_closing_tags", Impact::Medium), remove_optional_closing_tags);
    }
    html
}

fn aggressive(html: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>, bodies: &Protected) -> String {
    let mut html = moderate(html, ops, opts);

    if opts.flag("removeMetaTags") {
        html = ops.apply(html, op("remove_meta_tags", Impact::High), remove_meta_tags);
    }
    if opts.flag("removeAnalytics") {
        html = ops.apply(html, op("remove_analytics", Impact::High), |h| remove_analytics(h, bodies));
    }
    if opts.flag("inlineCss") {
        debug!(option = "inlineCss", "no stylesheet inlining available; content unchanged");
    }
    html
}

/// Conditional comments (`<!--[if IE]>`) survive.
pub fn remove_comments(html: &str) -> (String, usize) {
    replace_with(&RE_COMMENT, html, |caps| {
        let body = &caps[1];
        (!body.starts_with("[if") && !body.ends_with("<![endif]")).then(String::new)
    })
}

pub fn collapse_whitespace(html: &str) -> (String, usize) {
    let (tight, n) = replace_counted(&RE_BETWEEN_TAGS, html, "><");
    let mut m = 0;
    let out = RE_WS_RUN
        .replace_all(&tight, |caps: &Captures| {
            if &caps[0] != " " {
                m += 1;
            }
            " "
        })
        .into_owned();
    (out.trim().to_string(), n + m)
}

/// `disabled="disabled"` and `disabled=""` become bare `disabled`.
pub fn collapse_boolean_attributes(html: &str) -> (String, usize) {
    replace_with(&RE_BOOLEAN_ATTR, html, |caps| {
        let name = &caps[1];
        let value = caps.get(2).or(caps.get(3)).or(caps.get(4)).map(|m| m.as_str()).unwrap_or("");
        (value.is_empty() || value.eq_ignore_ascii_case(name)).then(|| name.to_string())
    })
}

/// Unquote attribute values made only of safe characters. Values ending in
/// `/` keep their quotes so a self-closing slash is never absorbed.
pub fn remove_attribute_quotes(html: &str) -> (String, usize) {
    let mut count = 0;
    let out = RE_OPEN_TAG
        .replace_all(html, |tag: &Captures| {
            let (rewritten, n) = replace_with(&RE_QUOTED_VALUE, &tag[0], |caps| {
                let value = caps.get(1).or(caps.get(2))?.as_str();
                (!value.ends_with('/')).then(|| format!("={value}"))
            });
            count += n;
            rewritten
        })
        .into_owned();
    (out, count)
}

/// Next tag after `at`, skipping whitespace: `(is_closing, lowercase name)`.
fn next_tag(html: &str, at: usize) -> Option<(bool, String)> {
    let rest = html[at..].trim_start().strip_prefix('<')?;
    let (closing, rest) = match rest.strip_prefix('/') {
        Some(r) => (true, r),
        None => (false, rest),
    };
    let name: String = rest.chars().take_while(|c| c.is_ascii_alphanumeric()).collect();
    (!name.is_empty()).then(|| (closing, name.to_ascii_lowercase()))
}

fn closing_is_optional(tag: &str, next: Option<(bool, String)>) -> bool {
    let Some((closing, name)) = next else {
        return false;
    };
    let name = name.as_str();
    match (tag, closing) {
        ("li", false) => name == "li",
        ("li", true) => matches!(name, "ul" | "ol" | "menu"),
        ("p", false) => P_CLOSERS.contains(&name),
        ("p", true) => name != "a",
        ("option", false) => matches!(name, "option" | "optgroup"),
        ("option", true) => matches!(name, "select" | "optgroup" | "datalist"),
        ("td" | "th", false) => matches!(name, "td" | "th"),
        ("td" | "th", true) => matches!(name, "tr" | "tbody" | "thead" | "tfoot" | "table"),
        ("tr", false) => matches!(name, "tr" | "tbody" | "tfoot"),
        ("tr", true) => matches!(name, "tbody" | "thead" | "tfoot" | "table"),
        ("dt" | "dd", false) => matches!(name, "dt" | "dd"),
        ("dt" | "dd", true) => name == "dl",
        _ => false,
    }
}

/// Drop closing tags the parser infers from what follows.
pub fn remove_optional_closing_tags(html: &str) -> (String, usize) {
    let mut out = String::with_capacity(html.len());
    let mut count = 0;
    let mut pos = 0;
    for caps in RE_OPTIONAL_CLOSE.captures_iter(html) {
        let (Some(m), Some(tag)) = (caps.get(0), caps.get(1)) else { continue };
        if closing_is_optional(&tag.as_str().to_ascii_lowercase(), next_tag(html, m.end())) {
            out.push_str(&html[pos..m.start()]);
            pos = m.end();
            count += 1;
        }
    }
    out.push_str(&html[pos..]);
    (out, count)
}

/// Keep only charset, viewport and http-equiv meta tags.
pub fn remove_meta_tags(html: &str) -> (String, usize) {
    replace_with(&RE_META, html, |caps| {
        let tag = caps[0].to_ascii_lowercase();
        (!KEEP_META.iter().any(|k| tag.contains(k))).then(String::new)
    })
}

/// Remove `<script>` elements that load or configure a known tracker.
pub fn remove_analytics(html: &str, bodies: &Protected) -> (String, usize) {
    replace_with(&RE_SCRIPT, html, |caps| {
        let attrs = caps[1].to_ascii_lowercase();
        let body = bodies.resolve(&caps[2]).unwrap_or(&caps[2]).to_ascii_lowercase();
        ANALYTICS_MARKERS.iter().any(|m| attrs.contains(m) || body.contains(m)).then(String::new)
    })
}
