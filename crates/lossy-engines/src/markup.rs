//! Tag-level helpers shared by the XML and SVG engines.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::rewrite::{replace_counted, replace_with};

pub static RE_CDATA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[.*?\]\]>").unwrap());
static RE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static RE_BETWEEN_TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">\s+<").unwrap());
static RE_WS_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}|[\t\r\n]").unwrap());
static RE_DECLARATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<\?xml\b[^?]*\?>\s*").unwrap());
static RE_DOCTYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<!DOCTYPE[^>\[]*(?:\[.*?\])?\s*>\s*").unwrap());
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[A-Za-z][^<>]*>").unwrap());

pub fn remove_comments(text: &str) -> (String, usize) {
    replace_counted(&RE_COMMENT, text, "")
}

pub fn collapse_whitespace(text: &str) -> (String, usize) {
    let (tight, n) = replace_counted(&RE_BETWEEN_TAGS, text, "><");
    let (out, m) = replace_with(&RE_WS_RUN, &tight, |_| Some(" ".to_string()));
    (out.trim().to_string(), n + m)
}

pub fn remove_declaration(text: &str) -> (String, usize) {
    replace_counted(&RE_DECLARATION, text, "")
}

pub fn remove_doctype(text: &str) -> (String, usize) {
    replace_counted(&RE_DOCTYPE, text, "")
}

/// Rewrite every start (or self-closing) tag through `f`.
pub fn for_each_tag<F>(text: &str, mut f: F) -> (String, usize)
where
    F: FnMut(&str) -> Option<(String, usize)>,
{
    let mut total = 0;
    let out = RE_TAG
        .replace_all(text, |caps: &Captures| match f(&caps[0]) {
            Some((rewritten, n)) if n > 0 => {
                total += n;
                rewritten
            }
            _ => caps[0].to_string(),
        })
        .into_owned();
    (out, total)
}

/// Element name of a start tag.
pub fn tag_name(tag: &str) -> &str {
    let body = tag.trim_start_matches('<');
    let end = body.find(|c: char| c.is_whitespace() || c == '>' || c == '/').unwrap_or(body.len());
    &body[..end]
}

pub fn is_self_closing(tag: &str) -> bool {
    tag.trim_end_matches('>').trim_end().ends_with('/')
}

/// A quoted attribute inside a tag. `start` includes the whitespace before
/// the name; `end` is just past the closing quote.
#[derive(Debug, Clone, Copy)]
pub struct Attr<'a> {
    pub start: usize,
    pub end: usize,
    pub value: &'a str,
}

pub fn find_attr<'a>(tag: &'a str, name: &str) -> Option<Attr<'a>> {
    let mut from = 0;
    while let Some(rel) = tag[from..].find(name) {
        let at = from + rel;
        from = at + name.len();
        if !tag[..at].ends_with(char::is_whitespace) {
            continue;
        }
        let after = &tag[at + name.len()..];
        let Some(rest) = after.trim_start().strip_prefix('=') else { continue };
        let rest = rest.trim_start();
        let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else { continue };
        let value_start = tag.len() - rest.len() + 1;
        let close = tag[value_start..].find(quote)?;
        return Some(Attr {
            start: tag[..at].trim_end().len(),
            end: value_start + close + 1,
            value: &tag[value_start..value_start + close],
        });
    }
    None
}

pub fn attr<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    find_attr(tag, name).map(|a| a.value)
}

/// The tag without attribute `name`, if it had one.
pub fn remove_attr(tag: &str, name: &str) -> Option<String> {
    let a = find_attr(tag, name)?;
    Some(format!("{}{}", &tag[..a.start], &tag[a.end..]))
}

/// Byte offset just past the `</name>` closing the element whose start tag
/// ends at `after_open`. Nested elements of the same name are counted.
pub fn element_end(text: &str, name: &str, after_open: usize) -> Option<usize> {
    let open = format!("<{name}");
    let close = format!("</{name}");
    let mut depth = 1usize;
    let mut pos = after_open;
    loop {
        let next_close = text[pos..].find(&close)? + pos;
        let next_open = text[pos..].find(&open).map(|i| i + pos).filter(|&i| i < next_close);
        match next_open {
            Some(o) => {
                let tag_end = text[o..].find('>')? + o + 1;
                let boundary = text[o + open.len()..].starts_with(|c: char| c.is_whitespace() || c == '>' || c == '/');
                if boundary && !is_self_closing(&text[o..tag_end]) {
                    depth += 1;
                }
                pos = tag_end;
            }
            None => {
                let end = text[next_close..].find('>')? + next_close + 1;
                depth -= 1;
                if depth == 0 {
                    return Some(end);
                }
                pos = end;
            }
        }
    }
}

/// XML text escaping for unwrapped CDATA.
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
