//! CSS engine. Declaration-level passes only look inside innermost
//! `{...}` blocks, so selectors such as `#aabbcc` are never taken for colors.

use lossy_core::{FileType, Impact, ResolvedOptions, Result, Tier};
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tracing::debug;

use crate::pipeline::{op, Engine, OpLog};
use crate::protect::Protected;
use crate::rewrite::{matching_close, replace_counted, replace_with};

static RE_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)/\*.*?\*/|"(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*'"#).unwrap()
});
static RE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static RE_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}|[\t\r\n]").unwrap());
static RE_PUNCT_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*([{};,>])\s*").unwrap());
static RE_COLON_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":\s+").unwrap());
static RE_SEMI_BRACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r";\s*\}").unwrap());
static RE_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").unwrap());
static RE_HEX6: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#([0-9a-fA-F]{6})\b").unwrap());
static RE_ZERO_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^\w.#-])0(?:px|em|rem|ex|ch|vw|vh|vmin|vmax|cm|mm|in|pt|pc|%)([^\w%]|$)").unwrap()
});

const BOX_SIDES: &[&str] = &["top", "right", "bottom", "left"];
const BOX_SHORTHANDS: &[&str] = &["margin", "padding"];

pub struct CssEngine;

impl Engine for CssEngine {
    fn file_type(&self) -> FileType {
        FileType::Css
    }

    fn run(&self, content: &str, tier: Tier, opts: &ResolvedOptions<'_>, ops: &mut OpLog) -> Result<String> {
        let mut strings = Protected::new();
        let mut css = strings.protect_if(content, &RE_TOKENS, |tok| !tok.starts_with("/*"));
        css = match tier {
            Tier::Minimal => minimal(css, ops, opts),
            Tier::Moderate => moderate(css, ops, opts),
            Tier::Aggressive => aggressive(css, ops, opts),
        };
        Ok(strings.restore(&css))
    }
}

fn minimal(mut css: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>) -> String {
    if opts.flag("removeComments") {
        css = ops.apply(css, op("remove_comments", Impact::Low), |c| replace_counted(&RE_COMMENT, c, ""));
    }
    if opts.flag("collapseWhitespace") {
        css = ops.apply(css, op("collapse_whitespace", Impact::Low), collapse_whitespace);
        css = ops.apply(css, op("remove_trailing_semicolons", Impact::Low), |c| replace_counted(&RE_SEMI_BRACE, c, "}"));
    }
    css
}

fn moderate(css: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>) -> String {
    let mut css = minimal(css, ops, opts);

    if opts.flag("shortenColors") {
        css = ops.apply(css, op("shorten_hex_colors", Impact::Medium), |c| in_declarations(c, shorten_hex_colors));
    }
    if opts.flag("removeZeroUnits") {
        css = ops.apply(css, op("strip_zero_units", Impact::Medium), |c| in_declarations(c, strip_zero_units));
    }
    if opts.flag("mergeShorthand") {
        css = ops.apply(css, op("merge_shorthand_overrides", Impact::Medium), |c| {
            in_declarations(c, merge_shorthand_overrides)
        });
        css = ops.apply(css, op("collapse_shorthand_values", Impact::Medium), |c| {
            in_declarations(c, collapse_shorthand_values)
        });
    }
    if opts.flag("mergeSelectors") {
        css = ops.apply(css, op("merge_selectors", Impact::Medium), merge_selectors);
        css = ops.apply(css, op("group_identical_rules", Impact::Medium), group_identical_rules);
    }
    if opts.flag("removeDuplicateProperties") {
        css = ops.apply(css, op("remove_duplicate_properties", Impact::Medium), |c| {
            in_declarations(c, remove_duplicate_properties)
        });
    }
    css
}

fn aggressive(css: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>) -> String {
    let css = moderate(css, ops, opts);
    for placeholder in ["removeUnused", "mergeDuplicateSelectors"] {
        if opts.flag(placeholder) {
            debug!(option = placeholder, "needs document context; content unchanged");
        }
    }
    css
}

pub fn collapse_whitespace(css: &str) -> (String, usize) {
    let (a, n1) = replace_counted(&RE_WS, css, " ");
    let (b, n2) = replace_counted(&RE_PUNCT_SPACE, &a, "$1");
    let (c, n3) = replace_counted(&RE_COLON_SPACE, &b, ":");
    (c.trim().to_string(), n1 + n2 + n3)
}

/// Run `f` over the body of every innermost block.
fn in_declarations<F>(css: &str, mut f: F) -> (String, usize)
where
    F: FnMut(&str) -> (String, usize),
{
    let mut total = 0;
    let out = RE_BLOCK
        .replace_all(css, |caps: &Captures| {
            let (body, n) = f(&caps[1]);
            total += n;
            format!("{{{body}}}")
        })
        .into_owned();
    (out, total)
}

/// `#aabbcc` → `#abc`.
pub fn shorten_hex_colors(body: &str) -> (String, usize) {
    replace_with(&RE_HEX6, body, |caps| {
        let hex = caps[1].as_bytes();
        let pairs = hex[0] == hex[1] && hex[2] == hex[3] && hex[4] == hex[5];
        pairs.then(|| format!("#{}{}{}", hex[0] as char, hex[2] as char, hex[4] as char))
    })
}

/// `0px` → `0`. Repeats so adjacent values like `0px 0px` are all caught.
pub fn strip_zero_units(body: &str) -> (String, usize) {
    let mut text = body.to_string();
    let mut total = 0;
    loop {
        let (next, n) = replace_counted(&RE_ZERO_UNIT, &text, "${1}0$2");
        if n == 0 {
            return (text, total);
        }
        text = next;
        total += n;
    }
}

#[derive(Debug, Clone)]
struct Declaration {
    property: String,
    value: String,
}

fn parse_declarations(body: &str) -> (Vec<Declaration>, bool) {
    let decls = body
        .split(';')
        .filter_map(|d| {
            let (p, v) = d.split_once(':')?;
            Some(Declaration { property: p.trim().to_string(), value: v.trim().to_string() })
        })
        .collect();
    (decls, body.trim_end().ends_with(';'))
}

fn render_declarations(decls: &[Declaration], trailing: bool) -> String {
    let mut out = decls.iter().map(|d| format!("{}:{}", d.property, d.value)).collect::<Vec<_>>().join(";");
    if trailing && !out.is_empty() {
        out.push(';');
    }
    out
}

fn expand_box(value: &str) -> Option<[String; 4]> {
    if value.contains('!') {
        return None;
    }
    let parts: Vec<&str> = value.split_whitespace().collect();
    let [t, r, b, l] = match parts.as_slice() {
        [a] => [a, a, a, a],
        [a, b] => [a, b, a, b],
        [a, b, c] => [a, b, c, b],
        [a, b, c, d] => [a, b, c, d],
        _ => return None,
    };
    Some([t.to_string(), r.to_string(), b.to_string(), l.to_string()])
}

fn collapse_box(v: &[String; 4]) -> String {
    let [t, r, b, l] = v;
    if t == r && t == b && t == l {
        t.clone()
    } else if t == b && r == l {
        format!("{t} {r}")
    } else if r == l {
        format!("{t} {r} {b}")
    } else {
        format!("{t} {r} {b} {l}")
    }
}

/// Fold `margin-top` style longhands that follow a `margin` shorthand into
/// the shorthand.
pub fn merge_shorthand_overrides(body: &str) -> (String, usize) {
    let (mut decls, trailing) = parse_declarations(body);
    let mut merged = 0;
    for shorthand in BOX_SHORTHANDS {
        let Some(pos) = decls.iter().position(|d| d.property == *shorthand) else { continue };
        let Some(mut sides) = expand_box(&decls[pos].value) else { continue };
        let mut absorbed = Vec::new();
        for (i, d) in decls.iter().enumerate().skip(pos + 1) {
            let Some(side) = d.property.strip_prefix(shorthand).and_then(|s| s.strip_prefix('-')) else { continue };
            let Some(idx) = BOX_SIDES.iter().position(|s| *s == side) else { continue };
            if d.value.contains('!') || d.value.split_whitespace().count() != 1 {
                continue;
            }
            sides[idx] = d.value.clone();
            absorbed.push(i);
        }
        if absorbed.is_empty() {
            continue;
        }
        decls[pos].value = collapse_box(&sides);
        merged += absorbed.len();
        let absorbed: HashSet<usize> = absorbed.into_iter().collect();
        decls = decls.into_iter().enumerate().filter(|(i, _)| !absorbed.contains(i)).map(|(_, d)| d).collect();
    }
    if merged == 0 {
        return (body.to_string(), 0);
    }
    (render_declarations(&decls, trailing), merged)
}

/// `margin:0 0 0 0` → `margin:0`, `padding:1px 2px 1px 2px` → `padding:1px 2px`.
pub fn collapse_shorthand_values(body: &str) -> (String, usize) {
    let (mut decls, trailing) = parse_declarations(body);
    let mut count = 0;
    for d in decls.iter_mut().filter(|d| BOX_SHORTHANDS.contains(&d.property.as_str())) {
        if let Some(sides) = expand_box(&d.value) {
            let collapsed = collapse_box(&sides);
            if collapsed.len() < d.value.len() {
                d.value = collapsed;
                count += 1;
            }
        }
    }
    if count == 0 {
        return (body.to_string(), 0);
    }
    (render_declarations(&decls, trailing), count)
}

/// Keep the last declaration of each property.
pub fn remove_duplicate_properties(body: &str) -> (String, usize) {
    let (decls, trailing) = parse_declarations(body);
    let mut seen = HashSet::new();
    let mut kept: Vec<Declaration> = decls.iter().rev().filter(|d| seen.insert(d.property.clone())).cloned().collect();
    let removed = decls.len() - kept.len();
    if removed == 0 {
        return (body.to_string(), 0);
    }
    kept.reverse();
    (render_declarations(&kept, trailing), removed)
}

#[derive(Debug)]
enum Chunk<'a> {
    Rule { selector: &'a str, body: &'a str },
    Raw(&'a str),
}

fn split_rules(css: &str) -> Vec<Chunk<'_>> {
    let mut chunks = Vec::new();
    let mut pos = 0;
    while let Some(rel) = css[pos..].find('{') {
        let open = pos + rel;
        let Some(close) = matching_close(css, open, b'{', b'}') else { break };
        let selector = css[pos..open].trim();
        let body = &css[open + 1..close - 1];
        if selector.starts_with('@') || body.contains('{') || selector.contains('}') {
            chunks.push(Chunk::Raw(&css[pos..close]));
        } else {
            chunks.push(Chunk::Rule { selector, body });
        }
        pos = close;
    }
    if pos < css.len() {
        chunks.push(Chunk::Raw(&css[pos..]));
    }
    chunks
}

fn flush_rule(out: &mut String, pending: &mut Option<(String, &str)>) {
    if let Some((selector, body)) = pending.take() {
        out.push_str(&format!("{selector}{{{body}}}"));
    }
}

/// Fold every later rule with the same selector into its first occurrence:
/// `.a{x}.b{y}.a{z}` → `.a{x;z}.b{y}`. Returns the number of rules absorbed.
pub fn merge_selectors(css: &str) -> (String, usize) {
    let chunks = split_rules(css);
    let mut first: HashMap<&str, usize> = HashMap::new();
    let mut extra: Vec<Vec<&str>> = vec![Vec::new(); chunks.len()];
    let mut absorbed = vec![false; chunks.len()];
    let mut merged = 0;
    for (i, chunk) in chunks.iter().enumerate() {
        if let Chunk::Rule { selector, body } = chunk {
            match first.get(selector) {
                Some(&j) => {
                    extra[j].push(*body);
                    absorbed[i] = true;
                    merged += 1;
                }
                None => {
                    first.insert(*selector, i);
                }
            }
        }
    }
    if merged == 0 {
        return (css.to_string(), 0);
    }

    let mut out = String::with_capacity(css.len());
    for (i, chunk) in chunks.iter().enumerate() {
        match chunk {
            Chunk::Rule { .. } if absorbed[i] => {}
            Chunk::Rule { selector, body } if !extra[i].is_empty() => {
                let bodies: Vec<&str> = std::iter::once(*body)
                    .chain(extra[i].iter().copied())
                    .map(|b| b.trim().trim_end_matches(';'))
                    .filter(|b| !b.is_empty())
                    .collect();
                out.push_str(&format!("{selector}{{{}}}", bodies.join(";")));
            }
            Chunk::Rule { selector, body } => out.push_str(&format!("{selector}{{{body}}}")),
            Chunk::Raw(raw) => out.push_str(raw),
        }
    }
    (out, merged)
}

/// Group adjacent top-level rules with identical bodies: `a{x}b{x}` →
/// `a,b{x}`. Only neighbours are grouped so cascade order is unchanged.
pub fn group_identical_rules(css: &str) -> (String, usize) {
    let mut out = String::with_capacity(css.len());
    let mut merged = 0;
    let mut pending: Option<(String, &str)> = None;
    for chunk in split_rules(css) {
        match chunk {
            Chunk::Rule { selector, body } => {
                let same_body = matches!(&pending, Some((_, prev)) if prev.trim() == body.trim());
                if same_body {
                    if let Some((sel, _)) = pending.as_mut() {
                        sel.push(',');
                        sel.push_str(selector);
                        merged += 1;
                    }
                } else {
                    flush_rule(&mut out, &mut pending);
                    pending = Some((selector.to_string(), body));
                }
            }
            Chunk::Raw(raw) => {
                flush_rule(&mut out, &mut pending);
                out.push_str(raw);
            }
        }
    }
    flush_rule(&mut out, &mut pending);
    if merged == 0 {
        return (css.to_string(), 0);
    }
    (out, merged)
}
