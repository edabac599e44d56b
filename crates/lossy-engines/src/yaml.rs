//! YAML engine: line-oriented rewrites. Block scalar bodies (`|`, `>`)
//! are never touched by the line passes.

use lossy_core::{FileType, Impact, Operation, ResolvedOptions, Result, Tier};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::names::{prefixed, NameAllocator};
use crate::numeric::parse_number;
use crate::pipeline::{op, Engine, OpLog};

static RE_BLOCK_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^\s*-|:)\s+[|>][-+0-9]*\s*$").unwrap());
static RE_QUOTED_SCALAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\s*(?:-\s+)?(?:[^\s#"'-][^:#]*:\s+)?)(?:"([^"\\]*)"|'([^']*)')\s*$"#).unwrap()
});
static RE_NULL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.*?(?::|^\s*-)\s+)(?:null|Null|NULL)\s*$").unwrap());
static RE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*(?:-\s+)?)([A-Za-z_][\w-]*)(:(?:\s.*)?)$").unwrap());
static RE_SEQ_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\s*)-\s+(.*)$").unwrap());
static RE_BARE_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\s*)([^\s#-][^:#]*):\s*$").unwrap());

const RESERVED_SCALARS: &[&str] = &["true", "false", "yes", "no", "on", "off", "null", "~", "y", "n"];
const MAX_INLINE: usize = 80;

pub struct YamlEngine;

impl Engine for YamlEngine {
    fn file_type(&self) -> FileType {
        FileType::Yaml
    }

    fn run(&self, content: &str, tier: Tier, opts: &ResolvedOptions<'_>, ops: &mut OpLog) -> Result<String> {
        let yaml = content.to_string();
        Ok(match tier {
            Tier::Minimal => minimal(yaml, ops, opts),
            Tier::Moderate => moderate(yaml, ops, opts),
            Tier::Aggressive => aggressive(yaml, ops, opts),
        })
    }
}

fn minimal(mut yaml: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>) -> String {
    if opts.flag("removeComments") {
        yaml = ops.apply(yaml, op("remove_comments", Impact::Low), remove_comments);
    }
    if opts.flag("removeBlankLines") {
        yaml = ops.apply(yaml, op("strip_trailing_whitespace", Impact::Low), strip_trailing_whitespace);
        yaml = ops.apply(yaml, op("collapse_blank_lines", Impact::Low), remove_blank_lines);
    }
    yaml
}

fn moderate(yaml: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>) -> String {
    let mut yaml = minimal(yaml, ops, opts);

    if opts.flag("removeDocumentMarkers") {
        yaml = ops.apply(yaml, op("remove_document_markers", Impact::Medium), remove_document_markers);
    }
    if opts.flag("inlineBlockScalars") {
        yaml = ops.apply(yaml, op("inline_block_scalars", Impact::Medium), inline_block_scalars);
    }
    if opts.flag("removeQuotes") {
        yaml = ops.apply(yaml, op("remove_unnecessary_quotes", Impact::Medium), remove_unnecessary_quotes);
    }
    if opts.flag("shortenNulls") {
        yaml = ops.apply(yaml, op("shorten_nulls", Impact::Medium), shorten_nulls);
    }
    if opts.flag("flowSequences") {
        yaml = ops.apply(yaml, op("flow_sequences", Impact::Medium), flow_sequences);
    }
    yaml
}

fn aggressive(yaml: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>) -> String {
    let mut yaml = moderate(yaml, ops, opts);

    if opts.flag("shortenKeys") {
        let (short, mapping, count) = shorten_keys(&yaml);
        if count > 0 && short.len() < yaml.len() {
            ops.record(Operation::new("shorten_keys", count, true, Impact::High).with("mapping", mapping));
            yaml = short;
        }
    }
    yaml
}

fn indent(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Pair every line with whether it belongs to a block scalar body.
fn classify(text: &str) -> Vec<(&str, bool)> {
    let mut out = Vec::new();
    let mut block: Option<usize> = None;
    for line in text.lines() {
        if let Some(base) = block {
            if line.trim().is_empty() || indent(line) > base {
                out.push((line, true));
                continue;
            }
            block = None;
        }
        if RE_BLOCK_START.is_match(line) {
            block = Some(indent(line));
        }
        out.push((line, false));
    }
    out
}

fn join_lines(lines: Vec<String>, original: &str) -> String {
    let mut out = lines.join("\n");
    if original.ends_with('\n') && !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Apply `f` to each line outside block scalars; `None` drops the line.
fn map_lines<F>(text: &str, mut f: F) -> (String, usize)
where
    F: FnMut(&str) -> Option<String>,
{
    let mut changed = 0;
    let mut lines = Vec::new();
    for (line, in_block) in classify(text) {
        if in_block {
            lines.push(line.to_string());
            continue;
        }
        match f(line) {
            Some(next) => {
                if next != line {
                    changed += 1;
                }
                lines.push(next);
            }
            None => changed += 1,
        }
    }
    (join_lines(lines, text), changed)
}

/// Byte offset of a `#` that starts a comment, ignoring quoted text.
fn comment_start(line: &str) -> Option<usize> {
    let mut single = false;
    let mut double = false;
    let mut prev = ' ';
    for (i, c) in line.char_indices() {
        match c {
            '\'' if !double => single = !single,
            '"' if !single && prev != '\\' => double = !double,
            '#' if !single && !double && prev.is_whitespace() => return Some(i),
            _ => {}
        }
        prev = c;
    }
    None
}

pub fn remove_comments(yaml: &str) -> (String, usize) {
    map_lines(yaml, |line| match comment_start(line) {
        Some(at) if line[..at].trim().is_empty() => None,
        Some(at) => Some(line[..at].trim_end().to_string()),
        None => Some(line.to_string()),
    })
}

pub fn strip_trailing_whitespace(yaml: &str) -> (String, usize) {
    map_lines(yaml, |line| Some(line.trim_end().to_string()))
}

pub fn remove_blank_lines(yaml: &str) -> (String, usize) {
    map_lines(yaml, |line| (!line.trim().is_empty()).then(|| line.to_string()))
}

pub fn remove_document_markers(yaml: &str) -> (String, usize) {
    map_lines(yaml, |line| (!matches!(line.trim_end(), "---" | "...")).then(|| line.to_string()))
}

/// A scalar that reads back as the same string without quotes.
fn is_plain_safe(value: &str) -> bool {
    let Some(first) = value.chars().next() else { return false };
    if value.trim() != value || value.ends_with(':') {
        return false;
    }
    if "-?:,[]{}#&*!|>'\"%@`".contains(first) || first.is_ascii_digit() {
        return false;
    }
    if value.contains(": ") || value.contains(" #") || value.contains(['\\', '\t']) {
        return false;
    }
    let lower = value.to_ascii_lowercase();
    !RESERVED_SCALARS.contains(&lower.as_str()) && parse_number(value).is_none()
}

/// Single-line `|`/`>` scalars of up to 80 characters move onto the key line.
pub fn inline_block_scalars(yaml: &str) -> (String, usize) {
    let lines: Vec<&str> = yaml.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut count = 0;
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if RE_BLOCK_START.is_match(line) && i + 1 < lines.len() {
            let base = indent(line);
            let body = lines[i + 1];
            let ends_after = lines.get(i + 2).map_or(true, |next| next.trim().is_empty() || indent(next) <= base);
            let content = body.trim();
            if indent(body) > base && ends_after && content.len() <= MAX_INLINE && is_plain_safe(content) {
                let head = line.trim_end();
                let indicator = head.rsplit(char::is_whitespace).next().unwrap_or("");
                let key = head[..head.len() - indicator.len()].trim_end();
                out.push(format!("{key} {content}"));
                count += 1;
                i += 2;
                continue;
            }
        }
        out.push(line.to_string());
        i += 1;
    }
    (join_lines(out, yaml), count)
}

pub fn remove_unnecessary_quotes(yaml: &str) -> (String, usize) {
    map_lines(yaml, |line| {
        let Some(caps) = RE_QUOTED_SCALAR.captures(line) else { return Some(line.to_string()) };
        let value = caps.get(2).or(caps.get(3)).map(|m| m.as_str()).unwrap_or("");
        if is_plain_safe(value) {
            Some(format!("{}{value}", &caps[1]))
        } else {
            Some(line.to_string())
        }
    })
}

pub fn shorten_nulls(yaml: &str) -> (String, usize) {
    map_lines(yaml, |line| match RE_NULL.captures(line) {
        Some(caps) => Some(format!("{}~", &caps[1])),
        None => Some(line.to_string()),
    })
}

/// `key:` followed by simple `- item` lines becomes `key: [a, b]`.
pub fn flow_sequences(yaml: &str) -> (String, usize) {
    let lines: Vec<&str> = yaml.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut count = 0;
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if let Some(key) = RE_BARE_KEY.captures(line) {
            let base = key[1].len();
            let mut items = Vec::new();
            let mut item_indent = None;
            let mut j = i + 1;
            while let Some(caps) = lines.get(j).and_then(|l| RE_SEQ_ITEM.captures(l)) {
                let depth = caps[1].len();
                let value = caps[2].trim();
                let simple = !value.is_empty()
                    && !value.contains([',', '[', ']', '{', '}', '#', '"', '\''])
                    && !value.contains(": ")
                    && !value.ends_with(':');
                if depth < base || item_indent.is_some_and(|d| d != depth) || !simple {
                    break;
                }
                item_indent = Some(depth);
                items.push(value.to_string());
                j += 1;
            }
            let flow = format!("{}{}: [{}]", &key[1], &key[2], items.join(", "));
            let stays_nested = lines.get(j).is_some_and(|l| !l.trim().is_empty() && indent(l) > base);
            if !items.is_empty() && !stays_nested && flow.len() <= MAX_INLINE {
                out.push(flow);
                count += 1;
                i = j;
                continue;
            }
        }
        out.push(line.to_string());
        i += 1;
    }
    (join_lines(out, yaml), count)
}

/// Rename keys longer than five characters to `k0`, `k1`, ... everywhere
/// they appear as a key.
pub fn shorten_keys(yaml: &str) -> (String, Map<String, Value>, usize) {
    let mut order: Vec<String> = Vec::new();
    let mut existing: HashSet<String> = HashSet::new();
    for (line, in_block) in classify(yaml) {
        if in_block {
            continue;
        }
        if let Some(caps) = RE_KEY.captures(line) {
            let key = caps[2].to_string();
            if key.len() > 5 && !order.contains(&key) {
                order.push(key.clone());
            }
            existing.insert(key);
        }
    }
    if order.is_empty() {
        return (yaml.to_string(), Map::new(), 0);
    }
    let mut names = NameAllocator::new(|i| prefixed("k", i), existing);
    let renames: HashMap<String, String> = order.iter().map(|k| (k.clone(), names.next_name())).collect();

    let (out, count) = map_lines(yaml, |line| {
        let Some(caps) = RE_KEY.captures(line) else { return Some(line.to_string()) };
        match renames.get(&caps[2]) {
            Some(short) => Some(format!("{}{short}{}", &caps[1], &caps[3])),
            None => Some(line.to_string()),
        }
    });
    let mapping: Map<String, Value> = order
        .iter()
        .filter_map(|k| Some((k.clone(), Value::String(renames.get(k)?.clone()))))
        .collect();
    (out, mapping, count)
}
