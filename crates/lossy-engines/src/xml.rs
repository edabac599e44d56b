//! XML engine.

use lossy_core::{FileType, Impact, Operation, ResolvedOptions, Result, Tier};
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::markup::{self, escape_text, for_each_tag, RE_CDATA};
use crate::names::{prefixed, NameAllocator};
use crate::numeric::{parse_number, round_str};
use crate::pipeline::{op, Engine, OpLog};
use crate::protect::Protected;
use crate::rewrite::{replace_counted, replace_with};

static RE_EMPTY_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([A-Za-z_][\w:.-]*)(\s[^<>]*?)?\s*>\s*</([A-Za-z_][\w:.-]*)\s*>").unwrap()
});
static RE_BOOLEAN_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"=\s*(?:"(true|false)"|'(true|false)')"#).unwrap());
static RE_QUOTED_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"=\s*(?:"([^"\s'=<>`/]+)"|'([^'\s"=<>`/]+)')"#).unwrap());
static RE_LONG_DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d+\.\d{3,}").unwrap());
static RE_XMLNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s+xmlns(?::[\w.-]+)?\s*=\s*(?:"[^"]*"|'[^']*')"#).unwrap());
static RE_PREFIXED_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(</?|\s)[A-Za-z_][\w.-]*:([A-Za-z_])").unwrap());
static RE_TAG_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<(/?)([A-Za-z_][\w:.-]*)").unwrap());

pub struct XmlEngine;

impl Engine for XmlEngine {
    fn file_type(&self) -> FileType {
        FileType::Xml
    }

    fn run(&self, content: &str, tier: Tier, opts: &ResolvedOptions<'_>, ops: &mut OpLog) -> Result<String> {
        let mut cdata = Protected::new();
        let mut xml = cdata.protect(content, &RE_CDATA, 0);
        xml = match tier {
            Tier::Minimal => minimal(xml, ops, opts),
            Tier::Moderate => moderate(xml, ops, opts, &cdata),
            Tier::Aggressive => aggressive(xml, ops, opts, &cdata),
        };
        Ok(cdata.restore(&xml))
    }
}

fn minimal(mut xml: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>) -> String {
    if opts.flag("removeComments") {
        xml = ops.apply(xml, op("remove_comments", Impact::Low), markup::remove_comments);
    }
    if opts.flag("collapseWhitespace") {
        xml = ops.apply(xml, op("collapse_whitespace", Impact::Low), markup::collapse_whitespace);
    }
    xml
}

fn moderate(xml: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>, cdata: &Protected) -> String {
    let mut xml = minimal(xml, ops, opts);

    if opts.flag("removeDeclaration") {
        xml = ops.apply(xml, op("remove_xml_declaration", Impact::Medium), markup::remove_declaration);
    }
    if opts.flag("removeDoctype") {
        xml = ops.apply(xml, op("remove_doctype", Impact::Medium), markup::remove_doctype);
    }
    if opts.flag("unwrapCdata") {
        xml = ops.apply(xml, op("unwrap_cdata", Impact::Medium), |x| unwrap_cdata(x, cdata));
    }
    if opts.flag("removeEmptyElements") {
        xml = ops.apply(xml, op("remove_empty_elements", Impact::Medium), remove_empty_elements);
    }
    if opts.flag("collapseBooleans") {
        xml = ops.apply(xml, op("collapse_boolean_attributes", Impact::Medium), collapse_booleans);
    }
    if opts.flag("removeQuotes") {
        xml = ops.apply(xml, op("remove_attribute_quotes", Impact::Medium), remove_attribute_quotes);
    }
    if opts.flag("roundNumbers") {
        xml = ops.apply(xml, op("round_numbers", Impact::Medium).with("decimals", 2), |x| round_numbers(x, 2));
    }
    if opts.flag("stripNamespaces") {
        xml = ops.apply(xml, op("strip_namespaces", Impact::Medium), strip_namespaces);
    }
    xml
}

fn aggressive(xml: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>, cdata: &Protected) -> String {
    let mut xml = moderate(xml, ops, opts, cdata);

    if opts.flag("shortenTags") {
        let (short, mapping, count) = shorten_tags(&xml);
        if count > 0 && short.len() < xml.len() {
            ops.record(Operation::new("shorten_tags", count, true, Impact::High).with("mapping", mapping));
            xml = short;
        }
    }
    xml
}

/// Replace a CDATA section by escaped text when that is shorter.
pub fn unwrap_cdata(xml: &str, cdata: &Protected) -> (String, usize) {
    cdata.rewrite(xml, |section| {
        let inner = section.strip_prefix("<![CDATA[")?.strip_suffix("]]>")?;
        let escaped = escape_text(inner);
        (escaped.len() < section.len()).then_some(escaped)
    })
}

/// `<a></a>` disappears; `<a id="x"></a>` becomes `<a id="x"/>`. Repeats
/// until parents emptied by the removal are handled too.
pub fn remove_empty_elements(xml: &str) -> (String, usize) {
    let mut text = xml.to_string();
    let mut total = 0;
    loop {
        let (next, n) = replace_with(&RE_EMPTY_PAIR, &text, |caps| {
            let attrs = caps.get(2).map(|a| a.as_str()).unwrap_or("");
            if caps[1] != caps[3] || attrs.ends_with('/') {
                return None;
            }
            match attrs.trim() {
                "" => Some(String::new()),
                attrs => Some(format!("<{} {attrs}/>", &caps[1])),
            }
        });
        if n == 0 {
            return (text, total);
        }
        text = next;
        total += n;
    }
}

/// `"true"`/`"false"` attribute values become `"1"`/`"0"`.
pub fn collapse_booleans(xml: &str) -> (String, usize) {
    for_each_tag(xml, |tag| {
        Some(replace_with(&RE_BOOLEAN_VALUE, tag, |caps| {
            let value = caps.get(1).or(caps.get(2))?.as_str();
            Some(if value == "true" { "=\"1\"" } else { "=\"0\"" }.to_string())
        }))
    })
}

pub fn remove_attribute_quotes(xml: &str) -> (String, usize) {
    for_each_tag(xml, |tag| {
        Some(replace_with(&RE_QUOTED_VALUE, tag, |caps| {
            Some(format!("={}", caps.get(1).or(caps.get(2))?.as_str()))
        }))
    })
}

/// Round decimals with three or more fraction digits. Dotted sequences
/// such as version strings are left alone.
pub fn round_numbers(text: &str, decimals: usize) -> (String, usize) {
    replace_with(&RE_LONG_DECIMAL, text, |caps| {
        let m = caps.get(0)?;
        let before = text[..m.start()].chars().next_back();
        let after = text[m.end()..].chars().next();
        if matches!(before, Some('.')) || matches!(after, Some('.')) || before.is_some_and(|c| c.is_alphanumeric()) {
            return None;
        }
        let rounded = round_str(parse_number(m.as_str())?, decimals);
        (rounded.len() < m.len()).then_some(rounded)
    })
}

/// Drop namespace declarations and prefixes from element and attribute names.
pub fn strip_namespaces(xml: &str) -> (String, usize) {
    let (a, n) = replace_counted(&RE_XMLNS, xml, "");
    let (b, m) = for_each_tag(&a, |tag| Some(replace_counted(&RE_PREFIXED_NAME, tag, "$1$2")));
    let (c, k) = replace_with(&RE_TAG_NAME, &b, |caps| {
        let name = &caps[2];
        let local = name.rsplit_once(':')?.1;
        Some(format!("<{}{local}", &caps[1]))
    });
    (c, n + m + k)
}

/// Rename element names longer than three characters to `t0`, `t1`, ...
pub fn shorten_tags(xml: &str) -> (String, Map<String, Value>, usize) {
    let mut order: Vec<String> = Vec::new();
    let mut existing: HashSet<String> = HashSet::new();
    for caps in RE_TAG_NAME.captures_iter(xml) {
        let name = caps[2].to_string();
        if name.len() > 3 && !order.contains(&name) {
            order.push(name.clone());
        }
        existing.insert(name);
    }
    if order.is_empty() {
        return (xml.to_string(), Map::new(), 0);
    }
    let mut names = NameAllocator::new(|i| prefixed("t", i), existing);
    let renames: HashMap<String, String> = order.iter().map(|n| (n.clone(), names.next_name())).collect();

    let mut count = 0;
    let out = RE_TAG_NAME
        .replace_all(xml, |caps: &Captures| match renames.get(&caps[2]) {
            Some(short) => {
                count += 1;
                format!("<{}{short}", &caps[1])
            }
            None => caps[0].to_string(),
        })
        .into_owned();
    let mapping: Map<String, Value> = order
        .iter()
        .filter_map(|n| Some((n.clone(), Value::String(renames.get(n)?.clone()))))
        .collect();
    (out, mapping, count)
}
