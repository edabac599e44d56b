//! SVG engine: markup cleanup plus geometry and attribute passes modelled
//! on what vector editors leave behind.

use lossy_core::{FileType, Impact, Operation, ResolvedOptions, Result, Tier};
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::markup::{self, attr, element_end, find_attr, for_each_tag, is_self_closing, remove_attr, tag_name, RE_CDATA};
use crate::names::{letter_name, NameAllocator};
use crate::numeric::{parse_number, round_str, strip_leading_zero};
use crate::pipeline::{op, Engine, OpLog};
use crate::protect::Protected;
use crate::rewrite::{replace_counted, replace_with};

static RE_METADATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<metadata\b[^>]*?/>|<metadata\b.*?</metadata\s*>|<(?:sodipodi|inkscape):[\w-]+\b[^>]*?/>").unwrap()
});
static RE_EMPTY_CONTAINER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(g|defs|symbol|marker|clipPath|mask|pattern|switch)(\s[^<>]*?)?(?:/>|>\s*</(g|defs|symbol|marker|clipPath|mask|pattern|switch)\s*>)").unwrap()
});
static RE_SVG_ROOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<svg\b[^<>]*>").unwrap());
static RE_START_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<([A-Za-z][\w:-]*)(\s[^<>]*)?>").unwrap());
static RE_ATTR_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"="([^"]*)""#).unwrap());
static RE_INNER_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}|[\t\r\n]").unwrap());
static RE_EMPTY_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\s+[\w:-]+\s*=\s*(?:""|'')"#).unwrap());
static RE_SINGLE_CHILD_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<g(\s[^<>]*)?>\s*(<[A-Za-z][^<>]*/>)\s*</g\s*>").unwrap());
static RE_ATTR_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([\w:-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());
static RE_ELLIPSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<ellipse\b[^<>]*/>").unwrap());
static RE_STROKE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s+stroke-[\w-]+\s*=\s*(?:"[^"]*"|'[^']*')"#).unwrap());
static RE_ANY_STROKE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s+stroke(?:-[\w-]+)?\s*=\s*(?:"[^"]*"|'[^']*')"#).unwrap());
static RE_CLIP_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<clipPath(?:\s[^<>]*[^/<>])?>.*?</clipPath\s*>").unwrap());
static RE_PATH_DATA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(\sd=")([^"]*)(")"#).unwrap());
static RE_PATH_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[MmZzLlHhVvCcSsQqTtAa]|-?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").unwrap());
static RE_COORD_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\s(?:x|y|x1|y1|x2|y2|cx|cy|r|rx|ry|width|height|fx|fy|offset|points|viewBox)=")([^"]*)(")"#).unwrap()
});
static RE_DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d*\.\d+").unwrap());
static RE_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(fill|stroke|stop-color|flood-color|lighting-color|color)(=[\x22']|:\s*)(#[0-9a-fA-F]{6}|#[0-9a-fA-F]{3}|[a-zA-Z]+)\b").unwrap()
});
static RE_NS_DECL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\s+xmlns:([\w.-]+)\s*=\s*"[^"]*""#).unwrap());
static RE_TITLE_DESC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<(title|desc)\b[^>]*>.*?</(title|desc)\s*>|<(?:title|desc)\b[^>]*/>").unwrap());
static RE_ID_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\sid="([^"]+)""#).unwrap());
static RE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(url\(\s*["']?#|\bhref\s*=\s*["']#)([A-Za-z_][\w.:-]*)"#).unwrap()
});
static RE_IDENTITY_TRANSFORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s+transform="\s*(?:translate\(\s*0(?:[\s,]+0)?\s*\)|scale\(\s*1(?:[\s,]+1)?\s*\)|rotate\(\s*0\s*\)|matrix\(\s*1[\s,]+0[\s,]+0[\s,]+1[\s,]+0[\s,]+0\s*\))\s*""#).unwrap()
});

const HIDDEN_MARKERS: &[(&str, &str)] = &[("display", "none"), ("visibility", "hidden"), ("opacity", "0")];
const ZERO_SIZE: &[(&str, &[&str])] = &[
    ("rect", &["width", "height"]),
    ("image", &["width", "height"]),
    ("use", &["width", "height"]),
    ("circle", &["r"]),
    ("ellipse", &["rx", "ry"]),
];
const HOISTABLE: &[&str] = &["fill", "stroke", "transform"];
const NON_STROKABLE: &[&str] = &["image", "foreignObject", "stop", "linearGradient", "radialGradient"];
const DEFAULT_VALUES: &[(&str, &[&str])] = &[
    ("fill", &["black", "#000", "#000000"]),
    ("fill-opacity", &["1"]),
    ("fill-rule", &["nonzero"]),
    ("stroke-opacity", &["1"]),
    ("stroke-width", &["1"]),
    ("stroke-linecap", &["butt"]),
    ("stroke-linejoin", &["miter"]),
    ("stroke-miterlimit", &["4"]),
    ("stroke-dashoffset", &["0"]),
    ("opacity", &["1"]),
    ("x", &["0"]),
    ("y", &["0"]),
];
const NAMED_COLORS: &[(&str, &str)] = &[
    ("black", "#000000"),
    ("white", "#ffffff"),
    ("red", "#ff0000"),
    ("lime", "#00ff00"),
    ("blue", "#0000ff"),
    ("yellow", "#ffff00"),
    ("cyan", "#00ffff"),
    ("aqua", "#00ffff"),
    ("magenta", "#ff00ff"),
    ("fuchsia", "#ff00ff"),
    ("gray", "#808080"),
    ("grey", "#808080"),
    ("silver", "#c0c0c0"),
    ("maroon", "#800000"),
    ("olive", "#808000"),
    ("green", "#008000"),
    ("purple", "#800080"),
    ("teal", "#008080"),
    ("navy", "#000080"),
    ("orange", "#ffa500"),
    ("tan", "#d2b48c"),
    ("gold", "#ffd700"),
    ("pink", "#ffc0cb"),
    ("plum", "#dda0dd"),
    ("snow", "#fffafa"),
    ("linen", "#faf0e6"),
    ("beige", "#f5f5dc"),
    ("wheat", "#f5deb3"),
    ("khaki", "#f0e68c"),
    ("coral", "#ff7f50"),
    ("salmon", "#fa8072"),
    ("tomato", "#ff6347"),
    ("indigo", "#4b0082"),
    ("violet", "#ee82ee"),
    ("orchid", "#da70d6"),
    ("sienna", "#a0522d"),
    ("peru", "#cd853f"),
    ("ivory", "#fffff0"),
    ("azure", "#f0ffff"),
];

pub struct SvgEngine;

impl Engine for SvgEngine {
    fn file_type(&self) -> FileType {
        FileType::Svg
    }

    fn run(&self, content: &str, tier: Tier, opts: &ResolvedOptions<'_>, ops: &mut OpLog) -> Result<String> {
        let mut cdata = Protected::new();
        let mut svg = cdata.protect(content, &RE_CDATA, 0);
        svg = match tier {
            Tier::Minimal => minimal(svg, ops, opts),
            Tier::Moderate => moderate(svg, ops, opts),
            Tier::Aggressive => aggressive(svg, ops, opts),
        };
        Ok(cdata.restore(&svg))
    }
}

fn minimal(mut svg: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>) -> String {
    if opts.flag("removeComments") {
        svg = ops.apply(svg, op("remove_comments", Impact::Low), markup::remove_comments);
    }
    if opts.flag("collapseWhitespace") {
        svg = ops.apply(svg, op("collapse_whitespace", Impact::Low), markup::collapse_whitespace);
    }
    if opts.flag("removeDeclaration") {
        svg = ops.apply(svg, op("remove_xml_declaration", Impact::Low), markup::remove_declaration);
    }
    if opts.flag("removeDoctype") {
        svg = ops.apply(svg, op("remove_doctype", Impact::Low), markup::remove_doctype);
    }
    svg
}

fn moderate(svg: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>) -> String {
    let mut svg = minimal(svg, ops, opts);

    let passes: [(&str, &str, fn(&str) -> (String, usize)); 14] = [
        ("removeMetadata", "remove_metadata", |s| replace_counted(&RE_METADATA, s, "")),
        ("removeEmptyContainers", "remove_empty_containers", remove_empty_containers),
        ("removeDimensions", "remove_dimensions", remove_dimensions),
        ("removeHidden", "remove_hidden_elements", remove_hidden_elements),
        ("cleanupAttributes", "cleanup_attributes", cleanup_attributes),
        ("removeEmptyAttributes", "remove_empty_attributes", |s| replace_counted(&RE_EMPTY_ATTR, s, "")),
        ("collapseGroups", "collapse_groups", collapse_groups),
        ("convertEllipses", "convert_ellipses", convert_ellipses),
        ("removeUselessStrokeFill", "remove_useless_stroke_fill", remove_useless_stroke_fill),
        ("removeDefaults", "remove_default_values", remove_default_values),
        ("optimizePaths", "optimize_paths", |s| optimize_paths(s, 2)),
        ("roundCoordinates", "round_coordinates", |s| round_coordinates(s, 2)),
        ("shortenColors", "shorten_colors", shorten_colors),
        ("removeUnusedNamespaces", "remove_unused_namespaces", remove_unused_namespaces),
    ];
    for (option, kind, pass) in passes {
        if opts.flag(option) {
            svg = ops.apply(svg, op(kind, Impact::Medium), pass);
        }
    }
    svg
}

fn aggressive(svg: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>) -> String {
    let mut svg = moderate(svg, ops, opts);

    if opts.flag("simplifyPaths") {
        svg = ops.apply(svg, op("simplify_paths", Impact::High).with("decimals", 1), |s| optimize_paths(s, 1));
    }
    if opts.flag("removeTitleDesc") {
        svg = ops.apply(svg, op("remove_title_desc", Impact::High), remove_title_desc);
    }
    if opts.flag("removeUnusedIds") {
        svg = ops.apply(svg, op("remove_unused_ids", Impact::High), remove_unused_ids);
    }
    if opts.flag("removeIdentityTransforms") {
        svg = ops.apply(svg, op("remove_identity_transforms", Impact::High), |s| {
            replace_counted(&RE_IDENTITY_TRANSFORM, s, "")
        });
    }
    if opts.flag("minifyIds") {
        let (short, mapping, count) = minify_ids(&svg);
        if count > 0 && short.len() < svg.len() {
            ops.record(Operation::new("minify_ids", count, true, Impact::High).with("mapping", mapping));
            svg = short;
        }
    }
    svg
}

/// Drop containers with no children. Containers carrying an `id` may be
/// referenced and are kept.
pub fn remove_empty_containers(svg: &str) -> (String, usize) {
    let mut text = svg.to_string();
    let mut total = 0;
    loop {
        let (next, n) = replace_with(&RE_EMPTY_CONTAINER, &text, |caps| {
            let attrs = caps.get(2).map(|a| a.as_str()).unwrap_or("");
            let same = caps.get(3).map_or(true, |close| close.as_str() == &caps[1]);
            (same && find_attr(attrs, "id").is_none()).then(String::new)
        });
        if n == 0 {
            return (text, total);
        }
        text = next;
        total += n;
    }
}

fn strip_px(value: &str) -> &str {
    value.trim().trim_end_matches("px")
}

/// Drop `width`/`height` on the root when `viewBox="0 0 W H"` says the same.
pub fn remove_dimensions(svg: &str) -> (String, usize) {
    let mut removed = 0;
    let out = RE_SVG_ROOT
        .replace(svg, |caps: &Captures| {
            let tag = &caps[0];
            let Some(view_box) = attr(tag, "viewBox") else { return tag.to_string() };
            let parts: Vec<f64> = view_box.split([' ', ',']).filter(|p| !p.is_empty()).filter_map(parse_number).collect();
            let [x, y, w, h] = parts.as_slice() else { return tag.to_string() };
            if *x != 0.0 || *y != 0.0 {
                return tag.to_string();
            }
            let matches = |name: &str, expected: f64| {
                attr(tag, name).and_then(|v| parse_number(strip_px(v))).is_some_and(|v| v == expected)
            };
            if !(matches("width", *w) && matches("height", *h)) {
                return tag.to_string();
            }
            removed = 2;
            let without_width = remove_attr(tag, "width").unwrap_or_else(|| tag.to_string());
            remove_attr(&without_width, "height").unwrap_or(without_width)
        })
        .into_owned();
    (out, removed)
}

/// A property from the inline `style` attribute.
fn style_value<'a>(tag: &'a str, property: &str) -> Option<&'a str> {
    attr(tag, "style")?.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        (name.trim() == property).then(|| value.trim())
    })
}

fn is_zero(tag: &str, name: &str) -> bool {
    attr(tag, name).and_then(parse_number).is_some_and(|v| v == 0.0)
}

fn is_hidden(tag: &str) -> bool {
    let marked = HIDDEN_MARKERS.iter().any(|(name, value)| {
        style_value(tag, name).or_else(|| attr(tag, name)).is_some_and(|v| v.trim() == *value)
    });
    let name = tag_name(tag);
    marked
        || ZERO_SIZE
            .iter()
            .any(|(element, dims)| *element == name && dims.iter().any(|d| is_zero(tag, d)))
}

/// Remove elements that never render: `display:none`, `visibility:hidden`
/// or `opacity:0` (as attribute or inline style), and zero-size shapes.
pub fn remove_hidden_elements(svg: &str) -> (String, usize) {
    let mut out = String::with_capacity(svg.len());
    let mut count = 0;
    let mut pos = 0;
    while let Some(caps) = RE_START_TAG.captures_at(svg, pos) {
        let Some(m) = caps.get(0) else { break };
        let tag = m.as_str();
        if tag_name(tag) == "svg" || !is_hidden(tag) {
            out.push_str(&svg[pos..m.end()]);
            pos = m.end();
            continue;
        }
        let end = if is_self_closing(tag) { Some(m.end()) } else { element_end(svg, &caps[1], m.end()) };
        match end {
            Some(end) => {
                out.push_str(&svg[pos..m.start()]);
                pos = end;
                count += 1;
            }
            None => {
                out.push_str(&svg[pos..m.end()]);
                pos = m.end();
            }
        }
    }
    out.push_str(&svg[pos..]);
    (out, count)
}

/// Trim and squeeze whitespace inside attribute values.
pub fn cleanup_attributes(svg: &str) -> (String, usize) {
    for_each_tag(svg, |tag| {
        Some(replace_with(&RE_ATTR_VALUE, tag, |caps| {
            let cleaned = RE_INNER_WS.replace_all(caps[1].trim(), " ");
            (cleaned.len() < caps[1].len()).then(|| format!("=\"{cleaned}\""))
        }))
    })
}

/// Push a group's `fill`/`stroke`/`transform` down onto its only child.
/// The child's own paint wins; transforms compose with the group's first.
/// `None` when the group carries anything else.
fn hoist_into(child: &str, group_attrs: &str) -> Option<String> {
    if group_attrs.trim_end().ends_with('/') || !RE_ATTR_PAIR.replace_all(group_attrs, "").trim().is_empty() {
        return None;
    }
    let mut child = child.to_string();
    let mut extra = String::new();
    for caps in RE_ATTR_PAIR.captures_iter(group_attrs) {
        let name = &caps[1];
        if !HOISTABLE.contains(&name) {
            return None;
        }
        let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
        let existing = find_attr(&child, name).map(|a| (a.start, a.end, a.value.to_string()));
        match existing {
            None => extra.push_str(&format!(" {name}=\"{value}\"")),
            Some((start, end, own)) if name == "transform" => {
                child = format!("{} transform=\"{value} {own}\"{}", &child[..start], &child[end..]);
            }
            Some(_) => {}
        }
    }
    let head = child.trim_end_matches('>').trim_end_matches('/').trim_end();
    Some(format!("{head}{extra}/>"))
}

/// `<g fill="red"><path/></g>` → `<path fill="red"/>` for groups with a
/// single self-closing child. Runs until nested groups are gone too.
pub fn collapse_groups(svg: &str) -> (String, usize) {
    let mut text = svg.to_string();
    let mut total = 0;
    loop {
        let (next, n) = replace_with(&RE_SINGLE_CHILD_GROUP, &text, |caps| {
            hoist_into(&caps[2], caps.get(1).map_or("", |m| m.as_str()))
        });
        if n == 0 {
            return (text, total);
        }
        text = next;
        total += n;
    }
}

/// Ellipses with `rx == ry` become circles.
pub fn convert_ellipses(svg: &str) -> (String, usize) {
    replace_with(&RE_ELLIPSE, svg, |caps| {
        let tag = &caps[0];
        let rx = attr(tag, "rx").and_then(parse_number)?;
        let ry = attr(tag, "ry").and_then(parse_number)?;
        if rx != ry {
            return None;
        }
        let without_ry = remove_attr(tag, "ry")?;
        let rx_attr = find_attr(&without_ry, "rx")?;
        let circle = format!(
            "{} r=\"{}\"{}",
            &without_ry[..rx_attr.start],
            rx_attr.value,
            &without_ry[rx_attr.end..]
        );
        Some(circle.replacen("<ellipse", "<circle", 1))
    })
}

/// Elements painted with neither fill nor stroke are dropped; `stroke-*`
/// attributes go when the stroke itself is off. Stroke attributes on
/// elements that never stroke, and inside `<clipPath>`, are removed.
pub fn remove_useless_stroke_fill(svg: &str) -> (String, usize) {
    let mut count = 0;
    let out = RE_START_TAG
        .replace_all(svg, |caps: &Captures| {
            let tag = &caps[0];
            if NON_STROKABLE.contains(&tag_name(tag)) {
                let (cleaned, n) = replace_counted(&RE_ANY_STROKE_ATTR, tag, "");
                count += n;
                return cleaned;
            }
            let stroke_off = attr(tag, "stroke").is_some_and(|v| v.trim() == "none")
                || attr(tag, "stroke-width").and_then(parse_number).is_some_and(|w| w == 0.0);
            let fill_off = attr(tag, "fill").is_some_and(|v| v.trim() == "none");
            if stroke_off && fill_off && is_self_closing(tag) && tag_name(tag) != "svg" {
                count += 1;
                return String::new();
            }
            if stroke_off && attr(tag, "stroke").is_some_and(|v| v.trim() == "none") {
                let (cleaned, n) = replace_counted(&RE_STROKE_ATTR, tag, "");
                count += n;
                return cleaned;
            }
            tag.to_string()
        })
        .into_owned();
    let out = RE_CLIP_PATH
        .replace_all(&out, |caps: &Captures| {
            let (cleaned, n) = replace_counted(&RE_ANY_STROKE_ATTR, &caps[0], "");
            count += n;
            cleaned
        })
        .into_owned();
    (out, count)
}

pub fn remove_default_values(svg: &str) -> (String, usize) {
    for_each_tag(svg, |tag| {
        let mut current = tag.to_string();
        let mut removed = 0;
        for (name, defaults) in DEFAULT_VALUES {
            let is_default = attr(&current, name).is_some_and(|v| defaults.contains(&v.trim().to_ascii_lowercase().as_str()));
            if is_default {
                if let Some(next) = remove_attr(&current, name) {
                    current = next;
                    removed += 1;
                }
            }
        }
        Some((current, removed))
    })
}

fn compact_number(text: &str, decimals: usize) -> String {
    match parse_number(text) {
        Some(n) if !text.contains(['e', 'E']) => strip_leading_zero(&round_str(n, decimals)),
        _ => text.to_string(),
    }
}

/// Re-serialize path data: rounded numbers, no leading zeros, no spaces
/// around command letters or before negative numbers.
pub fn compact_path(data: &str, decimals: usize) -> String {
    let mut out = String::with_capacity(data.len());
    let mut prev_number: Option<String> = None;
    for token in RE_PATH_TOKEN.find_iter(data) {
        let t = token.as_str();
        if t.starts_with(|c: char| c.is_ascii_alphabetic()) && !t.starts_with(['e', 'E']) {
            out.push_str(t);
            prev_number = None;
            continue;
        }
        let number = compact_number(t, decimals);
        if let Some(prev) = &prev_number {
            let joins = number.starts_with('-') || (number.starts_with('.') && prev.contains(['.', 'e', 'E']));
            if !joins {
                out.push(' ');
            }
        }
        out.push_str(&number);
        prev_number = Some(number);
    }
    out
}

pub fn optimize_paths(svg: &str, decimals: usize) -> (String, usize) {
    replace_with(&RE_PATH_DATA, svg, |caps| {
        let compact = compact_path(&caps[2], decimals);
        (compact.len() < caps[2].len()).then(|| format!("{}{compact}{}", &caps[1], &caps[3]))
    })
}

/// Round decimals in geometry attributes, `points` and `viewBox`.
pub fn round_coordinates(svg: &str, decimals: usize) -> (String, usize) {
    let mut count = 0;
    let out = RE_COORD_ATTR
        .replace_all(svg, |caps: &Captures| {
            let (value, n) = replace_with(&RE_DECIMAL, &caps[2], |num| {
                let rounded = strip_leading_zero(&round_str(parse_number(&num[0])?, decimals));
                (rounded.len() < num[0].len()).then_some(rounded)
            });
            count += n;
            format!("{}{value}{}", &caps[1], &caps[3])
        })
        .into_owned();
    (out, count)
}

fn expand_hex(hex: &str) -> String {
    let digits = hex.trim_start_matches('#').to_ascii_lowercase();
    if digits.len() == 3 {
        digits.chars().flat_map(|c| [c, c]).collect()
    } else {
        digits
    }
}

/// Shortest spelling of a color among its name, `#rgb` and `#rrggbb`.
pub fn shortest_color(value: &str) -> Option<String> {
    let lower = value.to_ascii_lowercase();
    let hex6 = if lower.starts_with('#') {
        expand_hex(&lower)
    } else {
        NAMED_COLORS.iter().find(|(name, _)| *name == lower)?.1.trim_start_matches('#').to_string()
    };
    let b = hex6.as_bytes();
    if b.len() != 6 {
        return None;
    }
    let mut best = if b[0] == b[1] && b[2] == b[3] && b[4] == b[5] {
        format!("#{}{}{}", b[0] as char, b[2] as char, b[4] as char)
    } else {
        format!("#{hex6}")
    };
    if let Some((name, _)) = NAMED_COLORS.iter().find(|(_, hex)| hex.trim_start_matches('#') == hex6) {
        if name.len() < best.len() {
            best = name.to_string();
        }
    }
    (best.len() < value.len()).then_some(best)
}

pub fn shorten_colors(svg: &str) -> (String, usize) {
    replace_with(&RE_COLOR, svg, |caps| {
        let short = shortest_color(&caps[3])?;
        Some(format!("{}{}{short}", &caps[1], &caps[2]))
    })
}

/// Remove `xmlns:prefix` declarations whose prefix is never used.
pub fn remove_unused_namespaces(svg: &str) -> (String, usize) {
    let declared: Vec<String> = RE_NS_DECL.captures_iter(svg).map(|c| c[1].to_string()).collect();
    let unused: HashSet<String> = declared
        .into_iter()
        .filter(|prefix| !svg.contains(&format!("{prefix}:")))
        .collect();
    if unused.is_empty() {
        return (svg.to_string(), 0);
    }
    replace_with(&RE_NS_DECL, svg, |caps| unused.contains(&caps[1]).then(String::new))
}

pub fn remove_title_desc(svg: &str) -> (String, usize) {
    replace_with(&RE_TITLE_DESC, svg, |caps| match (caps.get(1), caps.get(2)) {
        (Some(open), Some(close)) if open.as_str() != close.as_str() => None,
        _ => Some(String::new()),
    })
}

fn referenced_ids(svg: &str) -> HashSet<String> {
    RE_REFERENCE.captures_iter(svg).map(|c| c[2].to_string()).collect()
}

/// Drop `id` attributes nothing points at via `url(#id)` or `href="#id"`.
pub fn remove_unused_ids(svg: &str) -> (String, usize) {
    let referenced = referenced_ids(svg);
    replace_with(&RE_ID_ATTR, svg, |caps| (!referenced.contains(&caps[1])).then(String::new))
}

/// Rename every id to a short letter name and rewrite its references.
pub fn minify_ids(svg: &str) -> (String, Map<String, Value>, usize) {
    let mut order: Vec<String> = Vec::new();
    for caps in RE_ID_ATTR.captures_iter(svg) {
        let id = caps[1].to_string();
        if id.len() > 1 && !order.contains(&id) {
            order.push(id);
        }
    }
    if order.is_empty() {
        return (svg.to_string(), Map::new(), 0);
    }
    let taken: HashSet<String> = RE_ID_ATTR.captures_iter(svg).map(|c| c[1].to_string()).collect();
    let mut names = NameAllocator::new(letter_name, taken);
    let renames: HashMap<String, String> = order.iter().map(|id| (id.clone(), names.next_name())).collect();

    let (with_ids, n) = replace_with(&RE_ID_ATTR, svg, |caps| {
        renames.get(&caps[1]).map(|short| format!(" id=\"{short}\""))
    });
    let (out, m) = replace_with(&RE_REFERENCE, &with_ids, |caps| {
        renames.get(&caps[2]).map(|short| format!("{}{short}", &caps[1]))
    });
    let mapping: Map<String, Value> = order
        .iter()
        .filter_map(|id| Some((id.clone(), Value::String(renames.get(id)?.clone()))))
        .collect();
    (out, mapping, n + m)
}
