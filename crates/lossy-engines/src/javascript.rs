//! JavaScript engine: token-level regex rewriting with string literals
//! held behind placeholders.

use lossy_core::{FileType, Impact, Operation, ResolvedOptions, Result, Tier};
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::names::{letter_name, NameAllocator};
use crate::pipeline::{op, Engine, OpLog};
use crate::protect::Protected;
use crate::rewrite::{char_before, collapse_lines, matching_close, prev_non_space, replace_counted, replace_with};

static RE_TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"//[^\n]*|/\*[\s\S]*?\*/|"(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*'|`(?:[^`\\]|\\[\s\S])*`"#).unwrap()
});
static RE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"//[^\n]*|/\*[\s\S]*?\*/").unwrap());
static RE_PUNCT_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]*([{}()\[\];,:])[ \t]*").unwrap());
static RE_CONSOLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bconsole\s*\.\s*(?:log|warn|error|info|debug|trace|dir|table|time|timeEnd|group|groupEnd|assert|count)\s*\(").unwrap()
});
static RE_DEBUGGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bdebugger\b[ \t]*;?").unwrap());
static RE_OPERATOR_SPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[ \t]*(===|!==|==|!=|<=|>=|&&|\|\||\?\?|=>|\+=|-=|\*=|%=|=|<|>|\*|%|&|\||\^|\?|!)[ \t]*").unwrap()
});
static RE_BREAK_AFTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([;{},(])\n+").unwrap());
static RE_BREAK_BEFORE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n+([})\],;])").unwrap());
static RE_SEMI_BRACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r";\s*\}").unwrap());
static RE_BOOLEAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(true|false)\b").unwrap());
static RE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d+)(?:\.(\d+))?\b").unwrap());
static RE_SPECIAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(undefined|Infinity)\b").unwrap());
static RE_DEAD_IF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bif\s*\(\s*(?:!1|false|0)\s*\)\s*\{").unwrap());
static RE_ELSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*else\b\s*").unwrap());
static RE_DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:const|let|var)\s+([A-Za-z_$][A-Za-z0-9_$]*)").unwrap());
static RE_IDENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z_$][A-Za-z0-9_$]*").unwrap());

const RESERVED: &[&str] = &[
    "as", "do", "if", "in", "is", "of", "to", "for", "let", "new", "try", "var", "case", "else", "enum", "eval",
    "null", "this", "true", "void", "with", "await", "break", "catch", "class", "const", "false", "super", "throw",
    "while", "yield", "delete", "export", "import", "public", "return", "static", "switch", "typeof", "default",
    "extends", "finally", "package", "private", "continue", "debugger", "function", "arguments", "interface",
    "protected", "implements", "instanceof", "undefined", "NaN", "Infinity",
];

pub struct JavaScriptEngine;

impl Engine for JavaScriptEngine {
    fn file_type(&self) -> FileType {
        FileType::JavaScript
    }

    fn run(&self, content: &str, tier: Tier, opts: &ResolvedOptions<'_>, ops: &mut OpLog) -> Result<String> {
        let mut literals = Protected::new();
        let mut code = literals.protect_if(content, &RE_TOKENS, |tok| !tok.starts_with('/'));
        code = match tier {
            Tier::Minimal => minimal(code, ops, opts),
            Tier::Moderate => moderate(code, ops, opts),
            Tier::Aggressive => aggressive(code, ops, opts, &mut literals),
        };
        Ok(literals.restore(&code))
    }
}

fn minimal(mut code: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>) -> String {
    if opts.flag("removeComments") {
        code = ops.apply(code, op("remove_comments", Impact::Low), remove_comments);
    }
    if opts.flag("collapseWhitespace") {
        code = ops.apply(code, op("collapse_whitespace", Impact::Low), collapse_lines);
        code = ops.apply(code, op("trim_punctuation_spacing", Impact::Low), |c| replace_counted(&RE_PUNCT_SPACE, c, "$1"));
    }
    code
}

fn moderate(code: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>) -> String {
    let mut code = minimal(code, ops, opts);

    if opts.flag("removeConsole") {
        code = ops.apply(code, op("remove_console", Impact::Medium), remove_console);
    }
    if opts.flag("removeDebugger") {
        code = ops.apply(code, op("remove_debugger", Impact::Medium), |c| replace_counted(&RE_DEBUGGER, c, ""));
    }
    if opts.flag("collapseWhitespace") {
        code = ops.apply(code, op("collapse_operator_spacing", Impact::Medium), |c| {
            replace_counted(&RE_OPERATOR_SPACE, c, "$1")
        });
        code = ops.apply(code, op("remove_line_breaks", Impact::Medium), |c| {
            let (after, n) = replace_counted(&RE_BREAK_AFTER, c, "$1");
            let (before, m) = replace_counted(&RE_BREAK_BEFORE, &after, "$1");
            (before, n + m)
        });
    }
    if opts.flag("removeSemicolons") {
        code = ops.apply(code, op("remove_redundant_semicolons", Impact::Medium), |c| {
            replace_counted(&RE_SEMI_BRACE, c, "}")
        });
    }
    if opts.flag("shortenLiterals") {
        code = ops.apply(code, op("shorten_booleans", Impact::Medium), shorten_booleans);
        code = ops.apply(code, op("shorten_numbers", Impact::Medium), shorten_numbers);
        code = ops.apply(code, op("shorten_special_values", Impact::Medium), shorten_special_values);
    }
    code
}

fn aggressive(code: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>, literals: &mut Protected) -> String {
    let mut code = moderate(code, ops, opts);

    if opts.flag("removeDeadCode") {
        code = ops.apply(code, op("remove_dead_code", Impact::High), remove_dead_code);
    }
    if opts.flag("mangleNames") {
        let mangled = mangle_identifiers(&code, literals);
        if mangled.count > 0 && mangled.code.len() < code.len() {
            ops.record(Operation::new("mangle_identifiers", mangled.count, true, Impact::High).with("mapping", mangled.mapping));
            for (slot, template) in mangled.templates {
                literals.replace_span(slot, template);
            }
            code = mangled.code;
        }
    }
    code
}

/// Line comments vanish; block comments leave one space so tokens on either
/// side stay apart.
pub fn remove_comments(code: &str) -> (String, usize) {
    let mut count = 0;
    let out = RE_COMMENT
        .replace_all(code, |caps: &Captures| {
            count += 1;
            if caps[0].starts_with("/*") && !caps[0].contains('\n') { " " } else { "" }
        })
        .into_owned();
    (out, count)
}

/// Drop `console.*(...)` calls, arguments included, with a trailing `;`.
pub fn remove_console(code: &str) -> (String, usize) {
    let mut out = String::with_capacity(code.len());
    let mut count = 0;
    let mut pos = 0;
    while let Some(m) = RE_CONSOLE.find_at(code, pos) {
        let open = m.end() - 1;
        let Some(mut end) = matching_close(code, open, b'(', b')') else { break };
        if code[end..].starts_with(';') {
            end += 1;
        }
        out.push_str(&code[pos..m.start()]);
        pos = end;
        count += 1;
    }
    out.push_str(&code[pos..]);
    (out, count)
}

pub fn shorten_booleans(code: &str) -> (String, usize) {
    replace_with(&RE_BOOLEAN, code, |caps| {
        let m = caps.get(0)?;
        if matches!(char_before(code, m.start()), Some('.' | '$')) {
            return None;
        }
        Some(if m.as_str() == "true" { "!0" } else { "!1" }.to_string())
    })
}

/// `1.50` → `1.5`, `0.5` → `.5`, `2.0` → `2`, `25000` → `25e3`.
pub fn shorten_numbers(code: &str) -> (String, usize) {
    replace_with(&RE_NUMBER, code, |caps| {
        let m = caps.get(0)?;
        if matches!(char_before(code, m.start()), Some('.' | '$')) {
            return None;
        }
        let int = &caps[1];
        if int.len() > 1 && int.starts_with('0') {
            return None;
        }
        match caps.get(2) {
            Some(frac) => {
                let frac = frac.as_str().trim_end_matches('0');
                Some(match (int, frac.is_empty()) {
                    (_, true) => int.to_string(),
                    ("0", false) => format!(".{frac}"),
                    _ => format!("{int}.{frac}"),
                })
            }
            None => {
                let digits = int.trim_end_matches('0');
                let zeros = int.len() - digits.len();
                (zeros >= 3 && !digits.is_empty()).then(|| format!("{digits}e{zeros}"))
            }
        }
    })
}

pub fn shorten_special_values(code: &str) -> (String, usize) {
    replace_with(&RE_SPECIAL, code, |caps| {
        let m = caps.get(0)?;
        if matches!(char_before(code, m.start()), Some('.' | '$')) {
            return None;
        }
        match m.as_str() {
            "undefined" => Some("void 0".to_string()),
            _ if matches!(prev_non_space(code, m.start()), Some('/' | '*' | '%')) => None,
            _ => Some("1/0".to_string()),
        }
    })
}

/// Remove `if (false) { ... }` style blocks. A directly following `else`
/// keyword goes too, leaving its body to run unconditionally.
pub fn remove_dead_code(code: &str) -> (String, usize) {
    let mut out = String::with_capacity(code.len());
    let mut count = 0;
    let mut pos = 0;
    while let Some(m) = RE_DEAD_IF.find_at(code, pos) {
        let Some(mut end) = matching_close(code, m.end() - 1, b'{', b'}') else { break };
        if let Some(e) = RE_ELSE.find(&code[end..]) {
            end += e.end();
        }
        out.push_str(&code[pos..m.start()]);
        pos = end;
        count += 1;
    }
    out.push_str(&code[pos..]);
    (out, count)
}

fn is_object_key(code: &str, start: usize, end: usize) -> bool {
    code[end..].trim_start().starts_with(':') && matches!(prev_non_space(code, start), Some('{' | ','))
}

/// Byte ranges of the `${...}` expressions inside a template literal.
fn interpolations(template: &str) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut pos = 0;
    while let Some(rel) = template[pos..].find("${") {
        let open = pos + rel + 1;
        let Some(close) = matching_close(template, open, b'{', b'}') else { break };
        ranges.push((open + 1, close - 1));
        pos = close;
    }
    ranges
}

fn is_template(span: &str) -> bool {
    span.starts_with('`')
}

fn rename_idents(code: &str, renames: &HashMap<String, String>) -> (String, usize) {
    let mut count = 0;
    let out = RE_IDENT
        .replace_all(code, |caps: &Captures| {
            let m = match caps.get(0) {
                Some(m) => m,
                None => return String::new(),
            };
            match renames.get(m.as_str()) {
                Some(short)
                    if char_before(code, m.start()) != Some('.') && !is_object_key(code, m.start(), m.end()) =>
                {
                    count += 1;
                    short.clone()
                }
                _ => m.as_str().to_string(),
            }
        })
        .into_owned();
    (out, count)
}

fn rename_in_template(template: &str, renames: &HashMap<String, String>) -> (String, usize) {
    let mut out = String::with_capacity(template.len());
    let mut count = 0;
    let mut pos = 0;
    for (start, end) in interpolations(template) {
        out.push_str(&template[pos..start]);
        let (expr, n) = rename_idents(&template[start..end], renames);
        out.push_str(&expr);
        count += n;
        pos = end;
    }
    out.push_str(&template[pos..]);
    (out, count)
}

#[derive(Debug, Default)]
pub struct Mangled {
    pub code: String,
    /// Rewritten template literals, by protected slot.
    pub templates: Vec<(usize, String)>,
    pub mapping: Map<String, Value>,
    pub count: usize,
}

/// Rename `const`/`let`/`var` bindings longer than two characters. Property
/// accesses and object keys keep their names; `${...}` expressions inside
/// protected template literals are renamed along with the code.
pub fn mangle_identifiers(code: &str, literals: &Protected) -> Mangled {
    let mut declared: Vec<String> = Vec::new();
    for caps in RE_DECLARATION.captures_iter(code) {
        let name = caps[1].to_string();
        if name.len() > 2 && !declared.contains(&name) && !RESERVED.contains(&name.as_str()) {
            declared.push(name);
        }
    }
    if declared.is_empty() {
        return Mangled { code: code.to_string(), ..Mangled::default() };
    }

    let mut taken: HashSet<String> = RE_IDENT.find_iter(code).map(|m| m.as_str().to_string()).collect();
    for template in literals.spans().iter().filter(|s| is_template(s)) {
        for (start, end) in interpolations(template) {
            taken.extend(RE_IDENT.find_iter(&template[start..end]).map(|m| m.as_str().to_string()));
        }
    }
    taken.extend(RESERVED.iter().map(|r| r.to_string()));
    let mut names = NameAllocator::new(letter_name, taken);
    let renames: HashMap<String, String> = declared.iter().map(|d| (d.clone(), names.next_name())).collect();

    let (out, mut count) = rename_idents(code, &renames);
    let mut templates = Vec::new();
    for (slot, span) in literals.spans().iter().enumerate().filter(|(_, s)| is_template(s)) {
        let (renamed, n) = rename_in_template(span, &renames);
        if n > 0 {
            templates.push((slot, renamed));
            count += n;
        }
    }
    let mapping: Map<String, Value> = declared
        .iter()
        .filter_map(|d| Some((d.clone(), Value::String(renames.get(d)?.clone()))))
        .collect();
    Mangled { code: out, templates, mapping, count }
}
