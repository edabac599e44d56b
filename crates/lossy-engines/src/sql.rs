//! SQL engine. Quoted literals and quoted identifiers are protected, so
//! `;` and keywords inside them are never seen by the statement passes.

use lossy_core::{FileType, Impact, Operation, ResolvedOptions, Result, Tier};
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::names::{letter_name, NameAllocator};
use crate::pipeline::{op, Engine, OpLog};
use crate::protect::Protected;
use crate::rewrite::{char_before, matching_close, replace_counted, replace_with};

const KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "AND", "OR", "NOT", "IN", "IS", "NULL", "AS", "ON", "JOIN", "LEFT", "RIGHT", "INNER",
    "OUTER", "FULL", "CROSS", "GROUP", "BY", "ORDER", "HAVING", "LIMIT", "OFFSET", "INSERT", "INTO", "VALUES",
    "UPDATE", "SET", "DELETE", "CREATE", "TABLE", "ALTER", "DROP", "INDEX", "VIEW", "PRIMARY", "KEY", "FOREIGN",
    "REFERENCES", "UNIQUE", "CHECK", "DEFAULT", "CONSTRAINT", "DISTINCT", "UNION", "ALL", "EXISTS", "BETWEEN",
    "LIKE", "CASE", "WHEN", "THEN", "ELSE", "END", "ASC", "DESC", "BEGIN", "COMMIT", "ROLLBACK", "TRANSACTION",
    "CASCADE", "EXPLAIN", "ANALYZE", "WITH", "COUNT", "SUM", "AVG", "MIN", "MAX", "INTEGER", "INT", "VARCHAR",
    "TEXT", "BOOLEAN", "DATE", "TIMESTAMP", "IF", "TRUNCATE", "RETURNING", "USING", "TRUE", "FALSE",
];
const DDL_HEADS: &[&str] = &["CREATE", "ALTER", "DROP", "TRUNCATE", "RENAME", "COMMENT"];
const DML_HEADS: &[&str] = &["SELECT", "INSERT", "UPDATE", "DELETE", "WITH", "MERGE"];
const TRANSACTION_HEADS: &[&str] = &["BEGIN", "COMMIT", "ROLLBACK", "START", "END", "SAVEPOINT", "RELEASE"];

static RE_TOKENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"--[^\n]*|/\*[\s\S]*?\*/|'(?:[^']|'')*'|"(?:[^"]|"")*""#).unwrap());
static RE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"--[^\n]*|/\*[\s\S]*?\*/").unwrap());
static RE_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}|[\t\r\n]").unwrap());
static RE_PUNCT_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*([,;()=])\s*").unwrap());
static RE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = KEYWORDS.join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).unwrap()
});
static RE_EXPLAIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bEXPLAIN\s+(?:ANALYZE\s+)?").unwrap());
static RE_ALIAS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bAS\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap());
static RE_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap());
static RE_OUTER_JOIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(LEFT|RIGHT|FULL)\s+OUTER\s+(JOIN)\b").unwrap());
static RE_INNER_JOIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bINNER\s+(JOIN)\b").unwrap());
static RE_SCHEMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(?:public|dbo)\.").unwrap());
static RE_CASCADE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s*\bCASCADE\b\s*(;|$)").unwrap());
static RE_INSERT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*(INSERT\s+INTO\s+([^\s(]+)\s*(\([^)]*\))?\s*VALUES)\s*(.+?)\s*$").unwrap()
});
static RE_TABLE_CONSTRAINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i),\s*(?:CONSTRAINT\s+\w+\s+)?(?:PRIMARY\s+KEY|FOREIGN\s+KEY|UNIQUE|CHECK)\s*\([^)]*\)(?:\s*REFERENCES\s+[^\s(]+\s*\([^)]*\))?(?:\s+ON\s+(?:DELETE|UPDATE)\s+(?:CASCADE|SET\s+NULL|RESTRICT|NO\s+ACTION))*",
    )
    .unwrap()
});
static RE_INLINE_CONSTRAINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(?:NOT\s+NULL|PRIMARY\s+KEY|UNIQUE|REFERENCES\s+[^\s(]+\s*\([^)]*\))").unwrap()
});

pub struct SqlEngine;

impl Engine for SqlEngine {
    fn file_type(&self) -> FileType {
        FileType::Sql
    }

    fn run(&self, content: &str, tier: Tier, opts: &ResolvedOptions<'_>, ops: &mut OpLog) -> Result<String> {
        let mut literals = Protected::new();
        let mut sql = literals.protect_if(content, &RE_TOKENS, |tok| tok.starts_with(['\'', '"']));
        sql = match tier {
            Tier::Minimal => minimal(sql, ops, opts),
            Tier::Moderate => moderate(sql, ops, opts),
            Tier::Aggressive => aggressive(sql, ops, opts),
        };
        Ok(literals.restore(&sql))
    }
}

fn minimal(mut sql: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>) -> String {
    if opts.flag("removeComments") {
        sql = ops.apply(sql, op("remove_comments", Impact::Low), remove_comments);
    }
    if opts.flag("collapseWhitespace") {
        sql = ops.apply(sql, op("collapse_whitespace", Impact::Low), collapse_whitespace);
    }
    sql
}

fn moderate(sql: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>) -> String {
    let mut sql = minimal(sql, ops, opts);

    if opts.flag("lowercaseKeywords") {
        sql = ops.apply_counted(sql, op("lowercase_keywords", Impact::Medium), lowercase_keywords);
    }
    if opts.flag("removeExplain") {
        sql = ops.apply(sql, op("remove_explain", Impact::Medium), |s| replace_counted(&RE_EXPLAIN, s, ""));
    }
    if opts.flag("shortenAliases") {
        let (short, mapping, count) = shorten_aliases(&sql);
        if count > 0 && short.len() < sql.len() {
            ops.record(Operation::new("shorten_aliases", count, true, Impact::Medium).with("mapping", mapping));
            sql = short;
        }
    }
    if opts.flag("simplifyJoins") {
        sql = ops.apply(sql, op("simplify_joins", Impact::Medium), |s| {
            let (a, n) = replace_counted(&RE_OUTER_JOIN, s, "$1 $2");
            let (b, m) = replace_counted(&RE_INNER_JOIN, &a, "$1");
            (b, n + m)
        });
    }
    if opts.flag("removeSchemaPrefix") {
        sql = ops.apply(sql, op("remove_schema_prefix", Impact::Medium), |s| replace_counted(&RE_SCHEMA, s, ""));
    }
    if opts.flag("removeCascade") {
        sql = ops.apply(sql, op("remove_cascade", Impact::Medium), |s| replace_counted(&RE_CASCADE, s, "$1"));
    }
    if opts.flag("combineInserts") {
        sql = ops.apply(sql, op("combine_inserts", Impact::Medium), combine_inserts);
    }
    sql
}

fn aggressive(sql: String, ops: &mut OpLog, opts: &ResolvedOptions<'_>) -> String {
    let mut sql = moderate(sql, ops, opts);

    if opts.flag("removeDdl") {
        sql = ops.apply(sql, op("remove_ddl", Impact::High), |s| filter_statements(s, |h| DDL_HEADS.contains(&h)));
    }
    if opts.flag("keepOnlyDml") {
        sql = ops.apply(sql, op("keep_dml", Impact::High), |s| filter_statements(s, |h| !DML_HEADS.contains(&h)));
    }
    if opts.flag("removeTransactions") {
        sql = ops.apply(sql, op("remove_transactions", Impact::High), |s| {
            filter_statements(s, |h| TRANSACTION_HEADS.contains(&h))
        });
    }
    if opts.flag("removeConstraints") {
        sql = ops.apply(sql, op("remove_constraints", Impact::High), remove_constraints);
    }
    if opts.flag("sampleInserts") {
        let interval = opts.count_or("sampleInterval", 2).max(1);
        sql = ops.apply(sql, op("sample_inserts", Impact::High).with("sampleRate", interval), |s| {
            sample_inserts(s, interval)
        });
    }
    sql
}

pub fn remove_comments(sql: &str) -> (String, usize) {
    let mut count = 0;
    let out = RE_COMMENT
        .replace_all(sql, |caps: &Captures| {
            count += 1;
            if caps[0].starts_with("/*") { " " } else { "" }
        })
        .into_owned();
    (out, count)
}

pub fn collapse_whitespace(sql: &str) -> (String, usize) {
    let (a, n) = replace_counted(&RE_WS, sql, " ");
    let (b, m) = replace_counted(&RE_PUNCT_SPACE, &a, "$1");
    (b.trim().to_string(), n + m)
}

/// Count-only: the text keeps its length.
pub fn lowercase_keywords(sql: &str) -> (String, usize) {
    replace_with(&RE_KEYWORD, sql, |caps| {
        let lower = caps[0].to_ascii_lowercase();
        (lower != caps[0]).then_some(lower)
    })
}

/// Replace `AS alias` names longer than two characters with short letter
/// names, everywhere the alias appears as a whole word.
pub fn shorten_aliases(sql: &str) -> (String, Map<String, Value>, usize) {
    let mut aliases: Vec<String> = Vec::new();
    for caps in RE_ALIAS.captures_iter(sql) {
        let alias = caps[1].to_string();
        let is_keyword = KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(&alias));
        if alias.len() > 2 && !is_keyword && !aliases.contains(&alias) {
            aliases.push(alias);
        }
    }
    if aliases.is_empty() {
        return (sql.to_string(), Map::new(), 0);
    }

    let mut taken: HashSet<String> = RE_WORD.find_iter(sql).map(|m| m.as_str().to_ascii_lowercase()).collect();
    taken.extend(KEYWORDS.iter().map(|k| k.to_ascii_lowercase()));
    let mut names = NameAllocator::new(letter_name, taken);
    let renames: HashMap<String, String> = aliases.iter().map(|a| (a.clone(), names.next_name())).collect();

    let mut count = 0;
    let out = RE_WORD
        .replace_all(sql, |caps: &Captures| {
            let word = &caps[0];
            let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
            match renames.get(word) {
                Some(short) if char_before(sql, start) != Some('.') => {
                    count += 1;
                    short.clone()
                }
                _ => word.to_string(),
            }
        })
        .into_owned();
    let mapping: Map<String, Value> = aliases
        .iter()
        .filter_map(|a| Some((a.clone(), Value::String(renames.get(a)?.clone()))))
        .collect();
    (out, mapping, count)
}

/// First keyword of a statement, uppercased.
fn head(statement: &str) -> String {
    statement.split_whitespace().next().unwrap_or("").to_ascii_uppercase()
}

/// Drop statements whose head keyword matches `drop`.
pub fn filter_statements<F>(sql: &str, drop: F) -> (String, usize)
where
    F: Fn(&str) -> bool,
{
    let mut kept = Vec::new();
    let mut removed = 0;
    for stmt in sql.split(';') {
        let trimmed = stmt.trim();
        if trimmed.is_empty() {
            continue;
        }
        if drop(head(trimmed).as_str()) {
            removed += 1;
        } else {
            kept.push(trimmed);
        }
    }
    if removed == 0 {
        return (sql.to_string(), 0);
    }
    let mut out = kept.join(";");
    if !out.is_empty() && sql.trim_end().ends_with(';') {
        out.push(';');
    }
    (out, removed)
}

struct Insert {
    prefix: String,
    key: String,
    values: String,
}

fn parse_insert(stmt: &str) -> Option<Insert> {
    let caps = RE_INSERT.captures(stmt)?;
    let table = caps[2].to_ascii_lowercase();
    let columns: String = caps.get(3).map(|c| c.as_str()).unwrap_or("").split_whitespace().collect();
    Some(Insert { prefix: caps[1].trim().to_string(), key: format!("{table}{columns}"), values: caps[4].to_string() })
}

/// Merge runs of INSERTs into the same table and column list into one
/// multi-row INSERT.
pub fn combine_inserts(sql: &str) -> (String, usize) {
    let mut out: Vec<(String, Option<String>)> = Vec::new();
    let mut merged = 0;
    for stmt in sql.split(';') {
        let insert = parse_insert(stmt);
        if let (Some(ins), Some((last, Some(key)))) = (&insert, out.last_mut()) {
            if *key == ins.key {
                last.push(',');
                last.push_str(&ins.values);
                merged += 1;
                continue;
            }
        }
        match insert {
            Some(ins) => out.push((stmt.trim_end().to_string(), Some(ins.key))),
            None => out.push((stmt.to_string(), None)),
        }
    }
    if merged == 0 {
        return (sql.to_string(), 0);
    }
    let joined = out.into_iter().map(|(s, _)| s).collect::<Vec<_>>().join(";");
    (joined, merged)
}

pub fn remove_constraints(sql: &str) -> (String, usize) {
    let mut count = 0;
    let out = sql
        .split(';')
        .map(|stmt| {
            if !stmt.trim_start().to_ascii_uppercase().starts_with("CREATE TABLE") {
                return stmt.to_string();
            }
            let (a, n) = replace_counted(&RE_TABLE_CONSTRAINT, stmt, "");
            let (b, m) = replace_counted(&RE_INLINE_CONSTRAINT, &a, "");
            count += n + m;
            b
        })
        .collect::<Vec<_>>()
        .join(";");
    (out, count)
}

/// Top-level `( ... )` groups of a VALUES list.
fn tuples(values: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(rel) = values[pos..].find('(') {
        let open = pos + rel;
        let Some(close) = matching_close(values, open, b'(', b')') else { break };
        found.push(&values[open..close]);
        pos = close;
    }
    found
}

/// Keep every `interval`-th row of multi-row INSERTs.
pub fn sample_inserts(sql: &str, interval: usize) -> (String, usize) {
    let mut removed = 0;
    let out = sql
        .split(';')
        .map(|stmt| {
            let Some(ins) = parse_insert(stmt) else { return stmt.to_string() };
            let rows = tuples(&ins.values);
            if rows.len() < 2 {
                return stmt.to_string();
            }
            let kept: Vec<&str> = rows.iter().copied().step_by(interval).collect();
            removed += rows.len() - kept.len();
            format!("{} {}", ins.prefix, kept.join(","))
        })
        .collect::<Vec<_>>()
        .join(";");
    (out, removed)
}
