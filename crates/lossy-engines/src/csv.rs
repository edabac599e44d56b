//! CSV engine: a naive comma-split table with row and column passes.
//!
//! No quoting support; `a,"b,c"` is three fields.

use lossy_core::{CompressError, FileType, Impact, Operation, ResolvedOptions, Result, Tier};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::numeric::{mean_std, parse_number, round_str, round_to};
use crate::pipeline::{op, Engine, OpLog};
use crate::rewrite::truncate_chars;

pub const DELTA_SUFFIX: &str = "(Δ)";
pub const DICTIONARY_SUFFIX: &str = "(D)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// First non-blank line is the header; every later line is a row.
    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = content.lines().skip_while(|l| l.trim().is_empty());
        let header = lines.next().ok_or_else(|| CompressError::empty_input("CSV"))?;
        Ok(Self {
            header: split(header),
            rows: lines.map(split).collect(),
        })
    }

    pub fn render(&self) -> String {
        let mut out = self.header.join(",");
        for row in &self.rows {
            out.push('\n');
            out.push_str(&row.join(","));
        }
        out
    }

    pub fn byte_len(&self) -> usize {
        let line = |r: &Vec<String>| r.iter().map(String::len).sum::<usize>() + r.len().saturating_sub(1);
        line(&self.header) + self.rows.iter().map(|r| line(r) + 1).sum::<usize>()
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }

    fn cell(row: &[String], c: usize) -> &str {
        row.get(c).map(String::as_str).unwrap_or("")
    }

    pub fn column(&self, c: usize) -> Vec<&str> {
        self.rows.iter().map(|r| Self::cell(r, c)).collect()
    }

    fn numeric_column(&self, c: usize) -> Option<Vec<f64>> {
        self.rows.iter().map(|r| parse_number(Self::cell(r, c))).collect()
    }

    /// Keep only the columns in `keep` (ascending indices).
    fn retain_columns(&mut self, keep: &[usize]) {
        let pick = |row: &Vec<String>| keep.iter().filter_map(|&c| row.get(c).cloned()).collect::<Vec<_>>();
        self.header = pick(&self.header);
        self.rows = self.rows.iter().map(pick).collect();
    }
}

fn split(line: &str) -> Vec<String> {
    line.split(',').map(str::to_string).collect()
}

pub struct CsvEngine;

impl Engine for CsvEngine {
    fn file_type(&self) -> FileType {
        FileType::Csv
    }

    fn run(&self, content: &str, tier: Tier, opts: &ResolvedOptions<'_>, ops: &mut OpLog) -> Result<String> {
        let mut table = Table::parse(content)?;
        match tier {
            Tier::Minimal => minimal(&mut table, ops, opts),
            Tier::Moderate => moderate(&mut table, ops, opts),
            Tier::Aggressive => aggressive(&mut table, ops, opts),
        }
        Ok(table.render())
    }
}

/// Run a pass on a copy; keep it when it did something and the table shrank.
fn shrink<F>(table: &mut Table, ops: &mut OpLog, f: F)
where
    F: FnOnce(&mut Table) -> Operation,
{
    let mut next = table.clone();
    let operation = f(&mut next);
    if operation.count > 0 && next.byte_len() < table.byte_len() {
        *table = next;
        ops.record(operation);
    }
}

/// Like [`shrink`] for encodings judged by count alone.
fn counted<F>(table: &mut Table, ops: &mut OpLog, f: F)
where
    F: FnOnce(&mut Table) -> Operation,
{
    let mut next = table.clone();
    let operation = f(&mut next);
    if ops.record(operation) {
        *table = next;
    }
}

fn minimal(table: &mut Table, ops: &mut OpLog, opts: &ResolvedOptions<'_>) {
    if opts.flag("removeEmptyRows") {
        shrink(table, ops, |t| op("remove_empty_rows", Impact::Low).counted(remove_empty_rows(t)));
    }
    if opts.flag("trimFields") {
        shrink(table, ops, |t| op("trim_fields", Impact::Low).counted(trim_fields(t)));
    }
}

fn moderate(table: &mut Table, ops: &mut OpLog, opts: &ResolvedOptions<'_>) {
    minimal(table, ops, opts);

    if opts.flag("removeDuplicateRows") {
        shrink(table, ops, |t| op("remove_duplicate_rows", Impact::Medium).counted(remove_duplicate_rows(t)));
    }
    if opts.flag("roundNumbers") {
        shrink(table, ops, |t| op("round_numbers", Impact::Medium).with("decimals", 2).counted(round_fields(t, 2)));
    }
    if opts.flag("deltaEncoding") {
        counted(table, ops, |t| {
            let columns = delta_encode(t);
            Operation::new("delta_encoding", columns.len(), true, Impact::Medium).with("columns", columns)
        });
    }
    if opts.flag("dictionaryEncoding") {
        counted(table, ops, |t| {
            let mapping = dictionary_encode(t);
            Operation::new("dictionary_encoding", mapping.len(), true, Impact::Medium).with("mapping", mapping)
        });
    }
    if opts.flag("removeConstantColumns") {
        shrink(table, ops, |t| op("remove_constant_columns", Impact::Medium).counted(remove_constant_columns(t)));
    }
    if opts.flag("truncateText") {
        let max = opts.count_or("maxTextLength", 50);
        shrink(table, ops, |t| op("truncate_text", Impact::Medium).with("maxLength", max).counted(truncate_text(t, max)));
    }
}

fn aggressive(table: &mut Table, ops: &mut OpLog, opts: &ResolvedOptions<'_>) {
    moderate(table, ops, opts);

    if opts.flag("limitColumns") {
        let max = opts.count_or("maxColumns", 10);
        shrink(table, ops, |t| op("limit_columns", Impact::High).with("maxColumns", max).counted(limit_columns(t, max)));
    }
    if opts.flag("sampleRows") {
        let interval = opts.count_or("sampleInterval", 2).max(1);
        shrink(table, ops, |t| op("sample_rows", Impact::High).with("sampleRate", interval).counted(sample_rows(t, interval)));
    }
    let essential = opts.list("essentialColumns");
    if !essential.is_empty() {
        shrink(table, ops, |t| op("essential_columns", Impact::High).counted(keep_essential_columns(t, &essential)));
    }
    if opts.flag("removeOutliers") {
        shrink(table, ops, |t| op("remove_outliers", Impact::High).counted(remove_outliers(t)));
    }
    if opts.flag("statisticalSampling") {
        shrink(table, ops, |t| op("statistical_sampling", Impact::High).with("sampleRate", 0.3).counted(statistical_sample(t)));
    }
}

pub fn remove_empty_rows(table: &mut Table) -> usize {
    let before = table.rows.len();
    table.rows.retain(|r| r.iter().any(|f| !f.trim().is_empty()));
    before - table.rows.len()
}

pub fn trim_fields(table: &mut Table) -> usize {
    let mut changed = 0;
    for field in table.header.iter_mut().chain(table.rows.iter_mut().flatten()) {
        let trimmed = field.trim();
        if trimmed.len() != field.len() {
            *field = trimmed.to_string();
            changed += 1;
        }
    }
    changed
}

/// Drop exact repeats; the first occurrence of each row stays in place.
pub fn remove_duplicate_rows(table: &mut Table) -> usize {
    let mut seen = HashSet::new();
    let before = table.rows.len();
    table.rows.retain(|r| seen.insert(r.join(",")));
    before - table.rows.len()
}

/// Round decimal fields; a field is replaced only by shorter text.
pub fn round_fields(table: &mut Table, decimals: usize) -> usize {
    let mut changed = 0;
    for field in table.rows.iter_mut().flatten() {
        if !field.contains('.') {
            continue;
        }
        if let Some(n) = parse_number(field) {
            let rounded = round_str(n, decimals);
            if rounded.len() < field.len() {
                *field = rounded;
                changed += 1;
            }
        }
    }
    changed
}

fn signed_delta(delta: f64) -> String {
    let d = round_to(delta, 2);
    if d == 0.0 {
        "+0.00".to_string()
    } else {
        format!("{d:+.2}")
    }
}

/// Delta-encode every fully numeric column that actually varies. Returns
/// the original headers of the encoded columns.
pub fn delta_encode(table: &mut Table) -> Vec<String> {
    let mut encoded = Vec::new();
    if table.rows.len() < 2 {
        return encoded;
    }
    for c in 0..table.width() {
        let Some(values) = table.numeric_column(c) else { continue };
        let first = values[0];
        if !values.iter().any(|v| (v - first).abs() > 0.01) {
            continue;
        }
        for (i, row) in table.rows.iter_mut().enumerate().skip(1) {
            if let Some(field) = row.get_mut(c) {
                *field = signed_delta(values[i] - values[i - 1]);
            }
        }
        encoded.push(table.header[c].clone());
        table.header[c].push_str(DELTA_SUFFIX);
    }
    encoded
}

/// Rebuild a delta-encoded column from its cells.
pub fn delta_decode(cells: &[&str]) -> Option<Vec<f64>> {
    let mut out = Vec::with_capacity(cells.len());
    let mut acc = 0.0;
    for (i, cell) in cells.iter().enumerate() {
        let v = parse_number(cell)?;
        acc = if i == 0 { v } else { acc + v };
        out.push(acc);
    }
    Some(out)
}

/// Dictionary-encode repetitive text columns. Returns header → {code → value}.
pub fn dictionary_encode(table: &mut Table) -> Map<String, Value> {
    let mut mapping = Map::new();
    let total = table.rows.len();
    for c in 0..table.width() {
        if table.numeric_column(c).is_some() {
            continue;
        }
        let uniques: BTreeSet<String> = table.column(c).into_iter().map(str::to_string).collect();
        let unique = uniques.len();
        if unique < 3 || unique >= total || unique as f64 / total as f64 >= 0.8 {
            continue;
        }
        let codes: HashMap<&str, usize> = uniques.iter().enumerate().map(|(i, v)| (v.as_str(), i)).collect();
        for row in table.rows.iter_mut() {
            if let Some(field) = row.get_mut(c) {
                if let Some(code) = codes.get(field.as_str()) {
                    *field = code.to_string();
                }
            }
        }
        let dict: Map<String, Value> =
            uniques.iter().enumerate().map(|(i, v)| (i.to_string(), Value::String(v.clone()))).collect();
        mapping.insert(table.header[c].clone(), Value::Object(dict));
        table.header[c].push_str(DICTIONARY_SUFFIX);
    }
    mapping
}

pub fn remove_constant_columns(table: &mut Table) -> usize {
    if table.rows.len() < 2 {
        return 0;
    }
    let keep: Vec<usize> = (0..table.width())
        .filter(|&c| {
            let distinct: HashSet<&str> = table.column(c).into_iter().filter(|v| !v.is_empty()).collect();
            distinct.len() > 1
        })
        .collect();
    let removed = table.width() - keep.len();
    if removed > 0 {
        table.retain_columns(&keep);
    }
    removed
}

pub fn truncate_text(table: &mut Table, max: usize) -> usize {
    let mut changed = 0;
    for field in table.rows.iter_mut().flatten() {
        if parse_number(field).is_some() {
            continue;
        }
        if let Some(cut) = truncate_chars(field, max) {
            *field = cut;
            changed += 1;
        }
    }
    changed
}

pub fn limit_columns(table: &mut Table, max: usize) -> usize {
    let width = table.width();
    if width <= max {
        return 0;
    }
    table.retain_columns(&(0..max).collect::<Vec<_>>());
    width - max
}

/// Keep every `interval`-th data row, starting with the first.
pub fn sample_rows(table: &mut Table, interval: usize) -> usize {
    let before = table.rows.len();
    table.rows = std::mem::take(&mut table.rows).into_iter().step_by(interval).collect();
    before - table.rows.len()
}

pub fn keep_essential_columns(table: &mut Table, listed: &[String]) -> usize {
    let width = table.width();
    let keep: BTreeSet<usize> = listed.iter().filter_map(|s| s.trim().parse().ok()).filter(|&c| c < width).collect();
    if keep.is_empty() {
        return 0;
    }
    table.retain_columns(&keep.iter().copied().collect::<Vec<_>>());
    width - keep.len()
}

/// A column counts as numeric when at least 80% of a 10-row sample parses.
fn numeric_columns(table: &Table) -> Vec<usize> {
    let sample: Vec<&Vec<String>> = table.rows.iter().take(10).collect();
    if sample.is_empty() {
        return Vec::new();
    }
    (0..table.width())
        .filter(|&c| {
            let parsed = sample.iter().filter(|r| parse_number(Table::cell(r, c)).is_some()).count();
            parsed as f64 / sample.len() as f64 >= 0.8
        })
        .collect()
}

/// Drop rows holding any value more than two standard deviations from its
/// column mean.
pub fn remove_outliers(table: &mut Table) -> usize {
    let stats: Vec<(usize, f64, f64)> = numeric_columns(table)
        .into_iter()
        .filter_map(|c| {
            let values: Vec<f64> = table.column(c).into_iter().filter_map(parse_number).collect();
            let (mean, std) = mean_std(&values);
            (std > 0.0).then_some((c, mean, std))
        })
        .collect();
    if stats.is_empty() {
        return 0;
    }
    let before = table.rows.len();
    table.rows.retain(|row| {
        stats.iter().all(|&(c, mean, std)| match parse_number(Table::cell(row, c)) {
            Some(v) => (v - mean).abs() <= 2.0 * std,
            None => true,
        })
    });
    before - table.rows.len()
}

/// Systematic sample of `max(50, 30%)` rows for tables over 100 rows.
pub fn statistical_sample(table: &mut Table) -> usize {
    let n = table.rows.len();
    if n <= 100 {
        return 0;
    }
    let target = ((n as f64 * 0.3).ceil() as usize).max(50);
    let step = n as f64 / target as f64;
    let rows = std::mem::take(&mut table.rows);
    table.rows = (0..target).filter_map(|i| rows.get((i as f64 * step) as usize).cloned()).collect();
    n - table.rows.len()
}
