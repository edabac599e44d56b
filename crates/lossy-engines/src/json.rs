//! JSON engine: structural rewrites on a parsed copy of the document.

use lossy_core::{CompressError, FileType, Impact, Operation, ResolvedOptions, Result, Tier};
use serde_json::{Map, Number, Value};
use std::collections::{HashMap, HashSet};

use crate::names::{key_code, NameAllocator};
use crate::numeric::round_to;
use crate::pipeline::{op, Engine, OpLog};
use crate::rewrite::truncate_chars;

/// Placeholder written in place of objects nested beyond `maxDepth`.
pub const NESTED_PLACEHOLDER: &str = "[Object]";

pub struct JsonEngine;

impl Engine for JsonEngine {
    fn file_type(&self) -> FileType {
        FileType::Json
    }

    fn run(&self, content: &str, tier: Tier, opts: &ResolvedOptions<'_>, ops: &mut OpLog) -> Result<String> {
        let mut value: Value =
            serde_json::from_str(content).map_err(|e| CompressError::invalid_format("JSON", e.to_string()))?;
        let compact = serde_json::to_string(&value)?;
        ops.record(op("remove_whitespace", Impact::Low).counted(usize::from(compact.len() < content.len())));

        match tier {
            Tier::Minimal => minimal(&mut value, ops, opts),
            Tier::Moderate => moderate(&mut value, ops, opts),
            Tier::Aggressive => aggressive(&mut value, ops, opts),
        }
        Ok(serde_json::to_string(&value)?)
    }
}

fn minimal(value: &mut Value, ops: &mut OpLog, opts: &ResolvedOptions<'_>) {
    if opts.flag("removeNulls") {
        ops.record(op("remove_nulls", Impact::Low).counted(remove_nulls(value)));
    }
    if opts.flag("removeEmpty") {
        ops.record(op("remove_empty", Impact::Low).counted(remove_empty(value)));
    }
    if opts.flag("trimStrings") {
        ops.record(op("trim_strings", Impact::Low).counted(trim_strings(value)));
    }
}

fn moderate(value: &mut Value, ops: &mut OpLog, opts: &ResolvedOptions<'_>) {
    minimal(value, ops, opts);

    if opts.flag("shortenKeys") {
        let mapping = build_key_mapping(value);
        let count = rename_keys(value, &mapping);
        let recorded: Map<String, Value> =
            mapping.ranked.iter().map(|(k, code)| (k.clone(), Value::String(code.clone()))).collect();
        ops.record(Operation::new("shorten_keys", count, true, Impact::Medium).with("mapping", recorded));
    }
    if opts.flag("roundNumbers") {
        let decimals = opts.count_or("decimalPlaces", 2);
        ops.record(op("round_numbers", Impact::Medium).with("decimals", decimals).counted(round_numbers(value, decimals)));
    }
    if opts.flag("deduplicateArrays") {
        ops.record(op("deduplicate_arrays", Impact::Medium).counted(dedupe_arrays(value)));
    }
}

fn aggressive(value: &mut Value, ops: &mut OpLog, opts: &ResolvedOptions<'_>) {
    moderate(value, ops, opts);

    if opts.flag("truncateStrings") {
        let max = opts.count_or("maxStringLength", 100);
        ops.record(op("truncate_strings", Impact::High).with("maxLength", max).counted(truncate_strings(value, max)));
    }
    if opts.flag("flattenNesting") {
        let max_depth = opts.count_or("maxDepth", 3);
        ops.record(op("flatten_nesting", Impact::High).with("maxDepth", max_depth).counted(flatten_nesting(value, 0, max_depth)));
    }
    if opts.flag("roundToIntegers") {
        ops.record(op("round_integers", Impact::High).with("decimals", 0).counted(round_numbers(value, 0)));
    }
}

fn children_mut(value: &mut Value) -> Box<dyn Iterator<Item = &mut Value> + '_> {
    match value {
        Value::Object(map) => Box::new(map.values_mut()),
        Value::Array(items) => Box::new(items.iter_mut()),
        _ => Box::new(std::iter::empty()),
    }
}

/// Remove null-valued object members at any depth.
pub fn remove_nulls(value: &mut Value) -> usize {
    let mut removed = 0;
    if let Value::Object(map) = value {
        let before = map.len();
        map.retain(|_, v| !v.is_null());
        removed += before - map.len();
    }
    for child in children_mut(value) {
        removed += remove_nulls(child);
    }
    removed
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Remove empty arrays and objects. Children are cleaned before their
/// parent is checked, so a chain that only becomes empty through removals
/// collapses in a single call. The root is never removed.
pub fn remove_empty(value: &mut Value) -> usize {
    let mut removed = 0;
    for child in children_mut(value) {
        removed += remove_empty(child);
    }
    match value {
        Value::Object(map) => {
            let before = map.len();
            map.retain(|_, v| !is_empty_container(v));
            removed += before - map.len();
        }
        Value::Array(items) => {
            let before = items.len();
            items.retain(|v| !is_empty_container(v));
            removed += before - items.len();
        }
        _ => {}
    }
    removed
}

/// Trim every string leaf; returns how many strings changed.
pub fn trim_strings(value: &mut Value) -> usize {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.len() != s.len() {
                *s = trimmed.to_string();
                1
            } else {
                0
            }
        }
        _ => children_mut(value).map(trim_strings).sum(),
    }
}

/// Global frequency of every object key, at any depth.
pub fn key_frequencies(value: &Value) -> HashMap<String, usize> {
    fn walk(value: &Value, freq: &mut HashMap<String, usize>) {
        match value {
            Value::Object(map) => {
                for (k, v) in map {
                    *freq.entry(k.clone()).or_insert(0) += 1;
                    walk(v, freq);
                }
            }
            Value::Array(items) => items.iter().for_each(|v| walk(v, freq)),
            _ => {}
        }
    }
    let mut freq = HashMap::new();
    walk(value, &mut freq);
    freq
}

/// Key → code substitutions, in rank order.
#[derive(Debug, Default)]
pub struct KeyMapping {
    pub ranked: Vec<(String, String)>,
    lookup: HashMap<String, String>,
}

impl KeyMapping {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lookup.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

/// Rank keys by frequency, then length, and hand out base-62 codes in that
/// order. A key only gets its code when the code is strictly shorter; codes
/// equal to an existing key name are skipped.
pub fn build_key_mapping(value: &Value) -> KeyMapping {
    let freq = key_frequencies(value);
    let mut ranked: Vec<(&String, &usize)> = freq.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1).then(b.0.len().cmp(&a.0.len())).then(a.0.cmp(b.0)));

    let taken: HashSet<String> = freq.keys().cloned().collect();
    let mut codes = NameAllocator::new(key_code, taken);
    let mut mapping = KeyMapping::default();
    for (key, _) in ranked {
        let code = codes.next_name();
        if code.len() < key.len() {
            mapping.lookup.insert(key.clone(), code.clone());
            mapping.ranked.push((key.clone(), code));
        }
    }
    mapping
}

/// Apply a key mapping in place, keeping member order. Returns the number
/// of renamed occurrences.
pub fn rename_keys(value: &mut Value, mapping: &KeyMapping) -> usize {
    if mapping.is_empty() {
        return 0;
    }
    let mut renamed = 0;
    if let Value::Object(map) = value {
        let old = std::mem::take(map);
        for (k, v) in old {
            match mapping.get(&k) {
                Some(code) => {
                    renamed += 1;
                    map.insert(code.to_string(), v);
                }
                None => {
                    map.insert(k, v);
                }
            }
        }
    }
    for child in children_mut(value) {
        renamed += rename_keys(child, mapping);
    }
    renamed
}

fn number_value(x: f64) -> Option<Value> {
    if x.fract() == 0.0 && x.abs() < 9.0e15 {
        Some(Value::from(x as i64))
    } else {
        Number::from_f64(x).map(Value::Number)
    }
}

/// Round every non-integer number to `decimals` places; returns how many
/// values changed.
pub fn round_numbers(value: &mut Value, decimals: usize) -> usize {
    let rounded = match value {
        Value::Number(n) => rounded_number(n, decimals),
        _ => return children_mut(value).map(|c| round_numbers(c, decimals)).sum(),
    };
    match rounded {
        Some(v) => {
            *value = v;
            1
        }
        None => 0,
    }
}

fn rounded_number(n: &Number, decimals: usize) -> Option<Value> {
    if n.is_i64() || n.is_u64() {
        return None;
    }
    let x = n.as_f64()?;
    if x.fract() == 0.0 {
        return None;
    }
    let rounded = round_to(x, decimals);
    if rounded == x {
        return None;
    }
    number_value(rounded)
}

/// Remove deep-equal duplicates inside every array, keeping first
/// occurrences in order.
pub fn dedupe_arrays(value: &mut Value) -> usize {
    let mut removed: usize = children_mut(value).map(dedupe_arrays).sum();
    if let Value::Array(items) = value {
        let before = items.len();
        let mut kept: Vec<Value> = Vec::with_capacity(before);
        for item in items.drain(..) {
            if !kept.contains(&item) {
                kept.push(item);
            }
        }
        removed += before - kept.len();
        *items = kept;
    }
    removed
}

/// Cut string leaves longer than `max` characters.
pub fn truncate_strings(value: &mut Value, max: usize) -> usize {
    match value {
        Value::String(s) => match truncate_chars(s, max) {
            Some(t) => {
                *s = t;
                1
            }
            None => 0,
        },
        _ => children_mut(value).map(|c| truncate_strings(c, max)).sum(),
    }
}

/// Replace objects at depth `>= max_depth` (root is depth 0) with
/// [`NESTED_PLACEHOLDER`], when that is shorter.
pub fn flatten_nesting(value: &mut Value, depth: usize, max_depth: usize) -> usize {
    let mut replaced = 0;
    for child in children_mut(value) {
        if child.is_object() && depth + 1 >= max_depth {
            let size = serde_json::to_string(child).map(|s| s.len()).unwrap_or(0);
            if size > NESTED_PLACEHOLDER.len() + 2 {
                *child = Value::String(NESTED_PLACEHOLDER.to_string());
                replaced += 1;
            }
        } else {
            replaced += flatten_nesting(child, depth + 1, max_depth);
        }
    }
    replaced
}
