//! Option values and call-time resolution against the registry defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::Impact;

/// A concrete option value: toggle, threshold or list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Number(f64),
    List(Vec<String>),
    Text(String),
}

impl OptionValue {
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0,
            Self::List(items) => !items.is_empty(),
            Self::Text(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "on" | "1"),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Self::Bool(_) | Self::List(_) | Self::Number(_) => None,
        }
    }

    /// Lists may also be given as a comma-separated string.
    pub fn as_list(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect(),
            Self::Text(s) => s.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect(),
            Self::Number(n) => vec![n.to_string()],
            Self::Bool(_) => Vec::new(),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for OptionValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Per-session overrides keyed by option key.
pub type CustomOptions = BTreeMap<String, OptionValue>;

/// Static description of one option of one format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSpec {
    pub key: &'static str,
    pub default: OptionValue,
    pub impact: Impact,
    pub description: &'static str,
    pub reversible: bool,
}

/// Custom overrides layered over a format's registry defaults.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedOptions<'a> {
    specs: &'a [OptionSpec],
    custom: &'a CustomOptions,
}

impl<'a> ResolvedOptions<'a> {
    pub fn new(specs: &'a [OptionSpec], custom: &'a CustomOptions) -> Self {
        Self { specs, custom }
    }

    pub fn value(&self, key: &str) -> Option<&'a OptionValue> {
        self.custom
            .get(key)
            .or_else(|| self.specs.iter().find(|s| s.key == key).map(|s| &s.default))
    }

    /// Toggle lookup; keys unknown to both maps are off.
    pub fn flag(&self, key: &str) -> bool {
        self.value(key).map(OptionValue::as_bool).unwrap_or(false)
    }

    pub fn number_or(&self, key: &str, fallback: f64) -> f64 {
        self.value(key).and_then(OptionValue::as_number).unwrap_or(fallback)
    }

    /// Non-negative integer threshold.
    pub fn count_or(&self, key: &str, fallback: usize) -> usize {
        match self.value(key).and_then(OptionValue::as_number) {
            Some(n) if n >= 0.0 => n.floor() as usize,
            _ => fallback,
        }
    }

    pub fn list(&self, key: &str) -> Vec<String> {
        self.value(key).map(OptionValue::as_list).unwrap_or_default()
    }
}
