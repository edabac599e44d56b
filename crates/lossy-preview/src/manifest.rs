//! Download manifest describing one compression run.

use chrono::Utc;
use lossy_core::{CompressionResult, CustomOptions, Impact, Operation, Result, Tier};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MANIFEST_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub original_file: String,
    pub compression_level: Tier,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub original_size: usize,
    pub compressed_size: usize,
    pub reduction_percent: f64,
    pub operations: Vec<Operation>,
    pub custom_options: CustomOptions,
    pub reversibility: String,
    pub data_loss: Impact,
}

impl Manifest {
    pub fn new(file_name: &str, tier: Tier, result: &CompressionResult, options: &CustomOptions) -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            original_file: file_name.to_string(),
            compression_level: tier,
            timestamp: Utc::now().to_rfc3339(),
            original_size: result.original_size,
            compressed_size: result.compressed_size,
            reduction_percent: result.reduction_percent(),
            operations: result.operations.clone(),
            custom_options: options.clone(),
            // Lossy output is never restorable in full, even with mappings.
            reversibility: "partial".to_string(),
            data_loss: tier.data_loss(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Operations that carry a reverse mapping.
    pub fn reversible_operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(|op| op.reversible)
    }
}

/// One diff line, e.g. `round_numbers: 12 changes (medium impact, decimals=2)`.
pub fn describe_operation(op: &Operation) -> String {
    let noun = if op.count == 1 { "change" } else { "changes" };
    let mut line = format!("{}: {} {noun} ({} impact", op.kind, op.count, op.impact.as_str());
    if op.reversible {
        line.push_str(", reversible");
    }
    for (key, value) in &op.details {
        match value {
            Value::Number(_) | Value::Bool(_) => line.push_str(&format!(", {key}={value}")),
            Value::String(s) => line.push_str(&format!(", {key}={s}")),
            Value::Array(items) => line.push_str(&format!(", {key}: {} entries", items.len())),
            Value::Object(map) => line.push_str(&format!(", {key}: {} entries", map.len())),
            Value::Null => {}
        }
    }
    line.push(')');
    line
}

pub fn describe_operations(ops: &[Operation]) -> Vec<String> {
    ops.iter().map(describe_operation).collect()
}
