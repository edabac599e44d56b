//! Sequential multi-file compression with per-file outcomes.

use anyhow::Context;
use lossy_core::{reduction_percent, CompressionResult, CustomOptions, FileType, Tier};
use lossy_engines::compress;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct BatchFile {
    pub name: String,
    pub content: String,
}

impl BatchFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self { name: name.into(), content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    pub name: String,
    pub file_type: FileType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CompressionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchEntry {
    pub fn is_ok(&self) -> bool {
        self.result.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.succeeded()
    }

    /// Byte totals over the files that compressed.
    pub fn totals(&self) -> (usize, usize) {
        self.entries
            .iter()
            .filter_map(|e| e.result.as_ref())
            .fold((0, 0), |(orig, comp), r| (orig + r.original_size, comp + r.compressed_size))
    }

    pub fn reduction_percent(&self) -> f64 {
        let (orig, comp) = self.totals();
        reduction_percent(orig, comp)
    }
}

fn compress_one(file: &BatchFile, file_type: FileType, tier: Tier, options: &CustomOptions) -> anyhow::Result<CompressionResult> {
    compress(file_type, &file.content, tier, options)
        .with_context(|| format!("failed to compress {} as {}", file.name, file_type))
}

/// Compress files one at a time, in order. The format comes from each file
/// name; a failure is recorded on its entry and the batch moves on.
pub fn compress_batch(files: &[BatchFile], tier: Tier, options: &CustomOptions) -> BatchReport {
    let mut report = BatchReport::default();
    for file in files {
        let file_type = FileType::from_filename(&file.name);
        let entry = match compress_one(file, file_type, tier, options) {
            Ok(result) => {
                debug!(file = %file.name, format = %file_type, reduction = result.reduction_percent(), "batch file done");
                BatchEntry { name: file.name.clone(), file_type, result: Some(result), error: None }
            }
            Err(e) => {
                warn!(file = %file.name, error = %format!("{e:#}"), "batch file failed");
                BatchEntry { name: file.name.clone(), file_type, result: None, error: Some(format!("{e:#}")) }
            }
        };
        report.entries.push(entry);
    }
    report
}
