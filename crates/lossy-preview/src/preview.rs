//! Speculative all-tier runs over one input.

use lossy_core::{CompressionResult, CustomOptions, FileType, Operation, Tier};
use lossy_engines::compress;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::recommend::{recommend, Recommendation};

/// One tier's row in a preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierPreview {
    pub size: usize,
    pub reduction: f64,
    pub operations: Vec<Operation>,
    pub compressed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TierPreview {
    fn from_result(result: CompressionResult) -> Self {
        Self {
            size: result.compressed_size,
            reduction: result.reduction_percent(),
            operations: result.operations,
            compressed: result.compressed,
            error: None,
        }
    }

    /// Placeholder row for a tier that failed: input unchanged, nothing logged.
    fn failed(content: &str, error: String) -> Self {
        Self {
            size: content.len(),
            reduction: 0.0,
            operations: Vec::new(),
            compressed: content.to_string(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResult {
    pub original_size: usize,
    pub results: BTreeMap<Tier, TierPreview>,
    pub recommendation: Recommendation,
}

impl PreviewResult {
    fn assemble(content: &str, results: BTreeMap<Tier, TierPreview>) -> Self {
        let reductions: BTreeMap<Tier, f64> = results.iter().map(|(tier, row)| (*tier, row.reduction)).collect();
        Self { original_size: content.len(), recommendation: recommend(&reductions), results }
    }

    pub fn tier(&self, tier: Tier) -> Option<&TierPreview> {
        self.results.get(&tier)
    }

    /// Row of the recommended tier.
    pub fn recommended(&self) -> Option<&TierPreview> {
        self.tier(self.recommendation.level)
    }
}

fn run_tier(content: &str, file_type: FileType, tier: Tier, options: &CustomOptions) -> TierPreview {
    match compress(file_type, content, tier, options) {
        Ok(result) => {
            let row = TierPreview::from_result(result);
            debug!(format = %file_type, tier = %tier, size = row.size, reduction = row.reduction, "preview tier");
            row
        }
        Err(e) => {
            warn!(format = %file_type, tier = %tier, error = %e, "preview tier failed");
            TierPreview::failed(content, e.to_string())
        }
    }
}

/// Run every tier in turn. A failing tier degrades to a zero-reduction row
/// and never stops the others.
pub fn analyze(content: &str, file_type: FileType, options: &CustomOptions) -> PreviewResult {
    let results = Tier::ALL
        .into_iter()
        .map(|tier| (tier, run_tier(content, file_type, tier, options)))
        .collect();
    PreviewResult::assemble(content, results)
}

/// Same as [`analyze`] with the three tiers on blocking worker threads.
pub async fn analyze_parallel(content: Arc<str>, file_type: FileType, options: Arc<CustomOptions>) -> PreviewResult {
    let handles: Vec<_> = Tier::ALL
        .into_iter()
        .map(|tier| {
            let content = Arc::clone(&content);
            let options = Arc::clone(&options);
            let handle = tokio::task::spawn_blocking(move || run_tier(&content, file_type, tier, &options));
            (tier, handle)
        })
        .collect();

    let mut results = BTreeMap::new();
    for (tier, handle) in handles {
        let row = match handle.await {
            Ok(row) => row,
            Err(e) => {
                warn!(format = %file_type, tier = %tier, error = %e, "preview task failed");
                TierPreview::failed(&content, e.to_string())
            }
        };
        results.insert(tier, row);
    }
    PreviewResult::assemble(&content, results)
}
