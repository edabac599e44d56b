//! Preview, recommendation and manifest layer over the lossy engines.
//!
//! `analyze` runs a format's engine at every tier against the same input and
//! scores the results; `Manifest` describes one chosen run for download;
//! `compress_batch` processes several files one at a time.

pub mod batch;
pub mod manifest;
pub mod preview;
pub mod recommend;

pub use batch::{compress_batch, BatchEntry, BatchFile, BatchReport};
pub use manifest::{describe_operation, describe_operations, Manifest};
pub use preview::{analyze, analyze_parallel, PreviewResult, TierPreview};
pub use recommend::{is_effective, reason_for, recommend, Recommendation, EFFECTIVE_THRESHOLD};

#[cfg(test)]
mod tests;
