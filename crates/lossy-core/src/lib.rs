//! Shared data model for the lossy compression engines: tiers, operations,
//! results, errors and the per-format option registry.

pub mod error;
pub mod options;
pub mod registry;
pub mod types;

pub use error::{CompressError, Result};
pub use options::{CustomOptions, OptionSpec, OptionValue, ResolvedOptions};
pub use registry::{default_options, options_for, options_for_type, OPTION_REGISTRY};
pub use types::{reduction_percent, CompressionResult, FileType, Impact, Operation, Tier};
