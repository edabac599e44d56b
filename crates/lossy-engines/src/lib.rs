//! Lossy format engines, one tier chain per file type.
//!
//! Every engine is layered: `aggressive` runs `moderate`, which runs
//! `minimal`, then each adds its own passes. Passes are regex or scanner
//! based text rewrites (JSON works on the parsed value tree, CSV on a naive
//! comma-split table) and log one [`lossy_core::Operation`] per pass that
//! changed something.
//!
//! Formats:
//! - JSON, CSV
//! - JavaScript, HTML, CSS, SQL
//! - XML, SVG (shared tag helpers in [`markup`])
//! - YAML
//! - Markdown and plain text

pub mod css;
pub mod csv;
pub mod html;
pub mod javascript;
pub mod json;
pub mod markup;
pub mod names;
pub mod numeric;
pub mod pipeline;
pub mod protect;
pub mod rewrite;
pub mod sql;
pub mod svg;
pub mod text;
pub mod xml;
pub mod yaml;

pub use pipeline::{compress, compress_named, engine_for, Compactor, Engine, OpLog};

#[cfg(test)]
mod tests;
