//! Tier pipeline plumbing: the operation log, the `Engine` trait and
//! format dispatch.

use lossy_core::{
    options_for_type, CompressionResult, CustomOptions, FileType, Impact, Operation, ResolvedOptions, Result, Tier,
};
use tracing::debug;

use crate::{css, csv, html, javascript, json, sql, svg, text, xml, yaml};

/// Order-preserving log threaded through a tier chain.
#[derive(Debug, Default)]
pub struct OpLog {
    ops: Vec<Operation>,
}

impl OpLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a text rewrite that returns `(output, occurrences)`. The output is
    /// kept and `op` logged only if the text got strictly shorter.
    pub fn apply<F>(&mut self, content: String, op: Operation, rewrite: F) -> String
    where
        F: FnOnce(&str) -> (String, usize),
    {
        let (out, count) = rewrite(&content);
        if out.len() < content.len() {
            self.ops.push(Operation { count, ..op });
            out
        } else {
            content
        }
    }

    /// Like [`apply`](Self::apply) for count-only rewrites: the output is kept
    /// and `op` logged whenever the scan found something.
    pub fn apply_counted<F>(&mut self, content: String, op: Operation, rewrite: F) -> String
    where
        F: FnOnce(&str) -> (String, usize),
    {
        let (out, count) = rewrite(&content);
        if count > 0 && out != content {
            self.ops.push(Operation { count, ..op });
            out
        } else {
            content
        }
    }

    /// Push an operation produced by a structural pass, if it did anything.
    pub fn record(&mut self, op: Operation) -> bool {
        if op.count == 0 {
            return false;
        }
        self.ops.push(op);
        true
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn kinds(&self) -> Vec<&str> {
        self.ops.iter().map(|o| o.kind.as_str()).collect()
    }

    pub fn into_vec(self) -> Vec<Operation> {
        self.ops
    }
}

/// Shorthand for an irreversible operation template.
pub(crate) fn op(kind: &str, impact: Impact) -> Operation {
    Operation::new(kind, 0, false, impact)
}

/// One format's tier chain.
pub trait Engine: Send + Sync {
    fn file_type(&self) -> FileType;

    /// Rewrite `content` at `tier`, appending every applied change to `ops`.
    fn run(&self, content: &str, tier: Tier, opts: &ResolvedOptions<'_>, ops: &mut OpLog) -> Result<String>;

    fn compress(&self, content: &str, tier: Tier, custom: &CustomOptions) -> Result<CompressionResult> {
        let opts = ResolvedOptions::new(options_for_type(self.file_type()), custom);
        let mut ops = OpLog::new();
        let compressed = self.run(content, tier, &opts, &mut ops)?;
        let result = CompressionResult::new(content, compressed, ops.into_vec());
        debug!(
            format = %self.file_type(),
            tier = %tier,
            original = result.original_size,
            compressed = result.compressed_size,
            operations = result.operations.len(),
            "compressed"
        );
        Ok(result)
    }
}

/// Engine bound to a file type.
pub fn engine_for(file_type: FileType) -> &'static dyn Engine {
    match file_type {
        FileType::Json => &json::JsonEngine,
        FileType::Csv => &csv::CsvEngine,
        FileType::JavaScript => &javascript::JavaScriptEngine,
        FileType::Html => &html::HtmlEngine,
        FileType::Css => &css::CssEngine,
        FileType::Sql => &sql::SqlEngine,
        FileType::Xml => &xml::XmlEngine,
        FileType::Yaml => &yaml::YamlEngine,
        FileType::Svg => &svg::SvgEngine,
        FileType::Markdown => &text::TextEngine { markdown: true },
        FileType::Text => &text::TextEngine { markdown: false },
    }
}

/// Compress `content` as `file_type` at `tier`.
pub fn compress(file_type: FileType, content: &str, tier: Tier, custom: &CustomOptions) -> Result<CompressionResult> {
    engine_for(file_type).compress(content, tier, custom)
}

/// String-keyed entry point: resolves the format label and tier name first.
pub fn compress_named(label: &str, content: &str, tier: &str, custom: &CustomOptions) -> Result<CompressionResult> {
    let file_type = FileType::from_label(label)?;
    let tier: Tier = tier.parse()?;
    compress(file_type, content, tier, custom)
}

/// Reusable configuration for compressing several inputs of one format.
#[derive(Debug, Clone)]
pub struct Compactor {
    pub file_type: FileType,
    pub tier: Tier,
    pub options: CustomOptions,
}

impl Compactor {
    pub fn new(file_type: FileType) -> Self {
        Self { file_type, tier: Tier::default(), options: CustomOptions::new() }
    }

    pub fn minimal(file_type: FileType) -> Self { Self::new(file_type).with_tier(Tier::Minimal) }
    pub fn moderate(file_type: FileType) -> Self { Self::new(file_type).with_tier(Tier::Moderate) }
    pub fn aggressive(file_type: FileType) -> Self { Self::new(file_type).with_tier(Tier::Aggressive) }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_options(mut self, options: CustomOptions) -> Self {
        self.options = options;
        self
    }

    pub fn compress(&self, content: &str) -> Result<CompressionResult> {
        compress(self.file_type, content, self.tier, &self.options)
    }
}
