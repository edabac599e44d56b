use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::CompressError;

/// Compression tier. Each tier applies every rewrite of the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Minimal,
    Moderate,
    Aggressive,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Minimal, Tier::Moderate, Tier::Aggressive];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
        }
    }

    /// Expected data loss, as reported in manifests.
    pub fn data_loss(&self) -> Impact {
        match self {
            Self::Minimal => Impact::Low,
            Self::Moderate => Impact::Medium,
            Self::Aggressive => Impact::High,
        }
    }
}

impl Default for Tier {
    fn default() -> Self {
        Self::Moderate
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = CompressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "moderate" => Ok(Self::Moderate),
            "aggressive" => Ok(Self::Aggressive),
            _ => Err(CompressError::InvalidTier(s.to_string())),
        }
    }
}

/// How much an operation or option changes the meaning of the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl Impact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileType {
    #[serde(rename = "JSON")]
    Json,
    #[serde(rename = "CSV")]
    Csv,
    JavaScript,
    #[serde(rename = "HTML")]
    Html,
    #[serde(rename = "CSS")]
    Css,
    #[serde(rename = "SQL")]
    Sql,
    #[serde(rename = "XML")]
    Xml,
    #[serde(rename = "YAML")]
    Yaml,
    #[serde(rename = "SVG")]
    Svg,
    Markdown,
    Text,
}

impl FileType {
    pub const ALL: [FileType; 11] = [
        FileType::Json,
        FileType::Csv,
        FileType::JavaScript,
        FileType::Html,
        FileType::Css,
        FileType::Sql,
        FileType::Xml,
        FileType::Yaml,
        FileType::Svg,
        FileType::Markdown,
        FileType::Text,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Csv => "CSV",
            Self::JavaScript => "JavaScript",
            Self::Html => "HTML",
            Self::Css => "CSS",
            Self::Sql => "SQL",
            Self::Xml => "XML",
            Self::Yaml => "YAML",
            Self::Svg => "SVG",
            Self::Markdown => "Markdown",
            Self::Text => "Text",
        }
    }

    /// Resolve a canonical label such as `"JSON"` or `"JavaScript"`.
    pub fn from_label(label: &str) -> Result<Self, CompressError> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|ft| ft.label().eq_ignore_ascii_case(label))
            .ok_or_else(|| CompressError::UnsupportedType(label.to_string()))
    }

    /// Resolve from a file name's extension. Unknown extensions are `Text`.
    pub fn from_filename(name: &str) -> Self {
        let ext = std::path::Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Self::Json,
            "csv" => Self::Csv,
            "js" | "mjs" | "cjs" | "jsx" => Self::JavaScript,
            "html" | "htm" => Self::Html,
            "css" => Self::Css,
            "sql" => Self::Sql,
            "xml" => Self::Xml,
            "yaml" | "yml" => Self::Yaml,
            "svg" => Self::Svg,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Text,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One applied transformation, in the order it was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "type")]
    pub kind: String,
    pub count: usize,
    pub reversible: bool,
    pub impact: Impact,
    /// Type-specific fields (`decimals`, `mapping`, `maxLength`, ...).
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl Operation {
    pub fn new(kind: impl Into<String>, count: usize, reversible: bool, impact: Impact) -> Self {
        Self { kind: kind.into(), count, reversible, impact, details: Map::new() }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Same operation with its occurrence count set.
    pub fn counted(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }
}

/// Output of one engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionResult {
    pub compressed: String,
    pub operations: Vec<Operation>,
    pub original_size: usize,
    pub compressed_size: usize,
}

impl CompressionResult {
    pub fn new(original: &str, compressed: String, operations: Vec<Operation>) -> Self {
        Self {
            original_size: original.len(),
            compressed_size: compressed.len(),
            compressed,
            operations,
        }
    }

    pub fn ratio(&self) -> f64 {
        if self.original_size == 0 { return 1.0; }
        self.compressed_size as f64 / self.original_size as f64
    }

    /// Size reduction in percent; negative when the output grew.
    pub fn reduction_percent(&self) -> f64 {
        reduction_percent(self.original_size, self.compressed_size)
    }
}

pub fn reduction_percent(original: usize, compressed: usize) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - compressed as f64) * 100.0 / original as f64
}
