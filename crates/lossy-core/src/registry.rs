//! Default option registry for every supported format.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::options::{CustomOptions, OptionSpec, OptionValue};
use crate::types::{FileType, Impact};
use Impact::{High, Low, Medium};

fn flag(key: &'static str, default: bool, impact: Impact, description: &'static str, reversible: bool) -> OptionSpec {
    OptionSpec { key, default: OptionValue::Bool(default), impact, description, reversible }
}

fn number(key: &'static str, default: f64, impact: Impact, description: &'static str) -> OptionSpec {
    OptionSpec { key, default: OptionValue::Number(default), impact, description, reversible: false }
}

fn list(key: &'static str, impact: Impact, description: &'static str) -> OptionSpec {
    OptionSpec { key, default: OptionValue::List(Vec::new()), impact, description, reversible: false }
}

fn json_options() -> Vec<OptionSpec> {
    vec![
        flag("removeNulls", true, Low, "Remove object members whose value is null", false),
        flag("removeEmpty", true, Low, "Remove empty arrays and objects", false),
        flag("trimStrings", true, Low, "Trim leading and trailing whitespace in strings", false),
        flag("shortenKeys", true, Medium, "Replace frequent keys with short codes (mapping kept)", true),
        flag("roundNumbers", true, Medium, "Round decimal numbers", false),
        number("decimalPlaces", 2.0, Medium, "Decimal places kept when rounding"),
        flag("deduplicateArrays", true, Medium, "Remove duplicate array elements", false),
        flag("truncateStrings", true, High, "Truncate long strings", false),
        number("maxStringLength", 100.0, High, "Maximum string length before truncation"),
        flag("flattenNesting", false, High, "Replace deeply nested objects with a placeholder", false),
        number("maxDepth", 3.0, High, "Depth at which nested objects are replaced"),
        flag("roundToIntegers", true, High, "Round every number to an integer", false),
    ]
}

fn csv_options() -> Vec<OptionSpec> {
    vec![
        flag("removeEmptyRows", true, Low, "Remove rows whose fields are all empty", false),
        flag("trimFields", true, Low, "Trim whitespace around fields", false),
        flag("removeDuplicateRows", true, Medium, "Remove repeated rows", false),
        flag("roundNumbers", true, Medium, "Round numeric fields to 2 decimals", false),
        flag("deltaEncoding", true, Medium, "Store numeric columns as differences from the previous row", true),
        flag("dictionaryEncoding", true, Medium, "Replace repeated categorical values with integer codes", true),
        flag("removeConstantColumns", true, Medium, "Drop columns whose values never change", false),
        flag("truncateText", true, Medium, "Truncate long text fields", false),
        number("maxTextLength", 50.0, Medium, "Maximum text field length"),
        flag("limitColumns", false, High, "Keep only the first N columns", false),
        number("maxColumns", 10.0, High, "Number of columns kept by limitColumns"),
        flag("sampleRows", false, High, "Keep every Nth row", false),
        number("sampleInterval", 2.0, High, "Row sampling interval"),
        list("essentialColumns", High, "Comma-separated column indices to keep"),
        flag("removeOutliers", false, High, "Drop rows with values beyond 2 standard deviations", false),
        flag("statisticalSampling", false, High, "Sample large files down to about 30% of rows", false),
    ]
}

fn javascript_options() -> Vec<OptionSpec> {
    vec![
        flag("removeComments", true, Low, "Remove // and /* */ comments", false),
        flag("collapseWhitespace", true, Low, "Collapse whitespace and spacing around punctuation", false),
        flag("removeConsole", true, Medium, "Remove console.* calls", false),
        flag("removeDebugger", true, Medium, "Remove debugger statements", false),
        flag("shortenLiterals", true, Medium, "Shorten boolean, numeric and special literals", false),
        flag("removeSemicolons", true, Medium, "Remove semicolons before closing braces", false),
        flag("removeDeadCode", true, High, "Remove always-false if blocks", false),
        flag("mangleNames", false, High, "Rename declared variables to short names", true),
    ]
}

fn html_options() -> Vec<OptionSpec> {
    vec![
        flag("removeComments", true, Low, "Remove HTML comments", false),
        flag("collapseWhitespace", true, Low, "Collapse whitespace between tags", false),
        flag("normalizeDoctype", true, Medium, "Use the short HTML5 doctype", false),
        flag("removeDefaultTypes", true, Medium, "Drop default type attributes", false),
        flag("collapseBooleanAttributes", true, Medium, "Write boolean attributes without values", false),
        flag("removeAttributeQuotes", true, Medium, "Remove quotes around simple attribute values", false),
        flag("removeOptionalTags", true, Medium, "Remove optional closing tags", false),
        flag("removeMetaTags", false, High, "Remove descriptive meta tags", false),
        flag("removeAnalytics", false, High, "Remove analytics scripts", false),
        flag("inlineCss", false, High, "Inline external stylesheets (not implemented)", false),
    ]
}

fn css_options() -> Vec<OptionSpec> {
    vec![
        flag("removeComments", true, Low, "Remove comments", false),
        flag("collapseWhitespace", true, Low, "Collapse whitespace and punctuation spacing", false),
        flag("shortenColors", true, Medium, "Shorten hex colors", false),
        flag("removeZeroUnits", true, Medium, "Write 0px as 0", false),
        flag("mergeShorthand", true, Medium, "Fold margin/padding overrides into shorthands", false),
        flag("mergeSelectors", true, Medium, "Merge rules with identical selectors", false),
        flag("removeDuplicateProperties", true, Medium, "Keep only the last declaration of a property", false),
        flag("removeUnused", false, High, "Remove unused rules (not implemented)", false),
        flag("mergeDuplicateSelectors", false, High, "Merge duplicate selectors across scopes (not implemented)", false),
    ]
}

fn sql_options() -> Vec<OptionSpec> {
    vec![
        flag("removeComments", true, Low, "Remove -- and /* */ comments", false),
        flag("collapseWhitespace", true, Low, "Collapse whitespace", false),
        flag("lowercaseKeywords", true, Medium, "Lowercase SQL keywords", false),
        flag("removeExplain", true, Medium, "Strip EXPLAIN prefixes", false),
        flag("shortenAliases", true, Medium, "Shorten AS aliases", true),
        flag("simplifyJoins", true, Medium, "Drop OUTER from outer joins", false),
        flag("removeSchemaPrefix", true, Medium, "Drop public. schema qualifiers", false),
        flag("removeCascade", true, Medium, "Drop trailing CASCADE", false),
        flag("combineInserts", true, Medium, "Combine consecutive INSERTs into one statement", false),
        flag("removeDdl", false, High, "Remove CREATE/DROP/ALTER statements", false),
        flag("keepOnlyDml", false, High, "Keep only INSERT/UPDATE/SELECT/DELETE statements", false),
        flag("removeTransactions", false, High, "Remove transaction control statements", false),
        flag("removeConstraints", false, High, "Strip constraint clauses", false),
        flag("sampleInserts", false, High, "Keep every Nth tuple of multi-row INSERTs", false),
        number("sampleInterval", 2.0, High, "Tuple sampling interval"),
    ]
}

fn xml_options() -> Vec<OptionSpec> {
    vec![
        flag("removeComments", true, Low, "Remove comments", false),
        flag("collapseWhitespace", true, Low, "Collapse whitespace between tags", false),
        flag("removeDeclaration", true, Medium, "Remove the XML declaration", false),
        flag("removeDoctype", true, Medium, "Remove the DOCTYPE", false),
        flag("unwrapCdata", true, Medium, "Replace CDATA sections with escaped text", false),
        flag("removeEmptyElements", true, Medium, "Remove or self-close empty elements", false),
        flag("collapseBooleans", true, Medium, "Write true/false attribute values as 1/0", false),
        flag("removeQuotes", false, Medium, "Remove quotes around simple attribute values", false),
        flag("roundNumbers", true, Medium, "Round decimals to 2 places", false),
        flag("stripNamespaces", false, Medium, "Remove namespace declarations and prefixes", false),
        flag("shortenTags", false, High, "Replace long tag names with short codes", true),
    ]
}

fn yaml_options() -> Vec<OptionSpec> {
    vec![
        flag("removeComments", true, Low, "Remove # comments", false),
        flag("removeBlankLines", true, Low, "Remove extra blank lines and trailing whitespace", false),
        flag("removeDocumentMarkers", true, Medium, "Remove --- and ... markers", false),
        flag("inlineBlockScalars", true, Medium, "Inline short block scalars", false),
        flag("removeQuotes", true, Medium, "Remove unnecessary quotes", false),
        flag("shortenNulls", true, Medium, "Write null as ~", false),
        flag("flowSequences", false, Medium, "Write simple lists as [a, b, c]", false),
        flag("shortenKeys", false, High, "Replace long keys with short codes", true),
    ]
}

fn svg_options() -> Vec<OptionSpec> {
    vec![
        flag("removeComments", true, Low, "Remove comments", false),
        flag("collapseWhitespace", true, Low, "Collapse whitespace between tags", false),
        flag("removeDeclaration", true, Low, "Remove the XML declaration", false),
        flag("removeDoctype", true, Low, "Remove the DOCTYPE", false),
        flag("removeMetadata", true, Medium, "Remove <metadata> elements", false),
        flag("removeEmptyContainers", true, Medium, "Remove empty g/defs/clipPath/mask/pattern", false),
        flag("removeDimensions", true, Medium, "Drop width/height duplicated by viewBox", false),
        flag("removeHidden", true, Medium, "Remove hidden and zero-size elements", false),
        flag("cleanupAttributes", true, Medium, "Normalize whitespace inside attributes", false),
        flag("removeEmptyAttributes", true, Medium, "Remove empty attributes", false),
        flag("collapseGroups", true, Medium, "Move group attributes onto a single child", false),
        flag("convertEllipses", true, Medium, "Convert round ellipses to circles", false),
        flag("removeUselessStrokeFill", true, Medium, "Remove invisible elements and unused stroke attributes", false),
        flag("removeDefaults", true, Medium, "Remove attributes set to their default value", false),
        flag("optimizePaths", true, Medium, "Round and compact path data", false),
        flag("roundCoordinates", true, Medium, "Round coordinates to 2 decimals", false),
        flag("shortenColors", true, Medium, "Use the shortest color notation", false),
        flag("removeUnusedNamespaces", true, Medium, "Remove unused namespace declarations", false),
        flag("simplifyPaths", true, High, "Round path data to 1 decimal", false),
        flag("removeTitleDesc", true, High, "Remove <title> and <desc>", false),
        flag("removeUnusedIds", true, High, "Remove ids that are never referenced", false),
        flag("removeIdentityTransforms", true, High, "Remove or simplify no-op transforms", false),
        flag("minifyIds", false, High, "Replace referenced ids with short codes", true),
    ]
}

fn text_base_options() -> Vec<OptionSpec> {
    vec![
        flag("normalizeLineEndings", true, Low, "Convert CRLF to LF", false),
        flag("removeTrailingWhitespace", true, Low, "Strip trailing whitespace", false),
        flag("collapseBlankLines", true, Low, "Collapse 3+ blank lines", false),
    ]
}

fn text_tail_options() -> Vec<OptionSpec> {
    vec![
        flag("removeDuplicateSentences", false, Medium, "Remove repeated sentences", false),
        flag("collapseSpaces", true, Medium, "Collapse runs of spaces", false),
        flag("truncateContent", false, High, "Truncate to a maximum length", false),
        number("maxLength", 10000.0, High, "Maximum content length"),
        flag("removeFillerWords", false, High, "Remove filler words", false),
    ]
}

fn markdown_options() -> Vec<OptionSpec> {
    let mut specs = text_base_options();
    specs.extend([
        flag("inlineReferenceLinks", true, Medium, "Convert reference links to inline links", false),
        flag("removeHtmlComments", true, Medium, "Remove HTML comments", false),
        flag("simplifyHeaders", true, Medium, "Remove closing # markers on headers", false),
        flag("cleanCodeBlocks", true, Medium, "Strip emphasis markers inside code fences", false),
        flag("truncateAltText", false, Medium, "Truncate long image alt text", false),
        number("maxAltLength", 50.0, Medium, "Maximum alt text length"),
    ]);
    specs.extend(text_tail_options());
    specs
}

fn text_options() -> Vec<OptionSpec> {
    let mut specs = text_base_options();
    specs.extend(text_tail_options());
    specs
}

/// Build the registry from the built-in tables.
pub fn default_registry() -> HashMap<FileType, Vec<OptionSpec>> {
    FileType::ALL
        .into_iter()
        .map(|ft| {
            let specs = match ft {
                FileType::Json => json_options(),
                FileType::Csv => csv_options(),
                FileType::JavaScript => javascript_options(),
                FileType::Html => html_options(),
                FileType::Css => css_options(),
                FileType::Sql => sql_options(),
                FileType::Xml => xml_options(),
                FileType::Yaml => yaml_options(),
                FileType::Svg => svg_options(),
                FileType::Markdown => markdown_options(),
                FileType::Text => text_options(),
            };
            (ft, specs)
        })
        .collect()
}

pub static OPTION_REGISTRY: LazyLock<HashMap<FileType, Vec<OptionSpec>>> = LazyLock::new(default_registry);

pub fn options_for_type(file_type: FileType) -> &'static [OptionSpec] {
    OPTION_REGISTRY.get(&file_type).map(Vec::as_slice).unwrap_or(&[])
}

/// Options for a format label; unknown labels have none.
pub fn options_for(label: &str) -> &'static [OptionSpec] {
    FileType::from_label(label).map(options_for_type).unwrap_or(&[])
}

/// Registry defaults as a custom-options map.
pub fn default_options(file_type: FileType) -> CustomOptions {
    options_for_type(file_type)
        .iter()
        .map(|spec| (spec.key.to_string(), spec.default.clone()))
        .collect()
}
