use crate::*;
use lossy_core::{CompressionResult, CustomOptions, FileType, Impact, Operation, OptionValue, Tier};
use lossy_engines::compress;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

fn reductions(minimal: f64, moderate: f64, aggressive: f64) -> BTreeMap<Tier, f64> {
    BTreeMap::from([(Tier::Minimal, minimal), (Tier::Moderate, moderate), (Tier::Aggressive, aggressive)])
}

/// 100 bytes of text whose only removable part is `trailing` spaces.
fn text_with_trailing_spaces(trailing: usize) -> String {
    format!("{}{}", "x".repeat(100 - trailing), " ".repeat(trailing))
}

const SAMPLE_JSON: &str = r#"{
  "users": [
    {"firstName": "Ada", "score": 3.14159, "note": null, "tags": [1, 1, 2]},
    {"firstName": "Alan", "score": 2.71828, "note": null, "tags": []}
  ]
}"#;

// ========== Recommendation ==========

#[test]
fn test_effective_threshold_is_strict() {
    assert!(!is_effective(5.0));
    assert!(is_effective(5.01));
    assert!(!is_effective(-3.0));
}

#[test]
fn test_recommend_aggressive_when_large() {
    let rec = recommend(&reductions(10.0, 40.0, 60.0));
    assert_eq!(rec.level, Tier::Aggressive);
    assert_eq!(rec.reason, "Strong compression with good size reduction");
}

#[test]
fn test_recommend_moderate_when_aggressive_small() {
    let rec = recommend(&reductions(10.0, 40.0, 45.0));
    assert_eq!(rec.level, Tier::Moderate);
    assert_eq!(rec.reason, "Balanced compression preserving most content");
}

#[test]
fn test_recommend_minimal_when_only_minimal_qualifies() {
    let rec = recommend(&reductions(8.0, 20.0, 25.0));
    assert_eq!(rec.level, Tier::Minimal);
    assert_eq!(rec.reason, "Limited compression opportunity for this file");
}

#[test]
fn test_recommend_defaults_to_moderate() {
    let rec = recommend(&reductions(1.0, 2.0, 3.0));
    assert_eq!(rec.level, Tier::Moderate);
    assert!(rec.effective_levels.values().all(|e| !e));
}

#[test]
fn test_recommend_missing_tiers_count_as_zero() {
    let rec = recommend(&BTreeMap::from([(Tier::Aggressive, 80.0)]));
    assert_eq!(rec.level, Tier::Aggressive);
    assert_eq!(rec.effective_levels.len(), 3);
    assert_eq!(rec.effective_levels[&Tier::Minimal], false);
    assert!(rec.reason.starts_with("Excellent"));
}

#[test]
fn test_reason_bands_are_strict() {
    assert!(reason_for(70.0).starts_with("Strong"));
    assert!(reason_for(70.1).starts_with("Excellent"));
    assert!(reason_for(50.0).starts_with("Balanced"));
    assert!(reason_for(30.0).starts_with("Modest"));
    assert!(reason_for(10.0).starts_with("Limited"));
}

// ========== Analyze ==========

#[test]
fn test_exactly_five_percent_is_ineffective() {
    let input = text_with_trailing_spaces(5);
    assert_eq!(input.len(), 100);
    let preview = analyze(&input, FileType::Text, &CustomOptions::new());
    for tier in Tier::ALL {
        assert_eq!(preview.tier(tier).unwrap().reduction, 5.0);
        assert!(!preview.recommendation.effective_levels[&tier]);
    }
    assert_eq!(preview.recommendation.level, Tier::Moderate);
}

#[test]
fn test_low_gain_file_defaults_to_moderate() {
    let input = text_with_trailing_spaces(3);
    let preview = analyze(&input, FileType::Text, &CustomOptions::new());
    for tier in Tier::ALL {
        assert_eq!(preview.tier(tier).unwrap().reduction, 3.0);
    }
    assert_eq!(preview.recommendation.level, Tier::Moderate);
    assert!(preview.recommendation.effective_levels.values().all(|e| !e));
    assert_eq!(preview.recommendation.reason, "Limited compression opportunity for this file");
}

#[test]
fn test_analyze_rows_match_engine_runs() {
    let options = CustomOptions::new();
    let preview = analyze(SAMPLE_JSON, FileType::Json, &options);
    assert_eq!(preview.original_size, SAMPLE_JSON.len());
    assert_eq!(preview.results.len(), 3);
    for tier in Tier::ALL {
        let direct = compress(FileType::Json, SAMPLE_JSON, tier, &options).unwrap();
        let row = preview.tier(tier).unwrap();
        assert!(row.is_ok());
        assert_eq!(row.compressed, direct.compressed);
        assert_eq!(row.size, row.compressed.len());
        assert_eq!(row.operations, direct.operations);
        assert_eq!(row.reduction, direct.reduction_percent());
    }
    assert_eq!(preview.recommended().unwrap().reduction, preview.tier(preview.recommendation.level).unwrap().reduction);
}

#[test]
fn test_analyze_failing_tiers_degrade() {
    let input = "{broken";
    let preview = analyze(input, FileType::Json, &CustomOptions::new());
    assert_eq!(preview.results.len(), 3);
    for row in preview.results.values() {
        assert_eq!(row.reduction, 0.0);
        assert!(row.operations.is_empty());
        assert_eq!(row.compressed, input);
        assert!(row.error.as_deref().unwrap().contains("Invalid JSON input"));
    }
    assert_eq!(preview.recommendation.level, Tier::Moderate);
}

#[test]
fn test_analyze_empty_input() {
    let preview = analyze("", FileType::Text, &CustomOptions::new());
    assert_eq!(preview.original_size, 0);
    assert!(preview.results.values().all(|row| row.reduction == 0.0));
}

#[test]
fn test_analyze_respects_custom_options() {
    let options: CustomOptions = [("removeNulls".to_string(), OptionValue::Bool(false))].into_iter().collect();
    let preview = analyze(SAMPLE_JSON, FileType::Json, &options);
    let minimal = preview.tier(Tier::Minimal).unwrap();
    assert!(minimal.compressed.contains("null"));
    assert!(minimal.operations.iter().all(|op| op.kind != "remove_nulls"));
}

#[test]
fn test_preview_serializes_camel_case() {
    let preview = analyze(SAMPLE_JSON, FileType::Json, &CustomOptions::new());
    let value = serde_json::to_value(&preview).unwrap();
    assert!(value["originalSize"].is_number());
    assert!(value["results"]["minimal"]["reduction"].is_number());
    assert!(value["results"]["aggressive"].get("error").is_none());
    assert!(value["recommendation"]["effectiveLevels"]["moderate"].is_boolean());
}

#[tokio::test]
async fn test_analyze_parallel_matches_sequential() {
    let content: Arc<str> = Arc::from(SAMPLE_JSON);
    let options = Arc::new(CustomOptions::new());
    let parallel = analyze_parallel(Arc::clone(&content), FileType::Json, Arc::clone(&options)).await;
    let sequential = analyze(&content, FileType::Json, &options);
    assert_eq!(parallel.results, sequential.results);
    assert_eq!(parallel.recommendation, sequential.recommendation);
}

#[tokio::test]
async fn test_analyze_parallel_isolates_failures() {
    let preview = analyze_parallel(Arc::from(""), FileType::Csv, Arc::new(CustomOptions::new())).await;
    assert_eq!(preview.results.len(), 3);
    assert!(preview.results.values().all(|row| row.error.is_some()));
}

// ========== Manifest ==========

fn sample_result() -> CompressionResult {
    compress(FileType::Json, SAMPLE_JSON, Tier::Aggressive, &CustomOptions::new()).unwrap()
}

#[test]
fn test_manifest_fields() {
    let result = sample_result();
    let options: CustomOptions = [("decimalPlaces".to_string(), OptionValue::Number(3.0))].into_iter().collect();
    let manifest = Manifest::new("users.json", Tier::Aggressive, &result, &options);
    assert_eq!(manifest.version, "1.0");
    assert_eq!(manifest.original_file, "users.json");
    assert_eq!(manifest.original_size, result.original_size);
    assert_eq!(manifest.compressed_size, result.compressed_size);
    assert_eq!(manifest.reversibility, "partial");
    assert_eq!(manifest.data_loss, Impact::High);
    assert_eq!(manifest.operations.len(), result.operations.len());
    assert!(chrono::DateTime::parse_from_rfc3339(&manifest.timestamp).is_ok());
}

#[test]
fn test_manifest_json_layout() {
    let result = sample_result();
    let manifest = Manifest::new("users.json", Tier::Minimal, &result, &CustomOptions::new());
    let json = manifest.to_json_pretty().unwrap();
    assert!(json.contains('\n'));
    let value: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["compression_level"], json!("minimal"));
    assert_eq!(value["data_loss"], json!("low"));
    assert_eq!(value["reversibility"], json!("partial"));
    assert!(value["operations"][0]["type"].is_string());
}

#[test]
fn test_manifest_roundtrip() {
    let result = sample_result();
    let manifest = Manifest::new("users.json", Tier::Moderate, &result, &CustomOptions::new());
    let parsed = Manifest::from_json(&manifest.to_json_pretty().unwrap()).unwrap();
    assert_eq!(parsed, manifest);
}

#[test]
fn test_manifest_reversible_operations() {
    let result = sample_result();
    let manifest = Manifest::new("users.json", Tier::Aggressive, &result, &CustomOptions::new());
    let kinds: Vec<&str> = manifest.reversible_operations().map(|op| op.kind.as_str()).collect();
    assert_eq!(kinds, vec!["shorten_keys"]);
}

#[test]
fn test_describe_operation() {
    let op = Operation::new("round_numbers", 12, false, Impact::Medium).with("decimals", 2);
    assert_eq!(describe_operation(&op), "round_numbers: 12 changes (medium impact, decimals=2)");

    let op = Operation::new("shorten_keys", 1, true, Impact::Medium).with("mapping", json!({"alpha": "0", "beta": "1"}));
    assert_eq!(describe_operation(&op), "shorten_keys: 1 change (medium impact, reversible, mapping: 2 entries)");
}

#[test]
fn test_describe_operations_one_line_each() {
    let result = sample_result();
    let lines = describe_operations(&result.operations);
    assert_eq!(lines.len(), result.operations.len());
    assert!(lines.iter().zip(&result.operations).all(|(line, op)| line.starts_with(&op.kind)));
}

// ========== Batch ==========

#[test]
fn test_batch_isolates_failures() {
    let files = vec![
        BatchFile::new("users.json", SAMPLE_JSON),
        BatchFile::new("broken.json", "{nope"),
        BatchFile::new("rows.csv", "id,name\n1,a\n2,b\n2,b\n"),
        BatchFile::new("empty.csv", "\n\n"),
        BatchFile::new("notes.txt", "hello   \n\n\n\nworld"),
    ];
    let report = compress_batch(&files, Tier::Moderate, &CustomOptions::new());

    assert_eq!(report.entries.len(), 5);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.failed(), 2);

    let names: Vec<&str> = report.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["users.json", "broken.json", "rows.csv", "empty.csv", "notes.txt"]);

    let broken = &report.entries[1];
    assert_eq!(broken.file_type, FileType::Json);
    let error = broken.error.as_deref().unwrap();
    assert!(error.starts_with("failed to compress broken.json as JSON"));
    assert!(error.contains("Invalid JSON input"));

    assert_eq!(report.entries[4].file_type, FileType::Text);
}

#[test]
fn test_batch_totals() {
    let files = vec![
        BatchFile::new("a.txt", "a   \n\n\n\nb"),
        BatchFile::new("bad.json", "["),
    ];
    let report = compress_batch(&files, Tier::Minimal, &CustomOptions::new());
    let (orig, comp) = report.totals();
    assert_eq!(orig, 9);
    assert_eq!(comp, report.entries[0].result.as_ref().unwrap().compressed_size);
    assert!(report.reduction_percent() > 0.0);
}

#[test]
fn test_batch_empty() {
    let report = compress_batch(&[], Tier::Moderate, &CustomOptions::new());
    assert_eq!(report.succeeded(), 0);
    assert_eq!(report.reduction_percent(), 0.0);
}
