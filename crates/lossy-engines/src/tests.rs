use crate::*;
use crate::csv::{delta_decode, Table};
use crate::names::{key_code, letter_name, NameAllocator};
use crate::numeric::{parse_number, round_decimal_str};
use crate::protect::Protected;
use lossy_core::{CompressError, CompressionResult, CustomOptions, FileType, Operation, OptionValue, Tier};
use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashSet;

fn run(file_type: FileType, content: &str, tier: Tier) -> CompressionResult {
    compress(file_type, content, tier, &CustomOptions::new()).unwrap()
}

fn run_with(file_type: FileType, content: &str, tier: Tier, pairs: &[(&str, OptionValue)]) -> CompressionResult {
    let custom: CustomOptions = pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
    compress(file_type, content, tier, &custom).unwrap()
}

fn on(key: &str) -> (&str, OptionValue) {
    (key, OptionValue::Bool(true))
}

fn off(key: &str) -> (&str, OptionValue) {
    (key, OptionValue::Bool(false))
}

fn find<'a>(result: &'a CompressionResult, kind: &str) -> Option<&'a Operation> {
    result.operations.iter().find(|o| o.kind == kind)
}

fn kinds(result: &CompressionResult) -> Vec<&str> {
    result.operations.iter().map(|o| o.kind.as_str()).collect()
}

// ========== Names ==========

#[test]
fn test_key_code_alphabet_and_overflow() {
    assert_eq!(key_code(0), "0");
    assert_eq!(key_code(10), "a");
    assert_eq!(key_code(61), "Z");
    assert_eq!(key_code(62), "|a");
    assert_eq!(key_code(63), "|b");
}

#[test]
fn test_letter_names() {
    assert_eq!(letter_name(0), "a");
    assert_eq!(letter_name(25), "z");
    assert_eq!(letter_name(26), "aa");
    assert_eq!(letter_name(27), "ab");
}

#[test]
fn test_name_allocator_skips_taken() {
    let taken: HashSet<String> = ["a", "c"].iter().map(|s| s.to_string()).collect();
    let mut names = NameAllocator::new(letter_name, taken);
    assert_eq!(names.next_name(), "b");
    assert_eq!(names.next_name(), "d");
}

// ========== Numeric ==========

#[test]
fn test_round_half_away_from_zero() {
    assert_eq!(round_decimal_str("1.005", 2), "1.01");
    assert_eq!(round_decimal_str("-2.345", 2), "-2.35");
    assert_eq!(round_decimal_str("2.50", 2), "2.5");
    assert_eq!(round_decimal_str("9.999", 2), "10");
    assert_eq!(round_decimal_str("-0.001", 2), "0");
}

#[test]
fn test_parse_number_rejects_words() {
    assert_eq!(parse_number("12.5"), Some(12.5));
    assert_eq!(parse_number(".5"), Some(0.5));
    assert_eq!(parse_number("inf"), None);
    assert_eq!(parse_number("1.2.3"), None);
    assert_eq!(parse_number(""), None);
}

// ========== Protect ==========

#[test]
fn test_protect_restore() {
    let re = Regex::new(r#""[^"]*""#).unwrap();
    let mut p = Protected::new();
    let masked = p.protect(r#"a = "x  y"; b = "z""#, &re, 0);
    assert!(!masked.contains('"'));
    assert_eq!(p.len(), 2);
    assert_eq!(p.restore(&masked), r#"a = "x  y"; b = "z""#);
}

#[test]
fn test_protect_rewrite_marker() {
    let re = Regex::new(r"\[[^\]]*\]").unwrap();
    let mut p = Protected::new();
    let masked = p.protect("a [keep] b [drop]", &re, 0);
    let (out, n) = p.rewrite(&masked, |span| (span == "[drop]").then(String::new));
    assert_eq!(n, 1);
    assert_eq!(p.restore(&out), "a [keep] b ");
}

// ========== JSON ==========

#[test]
fn test_json_moderate_scenario() {
    let input = r#"{"name": "Alice ", "tags": [1,1,2], "note": null}"#;
    let result = run(FileType::Json, input, Tier::Moderate);

    assert_eq!(find(&result, "remove_nulls").unwrap().count, 1);
    assert_eq!(find(&result, "deduplicate_arrays").unwrap().count, 1);
    assert_eq!(find(&result, "trim_strings").unwrap().count, 1);

    let parsed: Value = serde_json::from_str(&result.compressed).unwrap();
    assert_eq!(parsed.as_object().unwrap().len(), 2);
}

#[test]
fn test_json_moderate_without_key_shortening() {
    let input = r#"{"name": "Alice ", "tags": [1,1,2], "note": null}"#;
    let result = run_with(FileType::Json, input, Tier::Moderate, &[off("shortenKeys")]);
    assert_eq!(result.compressed, r#"{"name":"Alice","tags":[1,2]}"#);
    assert!(find(&result, "shorten_keys").is_none());
}

#[test]
fn test_json_invalid_input() {
    let err = compress(FileType::Json, "{not json", Tier::Minimal, &CustomOptions::new()).unwrap_err();
    assert!(matches!(err, CompressError::InvalidFormat { ref format, .. } if format == "JSON"));
}

#[test]
fn test_json_round_numbers_idempotent() {
    let mut value = json!({"a": 1.23456, "b": [2.5, 3.14159], "c": 7});
    assert_eq!(json::round_numbers(&mut value, 2), 2);
    assert_eq!(value, json!({"a": 1.23, "b": [2.5, 3.14], "c": 7}));
    assert_eq!(json::round_numbers(&mut value, 2), 0);
}

#[test]
fn test_json_round_to_integer_emits_integer() {
    let mut value = json!({"x": 2.71828});
    json::round_numbers(&mut value, 0);
    assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"x":3}"#);
}

#[test]
fn test_json_dedupe_ignores_key_order() {
    let mut value: Value = serde_json::from_str(r#"[{"a":1,"b":2},{"b":2,"a":1},{"a":1}]"#).unwrap();
    assert_eq!(json::dedupe_arrays(&mut value), 1);
    assert_eq!(value, json!([{"a": 1, "b": 2}, {"a": 1}]));
}

#[test]
fn test_json_remove_empty_cascade() {
    let mut value = json!({"a": {"b": {"c": []}}, "keep": 1});
    assert_eq!(json::remove_empty(&mut value), 3);
    assert_eq!(value, json!({"keep": 1}));
}

#[test]
fn test_json_remove_empty_keeps_root() {
    let mut value = json!({"a": []});
    assert_eq!(json::remove_empty(&mut value), 1);
    assert_eq!(value, json!({}));
}

#[test]
fn test_json_key_mapping_injective() {
    let value = json!([
        {"identifier": 1, "description": "x", "category": "a"},
        {"identifier": 2, "description": "y", "category": "b"},
        {"identifier": 3, "extra": true}
    ]);
    let mapping = json::build_key_mapping(&value);
    let codes: HashSet<&str> = mapping.ranked.iter().map(|(_, c)| c.as_str()).collect();
    assert_eq!(codes.len(), mapping.len());
    // most frequent key takes the first code
    assert_eq!(mapping.get("identifier"), Some("0"));

    let mut renamed = value.clone();
    json::rename_keys(&mut renamed, &mapping);
    for item in renamed.as_array().unwrap() {
        for key in item.as_object().unwrap().keys() {
            assert!(codes.contains(key.as_str()), "unmapped key {key}");
        }
    }
}

#[test]
fn test_json_key_codes_skip_existing_names() {
    let mut value = json!([{"0": 1, "alpha": 2}, {"alpha": 3}]);
    let mapping = json::build_key_mapping(&value);
    assert_eq!(mapping.get("alpha"), Some("1"));
    assert_eq!(mapping.get("0"), None);
    json::rename_keys(&mut value, &mapping);
    assert_eq!(value, json!([{"0": 1, "1": 2}, {"1": 3}]));
}

#[test]
fn test_json_shorten_keys_logged_reversible() {
    let input = r#"[{"firstName":"a"},{"firstName":"b"}]"#;
    let result = run(FileType::Json, input, Tier::Moderate);
    let op = find(&result, "shorten_keys").unwrap();
    assert!(op.reversible);
    assert_eq!(op.count, 2);
    assert_eq!(op.detail("mapping"), Some(&json!({"firstName": "0"})));
    assert_eq!(result.compressed, r#"[{"0":"a"},{"0":"b"}]"#);
}

#[test]
fn test_json_aggressive_truncates_and_rounds() {
    let long = "x".repeat(150);
    let input = format!(r#"{{"long": "{long}", "n": 2.71828}}"#);
    let result = run(FileType::Json, &input, Tier::Aggressive);
    let parsed: Value = serde_json::from_str(&result.compressed).unwrap();
    assert_eq!(parsed["0"].as_str().unwrap().len(), 103);
    assert_eq!(parsed["n"], json!(3));
    assert_eq!(find(&result, "truncate_strings").unwrap().detail("maxLength"), Some(&json!(100)));
    assert!(find(&result, "round_integers").is_some());
}

#[test]
fn test_json_flatten_nesting_opt_in() {
    let input = r#"{"a":{"b":{"c":{"d":1,"e":"long value here"}}}}"#;
    let plain = run_with(FileType::Json, input, Tier::Aggressive, &[off("shortenKeys")]);
    assert!(find(&plain, "flatten_nesting").is_none());

    let flat = run_with(FileType::Json, input, Tier::Aggressive, &[off("shortenKeys"), on("flattenNesting")]);
    assert_eq!(flat.compressed, r#"{"a":{"b":{"c":"[Object]"}}}"#);
    assert_eq!(find(&flat, "flatten_nesting").unwrap().count, 1);
}

// ========== CSV ==========

#[test]
fn test_csv_dictionary_and_delta_scenario() {
    let input = "id,country\n1,USA\n2,USA\n3,Canada\n4,Mexico\n5,USA";
    let result = run(FileType::Csv, input, Tier::Moderate);
    assert_eq!(result.compressed, "id(Δ),country(D)\n1,2\n+1.00,2\n+1.00,0\n+1.00,1\n+1.00,2");

    let dict = find(&result, "dictionary_encoding").unwrap();
    assert!(dict.reversible);
    assert_eq!(dict.detail("mapping"), Some(&json!({"country": {"0": "Canada", "1": "Mexico", "2": "USA"}})));
    let delta = find(&result, "delta_encoding").unwrap();
    assert_eq!(delta.detail("columns"), Some(&json!(["id"])));
}

#[test]
fn test_csv_delta_round_trip() {
    let input = "t,v\n1,10.5\n2,12.25\n3,11.75\n4,15";
    let result = run_with(FileType::Csv, input, Tier::Moderate, &[off("dictionaryEncoding")]);
    let table = Table::parse(&result.compressed).unwrap();
    assert_eq!(table.header, vec!["t(Δ)", "v(Δ)"]);

    let decoded = delta_decode(&table.column(1)).unwrap();
    for (got, want) in decoded.iter().zip([10.5, 12.25, 11.75, 15.0]) {
        assert!((got - want).abs() < 0.01, "{got} != {want}");
    }
}

#[test]
fn test_csv_dictionary_round_trip() {
    let input = "city,n\nOslo,1\nRome,2\nOslo,3\nLima,4\nRome,5\nOslo,6";
    let original: Vec<&str> = input.lines().skip(1).map(|l| l.split(',').next().unwrap()).collect();
    let result = run(FileType::Csv, input, Tier::Moderate);
    let mapping = find(&result, "dictionary_encoding").unwrap().detail("mapping").unwrap()["city"].clone();

    let table = Table::parse(&result.compressed).unwrap();
    let decoded: Vec<String> = table.column(0).iter().map(|code| mapping[*code].as_str().unwrap().to_string()).collect();
    assert_eq!(decoded, original);
}

#[test]
fn test_csv_empty_input() {
    let err = compress(FileType::Csv, "  \n\n", Tier::Minimal, &CustomOptions::new()).unwrap_err();
    assert!(matches!(err, CompressError::EmptyInput { ref format } if format == "CSV"));
}

#[test]
fn test_csv_minimal_trims_and_drops_empty_rows() {
    let result = run(FileType::Csv, "a , b\n 1,2 \n,\n3,4", Tier::Minimal);
    assert_eq!(result.compressed, "a,b\n1,2\n3,4");
    assert_eq!(kinds(&result), vec!["remove_empty_rows", "trim_fields"]);
}

#[test]
fn test_csv_duplicate_rows_first_wins() {
    let input = "a,b\nx,1\ny,2\nx,1\nz,3";
    let result = run_with(FileType::Csv, input, Tier::Moderate, &[off("deltaEncoding")]);
    assert_eq!(result.compressed, "a,b\nx,1\ny,2\nz,3");
    assert_eq!(find(&result, "remove_duplicate_rows").unwrap().count, 1);
}

#[test]
fn test_csv_remove_constant_columns() {
    let input = "id,const,name\n1,A,x\n2,A,y\n3,A,z";
    let result = run_with(FileType::Csv, input, Tier::Moderate, &[off("deltaEncoding")]);
    assert_eq!(result.compressed, "id,name\n1,x\n2,y\n3,z");
}

#[test]
fn test_csv_essential_columns() {
    let input = "a,b,c\n1,x,q\n2,y,r";
    let result = run_with(
        FileType::Csv,
        input,
        Tier::Aggressive,
        &[off("deltaEncoding"), ("essentialColumns", OptionValue::from("0,2"))],
    );
    assert_eq!(result.compressed, "a,c\n1,q\n2,r");
}

#[test]
fn test_csv_remove_outliers() {
    let mut rows = vec!["v".to_string()];
    rows.extend(["10", "11", "9", "10", "12", "10", "11", "9", "10", "500"].iter().map(|s| s.to_string()));
    let mut table = Table::parse(&rows.join("\n")).unwrap();
    assert_eq!(csv::remove_outliers(&mut table), 1);
    assert!(!table.column(0).contains(&"500"));
}

#[test]
fn test_csv_statistical_sample_size() {
    let body: Vec<String> = (0..200).map(|i| i.to_string()).collect();
    let mut table = Table::parse(&format!("n\n{}", body.join("\n"))).unwrap();
    assert_eq!(csv::statistical_sample(&mut table), 140);
    assert_eq!(table.rows.len(), 60);
    assert_eq!(table.rows[0], vec!["0"]);
}

// ========== JavaScript ==========

#[test]
fn test_js_minimal_strips_comments_not_strings() {
    let input = "// header\nconst s = \"// not a comment\"; /* note */\n";
    let result = run(FileType::JavaScript, input, Tier::Minimal);
    assert!(!result.compressed.contains("header"));
    assert!(!result.compressed.contains("note"));
    assert!(result.compressed.contains("\"// not a comment\""));
}

#[test]
fn test_js_moderate_removes_console() {
    let input = "function f(a) {\n  console.log(\"hi\", g(a));\n  return a;\n}\n";
    let result = run(FileType::JavaScript, input, Tier::Moderate);
    assert!(!result.compressed.contains("console"));
    assert!(result.compressed.contains("return a"));
    assert_eq!(find(&result, "remove_console").unwrap().count, 1);
}

#[test]
fn test_js_moderate_shortens_literals() {
    let input = "let flag = true;\nlet n = 1.50;\n";
    let result = run(FileType::JavaScript, input, Tier::Moderate);
    assert!(result.compressed.contains("flag=!0"));
    assert!(result.compressed.contains("n=1.5"));
}

#[test]
fn test_js_dead_code() {
    let result = run(FileType::JavaScript, "if (false) { a(); } else { b(); }", Tier::Aggressive);
    assert_eq!(result.compressed, "{b()}");
    assert!(find(&result, "remove_dead_code").is_some());
}

#[test]
fn test_js_mangle_renames_template_interpolations() {
    let input = "const userName = 1;const greeting = `hi ${userName}`;";
    let result = run_with(FileType::JavaScript, input, Tier::Aggressive, &[on("mangleNames")]);
    assert_eq!(result.compressed, "const a=1;const b=`hi ${a}`;");
    let op = find(&result, "mangle_identifiers").unwrap();
    assert_eq!(op.count, 3);
    assert_eq!(op.detail("mapping"), Some(&json!({"userName": "a", "greeting": "b"})));
}

#[test]
fn test_js_mangle_opt_in() {
    let input = "const counter = 0;\nconst total = counter + 1;\nobj.counter = total;\n";
    let plain = run(FileType::JavaScript, input, Tier::Aggressive);
    assert!(plain.compressed.contains("counter"));

    let result = run_with(FileType::JavaScript, input, Tier::Aggressive, &[on("mangleNames")]);
    assert_eq!(result.compressed, "const a=0;const b=a+1;obj.counter=b;");
    let op = find(&result, "mangle_identifiers").unwrap();
    assert!(op.reversible);
    assert_eq!(op.detail("mapping"), Some(&json!({"counter": "a", "total": "b"})));
}

// ========== HTML ==========

#[test]
fn test_html_minimal() {
    let result = run(FileType::Html, "<!-- c -->\n<div>\n  <p>Hi</p>\n</div>", Tier::Minimal);
    assert_eq!(result.compressed, "<div><p>Hi</p></div>");
}

#[test]
fn test_html_conditional_comment_kept() {
    let (out, n) = html::remove_comments("<!--[if IE]><p>old</p><![endif]-->");
    assert_eq!(n, 0);
    assert!(out.contains("[if IE]"));
}

#[test]
fn test_html_raw_text_untouched() {
    let input = "<div>\n  <script>\n  var a  =  1;\n</script>\n</div>";
    let result = run(FileType::Html, input, Tier::Moderate);
    assert!(result.compressed.contains("\n  var a  =  1;\n"));
}

#[test]
fn test_html_moderate_attributes() {
    let input = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0//EN"><input type="text" disabled="disabled" name="q">"#;
    let result = run(FileType::Html, input, Tier::Moderate);
    assert_eq!(result.compressed, "<!DOCTYPE html><input disabled name=q>");
    assert_eq!(find(&result, "normalize_doctype").unwrap().count, 1);
}

#[test]
fn test_html_optional_closing_tags() {
    let result = run(FileType::Html, "<ul><li>a</li><li>b</li></ul>", Tier::Moderate);
    assert_eq!(result.compressed, "<ul><li>a<li>b</ul>");
}

#[test]
fn test_html_remove_analytics() {
    let input = r#"<p>x</p><script async src="https://www.googletagmanager.com/gtag/js"></script><script>gtag('config');</script>"#;
    let result = run_with(FileType::Html, input, Tier::Aggressive, &[on("removeAnalytics")]);
    assert_eq!(result.compressed, "<p>x</p>");
    assert_eq!(find(&result, "remove_analytics").unwrap().count, 2);
}

// ========== CSS ==========

#[test]
fn test_css_minimal() {
    let result = run(FileType::Css, "/* c */\n.a {\n  color: red;\n}\n", Tier::Minimal);
    assert_eq!(result.compressed, ".a{color:red}");
}

#[test]
fn test_css_moderate_values() {
    let result = run(FileType::Css, ".a{color:#ffffff;margin:0px 0px 0px 0px}", Tier::Moderate);
    assert_eq!(result.compressed, ".a{color:#fff;margin:0}");
}

#[test]
fn test_css_selector_hash_not_a_color() {
    let result = run(FileType::Css, "#aabbcc{color:#aabbcc}", Tier::Moderate);
    assert_eq!(result.compressed, "#aabbcc{color:#abc}");
}

#[test]
fn test_css_merge_selectors_and_duplicates() {
    let grouped = run(FileType::Css, ".a{color:red}.b{color:red}", Tier::Moderate);
    assert_eq!(grouped.compressed, ".a,.b{color:red}");
    assert!(find(&grouped, "group_identical_rules").is_some());
    assert_eq!(run(FileType::Css, ".a{color:red;color:blue}", Tier::Moderate).compressed, ".a{color:blue}");
}

#[test]
fn test_css_repeated_selector_blocks_concatenated() {
    let result = run(FileType::Css, ".a{color:red}.b{margin:1px}.a{padding:2px}", Tier::Moderate);
    assert_eq!(result.compressed, ".a{color:red;padding:2px}.b{margin:1px}");
    assert_eq!(find(&result, "merge_selectors").unwrap().count, 1);

    let overridden = run(FileType::Css, ".a{color:red}.a{color:blue}", Tier::Moderate);
    assert_eq!(overridden.compressed, ".a{color:blue}");
}

#[test]
fn test_css_shorthand_override() {
    let result = run(FileType::Css, ".a{margin:0;margin-top:5px}", Tier::Moderate);
    assert_eq!(result.compressed, ".a{margin:5px 0 0}");
}

#[test]
fn test_css_strings_protected() {
    let result = run(FileType::Css, ".a::after { content: \"  /* x */  \"; }", Tier::Moderate);
    assert!(result.compressed.contains("\"  /* x */  \""));
}

#[test]
fn test_css_aggressive_placeholders_log_nothing() {
    let input = ".a{color:red}";
    let moderate = run(FileType::Css, input, Tier::Moderate);
    let aggressive = run_with(FileType::Css, input, Tier::Aggressive, &[on("removeUnused"), on("mergeDuplicateSelectors")]);
    assert_eq!(kinds(&moderate), kinds(&aggressive));
}

// ========== SQL ==========

#[test]
fn test_sql_join_scenario() {
    let input = "SELECT a.x FROM t AS a LEFT OUTER JOIN u AS b ON a.id=b.id;";
    let result = run(FileType::Sql, input, Tier::Moderate);
    assert!(result.compressed.contains("left join"));
    assert!(!result.compressed.to_lowercase().contains("outer"));
    assert!(result.compressed.contains("as a") && result.compressed.contains("as b"));
    assert!(find(&result, "shorten_aliases").is_none());
    assert!(find(&result, "simplify_joins").is_some());
}

#[test]
fn test_sql_minimal() {
    let result = run(FileType::Sql, "-- c\nSELECT  *\nFROM users ;", Tier::Minimal);
    assert_eq!(result.compressed, "SELECT * FROM users;");
}

#[test]
fn test_sql_literals_protected() {
    let result = run(FileType::Sql, "SELECT 'a -- b' FROM t", Tier::Moderate);
    assert!(result.compressed.contains("'a -- b'"));
}

#[test]
fn test_sql_shorten_aliases() {
    let result = run(FileType::Sql, "SELECT customer.name FROM customers AS customer", Tier::Moderate);
    assert_eq!(result.compressed, "select a.name from customers as a");
    let op = find(&result, "shorten_aliases").unwrap();
    assert_eq!(op.detail("mapping"), Some(&json!({"customer": "a"})));
}

#[test]
fn test_sql_combine_inserts() {
    let input = "INSERT INTO t (a,b) VALUES (1,2);\nINSERT INTO t (a,b) VALUES (3,4);";
    let result = run(FileType::Sql, input, Tier::Moderate);
    assert_eq!(result.compressed, "insert into t(a,b)values(1,2),(3,4);");
    assert_eq!(find(&result, "combine_inserts").unwrap().count, 1);
}

#[test]
fn test_sql_remove_ddl() {
    let input = "CREATE TABLE t(a int);SELECT a FROM t;";
    let result = run_with(FileType::Sql, input, Tier::Aggressive, &[on("removeDdl")]);
    assert_eq!(result.compressed, "select a from t;");
}

#[test]
fn test_sql_sample_inserts() {
    let input = "INSERT INTO t VALUES (1),(2),(3),(4);";
    let result = run_with(FileType::Sql, input, Tier::Aggressive, &[on("sampleInserts")]);
    assert_eq!(result.compressed, "insert into t values (1),(3);");
    assert_eq!(find(&result, "sample_inserts").unwrap().count, 2);
}

// ========== XML ==========

#[test]
fn test_xml_minimal() {
    let input = "<?xml version=\"1.0\"?>\n<!-- c -->\n<root>\n  <a>1</a>\n</root>";
    let result = run(FileType::Xml, input, Tier::Minimal);
    assert_eq!(result.compressed, "<?xml version=\"1.0\"?><root><a>1</a></root>");
}

#[test]
fn test_xml_moderate() {
    let input = r#"<root><empty></empty><flag on="true"/><v>3.14159</v><![CDATA[a<b]]></root>"#;
    let result = run(FileType::Xml, input, Tier::Moderate);
    assert_eq!(result.compressed, r#"<root><flag on="1"/><v>3.14</v>a&lt;b</root>"#);
}

#[test]
fn test_xml_version_strings_not_rounded() {
    let (out, n) = xml::round_numbers("<v>1.2.345</v>", 2);
    assert_eq!(n, 0);
    assert_eq!(out, "<v>1.2.345</v>");
}

#[test]
fn test_xml_strip_namespaces() {
    let input = r#"<ns:root xmlns:ns="urn:x"><ns:item ns:id="1"/></ns:root>"#;
    let result = run_with(FileType::Xml, input, Tier::Moderate, &[on("stripNamespaces")]);
    assert_eq!(result.compressed, r#"<root><item id="1"/></root>"#);
}

#[test]
fn test_xml_shorten_tags() {
    let input = "<catalog><product>a</product><product>b</product></catalog>";
    let result = run_with(FileType::Xml, input, Tier::Aggressive, &[on("shortenTags")]);
    assert_eq!(result.compressed, "<t0><t1>a</t1><t1>b</t1></t0>");
    let op = find(&result, "shorten_tags").unwrap();
    assert_eq!(op.detail("mapping"), Some(&json!({"catalog": "t0", "product": "t1"})));
}

// ========== SVG ==========

#[test]
fn test_svg_minimal() {
    let input = "<?xml version=\"1.0\"?>\n<!-- c --><svg xmlns=\"http://www.w3.org/2000/svg\">\n  <rect/>\n</svg>";
    let result = run(FileType::Svg, input, Tier::Minimal);
    assert_eq!(result.compressed, "<svg xmlns=\"http://www.w3.org/2000/svg\"><rect/></svg>");
}

#[test]
fn test_svg_convert_ellipse() {
    let result = run(FileType::Svg, r#"<svg><ellipse cx="5" cy="5" rx="3" ry="3"/></svg>"#, Tier::Moderate);
    assert_eq!(result.compressed, r#"<svg><circle cx="5" cy="5" r="3"/></svg>"#);
}

#[test]
fn test_svg_shorten_colors() {
    let result = run(FileType::Svg, r##"<svg><rect fill="#ff0000" stroke="white"/></svg>"##, Tier::Moderate);
    assert_eq!(result.compressed, r##"<svg><rect fill="red" stroke="#fff"/></svg>"##);
}

#[test]
fn test_svg_path_precision_by_tier() {
    let input = r#"<svg><path d="M 10.000 20.000 L 30.5 -40.25 Z"/></svg>"#;
    let moderate = run(FileType::Svg, input, Tier::Moderate);
    assert!(moderate.compressed.contains(r#"d="M10 20L30.5-40.25Z""#));
    let aggressive = run(FileType::Svg, input, Tier::Aggressive);
    assert!(aggressive.compressed.contains(r#"d="M10 20L30.5-40.3Z""#));
}

#[test]
fn test_svg_hidden_elements() {
    let input = r#"<svg><g display="none"><rect/></g><circle r="1"/></svg>"#;
    let result = run(FileType::Svg, input, Tier::Moderate);
    assert_eq!(result.compressed, r#"<svg><circle r="1"/></svg>"#);
}

#[test]
fn test_svg_zero_size_and_styled_hidden() {
    let input = r#"<svg><rect width="0" height="5"/><circle r="0"/><path style="display:none" d="M0 0"/><circle r="2"/></svg>"#;
    let result = run(FileType::Svg, input, Tier::Moderate);
    assert_eq!(result.compressed, r#"<svg><circle r="2"/></svg>"#);
    assert_eq!(find(&result, "remove_hidden_elements").unwrap().count, 3);
}

#[test]
fn test_svg_collapse_groups_hoists_attributes() {
    let input = r#"<svg><g fill="red" transform="translate(1 2)"><path d="M0 0L5 5"/></g></svg>"#;
    let result = run(FileType::Svg, input, Tier::Moderate);
    assert_eq!(result.compressed, r#"<svg><path d="M0 0L5 5" fill="red" transform="translate(1 2)"/></svg>"#);
    assert_eq!(find(&result, "collapse_groups").unwrap().count, 1);
}

#[test]
fn test_svg_collapse_groups_child_wins_and_transforms_compose() {
    let (out, n) = svg::collapse_groups(r#"<g fill="red" transform="translate(1 2)"><rect fill="blue" transform="scale(2)"/></g>"#);
    assert_eq!(out, r#"<rect fill="blue" transform="translate(1 2) scale(2)"/>"#);
    assert_eq!(n, 1);

    let (nested, n) = svg::collapse_groups(r#"<g fill="red"><g stroke="blue"><rect/></g></g>"#);
    assert_eq!(nested, r#"<rect stroke="blue" fill="red"/>"#);
    assert_eq!(n, 2);

    let kept = r#"<g id="keep"><rect/></g>"#;
    assert_eq!(svg::collapse_groups(kept), (kept.to_string(), 0));
}

#[test]
fn test_svg_stroke_dropped_where_never_painted() {
    let input = r#"<svg><image stroke-width="3" href="a.png"/><clipPath id="c"><rect width="5" height="5" stroke="blue"/></clipPath></svg>"#;
    let result = run(FileType::Svg, input, Tier::Moderate);
    assert_eq!(result.compressed, r#"<svg><image href="a.png"/><clipPath id="c"><rect width="5" height="5"/></clipPath></svg>"#);
    assert_eq!(find(&result, "remove_useless_stroke_fill").unwrap().count, 2);
}

#[test]
fn test_svg_hex_colors_are_not_id_references() {
    let kept = run(FileType::Svg, r##"<svg><rect id="abc" fill="#abc"/></svg>"##, Tier::Aggressive);
    assert_eq!(kept.compressed, r##"<svg><rect fill="#abc"/></svg>"##);

    let input = r##"<svg><rect id="abc" fill="#abc"/><use href="#abc"/></svg>"##;
    let result = run_with(FileType::Svg, input, Tier::Aggressive, &[on("minifyIds")]);
    assert_eq!(result.compressed, r##"<svg><rect id="a" fill="#abc"/><use href="#a"/></svg>"##);
}

#[test]
fn test_svg_unused_ids_and_titles() {
    let input = r##"<svg><title>T</title><linearGradient id="g1"/><rect id="r1" fill="url(#g1)"/></svg>"##;
    let result = run(FileType::Svg, input, Tier::Aggressive);
    assert!(result.compressed.contains(r#"id="g1""#));
    assert!(!result.compressed.contains(r#"id="r1""#));
    assert!(!result.compressed.contains("<title>"));
}

#[test]
fn test_svg_minify_ids() {
    let input = r##"<svg><defs><linearGradient id="gradient"/></defs><rect fill="url(#gradient)"/></svg>"##;
    let result = run_with(FileType::Svg, input, Tier::Aggressive, &[on("minifyIds")]);
    assert!(result.compressed.contains(r#"id="a""#));
    assert!(result.compressed.contains("url(#a)"));
    assert_eq!(find(&result, "minify_ids").unwrap().detail("mapping"), Some(&json!({"gradient": "a"})));
}

// ========== YAML ==========

#[test]
fn test_yaml_minimal() {
    let input = "# header\nname: app   # trailing\n\n\nport: 80\n";
    let result = run(FileType::Yaml, input, Tier::Minimal);
    assert_eq!(result.compressed, "name: app\nport: 80\n");
}

#[test]
fn test_yaml_hash_in_quotes_and_block_scalars() {
    let (out, n) = yaml::remove_comments("title: \"a # b\"\n");
    assert_eq!(n, 0);
    assert_eq!(out, "title: \"a # b\"\n");

    let script = "script: |\n  echo # not comment\n  done\n";
    assert_eq!(run(FileType::Yaml, script, Tier::Minimal).compressed, script);
}

#[test]
fn test_yaml_moderate() {
    let input = "---\nname: \"app\"\nvalue: null\ndesc: >\n  short text\nport: 80\n...\n";
    let result = run(FileType::Yaml, input, Tier::Moderate);
    assert_eq!(result.compressed, "name: app\nvalue: ~\ndesc: short text\nport: 80\n");
}

#[test]
fn test_yaml_reserved_words_keep_quotes() {
    let input = "flag: \"yes\"\nversion: \"1.10\"\n";
    let (out, n) = yaml::remove_unnecessary_quotes(input);
    assert_eq!(n, 0);
    assert_eq!(out, input);
}

#[test]
fn test_yaml_flow_sequences_opt_in() {
    let input = "tags:\n  - a\n  - b\nname: x\n";
    assert_eq!(run(FileType::Yaml, input, Tier::Moderate).compressed, input);
    let result = run_with(FileType::Yaml, input, Tier::Moderate, &[on("flowSequences")]);
    assert_eq!(result.compressed, "tags: [a, b]\nname: x\n");
}

#[test]
fn test_yaml_shorten_keys() {
    let input = "database:\n  hostname: x\n  port: 1\n";
    let result = run_with(FileType::Yaml, input, Tier::Aggressive, &[on("shortenKeys")]);
    assert_eq!(result.compressed, "k0:\n  k1: x\n  port: 1\n");
    let op = find(&result, "shorten_keys").unwrap();
    assert_eq!(op.detail("mapping"), Some(&json!({"database": "k0", "hostname": "k1"})));
}

// ========== Text / Markdown ==========

#[test]
fn test_text_minimal() {
    let result = run(FileType::Text, "a  \r\nb\r\n\r\n\r\n\r\nc", Tier::Minimal);
    assert_eq!(result.compressed, "a\nb\n\nc");
    assert_eq!(kinds(&result), vec!["normalize_line_endings", "strip_trailing_whitespace", "collapse_blank_lines"]);
}

#[test]
fn test_markdown_inline_reference_links() {
    let input = "See [docs][1] and [API][api].\n\n[1]: https://x.io/docs\n[API]: https://x.io/api \"API\"\n";
    let result = run(FileType::Markdown, input, Tier::Moderate);
    assert!(result.compressed.contains("[docs](https://x.io/docs)"));
    assert!(result.compressed.contains("[API](https://x.io/api)"));
    assert!(!result.compressed.contains("[1]:"));
    assert_eq!(find(&result, "inline_reference_links").unwrap().count, 2);
}

#[test]
fn test_markdown_unused_definition_kept() {
    let (out, n) = text::inline_reference_links("[x]: http://a\ntext");
    assert_eq!(n, 0);
    assert!(out.contains("[x]: http://a"));
}

#[test]
fn test_markdown_headers_and_code_blocks() {
    assert_eq!(run(FileType::Markdown, "## Title ##\ntext", Tier::Moderate).compressed, "## Title\ntext");
    assert_eq!(
        run(FileType::Markdown, "```\n**bold** code\n```", Tier::Moderate).compressed,
        "```\nbold code\n```"
    );
}

#[test]
fn test_text_keeps_html_comments() {
    let result = run(FileType::Text, "a <!-- x --> b", Tier::Moderate);
    assert!(result.compressed.contains("<!-- x -->"));
    let md = run(FileType::Markdown, "a <!-- x --> b", Tier::Moderate);
    assert!(!md.compressed.contains("<!--"));
}

#[test]
fn test_text_duplicate_sentences() {
    let result = run_with(FileType::Text, "Hello world. Hello world. Bye.", Tier::Moderate, &[on("removeDuplicateSentences")]);
    assert_eq!(result.compressed, "Hello world. Bye.");
}

#[test]
fn test_text_filler_words() {
    let result = run_with(FileType::Text, "This is really very good.", Tier::Aggressive, &[on("removeFillerWords")]);
    assert_eq!(result.compressed, "This is good.");
    assert_eq!(find(&result, "remove_filler_words").unwrap().count, 2);
}

#[test]
fn test_text_truncate_content() {
    let result = run_with(
        FileType::Text,
        "abcdefghijklmnop",
        Tier::Aggressive,
        &[on("truncateContent"), ("maxLength", OptionValue::Number(10.0))],
    );
    assert_eq!(result.compressed, "abcdefghij...");
}

// ========== Dispatch ==========

#[test]
fn test_compress_named_errors() {
    let custom = CustomOptions::new();
    assert!(matches!(compress_named("Rust", "x", "minimal", &custom), Err(CompressError::UnsupportedType(_))));
    assert!(matches!(compress_named("JSON", "{}", "extreme", &custom), Err(CompressError::InvalidTier(_))));
    assert!(compress_named("json", "{ }", "minimal", &custom).is_ok());
}

#[test]
fn test_engine_for_matches_file_type() {
    for ft in FileType::ALL {
        assert_eq!(engine_for(ft).file_type(), ft);
    }
}

#[test]
fn test_compactor_builder() {
    let compactor = Compactor::aggressive(FileType::Json).with_options(
        [("roundToIntegers".to_string(), OptionValue::Bool(false))].into_iter().collect(),
    );
    let result = compactor.compress(r#"{"v": 1.234}"#).unwrap();
    assert_eq!(result.compressed, r#"{"v":1.23}"#);
}

#[test]
fn test_reported_sizes_match_output() {
    let result = run(FileType::Markdown, "# Héllo wörld\n\n\n\ntext  ", Tier::Moderate);
    assert_eq!(result.compressed_size, result.compressed.len());
    assert_eq!(result.original_size, "# Héllo wörld\n\n\n\ntext  ".len());
}
