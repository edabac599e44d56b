use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lossy_core::{FileType, Tier};
use lossy_engines::Compactor;
use rand::seq::SliceRandom;
use rand::Rng;

const CITIES: [&str; 6] = ["Oslo", "Rome", "Lima", "Kyoto", "Accra", "Quito"];

fn generate_json(records: usize) -> String {
    let mut rng = rand::thread_rng();
    let items: Vec<String> = (0..records)
        .map(|i| {
            let note = if rng.gen_bool(0.3) { "null".to_string() } else { format!("\"note {i} \"") };
            format!(
                r#"{{"identifier": {i}, "displayName": "user {i}", "score": {:.5}, "city": "{}", "note": {note}, "tags": [1, 1, 2]}}"#,
                rng.gen_range(0.0..100.0),
                CITIES.choose(&mut rng).unwrap_or(&"Oslo"),
            )
        })
        .collect();
    format!("[\n  {}\n]", items.join(",\n  "))
}

fn generate_csv(rows: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut out = String::from("id,city,score,status\n");
    for i in 0..rows {
        out.push_str(&format!(
            "{},{},{:.4},active\n",
            i + 1,
            CITIES.choose(&mut rng).unwrap_or(&"Oslo"),
            rng.gen_range(0.0..50.0)
        ));
    }
    out
}

fn generate_sql(statements: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut out = String::from("-- seed data\n");
    for i in 0..statements {
        out.push_str(&format!(
            "INSERT INTO customers (id, city, balance) VALUES ({i}, '{}', {});\n",
            CITIES.choose(&mut rng).unwrap_or(&"Oslo"),
            rng.gen_range(0..10_000)
        ));
    }
    out.push_str("SELECT customer.city FROM customers AS customer LEFT OUTER JOIN orders AS o ON o.cid = customer.id;\n");
    out
}

fn bench_json(c: &mut Criterion) {
    let small = generate_json(50);
    let large = generate_json(1000);
    for &(name, tier) in &[("minimal", Tier::Minimal), ("moderate", Tier::Moderate), ("aggressive", Tier::Aggressive)] {
        let compactor = Compactor::new(FileType::Json).with_tier(tier);
        c.bench_function(&format!("json_{name}_50"), |b| {
            b.iter(|| black_box(compactor.compress(black_box(&small))))
        });
        c.bench_function(&format!("json_{name}_1000"), |b| {
            b.iter(|| black_box(compactor.compress(black_box(&large))))
        });
    }
}

fn bench_csv(c: &mut Criterion) {
    let rows = generate_csv(2000);
    let compactor = Compactor::moderate(FileType::Csv);
    c.bench_function("csv_moderate_2000", |b| {
        b.iter(|| black_box(compactor.compress(black_box(&rows))))
    });
}

fn bench_sql(c: &mut Criterion) {
    let script = generate_sql(500);
    let compactor = Compactor::aggressive(FileType::Sql);
    c.bench_function("sql_aggressive_500", |b| {
        b.iter(|| black_box(compactor.compress(black_box(&script))))
    });
}

criterion_group!(benches, bench_json, bench_csv, bench_sql);
criterion_main!(benches);
