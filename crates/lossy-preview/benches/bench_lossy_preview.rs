use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lossy_core::{CustomOptions, FileType, Tier};
use lossy_preview::{analyze, compress_batch, BatchFile};
use rand::Rng;

fn generate_json(records: usize) -> String {
    let mut rng = rand::thread_rng();
    let items: Vec<String> = (0..records)
        .map(|i| {
            format!(
                r#"{{"identifier": {i}, "temperature": {:.6}, "label": "sensor {i} ", "extra": null}}"#,
                rng.gen_range(-40.0..40.0)
            )
        })
        .collect();
    format!("[{}]", items.join(", "))
}

fn generate_markdown(paragraphs: usize) -> String {
    let mut rng = rand::thread_rng();
    let mut out = String::from("# Report #\n\n");
    for i in 0..paragraphs {
        let spaces = " ".repeat(rng.gen_range(1..6));
        out.push_str(&format!("Paragraph {i} is really very{spaces}long.   \n\n\n\n"));
    }
    out
}

fn bench_analyze(c: &mut Criterion) {
    let json = generate_json(500);
    let markdown = generate_markdown(500);
    let options = CustomOptions::new();
    c.bench_function("analyze_json_500", |b| {
        b.iter(|| black_box(analyze(black_box(&json), FileType::Json, &options)))
    });
    c.bench_function("analyze_markdown_500", |b| {
        b.iter(|| black_box(analyze(black_box(&markdown), FileType::Markdown, &options)))
    });
}

fn bench_batch(c: &mut Criterion) {
    let files: Vec<BatchFile> = (0..20)
        .map(|i| BatchFile::new(format!("part{i}.json"), generate_json(50)))
        .collect();
    let options = CustomOptions::new();
    c.bench_function("batch_20_json_files", |b| {
        b.iter(|| black_box(compress_batch(black_box(&files), Tier::Moderate, &options)))
    });
}

criterion_group!(benches, bench_analyze, bench_batch);
criterion_main!(benches);
