use criterion::{black_box, criterion_group, criterion_main, Criterion};

use groundquiz_core::extract::extract_json;
use groundquiz_core::generator::parse_quiz;

fn payload() -> String {
    let entries: Vec<serde_json::Value> = (0..10)
        .map(|i| {
            serde_json::json!({
                "question": format!("Which statement about layer {i} is correct?"),
                "options": ["It stores gradients", "It is skipped", "It has no weights", "It is random"],
                "correct_index": 0,
                "explanation": "Gradients flow through every layer."
            })
        })
        .collect();
    serde_json::json!({ "mcqs": entries }).to_string()
}

fn bench_extract_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_json");

    let bare = payload();
    let fenced = format!("Here is your quiz:\n\n```json\n{bare}\n```\n\nGood luck!");
    let prose = format!(
        "Sure [see notes]. {{not json}} The quiz follows: {bare} Let me know if you need more."
    );
    let truncated = bare[..bare.len() / 2].to_string();

    group.bench_function("bare", |b| b.iter(|| extract_json(black_box(&bare))));
    group.bench_function("fenced", |b| b.iter(|| extract_json(black_box(&fenced))));
    group.bench_function("prose_wrapped", |b| {
        b.iter(|| extract_json(black_box(&prose)))
    });
    group.bench_function("truncated", |b| {
        b.iter(|| extract_json(black_box(&truncated)))
    });

    group.finish();
}

fn bench_parse_quiz(c: &mut Criterion) {
    let raw = payload();
    c.bench_function("parse_quiz", |b| b.iter(|| parse_quiz(black_box(&raw))));
}

criterion_group!(benches, bench_extract_json, bench_parse_quiz);
criterion_main!(benches);
