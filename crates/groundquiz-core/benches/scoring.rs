use criterion::{black_box, criterion_group, criterion_main, Criterion};

use groundquiz_core::fallback::fallback_quiz;
use groundquiz_core::relevance::{lexical_score, significant_tokens, LEXICAL_OFFSET};

const SOURCE: &str = "Backpropagation computes gradients of the loss with respect to every \
weight by applying the chain rule layer by layer, from the output back to the input. \
Each layer caches its activations during the forward pass so the backward pass can reuse \
them. Vanishing gradients appear when many small derivatives are multiplied together.";

fn bench_tokenize(c: &mut Criterion) {
    let long = SOURCE.repeat(20);
    let mut group = c.benchmark_group("significant_tokens");
    group.bench_function("paragraph", |b| {
        b.iter(|| significant_tokens(black_box(SOURCE)))
    });
    group.bench_function("long_document", |b| {
        b.iter(|| significant_tokens(black_box(&long)))
    });
    group.finish();
}

fn bench_lexical_score(c: &mut Criterion) {
    let quiz = fallback_quiz("Backpropagation", SOURCE);
    let questions = quiz.questions();

    c.bench_function("lexical_score/fallback_quiz", |b| {
        b.iter(|| lexical_score(black_box(SOURCE), black_box(questions), LEXICAL_OFFSET))
    });
}

criterion_group!(benches, bench_tokenize, bench_lexical_score);
criterion_main!(benches);
