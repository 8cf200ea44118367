use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lexiplan_core::tokenize;

const PARAGRAPH: &str = "It was the best of times, it was the worst of times; it was the age \
    of wisdom, it was the age of foolishness... \"Really?!\" she asked (twice). Don't \
    e-mail the U.S.A. office before 9:30, please!";

fn bench_tokenize_sentence(c: &mut Criterion) {
    c.bench_function("tokenize::short_sentence", |b| {
        b.iter(|| black_box(tokenize(black_box("Hello, world!"))))
    });
}

fn bench_tokenize_paragraph(c: &mut Criterion) {
    let text = PARAGRAPH.repeat(20);

    c.bench_function("tokenize::long_paragraph", |b| {
        b.iter(|| black_box(tokenize(black_box(&text))))
    });
}

criterion_group!(benches, bench_tokenize_sentence, bench_tokenize_paragraph);
criterion_main!(benches);
