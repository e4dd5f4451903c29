use std::hint::black_box;
use std::num::NonZeroUsize;

use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::json;
use studygen::llm::{OutputSchema, QuizSchema, build_prompt};
use studygen::request::{Difficulty, GenerationRequest};

fn quiz_request(count: usize) -> GenerationRequest {
    let source = "Photosynthesis converts light energy into chemical energy. ".repeat(200);
    GenerationRequest::new(
        &source,
        NonZeroUsize::new(count).expect("count is non-zero"),
        Difficulty::Medium,
    )
    .expect("source text is not blank")
}

fn bench_build_prompt(c: &mut Criterion) {
    let request = quiz_request(10);

    c.bench_function("build_prompt_quiz", |b| {
        b.iter(|| black_box(build_prompt(black_box(&request), &QuizSchema)));
    });
}

fn bench_decode_quiz(c: &mut Criterion) {
    let request = quiz_request(10);
    let questions: Vec<_> = (0..10)
        .map(|n| {
            json!({
                "question": format!("Question {n}?"),
                "option_a": "Light",
                "option_b": "Water",
                "option_c": "Soil",
                "option_d": "Wind",
                "answer": "A"
            })
        })
        .collect();
    let payload = json!({ "questions": questions }).to_string();

    c.bench_function("decode_quiz_reply", |b| {
        b.iter(|| {
            let decoded = QuizSchema
                .decode(black_box(&payload), &request)
                .expect("payload matches schema");
            black_box(decoded);
        });
    });
}

criterion_group!(benches, bench_build_prompt, bench_decode_quiz);
criterion_main!(benches);
