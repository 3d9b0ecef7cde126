use std::path::PathBuf;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use quizgrade_core::model::QuestionType;
use quizgrade_core::normalize::normalize;
use quizgrade_core::parser::parse_bank_str;

fn bank_toml(questions: usize) -> String {
    let mut toml = String::from("[bank]\nid = \"bench\"\nname = \"Bench\"\n");
    for i in 0..questions {
        toml.push_str(&format!(
            r#"
[[questions]]
id = "q{i}"
questionType = "ordering"
pointsPossible = 3

[questions.content]
correctOrder = ["a", "b", "c", "d"]
partialCreditStrategy = "adjacent_pairs"
"#
        ));
    }
    toml
}

fn bench_parse_bank(c: &mut Criterion) {
    let small = bank_toml(10);
    let large = bank_toml(200);
    let path = PathBuf::from("bench.toml");

    let mut group = c.benchmark_group("parse_bank");
    group.bench_function("10 questions", |b| {
        b.iter(|| parse_bank_str(black_box(&small), &path))
    });
    group.bench_function("200 questions", |b| {
        b.iter(|| parse_bank_str(black_box(&large), &path))
    });
    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    let wrapped = json!({"selectedOptions": ["a", "b", "c", "b"]});
    group.bench_function("multi_choice/wrapped", |b| {
        b.iter(|| normalize(QuestionType::MultipleChoiceMulti, black_box(&wrapped)))
    });

    let pairs = json!((0..50)
        .map(|i| json!({"left": format!("l{i}"), "right": format!("r{i}")}))
        .collect::<Vec<_>>());
    group.bench_function("matching/50", |b| {
        b.iter(|| normalize(QuestionType::Matching, black_box(&pairs)))
    });

    let malformed = json!({"selectedOption": "a", "pointsPossible": 100});
    group.bench_function("malformed", |b| {
        b.iter(|| normalize(QuestionType::MultipleChoiceSingle, black_box(&malformed)))
    });

    group.finish();
}

criterion_group!(benches, bench_parse_bank, bench_normalize);
criterion_main!(benches);
