use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use quizgrade_core::partial_credit::{adjacent_pairs, per_pair};
use quizgrade_core::{GradingEngine, QuestionDefinition};

fn definition(value: serde_json::Value) -> QuestionDefinition {
    QuestionDefinition::from_json(&value).expect("valid bench definition")
}

fn bench_partial_credit(c: &mut Criterion) {
    let mut group = c.benchmark_group("partial_credit");

    let correct: Vec<String> = (0..100).map(|i| format!("item-{i}")).collect();
    let mut shuffled = correct.clone();
    shuffled.swap(10, 11);
    shuffled.swap(50, 90);

    group.bench_function("adjacent_pairs/100", |b| {
        b.iter(|| adjacent_pairs(black_box(&shuffled), black_box(&correct)))
    });

    group.bench_function("per_pair", |b| {
        b.iter(|| per_pair(black_box(7), black_box(9)))
    });

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let engine = GradingEngine::default();
    let mut group = c.benchmark_group("evaluate");

    let multi = definition(json!({
        "questionType": "multiple_choice_multi",
        "pointsPossible": 2,
        "content": {"correctAnswers": ["a", "c", "d"]}
    }));
    let multi_answer = json!({"selectedOptions": ["d", "a", "c"]});
    group.bench_function("multiple_choice_multi", |b| {
        b.iter(|| engine.evaluate(black_box(&multi), black_box(&multi_answer)))
    });

    let pairs: Vec<_> = (0..20)
        .map(|i| json!({"left": format!("l{i}"), "right": format!("r{i}")}))
        .collect();
    let matching = definition(json!({
        "questionType": "matching",
        "pointsPossible": 20,
        "content": {"correctPairs": pairs, "partialCreditStrategy": "per_pair"}
    }));
    let matching_answer = json!({"pairs": &pairs[..15]});
    group.bench_function("matching/20", |b| {
        b.iter(|| engine.evaluate(black_box(&matching), black_box(&matching_answer)))
    });

    let short = definition(json!({
        "questionType": "short_answer",
        "pointsPossible": 5,
        "content": {"keywords": [
            {"keyword": "photosynthesis", "required": true},
            {"keyword": "chlorophyll", "weight": 2},
            {"keyword": "sunlight", "synonyms": ["solar energy", "light"]}
        ]}
    }));
    let essay = "Photosynthesis is the process by which plants use chlorophyll to \
                 capture solar energy and turn water and carbon dioxide into glucose. "
        .repeat(10);
    let short_answer = json!({"text": essay});
    group.bench_function("short_answer", |b| {
        b.iter(|| engine.evaluate(black_box(&short), black_box(&short_answer)))
    });

    group.finish();
}

criterion_group!(benches, bench_partial_credit, bench_evaluate);
criterion_main!(benches);
