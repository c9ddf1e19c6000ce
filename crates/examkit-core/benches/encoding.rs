use criterion::{black_box, criterion_group, criterion_main, Criterion};

use examkit_core::answers::{AnswerKey, AnswerStore, AnswerValue, CellKey};
use examkit_core::encoder::encode_submission;

fn make_store(questions: usize, tables: usize) -> AnswerStore {
    let mut store = AnswerStore::new();
    for i in 0..questions {
        let value = if i % 3 == 0 {
            AnswerValue::List(vec!["A".into(), "C".into()])
        } else {
            AnswerValue::single(format!("answer {i}"))
        };
        store.set(AnswerKey::question(format!("q{i}")), value);
    }
    for t in 0..tables {
        for row in 0..5 {
            for col in 1..3 {
                let cell = CellKey::new(format!("t{t}"), row, col);
                let cell = if col == 2 { cell.with_blank(0) } else { cell };
                store.set(AnswerKey::Cell(cell), AnswerValue::single(format!("{row}-{col}")));
            }
        }
    }
    store
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_submission");

    let small = make_store(10, 0);
    let full = make_store(40, 4);
    let tables = make_store(0, 20);

    group.bench_function("10_questions", |b| b.iter(|| encode_submission(black_box(&small))));
    group.bench_function("40_questions_4_tables", |b| {
        b.iter(|| encode_submission(black_box(&full)))
    });
    group.bench_function("20_tables", |b| b.iter(|| encode_submission(black_box(&tables))));

    group.finish();
}

fn bench_flat_round_trip(c: &mut Criterion) {
    let store = make_store(40, 4);
    let flat = store.to_flat();
    c.bench_function("from_flat_40_4", |b| {
        b.iter(|| {
            AnswerStore::from_flat(
                black_box(flat.clone()),
                |id| id.starts_with('t'),
            )
        })
    });
}

criterion_group!(benches, bench_encode, bench_flat_round_trip);
criterion_main!(benches);
