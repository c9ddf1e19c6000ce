use criterion::{black_box, criterion_group, criterion_main, Criterion};

use examkit_core::passage::segment;
use examkit_core::tokens::tokenize;

fn bench_segment(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment");

    let markers = generate_passage(8, |i| format!("[{i}]"));
    let letters = generate_passage(8, |i| format!("{}.", (b'A' + i as u8) as char));
    let unmarked = "Plain prose with no paragraph markers at all. ".repeat(200);
    let long = generate_passage(200, |i| format!("[{i}]"));

    group.bench_function("8_markers", |b| b.iter(|| segment(black_box(&markers))));
    group.bench_function("8_letters", |b| b.iter(|| segment(black_box(&letters))));
    group.bench_function("unmarked", |b| b.iter(|| segment(black_box(&unmarked))));
    group.bench_function("200_markers", |b| b.iter(|| segment(black_box(&long))));

    group.finish();
}

fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");

    let simple = "The museum opens at ___ and closes at ___.";
    let template = {
        let mut s = String::new();
        for i in 1..=40 {
            s.push_str(&format!("Item {i} costs {{{{{i}}}}} pounds. "));
        }
        s
    };

    group.bench_function("two_blanks", |b| b.iter(|| tokenize(black_box(simple))));
    group.bench_function("40_references", |b| b.iter(|| tokenize(black_box(&template))));

    group.finish();
}

fn generate_passage(n: usize, marker: impl Fn(usize) -> String) -> String {
    let mut s = String::new();
    for i in 0..n {
        s.push_str(&marker(i));
        s.push(' ');
        s.push_str(&"The paragraph discusses a research finding in some detail. ".repeat(6));
        s.push_str("\n\n");
    }
    s
}

criterion_group!(benches, bench_segment, bench_tokenize);
criterion_main!(benches);
