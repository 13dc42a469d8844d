use std::{sync::Arc, time::Duration};

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use spacemin::{generate_random_dna, Encoder, Scoring, Spacer};

/// Fast iteration paths against the generic decode -> score -> select loop.
fn bench(c: &mut Criterion) {
    let mut text = generate_random_dna(1_000_000, 31415);
    for i in (5000..text.len()).step_by(10_000) {
        text[i] = b'N';
    }
    let text = &text;

    let mut g = c.benchmark_group("g");
    for (name, k, w, skips) in [
        ("kmers", 21, 21, vec![]),
        ("window", 21, 31, vec![]),
        ("spaced", 16, 40, vec![0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0]),
    ] {
        let sp = Arc::new(Spacer::new(k, w, &skips).unwrap());
        for (sname, scoring) in [("lex", Scoring::Lex), ("entropy", Scoring::Entropy)] {
            let mut enc = Encoder::new(sp.clone(), &scoring, true);
            g.bench_function(format!("{name}_{sname}_fast"), |b| {
                b.iter(|| {
                    let mut n = 0u64;
                    enc.for_each(text, |m| n ^= m);
                    black_box(n)
                });
            });
            g.bench_function(format!("{name}_{sname}_generic"), |b| {
                b.iter(|| black_box(enc.assign(text).fold(0u64, |n, m| n ^ m)));
            });
        }
    }
}

criterion_group!(
    name = group;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(500))
        .measurement_time(Duration::from_millis(2000))
        .sample_size(10);
    targets = bench
);
criterion_main!(group);
