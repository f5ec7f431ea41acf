//! Scoring benchmark: isolation forest fit and per-observation classify.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rakshak_sentinel::config::ScorerConfig;
use rakshak_sentinel::model::{gaussian_baseline, Scorer};

fn bench_fit(c: &mut Criterion) {
    let config = ScorerConfig::default();
    let training = gaussian_baseline(&config);

    c.bench_function("fit_100_trees_100_rows", |b| {
        b.iter(|| Scorer::fit(black_box(&training), &config).unwrap())
    });
}

fn bench_classify(c: &mut Criterion) {
    let scorer = Scorer::fit_baseline(&ScorerConfig::default()).unwrap();

    let mut g = c.benchmark_group("classify");
    g.bench_function("centroid", |b| {
        b.iter(|| scorer.classify(black_box(&[50.0, 0.0, 10.0])).unwrap())
    });
    g.bench_function("outlier", |b| {
        b.iter(|| scorer.classify(black_box(&[0.5, 1.0, 10.0])).unwrap())
    });
    g.finish();
}

criterion_group!(benches, bench_fit, bench_classify);
criterion_main!(benches);
