//! Feed benchmark: producer push and consumer snapshot on a full window.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rakshak_sentinel::config::ScorerConfig;
use rakshak_sentinel::feed::RollingFeed;
use rakshak_sentinel::model::Scorer;
use rakshak_sentinel::SyntheticGenerator;

fn bench_push(c: &mut Criterion) {
    let feed = RollingFeed::new(30);
    let idle = SyntheticGenerator::new(&ScorerConfig::default(), 10.0, Some(1)).next_idle();

    c.bench_function("feed_push_full_window", |b| {
        b.iter(|| feed.push(black_box(idle.clone())))
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let config = ScorerConfig::default();
    let scorer = Scorer::fit_baseline(&config).unwrap();
    let mut generator = SyntheticGenerator::new(&config, 10.0, Some(1));
    let feed = RollingFeed::new(30);
    for _ in 0..30 {
        feed.push(generator.next_normal(&scorer));
    }

    c.bench_function("feed_snapshot_30", |b| b.iter(|| black_box(feed.snapshot())));
    c.bench_function("feed_summary_30", |b| b.iter(|| black_box(feed.summary())));
}

criterion_group!(benches, bench_push, bench_snapshot);
criterion_main!(benches);
