//! Criterion benchmarks for the sweep harness.
//!
//! Run with: `cargo bench -p sweeplab-runner`

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sweeplab_core::domain::PriceBar;
use sweeplab_runner::{rank_rows, run_sweep, SweepConfig};

fn make_bars(n: usize, phase: f64) -> Vec<PriceBar> {
    let base = chrono::NaiveDate::from_ymd_opt(2025, 3, 5)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.05 + phase).sin() * 8.0;
            PriceBar::new(base + chrono::Duration::minutes(15 * i as i64), close)
        })
        .collect()
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep");
    group.sample_size(10);

    let series: BTreeMap<String, Vec<PriceBar>> = [("BTCUSDT", 0.0), ("ETHUSDT", 1.0)]
        .into_iter()
        .map(|(name, phase)| (name.to_string(), make_bars(960, phase)))
        .collect();

    for parallel in [false, true] {
        let mut config = SweepConfig::default();
        config.output.parallel = parallel;
        let label = if parallel { "parallel" } else { "sequential" };
        group.bench_with_input(BenchmarkId::from_parameter(label), &config, |b, config| {
            b.iter(|| run_sweep(black_box(config), &series, 42));
        });
    }
    group.finish();
}

fn bench_ranking(c: &mut Criterion) {
    let series: BTreeMap<String, Vec<PriceBar>> =
        [("BTCUSDT".to_string(), make_bars(960, 0.0))].into_iter().collect();
    let mut config = SweepConfig::default();
    config.monte_carlo.count = 200;
    let report = run_sweep(&config, &series, 7);
    let rows = &report.instruments[0].summaries;

    c.bench_function("rank_rows", |b| b.iter(|| rank_rows(black_box(rows))));
}

criterion_group!(benches, bench_sweep, bench_ranking);
criterion_main!(benches);
