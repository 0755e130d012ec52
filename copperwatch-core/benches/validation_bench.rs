//! Criterion benchmarks for CopperWatch hot paths.
//!
//! Benchmarks:
//! 1. Full walk-forward validation run (windowing + fit/predict + metrics)
//! 2. Confidence metric computation over long prediction vectors
//! 3. Scenario sweep

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use copperwatch_core::confidence::ConfidenceMetrics;
use copperwatch_core::domain::{FeatureTable, PriceBar, PriceSeries};
use copperwatch_core::predictor::LastValuePredictor;
use copperwatch_core::scenario::{self, ScenarioConfig};
use copperwatch_core::validate::Validator;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(n: usize) -> PriceSeries {
    let base_date = chrono::NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    let bars = (0..n)
        .map(|i| {
            let close = 68_000.0 + (i as f64 * 0.1).sin() * 2_000.0 + i as f64 * 5.0;
            PriceBar {
                date: base_date + chrono::Duration::days(i as i64),
                open: close - 30.0,
                high: close + 150.0,
                low: close - 150.0,
                close,
                volume: 1_000_000 + (i as u64 % 500_000),
            }
        })
        .collect();
    PriceSeries::new(bars).expect("ascending synthetic dates")
}

fn bench_validation_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation_run");
    for n in [500usize, 1_500] {
        let series = make_series(n);
        let features = FeatureTable::lagged_returns(&series, &[1, 5, 20]).expect("features");
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mut model = LastValuePredictor::default();
                let report = Validator::default()
                    .run(&mut model, &series, &features, Some(70_000.0))
                    .expect("validation run");
                black_box(report.metrics.composite_score)
            })
        });
    }
    group.finish();
}

fn bench_confidence_metrics(c: &mut Criterion) {
    let actual: Vec<f64> = (0..10_000)
        .map(|i| 68_000.0 + (i as f64 * 0.05).sin() * 1_000.0)
        .collect();
    let predicted: Vec<f64> = actual.iter().map(|v| v * 1.001).collect();

    c.bench_function("confidence_metrics_10k", |b| {
        b.iter(|| {
            let metrics =
                ConfidenceMetrics::compute(black_box(&predicted), black_box(&actual)).unwrap();
            black_box(metrics.composite_score)
        })
    });
}

fn bench_scenario_sweep(c: &mut Criterion) {
    let config = ScenarioConfig::default();
    c.bench_function("scenario_sweep", |b| {
        b.iter(|| black_box(scenario::run_all(black_box(70_000.0), &config)))
    });
}

criterion_group!(
    benches,
    bench_validation_run,
    bench_confidence_metrics,
    bench_scenario_sweep
);
criterion_main!(benches);
