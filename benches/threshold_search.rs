//! Threshold search and full diff benchmarks
//!
//! Measures a single scan over a long primary axis and a complete
//! `DiffEngine::diff` over a matrix with several non-primary axes.
//!
//! # Run Instructions
//!
//! ```bash
//! cargo bench --bench threshold_search
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use perfbound::budget::Budget;
use perfbound::level::{Level, Params};
use perfbound::suite_result::{Metric, Point, PointStatus, RunMeta, RunReport, SuiteResult};
use perfbound::suite_spec::{Axes, Matrix, SuiteSpec};
use perfbound::threshold::search_threshold;
use perfbound::{DiffConfig, DiffEngine};

const METRIC: &str = "runtime.txnCommitMs";

fn steps(n: usize) -> Vec<Level> {
    (1..=n).map(|i| Level::from(i as f64 * 100.0)).collect()
}

fn modes(n: usize) -> Vec<Level> {
    (0..n).map(|i| Level::from(format!("mode{}", i))).collect()
}

fn spec(n_steps: usize, n_modes: usize) -> SuiteSpec {
    SuiteSpec::new(
        "bench.suite",
        "steps",
        Axes::new()
            .with_axis("steps", steps(n_steps))
            .with_axis("mode", modes(n_modes)),
    )
    .with_budget(Budget::absolute(METRIC, 1_000_000.0))
    .with_budget(Budget::relative(METRIC, "mode=mode1", "mode=mode0", 2.0, Some(1.0)))
}

/// Every point of the grid, p95 growing linearly with steps
fn suite(n_steps: usize, n_modes: usize, slope: f64) -> SuiteResult {
    let mut suite = SuiteResult::new("bench.suite");
    for s in steps(n_steps) {
        for m in modes(n_modes) {
            let p95 = s.as_f64().unwrap_or(0.0) * slope;
            let mut params = Params::new();
            params.insert("steps".to_string(), s.clone());
            params.insert("mode".to_string(), m);
            suite.points.push(
                Point::new(params, PointStatus::Ok).with_metric(Metric::ok(METRIC, 30, p95 / 2.0, p95)),
            );
        }
    }
    suite
}

fn bench_single_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("threshold_scan");

    for n_steps in [10, 100, 1000] {
        let spec = spec(n_steps, 2);
        let suite = suite(n_steps, 2, 1.0);
        let budget = &spec.budgets[0];
        let mut where_ = Params::new();
        where_.insert("mode".to_string(), Level::from("mode0"));

        group.bench_with_input(BenchmarkId::from_parameter(n_steps), &n_steps, |b, _| {
            b.iter(|| search_threshold(black_box(&spec), black_box(&suite), budget, &where_));
        });
    }

    group.finish();
}

fn bench_full_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("delta_report");

    for n_modes in [2, 8, 32] {
        let spec = spec(50, n_modes);
        let matrix = Matrix::new("bench").with_suite(spec);
        let mut before = RunReport::new(RunMeta::default());
        before.suites.push(suite(50, n_modes, 1.0));
        let mut after = RunReport::new(RunMeta::default());
        after.suites.push(suite(50, n_modes, 1.5));

        for (name, config) in [("strict", DiffConfig::strict()), ("triage", DiffConfig::triage())] {
            let engine = DiffEngine::new(config);
            group.bench_with_input(BenchmarkId::new(name, n_modes), &n_modes, |b, _| {
                b.iter(|| engine.diff(black_box(&matrix), black_box(&before), black_box(&after)));
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_single_scan, bench_full_diff);
criterion_main!(benches);
