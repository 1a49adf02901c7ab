// Integration test utilities
//
// Builders for matrices, suite results and run metadata shared by the
// integration tests.

#![allow(dead_code)]

use perfbound::budget::Budget;
use perfbound::level::{Level, Params};
use perfbound::suite_result::{
    BrowserEnv, GitInfo, Metric, Point, PointStatus, RunConfig, RunEnv, RunMeta, RunReport,
    SuiteResult,
};
use perfbound::suite_spec::{Axes, Matrix, SuiteSpec};
use perfbound::validate::matrix_hash;
use std::sync::Once;

pub const MATRIX_ID: &str = "perf-matrix-v1";
pub const MATRIX_TEXT: &str = "{\"id\":\"perf-matrix-v1\"}\n";
pub const METRIC: &str = "runtime.txnCommitMs";

/// Route library logs to the test harness (set RUST_LOG to see them)
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn params(pairs: &[(&str, Level)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub fn steps_axis() -> Vec<Level> {
    vec![200.into(), 800.into(), 2000.into()]
}

/// Suite result assembled point by point
pub struct SuiteBuilder {
    suite: SuiteResult,
}

impl SuiteBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            suite: SuiteResult::new(id),
        }
    }

    /// Point whose `METRIC` has the given median and p95
    pub fn ok(mut self, pairs: &[(&str, Level)], median_ms: f64, p95_ms: f64) -> Self {
        self.suite.points.push(
            Point::new(params(pairs), PointStatus::Ok)
                .with_metric(Metric::ok(METRIC, 30, median_ms, p95_ms)),
        );
        self
    }

    /// Point collected with a non-ok status
    pub fn status(mut self, pairs: &[(&str, Level)], status: PointStatus) -> Self {
        self.suite.points.push(Point::new(params(pairs), status));
        self
    }

    pub fn point(mut self, point: Point) -> Self {
        self.suite.points.push(point);
        self
    }

    pub fn budget(mut self, budget: Budget) -> Self {
        self.suite.budgets.push(budget);
        self
    }

    pub fn build(self) -> SuiteResult {
        self.suite
    }
}

/// Single-axis `steps` suite with equal median and p95 at each level
pub fn steps_suite(id: &str, p95s: &[(i32, f64)]) -> SuiteResult {
    p95s.iter()
        .fold(SuiteBuilder::new(id), |b, (steps, p95)| {
            b.ok(&[("steps", (*steps).into())], *p95, *p95)
        })
        .build()
}

pub fn steps_spec(id: &str, budget: Budget) -> SuiteSpec {
    SuiteSpec::new(id, "steps", Axes::new().with_axis("steps", steps_axis())).with_budget(budget)
}

pub fn matrix(suites: Vec<SuiteSpec>) -> Matrix {
    suites
        .into_iter()
        .fold(Matrix::new(MATRIX_ID), |m, s| m.with_suite(s))
}

/// Metadata of a clean run collected against `MATRIX_TEXT`
pub fn meta() -> RunMeta {
    RunMeta {
        created_at: Some("2026-01-01T00:00:00.000Z".to_string()),
        matrix_id: MATRIX_ID.to_string(),
        matrix_hash: Some(matrix_hash(MATRIX_TEXT)),
        git: Some(GitInfo {
            branch: Some("main".to_string()),
            commit: Some("1a2b3c4".to_string()),
            dirty: Some(false),
        }),
        config: Some(RunConfig {
            runs: Some(30.0),
            warmup_discard: Some(5.0),
            timeout_ms: Some(30000.0),
            headless: Some(true),
            profile: Some("default".to_string()),
            ..RunConfig::default()
        }),
        env: Some(RunEnv {
            os: Some("linux".to_string()),
            arch: Some("x64".to_string()),
            node: Some("v22.1.0".to_string()),
            browser: Some(BrowserEnv {
                name: Some("chromium".to_string()),
                version: Some("131.0.6778.33".to_string()),
                headless: Some(true),
            }),
            ..RunEnv::default()
        }),
        ..RunMeta::default()
    }
}

pub fn report(meta: RunMeta, suites: Vec<SuiteResult>) -> RunReport {
    let mut report = RunReport::new(meta);
    report.suites = suites;
    report
}
