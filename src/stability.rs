// Run-to-run stability check
//
// Large p95 swings at the same point between two runs usually mean the
// machine was disturbed (tab switch, power saving, background load) rather
// than that the code changed. The first such swing is surfaced as a note on
// the suite.

use crate::budget::read_metric;
use crate::config::StabilityConfig;
use crate::level::{params_key, Params};
use crate::lookup::find_point;
use crate::slices::point_params;
use crate::suite_result::SuiteResult;
use crate::suite_spec::SuiteSpec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// First unstable metric/point found in a suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StabilityWarning {
    pub metric: String,
    pub params: Params,
    pub baseline_p95_ms: f64,
    pub after_p95_ms: f64,
    pub diff_ms: f64,
    pub limit_ms: f64,
}

impl fmt::Display for StabilityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stabilityWarning: metric={} {} baselineP95={:.2}ms afterP95={:.2}ms diff={:.2}ms limit={:.2}ms \
             (possible causes: tab switch, power-saving mode, background load, browser/version drift)",
            self.metric,
            params_key(&self.params),
            self.baseline_p95_ms,
            self.after_p95_ms,
            self.diff_ms,
            self.limit_ms
        )
    }
}

/// Compare p95 at every point both runs measured
///
/// Metric names are visited in first-seen order (the before run's, then
/// the after run's), points in axis order. Points without a readable p95
/// on both sides, or with a non-positive baseline, are skipped.
pub fn check_stability(
    spec: &SuiteSpec,
    before: &SuiteResult,
    after: &SuiteResult,
    limits: &StabilityConfig,
) -> Option<StabilityWarning> {
    let mut metrics: Vec<&str> = Vec::new();
    for name in before.metric_names().chain(after.metric_names()) {
        if !metrics.contains(&name) {
            metrics.push(name);
        }
    }
    let assignments = point_params(spec);

    for metric in metrics {
        for params in &assignments {
            let (Ok(b), Ok(a)) = (
                read_metric(find_point(before, params), metric),
                read_metric(find_point(after, params), metric),
            ) else {
                continue;
            };

            let baseline = b.p95_ms;
            let current = a.p95_ms;
            if !baseline.is_finite() || !current.is_finite() || baseline <= 0.0 {
                continue;
            }

            let diff = (current - baseline).abs();
            let limit = limits.limit_for(baseline);
            if diff > limit {
                let warning = StabilityWarning {
                    metric: metric.to_string(),
                    params: params.clone(),
                    baseline_p95_ms: baseline,
                    after_p95_ms: current,
                    diff_ms: diff,
                    limit_ms: limit,
                };
                warn!(suite = %spec.id, "{}", warning);
                return Some(warning);
            }
        }
    }
    None
}
