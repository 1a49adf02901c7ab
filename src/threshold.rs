//! Threshold search along the primary axis
//!
//! For one budget and one where slice, levels of the primary axis are
//! scanned in declared order. Each passing level raises `max_level`; the
//! first level that fails (missing data or a budget breach) ends the scan
//! for good. Later levels are never consulted, even if they would pass.
//!
//! ```
//! use perfbound::budget::Budget;
//! use perfbound::level::{Level, Params};
//! use perfbound::suite_result::{Metric, Point, PointStatus, SuiteResult};
//! use perfbound::suite_spec::{Axes, SuiteSpec};
//! use perfbound::threshold::search_threshold;
//!
//! let spec = SuiteSpec::new(
//!     "converge.txnCommit",
//!     "steps",
//!     Axes::new().with_axis("steps", vec![200.into(), 800.into()]),
//! );
//! let at = |steps: i32, p95: f64| {
//!     let mut params = Params::new();
//!     params.insert("steps".to_string(), steps.into());
//!     Point::new(params, PointStatus::Ok).with_metric(Metric::ok("m", 30, p95 / 2.0, p95))
//! };
//! let suite = SuiteResult::new("converge.txnCommit")
//!     .with_point(at(200, 10.0))
//!     .with_point(at(800, 40.0));
//!
//! let result = search_threshold(&spec, &suite, &Budget::absolute("m", 16.0), &Params::new());
//! assert_eq!(result.max_level, Some(Level::from(200)));
//! assert_eq!(result.first_fail_level, Some(Level::from(800)));
//! ```

use crate::budget::{evaluate_at, reference_params, Budget, Reason};
use crate::level::{display_level, params_key, Level, Params};
use crate::lookup::find_point;
use crate::suite_result::SuiteResult;
use crate::suite_spec::SuiteSpec;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of one threshold scan
///
/// `reason` is set exactly when `first_fail_level` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdResult {
    /// Highest level accepted before the scan stopped
    pub max_level: Option<Level>,

    /// Level at which the scan stopped
    pub first_fail_level: Option<Level>,

    pub reason: Option<Reason>,
}

impl ThresholdResult {
    fn passed(max_level: Option<Level>) -> Self {
        Self {
            max_level,
            first_fail_level: None,
            reason: None,
        }
    }

    fn stopped(max_level: Option<Level>, level: &Level, reason: Reason) -> Self {
        Self {
            max_level,
            first_fail_level: Some(level.clone()),
            reason: Some(reason),
        }
    }

    /// True when the scan ran through every level
    pub fn is_clean(&self) -> bool {
        self.reason.is_none()
    }

    /// True when the scan stopped on a measured budget breach
    pub fn stopped_by_budget(&self) -> bool {
        matches!(self.reason, Some(Reason::BudgetExceeded))
    }

    /// Clean scans and budget breaches carry comparable data; any other
    /// stop means the run was missing or could not use a point
    pub fn has_comparable_data(&self) -> bool {
        self.reason.as_ref().map_or(true, Reason::is_budget_exceeded)
    }
}

/// Scan the spec's primary axis
pub fn search_threshold(
    spec: &SuiteSpec,
    suite: &SuiteResult,
    budget: &Budget,
    where_: &Params,
) -> ThresholdResult {
    search_threshold_over(
        spec.primary_levels(),
        &spec.primary_axis,
        suite,
        budget,
        where_,
    )
}

/// Scan an explicit list of primary-axis levels
pub fn search_threshold_over(
    levels: &[Level],
    primary_axis: &str,
    suite: &SuiteResult,
    budget: &Budget,
    where_: &Params,
) -> ThresholdResult {
    let mut max_level: Option<Level> = None;

    for level in levels {
        let reason = match evaluate_at(suite, primary_axis, budget, where_, level) {
            Ok(reading) if !reading.p95_exceeded() => {
                max_level = Some(level.clone());
                continue;
            }
            Ok(_) => Reason::BudgetExceeded,
            Err(reason) => reason,
        };

        debug!(
            suite = %suite.id,
            budget = %budget.key(),
            slice = %params_key(where_),
            level = %level,
            max_level = %display_level(max_level.as_ref()),
            reason = %reason,
            "threshold scan stopped"
        );
        return ThresholdResult::stopped(max_level, level, reason);
    }

    ThresholdResult::passed(max_level)
}

/// Whether a run holds every point the budget needs at one level
pub fn has_points_for(
    suite: &SuiteResult,
    primary_axis: &str,
    budget: &Budget,
    where_: &Params,
    level: &Level,
) -> bool {
    match budget {
        Budget::Absolute(_) => {
            let mut params = where_.clone();
            params.insert(primary_axis.to_string(), level.clone());
            find_point(suite, &params).is_some()
        }
        Budget::Relative(relative) => {
            let (numerator, denominator) =
                reference_params(relative, primary_axis, where_, level);
            find_point(suite, &numerator).is_some() && find_point(suite, &denominator).is_some()
        }
    }
}

/// Leading primary-axis levels covered by both runs
///
/// Stops at the first level where either run lacks a needed point, so
/// the result is always a prefix of the declared levels.
pub fn common_prefix_levels(
    spec: &SuiteSpec,
    before: &SuiteResult,
    after: &SuiteResult,
    budget: &Budget,
    where_: &Params,
) -> Vec<Level> {
    spec.primary_levels()
        .iter()
        .take_while(|level| {
            has_points_for(before, &spec.primary_axis, budget, where_, level)
                && has_points_for(after, &spec.primary_axis, budget, where_, level)
        })
        .cloned()
        .collect()
}
