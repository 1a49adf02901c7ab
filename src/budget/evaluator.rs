// Budget evaluation at one point (absolute) or one point pair (relative)
//
// All accessors return Result<_, Reason>; nothing here panics on missing or
// malformed data.

use super::reason::Reason;
use super::reference::parse_ref;
use super::types::{AbsoluteBudget, Budget, RelativeBudget};
use crate::level::{merge_params, Level, Params};
use crate::lookup::find_point;
use crate::suite_result::{MetricOutcome, Point, SuiteResult};
use serde::{Deserialize, Serialize};

/// Statistics of one metric at one point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricReading {
    pub p95_ms: f64,
    pub median_ms: f64,
    pub n: u64,
}

/// Read a metric from a point that may not exist
///
/// Stops, in order, on: missing point, point status other than `ok` (its
/// own reason, else its status name), missing metric, unavailable metric.
pub fn read_metric(point: Option<&Point>, metric: &str) -> Result<MetricReading, Reason> {
    let point = point.ok_or(Reason::MissingPoint)?;

    if !point.status.is_ok() {
        let reason = point
            .reason
            .clone()
            .unwrap_or_else(|| point.status.as_str().to_string());
        return Err(Reason::Unavailable(reason));
    }

    let metric = point.metric(metric).ok_or(Reason::MetricMissing)?;
    match &metric.outcome {
        MetricOutcome::Ok { stats } => Ok(MetricReading {
            p95_ms: stats.p95_ms,
            median_ms: stats.median_ms,
            n: stats.n,
        }),
        MetricOutcome::Unavailable { reason } => Err(Reason::Unavailable(reason.clone())),
    }
}

/// Shared breach predicate for ratio budgets
///
/// A breach needs both a ratio above `max_ratio` and an absolute delta
/// above `min_delta_ms`.
pub fn exceeds(ratio: f64, delta_ms: f64, max_ratio: f64, min_delta_ms: f64) -> bool {
    ratio > max_ratio && delta_ms > min_delta_ms
}

/// Absolute budget evaluated at one point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsoluteReading {
    pub reading: MetricReading,
    pub ceiling_ms: f64,
}

impl AbsoluteReading {
    pub fn p95_exceeded(&self) -> bool {
        self.reading.p95_ms > self.ceiling_ms
    }

    pub fn median_exceeded(&self) -> bool {
        self.reading.median_ms > self.ceiling_ms
    }

    /// How far p95 sits above the ceiling (negative when within budget)
    pub fn overshoot(&self) -> f64 {
        self.reading.p95_ms - self.ceiling_ms
    }
}

/// Evaluate an absolute budget at a point that may not exist
pub fn evaluate_absolute(
    budget: &AbsoluteBudget,
    point: Option<&Point>,
) -> Result<AbsoluteReading, Reason> {
    let reading = read_metric(point, &budget.metric)?;
    Ok(AbsoluteReading {
        reading,
        ceiling_ms: budget.p95_ms,
    })
}

/// Relative budget evaluated at one numerator/denominator pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelativeReading {
    pub numerator: MetricReading,
    pub denominator: MetricReading,
    pub ratio_p95: f64,
    pub delta_p95_ms: f64,
    pub ratio_median: f64,
    pub delta_median_ms: f64,
    /// Smaller of the two sample counts
    pub n: u64,
    pub max_ratio: f64,
    pub min_delta_ms: f64,
}

impl RelativeReading {
    fn new(
        numerator: MetricReading,
        denominator: MetricReading,
        max_ratio: f64,
        min_delta_ms: f64,
    ) -> Self {
        Self {
            numerator,
            denominator,
            ratio_p95: numerator.p95_ms / denominator.p95_ms,
            delta_p95_ms: numerator.p95_ms - denominator.p95_ms,
            ratio_median: numerator.median_ms / denominator.median_ms,
            delta_median_ms: numerator.median_ms - denominator.median_ms,
            n: numerator.n.min(denominator.n),
            max_ratio,
            min_delta_ms,
        }
    }

    pub fn p95_exceeded(&self) -> bool {
        exceeds(
            self.ratio_p95,
            self.delta_p95_ms,
            self.max_ratio,
            self.min_delta_ms,
        )
    }

    pub fn median_exceeded(&self) -> bool {
        exceeds(
            self.ratio_median,
            self.delta_median_ms,
            self.max_ratio,
            self.min_delta_ms,
        )
    }

    pub fn overshoot(&self) -> f64 {
        self.ratio_p95 - self.max_ratio
    }
}

/// Build the numerator and denominator assignments for one slice level
pub(crate) fn reference_params(
    budget: &RelativeBudget,
    primary_axis: &str,
    where_: &Params,
    level: &Level,
) -> (Params, Params) {
    let mut pinned = Params::new();
    pinned.insert(primary_axis.to_string(), level.clone());

    let numerator = merge_params([where_, &parse_ref(&budget.numerator_ref), &pinned]);
    let denominator = merge_params([where_, &parse_ref(&budget.denominator_ref), &pinned]);
    (numerator, denominator)
}

/// Evaluate a relative budget for one where slice at one primary level
///
/// Stops on: missing numerator point, missing denominator point, numerator
/// metric failure (`numerator:` prefix), denominator metric failure
/// (`denominator:` prefix), non-positive denominator p95 or median.
pub fn evaluate_relative(
    suite: &SuiteResult,
    primary_axis: &str,
    budget: &RelativeBudget,
    where_: &Params,
    level: &Level,
) -> Result<RelativeReading, Reason> {
    let (numerator_params, denominator_params) =
        reference_params(budget, primary_axis, where_, level);

    let numerator_point = find_point(suite, &numerator_params).ok_or(Reason::MissingNumerator)?;
    let denominator_point =
        find_point(suite, &denominator_params).ok_or(Reason::MissingDenominator)?;

    let numerator = read_metric(Some(numerator_point), &budget.metric)
        .map_err(|r| Reason::Numerator(Box::new(r)))?;
    let denominator = read_metric(Some(denominator_point), &budget.metric)
        .map_err(|r| Reason::Denominator(Box::new(r)))?;

    // NaN fails both comparisons and is rejected here too
    if !(denominator.p95_ms > 0.0) || !(denominator.median_ms > 0.0) {
        return Err(Reason::DenominatorZero);
    }

    Ok(RelativeReading::new(
        numerator,
        denominator,
        budget.max_ratio,
        budget.min_delta_ms(),
    ))
}

/// Either kind of reading, for code that handles both budget shapes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BudgetReading {
    Absolute(AbsoluteReading),
    Relative(RelativeReading),
}

impl BudgetReading {
    pub fn p95_exceeded(&self) -> bool {
        match self {
            BudgetReading::Absolute(r) => r.p95_exceeded(),
            BudgetReading::Relative(r) => r.p95_exceeded(),
        }
    }

    pub fn median_exceeded(&self) -> bool {
        match self {
            BudgetReading::Absolute(r) => r.median_exceeded(),
            BudgetReading::Relative(r) => r.median_exceeded(),
        }
    }

    pub fn overshoot(&self) -> f64 {
        match self {
            BudgetReading::Absolute(r) => r.overshoot(),
            BudgetReading::Relative(r) => r.overshoot(),
        }
    }
}

/// Evaluate any budget for one where slice at one primary level
pub fn evaluate_at(
    suite: &SuiteResult,
    primary_axis: &str,
    budget: &Budget,
    where_: &Params,
    level: &Level,
) -> Result<BudgetReading, Reason> {
    match budget {
        Budget::Absolute(b) => {
            let mut params = where_.clone();
            params.insert(primary_axis.to_string(), level.clone());
            evaluate_absolute(b, find_point(suite, &params)).map(BudgetReading::Absolute)
        }
        Budget::Relative(b) => {
            evaluate_relative(suite, primary_axis, b, where_, level).map(BudgetReading::Relative)
        }
    }
}
