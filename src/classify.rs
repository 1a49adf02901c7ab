// Regression classification at the first failing level
//
// Only scans stopped by a budget breach are classified. The budget is
// re-evaluated at the failing level to see whether the median breaches too:
// a median breach means the typical run got slower (systemic), a p95-only
// breach is a tail event that needs reproducing before it is trusted.

use crate::budget::{evaluate_at, Budget, Reason};
use crate::level::{Level, Params};
use crate::suite_result::SuiteResult;
use crate::threshold::ThresholdResult;
use serde::{Deserialize, Serialize};

/// Shape of a budget breach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegressionKind {
    /// Median breaches as well as p95
    Systemic,
    /// Only p95 breaches; low confidence until reproduced
    TailOnly,
    /// Breach could not be re-evaluated
    Unknown,
}

impl RegressionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegressionKind::Systemic => "systemic",
            RegressionKind::TailOnly => "tailOnly",
            RegressionKind::Unknown => "unknown",
        }
    }
}

/// Classification of one budget breach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub kind: RegressionKind,

    /// Level the breach was observed at
    pub level: Level,

    /// Ratio over `maxRatio` (relative) or ms over `p95Ms` (absolute)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overshoot: Option<f64>,
}

/// Classify a threshold result
///
/// Returns `None` unless the scan stopped with `budgetExceeded`.
pub fn classify(
    suite: &SuiteResult,
    primary_axis: &str,
    budget: &Budget,
    where_: &Params,
    result: &ThresholdResult,
) -> Option<Classification> {
    if result.reason != Some(Reason::BudgetExceeded) {
        return None;
    }
    let level = result.first_fail_level.as_ref()?;

    let (kind, overshoot) = match evaluate_at(suite, primary_axis, budget, where_, level) {
        Ok(reading) if reading.median_exceeded() => {
            (RegressionKind::Systemic, Some(reading.overshoot()))
        }
        Ok(reading) if reading.p95_exceeded() => {
            (RegressionKind::TailOnly, Some(reading.overshoot()))
        }
        Ok(reading) => (RegressionKind::Unknown, Some(reading.overshoot())),
        Err(_) => (RegressionKind::Unknown, None),
    };

    Some(Classification {
        kind,
        level: level.clone(),
        overshoot,
    })
}
