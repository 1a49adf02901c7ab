//! Threshold deltas and their ranking
//!
//! A max level is mapped to its index on the primary axis (`None` → -1,
//! "fails at the first level"). The delta between two runs is
//! `after_index - before_index`: negative is a regression, positive an
//! improvement, zero is unchanged and never ranked.

use crate::classify::Classification;
use crate::level::{Level, Params};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Position of a max level on the axis
///
/// `None` and levels not on the axis both map to -1.
pub fn level_index(levels: &[Level], level: Option<&Level>) -> i64 {
    level
        .and_then(|level| levels.iter().position(|l| l == level))
        .map_or(-1, |idx| idx as i64)
}

/// `after_index - before_index`
pub fn level_delta(levels: &[Level], before: Option<&Level>, after: Option<&Level>) -> i64 {
    level_index(levels, after) - level_index(levels, before)
}

/// One changed threshold, tagged with where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedDelta {
    pub suite: String,

    /// Budget identity key
    pub budget: String,

    #[serde(rename = "where")]
    pub where_: Params,

    pub before_max_level: Option<Level>,
    pub after_max_level: Option<Level>,
    pub delta: i64,

    /// Classification of the after run's breach, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
}

impl RankedDelta {
    pub fn is_regression(&self) -> bool {
        self.delta < 0
    }

    pub fn is_improvement(&self) -> bool {
        self.delta > 0
    }
}

/// Regressions, most severe first
///
/// Ties keep their input order.
pub fn rank_regressions<I>(deltas: I) -> Vec<RankedDelta>
where
    I: IntoIterator<Item = RankedDelta>,
{
    let mut out: Vec<RankedDelta> = deltas.into_iter().filter(|d| d.is_regression()).collect();
    out.sort_by(|a, b| a.delta.cmp(&b.delta));
    out
}

/// Improvements, largest first
///
/// Ties keep their input order.
pub fn rank_improvements<I>(deltas: I) -> Vec<RankedDelta>
where
    I: IntoIterator<Item = RankedDelta>,
{
    let mut out: Vec<RankedDelta> = deltas.into_iter().filter(|d| d.is_improvement()).collect();
    out.sort_by(|a, b| b.delta.cmp(&a.delta));
    out
}

/// Most significant regression in a slice of deltas
///
/// The first one wins among equally large regressions.
pub fn most_significant<'a, I>(deltas: I) -> Option<&'a RankedDelta>
where
    I: IntoIterator<Item = &'a RankedDelta>,
{
    deltas
        .into_iter()
        .filter(|d| d.is_regression())
        .fold(None, |worst: Option<&RankedDelta>, d| match worst {
            Some(w) if w.delta.cmp(&d.delta) != Ordering::Greater => Some(w),
            _ => Some(d),
        })
}
