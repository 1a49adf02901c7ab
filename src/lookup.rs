//! Exact-match point lookup by partial parameter assignment

use crate::level::Params;
use crate::suite_result::{Point, SuiteResult};

/// Does `point` agree with every constrained key?
///
/// Keys absent from `constraints` are free. A constrained key the point
/// does not carry never matches.
pub fn matches(point: &Point, constraints: &Params) -> bool {
    constraints
        .iter()
        .all(|(k, v)| point.params.get(k) == Some(v))
}

/// First point of `suite` matching `constraints`
///
/// Points are expected to be unique per full assignment; when several
/// match, the first in collection order wins.
pub fn find_point<'a>(suite: &'a SuiteResult, constraints: &Params) -> Option<&'a Point> {
    suite.points.iter().find(|p| matches(p, constraints))
}

/// Whether any point of `suite` matches `constraints`
pub fn has_any_point(suite: &SuiteResult, constraints: &Params) -> bool {
    find_point(suite, constraints).is_some()
}
