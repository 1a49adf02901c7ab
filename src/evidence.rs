// Evidence deltas: non-timing counters compared between runs
//
// `budget.cutOffCount` is aggregated per where slice (all non-primary axes),
// taking the first primary level that carries it. Every other evidence name
// is aggregated over every full parameter assignment of the suite.

use crate::level::Params;
use crate::lookup::find_point;
use crate::slices::{non_primary_slices, point_params};
use crate::suite_result::{EvidenceOutcome, EvidenceUnit, EvidenceValue, Point, SuiteResult};
use crate::suite_spec::SuiteSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Evidence name recording how often a budget cut a scenario short
pub const CUT_OFF_COUNT: &str = "budget.cutOffCount";

/// What the evidence was aggregated over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EvidenceScope {
    Points,
    WhereSlices,
}

impl EvidenceScope {
    fn as_str(&self) -> &'static str {
        match self {
            EvidenceScope::Points => "points",
            EvidenceScope::WhereSlices => "whereSlices",
        }
    }
}

/// Aggregate of one evidence name over one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceAgg {
    pub ok: u64,
    pub unavailable: u64,
    pub missing: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<EvidenceValue>,
}

impl EvidenceAgg {
    fn has_gaps(&self) -> bool {
        self.unavailable > 0 || self.missing > 0
    }

    fn has_signal(&self) -> bool {
        match &self.value {
            Some(EvidenceValue::Number(n)) => *n != 0.0,
            Some(EvidenceValue::Text(s)) => !s.is_empty(),
            None => false,
        }
    }

    fn describe(&self) -> String {
        format!(
            "value={} ok={} unavailable={} missing={}",
            show_value(self.value.as_ref()),
            self.ok,
            self.unavailable,
            self.missing
        )
    }
}

fn show_value(value: Option<&EvidenceValue>) -> String {
    match value {
        Some(EvidenceValue::Number(n)) => n.to_string(),
        Some(EvidenceValue::Text(s)) => s.clone(),
        None => "undefined".to_string(),
    }
}

/// Before/after aggregates of one evidence name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceDelta {
    pub name: String,
    pub unit: EvidenceUnit,
    pub scope: EvidenceScope,
    pub before: EvidenceAgg,
    pub after: EvidenceAgg,
    pub message: String,
}

enum Snapshot<'a> {
    Missing,
    Unavailable(EvidenceUnit),
    Ok(EvidenceUnit, &'a EvidenceValue),
}

fn snapshot<'a>(point: Option<&'a Point>, name: &str) -> Snapshot<'a> {
    let Some(item) = point.and_then(|p| p.evidence_item(name)) else {
        return Snapshot::Missing;
    };
    match &item.outcome {
        EvidenceOutcome::Ok { value } => Snapshot::Ok(item.unit, value),
        EvidenceOutcome::Unavailable { .. } => Snapshot::Unavailable(item.unit),
    }
}

/// Lower median: index `floor((len - 1) / 2)` of the sorted samples
fn lower_median(mut samples: Vec<f64>) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    samples.sort_by(|a, b| a.total_cmp(b));
    Some(samples[(samples.len() - 1) / 2])
}

/// Aggregate one evidence name over every full assignment of the suite
///
/// The unit is taken from the first point that reports the evidence and
/// falls back to inference from the name.
pub fn aggregate_points(spec: &SuiteSpec, suite: &SuiteResult, name: &str) -> EvidenceAgg {
    let mut agg = EvidenceAgg::default();
    let mut unit: Option<EvidenceUnit> = None;
    let mut numbers = Vec::new();
    let mut strings = Vec::new();

    for params in point_params(spec) {
        match snapshot(find_point(suite, &params), name) {
            Snapshot::Missing => agg.missing += 1,
            Snapshot::Unavailable(u) => {
                unit.get_or_insert(u);
                agg.unavailable += 1;
            }
            Snapshot::Ok(u, value) => {
                unit.get_or_insert(u);
                agg.ok += 1;
                match value {
                    EvidenceValue::Number(n) if n.is_finite() => numbers.push(*n),
                    EvidenceValue::Number(_) => {}
                    EvidenceValue::Text(s) => strings.push(s.clone()),
                }
            }
        }
    }

    agg.value = match unit.unwrap_or_else(|| EvidenceUnit::infer(name)) {
        EvidenceUnit::String => strings.pop().map(EvidenceValue::Text),
        EvidenceUnit::Ratio => lower_median(numbers).map(EvidenceValue::Number),
        EvidenceUnit::Count | EvidenceUnit::Bytes => {
            if numbers.is_empty() {
                None
            } else {
                Some(EvidenceValue::Number(numbers.iter().sum()))
            }
        }
    };
    agg
}

/// Aggregate `budget.cutOffCount` per where slice
pub fn aggregate_cut_off(spec: &SuiteSpec, suite: &SuiteResult) -> EvidenceAgg {
    let mut agg = EvidenceAgg::default();
    let mut total = 0.0;

    for where_ in non_primary_slices(spec) {
        let picked = spec.primary_levels().iter().find_map(|level| {
            let mut params: Params = where_.clone();
            params.insert(spec.primary_axis.clone(), level.clone());
            match snapshot(find_point(suite, &params), CUT_OFF_COUNT) {
                Snapshot::Missing => None,
                found => Some(found),
            }
        });

        match picked {
            None | Some(Snapshot::Missing) => agg.missing += 1,
            Some(Snapshot::Unavailable(_)) => agg.unavailable += 1,
            Some(Snapshot::Ok(_, value)) => {
                agg.ok += 1;
                if let EvidenceValue::Number(n) = value {
                    if n.is_finite() {
                        total += n;
                    }
                }
            }
        }
    }

    if agg.ok > 0 {
        agg.value = Some(EvidenceValue::Number(total));
    }
    agg
}

/// Evidence names considered for a suite, sorted
pub fn evidence_names(spec: &SuiteSpec, before: &SuiteResult, after: &SuiteResult) -> Vec<String> {
    let mut names: BTreeSet<String> = BTreeSet::new();
    names.insert(CUT_OFF_COUNT.to_string());
    names.extend(spec.required_evidence.iter().cloned());
    names.extend(before.evidence_names().map(str::to_string));
    names.extend(after.evidence_names().map(str::to_string));
    names.into_iter().collect()
}

/// Evidence deltas worth reporting for one suite
///
/// A name is reported when it is required, has gaps on either side, has a
/// non-zero or non-empty value, or changed between the runs.
pub fn evidence_deltas(
    spec: &SuiteSpec,
    before: &SuiteResult,
    after: &SuiteResult,
) -> Vec<EvidenceDelta> {
    let mut out = Vec::new();

    for name in evidence_names(spec, before, after) {
        let (scope, before_agg, after_agg, unit) = if name == CUT_OFF_COUNT {
            (
                EvidenceScope::WhereSlices,
                aggregate_cut_off(spec, before),
                aggregate_cut_off(spec, after),
                EvidenceUnit::Count,
            )
        } else {
            (
                EvidenceScope::Points,
                aggregate_points(spec, before, &name),
                aggregate_points(spec, after, &name),
                EvidenceUnit::infer(&name),
            )
        };

        let required = spec.required_evidence.contains(&name);
        let include = required
            || before_agg.has_gaps()
            || after_agg.has_gaps()
            || before_agg.has_signal()
            || after_agg.has_signal()
            || before_agg != after_agg;
        if !include {
            continue;
        }

        let message = format!(
            "{}({}) unit={}: before[{}] after[{}]",
            name,
            scope.as_str(),
            unit.as_str(),
            before_agg.describe(),
            after_agg.describe()
        );
        out.push(EvidenceDelta {
            name,
            unit,
            scope,
            before: before_agg,
            after: after_agg,
            message,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite_result::{EvidenceItem, PointStatus};
    use crate::suite_spec::Axes;

    fn spec() -> SuiteSpec {
        SuiteSpec::new(
            "s",
            "steps",
            Axes::new()
                .with_axis("steps", vec![200.into(), 800.into()])
                .with_axis("mode", vec!["a".into(), "b".into()]),
        )
    }

    fn item(name: &str, unit: EvidenceUnit, value: EvidenceValue) -> EvidenceItem {
        EvidenceItem {
            name: name.to_string(),
            unit,
            outcome: EvidenceOutcome::Ok { value },
        }
    }

    fn point(steps: i32, mode: &str) -> Point {
        let mut params = Params::new();
        params.insert("steps".to_string(), steps.into());
        params.insert("mode".to_string(), mode.into());
        Point::new(params, PointStatus::Ok)
    }

    #[test]
    fn test_lower_median() {
        assert_eq!(lower_median(vec![]), None);
        assert_eq!(lower_median(vec![3.0]), Some(3.0));
        assert_eq!(lower_median(vec![4.0, 1.0, 3.0, 2.0]), Some(2.0));
        assert_eq!(lower_median(vec![5.0, 1.0, 3.0]), Some(3.0));
    }

    #[test]
    fn test_count_evidence_sums_and_counts_missing() {
        let suite = SuiteResult::new("s")
            .with_point(point(200, "a").with_evidence(item(
                "txn.count",
                EvidenceUnit::Count,
                EvidenceValue::Number(2.0),
            )))
            .with_point(point(800, "a").with_evidence(item(
                "txn.count",
                EvidenceUnit::Count,
                EvidenceValue::Number(5.0),
            )))
            .with_point(point(200, "b").with_evidence(EvidenceItem {
                name: "txn.count".to_string(),
                unit: EvidenceUnit::Count,
                outcome: EvidenceOutcome::Unavailable {
                    reason: "notSupported".to_string(),
                },
            }));

        let agg = aggregate_points(&spec(), &suite, "txn.count");
        assert_eq!(agg.ok, 2);
        assert_eq!(agg.unavailable, 1);
        assert_eq!(agg.missing, 1);
        assert_eq!(agg.value, Some(EvidenceValue::Number(7.0)));
    }

    #[test]
    fn test_string_evidence_keeps_last_value() {
        let suite = SuiteResult::new("s")
            .with_point(point(200, "a").with_evidence(item(
                "engine",
                EvidenceUnit::String,
                EvidenceValue::Text("v1".to_string()),
            )))
            .with_point(point(200, "b").with_evidence(item(
                "engine",
                EvidenceUnit::String,
                EvidenceValue::Text("v2".to_string()),
            )));

        let agg = aggregate_points(&spec(), &suite, "engine");
        assert_eq!(agg.value, Some(EvidenceValue::Text("v2".to_string())));
    }

    #[test]
    fn test_cut_off_takes_first_level_per_slice() {
        let cut = |v: f64| item(CUT_OFF_COUNT, EvidenceUnit::Count, EvidenceValue::Number(v));
        let suite = SuiteResult::new("s")
            .with_point(point(200, "a"))
            .with_point(point(800, "a").with_evidence(cut(3.0)))
            .with_point(point(200, "b").with_evidence(cut(1.0)))
            .with_point(point(800, "b").with_evidence(cut(10.0)));

        let agg = aggregate_cut_off(&spec(), &suite);
        assert_eq!(agg.ok, 2);
        assert_eq!(agg.missing, 0);
        assert_eq!(agg.value, Some(EvidenceValue::Number(4.0)));
    }

    #[test]
    fn test_cut_off_without_evidence_is_missing() {
        let agg = aggregate_cut_off(&spec(), &SuiteResult::new("s"));
        assert_eq!(agg.missing, 2);
        assert_eq!(agg.value, None);
    }

    #[test]
    fn test_quiet_names_are_not_reported() {
        let zero = |steps, mode| {
            point(steps, mode).with_evidence(item(
                "txn.count",
                EvidenceUnit::Count,
                EvidenceValue::Number(0.0),
            ))
        };
        let cut = |steps, mode| {
            zero(steps, mode).with_evidence(item(
                CUT_OFF_COUNT,
                EvidenceUnit::Count,
                EvidenceValue::Number(0.0),
            ))
        };
        let suite = SuiteResult::new("s")
            .with_point(cut(200, "a"))
            .with_point(cut(800, "a"))
            .with_point(cut(200, "b"))
            .with_point(cut(800, "b"));

        assert!(evidence_deltas(&spec(), &suite, &suite).is_empty());
    }

    #[test]
    fn test_required_evidence_always_reported() {
        let mut spec = spec();
        spec.required_evidence.push("heap.bytes".to_string());
        let suite = SuiteResult::new("s");

        let deltas = evidence_deltas(&spec, &suite, &suite);
        let names: Vec<&str> = deltas.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec![CUT_OFF_COUNT, "heap.bytes"]);
        assert_eq!(deltas[1].unit, EvidenceUnit::Bytes);
        assert_eq!(deltas[1].scope, EvidenceScope::Points);
        assert_eq!(
            deltas[0].message,
            "budget.cutOffCount(whereSlices) unit=count: \
             before[value=undefined ok=0 unavailable=0 missing=2] \
             after[value=undefined ok=0 unavailable=0 missing=2]"
        );
    }
}
