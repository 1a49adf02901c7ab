//! Delta report: the whole before/after diff in one owned value
//!
//! [`DiffEngine::diff`] validates the matrix, checks comparability, then for
//! every suite, budget and where slice runs threshold search on both runs,
//! classifies budget breaches and ranks the threshold deltas. Evidence
//! deltas and a stability check are added per suite.
//!
//! In triage mode (any drift allowed) each slice is searched only over the
//! primary levels both runs covered, and slices without usable data on
//! both sides are counted instead of diffed.

use crate::budget::Budget;
use crate::classify::{classify, Classification};
use crate::comparability::{check_comparability, ComparabilityResult};
use crate::config::{DiffConfig, StabilityConfig};
use crate::delta::{level_delta, most_significant, rank_improvements, rank_regressions, RankedDelta};
use crate::error::Result;
use crate::evidence::{evidence_deltas, EvidenceDelta};
use crate::level::{display_level, params_key, Level, Params};
use crate::lookup::has_any_point;
use crate::slices::where_slices;
use crate::stability::{check_stability, StabilityWarning};
use crate::suite_result::{MetricCategory, Priority, RunMeta, RunReport, SuiteResult};
use crate::suite_spec::{Matrix, SuiteSpec};
use crate::threshold::{common_prefix_levels, search_threshold_over, ThresholdResult};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Identity of one side of the diff
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

impl RunRef {
    fn of(meta: &RunMeta) -> Self {
        Self {
            created_at: meta.created_at.clone(),
            commit: meta.git.as_ref().and_then(|g| g.commit.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffMeta {
    pub from: RunRef,
    pub to: RunRef,
    pub comparability: ComparabilityResult,
}

/// Where slice accounting, reported in triage mode only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceStats {
    pub total: u64,
    pub compared: u64,
    /// Neither run has any point in the slice
    pub skipped_coverage: u64,
    /// Both runs have points but no comparable data
    pub skipped_data: u64,
    pub before_only: u64,
    pub after_only: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub regressions: u64,
    pub improvements: u64,

    /// Diffed slices whose after run stopped on `budgetExceeded`
    pub budget_violations: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slices: Option<SliceStats>,
}

/// Both threshold results of one where slice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceDiff {
    #[serde(rename = "where")]
    pub where_: Params,

    pub before: ThresholdResult,
    pub after: ThresholdResult,

    /// `after_index - before_index` on the full primary axis
    pub delta: i64,

    /// Levels searched, when restricted to common coverage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compared_levels: Option<Vec<Level>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_classification: Option<Classification>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_classification: Option<Classification>,

    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetDiff {
    /// Budget identity key
    pub key: String,
    pub budget: Budget,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<MetricCategory>,

    pub slices: Vec<SliceDiff>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteDiff {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub budgets: Vec<BudgetDiff>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence_deltas: Vec<EvidenceDelta>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<StabilityWarning>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl SuiteDiff {
    fn skipped(id: &str, note: &str) -> Self {
        Self {
            id: id.to_string(),
            title: None,
            priority: None,
            budgets: Vec::new(),
            evidence_deltas: Vec::new(),
            stability: None,
            notes: vec![note.to_string()],
        }
    }

    /// Every slice of every budget, in report order
    pub fn slices(&self) -> impl Iterator<Item = (&BudgetDiff, &SliceDiff)> {
        self.budgets
            .iter()
            .flat_map(|b| b.slices.iter().map(move |s| (b, s)))
    }
}

/// Result of diffing two runs against one matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaReport {
    pub schema_version: u32,
    pub meta: DiffMeta,
    pub summary: Summary,
    pub suites: Vec<SuiteDiff>,

    /// Most severe first
    pub regressions: Vec<RankedDelta>,

    /// Largest first
    pub improvements: Vec<RankedDelta>,
}

impl DeltaReport {
    pub fn suite(&self, id: &str) -> Option<&SuiteDiff> {
        self.suites.iter().find(|s| s.id == id)
    }

    pub fn to_json_pretty(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize delta report")
    }
}

/// Everything a suite diff needs, resolved once
struct SuiteInputs<'a> {
    spec: &'a SuiteSpec,
    before: &'a SuiteResult,
    after: &'a SuiteResult,
}

impl SuiteInputs<'_> {
    /// Spec budgets, else the before run's, else the after run's
    fn budgets(&self) -> &[Budget] {
        if !self.spec.budgets.is_empty() {
            &self.spec.budgets
        } else if !self.before.budgets.is_empty() {
            &self.before.budgets
        } else {
            &self.after.budgets
        }
    }

    fn category(&self, metric: &str) -> Option<MetricCategory> {
        self.before
            .metric_categories
            .get(metric)
            .or_else(|| self.after.metric_categories.get(metric))
            .copied()
    }
}

/// Builds delta reports under one diff configuration
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    config: DiffConfig,
}

impl DiffEngine {
    pub fn new(config: DiffConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Diff two runs of the same matrix
    ///
    /// # Errors
    /// Fails when the diff config or any suite spec is invalid. A
    /// non-comparable verdict is reported, not raised; see
    /// [`ComparabilityResult::ensure_comparable`].
    pub fn diff(&self, matrix: &Matrix, before: &RunReport, after: &RunReport) -> Result<DeltaReport> {
        self.config.validate()?;
        matrix.validate()?;

        let comparability = check_comparability(&before.meta, &after.meta, &self.config);
        let triage = self.config.is_triage();
        let stability = self
            .config
            .stability
            .as_ref()
            .or_else(|| before.stability())
            .or_else(|| after.stability());

        let suite_ids: BTreeSet<&str> = before
            .suites
            .iter()
            .chain(after.suites.iter())
            .map(|s| s.id.as_str())
            .collect();

        let mut summary = Summary::default();
        let mut slice_stats = SliceStats::default();
        let mut suites = Vec::with_capacity(suite_ids.len());
        let mut ranked = Vec::new();

        for id in suite_ids {
            let (spec, before_suite, after_suite) = (matrix.suite(id), before.suite(id), after.suite(id));
            let inputs = match (spec, before_suite, after_suite) {
                (Some(spec), Some(before), Some(after)) => SuiteInputs {
                    spec,
                    before,
                    after,
                },
                (None, _, _) => {
                    debug!(suite = id, "suite skipped: no spec in matrix");
                    suites.push(SuiteDiff::skipped(id, "missing suite spec in matrix"));
                    continue;
                }
                (_, None, _) => {
                    debug!(suite = id, "suite skipped: not in before run");
                    suites.push(SuiteDiff::skipped(id, "missing suite in before report"));
                    continue;
                }
                (_, _, None) => {
                    debug!(suite = id, "suite skipped: not in after run");
                    suites.push(SuiteDiff::skipped(id, "missing suite in after report"));
                    continue;
                }
            };

            let suite = self.diff_suite(&inputs, stability, &mut slice_stats);

            for (budget, slice) in suite.slices() {
                if slice.after.stopped_by_budget() {
                    summary.budget_violations += 1;
                }
                if slice.delta < 0 {
                    summary.regressions += 1;
                } else if slice.delta > 0 {
                    summary.improvements += 1;
                } else {
                    continue;
                }
                ranked.push(RankedDelta {
                    suite: suite.id.clone(),
                    budget: budget.key.clone(),
                    where_: slice.where_.clone(),
                    before_max_level: slice.before.max_level.clone(),
                    after_max_level: slice.after.max_level.clone(),
                    delta: slice.delta,
                    classification: slice.after_classification.clone(),
                });
            }

            suites.push(suite);
        }

        if triage {
            summary.slices = Some(slice_stats);
        }

        Ok(DeltaReport {
            schema_version: 1,
            meta: DiffMeta {
                from: RunRef::of(&before.meta),
                to: RunRef::of(&after.meta),
                comparability,
            },
            summary,
            suites,
            regressions: rank_regressions(ranked.iter().cloned()),
            improvements: rank_improvements(ranked),
        })
    }

    fn diff_suite(
        &self,
        inputs: &SuiteInputs<'_>,
        stability: Option<&StabilityConfig>,
        stats: &mut SliceStats,
    ) -> SuiteDiff {
        let spec = inputs.spec;
        let mut budgets = Vec::new();
        let mut suite_ranked = Vec::new();

        for budget in inputs.budgets() {
            let key = budget.key();
            let category = inputs.category(budget.metric());
            let mut slices = Vec::new();

            for where_ in where_slices(spec, budget) {
                stats.total += 1;
                let Some(slice) = self.diff_slice(inputs, budget, &key, category, where_, stats) else {
                    continue;
                };
                if slice.delta < 0 {
                    suite_ranked.push(RankedDelta {
                        suite: spec.id.clone(),
                        budget: key.clone(),
                        where_: slice.where_.clone(),
                        before_max_level: slice.before.max_level.clone(),
                        after_max_level: slice.after.max_level.clone(),
                        delta: slice.delta,
                        classification: None,
                    });
                }
                slices.push(slice);
            }

            budgets.push(BudgetDiff {
                key,
                budget: budget.clone(),
                category,
                slices,
            });
        }

        let mut notes = Vec::new();
        if let Some(worst) = most_significant(&suite_ranked) {
            notes.push(format!(
                "mostSignificantRegression: {} {} (before={}, after={})",
                worst.budget,
                params_key(&worst.where_),
                display_level(worst.before_max_level.as_ref()),
                display_level(worst.after_max_level.as_ref())
            ));
        }

        let stability =
            stability.and_then(|limits| check_stability(spec, inputs.before, inputs.after, limits));
        if let Some(warning) = &stability {
            notes.push(warning.to_string());
        }

        SuiteDiff {
            id: spec.id.clone(),
            title: spec.title.clone(),
            priority: spec.priority,
            budgets,
            evidence_deltas: evidence_deltas(spec, inputs.before, inputs.after),
            stability,
            notes,
        }
    }

    /// Search one where slice on both runs
    ///
    /// Returns `None` for triage slices that are counted but not diffed.
    fn diff_slice(
        &self,
        inputs: &SuiteInputs<'_>,
        budget: &Budget,
        key: &str,
        category: Option<MetricCategory>,
        where_: Params,
        stats: &mut SliceStats,
    ) -> Option<SliceDiff> {
        let spec = inputs.spec;
        let triage = self.config.is_triage();

        let compared_levels = if triage {
            let levels = common_prefix_levels(spec, inputs.before, inputs.after, budget, &where_);
            if levels.is_empty() {
                let before_has = has_any_point(inputs.before, &where_);
                let after_has = has_any_point(inputs.after, &where_);
                match (before_has, after_has) {
                    (true, false) => stats.before_only += 1,
                    (false, true) => stats.after_only += 1,
                    (true, true) => stats.skipped_data += 1,
                    (false, false) => stats.skipped_coverage += 1,
                }
                debug!(
                    suite = %spec.id,
                    budget = key,
                    slice = %params_key(&where_),
                    before_has,
                    after_has,
                    "slice skipped: no common coverage"
                );
                return None;
            }
            Some(levels)
        } else {
            None
        };

        let levels = compared_levels.as_deref().unwrap_or(spec.primary_levels());
        let before = search_threshold_over(levels, &spec.primary_axis, inputs.before, budget, &where_);
        let after = search_threshold_over(levels, &spec.primary_axis, inputs.after, budget, &where_);

        if triage {
            if !before.has_comparable_data() || !after.has_comparable_data() {
                stats.skipped_data += 1;
                debug!(
                    suite = %spec.id,
                    budget = key,
                    slice = %params_key(&where_),
                    "slice skipped: no comparable data"
                );
                return None;
            }
            stats.compared += 1;
        }

        let delta = level_delta(
            spec.primary_levels(),
            before.max_level.as_ref(),
            after.max_level.as_ref(),
        );
        let before_classification =
            classify(inputs.before, &spec.primary_axis, budget, &where_, &before);
        let after_classification = classify(inputs.after, &spec.primary_axis, budget, &where_, &after);

        let mut message = String::new();
        if let Some(category) = category {
            message.push_str(&format!("[category={}] ", category.as_str()));
        }
        message.push_str(&format!(
            "{} {}: before={} after={}",
            key,
            params_key(&where_),
            display_level(before.max_level.as_ref()),
            display_level(after.max_level.as_ref())
        ));
        if let Some(reason) = &after.reason {
            message.push_str(&format!(" (after:{})", reason));
        }
        if let Some(reason) = &before.reason {
            message.push_str(&format!(" (before:{})", reason));
        }

        Some(SliceDiff {
            where_,
            before,
            after,
            delta,
            compared_levels,
            before_classification,
            after_classification,
            message,
        })
    }
}
