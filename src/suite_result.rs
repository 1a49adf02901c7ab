//! Suite result model: one collected benchmark run
//!
//! A run report holds run-level metadata (git, config, env) and one
//! [`SuiteResult`] per suite. Each suite result is a flat list of points;
//! a point is a full parameter assignment plus per-metric statistics and
//! optional evidence counters.
//!
//! Field names follow the JSON artifacts written by the collector, so
//! reports deserialize directly:
//!
//! ```
//! use perfbound::suite_result::RunReport;
//!
//! let report = RunReport::from_json_str(r#"{
//!     "schemaVersion": 1,
//!     "meta": { "matrixId": "logix-browser-perf-matrix-v1" },
//!     "suites": [{
//!         "id": "converge.txnCommit",
//!         "points": [{
//!             "params": { "steps": 200, "dirtyRootsRatio": 0.05 },
//!             "status": "ok",
//!             "metrics": [{
//!                 "name": "runtime.txnCommitMs",
//!                 "unit": "ms",
//!                 "status": "ok",
//!                 "stats": { "n": 30, "medianMs": 1.2, "p95Ms": 2.5 }
//!             }]
//!         }]
//!     }]
//! }"#).unwrap();
//!
//! assert_eq!(report.suites[0].points.len(), 1);
//! ```

use crate::config::StabilityConfig;
use crate::level::Params;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Collection outcome of a single point
///
/// Statuses the collector does not name here are kept verbatim in
/// `Other`, so one unusual point never fails the whole report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointStatus {
    Ok,
    Timeout,
    Failed,
    Skipped,
    #[serde(untagged)]
    Other(String),
}

impl PointStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, PointStatus::Ok)
    }

    pub fn as_str(&self) -> &str {
        match self {
            PointStatus::Ok => "ok",
            PointStatus::Timeout => "timeout",
            PointStatus::Failed => "failed",
            PointStatus::Skipped => "skipped",
            PointStatus::Other(status) => status,
        }
    }
}

/// Summary statistics of one metric at one point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricStats {
    /// Number of retained samples
    pub n: u64,
    pub median_ms: f64,
    pub p95_ms: f64,
}

/// Whether a metric produced statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum MetricOutcome {
    #[serde(rename = "ok")]
    Ok { stats: MetricStats },
    #[serde(rename = "unavailable")]
    Unavailable {
        #[serde(rename = "unavailableReason")]
        reason: String,
    },
}

fn default_unit() -> String {
    "ms".to_string()
}

/// A named timing metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,

    #[serde(default = "default_unit")]
    pub unit: String,

    #[serde(flatten)]
    pub outcome: MetricOutcome,
}

impl Metric {
    /// Metric with statistics
    pub fn ok(name: impl Into<String>, n: u64, median_ms: f64, p95_ms: f64) -> Self {
        Self {
            name: name.into(),
            unit: default_unit(),
            outcome: MetricOutcome::Ok {
                stats: MetricStats {
                    n,
                    median_ms,
                    p95_ms,
                },
            },
        }
    }

    /// Metric that could not be measured
    pub fn unavailable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: default_unit(),
            outcome: MetricOutcome::Unavailable {
                reason: reason.into(),
            },
        }
    }

    pub fn stats(&self) -> Option<&MetricStats> {
        match &self.outcome {
            MetricOutcome::Ok { stats } => Some(stats),
            MetricOutcome::Unavailable { .. } => None,
        }
    }
}

/// Unit of an evidence counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceUnit {
    Count,
    Ratio,
    Bytes,
    String,
}

impl EvidenceUnit {
    /// Guess a unit from an evidence name
    pub fn infer(name: &str) -> Self {
        let lowered = name.to_lowercase();
        if lowered.contains("byte") {
            EvidenceUnit::Bytes
        } else if lowered.contains("ratio") || lowered.contains("rate") {
            EvidenceUnit::Ratio
        } else {
            EvidenceUnit::Count
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceUnit::Count => "count",
            EvidenceUnit::Ratio => "ratio",
            EvidenceUnit::Bytes => "bytes",
            EvidenceUnit::String => "string",
        }
    }
}

/// Evidence payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvidenceValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum EvidenceOutcome {
    #[serde(rename = "ok")]
    Ok { value: EvidenceValue },
    #[serde(rename = "unavailable")]
    Unavailable {
        #[serde(rename = "unavailableReason")]
        reason: String,
    },
}

/// A non-timing observation attached to a point (counters, ratios, labels)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub name: String,
    pub unit: EvidenceUnit,

    #[serde(flatten)]
    pub outcome: EvidenceOutcome,
}

/// One collected sample of the parameter space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Full assignment of every axis
    pub params: Params,

    pub status: PointStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default)]
    pub metrics: Vec<Metric>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<EvidenceItem>,
}

impl Point {
    pub fn new(params: Params, status: PointStatus) -> Self {
        Self {
            params,
            status,
            reason: None,
            metrics: Vec::new(),
            evidence: Vec::new(),
        }
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }

    pub fn with_evidence(mut self, item: EvidenceItem) -> Self {
        self.evidence.push(item);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }

    pub fn evidence_item(&self, name: &str) -> Option<&EvidenceItem> {
        self.evidence.iter().find(|e| e.name == name)
    }
}

/// Suite priority tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    P1,
    P2,
    P3,
}

/// Which layer a metric measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricCategory {
    E2e,
    Runtime,
    Diagnostics,
}

impl MetricCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricCategory::E2e => "e2e",
            MetricCategory::Runtime => "runtime",
            MetricCategory::Diagnostics => "diagnostics",
        }
    }
}

/// All points collected for one suite in one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteResult {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_axis: Option<String>,

    /// Fallback budgets when the suite spec declares none
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub budgets: Vec<crate::budget::Budget>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metric_categories: BTreeMap<String, MetricCategory>,

    #[serde(default)]
    pub points: Vec<Point>,
}

impl SuiteResult {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            priority: None,
            primary_axis: None,
            budgets: Vec::new(),
            metric_categories: BTreeMap::new(),
            points: Vec::new(),
        }
    }

    pub fn with_point(mut self, point: Point) -> Self {
        self.points.push(point);
        self
    }

    /// Every metric name seen in any point
    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.points
            .iter()
            .flat_map(|p| p.metrics.iter().map(|m| m.name.as_str()))
    }

    /// Every evidence name seen in any point
    pub fn evidence_names(&self) -> impl Iterator<Item = &str> {
        self.points
            .iter()
            .flat_map(|p| p.evidence.iter().map(|e| e.name.as_str()))
    }
}

/// Git state of the tree a run was collected from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Short commit hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dirty: Option<bool>,
}

/// Collection settings of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup_discard: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headless: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<StabilityConfig>,

    /// Any further settings; compared key by key
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrowserEnv {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headless: Option<bool>,
}

/// Machine fingerprint of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunEnv {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<BrowserEnv>,

    /// Any further fingerprint keys; compared key by key
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Run-level metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default)]
    pub matrix_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix_updated_at: Option<String>,

    /// sha256 of the matrix file the run was collected against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<RunConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<RunEnv>,
}

/// One complete benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub meta: RunMeta,

    #[serde(default)]
    pub suites: Vec<SuiteResult>,
}

fn default_schema_version() -> u32 {
    1
}

impl RunReport {
    pub fn new(meta: RunMeta) -> Self {
        Self {
            schema_version: default_schema_version(),
            meta,
            suites: Vec::new(),
        }
    }

    /// Parse a run report from JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse run report JSON")
    }

    pub fn suite(&self, id: &str) -> Option<&SuiteResult> {
        self.suites.iter().find(|s| s.id == id)
    }

    /// Stability limits declared by the collector, if any
    pub fn stability(&self) -> Option<&StabilityConfig> {
        self.meta.config.as_ref().and_then(|c| c.stability.as_ref())
    }
}
