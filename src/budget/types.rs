// Budget declarations as they appear in the matrix and in run reports

use serde::{Deserialize, Serialize};

/// p95 ceiling for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsoluteBudget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub metric: String,

    /// Maximum allowed p95 in milliseconds (inclusive)
    pub p95_ms: f64,
}

/// Ratio ceiling between two points of the same slice
///
/// # Example JSON
///
/// ```json
/// {
///   "type": "relative",
///   "metric": "runtime.txnCommitMs",
///   "numeratorRef": "diagnosticsLevel=full",
///   "denominatorRef": "diagnosticsLevel=off",
///   "maxRatio": 1.05,
///   "minDeltaMs": 0.1
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelativeBudget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub metric: String,

    /// Maximum allowed numerator/denominator ratio (exclusive breach)
    pub max_ratio: f64,

    /// A ratio breach only counts when the absolute delta also exceeds this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_delta_ms: Option<f64>,

    /// `key=value&key=value` constraints selecting the numerator point
    pub numerator_ref: String,

    /// `key=value&key=value` constraints selecting the denominator point
    pub denominator_ref: String,
}

impl RelativeBudget {
    /// Tolerance in ms; absent or non-finite values mean 0
    pub fn min_delta_ms(&self) -> f64 {
        match self.min_delta_ms {
            Some(v) if v.is_finite() => v,
            _ => 0.0,
        }
    }
}

/// A declared performance budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Budget {
    Absolute(AbsoluteBudget),
    Relative(RelativeBudget),
}

impl Budget {
    pub fn absolute(metric: impl Into<String>, p95_ms: f64) -> Self {
        Budget::Absolute(AbsoluteBudget {
            id: None,
            metric: metric.into(),
            p95_ms,
        })
    }

    pub fn relative(
        metric: impl Into<String>,
        numerator_ref: impl Into<String>,
        denominator_ref: impl Into<String>,
        max_ratio: f64,
        min_delta_ms: Option<f64>,
    ) -> Self {
        Budget::Relative(RelativeBudget {
            id: None,
            metric: metric.into(),
            max_ratio,
            min_delta_ms,
            numerator_ref: numerator_ref.into(),
            denominator_ref: denominator_ref.into(),
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        match &mut self {
            Budget::Absolute(b) => b.id = Some(id.into()),
            Budget::Relative(b) => b.id = Some(id.into()),
        }
        self
    }

    pub fn metric(&self) -> &str {
        match self {
            Budget::Absolute(b) => &b.metric,
            Budget::Relative(b) => &b.metric,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Budget::Absolute(b) => b.id.as_deref(),
            Budget::Relative(b) => b.id.as_deref(),
        }
    }

    /// Identity key: explicit id, else derived from the declaration
    pub fn key(&self) -> String {
        if let Some(id) = self.id() {
            return id.to_string();
        }
        match self {
            Budget::Absolute(b) => format!("absolute:{}:p95<={}", b.metric, b.p95_ms),
            Budget::Relative(b) => format!(
                "relative:{}:{}/{}<={}",
                b.metric, b.numerator_ref, b.denominator_ref, b.max_ratio
            ),
        }
    }

    /// Axes pinned by the numerator/denominator references
    ///
    /// Always empty for absolute budgets.
    pub fn reference_axes(&self) -> Vec<String> {
        match self {
            Budget::Absolute(_) => Vec::new(),
            Budget::Relative(b) => {
                let mut axes: Vec<String> = super::parse_ref(&b.numerator_ref).into_keys().collect();
                for key in super::parse_ref(&b.denominator_ref).into_keys() {
                    if !axes.contains(&key) {
                        axes.push(key);
                    }
                }
                axes
            }
        }
    }
}
