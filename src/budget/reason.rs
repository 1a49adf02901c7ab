// Structured stop reasons for budget evaluation and threshold search

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an evaluation (or a threshold scan) stopped
///
/// Serialized as the flat strings report consumers already understand:
/// `budgetExceeded`, `missingPoint`, `numerator:metricMissing`, or a
/// verbatim status / unavailable reason reported by the collector.
///
/// The flat form is lossy in one direction: a collector reason spelled
/// like a keyword (`Unavailable("missingPoint")`) reads back as that
/// keyword's variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Reason {
    /// Measured value breaches the budget
    BudgetExceeded,
    /// No point for the requested assignment
    MissingPoint,
    /// Relative budget: no numerator point
    MissingNumerator,
    /// Relative budget: no denominator point
    MissingDenominator,
    /// Point exists but does not carry the metric
    MetricMissing,
    /// Relative budget: denominator p95 or median is not positive
    DenominatorZero,
    /// Point status (`timeout`, `failed`, ...) or metric unavailable reason
    Unavailable(String),
    /// Metric failure on the numerator side
    Numerator(Box<Reason>),
    /// Metric failure on the denominator side
    Denominator(Box<Reason>),
}

/// Coarse classes of stop reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReasonCategory {
    /// The data needed was never collected
    DataMissing,
    /// The data exists but cannot be used
    DataInvalid,
    /// The data is fine and over budget
    BudgetViolation,
}

impl Reason {
    pub fn category(&self) -> ReasonCategory {
        match self {
            Reason::BudgetExceeded => ReasonCategory::BudgetViolation,
            Reason::MissingPoint
            | Reason::MissingNumerator
            | Reason::MissingDenominator
            | Reason::MetricMissing => ReasonCategory::DataMissing,
            Reason::DenominatorZero | Reason::Unavailable(_) => ReasonCategory::DataInvalid,
            Reason::Numerator(inner) | Reason::Denominator(inner) => inner.category(),
        }
    }

    pub fn is_budget_exceeded(&self) -> bool {
        matches!(self, Reason::BudgetExceeded)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::BudgetExceeded => f.write_str("budgetExceeded"),
            Reason::MissingPoint => f.write_str("missingPoint"),
            Reason::MissingNumerator => f.write_str("missingNumerator"),
            Reason::MissingDenominator => f.write_str("missingDenominator"),
            Reason::MetricMissing => f.write_str("metricMissing"),
            Reason::DenominatorZero => f.write_str("denominatorZero"),
            Reason::Unavailable(reason) => f.write_str(reason),
            Reason::Numerator(inner) => write!(f, "numerator:{}", inner),
            Reason::Denominator(inner) => write!(f, "denominator:{}", inner),
        }
    }
}

impl From<Reason> for String {
    fn from(reason: Reason) -> Self {
        reason.to_string()
    }
}

impl From<String> for Reason {
    fn from(value: String) -> Self {
        Reason::from(value.as_str())
    }
}

impl From<&str> for Reason {
    fn from(value: &str) -> Self {
        if let Some(rest) = value.strip_prefix("numerator:") {
            return Reason::Numerator(Box::new(Reason::from(rest)));
        }
        if let Some(rest) = value.strip_prefix("denominator:") {
            return Reason::Denominator(Box::new(Reason::from(rest)));
        }
        match value {
            "budgetExceeded" => Reason::BudgetExceeded,
            "missingPoint" => Reason::MissingPoint,
            "missingNumerator" => Reason::MissingNumerator,
            "missingDenominator" => Reason::MissingDenominator,
            "metricMissing" => Reason::MetricMissing,
            "denominatorZero" => Reason::DenominatorZero,
            other => Reason::Unavailable(other.to_string()),
        }
    }
}
