//! Fatal error taxonomy
//!
//! Per-point evaluation failures are never errors: they travel as
//! [`Reason`](crate::budget::Reason) values inside threshold results.
//! `GateError` covers the conditions that must stop a diff before any
//! search runs.

use thiserror::Error;

/// Errors that abort a diff
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GateError {
    #[error("suite '{suite}': primary axis '{axis}' is not declared in axes")]
    UnknownPrimaryAxis { suite: String, axis: String },

    #[error("suite '{suite}': primary axis '{axis}' has no levels")]
    EmptyPrimaryAxis { suite: String, axis: String },

    #[error("suite '{suite}': axis '{axis}' declares level {level} more than once")]
    DuplicateLevel {
        suite: String,
        axis: String,
        level: String,
    },

    #[error("suite '{suite}': budget #{index} has an empty metric name")]
    EmptyBudgetMetric { suite: String, index: usize },

    #[error("matrix '{matrix}' declares suite '{suite}' more than once")]
    DuplicateSuite { matrix: String, suite: String },

    #[error("invalid diff configuration: {0}")]
    InvalidConfig(String),

    #[error(
        "before/after reports are not comparable (config mismatches: {}; env mismatches: {})",
        .config_mismatches.join(", "),
        .env_mismatches.join(", ")
    )]
    NotComparable {
        config_mismatches: Vec<String>,
        env_mismatches: Vec<String>,
    },
}

/// Result alias for fatal diff errors
pub type Result<T> = std::result::Result<T, GateError>;
