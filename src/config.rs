// Diff configuration
//
// Strict mode refuses to call reports comparable when their collection
// settings or machines differ. Triage mode keeps going across drift, but
// only compares the primary-axis levels both runs actually covered.

use crate::error::{GateError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Limits for run-to-run p95 jitter
///
/// A point is unstable when `|after - before|` exceeds
/// `max(max_p95_delta_ms, before * max_p95_delta_ratio)`.
///
/// Appears both in run metadata (camelCase JSON) and in TOML diff configs
/// (snake_case); both spellings are accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StabilityConfig {
    #[serde(alias = "max_p95_delta_ratio")]
    pub max_p95_delta_ratio: f64,

    #[serde(alias = "max_p95_delta_ms")]
    pub max_p95_delta_ms: f64,
}

impl StabilityConfig {
    pub fn new(max_p95_delta_ratio: f64, max_p95_delta_ms: f64) -> Self {
        Self {
            max_p95_delta_ratio,
            max_p95_delta_ms,
        }
    }

    /// Jitter allowed around a baseline p95
    pub fn limit_for(&self, baseline_p95_ms: f64) -> f64 {
        self.max_p95_delta_ms
            .max(baseline_p95_ms * self.max_p95_delta_ratio)
    }
}

/// How a before/after diff treats drift between the two runs
///
/// # Example
/// ```
/// use perfbound::config::DiffConfig;
///
/// let config = DiffConfig::from_toml_str(r#"
///     allow_config_drift = true
///
///     [stability]
///     max_p95_delta_ratio = 0.2
///     max_p95_delta_ms = 1.0
/// "#).unwrap();
///
/// assert!(config.is_triage());
/// assert!(!config.allow_env_drift);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Collection-setting mismatches no longer make the runs incomparable
    pub allow_config_drift: bool,

    /// Machine / browser mismatches no longer make the runs incomparable
    pub allow_env_drift: bool,

    /// Overrides any stability limits recorded in the run metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<StabilityConfig>,
}

impl DiffConfig {
    /// No drift allowed (the default)
    pub fn strict() -> Self {
        Self::default()
    }

    /// Both drift classes allowed; diffs are restricted to common coverage
    pub fn triage() -> Self {
        Self {
            allow_config_drift: true,
            allow_env_drift: true,
            stability: None,
        }
    }

    pub fn with_stability(mut self, stability: StabilityConfig) -> Self {
        self.stability = Some(stability);
        self
    }

    /// Any drift allowance switches the diff to triage mode
    pub fn is_triage(&self) -> bool {
        self.allow_config_drift || self.allow_env_drift
    }

    /// Parse and validate a TOML diff configuration
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: DiffConfig =
            toml::from_str(content).context("Failed to parse diff config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(stability) = &self.stability {
            let limits = [
                ("max_p95_delta_ratio", stability.max_p95_delta_ratio),
                ("max_p95_delta_ms", stability.max_p95_delta_ms),
            ];
            for (name, value) in limits {
                if !value.is_finite() || value < 0.0 {
                    return Err(GateError::InvalidConfig(format!(
                        "stability.{} must be a finite non-negative number, got {}",
                        name, value
                    )));
                }
            }
        }
        Ok(())
    }
}
