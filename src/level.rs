//! Axis levels and parameter assignments
//!
//! A level is one scalar value along an axis. Axes are ordered sequences of
//! levels; the order means "increasing work", nothing more.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One concrete value along an axis
///
/// Comparison is strict on the scalar: `Number(1.0)`, `Text("1")` and
/// `Bool(true)` are three different levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Level {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Level {
    /// Numeric value, if this is a number level
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Level::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Bool(b) => write!(f, "{}", b),
            Level::Number(n) => write!(f, "{}", n),
            Level::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Level {
    fn from(value: bool) -> Self {
        Level::Bool(value)
    }
}

impl From<f64> for Level {
    fn from(value: f64) -> Self {
        Level::Number(value)
    }
}

impl From<i32> for Level {
    fn from(value: i32) -> Self {
        Level::Number(f64::from(value))
    }
}

impl From<&str> for Level {
    fn from(value: &str) -> Self {
        Level::Text(value.to_string())
    }
}

impl From<String> for Level {
    fn from(value: String) -> Self {
        Level::Text(value)
    }
}

/// A (possibly partial) parameter assignment: axis name → level
///
/// The ordered map doubles as the canonical identity of an assignment.
pub type Params = BTreeMap<String, Level>;

/// Render a level that may be absent the way reports print it
pub fn display_level(level: Option<&Level>) -> String {
    match level {
        Some(level) => level.to_string(),
        None => "null".to_string(),
    }
}

/// Presentation form of a parameter assignment: `{a=1&b=off}`
///
/// Keys come out sorted because `Params` is ordered.
pub fn params_key(params: &Params) -> String {
    let parts: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{{{}}}", parts.join("&"))
}

/// Merge assignments left to right; later keys win
pub fn merge_params<'a>(layers: impl IntoIterator<Item = &'a Params>) -> Params {
    let mut merged = Params::new();
    for layer in layers {
        for (k, v) in layer {
            merged.insert(k.clone(), v.clone());
        }
    }
    merged
}
