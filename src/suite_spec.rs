//! Suite specs and the matrix catalog
//!
//! A suite spec declares the parameter space of one suite (its axes, in
//! declaration order), which axis threshold search drives, and the budgets
//! the suite is gated on. Specs are loaded once and validated before any
//! search runs: a structurally invalid spec is the only fatal input error.

use crate::budget::Budget;
use crate::error::{GateError, Result};
use crate::level::Level;
use crate::suite_result::Priority;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Named axes in declaration order
///
/// Serialized as a JSON object; the object's key order is kept because it
/// decides the enumeration order of where slices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Axes(Vec<(String, Vec<Level>)>);

impl Axes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append an axis; a repeated name replaces the earlier levels in place
    pub fn with_axis(mut self, name: impl Into<String>, levels: Vec<Level>) -> Self {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = levels,
            None => self.0.push((name, levels)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&[Level]> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, levels)| levels.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Level])> {
        self.0.iter().map(|(n, l)| (n.as_str(), l.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Axes {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, levels) in &self.0 {
            map.serialize_entry(name, levels)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Axes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct AxesVisitor;

        impl<'de> Visitor<'de> for AxesVisitor {
            type Value = Axes;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of axis name to ordered levels")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Axes, A::Error> {
                let mut axes = Vec::new();
                while let Some((name, levels)) = access.next_entry::<String, Vec<Level>>()? {
                    if axes.iter().any(|(n, _): &(String, Vec<Level>)| *n == name) {
                        return Err(serde::de::Error::custom(format!("duplicate axis '{}'", name)));
                    }
                    axes.push((name, levels));
                }
                Ok(Axes(axes))
            }
        }

        deserializer.deserialize_map(AxesVisitor)
    }
}

/// Declared parameter space and budgets of one suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteSpec {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    /// Axis scanned by threshold search
    pub primary_axis: String,

    pub axes: Axes,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub budgets: Vec<Budget>,

    /// Evidence names that always appear in evidence deltas
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_evidence: Vec<String>,
}

impl SuiteSpec {
    pub fn new(id: impl Into<String>, primary_axis: impl Into<String>, axes: Axes) -> Self {
        Self {
            id: id.into(),
            title: None,
            priority: None,
            primary_axis: primary_axis.into(),
            axes,
            budgets: Vec::new(),
            required_evidence: Vec::new(),
        }
    }

    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budgets.push(budget);
        self
    }

    /// Levels of the primary axis, in scan order
    pub fn primary_levels(&self) -> &[Level] {
        self.axes.get(&self.primary_axis).unwrap_or(&[])
    }

    /// Check the spec is searchable
    ///
    /// # Errors
    /// Fails when the primary axis is undeclared or empty, when any axis
    /// repeats a level (level indices would be ambiguous), or when a budget
    /// names no metric.
    pub fn validate(&self) -> Result<()> {
        let Some(primary) = self.axes.get(&self.primary_axis) else {
            return Err(GateError::UnknownPrimaryAxis {
                suite: self.id.clone(),
                axis: self.primary_axis.clone(),
            });
        };

        if primary.is_empty() {
            return Err(GateError::EmptyPrimaryAxis {
                suite: self.id.clone(),
                axis: self.primary_axis.clone(),
            });
        }

        for (axis, levels) in self.axes.iter() {
            for (i, level) in levels.iter().enumerate() {
                if levels[..i].contains(level) {
                    return Err(GateError::DuplicateLevel {
                        suite: self.id.clone(),
                        axis: axis.to_string(),
                        level: level.to_string(),
                    });
                }
            }
        }

        for (index, budget) in self.budgets.iter().enumerate() {
            if budget.metric().trim().is_empty() {
                return Err(GateError::EmptyBudgetMetric {
                    suite: self.id.clone(),
                    index,
                });
            }
        }

        Ok(())
    }
}

/// Catalog of suite specs, keyed by suite id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matrix {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(default)]
    pub suites: Vec<SuiteSpec>,
}

impl Matrix {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            updated_at: None,
            suites: Vec::new(),
        }
    }

    pub fn with_suite(mut self, suite: SuiteSpec) -> Self {
        self.suites.push(suite);
        self
    }

    /// Parse a matrix from JSON text
    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        use anyhow::Context;
        serde_json::from_str(content).context("Failed to parse perf matrix JSON")
    }

    pub fn suite(&self, id: &str) -> Option<&SuiteSpec> {
        self.suites.iter().find(|s| s.id == id)
    }

    /// Validate every suite; stops at the first invalid one
    pub fn validate(&self) -> Result<()> {
        for (i, suite) in self.suites.iter().enumerate() {
            if self.suites[..i].iter().any(|s| s.id == suite.id) {
                return Err(GateError::DuplicateSuite {
                    matrix: self.id.clone(),
                    suite: suite.id.clone(),
                });
            }
            suite.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steps_axes() -> Axes {
        Axes::new()
            .with_axis("steps", vec![200.into(), 800.into(), 2000.into()])
            .with_axis("mode", vec!["auto".into(), "full".into()])
    }

    #[test]
    fn test_axes_keep_declaration_order() {
        let json = r#"{"zeta": [1, 2], "alpha": ["x"], "mid": [true, false]}"#;
        let axes: Axes = serde_json::from_str(json).unwrap();
        assert_eq!(axes.names().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);

        let back = serde_json::to_string(&axes).unwrap();
        assert!(back.find("zeta").unwrap() < back.find("alpha").unwrap());
    }

    #[test]
    fn test_axes_reject_duplicate_names() {
        let json = r#"{"steps": [1], "steps": [2]}"#;
        assert!(serde_json::from_str::<Axes>(json).is_err());
    }

    #[test]
    fn test_valid_spec() {
        let spec = SuiteSpec::new("converge.txnCommit", "steps", steps_axes());
        assert!(spec.validate().is_ok());
        assert_eq!(spec.primary_levels().len(), 3);
    }

    #[test]
    fn test_unknown_primary_axis_is_fatal() {
        let spec = SuiteSpec::new("s", "watchers", steps_axes());
        assert!(matches!(
            spec.validate(),
            Err(GateError::UnknownPrimaryAxis { .. })
        ));
        assert!(spec.primary_levels().is_empty());
    }

    #[test]
    fn test_empty_primary_axis_is_fatal() {
        let spec = SuiteSpec::new("s", "steps", Axes::new().with_axis("steps", vec![]));
        assert!(matches!(
            spec.validate(),
            Err(GateError::EmptyPrimaryAxis { .. })
        ));
    }

    #[test]
    fn test_duplicate_level_is_fatal() {
        let axes = Axes::new().with_axis("steps", vec![200.into(), 800.into(), 200.into()]);
        let spec = SuiteSpec::new("s", "steps", axes);
        match spec.validate() {
            Err(GateError::DuplicateLevel { axis, level, .. }) => {
                assert_eq!(axis, "steps");
                assert_eq!(level, "200");
            }
            other => panic!("Expected DuplicateLevel, got {:?}", other),
        }
    }

    #[test]
    fn test_matrix_duplicate_suite_is_fatal() {
        let spec = SuiteSpec::new("s", "steps", steps_axes());
        let matrix = Matrix::new("m").with_suite(spec.clone()).with_suite(spec);
        assert!(matches!(
            matrix.validate(),
            Err(GateError::DuplicateSuite { .. })
        ));
    }

    #[test]
    fn test_matrix_from_json() {
        let json = r#"{
            "id": "logix-browser-perf-matrix-v1",
            "suites": [{
                "id": "converge.txnCommit",
                "primaryAxis": "steps",
                "axes": {"steps": [200, 800], "dirtyRootsRatio": [0.05, 0.75]},
                "budgets": [{"type": "absolute", "metric": "runtime.txnCommitMs", "p95Ms": 50}]
            }]
        }"#;

        let matrix = Matrix::from_json_str(json).unwrap();
        assert!(matrix.validate().is_ok());
        let suite = matrix.suite("converge.txnCommit").unwrap();
        assert_eq!(suite.budgets.len(), 1);
        assert_eq!(suite.primary_levels(), &[Level::from(200), Level::from(800)]);
    }
}
