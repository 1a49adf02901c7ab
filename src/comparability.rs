//! Comparability of two runs
//!
//! Before diffing, the collection settings (config) and machine
//! fingerprints (env) of both runs are compared. Mismatches come in two
//! classes that gate independently:
//!
//! - config mismatches: matrix identity and hash, `runs`, `warmupDiscard`,
//!   `timeoutMs`, and any extra config key
//! - env mismatches: OS, architecture, browser name / headless / version,
//!   and any extra env key
//!
//! A class only counts against the verdict when the diff config does not
//! allow it. Mismatches are reported either way. Softer differences
//! (profile, headless flag, Node version, git state) become warnings and
//! never change the verdict.

use crate::config::DiffConfig;
use crate::error::{GateError, Result};
use crate::suite_result::{RunConfig, RunEnv, RunMeta};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use tracing::warn;

const UNDEFINED: &str = "undefined";

/// Verdict and findings of a comparability check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparabilityResult {
    pub comparable: bool,
    pub allow_config_drift: bool,
    pub allow_env_drift: bool,
    pub config_mismatches: Vec<String>,
    pub env_mismatches: Vec<String>,
    pub warnings: Vec<String>,
}

impl ComparabilityResult {
    /// True when both runs match in every hard-gated field
    pub fn is_exact(&self) -> bool {
        self.config_mismatches.is_empty() && self.env_mismatches.is_empty()
    }

    /// Turn a negative verdict into an error carrying every mismatch
    pub fn ensure_comparable(&self) -> Result<()> {
        if self.comparable {
            return Ok(());
        }
        Err(GateError::NotComparable {
            config_mismatches: self.config_mismatches.clone(),
            env_mismatches: self.env_mismatches.clone(),
        })
    }
}

fn show<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| UNDEFINED.to_string(), |v| v.to_string())
}

fn show_json(value: Option<&serde_json::Value>) -> String {
    match value {
        None => UNDEFINED.to_string(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Findings accumulated while walking both metadata blocks
#[derive(Default)]
struct Findings {
    config: Vec<String>,
    env: Vec<String>,
    warnings: Vec<String>,
}

impl Findings {
    /// Setting that must be present on both sides and equal
    fn required_number(&mut self, label: &str, before: Option<f64>, after: Option<f64>) {
        let before = before.filter(|v| v.is_finite());
        let after = after.filter(|v| v.is_finite());
        match (before, after) {
            (Some(b), Some(a)) if b == a => {}
            (Some(b), Some(a)) => self
                .config
                .push(format!("{}: before={} after={}", label, b, a)),
            (b, a) => self.config.push(format!(
                "{}: missing (before={} after={})",
                label,
                show(b),
                show(a)
            )),
        }
    }

    fn required_env<T: PartialEq + Display>(
        &mut self,
        label: &str,
        before: Option<T>,
        after: Option<T>,
    ) {
        match (before, after) {
            (Some(b), Some(a)) if b == a => {}
            (Some(b), Some(a)) => self
                .env
                .push(format!("{}: before={} after={}", label, b, a)),
            (b, a) => self.env.push(format!(
                "{}: missing (before={} after={})",
                label,
                show(b),
                show(a)
            )),
        }
    }

    fn soft<T: PartialEq + Display>(&mut self, label: &str, before: Option<T>, after: Option<T>) {
        if before != after {
            self.warnings.push(format!(
                "{}: before={} after={}",
                label,
                show(before),
                show(after)
            ));
        }
    }
}

/// Keys of two extra maps whose values differ, as mismatch lines
fn extra_mismatches(
    prefix: &str,
    before: &BTreeMap<String, serde_json::Value>,
    after: &BTreeMap<String, serde_json::Value>,
) -> Vec<String> {
    let keys: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
    keys.into_iter()
        .filter(|key| before.get(*key) != after.get(*key))
        .map(|key| {
            format!(
                "{}{}: before={} after={}",
                prefix,
                key,
                show_json(before.get(key)),
                show_json(after.get(key))
            )
        })
        .collect()
}

fn check_config(findings: &mut Findings, before: &RunMeta, after: &RunMeta) {
    if before.matrix_id != after.matrix_id {
        findings.config.push(format!(
            "matrixId: before={} after={}",
            before.matrix_id, after.matrix_id
        ));
    }

    match (before.matrix_hash.as_deref(), after.matrix_hash.as_deref()) {
        (Some(b), Some(a)) if !b.is_empty() && !a.is_empty() => {
            if b != a {
                findings
                    .config
                    .push(format!("matrixHash: before={} after={}", b, a));
            }
        }
        (b, a) => findings.config.push(format!(
            "matrixHash: missing (before={} after={})",
            show(b.filter(|h| !h.is_empty())),
            show(a.filter(|h| !h.is_empty()))
        )),
    }

    let empty = RunConfig::default();
    let b = before.config.as_ref().unwrap_or(&empty);
    let a = after.config.as_ref().unwrap_or(&empty);

    findings.required_number("runs", b.runs, a.runs);
    findings.required_number("warmupDiscard", b.warmup_discard, a.warmup_discard);
    findings.required_number("timeoutMs", b.timeout_ms, a.timeout_ms);
    findings
        .config
        .extend(extra_mismatches("config.", &b.extra, &a.extra));

    findings.soft("config.profile", b.profile.as_deref(), a.profile.as_deref());
    findings.soft("config.headless", b.headless, a.headless);
}

fn check_env(findings: &mut Findings, before: &RunMeta, after: &RunMeta) {
    let empty = RunEnv::default();
    let b = before.env.as_ref().unwrap_or(&empty);
    let a = after.env.as_ref().unwrap_or(&empty);
    let b_browser = b.browser.as_ref();
    let a_browser = a.browser.as_ref();

    findings.required_env("env.os", b.os.as_deref(), a.os.as_deref());
    findings.required_env("env.arch", b.arch.as_deref(), a.arch.as_deref());
    findings.required_env(
        "env.browser.name",
        b_browser.and_then(|x| x.name.as_deref()),
        a_browser.and_then(|x| x.name.as_deref()),
    );
    findings.required_env(
        "env.browser.headless",
        b_browser.and_then(|x| x.headless),
        a_browser.and_then(|x| x.headless),
    );

    let b_version = b_browser.and_then(|x| x.version.as_deref());
    let a_version = a_browser.and_then(|x| x.version.as_deref());
    if b_version.is_some() || a_version.is_some() {
        findings.required_env("env.browser.version", b_version, a_version);
    }

    findings
        .env
        .extend(extra_mismatches("env.", &b.extra, &a.extra));

    findings.soft("env.node", b.node.as_deref(), a.node.as_deref());
}

fn check_git(findings: &mut Findings, before: &RunMeta, after: &RunMeta) {
    let b = before.git.as_ref();
    let a = after.git.as_ref();

    if b.and_then(|g| g.dirty).unwrap_or(false) {
        findings.warnings.push("git.dirty.before=true".to_string());
    }
    if a.and_then(|g| g.dirty).unwrap_or(false) {
        findings.warnings.push("git.dirty.after=true".to_string());
    }

    let present = |s: Option<&String>| s.filter(|v| !v.is_empty()).cloned();
    if let (Some(bb), Some(ab)) = (
        present(b.and_then(|g| g.branch.as_ref())),
        present(a.and_then(|g| g.branch.as_ref())),
    ) {
        if bb != ab {
            findings
                .warnings
                .push(format!("git.branch: before={} after={}", bb, ab));
        }
    }
    if let (Some(bc), Some(ac)) = (
        present(b.and_then(|g| g.commit.as_ref())),
        present(a.and_then(|g| g.commit.as_ref())),
    ) {
        if bc != ac {
            findings
                .warnings
                .push(format!("git.commit: before={} after={}", bc, ac));
        }
    }
}

/// Compare the metadata of two runs
pub fn check_comparability(
    before: &RunMeta,
    after: &RunMeta,
    config: &DiffConfig,
) -> ComparabilityResult {
    let mut findings = Findings::default();
    check_config(&mut findings, before, after);
    check_env(&mut findings, before, after);
    check_git(&mut findings, before, after);

    if !findings.config.is_empty() {
        warn!(
            allowed = config.allow_config_drift,
            mismatches = ?findings.config,
            "config drift between runs"
        );
    }
    if !findings.env.is_empty() {
        warn!(
            allowed = config.allow_env_drift,
            mismatches = ?findings.env,
            "env drift between runs"
        );
    }
    if !findings.warnings.is_empty() {
        warn!(warnings = ?findings.warnings, "non-fatal drift between runs");
    }

    let config_ok = findings.config.is_empty() || config.allow_config_drift;
    let env_ok = findings.env.is_empty() || config.allow_env_drift;

    ComparabilityResult {
        comparable: config_ok && env_ok,
        allow_config_drift: config.allow_config_drift,
        allow_env_drift: config.allow_env_drift,
        config_mismatches: findings.config,
        env_mismatches: findings.env,
        warnings: findings.warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite_result::{BrowserEnv, GitInfo};

    fn meta() -> RunMeta {
        RunMeta {
            matrix_id: "logix-browser-perf-matrix-v1".to_string(),
            matrix_hash: Some("abc123".to_string()),
            config: Some(RunConfig {
                runs: Some(30.0),
                warmup_discard: Some(5.0),
                timeout_ms: Some(30000.0),
                headless: Some(true),
                profile: Some("default".to_string()),
                ..RunConfig::default()
            }),
            env: Some(RunEnv {
                os: Some("linux".to_string()),
                arch: Some("x64".to_string()),
                node: Some("v22.1.0".to_string()),
                browser: Some(BrowserEnv {
                    name: Some("chromium".to_string()),
                    version: Some("131.0".to_string()),
                    headless: Some(true),
                }),
                ..RunEnv::default()
            }),
            ..RunMeta::default()
        }
    }

    #[test]
    fn test_identical_meta_is_comparable() {
        let result = check_comparability(&meta(), &meta(), &DiffConfig::strict());
        assert!(result.comparable);
        assert!(result.is_exact());
        assert!(result.warnings.is_empty());
        assert!(result.ensure_comparable().is_ok());
    }

    #[test]
    fn test_missing_hash_is_config_mismatch() {
        let mut after = meta();
        after.matrix_hash = None;
        let result = check_comparability(&meta(), &after, &DiffConfig::strict());
        assert_eq!(
            result.config_mismatches,
            vec!["matrixHash: missing (before=abc123 after=undefined)".to_string()]
        );
    }

    #[test]
    fn test_missing_runs_on_both_sides() {
        let mut before = meta();
        let mut after = meta();
        before.config.as_mut().unwrap().runs = None;
        after.config.as_mut().unwrap().runs = None;
        let result = check_comparability(&before, &after, &DiffConfig::strict());
        assert_eq!(
            result.config_mismatches,
            vec!["runs: missing (before=undefined after=undefined)".to_string()]
        );
    }

    #[test]
    fn test_extra_config_key_differs() {
        let mut after = meta();
        after
            .config
            .as_mut()
            .unwrap()
            .extra
            .insert("cpuThrottle".to_string(), serde_json::json!(4));
        let result = check_comparability(&meta(), &after, &DiffConfig::strict());
        assert_eq!(
            result.config_mismatches,
            vec!["config.cpuThrottle: before=undefined after=4".to_string()]
        );
    }

    #[test]
    fn test_browser_version_optional_when_both_absent() {
        let strip = |mut m: RunMeta| {
            m.env.as_mut().unwrap().browser.as_mut().unwrap().version = None;
            m
        };
        let result = check_comparability(&strip(meta()), &strip(meta()), &DiffConfig::strict());
        assert!(result.env_mismatches.is_empty());

        let result = check_comparability(&strip(meta()), &meta(), &DiffConfig::strict());
        assert_eq!(
            result.env_mismatches,
            vec!["env.browser.version: missing (before=undefined after=131.0)".to_string()]
        );
    }

    #[test]
    fn test_soft_differences_only_warn() {
        let mut after = meta();
        after.config.as_mut().unwrap().profile = Some("soak".to_string());
        after.env.as_mut().unwrap().node = Some("v20.0.0".to_string());
        let result = check_comparability(&meta(), &after, &DiffConfig::strict());
        assert!(result.comparable);
        assert_eq!(
            result.warnings,
            vec![
                "config.profile: before=default after=soak".to_string(),
                "env.node: before=v22.1.0 after=v20.0.0".to_string(),
            ]
        );
    }

    #[test]
    fn test_git_warnings() {
        let mut before = meta();
        let mut after = meta();
        before.git = Some(GitInfo {
            branch: Some("main".to_string()),
            commit: Some("1a2b3c4".to_string()),
            dirty: Some(false),
        });
        after.git = Some(GitInfo {
            branch: Some("main".to_string()),
            commit: Some("5d6e7f8".to_string()),
            dirty: Some(true),
        });
        let result = check_comparability(&before, &after, &DiffConfig::strict());
        assert!(result.comparable);
        assert_eq!(
            result.warnings,
            vec![
                "git.dirty.after=true".to_string(),
                "git.commit: before=1a2b3c4 after=5d6e7f8".to_string(),
            ]
        );
    }

    #[test]
    fn test_git_commit_compared_only_when_both_present() {
        let mut after = meta();
        after.git = Some(GitInfo {
            commit: Some("5d6e7f8".to_string()),
            ..GitInfo::default()
        });
        let result = check_comparability(&meta(), &after, &DiffConfig::strict());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_independent_gates() {
        let mut after = meta();
        after.config.as_mut().unwrap().runs = Some(10.0);
        after.env.as_mut().unwrap().os = Some("darwin".to_string());

        let config_only = DiffConfig {
            allow_config_drift: true,
            ..DiffConfig::default()
        };
        let result = check_comparability(&meta(), &after, &config_only);
        assert!(!result.comparable);

        let env_only = DiffConfig {
            allow_env_drift: true,
            ..DiffConfig::default()
        };
        assert!(!check_comparability(&meta(), &after, &env_only).comparable);

        let both = check_comparability(&meta(), &after, &DiffConfig::triage());
        assert!(both.comparable);
        assert_eq!(both.config_mismatches.len(), 1);
        assert_eq!(both.env_mismatches.len(), 1);
    }

    #[test]
    fn test_ensure_comparable_error() {
        let mut after = meta();
        after.env.as_mut().unwrap().arch = Some("arm64".to_string());
        let result = check_comparability(&meta(), &after, &DiffConfig::strict());

        match result.ensure_comparable() {
            Err(GateError::NotComparable { env_mismatches, .. }) => {
                assert_eq!(env_mismatches, vec!["env.arch: before=x64 after=arm64".to_string()]);
            }
            other => panic!("Expected NotComparable, got {:?}", other),
        }
    }
}
