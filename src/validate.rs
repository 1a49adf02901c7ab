//! Validation of a run report against the matrix it claims to follow
//!
//! A report is only trusted for hard conclusions when it names the same
//! matrix id, carries the sha256 of the exact matrix text, records its
//! collection settings, and covers the matrix's suites.

use crate::suite_result::RunReport;
use crate::suite_spec::Matrix;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Lowercase hex sha256 of the matrix file contents
pub fn matrix_hash(matrix_text: &str) -> String {
    hex::encode(Sha256::digest(matrix_text.as_bytes()))
}

/// Findings of a report validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportValidation {
    /// Hash of the matrix text the report was checked against
    pub matrix_hash: String,
    pub errors: Vec<String>,
    pub notes: Vec<String>,
}

impl ReportValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

fn finite(value: Option<f64>) -> bool {
    value.is_some_and(f64::is_finite)
}

/// Check a report against a matrix
///
/// With `allow_partial`, matrix suites missing from the report become
/// notes instead of errors. Nothing else is relaxed.
pub fn validate_report(
    matrix_text: &str,
    matrix: &Matrix,
    report: &RunReport,
    allow_partial: bool,
) -> ReportValidation {
    let hash = matrix_hash(matrix_text);
    let mut errors = Vec::new();
    let mut notes = Vec::new();
    let meta = &report.meta;

    if matrix.id.is_empty() {
        errors.push("matrix.id is missing".to_string());
    }

    if meta.matrix_id.is_empty() {
        errors.push("report.meta.matrixId is missing".to_string());
    } else if !matrix.id.is_empty() && meta.matrix_id != matrix.id {
        errors.push(format!(
            "matrixId mismatch: report={} matrix={}",
            meta.matrix_id, matrix.id
        ));
    }

    match meta.matrix_hash.as_deref() {
        None | Some("") => errors.push("report.meta.matrixHash is missing".to_string()),
        Some(reported) if reported != hash => errors.push(format!(
            "matrixHash mismatch: report={} matrix={}",
            reported, hash
        )),
        Some(_) => {}
    }

    let config = meta.config.as_ref();
    let settings = [
        ("runs", config.and_then(|c| c.runs)),
        ("warmupDiscard", config.and_then(|c| c.warmup_discard)),
        ("timeoutMs", config.and_then(|c| c.timeout_ms)),
    ];
    for (name, value) in settings {
        if !finite(value) {
            errors.push(format!("report.meta.config.{} is missing or invalid", name));
        }
    }

    let matrix_ids: BTreeSet<&str> = matrix
        .suites
        .iter()
        .map(|s| s.id.as_str())
        .filter(|id| !id.is_empty())
        .collect();
    if matrix_ids.is_empty() {
        errors.push("matrix.suites is missing/empty or has no valid suite ids".to_string());
    }

    let report_ids: BTreeSet<&str> = report
        .suites
        .iter()
        .map(|s| s.id.as_str())
        .filter(|id| !id.is_empty())
        .collect();
    if report_ids.is_empty() {
        errors.push("report.suites is missing/empty or has no valid suite ids".to_string());
    }

    let extra: Vec<&str> = report_ids.difference(&matrix_ids).copied().collect();
    if !extra.is_empty() {
        errors.push(format!(
            "report contains suites not in matrix: {}",
            extra.join(", ")
        ));
    }

    let missing: Vec<&str> = matrix_ids.difference(&report_ids).copied().collect();
    if !missing.is_empty() {
        let message = format!("report is missing matrix suites: {}", missing.join(", "));
        if allow_partial {
            notes.push(message);
        } else {
            errors.push(message);
        }
    }

    ReportValidation {
        matrix_hash: hash,
        errors,
        notes,
    }
}
