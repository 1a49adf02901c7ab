//! Perfbound - performance boundary gating for benchmark parameter grids
//!
//! Given "before" and "after" benchmark runs collected across a
//! multi-dimensional parameter space, this library finds, per performance
//! budget, the largest primary-axis level at which the budget still holds,
//! classifies regressions as tail-only or systemic, and flags runs that are
//! not safely comparable.
//!
//! ```
//! use perfbound::{DiffConfig, DiffEngine, Matrix, RunReport};
//!
//! let matrix = Matrix::from_json_str(r#"{
//!     "id": "perf-matrix-v1",
//!     "suites": [{
//!         "id": "converge.txnCommit",
//!         "primaryAxis": "steps",
//!         "axes": { "steps": [200, 800] },
//!         "budgets": [{ "type": "absolute", "metric": "runtime.txnCommitMs", "p95Ms": 16 }]
//!     }]
//! }"#).unwrap();
//!
//! let run = RunReport::from_json_str(r#"{
//!     "meta": { "matrixId": "perf-matrix-v1" },
//!     "suites": [{
//!         "id": "converge.txnCommit",
//!         "points": [
//!             { "params": { "steps": 200 }, "status": "ok", "metrics": [
//!                 { "name": "runtime.txnCommitMs", "status": "ok",
//!                   "stats": { "n": 30, "medianMs": 4, "p95Ms": 6 } } ] },
//!             { "params": { "steps": 800 }, "status": "ok", "metrics": [
//!                 { "name": "runtime.txnCommitMs", "status": "ok",
//!                   "stats": { "n": 30, "medianMs": 9, "p95Ms": 14 } } ] }
//!         ]
//!     }]
//! }"#).unwrap();
//!
//! let report = DiffEngine::new(DiffConfig::strict()).diff(&matrix, &run, &run).unwrap();
//! assert_eq!(report.summary.regressions, 0);
//! ```

pub mod budget;
pub mod classify;
pub mod comparability;
pub mod config;
pub mod delta;
pub mod error;
pub mod evidence;
pub mod level;
pub mod lookup;
pub mod report;
pub mod slices;
pub mod stability;
pub mod suite_result;
pub mod suite_spec;
pub mod threshold;
pub mod validate;

pub use budget::{Budget, Reason};
pub use classify::{Classification, RegressionKind};
pub use comparability::{check_comparability, ComparabilityResult};
pub use config::{DiffConfig, StabilityConfig};
pub use error::{GateError, Result};
pub use level::{Level, Params};
pub use report::{DeltaReport, DiffEngine};
pub use suite_result::{Point, RunReport, SuiteResult};
pub use suite_spec::{Matrix, SuiteSpec};
pub use threshold::{search_threshold, ThresholdResult};
