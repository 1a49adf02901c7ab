// Performance budgets and their evaluation at single points
//
// Two budget shapes are supported:
// - absolute: the p95 of a metric must stay under a ceiling
// - relative: the p95 ratio between two points of the same slice (the
//   numerator and denominator references) must stay under a maximum ratio,
//   with a minimum absolute delta below which a ratio breach is treated as
//   noise
//
// Evaluation never fails loudly: missing or unusable data comes back as a
// typed Reason so threshold search can stop and report it.

mod evaluator;
mod reason;
mod reference;
mod types;

pub(crate) use evaluator::reference_params;
pub use evaluator::{
    evaluate_absolute, evaluate_at, evaluate_relative, exceeds, read_metric, AbsoluteReading,
    BudgetReading, MetricReading, RelativeReading,
};
pub use reason::{Reason, ReasonCategory};
pub use reference::parse_ref;
pub use types::{AbsoluteBudget, Budget, RelativeBudget};
