//! Enumeration of where slices and full parameter assignments
//!
//! Both are cartesian products over declared axes, built iteratively: the
//! product grows one axis at a time, so deep matrices never recurse.

use crate::budget::Budget;
use crate::level::{Level, Params};
use crate::suite_spec::SuiteSpec;

/// Cartesian product of named axes, in the given axis order
///
/// The first axis varies slowest. No axes yields one empty assignment; an
/// axis with no levels yields none.
pub fn cartesian<'a, I>(axes: I) -> Vec<Params>
where
    I: IntoIterator<Item = (&'a str, &'a [Level])>,
{
    let mut combos = vec![Params::new()];
    for (name, levels) in axes {
        let mut next = Vec::with_capacity(combos.len() * levels.len());
        for combo in &combos {
            for level in levels {
                let mut extended = combo.clone();
                extended.insert(name.to_string(), level.clone());
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}

/// Axes that vary between where slices for a budget
///
/// Everything except the primary axis and the axes pinned by the budget's
/// references, in declaration order.
pub fn slice_axes<'a>(spec: &'a SuiteSpec, budget: &Budget) -> Vec<(&'a str, &'a [Level])> {
    let pinned = budget.reference_axes();
    spec.axes
        .iter()
        .filter(|(name, _)| *name != spec.primary_axis && !pinned.iter().any(|p| p == name))
        .collect()
}

/// Every where slice a budget is searched over
pub fn where_slices(spec: &SuiteSpec, budget: &Budget) -> Vec<Params> {
    cartesian(slice_axes(spec, budget))
}

/// Where slices ignoring budget references (all non-primary axes)
pub fn non_primary_slices(spec: &SuiteSpec) -> Vec<Params> {
    cartesian(
        spec.axes
            .iter()
            .filter(|(name, _)| *name != spec.primary_axis),
    )
}

/// Every full parameter assignment of the suite
pub fn point_params(spec: &SuiteSpec) -> Vec<Params> {
    cartesian(spec.axes.iter())
}
