//! Convergence-controlled series accumulation.
//!
//! Tail probabilities of several families are sums whose individual terms
//! may dwarf the result. [`sum_series`] and [`sum_alternating`] add terms
//! until the next one no longer moves the partial sum by more than
//! `epsilon` relative to it, under a hard term cap. When the cap is hit the
//! partial sum is still returned and a
//! [`ConvergenceWarning`](pd_core::ConvergenceWarning) is recorded.

use pd_core::{
    diagnostics::{self, ConvergenceWarning},
    Real,
};

/// Stopping rule for the series evaluators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesConfig {
    /// Relative size below which a term is considered negligible.
    pub epsilon: Real,
    /// Maximum number of terms added.
    pub max_terms: usize,
    /// Lower bound on the magnitude the term is compared against; keeps the
    /// rule meaningful while the partial sum is still near zero.
    pub floor: Real,
}

impl SeriesConfig {
    /// Default cap with a custom relative tolerance.
    pub fn with_epsilon(epsilon: Real) -> Self {
        Self {
            epsilon,
            ..Self::default()
        }
    }
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.5e-16,
            max_terms: 200,
            floor: f64::MIN_POSITIVE,
        }
    }
}

/// Outcome of a series evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSum {
    /// The partial sum.
    pub value: Real,
    /// Number of terms added.
    pub terms: usize,
    /// Whether the stopping rule was met before the cap.
    pub converged: bool,
}

fn accumulate<T>(mut term: T, config: &SeriesConfig, routine: &'static str, x: Real) -> SeriesSum
where
    T: FnMut(usize) -> Real,
{
    let mut sum = 0.0;
    let mut last = 0.0;
    for j in 0..config.max_terms {
        let t = term(j);
        sum += t;
        last = t;
        if t.abs() <= config.epsilon * sum.abs().max(config.floor) {
            return SeriesSum {
                value: sum,
                terms: j + 1,
                converged: true,
            };
        }
    }
    diagnostics::report(ConvergenceWarning {
        routine,
        iterations: config.max_terms,
        residual: last.abs(),
        argument: x,
    });
    SeriesSum {
        value: sum,
        terms: config.max_terms,
        converged: false,
    }
}

/// `Σ_{j≥0} term(j)`.
///
/// `routine` and `x` only label the diagnostic emitted on the cap.
pub fn sum_series<T>(term: T, config: &SeriesConfig, routine: &'static str, x: Real) -> SeriesSum
where
    T: FnMut(usize) -> Real,
{
    accumulate(term, config, routine, x)
}

/// `Σ_{j≥0} (−1)^j · term(j)` for nonnegative `term`.
pub fn sum_alternating<T>(
    mut term: T,
    config: &SeriesConfig,
    routine: &'static str,
    x: Real,
) -> SeriesSum
where
    T: FnMut(usize) -> Real,
{
    accumulate(
        |j| {
            let t = term(j);
            if j % 2 == 0 {
                t
            } else {
                -t
            }
        },
        config,
        routine,
        x,
    )
}
