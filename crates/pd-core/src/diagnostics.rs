//! Non-fatal convergence diagnostics.
//!
//! Series evaluators and root finders run under fixed iteration caps. When a
//! cap is hit before the stopping rule is met, the routine still returns its
//! best estimate and records a [`ConvergenceWarning`] here. Each record is
//! also emitted through `tracing::warn!`.
//!
//! Records are kept per thread in a bounded buffer: evaluations on distinct
//! threads never see each other's warnings, and a caller that never drains
//! the buffer only retains the most recent [`CAPACITY`] entries.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;

/// Maximum number of records retained per thread.
pub const CAPACITY: usize = 64;

/// An iterative routine stopped at its cap without meeting its tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceWarning {
    /// Name of the routine that gave up, e.g. `"brent"` or `"watson_u::cdf"`.
    pub routine: &'static str,
    /// Number of iterations (or series terms) performed.
    pub iterations: usize,
    /// Last residual: bracket width, last term, or |f(x)|, depending on the
    /// routine.
    pub residual: f64,
    /// Argument at which the routine was evaluated.
    pub argument: f64,
}

impl fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: no convergence after {} iterations at x = {} (residual {:e})",
            self.routine, self.iterations, self.argument, self.residual
        )
    }
}

thread_local! {
    static WARNINGS: RefCell<VecDeque<ConvergenceWarning>> =
        RefCell::new(VecDeque::with_capacity(CAPACITY));
}

/// Record a convergence warning for the current thread and log it.
pub fn report(warning: ConvergenceWarning) {
    tracing::warn!(
        routine = warning.routine,
        iterations = warning.iterations,
        residual = warning.residual,
        argument = warning.argument,
        "iteration cap reached; returning best estimate"
    );
    WARNINGS.with(|w| {
        let mut w = w.borrow_mut();
        if w.len() == CAPACITY {
            w.pop_front();
        }
        w.push_back(warning);
    });
}

/// Drain and return the warnings recorded on the current thread.
pub fn take() -> Vec<ConvergenceWarning> {
    WARNINGS.with(|w| w.borrow_mut().drain(..).collect())
}

/// Number of warnings currently buffered on this thread.
pub fn count() -> usize {
    WARNINGS.with(|w| w.borrow().len())
}

/// Discard the warnings recorded on the current thread.
pub fn clear() {
    WARNINGS.with(|w| w.borrow_mut().clear());
}
