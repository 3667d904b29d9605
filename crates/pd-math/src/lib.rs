//! # pd-math
//!
//! Numerical engine and distributions: Brent/bisection root finding with
//! bracket search, convergent-series summation, Simpson integration,
//! matrix exponentials of bidiagonal generators (over nalgebra), special
//! functions (via statrs), and the continuous distribution families built
//! on them.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Precision targets.
pub mod comparison;

/// Continuous distributions with exact and quick evaluation paths.
pub mod distributions;

/// Numerical integration.
pub mod integrals;

/// Matrix exponentials of bidiagonal rate matrices.
pub mod matrix_exp;

/// Capped summation of convergent series.
pub mod series;

/// 1D root-finding solvers.
pub mod solvers1d;

/// Special functions.
pub mod special;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use comparison::eps_for_digits;
pub use distributions::{Branch, ContinuousDistribution, Variant};
pub use solvers1d::{bisection, brent, SolverConfig};
