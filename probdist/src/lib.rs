//! # probdist
//!
//! Continuous distributions for goodness-of-fit testing and sampling
//! theory: chi-square, Student t, hypoexponential, Watson U²,
//! Kolmogorov–Smirnov⁺, Anderson–Darling and truncation of any of them.
//!
//! This crate is a **façade** that re-exports the public items of the
//! workspace crates. Application code should depend on this crate rather
//! than on `pd-core` / `pd-math` directly.
//!
//! ## Quick start
//!
//! ```toml
//! [dependencies]
//! probdist = "0.1"
//! ```
//!
//! ```rust
//! use probdist::{ContinuousDistribution, StudentT};
//!
//! let t = StudentT::new(10).unwrap();
//! let x = t.inverse_f(0.975).unwrap();
//! assert!((x - 2.228138851986).abs() < 1e-9);
//! assert!((t.cdf(x) - 0.975).abs() < 1e-12);
//! ```
//!
//! Families with a fast overlay take a [`Variant`]:
//!
//! ```rust
//! use probdist::{ChiSquare, ContinuousDistribution, Variant};
//!
//! let exact = ChiSquare::new(30).unwrap();
//! let quick = ChiSquare::with_variant(30, Variant::Quick).unwrap();
//! let (xe, xq) = (exact.inverse_f(0.5).unwrap(), quick.inverse_f(0.5).unwrap());
//! assert!((xe - xq).abs() / xe < 1e-4);
//! ```
//!
//! Iteration caps never abort an evaluation. They leave a record in
//! [`diagnostics`] and a `tracing` warning; drain the records with
//! [`diagnostics::take`].

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, error definitions, and diagnostics.
pub use pd_core as core;

/// Numerical engine and distribution families.
pub use pd_math as math;

/// Convergence warnings of the current thread.
pub use pd_core::diagnostics;

pub use pd_core::{ConvergenceWarning, Error, Real, Result, Size};

pub use pd_math::distributions::{
    AndersonDarling, Branch, ChiSquare, ContinuousDistribution, HypoExponential,
    HypoExponentialEqual, KolmogorovSmirnovPlus, KsPlusRegimes, StudentRegimes, StudentT,
    Truncated, Variant, WatsonRegimes, WatsonU,
};
