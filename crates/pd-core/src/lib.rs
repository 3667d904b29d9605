//! # pd-core
//!
//! Core types, the error taxonomy, and the convergence diagnostic channel
//! for probdist.
//!
//! Every other crate in the workspace builds on these: distributions report
//! invalid parameters and out-of-domain probabilities through [`Error`], and
//! iteration-capped numerical loops report through [`diagnostics`].

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Public modules ───────────────────────────────────────────────────────────

/// Non-fatal convergence warnings.
pub mod diagnostics;

/// Error types and the `ensure_param!` / `ensure_domain!` /
/// `fail_unsupported!` macros.
pub mod errors;

// ── Primitive type aliases ────────────────────────────────────────────────────

/// Floating-point type used throughout the library.
pub type Real = f64;

/// Alias used for array sizes / indices.
pub type Size = usize;

// ── Re-exports for convenience ────────────────────────────────────────────────

pub use diagnostics::ConvergenceWarning;
pub use errors::{Error, Result};
