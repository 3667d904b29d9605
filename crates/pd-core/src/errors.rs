//! Error types for probdist.
//!
//! Parameter and domain problems are hard failures surfaced through a
//! single `thiserror`-derived enum. Convergence trouble is *not* an error:
//! it is reported through [`crate::diagnostics`] and the best available
//! estimate is still returned.
//!
//! The `ensure_param!`, `ensure_domain!` and `fail_unsupported!` macros
//! keep precondition checks to one line at the call site.

use thiserror::Error;

/// The top-level error type used throughout probdist.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A distribution parameter is invalid (nonpositive rate, sample size
    /// below the family minimum, duplicate rate, ...).
    ///
    /// Raised at construction or parameter update, never at evaluation.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A probability outside `[0, 1]` was passed to an inversion routine.
    #[error("argument out of domain: {0}")]
    OutOfDomain(String),

    /// The root finder was handed an interval without a sign change.
    #[error("invalid bracket [{a}, {b}]: f(a) = {fa} and f(b) = {fb} have the same sign")]
    InvalidBracket {
        /// Left end of the interval.
        a: f64,
        /// Right end of the interval.
        b: f64,
        /// Function value at `a`.
        fa: f64,
        /// Function value at `b`.
        fb: f64,
    },

    /// The family does not implement the requested operation.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A moment has no finite value under the current parameters.
    #[error("undefined moment: {0}")]
    UndefinedMoment(String),
}

/// Shorthand `Result` type used throughout probdist.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::InvalidParameter(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use pd_core::{ensure_param, errors::Result};
/// fn rate(x: f64) -> Result<f64> {
///     ensure_param!(x > 0.0, "rate must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(rate(1.0).is_ok());
/// assert!(rate(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure_param {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::InvalidParameter(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::OutOfDomain(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use pd_core::{ensure_domain, errors::Result};
/// fn prob(u: f64) -> Result<f64> {
///     ensure_domain!((0.0..=1.0).contains(&u), "u = {u} not in [0, 1]");
///     Ok(u)
/// }
/// assert!(prob(0.5).is_ok());
/// assert!(prob(1.5).is_err());
/// ```
#[macro_export]
macro_rules! ensure_domain {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::OutOfDomain(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::UnsupportedOperation(...))` immediately.
///
/// # Example
/// ```
/// use pd_core::{fail_unsupported, errors::Result};
/// fn mean() -> Result<f64> {
///     fail_unsupported!("mean is not implemented");
/// }
/// assert!(mean().is_err());
/// ```
#[macro_export]
macro_rules! fail_unsupported {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::UnsupportedOperation(format!($($msg)*)))
    };
}
