//! Continuous probability distributions.
//!
//! Every family implements [`ContinuousDistribution`]. Families with a fast
//! overlay carry a [`Variant`] and report the branch their dispatcher
//! takes through a `cdf_branch` method. Each module also exposes
//! parameter-explicit free functions (`chi_square::cdf(n, x)` and so on)
//! that validate the parameters and evaluate with default settings.

use crate::comparison::eps_for_digits;
use pd_core::{errors::Result, fail_unsupported, Real};

pub mod inversion;
pub mod regime;

pub mod anderson_darling;
pub mod chi_square;
pub mod hypoexponential;
pub mod hypoexponential_equal;
pub mod ks_plus;
pub mod student_t;
pub mod truncated;
pub mod watson_u;

pub use anderson_darling::AndersonDarling;
pub use chi_square::ChiSquare;
pub use hypoexponential::HypoExponential;
pub use hypoexponential_equal::HypoExponentialEqual;
pub use ks_plus::{KolmogorovSmirnovPlus, KsPlusRegimes};
pub use regime::{Branch, Variant};
pub use student_t::{StudentRegimes, StudentT};
pub use truncated::Truncated;
pub use watson_u::{WatsonRegimes, WatsonU};

/// Decimal digits requested from numerical inversion when a family does
/// not say otherwise.
pub const DEFAULT_DIGITS: u32 = 15;

/// A univariate continuous distribution.
///
/// Implementors provide `density` and `cdf`; everything else has a generic
/// default that families override where they know better (an independent
/// `bar_f` for tail accuracy, a closed-form or regime-specific quantile,
/// finite support, moments).
pub trait ContinuousDistribution: std::fmt::Debug + Send + Sync {
    /// Density at `x`; 0 outside the support.
    fn density(&self, x: Real) -> Real;

    /// `P[X <= x]`, nondecreasing, 0 below the support and 1 above.
    fn cdf(&self, x: Real) -> Real;

    /// `P[X > x]`.
    fn bar_f(&self, x: Real) -> Real {
        1.0 - self.cdf(x)
    }

    /// Smallest `x` with `cdf(x) >= u`.
    ///
    /// # Errors
    /// [`Error::OutOfDomain`](pd_core::Error::OutOfDomain) for `u` outside
    /// `[0, 1]`.
    fn inverse_f(&self, u: Real) -> Result<Real> {
        inversion::invert_anywhere(
            u,
            self.x_inf(),
            self.x_sup(),
            |x| self.cdf(x),
            eps_for_digits(self.decimal_digits()),
        )
    }

    /// Infimum of the support.
    fn x_inf(&self) -> Real {
        f64::NEG_INFINITY
    }

    /// Supremum of the support.
    fn x_sup(&self) -> Real {
        f64::INFINITY
    }

    /// Expected value.
    fn mean(&self) -> Result<Real> {
        fail_unsupported!("mean is not implemented for {:?}", self);
    }

    /// Variance.
    fn variance(&self) -> Result<Real> {
        fail_unsupported!("variance is not implemented for {:?}", self);
    }

    /// Standard deviation.
    fn standard_deviation(&self) -> Result<Real> {
        Ok(self.variance()?.sqrt())
    }

    /// Decimal digits targeted by the generic inversion.
    fn decimal_digits(&self) -> u32 {
        DEFAULT_DIGITS
    }
}

/// Central-difference estimate of `F'(x)` with step `h`.
pub(crate) fn central_difference<F>(cdf: F, x: Real, h: Real) -> Real
where
    F: Fn(Real) -> Real,
{
    (cdf(x + h) - cdf(x - h)) / (2.0 * h)
}

/// Richardson-extrapolated central difference: `D1 + (D1 − D2)/3` with
/// `D1` on step `h` and `D2` on step `2h`.
pub(crate) fn richardson_difference<F>(cdf: F, x: Real, h: Real) -> Real
where
    F: Fn(Real) -> Real,
{
    let d1 = central_difference(&cdf, x, h);
    let d2 = central_difference(&cdf, x, 2.0 * h);
    d1 + (d1 - d2) / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[derive(Debug)]
    struct Logistic;

    impl ContinuousDistribution for Logistic {
        fn density(&self, x: Real) -> Real {
            let e = (-x).exp();
            e / ((1.0 + e) * (1.0 + e))
        }
        fn cdf(&self, x: Real) -> Real {
            1.0 / (1.0 + (-x).exp())
        }
    }

    #[test]
    fn trait_defaults() {
        let d = Logistic;
        assert_abs_diff_eq!(d.bar_f(0.0), 0.5, epsilon = 1e-15);
        let q = d.inverse_f(0.75).unwrap();
        assert_abs_diff_eq!(q, 3.0f64.ln(), epsilon = 1e-12);
        assert!(d.inverse_f(1.5).is_err());
        assert_eq!(d.inverse_f(0.0).unwrap(), f64::NEG_INFINITY);
        assert!(matches!(
            d.mean(),
            Err(pd_core::Error::UnsupportedOperation(_))
        ));
        assert!(d.standard_deviation().is_err());
    }

    #[test]
    fn finite_differences() {
        let d = Logistic;
        let x = 0.7;
        assert_abs_diff_eq!(
            central_difference(|t| d.cdf(t), x, 1e-4),
            d.density(x),
            epsilon = 1e-8
        );
        assert_abs_diff_eq!(
            richardson_difference(|t| d.cdf(t), x, 0.01),
            d.density(x),
            epsilon = 1e-9
        );
    }
}
