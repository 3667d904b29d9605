//! Special-function primitives.
//!
//! Thin wrappers over `statrs`. These are treated as black boxes with their
//! own documented precision; callers in this crate only guard the argument
//! ranges so that `statrs` never sees an invalid input.

use pd_core::{Real, Size};
use std::f64::consts::SQRT_2;

/// The natural logarithm of the Gamma function: ln Γ(z).
#[inline]
pub fn ln_gamma(z: Real) -> Real {
    statrs::function::gamma::ln_gamma(z)
}

/// `Γ(a + 1/2) / Γ(a)`, computed in log space.
#[inline]
pub fn gamma_ratio_half(a: Real) -> Real {
    (ln_gamma(a + 0.5) - ln_gamma(a)).exp()
}

/// `ln(n!)`.
#[inline]
pub fn ln_factorial(n: Size) -> Real {
    statrs::function::factorial::ln_factorial(n as u64)
}

/// Below this argument `gamma_p` sums its own leading series terms;
/// `statrs` flushes `P(a, x)` to zero for `x` under about 1.1e-15.
const GAMMA_SMALL_X: Real = 1.0e-10;

/// Regularized lower incomplete gamma function `P(a, x)`.
///
/// Returns 0 for `x <= 0` and 1 for `x = +inf`. Relative accuracy is kept
/// down to the underflow of `x^a`.
pub fn gamma_p(a: Real, x: Real) -> Real {
    if x <= 0.0 {
        return 0.0;
    }
    if x.is_infinite() {
        return 1.0;
    }
    if x < GAMMA_SMALL_X {
        // x^a e^{-x} / Γ(a + 1) · (1 + x/(a+1) + x²/((a+1)(a+2)))
        let series = 1.0 + x / (a + 1.0) * (1.0 + x / (a + 2.0));
        return (a * x.ln() - x - ln_gamma(a + 1.0)).exp() * series;
    }
    statrs::function::gamma::gamma_lr(a, x)
}

/// Regularized upper incomplete gamma function `Q(a, x) = 1 - P(a, x)`,
/// computed directly.
pub fn gamma_q(a: Real, x: Real) -> Real {
    if x <= 0.0 {
        return 1.0;
    }
    if x.is_infinite() {
        return 0.0;
    }
    if x < GAMMA_SMALL_X {
        return 1.0 - gamma_p(a, x);
    }
    statrs::function::gamma::gamma_ur(a, x)
}

/// Regularized incomplete beta function `I_x(a, b)`, clamped outside
/// `[0, 1]`.
pub fn beta_reg(a: Real, b: Real, x: Real) -> Real {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    statrs::function::beta::beta_reg(a, b, x)
}

/// `ln B(a, b)`.
#[inline]
pub fn ln_beta(a: Real, b: Real) -> Real {
    statrs::function::beta::ln_beta(a, b)
}

/// Standard normal cumulative distribution function Φ(x).
#[inline]
pub fn normal_cdf(x: Real) -> Real {
    0.5 * statrs::function::erf::erfc(-x / SQRT_2)
}

/// Standard normal survival function `1 - Φ(x)`, computed directly.
#[inline]
pub fn normal_bar(x: Real) -> Real {
    0.5 * statrs::function::erf::erfc(x / SQRT_2)
}

/// Inverse error function on `(-1, 1)`.
#[inline]
pub fn erf_inv(x: Real) -> Real {
    statrs::function::erf::erf_inv(x)
}

/// Inverse of the standard normal CDF for `u` in `(0, 1)`.
///
/// Returns `-inf` / `+inf` at the end points.
pub fn normal_inverse(u: Real) -> Real {
    if u <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if u >= 1.0 {
        return f64::INFINITY;
    }
    -SQRT_2 * statrs::function::erf::erfc_inv(2.0 * u)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn normal_round_trip() {
        for u in [1e-10, 0.001, 0.25, 0.5, 0.75, 0.999] {
            let z = normal_inverse(u);
            assert_relative_eq!(normal_cdf(z), u, max_relative = 1e-12);
        }
        assert_abs_diff_eq!(normal_inverse(0.5), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn normal_tail_is_not_cancelled() {
        // 1 - Φ(10) would be 0 in double precision.
        let t = normal_bar(10.0);
        assert_relative_eq!(t, 7.619_853_024_160_527e-24, max_relative = 1e-10);
    }

    #[test]
    fn gamma_exponential_case() {
        // P(1, x) = 1 - e^{-x}
        let x: Real = 2.0;
        assert_abs_diff_eq!(gamma_p(1.0, x), 1.0 - (-x).exp(), epsilon = 1e-14);
        assert_abs_diff_eq!(gamma_q(1.0, x), (-x).exp(), epsilon = 1e-14);
        assert_eq!(gamma_p(2.0, -1.0), 0.0);
        assert_eq!(gamma_q(2.0, f64::INFINITY), 0.0);
    }

    #[test]
    fn gamma_p_keeps_digits_near_zero() {
        // P(1/2, x) = erf(√x) ≈ 2√(x/π) and P(1, x) = 1 − e^{−x}
        for x in [1e-30, 1e-18, 1e-12, 9.9e-11] {
            let half = 2.0 * (x / std::f64::consts::PI).sqrt() * (1.0 - x / 3.0);
            assert_relative_eq!(gamma_p(0.5, x), half, max_relative = 1e-13);
            assert_relative_eq!(gamma_p(1.0, x), -(-x as Real).exp_m1(), max_relative = 1e-13);
            assert_abs_diff_eq!(gamma_q(0.5, x), 1.0 - half, epsilon = 1e-15);
        }
        // continuous across the switch to statrs
        assert_relative_eq!(
            gamma_p(0.5, GAMMA_SMALL_X * 0.999_999),
            gamma_p(0.5, GAMMA_SMALL_X),
            max_relative = 1e-6
        );
    }

    #[test]
    fn erf_inv_of_small_arguments() {
        // erf(z) ≈ 2z/√π for tiny z
        let u = 1e-10;
        let z = u * std::f64::consts::PI.sqrt() / 2.0;
        assert_relative_eq!(erf_inv(u), z, max_relative = 1e-12);
    }

    #[test]
    fn gamma_ratio_half_known_value() {
        // Γ(1.5) / Γ(1) = √π / 2
        assert_relative_eq!(
            gamma_ratio_half(1.0),
            std::f64::consts::PI.sqrt() / 2.0,
            max_relative = 1e-13
        );
    }

    #[test]
    fn beta_reg_uniform_case() {
        assert_abs_diff_eq!(beta_reg(1.0, 1.0, 0.3), 0.3, epsilon = 1e-14);
        assert_eq!(beta_reg(2.0, 3.0, -0.1), 0.0);
        assert_eq!(beta_reg(2.0, 3.0, 1.5), 1.0);
    }
}
