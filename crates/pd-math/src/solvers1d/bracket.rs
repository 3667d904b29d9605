//! Bracket search for quantile inversion on unbounded support.

use pd_core::{ensure_domain, errors::Result, Real};

const EXPAND_LIMIT: Real = f64::MAX / 4.0;
const FIND_START: Real = 8.0;
const FIND_LIMIT: Real = f64::MAX / 2.0;

/// Bracket `[lo, hi]` with `cdf(lo) <= u <= cdf(hi)` for a distribution
/// supported on `[lower, +inf)`, starting from the scale estimate `x1`
/// (usually the mean).
///
/// If `u <= cdf(x1)` the bracket is `[lower, x1]`. Otherwise the upper end
/// grows as `x2 = 4·x1 + 1`, then `x2 ← 4·x2`, with the lower end sliding to
/// the previous `x2`, until `cdf(x2) >= u`. The number of evaluations is
/// logarithmic in the distance to the target.
///
/// Growth stops once `x2` passes `f64::MAX / 4`; that can only happen for
/// `u` numerically indistinguishable from 1.
pub fn expand_upper<F>(u: Real, lower: Real, x1: Real, cdf: F) -> Result<(Real, Real)>
where
    F: Fn(Real) -> Real,
{
    ensure_domain!((0.0..=1.0).contains(&u), "u = {u} not in [0, 1]");
    if u <= cdf(x1) {
        return Ok((lower, x1));
    }
    let mut lo = x1;
    let mut hi = 4.0 * x1 + 1.0;
    while cdf(hi) < u && hi < EXPAND_LIMIT {
        lo = hi;
        hi *= 4.0;
    }
    Ok((lo, hi))
}

/// Bracket `[a, b]` containing the `u`-quantile for arbitrary support
/// `[x_inf, x_sup]`.
///
/// Starts at `±8` and doubles outward until the cdf straddles `u`; the
/// result is clipped to the support.
pub fn find_interval<F>(u: Real, x_inf: Real, x_sup: Real, cdf: F) -> Result<(Real, Real)>
where
    F: Fn(Real) -> Real,
{
    ensure_domain!((0.0..=1.0).contains(&u), "u = {u} not in [0, 1]");

    let mut b = FIND_START;
    while b < FIND_LIMIT && u > cdf(b) {
        b *= 2.0;
    }
    if b > FIND_START {
        return Ok((b / 2.0, b.min(x_sup)));
    }

    let mut a = -FIND_START;
    while a > -FIND_LIMIT && u < cdf(a) {
        a *= 2.0;
    }
    if a < -FIND_START {
        return Ok((a.max(x_inf), a / 2.0));
    }
    Ok((a.max(x_inf), b.min(x_sup)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn exp_cdf(x: Real) -> Real {
        if x <= 0.0 {
            0.0
        } else {
            -(-x).exp_m1()
        }
    }

    #[test]
    fn below_scale_uses_lower_end() {
        let (lo, hi) = expand_upper(0.3, 0.0, 1.0, exp_cdf).unwrap();
        assert_eq!((lo, hi), (0.0, 1.0));
    }

    #[test]
    fn expansion_sequence() {
        // 1 -> 5 -> 20 -> 80
        let (lo, hi) = expand_upper(1.0 - 1e-12, 0.0, 1.0, exp_cdf).unwrap();
        assert_eq!((lo, hi), (20.0, 80.0));
        assert!(exp_cdf(lo) < 1.0 - 1e-12);
        assert!(exp_cdf(hi) >= 1.0 - 1e-12);
    }

    #[test]
    fn expansion_is_logarithmic() {
        let calls = Cell::new(0usize);
        let cdf = |x: Real| {
            calls.set(calls.get() + 1);
            exp_cdf(x / 1e6)
        };
        let (lo, hi) = expand_upper(0.999_999, 0.0, 1.0, cdf).unwrap();
        assert!(lo < hi);
        assert!(calls.get() < 20, "{} evaluations", calls.get());
    }

    #[test]
    fn rejects_probability_outside_unit_interval() {
        assert!(expand_upper(1.5, 0.0, 1.0, exp_cdf).is_err());
        assert!(find_interval(-0.1, 0.0, 1.0, exp_cdf).is_err());
    }

    #[test]
    fn find_interval_far_right() {
        let (a, b) = find_interval(1.0 - 1e-15, 0.0, f64::INFINITY, exp_cdf).unwrap();
        assert!(exp_cdf(a) <= 1.0 - 1e-15);
        assert!(exp_cdf(b) >= 1.0 - 1e-15);
    }

    #[test]
    fn find_interval_clips_to_support() {
        let uniform = |x: Real| x.clamp(0.0, 1.0);
        let (a, b) = find_interval(0.4, 0.0, 1.0, uniform).unwrap();
        assert_eq!((a, b), (0.0, 1.0));
    }

    #[test]
    fn find_interval_far_left() {
        let logistic = |x: Real| 1.0 / (1.0 + (-x).exp());
        let (a, b) = find_interval(1e-10, f64::NEG_INFINITY, f64::INFINITY, logistic).unwrap();
        assert!(logistic(a) <= 1e-10 && logistic(b) >= 1e-10);
    }
}
