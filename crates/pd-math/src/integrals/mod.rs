//! Numerical integration.
//!
//! Only what the distribution catalogue needs: composite Simpson on a
//! fixed grid, used for the moments of truncated distributions.

use pd_core::{ensure_param, errors::Result, Real};

/// A numerical integrator.
pub trait Integrator {
    /// Integrate `f` on `[a, b]`.
    fn integrate<F: Fn(Real) -> Real>(&self, f: F, a: Real, b: Real) -> Result<Real>;
}

// ── Simpson ───────────────────────────────────────────────────────────────────

/// Composite Simpson 1/3 rule on a fixed number of intervals.
///
/// Before integrating, the bounds are pulled in over any stretch where `f`
/// is identically zero on the grid, so densities with bounded support lose
/// no nodes to the flat part.
#[derive(Debug, Clone, Copy)]
pub struct SimpsonIntegral {
    intervals: usize,
}

impl SimpsonIntegral {
    /// Intervals used when integrating moments of truncated distributions.
    pub const DEFAULT_INTERVALS: usize = 500;

    /// Create a Simpson integrator on `intervals` subintervals (must be even
    /// and nonzero).
    pub fn new(intervals: usize) -> Result<Self> {
        ensure_param!(
            intervals > 0 && intervals % 2 == 0,
            "Simpson: intervals must be even and positive, got {intervals}"
        );
        Ok(Self { intervals })
    }

    /// Number of subintervals.
    pub fn intervals(&self) -> usize {
        self.intervals
    }

    fn trim_bounds<F: Fn(Real) -> Real>(&self, f: &F, mut a: Real, mut b: Real) -> (Real, Real) {
        let h = (b - a) / self.intervals as Real;
        let mut x = b;
        while f(x) == 0.0 && x > a {
            x -= h;
        }
        if x < b {
            b = x + h;
        }
        x = a;
        while f(x) == 0.0 && x < b {
            x += h;
        }
        if x > a {
            a = x - h;
        }
        (a, b)
    }
}

impl Default for SimpsonIntegral {
    fn default() -> Self {
        Self {
            intervals: Self::DEFAULT_INTERVALS,
        }
    }
}

impl Integrator for SimpsonIntegral {
    fn integrate<F: Fn(Real) -> Real>(&self, f: F, a: Real, b: Real) -> Result<Real> {
        ensure_param!(
            a.is_finite() && b.is_finite(),
            "Simpson: bounds must be finite, got [{a}, {b}]"
        );
        ensure_param!(a <= b, "Simpson: b = {b} < a = {a}");
        if a == b {
            return Ok(0.0);
        }
        let (a, b) = self.trim_bounds(&f, a, b);
        let h = (b - a) / self.intervals as Real;
        let m = self.intervals / 2;
        let mut sum = 0.0;
        for i in 0..m - 1 {
            let x = a + h + 2.0 * h * i as Real;
            sum += 4.0 * f(x) + 2.0 * f(x + h);
        }
        sum += f(a) + f(b) + 4.0 * f(b - h);
        Ok(sum * h / 3.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn simpson_polynomial_is_exact() {
        let s = SimpsonIntegral::new(2).unwrap();
        let v = s.integrate(|x| x * x * x + 1.0, 0.0, 2.0).unwrap();
        assert_abs_diff_eq!(v, 6.0, epsilon = 1e-13);
    }

    #[test]
    fn simpson_sin() {
        let v = SimpsonIntegral::default()
            .integrate(|x: Real| x.sin(), 0.0, std::f64::consts::PI)
            .unwrap();
        assert_abs_diff_eq!(v, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn simpson_zero_tail_is_trimmed() {
        let f = |x: Real| if x <= 1.0 { 1.0 } else { 0.0 };
        let v = SimpsonIntegral::new(100).unwrap().integrate(f, 0.0, 10.0).unwrap();
        assert_abs_diff_eq!(v, 1.0, epsilon = 0.1);
    }

    #[test]
    fn simpson_rejects_bad_input() {
        assert!(SimpsonIntegral::new(3).is_err());
        assert!(SimpsonIntegral::new(0).is_err());
        let s = SimpsonIntegral::default();
        assert!(s.integrate(|x| x, 0.0, f64::INFINITY).is_err());
        assert!(s.integrate(|x| x, 1.0, 0.0).is_err());
        assert_eq!(s.integrate(|x| x, 1.0, 1.0).unwrap(), 0.0);
    }
}
