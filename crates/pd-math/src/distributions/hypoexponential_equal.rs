//! Hypoexponential distribution with rates `(n − i)·h`, `i = 0, …, k − 1`.
//!
//! This is the law of the k-th smallest of n independent exponentials with
//! rate h, so it reduces to a Beta distribution in `r = 1 − e^{−hx}`:
//! `F(x) = I_r(k, n − k + 1)`. No matrix exponential or partial fractions
//! are needed.

use super::{hypoexponential::HypoExponential, inversion, ContinuousDistribution};
use crate::special::{beta_reg, ln_beta};
use pd_core::{ensure_param, errors::Result, Real, Size};

/// Absolute tolerance on the Beta quantile.
const BETA_INVERSE_TOLERANCE: Real = 1.0e-15;

/// Hypoexponential distribution with equally spaced rates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HypoExponentialEqual {
    n: Size,
    k: Size,
    h: Real,
}

impl HypoExponentialEqual {
    /// Distribution with rates `n·h, (n − 1)·h, …, (n − k + 1)·h`.
    ///
    /// # Errors
    /// `InvalidParameter` unless `1 <= k <= n` and `h > 0`.
    pub fn new(n: Size, k: Size, h: Real) -> Result<Self> {
        ensure_param!(k >= 1, "hypoexponential: k must be at least 1, got {k}");
        ensure_param!(k <= n, "hypoexponential: k = {k} exceeds n = {n}");
        ensure_param!(h > 0.0 && h.is_finite(), "hypoexponential: h must be positive, got {h}");
        Ok(Self { n, k, h })
    }

    /// Number of exponentials `n`.
    pub fn n(&self) -> Size {
        self.n
    }

    /// Number of stages `k`.
    pub fn k(&self) -> Size {
        self.k
    }

    /// Rate spacing `h`.
    pub fn h(&self) -> Real {
        self.h
    }

    /// The rates `(n − i)·h`.
    pub fn rates(&self) -> Vec<Real> {
        (0..self.k).map(|i| (self.n - i) as Real * self.h).collect()
    }

    /// The same law as a general [`HypoExponential`].
    pub fn to_hypoexponential(&self) -> Result<HypoExponential> {
        HypoExponential::new(&self.rates())
    }

    fn shape(&self) -> (Real, Real) {
        (self.k as Real, (self.n - self.k + 1) as Real)
    }
}

impl ContinuousDistribution for HypoExponentialEqual {
    fn density(&self, x: Real) -> Real {
        if x < 0.0 {
            return 0.0;
        }
        let (a, b) = self.shape();
        let hx = self.h * x;
        // Beta(a, b) density at r = 1 − e^{−hx}, times dr/dx = h·e^{−hx}
        let r = -(-hx).exp_m1();
        let log_r = if self.k == 1 { 0.0 } else { (a - 1.0) * r.ln() };
        self.h * (log_r - b * hx - ln_beta(a, b)).exp()
    }

    fn cdf(&self, x: Real) -> Real {
        if x <= 0.0 {
            return 0.0;
        }
        let (a, b) = self.shape();
        beta_reg(a, b, -(-self.h * x).exp_m1())
    }

    fn bar_f(&self, x: Real) -> Real {
        if x <= 0.0 {
            return 1.0;
        }
        let (a, b) = self.shape();
        beta_reg(b, a, (-self.h * x).exp())
    }

    fn inverse_f(&self, u: Real) -> Result<Real> {
        inversion::check_probability(u)?;
        if let Some(x) = inversion::boundary(u, 0.0, f64::INFINITY) {
            return Ok(x);
        }
        let (a, b) = self.shape();
        let z = inversion::invert_on(
            u,
            (0.0, 1.0),
            (0.0, 1.0),
            |r| beta_reg(a, b, r),
            BETA_INVERSE_TOLERANCE,
        )?;
        Ok(-(-z).ln_1p() / self.h)
    }

    fn x_inf(&self) -> Real {
        0.0
    }

    fn mean(&self) -> Result<Real> {
        Ok(self.rates().iter().map(|l| 1.0 / l).sum())
    }

    fn variance(&self) -> Result<Real> {
        Ok(self.rates().iter().map(|l| 1.0 / (l * l)).sum())
    }
}

/// Distribution function for parameters `(n, k, h)`.
pub fn cdf(n: Size, k: Size, h: Real, x: Real) -> Result<Real> {
    Ok(HypoExponentialEqual::new(n, k, h)?.cdf(x))
}

/// Survival function.
pub fn bar_f(n: Size, k: Size, h: Real, x: Real) -> Result<Real> {
    Ok(HypoExponentialEqual::new(n, k, h)?.bar_f(x))
}

/// Density.
pub fn density(n: Size, k: Size, h: Real, x: Real) -> Result<Real> {
    Ok(HypoExponentialEqual::new(n, k, h)?.density(x))
}

/// Quantile.
pub fn inverse_f(n: Size, k: Size, h: Real, u: Real) -> Result<Real> {
    HypoExponentialEqual::new(n, k, h)?.inverse_f(u)
}
