//! Chi-square distribution with n degrees of freedom.
//!
//! The exact variant evaluates cdf and survival function as the regularized
//! incomplete gamma functions `P(n/2, x/2)` and `Q(n/2, x/2)` and inverts
//! by bracket search plus Brent, polished to a relative tolerance for small
//! quantiles. The quick variant only replaces the quantile:
//!
//! | condition            | formula                                   |
//! |----------------------|-------------------------------------------|
//! | n = 1                | `2·erf⁻¹(u)²`                              |
//! | n = 2                | `−2 ln(max(1 − u, 1e-16))`                 |
//! | 0.02 < u < 0.98      | Cornish–Fisher expansion                  |
//! | n ≥ 10               | Goldstein polynomial                      |
//! | otherwise            | exact inverse                             |
//!
//! The approximations are good to a few units of 1e-5 relative for n ≥ 10
//! and degrade to about 1e-3 for n = 3 near the edges of the central range.

use super::{inversion, Branch, ContinuousDistribution, Variant};
use crate::special::{erf_inv, gamma_p, gamma_q, ln_gamma, normal_inverse};
use pd_core::{ensure_param, errors::Result, Real, Size};
use std::f64::consts::LN_2;

/// Beyond `XBIG · n` the cdf is taken to be exactly 1.
const XBIG: Real = 100.0;

/// Tolerance of the exact quantile search: absolute above 1, relative below.
pub const INVERSE_TOLERANCE: Real = 1.0e-12;

const SQP5: Real = 0.707_106_781_186_547_524_40;
const DWARF: Real = 0.1e-15;
const ULOW: Real = 0.02;
const GOLDSTEIN_MIN_DF: Size = 10;

/// Chi-square distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiSquare {
    n: Size,
    variant: Variant,
}

impl ChiSquare {
    /// Exact chi-square distribution with `n` degrees of freedom.
    ///
    /// # Errors
    /// `InvalidParameter` if `n == 0`.
    pub fn new(n: Size) -> Result<Self> {
        Self::with_variant(n, Variant::Exact)
    }

    /// Chi-square distribution with the fast quantile.
    pub fn quick(n: Size) -> Result<Self> {
        Self::with_variant(n, Variant::Quick)
    }

    /// Chi-square distribution evaluated with `variant`.
    pub fn with_variant(n: Size, variant: Variant) -> Result<Self> {
        ensure_param!(n >= 1, "chi-square: degrees of freedom must be positive, got {n}");
        Ok(Self { n, variant })
    }

    /// Degrees of freedom.
    pub fn n(&self) -> Size {
        self.n
    }

    /// The evaluation variant.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Change the degrees of freedom.
    pub fn set_n(&mut self, n: Size) -> Result<()> {
        *self = Self::with_variant(n, self.variant)?;
        Ok(())
    }

    /// Branch taken by `cdf(x)`.
    pub fn cdf_branch(&self, x: Real) -> Branch {
        if x <= 0.0 || x >= XBIG * self.n as Real {
            return Branch::ClosedForm;
        }
        match self.variant {
            Variant::Exact => Branch::Series,
            Variant::Quick => Branch::Delegate,
        }
    }

    /// Branch taken by `inverse_f(u)`.
    pub fn inverse_branch(&self, u: Real) -> Branch {
        if u <= 0.0 || u >= 1.0 {
            return Branch::ClosedForm;
        }
        match self.variant {
            Variant::Exact => Branch::Series,
            Variant::Quick => quick_inverse_branch(self.n, u),
        }
    }

    fn exact_inverse(&self, u: Real) -> Result<Real> {
        inversion::invert_with_bracket(
            u,
            0.0,
            f64::INFINITY,
            self.n as Real,
            |x| self.cdf(x),
            INVERSE_TOLERANCE,
        )
    }

    fn half_n(&self) -> Real {
        self.n as Real / 2.0
    }
}

fn quick_inverse_branch(n: Size, u: Real) -> Branch {
    if n <= 2 {
        Branch::ClosedForm
    } else if (u > ULOW && u < 1.0 - ULOW) || n >= GOLDSTEIN_MIN_DF {
        Branch::Asymptotic
    } else {
        Branch::Delegate
    }
}

/// Cornish–Fisher expansion of the quantile in powers of `1/√n`.
fn cornish_fisher(n: Size, u: Real) -> Real {
    let z = normal_inverse(u);
    let sqdf = (n as Real).sqrt();
    let v = z * z;
    let mut ch = -(((3753.0 * v + 4353.0) * v - 289517.0) * v - 289717.0) * z * SQP5 / 9185400.0;
    ch = ch / sqdf + (((12.0 * v - 243.0) * v - 923.0) * v + 1472.0) / 25515.0;
    ch = ch / sqdf + ((9.0 * v + 256.0) * v - 433.0) * z * SQP5 / 4860.0;
    ch = ch / sqdf - ((6.0 * v + 14.0) * v - 32.0) / 405.0;
    ch = ch / sqdf + (v - 7.0) * z * SQP5 / 9.0;
    ch = ch / sqdf + 2.0 * (v - 1.0) / 3.0;
    ch = ch / sqdf + z / SQP5;
    n as Real * (ch / sqdf + 1.0)
}

/// Goldstein (1973) polynomial approximation.
fn goldstein(n: Size, u: Real) -> Real {
    let z = normal_inverse(u);
    let v = z * z;
    let n = n as Real;
    let mut temp = 1.0 / 3.0 + (-v + 3.0) / (162.0 * n)
        - (3.0 * v * v + 40.0 * v + 45.0) / (5832.0 * n * n)
        + (301.0 * v * v * v - 1519.0 * v * v - 32769.0 * v - 79349.0) / (7873200.0 * n * n * n);
    temp *= z * (2.0 / n).sqrt();
    let ch = 1.0 - 2.0 / (9.0 * n)
        + (4.0 * v * v + 16.0 * v - 28.0) / (1215.0 * n * n)
        + (8.0 * v * v * v + 720.0 * v * v + 3216.0 * v + 2904.0) / (229635.0 * n * n * n)
        + temp;
    n * ch * ch * ch
}

impl ContinuousDistribution for ChiSquare {
    fn density(&self, x: Real) -> Real {
        if x <= 0.0 {
            return 0.0;
        }
        let h = self.half_n();
        ((h - 1.0) * x.ln() - x / 2.0 - h * LN_2 - ln_gamma(h)).exp()
    }

    fn cdf(&self, x: Real) -> Real {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= XBIG * self.n as Real {
            return 1.0;
        }
        gamma_p(self.half_n(), x / 2.0)
    }

    fn bar_f(&self, x: Real) -> Real {
        if x <= 0.0 {
            return 1.0;
        }
        gamma_q(self.half_n(), x / 2.0)
    }

    fn inverse_f(&self, u: Real) -> Result<Real> {
        inversion::check_probability(u)?;
        if let Some(x) = inversion::boundary(u, 0.0, f64::INFINITY) {
            return Ok(x);
        }
        if self.variant == Variant::Exact {
            return self.exact_inverse(u);
        }
        match self.n {
            1 => {
                let z = erf_inv(u);
                Ok(2.0 * z * z)
            }
            2 => Ok(-2.0 * (-u).ln_1p().max(DWARF.ln())),
            n if u > ULOW && u < 1.0 - ULOW => Ok(cornish_fisher(n, u)),
            n if n >= GOLDSTEIN_MIN_DF => Ok(goldstein(n, u)),
            _ => self.exact_inverse(u),
        }
    }

    fn x_inf(&self) -> Real {
        0.0
    }

    fn mean(&self) -> Result<Real> {
        Ok(self.n as Real)
    }

    fn variance(&self) -> Result<Real> {
        Ok(2.0 * self.n as Real)
    }
}

/// Density of the chi-square law with `n` degrees of freedom.
pub fn density(n: Size, x: Real) -> Result<Real> {
    Ok(ChiSquare::new(n)?.density(x))
}

/// Distribution function.
pub fn cdf(n: Size, x: Real) -> Result<Real> {
    Ok(ChiSquare::new(n)?.cdf(x))
}

/// Survival function.
pub fn bar_f(n: Size, x: Real) -> Result<Real> {
    Ok(ChiSquare::new(n)?.bar_f(x))
}

/// Quantile, evaluated with `variant`.
pub fn inverse_f(n: Size, variant: Variant, u: Real) -> Result<Real> {
    ChiSquare::with_variant(n, variant)?.inverse_f(u)
}
