//! Watson's U² statistic for a sample of size n.
//!
//! Supported on `[1/(12n), n/12]`. Below `x = 0.15` the cdf is the
//! theta-function series in `v = e^{−1/(8x)}`; above it the survival
//! function is the alternating series in `e^{−2π²x}`. Both carry a 1/n
//! correction term. The crossover can be moved through [`WatsonRegimes`];
//! the two series agree to rounding over `[0.08, 0.3]`.

use super::{central_difference, inversion, ContinuousDistribution};
use crate::series::{sum_alternating, sum_series, SeriesConfig};
use pd_core::{ensure_param, errors::Result, Real, Size};
use std::f64::consts::PI;

/// Default boundary between the two series.
pub const XSEPARE: Real = 0.15;
/// Term cap of every series.
const JMAX: usize = 10;
/// Beyond this the cdf is 1.
const CDF_ONE: Real = 3.95;
const XBIG: Real = 100.0;
const DENSITY_STEP: Real = 0.01;
/// Absolute tolerance of the quantile search on `[0, 2]`.
pub const INVERSE_TOLERANCE: Real = 1.0e-7;

fn series_config(max_terms: usize) -> SeriesConfig {
    SeriesConfig {
        epsilon: f64::EPSILON,
        max_terms,
        floor: f64::MIN_POSITIVE,
    }
}

/// Where the Watson U² evaluation switches series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatsonRegimes {
    /// Above this the survival-function series is used.
    pub xsepare: Real,
}

impl Default for WatsonRegimes {
    fn default() -> Self {
        Self { xsepare: XSEPARE }
    }
}

/// Watson U² distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatsonU {
    n: Size,
    regimes: WatsonRegimes,
}

impl WatsonU {
    /// # Errors
    /// `InvalidParameter` if `n < 2`.
    pub fn new(n: Size) -> Result<Self> {
        Self::with_regimes(n, WatsonRegimes::default())
    }

    /// Distribution with a custom series crossover.
    ///
    /// # Errors
    /// `InvalidParameter` if `n < 2` or `xsepare` is not positive and
    /// finite.
    pub fn with_regimes(n: Size, regimes: WatsonRegimes) -> Result<Self> {
        ensure_param!(n >= 2, "watson U: n must be at least 2, got {n}");
        let x = regimes.xsepare;
        ensure_param!(
            x > 0.0 && x.is_finite(),
            "watson U: series crossover must be positive and finite, got {x}"
        );
        Ok(Self { n, regimes })
    }

    /// Sample size.
    pub fn n(&self) -> Size {
        self.n
    }

    /// The series crossover in use.
    pub fn regimes(&self) -> WatsonRegimes {
        self.regimes
    }

    /// Change the sample size.
    pub fn set_n(&mut self, n: Size) -> Result<()> {
        *self = Self::with_regimes(n, self.regimes)?;
        Ok(())
    }

    fn lower(&self) -> Real {
        1.0 / (12.0 * self.n as Real)
    }

    fn upper(&self) -> Real {
        self.n as Real / 12.0
    }

    /// The 1/n correction to the small-x series.
    fn correction(&self, x: Real) -> Real {
        let v = (-0.125 / x).exp();
        let sum = sum_series(
            |j| {
                let a = ((2 * j + 1) * (2 * j + 1)) as Real;
                let t = v.powf(a);
                let first = (5.0 * x - 1.0 / 12.0) * t * (a - 4.0 * x) / (96.0 * x * x);
                let second = t * (a * a - 24.0 * a * x + 48.0 * x * x) / (384.0 * x * x);
                first + second
            },
            &series_config(JMAX + 1),
            "watson_u_correction",
            x,
        )
        .value;
        -2.0 * sum / (self.n as Real * (2.0 * PI * x).sqrt())
    }

    fn small_x_cdf(&self, x: Real) -> Real {
        let v = (-0.125 / x).exp();
        let sum = sum_series(
            |j| {
                let m = (2 * j + 1) as Real;
                v.powf(m * m)
            },
            &series_config(JMAX),
            "watson_u_small",
            x,
        )
        .value;
        let p = 2.0 * sum / (2.0 * PI * x).sqrt() + self.correction(x);
        p.clamp(0.0, 1.0)
    }

    fn large_x_bar_f(&self, x: Real) -> Real {
        let v = (-2.0 * PI * PI * x).exp();
        let n = self.n as Real;
        let sum = sum_alternating(
            |i| {
                let j = (i + 1) as Real;
                let t = v.powf(j * j);
                let h = 2.0 * j * PI * x;
                let ter = (5.0 * x - h * h - 1.0 / 12.0) * j * j;
                t * (2.0 + PI * PI * ter / (3.0 * n))
            },
            &series_config(JMAX),
            "watson_u_large",
            x,
        )
        .value;
        sum.clamp(0.0, 1.0)
    }
}

impl ContinuousDistribution for WatsonU {
    fn density(&self, x: Real) -> Real {
        if x <= self.lower() || x >= self.upper() || x >= XBIG {
            return 0.0;
        }
        central_difference(|t| self.cdf(t), x, DENSITY_STEP)
    }

    fn cdf(&self, x: Real) -> Real {
        if x <= self.lower() {
            return 0.0;
        }
        if x > CDF_ONE || x >= self.upper() {
            return 1.0;
        }
        if self.n == 2 {
            return 2.0 * (2.0 * x - 1.0 / 12.0).sqrt();
        }
        if x > self.regimes.xsepare {
            return 1.0 - self.large_x_bar_f(x);
        }
        self.small_x_cdf(x)
    }

    fn bar_f(&self, x: Real) -> Real {
        if x <= self.lower() {
            return 1.0;
        }
        if x >= XBIG || x >= self.upper() {
            return 0.0;
        }
        if self.n == 2 {
            return 1.0 - 2.0 * (2.0 * x - 1.0 / 12.0).sqrt();
        }
        if x > self.regimes.xsepare {
            return self.large_x_bar_f(x);
        }
        1.0 - self.small_x_cdf(x)
    }

    fn inverse_f(&self, u: Real) -> Result<Real> {
        inversion::check_probability(u)?;
        if let Some(x) = inversion::boundary(u, self.lower(), self.upper()) {
            return Ok(x);
        }
        if self.n == 2 {
            return Ok(1.0 / 24.0 + u * u / 8.0);
        }
        inversion::invert_on(
            u,
            (0.0, 2.0),
            (self.lower(), self.upper()),
            |x| self.cdf(x),
            INVERSE_TOLERANCE,
        )
    }

    fn x_inf(&self) -> Real {
        self.lower()
    }

    fn x_sup(&self) -> Real {
        self.upper()
    }

    fn mean(&self) -> Result<Real> {
        Ok(1.0 / 12.0)
    }

    fn variance(&self) -> Result<Real> {
        let n = self.n as Real;
        Ok((n - 1.0) / (360.0 * n))
    }
}

/// Density of U² for sample size `n`.
pub fn density(n: Size, x: Real) -> Result<Real> {
    Ok(WatsonU::new(n)?.density(x))
}

/// Distribution function.
pub fn cdf(n: Size, x: Real) -> Result<Real> {
    Ok(WatsonU::new(n)?.cdf(x))
}

/// Survival function.
pub fn bar_f(n: Size, x: Real) -> Result<Real> {
    Ok(WatsonU::new(n)?.bar_f(x))
}

/// Quantile.
pub fn inverse_f(n: Size, u: Real) -> Result<Real> {
    WatsonU::new(n)?.inverse_f(u)
}
