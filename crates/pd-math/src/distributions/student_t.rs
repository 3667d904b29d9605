//! Student's t-distribution with n degrees of freedom.
//!
//! Exact evaluation maps `x` to `z = ½(1 + x/√(n + x²))` and takes the
//! symmetric Beta(n/2, n/2) cdf at `z`; n = 1 (Cauchy) and n = 2 have closed
//! forms and n > 100 000 switches to Gaver's normal approximation. The
//! quick overlay evaluates, for n ≥ 3,
//!
//! | condition         | cdf                                        |
//! |-------------------|--------------------------------------------|
//! | n ≤ 20, x ≤ 8.01  | finite trigonometric series                |
//! | x < 8.01          | normal approximation with an `a = n − ½` expansion |
//! | x ≥ 8.01          | tail series in `1/(1 + x²/n)`               |
//!
//! and inverts with Hill's (1970) algorithm. The cut-offs above are the
//! defaults of [`StudentRegimes`].

use super::{inversion, Branch, ContinuousDistribution, Variant, DEFAULT_DIGITS};
use crate::comparison::eps_for_digits;
use crate::series::{sum_series, SeriesConfig};
use crate::special::{beta_reg, gamma_ratio_half, normal_cdf, normal_inverse};
use pd_core::{ensure_param, errors::Result, Error, Real, Size};
use std::f64::consts::PI;

/// Above this many degrees of freedom the exact variant uses Gaver's
/// approximation.
pub const GAVER_THRESHOLD: Size = 100_000;

/// Largest n handled by the quick trigonometric series.
const N1: Size = 20;
/// Where the quick tail series takes over.
const X1: Real = 8.01;
/// Term cap of the tail series (k runs over even numbers below 200).
const TAIL_TERMS: usize = 100;
const TAIL_EPS: Real = 0.5e-16;

/// Regime boundaries of the Student evaluation paths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudentRegimes {
    /// Above this n the exact variant uses Gaver's approximation.
    pub gaver_threshold: Size,
    /// Largest n handled by the quick trigonometric series.
    pub trig_max_n: Size,
    /// Where the quick tail series takes over.
    pub tail_x: Real,
}

impl Default for StudentRegimes {
    fn default() -> Self {
        Self {
            gaver_threshold: GAVER_THRESHOLD,
            trig_max_n: N1,
            tail_x: X1,
        }
    }
}

/// Student's t-distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudentT {
    n: Size,
    factor: Real,
    variant: Variant,
    regimes: StudentRegimes,
}

impl StudentT {
    /// Exact Student distribution with `n` degrees of freedom.
    ///
    /// # Errors
    /// `InvalidParameter` if `n == 0`.
    pub fn new(n: Size) -> Result<Self> {
        Self::with_variant(n, Variant::Exact)
    }

    /// Student distribution with the fast cdf and quantile.
    pub fn quick(n: Size) -> Result<Self> {
        Self::with_variant(n, Variant::Quick)
    }

    /// Student distribution evaluated with `variant`.
    pub fn with_variant(n: Size, variant: Variant) -> Result<Self> {
        Self::with_regimes(n, variant, StudentRegimes::default())
    }

    /// Student distribution with custom regime boundaries.
    ///
    /// # Errors
    /// `InvalidParameter` if `n == 0` or `tail_x` is not positive and
    /// finite.
    pub fn with_regimes(n: Size, variant: Variant, regimes: StudentRegimes) -> Result<Self> {
        ensure_param!(n >= 1, "student: degrees of freedom must be positive, got {n}");
        let x1 = regimes.tail_x;
        ensure_param!(
            x1 > 0.0 && x1.is_finite(),
            "student: tail cut-off must be positive and finite, got {x1}"
        );
        let nr = n as Real;
        let factor = gamma_ratio_half(nr / 2.0) / (nr * PI).sqrt();
        Ok(Self {
            n,
            factor,
            variant,
            regimes,
        })
    }

    /// The regime boundaries in use.
    pub fn regimes(&self) -> StudentRegimes {
        self.regimes
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
        *self = Self::with_regimes(n, self.variant, self.regimes)?;
        Ok(())
    }

    /// Branch taken by `cdf(x)`.
    pub fn cdf_branch(&self, x: Real) -> Branch {
        if self.n <= 2 || x.is_infinite() {
            return match (self.variant, x.is_infinite()) {
                (Variant::Quick, false) => Branch::Delegate,
                _ => Branch::ClosedForm,
            };
        }
        let r = &self.regimes;
        match self.variant {
            Variant::Exact if self.n > r.gaver_threshold => Branch::Asymptotic,
            Variant::Exact => Branch::Series,
            Variant::Quick if self.n <= r.trig_max_n && x <= r.tail_x => Branch::Series,
            Variant::Quick if x < r.tail_x => Branch::Asymptotic,
            Variant::Quick => Branch::Series,
        }
    }

    fn exact_cdf(&self, x: Real) -> Real {
        if self.n == 1 {
            return cauchy_cdf(x);
        }
        if x.is_nan() {
            return x;
        }
        if x > 1.0e10 {
            return 1.0;
        }
        if self.n > self.regimes.gaver_threshold {
            return gaver_cdf(self.n, x);
        }
        let n = self.n as Real;
        let r = if x.abs() >= 1.0e20 { x.abs() } else { (n + x * x).sqrt() };
        let z = if x >= 0.0 {
            0.5 * (1.0 + x / r)
        } else {
            0.5 * n / (r * (r - x))
        };
        if self.n == 2 {
            z
        } else {
            beta_reg(n / 2.0, n / 2.0, z)
        }
    }

    fn exact_bar_f(&self, x: Real) -> Real {
        match self.n {
            1 => cauchy_cdf(-x),
            2 => {
                if x < -1.0e10 {
                    return 1.0;
                }
                let z = (2.0 + x * x).sqrt();
                if x <= 0.0 {
                    0.5 * (1.0 - x / z)
                } else {
                    1.0 / (z * (z + x))
                }
            }
            _ => self.exact_cdf(-x),
        }
    }

    fn exact_inverse(&self, u: Real) -> Result<Real> {
        match self.n {
            // −cot(πu) instead of tan(π(u − ½)), which loses u below 1e-8
            1 if u < 0.5 => Ok(-1.0 / (PI * u).tan()),
            1 => Ok(1.0 / (PI * (1.0 - u)).tan()),
            2 => Ok((2.0 * u - 1.0) / (2.0 * u * (1.0 - u)).sqrt()),
            n if n > self.regimes.gaver_threshold => Ok(gaver_inverse(n, u)),
            n => {
                let h = n as Real / 2.0;
                let z = inversion::invert_on(
                    u,
                    (0.0, 1.0),
                    (0.0, 1.0),
                    |t| beta_reg(h, h, t),
                    eps_for_digits(DEFAULT_DIGITS),
                )?;
                Ok((z - 0.5) * (n as Real / (z * (1.0 - z))).sqrt())
            }
        }
    }

    fn quick_cdf(&self, x: Real) -> Real {
        if self.n <= 2 {
            return self.exact_cdf(x);
        }
        if x == f64::INFINITY {
            return 1.0;
        }
        if x == f64::NEG_INFINITY {
            return 0.0;
        }
        let r = &self.regimes;
        if self.n <= r.trig_max_n && x <= r.tail_x {
            trigonometric_cdf(self.n, x)
        } else if x < r.tail_x {
            asymptotic_cdf(self.n, x)
        } else {
            self.tail_cdf(x)
        }
    }

    /// `1 − ½·P[|T| > x]` with the two-sided tail summed as a series in
    /// `1/b`, `b = 1 + x²/n`.
    fn tail_cdf(&self, x: Real) -> Real {
        let n = self.n as Real;
        let b = 1.0 + x * x / n;
        let mut y = self.factor * b.powf(-(n + 1.0) / 2.0) * 2.0 * (n * b).sqrt();
        let config = SeriesConfig {
            epsilon: TAIL_EPS,
            max_terms: TAIL_TERMS,
            // absolute stopping rule
            floor: 1.0,
        };
        let two_tail = sum_series(
            |j| {
                if j > 0 {
                    let k = (2 * j) as Real;
                    y *= (k - 1.0) / (k * b);
                }
                y / (n + (2 * j) as Real)
            },
            &config,
            "student_tail",
            x,
        )
        .value;
        if x >= 0.0 {
            1.0 - two_tail / 2.0
        } else {
            two_tail / 2.0
        }
    }

    fn quick_inverse(&self, u: Real) -> Real {
        let e = self.n as Real;
        let p = if u > 0.5 { 2.0 * (1.0 - u) } else { 2.0 * u };
        let a = 1.0 / (e - 0.5);
        let b = 48.0 / (a * a);
        let mut c = ((20700.0 / b * a - 98.0) * a - 16.0) * a + 96.36;
        let d = e * (a * PI / 2.0).sqrt() * ((94.5 / (b + c) - 3.0) / b + 1.0);
        let mut y = (d * p).powf(2.0 / e);
        if y > a + 0.05 {
            let x = if p == 1.0 { 0.0 } else { normal_inverse(p * 0.5) };
            y = x * x;
            if self.n < 5 {
                c += 0.3 * (e - 4.5) * (x + 0.6);
            }
            c = (((0.05 * d * x - 5.0) * x - 7.0) * x - 2.0) * x + b + c;
            y = (((((0.4 * y + 6.3) * y + 36.0) * y + 94.5) / c - y - 3.0) / b + 1.0) * x;
            y = (a * y * y).exp_m1();
        } else {
            y = ((1.0 / (((e + 6.0) / (e * y) - 0.089 * d - 0.822) * (e + 2.0) * 3.0)
                + 0.5 / (e + 4.0))
                * y
                - 1.0)
                * (e + 1.0)
                / (e + 2.0)
                + 1.0 / y;
        }
        let t = (e * y).sqrt();
        if u < 0.5 {
            -t
        } else {
            t
        }
    }
}

fn cauchy_cdf(x: Real) -> Real {
    if x < 0.0 {
        (-1.0 / x).atan() / PI
    } else {
        0.5 + x.atan() / PI
    }
}

fn gaver_cdf(n: Size, x: Real) -> Real {
    let n = n as Real;
    let v = (x * x / n).ln_1p() / (n - 1.5);
    let u = normal_cdf(-(n - 1.0) * v.sqrt());
    if x >= 0.0 {
        1.0 - u
    } else {
        u
    }
}

fn gaver_inverse(n: Size, u: Real) -> Real {
    let n = n as Real;
    let z = normal_inverse(u);
    let q = z / (n - 1.0);
    let v = q * q * (n - 1.5);
    let t = (n * v.exp_m1()).sqrt();
    if u >= 0.5 {
        t
    } else {
        -t
    }
}

/// Finite series in `1/b` for small n: exact up to rounding.
fn trigonometric_cdf(n: Size, x: Real) -> Real {
    let nr = n as Real;
    let b = 1.0 + x * x / nr;
    let y = x / nr.sqrt();
    let mut z = 1.0;
    let mut k = n as i64 - 2;
    while k >= 2 {
        let kr = k as Real;
        z = 1.0 + z * (kr - 1.0) / (kr * b);
        k -= 2;
    }
    let v = if n % 2 == 0 {
        (1.0 + z * y / b.sqrt()) / 2.0
    } else if y > -1.0 {
        0.5 + (y.atan() + z * y / b) / PI
    } else {
        ((-1.0 / y).atan() + z * y / b) / PI
    };
    if v > 1.0e-18 {
        v
    } else {
        0.0
    }
}

/// Normal approximation in `z = √(a·ln(1 + x²/n))`, `a = n − ½`.
fn asymptotic_cdf(n: Size, x: Real) -> Real {
    let a = n as Real - 0.5;
    let b = 48.0 * a * a;
    let z2 = a * (x * x / n as Real).ln_1p();
    let z = z2.sqrt();
    let mut y = (((((64.0 * z2 + 788.0) * z2 + 9801.0) * z2 + 89775.0) * z2 + 543375.0) * z2
        + 1788885.0)
        * z
        / (210.0 * b * b * b);
    y -= (((4.0 * z2 + 33.0) * z2 + 240.0) * z2 + 855.0) * z / (10.0 * b * b);
    y += z + (z2 + 3.0) * z / b;
    if x >= 0.0 {
        normal_cdf(y)
    } else {
        normal_cdf(-y)
    }
}

impl ContinuousDistribution for StudentT {
    fn density(&self, x: Real) -> Real {
        let n = self.n as Real;
        self.factor * (1.0 + x * x / n).powf(-(n + 1.0) / 2.0)
    }

    fn cdf(&self, x: Real) -> Real {
        match self.variant {
            Variant::Exact => self.exact_cdf(x),
            Variant::Quick => self.quick_cdf(x),
        }
    }

    fn bar_f(&self, x: Real) -> Real {
        match self.variant {
            Variant::Exact => self.exact_bar_f(x),
            Variant::Quick if self.n <= 2 => self.exact_bar_f(x),
            Variant::Quick => self.quick_cdf(-x),
        }
    }

    fn inverse_f(&self, u: Real) -> Result<Real> {
        inversion::check_probability(u)?;
        if let Some(x) = inversion::boundary(u, f64::NEG_INFINITY, f64::INFINITY) {
            return Ok(x);
        }
        match self.variant {
            Variant::Quick if self.n > 2 => Ok(self.quick_inverse(u)),
            _ => self.exact_inverse(u),
        }
    }

    fn mean(&self) -> Result<Real> {
        if self.n < 2 {
            return Err(Error::UndefinedMoment(format!(
                "student: mean undefined for n = {}",
                self.n
            )));
        }
        Ok(0.0)
    }

    fn variance(&self) -> Result<Real> {
        if self.n < 3 {
            return Err(Error::UndefinedMoment(format!(
                "student: variance undefined for n = {}",
                self.n
            )));
        }
        let n = self.n as Real;
        Ok(n / (n - 2.0))
    }
}

/// Density of the Student law with `n` degrees of freedom.
pub fn density(n: Size, x: Real) -> Result<Real> {
    Ok(StudentT::new(n)?.density(x))
}

/// Distribution function, evaluated with `variant`.
pub fn cdf(n: Size, variant: Variant, x: Real) -> Result<Real> {
    Ok(StudentT::with_variant(n, variant)?.cdf(x))
}

/// Survival function, evaluated with `variant`.
pub fn bar_f(n: Size, variant: Variant, x: Real) -> Result<Real> {
    Ok(StudentT::with_variant(n, variant)?.bar_f(x))
}

/// Quantile, evaluated with `variant`.
pub fn inverse_f(n: Size, variant: Variant, u: Real) -> Result<Real> {
    StudentT::with_variant(n, variant)?.inverse_f(u)
}
