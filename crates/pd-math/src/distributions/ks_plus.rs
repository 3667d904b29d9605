//! One-sided Kolmogorov–Smirnov statistic `D⁺ₙ`.
//!
//! The cdf switches between three formulas:
//!
//! | condition         | formula                                        |
//! |-------------------|------------------------------------------------|
//! | n·x ≤ 6.5         | alternating exact series, terms in log space   |
//! | n ≤ 4000          | non-alternating exact series                   |
//! | otherwise         | asymptotic expansion in `n·x²`                 |
//!
//! The survival function has its own dispatch. For the upper tail it uses
//! Smirnov's formula, summed outward from the neighbourhood of the largest
//! term so the relative stopping rule sees the dominant terms first.
//!
//! The cut-offs live in [`KsPlusRegimes`]; its default holds the values in
//! the table and is what [`KolmogorovSmirnovPlus::new`] uses.

use super::{inversion, richardson_difference, Branch, ContinuousDistribution};
use crate::special::ln_factorial;
use pd_core::{ensure_param, errors::Result, Real, Size};

/// Frontier of the alternating series in `n·x`.
pub const NX_ALTERNATING: Real = 6.5;
/// Largest n for the non-alternating exact cdf series.
pub const N_EXACT: Size = 4000;
/// From this n on the survival function is always asymptotic.
pub const N_ASYMPTOTIC: Size = 200_000;

const UPPER_EPS: Real = 1.0e-12;
const DENSITY_STEP: Real = 0.01;
/// Absolute tolerance of the quantile search on `[0, 1]`.
pub const INVERSE_TOLERANCE: Real = 1.0e-8;

/// Regime boundaries of the `D⁺ₙ` cdf and survival function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsPlusRegimes {
    /// The alternating series is used while `n·x` stays at or below this.
    pub nx_alternating: Real,
    /// Largest n for the non-alternating exact cdf series.
    pub n_exact: Size,
    /// From this n on the survival function is always asymptotic.
    pub n_asymptotic: Size,
}

impl Default for KsPlusRegimes {
    fn default() -> Self {
        Self {
            nx_alternating: NX_ALTERNATING,
            n_exact: N_EXACT,
            n_asymptotic: N_ASYMPTOTIC,
        }
    }
}

/// Kolmogorov–Smirnov⁺ distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KolmogorovSmirnovPlus {
    n: Size,
    regimes: KsPlusRegimes,
}

impl KolmogorovSmirnovPlus {
    /// # Errors
    /// `InvalidParameter` if `n == 0`.
    pub fn new(n: Size) -> Result<Self> {
        Self::with_regimes(n, KsPlusRegimes::default())
    }

    /// Distribution with custom regime boundaries.
    ///
    /// Moving a boundary away from its default trades accuracy for speed
    /// (or the reverse) on the side that gains the wider range.
    ///
    /// # Errors
    /// `InvalidParameter` if `n == 0` or `nx_alternating` is negative or
    /// not finite.
    pub fn with_regimes(n: Size, regimes: KsPlusRegimes) -> Result<Self> {
        ensure_param!(n >= 1, "kolmogorov-smirnov+: n must be positive, got {n}");
        let nx = regimes.nx_alternating;
        ensure_param!(
            nx >= 0.0 && nx.is_finite(),
            "kolmogorov-smirnov+: alternating frontier must be finite and nonnegative, got {nx}"
        );
        Ok(Self { n, regimes })
    }

    /// Sample size.
    pub fn n(&self) -> Size {
        self.n
    }

    /// The regime boundaries in use.
    pub fn regimes(&self) -> KsPlusRegimes {
        self.regimes
    }

    /// Change the sample size; unchanged on error.
    pub fn set_n(&mut self, n: Size) -> Result<()> {
        *self = Self::with_regimes(n, self.regimes)?;
        Ok(())
    }

    /// Branch taken by `cdf(x)`.
    pub fn cdf_branch(&self, x: Real) -> Branch {
        let n = self.n as Real;
        if x <= 0.0 || x >= 1.0 || n * x * x >= 25.0 || self.n == 1 {
            Branch::ClosedForm
        } else if n * x <= self.regimes.nx_alternating || self.n <= self.regimes.n_exact {
            Branch::Series
        } else {
            Branch::Asymptotic
        }
    }

    /// Branch taken by `bar_f(x)`.
    pub fn bar_f_branch(&self, x: Real) -> Branch {
        let n = self.n as Real;
        if x <= 0.0 || x >= 1.0 || n * x * x >= 365.0 || self.n == 1 {
            Branch::ClosedForm
        } else if n * x <= self.regimes.nx_alternating {
            Branch::Delegate
        } else if self.n >= self.regimes.n_asymptotic {
            Branch::Asymptotic
        } else if self.n <= self.regimes.n_exact || n * x * x > 1.0 {
            Branch::Series
        } else {
            Branch::Asymptotic
        }
    }
}

fn alternating_cdf(n: Size, x: Real) -> Real {
    let nr = n as Real;
    let jmax = (nr * x) as Size;
    let mut log_com = nr.ln();
    let mut sum = 0.0;
    let mut sign = -1.0;
    for j in 1..=jmax {
        let jr = j as Real;
        let nj = nr - jr;
        let q = jr / nr - x;
        // q vanishes when n·x is an integer
        if -q > f64::MIN_POSITIVE {
            let term = log_com + jr * (-q).ln() + (nj - 1.0) * (-q).ln_1p();
            sum += sign * term.exp();
        }
        sign = -sign;
        log_com += (nj / (jr + 1.0)).ln();
    }
    sum += ((nr - 1.0) * x.ln_1p()).exp();
    sum * x
}

/// Largest `j` with `x + j/n < 1`.
fn upper_jmax(n: Size, x: Real) -> Size {
    let nr = n as Real;
    let mut jmax = (nr * (1.0 - x)) as Size;
    if 1.0 - x - jmax as Real / nr <= 0.0 {
        jmax = jmax.saturating_sub(1);
    }
    jmax
}

fn non_alternating_cdf(n: Size, x: Real) -> Real {
    let nr = n as Real;
    let mut log_com = nr.ln();
    let mut sum = 0.0;
    for j in 1..=upper_jmax(n, x) {
        let jr = j as Real;
        let nj = nr - jr;
        let q = jr / nr + x;
        let term = log_com + (jr - 1.0) * q.ln() + nj * (-q).ln_1p();
        sum += term.exp();
        log_com += (nj / (jr + 1.0)).ln();
    }
    sum *= x;
    if x < 1.0 {
        sum += (nr * (-x).ln_1p()).exp();
    }
    1.0 - sum
}

fn asymptotic_cdf(n: Size, x: Real) -> Real {
    let nr = n as Real;
    let t = 2.0 / 3.0;
    let q = x * x * nr;
    1.0 - (-2.0 * q).exp()
        * (1.0 - t * x * (1.0 - x * (1.0 - t * q) - t / nr * (0.2 - 19.0 / 15.0 * q + t * q * q)))
}

fn asymptotic_bar_f(n: Size, x: Real) -> Real {
    let nr = n as Real;
    let t = 6.0 * nr * x + 1.0;
    let z = t * t / (18.0 * nr);
    let v = 1.0 - (2.0 * z * z - 4.0 * z - 1.0) / (18.0 * nr);
    if v <= 0.0 {
        return 0.0;
    }
    (v * (-z).exp()).min(1.0)
}

/// Smirnov's upper-tail sum.
fn upper_bar_f(n: Size, x: Real) -> Real {
    let nr = n as Real;
    let jmax = upper_jmax(n, x);
    let jdiv = if n > 3000 { 2 } else { 3 };
    let term_at = |j: Size, log_com: Real| {
        let jr = j as Real;
        let q = jr / nr + x;
        (log_com + (jr - 1.0) * q.ln() + (nr - jr) * (-q).ln_1p()).exp()
    };

    let start = jmax / jdiv + 1;
    let log_start = ln_factorial(n) - ln_factorial(start) - ln_factorial(n - start);
    let mut sum = 0.0;

    let mut log_com = log_start;
    let mut j = start;
    while j <= jmax {
        let t = term_at(j, log_com);
        sum += t;
        log_com += ((n - j) as Real / (j + 1) as Real).ln();
        if t <= sum * UPPER_EPS {
            break;
        }
        j += 1;
    }

    let mut j = jmax / jdiv;
    let mut log_com = log_start + ((j + 1) as Real / (n - j) as Real).ln();
    while j > 0 {
        let t = term_at(j, log_com);
        sum += t;
        log_com += (j as Real / (n - j + 1) as Real).ln();
        if t <= sum * UPPER_EPS {
            break;
        }
        j -= 1;
    }

    sum * x + (nr * (-x).ln_1p()).exp()
}

impl ContinuousDistribution for KolmogorovSmirnovPlus {
    fn density(&self, x: Real) -> Real {
        if x <= 0.0 || x >= 1.0 {
            return 0.0;
        }
        if self.n == 1 {
            return 1.0;
        }
        richardson_difference(|t| self.cdf(t), x, DENSITY_STEP).max(0.0)
    }

    fn cdf(&self, x: Real) -> Real {
        let n = self.n as Real;
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 || n * x * x >= 25.0 {
            return 1.0;
        }
        if self.n == 1 {
            return x;
        }
        if n * x <= self.regimes.nx_alternating {
            alternating_cdf(self.n, x)
        } else if self.n <= self.regimes.n_exact {
            non_alternating_cdf(self.n, x)
        } else {
            asymptotic_cdf(self.n, x)
        }
    }

    fn bar_f(&self, x: Real) -> Real {
        let n = self.n as Real;
        if x <= 0.0 {
            return 1.0;
        }
        if x >= 1.0 || n * x * x >= 365.0 {
            return 0.0;
        }
        if self.n == 1 {
            return 1.0 - x;
        }
        match self.bar_f_branch(x) {
            Branch::Delegate => 1.0 - self.cdf(x),
            Branch::Series => upper_bar_f(self.n, x),
            _ => asymptotic_bar_f(self.n, x),
        }
    }

    fn inverse_f(&self, u: Real) -> Result<Real> {
        inversion::invert_on(u, (0.0, 1.0), (0.0, 1.0), |x| self.cdf(x), INVERSE_TOLERANCE)
    }

    fn x_inf(&self) -> Real {
        0.0
    }

    fn x_sup(&self) -> Real {
        1.0
    }
}

/// Density of `D⁺ₙ`.
pub fn density(n: Size, x: Real) -> Result<Real> {
    Ok(KolmogorovSmirnovPlus::new(n)?.density(x))
}

/// Distribution function.
pub fn cdf(n: Size, x: Real) -> Result<Real> {
    Ok(KolmogorovSmirnovPlus::new(n)?.cdf(x))
}

/// Survival function.
pub fn bar_f(n: Size, x: Real) -> Result<Real> {
    Ok(KolmogorovSmirnovPlus::new(n)?.bar_f(x))
}

/// Quantile.
pub fn inverse_f(n: Size, u: Real) -> Result<Real> {
    KolmogorovSmirnovPlus::new(n)?.inverse_f(u)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use pd_core::Error;

    #[test]
    fn exact_small_samples() {
        let d = KolmogorovSmirnovPlus::new(10).unwrap();
        assert_eq!(d.cdf_branch(0.1), Branch::Series);
        assert_relative_eq!(d.bar_f(0.1), 0.7642052309, max_relative = 1e-12);
        assert_relative_eq!(d.bar_f(0.3), 0.1354635556, max_relative = 1e-11);
        assert_eq!(d.bar_f_branch(0.3), Branch::Delegate);
    }

    #[test]
    fn smirnov_upper_tail() {
        let cases = [
            (100, 0.1, 0.1265906584562817),
            (1000, 0.03, 0.16203171395455085),
            (5000, 0.02, 0.018069812937222665),
            (5000, 0.03, 0.00012079617211333408),
        ];
        for (n, x, expected) in cases {
            let d = KolmogorovSmirnovPlus::new(n).unwrap();
            assert_eq!(d.bar_f_branch(x), Branch::Series);
            assert_relative_eq!(d.bar_f(x), expected, max_relative = 1e-10);
        }
        let d = KolmogorovSmirnovPlus::new(100).unwrap();
        assert_abs_diff_eq!(d.cdf(0.1), 1.0 - 0.1265906584562817, epsilon = 1e-12);
    }

    #[test]
    fn asymptotic_regimes() {
        let d = KolmogorovSmirnovPlus::new(300_000).unwrap();
        assert_eq!(d.bar_f_branch(0.002), Branch::Asymptotic);
        assert_eq!(d.cdf_branch(0.002), Branch::Asymptotic);
        assert_relative_eq!(d.bar_f(0.002), 0.09059704428307683, max_relative = 1e-12);
        assert_abs_diff_eq!(d.cdf(0.002) + d.bar_f(0.002), 1.0, epsilon = 1e-9);

        let d = KolmogorovSmirnovPlus::new(5000).unwrap();
        assert_eq!(d.bar_f_branch(0.01), Branch::Asymptotic);
        assert_abs_diff_eq!(d.cdf(0.01) + d.bar_f(0.01), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn degenerate_and_extreme() {
        let d = KolmogorovSmirnovPlus::new(1).unwrap();
        assert_eq!(d.cdf(0.3), 0.3);
        assert_eq!(d.bar_f(0.3), 0.7);
        assert_eq!(d.density(0.3), 1.0);
        let d = KolmogorovSmirnovPlus::new(50).unwrap();
        assert_eq!(d.cdf(0.8), 1.0);
        assert_eq!(d.cdf(-0.1), 0.0);
        assert_eq!(d.bar_f(1.0), 0.0);
        assert_eq!(d.density(1.2), 0.0);
        assert!(matches!(d.mean(), Err(Error::UnsupportedOperation(_))));
    }

    #[test]
    fn quantiles_and_density() {
        for n in [3, 40, 800] {
            let d = KolmogorovSmirnovPlus::new(n).unwrap();
            for u in [0.001, 0.25, 0.5, 0.75, 0.999] {
                let x = d.inverse_f(u).unwrap();
                assert_abs_diff_eq!(d.cdf(x), u, epsilon = 1e-6);
            }
            assert_eq!(d.inverse_f(1.0), Ok(1.0));
        }
        let d = KolmogorovSmirnovPlus::new(20).unwrap();
        assert_relative_eq!(d.density(0.15), 4.673056066439862, max_relative = 1e-3);
        let d = KolmogorovSmirnovPlus::new(50).unwrap();
        assert_relative_eq!(d.density(0.2), 0.6482541783925377, max_relative = 1e-5);
    }

    #[test]
    fn monotone_across_regimes() {
        let d = KolmogorovSmirnovPlus::new(200).unwrap();
        let mut prev = 0.0;
        for i in 1..200 {
            let x = i as Real / 400.0;
            let p = d.cdf(x);
            assert!(p >= prev - 1e-14, "cdf decreased at {x}");
            prev = p;
        }
    }

    #[test]
    fn custom_regime_boundaries() {
        let d = KolmogorovSmirnovPlus::new(5000).unwrap();
        assert_eq!(d.regimes(), KsPlusRegimes::default());
        assert_eq!(d.cdf_branch(0.01), Branch::Asymptotic);

        // widen the exact series to n = 5000
        let regimes = KsPlusRegimes {
            n_exact: 6000,
            ..KsPlusRegimes::default()
        };
        let e = KolmogorovSmirnovPlus::with_regimes(5000, regimes).unwrap();
        assert_eq!(e.cdf_branch(0.01), Branch::Series);
        assert_abs_diff_eq!(e.cdf(0.01), d.cdf(0.01), epsilon = 1e-4);
        assert_abs_diff_eq!(e.cdf(0.01) + e.bar_f(0.01), 1.0, epsilon = 1e-9);

        // alternating series everywhere for a small sample
        let regimes = KsPlusRegimes {
            nx_alternating: 10.0,
            ..KsPlusRegimes::default()
        };
        let a = KolmogorovSmirnovPlus::with_regimes(10, regimes).unwrap();
        let d = KolmogorovSmirnovPlus::new(10).unwrap();
        assert_eq!(a.bar_f_branch(0.8), Branch::Delegate);
        assert_eq!(d.bar_f_branch(0.8), Branch::Series);
        assert_abs_diff_eq!(a.cdf(0.8), d.cdf(0.8), epsilon = 1e-10);

        let mut s = KolmogorovSmirnovPlus::with_regimes(10, regimes).unwrap();
        s.set_n(20).unwrap();
        assert_eq!(s.regimes(), regimes);

        let bad = KsPlusRegimes {
            nx_alternating: f64::NAN,
            ..KsPlusRegimes::default()
        };
        assert!(KolmogorovSmirnovPlus::with_regimes(10, bad).is_err());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(KolmogorovSmirnovPlus::new(0).is_err());
        assert!(matches!(inverse_f(5, -0.5), Err(Error::OutOfDomain(_))));
    }
}
