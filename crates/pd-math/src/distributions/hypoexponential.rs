//! Hypoexponential distribution: the sum of independent exponentials with
//! distinct rates λ₁, …, λ_k.
//!
//! Two evaluation paths share one parameter set:
//!
//! - [`Variant::Exact`] works through the matrix exponential of the
//!   bidiagonal generator `A = x·(−λ_j on the diagonal, λ_j above it)`:
//!   `F̄(x) = (e^A·1)₀` and the lower tail is `((e^A − I)·1)₀`, computed
//!   without subtraction. Accurate for any spacing of the rates.
//! - [`Variant::Quick`] uses the partial-fraction expansion
//!   `F̄(x) = Σ H_i e^{−λ_i x}` with cached weights
//!   `H_i = Π_{j≠i} λ_j/(λ_j − λ_i)`. Each evaluation is O(k), but the
//!   weights grow quickly as rates get close and the sum then cancels
//!   badly: with 15 rates spaced 0.1 apart, lower-tail probabilities lose
//!   all their digits. Use `Exact` for closely spaced rates.

use super::{inversion, Branch, ContinuousDistribution, Variant};
use crate::matrix_exp::{exp_bidiagonal, expm1_bidiagonal_times};
use nalgebra::{DMatrix, DVector};
use pd_core::{ensure_param, errors::Result, Real};

/// Absolute tolerance of the quantile search.
pub const INVERSE_TOLERANCE: Real = 1.0e-12;

/// Below this lower-tail probability, `Exact` stops using `1 − F̄(x)`.
const COMPLEMENT_LIMIT: Real = 1.0e-3;

// ── Coefficient cache ─────────────────────────────────────────────────────────

/// Quantities derived from the rates. Always rebuilt as a whole.
#[derive(Debug, Clone, PartialEq)]
struct Coefficients {
    weights: Vec<Real>,
    mean: Real,
    variance: Real,
}

impl Coefficients {
    fn build(rates: &[Real]) -> Self {
        let weights = rates
            .iter()
            .enumerate()
            .map(|(i, &li)| {
                rates
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .map(|(_, &lj)| lj / (lj - li))
                    .product()
            })
            .collect();
        Self {
            weights,
            mean: rates.iter().map(|l| 1.0 / l).sum(),
            variance: rates.iter().map(|l| 1.0 / (l * l)).sum(),
        }
    }
}

fn validate(rates: &[Real]) -> Result<()> {
    ensure_param!(!rates.is_empty(), "hypoexponential: at least one rate is required");
    for (i, &l) in rates.iter().enumerate() {
        ensure_param!(
            l > 0.0 && l.is_finite(),
            "hypoexponential: rate {i} must be positive and finite, got {l}"
        );
        ensure_param!(
            !rates[..i].contains(&l),
            "hypoexponential: rates must be pairwise distinct, {l} is repeated"
        );
    }
    Ok(())
}

// ── Distribution ──────────────────────────────────────────────────────────────

/// Hypoexponential distribution with pairwise distinct rates.
#[derive(Debug, Clone, PartialEq)]
pub struct HypoExponential {
    rates: Vec<Real>,
    cache: Coefficients,
    variant: Variant,
}

impl HypoExponential {
    /// Exact-variant distribution with the given rates.
    ///
    /// # Errors
    /// `InvalidParameter` for an empty vector, a nonpositive or non-finite
    /// rate, or a repeated rate.
    pub fn new(rates: &[Real]) -> Result<Self> {
        Self::with_variant(rates, Variant::Exact)
    }

    /// Partial-fraction (quick) variant.
    pub fn quick(rates: &[Real]) -> Result<Self> {
        Self::with_variant(rates, Variant::Quick)
    }

    /// Distribution evaluated with the given variant.
    pub fn with_variant(rates: &[Real], variant: Variant) -> Result<Self> {
        validate(rates)?;
        Ok(Self {
            rates: rates.to_vec(),
            cache: Coefficients::build(rates),
            variant,
        })
    }

    /// Replace the rates. The cache is rebuilt before anything is swapped,
    /// so on error the distribution is left unchanged.
    pub fn set_rates(&mut self, rates: &[Real]) -> Result<()> {
        validate(rates)?;
        let cache = Coefficients::build(rates);
        self.rates = rates.to_vec();
        self.cache = cache;
        Ok(())
    }

    /// The rates λ₁, …, λ_k.
    pub fn rates(&self) -> &[Real] {
        &self.rates
    }

    /// The partial-fraction weights H_i.
    pub fn weights(&self) -> &[Real] {
        &self.cache.weights
    }

    /// The evaluation variant.
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Switch the evaluation variant.
    pub fn set_variant(&mut self, variant: Variant) {
        self.variant = variant;
    }

    /// The branch `cdf(x)` takes.
    pub fn cdf_branch(&self, x: Real) -> Branch {
        if x <= 0.0 || x >= f64::MAX {
            return Branch::ClosedForm;
        }
        match self.variant {
            Variant::Quick => Branch::ClosedForm,
            Variant::Exact => {
                if self.exact_uses_complement(x).is_some() {
                    Branch::ClosedForm
                } else {
                    Branch::Series
                }
            }
        }
    }

    // ── Quick: partial fractions ──────────────────────────────────────────────

    fn quick_density(&self, x: Real) -> Real {
        if x < 0.0 {
            return 0.0;
        }
        self.rates
            .iter()
            .zip(&self.cache.weights)
            .map(|(&l, &h)| {
                let t = (-l * x).exp();
                if t > 0.0 {
                    l * h * t
                } else {
                    0.0
                }
            })
            .sum()
    }

    fn quick_bar_f(&self, x: Real) -> Real {
        if x <= 0.0 {
            return 1.0;
        }
        self.rates
            .iter()
            .zip(&self.cache.weights)
            .map(|(&l, &h)| {
                let t = (-l * x).exp();
                if t > 0.0 {
                    h * t
                } else {
                    0.0
                }
            })
            .sum()
    }

    fn quick_cdf(&self, x: Real) -> Real {
        if x <= 0.0 {
            return 0.0;
        }
        // once the first exponential underflows, expm1 is just −1 and the
        // complement is no worse
        if (-self.rates[0] * x).exp() <= 0.0 {
            return 1.0 - self.quick_bar_f(x);
        }
        -self
            .rates
            .iter()
            .zip(&self.cache.weights)
            .map(|(&l, &h)| h * (-l * x).exp_m1())
            .sum::<Real>()
    }

    // ── Exact: matrix exponential ─────────────────────────────────────────────

    fn generator(&self, x: Real) -> DMatrix<Real> {
        let k = self.rates.len();
        let mut a = DMatrix::zeros(k, k);
        for (j, &l) in self.rates.iter().enumerate() {
            a[(j, j)] = -l * x;
            if j + 1 < k {
                a[(j, j + 1)] = l * x;
            }
        }
        a
    }

    // Matrix-exponential failures can only come from a singular Padé
    // denominator, which the bidiagonal generator never produces; they
    // surface as NaN.

    fn exact_density(&self, x: Real) -> Real {
        if x < 0.0 {
            return 0.0;
        }
        let k = self.rates.len();
        exp_bidiagonal(&self.generator(x)).map_or(f64::NAN, |e| self.rates[k - 1] * e[(0, k - 1)])
    }

    fn exact_bar_f(&self, x: Real) -> Real {
        if x <= 0.0 {
            return 1.0;
        }
        if x >= f64::MAX {
            return 0.0;
        }
        let k = self.rates.len();
        exp_bidiagonal(&self.generator(x))
            .map_or(f64::NAN, |e| (0..k).map(|j| e[(0, j)]).sum())
    }

    /// `Some(1 − F̄(x))` when the complement is accurate enough.
    fn exact_uses_complement(&self, x: Real) -> Option<Real> {
        let low = self.cache.mean - 1.5 * self.cache.variance.sqrt();
        if x > low {
            let p = 1.0 - self.exact_bar_f(x);
            if p > COMPLEMENT_LIMIT {
                return Some(p);
            }
        }
        None
    }

    fn exact_cdf(&self, x: Real) -> Real {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= f64::MAX {
            return 1.0;
        }
        if let Some(p) = self.exact_uses_complement(x) {
            return p;
        }
        let ones = DVector::from_element(self.rates.len(), 1.0);
        expm1_bidiagonal_times(&self.generator(x), &ones).map_or(f64::NAN, |b| b[0].abs())
    }
}

impl ContinuousDistribution for HypoExponential {
    fn density(&self, x: Real) -> Real {
        match self.variant {
            Variant::Exact => self.exact_density(x),
            Variant::Quick => self.quick_density(x),
        }
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
            Variant::Quick => self.quick_bar_f(x),
        }
    }

    fn inverse_f(&self, u: Real) -> Result<Real> {
        inversion::invert_with_bracket(
            u,
            0.0,
            f64::INFINITY,
            self.cache.mean,
            |x| self.cdf(x),
            INVERSE_TOLERANCE,
        )
    }

    fn x_inf(&self) -> Real {
        0.0
    }

    fn mean(&self) -> Result<Real> {
        Ok(self.cache.mean)
    }

    fn variance(&self) -> Result<Real> {
        Ok(self.cache.variance)
    }
}

// ── Parameter-explicit functions ──────────────────────────────────────────────

/// Density of the hypoexponential distribution with `rates` at `x`.
pub fn density(rates: &[Real], variant: Variant, x: Real) -> Result<Real> {
    Ok(HypoExponential::with_variant(rates, variant)?.density(x))
}

/// Distribution function.
pub fn cdf(rates: &[Real], variant: Variant, x: Real) -> Result<Real> {
    Ok(HypoExponential::with_variant(rates, variant)?.cdf(x))
}

/// Survival function.
pub fn bar_f(rates: &[Real], variant: Variant, x: Real) -> Result<Real> {
    Ok(HypoExponential::with_variant(rates, variant)?.bar_f(x))
}

/// Quantile.
pub fn inverse_f(rates: &[Real], variant: Variant, u: Real) -> Result<Real> {
    HypoExponential::with_variant(rates, variant)?.inverse_f(u)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use pd_core::Error;

    fn two_rate_bar_f(x: Real) -> Real {
        // rates [1, 2]: H = [2, −1]
        2.0 * (-x).exp() - (-2.0 * x).exp()
    }

    #[test]
    fn weights_for_two_rates() {
        let d = HypoExponential::quick(&[1.0, 2.0]).unwrap();
        assert_relative_eq!(d.weights()[0], 2.0);
        assert_relative_eq!(d.weights()[1], -1.0);
        assert_relative_eq!(d.mean().unwrap(), 1.5);
        assert_relative_eq!(d.variance().unwrap(), 1.25);
    }

    #[test]
    fn single_rate_is_exponential() {
        for variant in [Variant::Exact, Variant::Quick] {
            let d = HypoExponential::with_variant(&[2.0], variant).unwrap();
            for x in [0.01, 0.5, 3.0] {
                assert_relative_eq!(d.cdf(x), -(-2.0 * x).exp_m1(), max_relative = 1e-12);
                assert_relative_eq!(d.bar_f(x), (-2.0 * x).exp(), max_relative = 1e-12);
                assert_relative_eq!(d.density(x), 2.0 * (-2.0 * x).exp(), max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn two_rates_closed_form() {
        for variant in [Variant::Exact, Variant::Quick] {
            let d = HypoExponential::with_variant(&[1.0, 2.0], variant).unwrap();
            for x in [0.05, 0.7, 2.0, 9.0] {
                assert_relative_eq!(d.bar_f(x), two_rate_bar_f(x), max_relative = 1e-11);
                assert_abs_diff_eq!(d.cdf(x), 1.0 - two_rate_bar_f(x), epsilon = 1e-12);
                let f = 2.0 * ((-x).exp() - (-2.0 * x).exp());
                assert_relative_eq!(d.density(x), f, max_relative = 1e-11);
            }
        }
    }

    #[test]
    fn variants_agree_for_well_separated_rates() {
        let exact = HypoExponential::new(&[1.0, 2.0, 3.0]).unwrap();
        let quick = HypoExponential::quick(&[1.0, 2.0, 3.0]).unwrap();
        for x in [0.1, 1.0, 3.0, 10.0] {
            assert_relative_eq!(exact.cdf(x), quick.cdf(x), max_relative = 1e-10);
            assert_relative_eq!(exact.bar_f(x), quick.bar_f(x), max_relative = 1e-10);
        }
        assert_relative_eq!(exact.cdf(1.0), 0.25258045782764715, max_relative = 1e-12);
        assert_relative_eq!(exact.cdf(0.1), 0.0008617844443489905, max_relative = 1e-10);
    }

    #[test]
    fn outside_support() {
        let d = HypoExponential::new(&[1.0, 3.0]).unwrap();
        assert_eq!(d.cdf(-1.0), 0.0);
        assert_eq!(d.bar_f(0.0), 1.0);
        assert_eq!(d.density(-0.5), 0.0);
        assert_eq!(d.cdf(f64::MAX), 1.0);
        assert_eq!(d.cdf_branch(-1.0), Branch::ClosedForm);
    }

    #[test]
    fn exact_branch_selection() {
        let d = HypoExponential::new(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(d.cdf_branch(0.01), Branch::Series);
        assert_eq!(d.cdf_branch(2.0), Branch::ClosedForm);
        let mut q = d.clone();
        q.set_variant(Variant::Quick);
        assert_eq!(q.cdf_branch(0.01), Branch::ClosedForm);
        assert_eq!(q.variant(), Variant::Quick);
    }

    #[test]
    fn rejects_bad_rates() {
        for rates in [&[][..], &[1.0, -2.0][..], &[1.0, 0.0][..], &[1.0, 2.0, 1.0][..]] {
            assert!(
                matches!(HypoExponential::new(rates), Err(Error::InvalidParameter(_))),
                "{rates:?}"
            );
        }
    }

    #[test]
    fn set_rates_rebuilds_cache() {
        let mut d = HypoExponential::quick(&[1.0, 2.0]).unwrap();
        d.set_rates(&[2.0, 4.0]).unwrap();
        assert_relative_eq!(d.weights()[0], 2.0);
        assert_relative_eq!(d.mean().unwrap(), 0.75);
        assert_eq!(d, HypoExponential::quick(&[2.0, 4.0]).unwrap());

        let before = d.clone();
        assert!(d.set_rates(&[3.0, 3.0]).is_err());
        assert_eq!(d, before);
    }

    #[test]
    fn far_tail_quantile() {
        let d = HypoExponential::new(&[1.0, 2.0, 3.0]).unwrap();
        let x = d.inverse_f(0.999_999).unwrap();
        assert!(x.is_finite() && x > d.mean().unwrap());
        assert_relative_eq!(d.cdf(x), 0.999_999, max_relative = 1e-9);
    }

    #[test]
    fn quantile_round_trip() {
        for variant in [Variant::Exact, Variant::Quick] {
            let d = HypoExponential::with_variant(&[0.5, 1.5, 4.0], variant).unwrap();
            for u in [0.001, 0.25, 0.5, 0.75, 0.999] {
                let x = d.inverse_f(u).unwrap();
                assert_abs_diff_eq!(d.cdf(x), u, epsilon = 1e-10);
            }
            assert_eq!(d.inverse_f(0.0), Ok(0.0));
            assert_eq!(d.inverse_f(1.0), Ok(f64::INFINITY));
            assert!(matches!(d.inverse_f(-0.1), Err(Error::OutOfDomain(_))));
        }
    }

    #[test]
    fn closely_spaced_rates_degrade_quick() {
        // rates 1.0, 1.1, ..., 2.4: partial-fraction weights reach ~4e9
        let rates: Vec<Real> = (10..25).map(|i| i as Real / 10.0).collect();
        let exact = HypoExponential::new(&rates).unwrap();
        let quick = HypoExponential::quick(&rates).unwrap();
        let reference = 2.683995484986338e-10;
        assert_relative_eq!(exact.cdf(1.0), reference, max_relative = 1e-6);
        let err = (quick.cdf(1.0) - reference).abs() / reference;
        assert!(err > 1e-2, "relative error {err}");
    }

    #[test]
    fn widely_spaced_rates_keep_quick_accurate() {
        // rates 3, 6, ..., 45: weights stay below 6435
        let rates: Vec<Real> = (1..=15).map(|i| 3.0 * i as Real).collect();
        let exact = HypoExponential::new(&rates).unwrap();
        let quick = HypoExponential::quick(&rates).unwrap();
        let m = exact.mean().unwrap();
        assert_abs_diff_eq!(quick.cdf(m), exact.cdf(m), epsilon = 1e-9);
        assert_abs_diff_eq!(quick.cdf(m), 0.5750286663555103, epsilon = 1e-9);
    }

    #[test]
    fn free_functions_validate() {
        assert!(cdf(&[1.0, 1.0], Variant::Quick, 1.0).is_err());
        assert_relative_eq!(
            bar_f(&[1.0, 2.0], Variant::Exact, 0.7).unwrap(),
            two_rate_bar_f(0.7),
            max_relative = 1e-11
        );
        assert!(inverse_f(&[1.0], Variant::Exact, 2.0).is_err());
        assert!(density(&[1.0], Variant::Quick, 1.0).unwrap() > 0.0);
    }
}
