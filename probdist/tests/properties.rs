//! Cross-family properties of the distribution contract.

use approx::assert_abs_diff_eq;
use probdist::math::{brent, SolverConfig};
use probdist::{
    diagnostics, AndersonDarling, ChiSquare, ContinuousDistribution, Error, HypoExponential,
    KolmogorovSmirnovPlus, Real, StudentT, Truncated, Variant, WatsonU,
};
use proptest::prelude::*;

const PROBABILITIES: [Real; 5] = [0.001, 0.25, 0.5, 0.75, 0.999];

/// Rounding slack across regime boundaries of the exact paths.
const MONOTONE_SLACK: Real = 1e-9;

fn assert_monotone(
    d: &dyn ContinuousDistribution,
    x1: Real,
    x2: Real,
) -> Result<(), TestCaseError> {
    let (lo, hi) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
    let (f_lo, f_hi) = (d.cdf(lo), d.cdf(hi));
    prop_assert!(
        f_lo <= f_hi + MONOTONE_SLACK,
        "{d:?}: cdf({lo}) = {f_lo} > cdf({hi}) = {f_hi}"
    );
    prop_assert!((0.0..=1.0).contains(&f_lo) && (0.0..=1.0).contains(&f_hi));
    Ok(())
}

fn assert_complementary(d: &dyn ContinuousDistribution, x: Real) -> Result<(), TestCaseError> {
    let sum = d.cdf(x) + d.bar_f(x);
    prop_assert!((sum - 1.0).abs() <= 1e-9, "{d:?}: cdf + bar_f = {sum} at {x}");
    Ok(())
}

fn assert_round_trip(d: &dyn ContinuousDistribution, tolerance: Real) -> Result<(), TestCaseError> {
    for u in PROBABILITIES {
        let x = d.inverse_f(u).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let back = d.cdf(x);
        prop_assert!((back - u).abs() <= tolerance, "{d:?}: cdf(inverse_f({u})) = {back}");
    }
    Ok(())
}

/// `cdf(inverse_f(u))` against `u` in relative terms, for `u = 10^-e`.
fn assert_lower_tail_round_trip(
    d: &dyn ContinuousDistribution,
    e: Real,
) -> Result<(), TestCaseError> {
    let u = 10f64.powf(-e);
    let x = d.inverse_f(u).map_err(|err| TestCaseError::fail(err.to_string()))?;
    let back = d.cdf(x);
    prop_assert!(
        (back - u).abs() <= 1e-8 * u,
        "{d:?}: cdf(inverse_f({u})) = {back}"
    );
    Ok(())
}

/// Rates with pairwise gaps of at least 0.5.
fn separated_rates() -> impl Strategy<Value = Vec<Real>> {
    (0.1..5.0f64, prop::collection::vec(0.5..3.0f64, 0..5)).prop_map(|(first, gaps)| {
        let mut rates = vec![first];
        for g in gaps {
            let next = rates[rates.len() - 1] + g;
            rates.push(next);
        }
        rates
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn chi_square(n in 1usize..200, x1 in 0.0..400.0f64, x2 in 0.0..400.0f64) {
        let d = ChiSquare::new(n).unwrap();
        assert_monotone(&d, x1, x2)?;
        assert_complementary(&d, x1)?;
        assert_round_trip(&d, 1e-9)?;
    }

    #[test]
    fn student_t(n in 1usize..60, x1 in -50.0..50.0f64, x2 in -50.0..50.0f64) {
        let d = StudentT::new(n).unwrap();
        assert_monotone(&d, x1, x2)?;
        assert_complementary(&d, x1)?;
        assert_round_trip(&d, 1e-9)?;
    }

    #[test]
    fn hypoexponential(rates in separated_rates(), x1 in 0.0..20.0f64, x2 in 0.0..20.0f64) {
        let d = HypoExponential::new(&rates).unwrap();
        assert_monotone(&d, x1, x2)?;
        assert_complementary(&d, x1)?;
        assert_round_trip(&d, 1e-9)?;
    }

    // for n = 3 the series tops out near 0.996 before the support ends
    #[test]
    fn watson_u(n in 4usize..200, x1 in 0.0..1.0f64, x2 in 0.0..1.0f64) {
        let d = WatsonU::new(n).unwrap();
        assert_monotone(&d, x1, x2)?;
        assert_complementary(&d, x1)?;
        assert_round_trip(&d, 1e-5)?;
    }

    #[test]
    fn ks_plus(n in 1usize..300, x1 in 0.0..1.0f64, x2 in 0.0..1.0f64) {
        let d = KolmogorovSmirnovPlus::new(n).unwrap();
        assert_monotone(&d, x1, x2)?;
        assert_complementary(&d, x1)?;
        assert_round_trip(&d, 1e-6)?;
    }

    #[test]
    fn anderson_darling(n in 1usize..50, x1 in 0.01..8.0f64, x2 in 0.01..8.0f64) {
        let d = AndersonDarling::new(n).unwrap();
        assert_monotone(&d, x1, x2)?;
        assert_complementary(&d, x1)?;
        assert_round_trip(&d, 1e-6)?;
    }

    // the Grace–Wood upper tail takes over at x = 5 with a small jump, so
    // monotonicity is only checked on either side of it
    #[test]
    fn quick_anderson_darling(n in 2usize..50, x1 in 0.01..5.0f64, x2 in 0.01..5.0f64) {
        let d = AndersonDarling::quick(n).unwrap();
        assert_monotone(&d, x1, x2)?;
        assert_monotone(&d, 5.0 + x1, 5.0 + x2)?;
        assert_complementary(&d, x1)?;
    }

    #[test]
    fn deep_lower_tail(
        n in 1usize..40,
        rates in separated_rates(),
        e in 3.0..10.0f64,
    ) {
        assert_lower_tail_round_trip(&ChiSquare::new(n).unwrap(), e)?;
        assert_lower_tail_round_trip(&StudentT::new(n).unwrap(), e)?;
        assert_lower_tail_round_trip(&HypoExponential::new(&rates).unwrap(), e)?;
    }

    #[test]
    fn truncated_student(
        n in 1usize..30,
        a in -3.0..3.0f64,
        width in 0.1..10.0f64,
        x in -4.0..14.0f64,
    ) {
        let d = Truncated::of(StudentT::new(n).unwrap(), a, a + width).unwrap();
        assert_monotone(&d, a + 0.25 * width, x)?;
        assert_complementary(&d, x)?;
        assert_round_trip(&d, 1e-8)?;
    }

    #[test]
    fn quick_chi_square_quantile(n in 10usize..200, u in 0.02..0.98f64) {
        let exact = ChiSquare::new(n).unwrap().inverse_f(u).unwrap();
        let quick = ChiSquare::quick(n).unwrap().inverse_f(u).unwrap();
        prop_assert!((quick - exact).abs() <= 1e-4 * exact, "n = {n}, u = {u}");
    }

    #[test]
    fn quick_chi_square_delegates_in_the_tails(n in 3usize..10, u in 0.0001..0.02f64) {
        let exact = ChiSquare::new(n).unwrap().inverse_f(u).unwrap();
        let quick = ChiSquare::quick(n).unwrap().inverse_f(u).unwrap();
        prop_assert_eq!(quick.to_bits(), exact.to_bits());
    }
}

#[test]
fn quantile_domain_is_checked_everywhere() {
    let families: Vec<Box<dyn ContinuousDistribution>> = vec![
        Box::new(ChiSquare::new(4).unwrap()),
        Box::new(StudentT::quick(7).unwrap()),
        Box::new(HypoExponential::quick(&[1.0, 2.0]).unwrap()),
        Box::new(WatsonU::new(9).unwrap()),
        Box::new(KolmogorovSmirnovPlus::new(9).unwrap()),
        Box::new(AndersonDarling::with_variant(9, Variant::Quick).unwrap()),
    ];
    for d in &families {
        for u in [-0.5, 1.5, Real::NAN] {
            assert!(matches!(d.inverse_f(u), Err(Error::OutOfDomain(_))), "{d:?} at {u}");
        }
        assert_eq!(d.inverse_f(0.0), Ok(d.x_inf()));
        assert_eq!(d.inverse_f(1.0), Ok(d.x_sup()));
    }
}

#[test]
fn root_finder_contract() {
    let config = SolverConfig::with_accuracy(1e-10);
    assert_abs_diff_eq!(brent(|x| x - 5.0, 0.0, 10.0, &config).unwrap(), 5.0, epsilon = 1e-9);
    assert!(matches!(
        brent(|x| x - 5.0, 6.0, 10.0, &config),
        Err(Error::InvalidBracket { .. })
    ));
}

#[test]
fn far_quantile_of_three_rates() {
    let d = HypoExponential::new(&[1.0, 2.0, 3.0]).unwrap();
    let x = d.inverse_f(0.999_999).unwrap();
    assert!(x.is_finite());
    assert_abs_diff_eq!(d.cdf(x), 0.999_999, epsilon = 1e-12);
}

#[test]
fn convergence_warnings_are_logged_and_recorded() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    diagnostics::clear();
    let config = SolverConfig {
        accuracy: 0.0,
        max_iterations: 3,
    };
    let x = brent(|x: Real| x.exp() - 10.0, 0.0, 10.0, &config).unwrap();
    assert!(x.is_finite());
    let warnings = diagnostics::take();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].routine, "brent");
    assert_eq!(warnings[0].iterations, 3);
    assert_eq!(diagnostics::count(), 0);
}
