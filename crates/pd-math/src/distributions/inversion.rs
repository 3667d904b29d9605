//! Quantile computation by root finding.
//!
//! Every family without a closed-form quantile goes through one of these:
//! the probability is checked against `[0, 1]`, the two end points map to
//! the support bounds, and anything else is solved with Brent on a bracket
//! that is either fixed or found by expansion.
//!
//! Brent stops on an absolute width, which leaves few significant digits
//! on roots far below 1 (deep lower-tail quantiles of positive laws). Such
//! roots are polished by bisection with a relative width `tol`.

use crate::solvers1d::{bisection, brent, expand_upper, find_interval, SolverConfig};
use pd_core::{ensure_domain, errors::Result, Error, Real};

/// `Err(OutOfDomain)` unless `0 <= u <= 1`.
pub fn check_probability(u: Real) -> Result<()> {
    ensure_domain!((0.0..=1.0).contains(&u), "u = {u} not in [0, 1]");
    Ok(())
}

/// Support bound for `u == 0` or `u == 1`, `None` otherwise.
pub fn boundary(u: Real, x_inf: Real, x_sup: Real) -> Option<Real> {
    if u <= 0.0 {
        tracing::debug!(x_inf, "u = 0, returning the support infimum");
        Some(x_inf)
    } else if u >= 1.0 {
        tracing::debug!(x_sup, "u = 1, returning the support supremum");
        Some(x_sup)
    } else {
        None
    }
}

fn solve<F>(
    u: Real,
    lo: Real,
    hi: Real,
    x_inf: Real,
    x_sup: Real,
    cdf: F,
    tol: Real,
) -> Result<Real>
where
    F: Fn(Real) -> Real,
{
    let f = |x: Real| cdf(x) - u;
    let x = brent(f, lo, hi, &SolverConfig::with_accuracy(tol))?;
    let x = if x.abs() < 1.0 {
        polish(&f, (lo.min(hi), lo.max(hi)), x, tol)?
    } else {
        x
    };
    Ok(x.clamp(x_inf, x_sup))
}

/// Bisection to relative width `tol` around a Brent root `x`.
///
/// Brent leaves the root within `2·(tol + ε)` of `x`; the narrowed bracket
/// only falls back to `(lo, hi)` when rounding in `f` breaks its sign change.
fn polish<F>(f: &F, (lo, hi): (Real, Real), x: Real, tol: Real) -> Result<Real>
where
    F: Fn(Real) -> Real,
{
    let config = SolverConfig::bisection(tol);
    let w = 4.0 * (tol + f64::EPSILON * (1.0 + x.abs()));
    match bisection(f, (x - w).max(lo), (x + w).min(hi), &config) {
        Err(Error::InvalidBracket { .. }) => bisection(f, lo, hi, &config),
        r => r,
    }
}

/// Quantile on `[x_inf, x_sup]` with `x_inf` finite, bracketing by
/// geometric expansion from `x1`.
pub fn invert_with_bracket<F>(
    u: Real,
    x_inf: Real,
    x_sup: Real,
    x1: Real,
    cdf: F,
    tol: Real,
) -> Result<Real>
where
    F: Fn(Real) -> Real,
{
    check_probability(u)?;
    if let Some(x) = boundary(u, x_inf, x_sup) {
        return Ok(x);
    }
    let (lo, hi) = expand_upper(u, x_inf, x1, &cdf)?;
    solve(u, lo, hi, x_inf, x_sup, cdf, tol)
}

/// Quantile searched on the fixed bracket `[a, b]`.
pub fn invert_on<F>(
    u: Real,
    (a, b): (Real, Real),
    (x_inf, x_sup): (Real, Real),
    cdf: F,
    tol: Real,
) -> Result<Real>
where
    F: Fn(Real) -> Real,
{
    check_probability(u)?;
    if let Some(x) = boundary(u, x_inf, x_sup) {
        return Ok(x);
    }
    solve(u, a, b, x_inf, x_sup, cdf, tol)
}

/// Quantile for arbitrary support, bracketing outward from `±8`.
pub fn invert_anywhere<F>(u: Real, x_inf: Real, x_sup: Real, cdf: F, tol: Real) -> Result<Real>
where
    F: Fn(Real) -> Real,
{
    check_probability(u)?;
    if let Some(x) = boundary(u, x_inf, x_sup) {
        return Ok(x);
    }
    let (a, b) = find_interval(u, x_inf, x_sup, &cdf)?;
    solve(u, a, b, x_inf, x_sup, cdf, tol)
}
