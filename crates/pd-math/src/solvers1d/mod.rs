//! 1D root-finding solvers.
//!
//! [`brent`] is the workhorse used by every numerical inversion in the
//! crate. [`bisection`] has the same bracket contract but stops on a
//! relative width; quantile inversion uses it to polish roots below 1. The
//! [`bracket`] submodule turns an unbounded quantile search into a bounded
//! one.

use pd_core::{
    diagnostics::{self, ConvergenceWarning},
    errors::{Error, Result},
    Real,
};

/// Bracket construction for quantile searches.
pub mod bracket;

pub use bracket::{expand_upper, find_interval};

/// Values with `|f(x)|` at or below this are treated as exact roots.
pub const MINVAL: Real = 5.0e-308;

const BRENT_EPS: Real = 0.5e-15;

// ── Configuration ─────────────────────────────────────────────────────────────

/// Stopping criteria for the 1D solvers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Absolute accuracy requested on the root.
    pub accuracy: Real,
    /// Iteration cap. Reaching it reports a [`ConvergenceWarning`] and
    /// returns the best point found.
    pub max_iterations: usize,
}

impl SolverConfig {
    /// Brent defaults with a custom accuracy.
    pub fn with_accuracy(accuracy: Real) -> Self {
        Self {
            accuracy,
            ..Self::default()
        }
    }

    /// Bisection defaults: relative width `accuracy`, 1200 iterations.
    pub fn bisection(accuracy: Real) -> Self {
        Self {
            accuracy,
            max_iterations: 1200,
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            accuracy: 1.0e-12,
            max_iterations: 120,
        }
    }
}

fn check_bracket(a: Real, b: Real, fa: Real, fb: Real) -> Result<()> {
    if fa * fb > 0.0 || fa.is_nan() || fb.is_nan() {
        return Err(Error::InvalidBracket { a, b, fa, fb });
    }
    Ok(())
}

// ── Brent ─────────────────────────────────────────────────────────────────────

/// Brent–Dekker root of `f` in `[a, b]`.
///
/// Combines bisection, secant and inverse quadratic interpolation; the
/// bracket shrinks every iteration, so the method terminates even when `f`
/// is noisy near the root. Endpoints may be given in either order. An
/// endpoint with `|f| <= MINVAL` is returned immediately.
///
/// # Errors
/// [`Error::InvalidBracket`] when `f(a)` and `f(b)` share a strict sign.
pub fn brent<F>(f: F, a: Real, b: Real, config: &SolverConfig) -> Result<Real>
where
    F: Fn(Real) -> Real,
{
    let (mut a, mut b) = if b < a { (b, a) } else { (a, b) };

    let mut fa = f(a);
    if fa.abs() <= MINVAL {
        return Ok(a);
    }
    let mut fb = f(b);
    if fb.abs() <= MINVAL {
        return Ok(b);
    }
    check_bracket(a, b, fa, fb)?;

    let mut c = a;
    let mut fc = fa;
    let mut d = b - a;
    let mut e = d;
    let tol = config.accuracy + BRENT_EPS + f64::EPSILON;

    if fc.abs() < fb.abs() {
        a = b;
        b = c;
        c = a;
        fa = fb;
        fb = fc;
        fc = fa;
    }

    let mut xm = 0.5 * (c - b);
    for _ in 0..config.max_iterations {
        let tol1 = tol + 4.0 * f64::EPSILON * b.abs();
        xm = 0.5 * (c - b);

        if fb.abs() <= MINVAL {
            return Ok(b);
        }
        if xm.abs() <= tol1 {
            return Ok(if b.abs() > MINVAL { b } else { 0.0 });
        }

        if e.abs() >= tol1 && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (p, q) = if a != c {
                // inverse quadratic interpolation
                let q = fa / fc;
                let r = fb / fc;
                let p = s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0));
                (p, (q - 1.0) * (r - 1.0) * (s - 1.0))
            } else {
                // secant
                (2.0 * xm * s, 1.0 - s)
            };
            let (p, q) = if p > 0.0 { (p, -q) } else { (-p, q) };
            if 2.0 * p >= 3.0 * xm * q - (tol1 * q).abs() || p >= (0.5 * e * q).abs() {
                d = xm;
                e = d;
            } else {
                e = d;
                d = p / q;
            }
        } else {
            d = xm;
            e = d;
        }

        a = b;
        fa = fb;
        b += if d.abs() > tol1 {
            d
        } else if xm < 0.0 {
            -tol1
        } else {
            tol1
        };
        fb = f(b);
        if fb * fc.signum() > 0.0 {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        } else {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }
    }

    diagnostics::report(ConvergenceWarning {
        routine: "brent",
        iterations: config.max_iterations,
        residual: xm.abs(),
        argument: b,
    });
    Ok(b)
}

// ── Bisection ────────────────────────────────────────────────────────────────

/// Bisection on `[a, b]`, stopping when the bracket width falls below
/// `config.accuracy · |x|`.
///
/// # Errors
/// [`Error::InvalidBracket`] when `f(a)` and `f(b)` share a strict sign.
pub fn bisection<F>(f: F, a: Real, b: Real, config: &SolverConfig) -> Result<Real>
where
    F: Fn(Real) -> Real,
{
    let (mut xa, mut xb) = if b < a { (b, a) } else { (a, b) };

    let yb = f(xb);
    if yb.abs() <= MINVAL {
        return Ok(xb);
    }
    let ya = f(xa);
    if ya.abs() <= MINVAL {
        return Ok(xa);
    }
    check_bracket(xa, xb, ya, yb)?;

    let tol = config.accuracy + f64::EPSILON;
    let mut x = 0.5 * (xa + xb);
    for _ in 0..config.max_iterations {
        x = 0.5 * (xa + xb);
        let y = f(x);
        let width = (xb - xa).abs();
        if y.abs() <= MINVAL || width <= tol * x.abs() || width <= MINVAL {
            return Ok(if x.abs() > MINVAL { x } else { 0.0 });
        }
        if y * ya < 0.0 {
            xb = x;
        } else {
            xa = x;
        }
    }

    diagnostics::report(ConvergenceWarning {
        routine: "bisection",
        iterations: config.max_iterations,
        residual: (xb - xa).abs(),
        argument: x,
    });
    Ok(x)
}
