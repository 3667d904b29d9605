//! Matrix exponential of upper bidiagonal matrices.
//!
//! The hypoexponential family evaluates its distribution function through
//! `e^A` where `A` is upper bidiagonal. [`exp_bidiagonal`] uses the
//! diagonal [9/9] Padé approximant with scaling and squaring (Higham,
//! *Functions of Matrices*, 2008). [`expm1_bidiagonal_times`] computes
//! `(e^A − I)·b` without ever forming `e^A − I` by subtraction, which is
//! what keeps small lower-tail probabilities accurate.

use nalgebra::{DMatrix, DVector};
use pd_core::{
    diagnostics::{self, ConvergenceWarning},
    errors::{Error, Result},
    Real,
};

/// [9/9] Padé numerator coefficients for `exp(x)`.
const PADE9: [Real; 10] = [
    17643225600.0,
    8821612800.0,
    2075673600.0,
    302702400.0,
    30270240.0,
    2162160.0,
    110880.0,
    3960.0,
    90.0,
    1.0,
];

/// Largest 1-norm for which the [9/9] approximant is accurate to double
/// precision without scaling.
const THETA9: Real = 2.097847961257068;

/// Norm bound for the Taylor series in [`expm1_bidiagonal_times`].
const THETA_TAYLOR: Real = 1.0 / 16.0;

const TAYLOR_EPS: Real = 1.0e-12;

/// 1-norm of an upper bidiagonal matrix (max column sum).
pub fn norm1_bidiagonal(a: &DMatrix<Real>) -> Real {
    let n = a.nrows();
    let mut norm = a[(0, 0)].abs();
    for i in 1..n {
        let x = a[(i - 1, i)].abs() + a[(i, i)].abs();
        if x > norm {
            norm = x;
        }
    }
    norm
}

/// Smallest `s >= 0` with `‖A‖₁ / 2^s <= theta`.
fn scale_for(a: &DMatrix<Real>, theta: Real) -> i32 {
    let ratio = norm1_bidiagonal(a) / theta;
    if ratio > 1.0 {
        ratio.log2().ceil() as i32
    } else {
        0
    }
}

fn check_square(a: &DMatrix<Real>) -> Result<usize> {
    let n = a.nrows();
    if n == 0 || a.ncols() != n {
        return Err(Error::InvalidParameter(format!(
            "matrix exponential needs a nonempty square matrix, got {}x{}",
            a.nrows(),
            a.ncols()
        )));
    }
    Ok(n)
}

/// `e^A` for an upper bidiagonal `A`.
///
/// The diagonal is first shifted by `μ = tr(A)/n`, which only rescales the
/// result by `e^μ` and usually shrinks the norm.
pub fn exp_bidiagonal(a: &DMatrix<Real>) -> Result<DMatrix<Real>> {
    let n = check_square(a)?;
    let mu = a.trace() / n as Real;
    let mut b = a.clone();
    for i in 0..n {
        b[(i, i)] -= mu;
    }

    let s = scale_for(&b, THETA9);
    let v = 0.5f64.powi(s);
    b *= v;

    let id = DMatrix::<Real>::identity(n, n);
    let b2 = &b * &b;
    let b4 = &b2 * &b2;

    // odd part: U = B·(B⁴(c9·B⁴ + c7·B²) + c5·B⁴ + c3·B² + c1·I)
    let w = &b4 * PADE9[9] + &b2 * PADE9[7];
    let inner = &b4 * &w + &b4 * PADE9[5] + &b2 * PADE9[3] + &id * PADE9[1];
    let u = &b * inner;

    // even part: V = B⁴(c8·B⁴ + c6·B²) + c4·B⁴ + c2·B² + c0·I
    let w = &b4 * PADE9[8] + &b2 * PADE9[6];
    let v_even = &b4 * &w + &b4 * PADE9[4] + &b2 * PADE9[2] + &id * PADE9[0];

    let numerator = &v_even + &u;
    let denominator = &v_even - &u;
    let mut e = denominator
        .solve_upper_triangular(&numerator)
        .ok_or_else(|| {
            Error::InvalidParameter("singular Padé denominator in matrix exponential".into())
        })?;

    e *= (mu * v).exp();
    for _ in 0..s {
        e = &e * &e;
    }
    Ok(e)
}

/// `(e^F − I)·b` by its Taylor series, for `‖F‖` small.
fn taylor_expm1_times(f: &DMatrix<Real>, b: &DVector<Real>) -> DVector<Real> {
    let k = f.nrows();
    let jmax = 2 * k + 100;
    let mut term = b.clone();
    let mut sum = DVector::<Real>::zeros(k);

    for j in 1..=jmax {
        term = f * term / j as Real;
        sum += &term;
        if j > k + 5 {
            let t: Real = term.iter().map(|x| x.abs()).sum();
            let s: Real = sum.iter().map(|x| x.abs()).sum();
            if t <= s * TAYLOR_EPS {
                return sum;
            }
        }
    }
    diagnostics::report(ConvergenceWarning {
        routine: "expm1_taylor",
        iterations: jmax,
        residual: term.iter().map(|x| x.abs()).sum(),
        argument: norm1_bidiagonal(f),
    });
    sum
}

/// `(e^A − I)·b` for an upper bidiagonal `A`.
///
/// `A` is scaled to `F = A/2^s` with `‖F‖₁ <= 1/16`, `(e^F − I)·b` comes
/// from a Taylor series, and the scaling is undone with
/// `(e^{2F} − I)·b = (e^F + I)(e^F − I)·b`.
pub fn expm1_bidiagonal_times(a: &DMatrix<Real>, b: &DVector<Real>) -> Result<DVector<Real>> {
    let n = check_square(a)?;
    if b.len() != n {
        return Err(Error::InvalidParameter(format!(
            "vector of length {} does not match a {n}x{n} matrix",
            b.len()
        )));
    }
    let s = scale_for(a, THETA_TAYLOR);
    let f = a * 0.5f64.powi(s);

    let mut u = exp_bidiagonal(&f)?;
    let mut c = taylor_expm1_times(&f, b);
    let id = DMatrix::<Real>::identity(n, n);

    for i in 1..=s {
        c = (&u + &id) * c;
        if i < s {
            u = &u * &u;
        }
    }
    Ok(c)
}
