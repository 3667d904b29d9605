//! A distribution restricted to an interval `[a, b]`.
//!
//! `F*(x) = (F(x) − F(a)) / (F(b) − F(a))` for any base law. The bounds
//! are clipped to the base support. Moments come from the base when the
//! truncation removes nothing, otherwise from Simpson's rule on the
//! truncated density; both are computed once per set of bounds.

use super::{inversion, ContinuousDistribution};
use crate::integrals::{Integrator, SimpsonIntegral};
use pd_core::{ensure_param, errors::Result, Error, Real};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Moments {
    /// The truncation is vacuous: ask the base.
    Base,
    Integrated { mean: Real, variance: Real },
    /// A bound is infinite and the truncation is not vacuous.
    Undefined,
}

/// Everything derived from the bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    a: Real,
    b: Real,
    fa: Real,
    fb: Real,
    bar_fb: Real,
    area: Real,
    moments: Moments,
}

impl Bounds {
    fn build(base: &dyn ContinuousDistribution, a: Real, b: Real) -> Result<Self> {
        ensure_param!(a < b, "truncated: need a < b, got a = {a}, b = {b}");
        let a = a.max(base.x_inf());
        let b = b.min(base.x_sup());
        ensure_param!(a < b, "truncated: [{a}, {b}] misses the support of {base:?}");
        let fa = base.cdf(a);
        let fb = base.cdf(b);
        let area = fb - fa;
        ensure_param!(area > 0.0, "truncated: F(b) − F(a) = {area} on [{a}, {b}]");
        Ok(Self {
            a,
            b,
            fa,
            fb,
            bar_fb: base.bar_f(b),
            area,
            moments: moments_of(base, a, b, area)?,
        })
    }
}

fn moments_of(base: &dyn ContinuousDistribution, a: Real, b: Real, area: Real) -> Result<Moments> {
    if a <= base.x_inf() && b >= base.x_sup() {
        return Ok(Moments::Base);
    }
    if a.is_infinite() || b.is_infinite() {
        return Ok(Moments::Undefined);
    }
    let simpson = SimpsonIntegral::default();
    let mean = simpson.integrate(|x| x * base.density(x), a, b)? / area;
    let variance = simpson.integrate(
        |x| {
            let d = x - mean;
            d * d * base.density(x)
        },
        a,
        b,
    )? / area;
    tracing::debug!(a, b, mean, variance, "integrated truncated moments");
    Ok(Moments::Integrated { mean, variance })
}

/// Truncated distribution.
#[derive(Debug)]
pub struct Truncated {
    base: Box<dyn ContinuousDistribution>,
    bounds: Bounds,
}

impl Truncated {
    /// Restrict `base` to `[a, b]`.
    ///
    /// # Errors
    /// `InvalidParameter` if `a >= b` or the base puts no mass on `[a, b]`.
    pub fn new(base: Box<dyn ContinuousDistribution>, a: Real, b: Real) -> Result<Self> {
        let bounds = Bounds::build(base.as_ref(), a, b)?;
        Ok(Self { base, bounds })
    }

    /// Restrict a concrete distribution.
    pub fn of<D>(base: D, a: Real, b: Real) -> Result<Self>
    where
        D: ContinuousDistribution + 'static,
    {
        Self::new(Box::new(base), a, b)
    }

    /// Move the bounds; the distribution is unchanged on error.
    pub fn set_bounds(&mut self, a: Real, b: Real) -> Result<()> {
        self.bounds = Bounds::build(self.base.as_ref(), a, b)?;
        Ok(())
    }

    /// The untruncated distribution.
    pub fn base(&self) -> &dyn ContinuousDistribution {
        self.base.as_ref()
    }

    /// Lower bound after clipping to the base support.
    pub fn a(&self) -> Real {
        self.bounds.a
    }

    /// Upper bound after clipping.
    pub fn b(&self) -> Real {
        self.bounds.b
    }

    /// `F(a)` of the base.
    pub fn fa(&self) -> Real {
        self.bounds.fa
    }

    /// `F(b)` of the base.
    pub fn fb(&self) -> Real {
        self.bounds.fb
    }

    /// `F(b) − F(a)`.
    pub fn area(&self) -> Real {
        self.bounds.area
    }

    fn undefined(&self, what: &str) -> Error {
        Error::UndefinedMoment(format!(
            "truncated {what} on [{}, {}]",
            self.bounds.a, self.bounds.b
        ))
    }
}

impl ContinuousDistribution for Truncated {
    fn density(&self, x: Real) -> Real {
        let Bounds { a, b, area, .. } = self.bounds;
        if x < a || x > b {
            return 0.0;
        }
        self.base.density(x) / area
    }

    fn cdf(&self, x: Real) -> Real {
        let Bounds { a, b, fa, area, .. } = self.bounds;
        if x <= a {
            0.0
        } else if x >= b {
            1.0
        } else {
            (self.base.cdf(x) - fa) / area
        }
    }

    fn bar_f(&self, x: Real) -> Real {
        let Bounds {
            a, b, bar_fb, area, ..
        } = self.bounds;
        if x <= a {
            1.0
        } else if x >= b {
            0.0
        } else {
            (self.base.bar_f(x) - bar_fb) / area
        }
    }

    fn inverse_f(&self, u: Real) -> Result<Real> {
        let Bounds { a, b, fa, area, .. } = self.bounds;
        inversion::check_probability(u)?;
        if let Some(x) = inversion::boundary(u, a, b) {
            return Ok(x);
        }
        let x = self.base.inverse_f(fa + area * u)?;
        Ok(x.clamp(a, b))
    }

    fn x_inf(&self) -> Real {
        self.bounds.a
    }

    fn x_sup(&self) -> Real {
        self.bounds.b
    }

    fn mean(&self) -> Result<Real> {
        match self.bounds.moments {
            Moments::Base => self.base.mean(),
            Moments::Integrated { mean, .. } => Ok(mean),
            Moments::Undefined => Err(self.undefined("mean")),
        }
    }

    fn variance(&self) -> Result<Real> {
        match self.bounds.moments {
            Moments::Base => self.base.variance(),
            Moments::Integrated { variance, .. } => Ok(variance),
            Moments::Undefined => Err(self.undefined("variance")),
        }
    }
}
