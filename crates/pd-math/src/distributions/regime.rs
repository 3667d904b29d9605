//! Evaluation strategies and regime labels.

use std::fmt;

/// Which formula set a distribution evaluates with.
///
/// Both variants share one parameter set and one coefficient cache; `Quick`
/// is an overlay that falls back to the `Exact` path outside its validated
/// range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    /// Slower formulas valid over the whole domain.
    #[default]
    Exact,
    /// Fast approximations over the well-conditioned bulk of the domain.
    Quick,
}

/// The branch a regime dispatcher selects for a given argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    /// Exact closed form (degenerate sizes, trivial arguments, support ends).
    ClosedForm,
    /// Convergent or finite series.
    Series,
    /// Asymptotic expansion or fitted polynomial.
    Asymptotic,
    /// The exact sibling formula.
    Delegate,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Exact => write!(f, "exact"),
            Variant::Quick => write!(f, "quick"),
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Branch::ClosedForm => "closed form",
            Branch::Series => "series",
            Branch::Asymptotic => "asymptotic",
            Branch::Delegate => "delegate",
        };
        f.write_str(s)
    }
}
