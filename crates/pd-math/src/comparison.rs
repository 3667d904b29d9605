//! Precision targets.

use pd_core::Real;

/// Largest number of decimal digits accepted as a precision target.
pub const MAX_DIGITS: u32 = 35;

/// Absolute epsilon needed for `digits` correct decimal digits:
/// `0.5 * 10^-digits`.
///
/// `digits` is clamped to [`MAX_DIGITS`]. The value is a best-effort hint
/// threaded into sub-computations, not a verified postcondition.
#[inline]
pub fn eps_for_digits(digits: u32) -> Real {
    0.5 * 10f64.powi(-(digits.min(MAX_DIGITS) as i32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn digits_table() {
        assert_relative_eq!(eps_for_digits(0), 0.5);
        assert_relative_eq!(eps_for_digits(6), 0.5e-6, max_relative = 1e-12);
        assert_relative_eq!(eps_for_digits(15), 0.5e-15, max_relative = 1e-12);
        assert_eq!(eps_for_digits(99), eps_for_digits(MAX_DIGITS));
    }
}
