//! Fixed significant-digit precision for arithmetic mutations.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::error::{Result, SensiError};

/// Significant digits used when no configuration overrides it.
pub const DEFAULT_DIGITS: u32 = 13;

/// Upper bound imposed by the 96-bit decimal mantissa.
pub const MAX_DIGITS: u32 = 28;

/// Number of significant decimal digits kept after each arithmetic result.
///
/// Passed explicitly to the value applier so concurrent engines never share
/// rounding state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    digits: u32,
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            digits: DEFAULT_DIGITS,
        }
    }
}

impl Precision {
    pub fn new(digits: u32) -> Result<Self> {
        if digits == 0 || digits > MAX_DIGITS {
            return Err(SensiError::value(format!(
                "precision must be within 1..={MAX_DIGITS} digits (got {digits})"
            )));
        }
        Ok(Self { digits })
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    /// Round `value` half-to-even when it carries more significant digits than allowed.
    ///
    /// Values already within precision are returned untouched, scale included,
    /// so `2.0 + 1.5` renders as `3.5` rather than `3.500000000000`.
    pub fn round(&self, value: Decimal) -> Decimal {
        if significant_digits(value) <= self.digits {
            return value;
        }
        value
            .round_sf_with_strategy(self.digits, RoundingStrategy::MidpointNearestEven)
            .unwrap_or(value)
    }
}

fn significant_digits(value: Decimal) -> u32 {
    let mantissa = value.mantissa().unsigned_abs();
    if mantissa == 0 {
        return 1;
    }
    mantissa.ilog10() + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(raw: &str) -> Decimal {
        Decimal::from_str(raw).expect("decimal")
    }

    #[test]
    fn short_values_keep_their_scale() {
        let precision = Precision::default();
        assert_eq!(precision.round(dec("3.5")).to_string(), "3.5");
        assert_eq!(precision.round(dec("3.0")).to_string(), "3.0");
    }

    #[test]
    fn long_values_round_to_thirteen_digits() {
        let precision = Precision::default();
        let third = dec("1") / dec("3");
        assert_eq!(precision.round(third).to_string(), "0.3333333333333");
    }

    #[test]
    fn rounding_is_half_to_even() {
        let precision = Precision::new(3).expect("precision");
        assert_eq!(precision.round(dec("1.225")).to_string(), "1.22");
        assert_eq!(precision.round(dec("1.235")).to_string(), "1.24");
    }

    #[test]
    fn rejects_out_of_range_digits() {
        assert!(Precision::new(0).is_err());
        assert!(Precision::new(MAX_DIGITS + 1).is_err());
        assert_eq!(Precision::new(MAX_DIGITS).expect("max").digits(), MAX_DIGITS);
    }
}
