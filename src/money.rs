//! Fixed-point money. No binary floating point touches a monetary value anywhere
//! in this engine.

use rust_decimal::{Decimal, RoundingStrategy};
#[cfg(test)]
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use crate::error::EngineError;

/// A monetary amount, always carried at exactly 2 fractional digits.
///
/// Construction always rounds half-away-from-zero to 2 decimal places, so once
/// a `Money` exists its scale invariant holds for the rest of its lifetime —
/// arithmetic between two correctly-scaled `Money` values never needs to
/// re-round except where a single sub-computation calls for rounding on its
/// own (e.g. one proration, one slab contribution) before summing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Round `value` half-away-from-zero to 2 decimal places and wrap it.
    pub fn round(value: Decimal) -> Self {
        Money(value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    /// Construct from an already-scaled `Decimal` without re-rounding. Used when
    /// summing already-rounded line amounts (§4.2/§4.4: "sum is not re-rounded").
    pub fn from_exact(value: Decimal) -> Self {
        Money(value)
    }

    /// Validate and wrap a non-negative amount, failing with `InvalidArgument`
    /// the way C1/C4 are required to on a negative input.
    pub fn non_negative(value: Decimal) -> Result<Self, EngineError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(EngineError::InvalidArgument(format!(
                "amount must be non-negative, got {value}"
            )));
        }
        Ok(Money::round(value))
    }

    /// Underlying decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn min(self, other: Money) -> Money {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

#[cfg(test)]
pub(crate) fn m(whole_and_cents: &str) -> Money {
    Money::round(whole_and_cents.parse().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(Money::round(dec!(5483.865)).to_string(), "5483.87");
        assert_eq!(Money::round(dec!(-5483.865)).to_string(), "-5483.87");
        assert_eq!(Money::round(dec!(2.345)).to_string(), "2.35");
    }

    #[test]
    fn rejects_negative_in_non_negative_constructor() {
        assert!(Money::non_negative(dec!(-1)).is_err());
        assert!(Money::non_negative(dec!(0)).is_ok());
    }

    #[test]
    fn arithmetic_preserves_scale() {
        let a = m("10.00");
        let b = m("2.505");
        assert_eq!((a + b).to_string(), "12.51");
        assert_eq!((a - b).to_string(), "7.49");
    }

    #[test]
    fn sum_over_iterator() {
        let total: Money = vec![m("1.00"), m("2.50"), m("3.49")].into_iter().sum();
        assert_eq!(total.to_string(), "6.99");
    }
}
