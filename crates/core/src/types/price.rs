//! Decimal price type used for cart and order arithmetic.
//!
//! Wraps [`rust_decimal::Decimal`] so money never goes through floating
//! point. The remote API serializes amounts as JSON numbers or numeric
//! strings; the `serde-with-str` feature of `rust_decimal` accepts both.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul, Sub};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in the store currency's standard unit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether this amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<i64> for Price {
    fn from(amount: i64) -> Self {
        Self(Decimal::from(amount))
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Price {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

/// Line totals: unit price times quantity.
impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(s: &str) -> Price {
        Price::new(s.parse().unwrap())
    }

    #[test]
    fn test_line_total() {
        assert_eq!(price("19.99") * 3, price("59.97"));
        assert_eq!(price("19.99") * 0, Price::ZERO);
    }

    #[test]
    fn test_sum_empty_is_zero() {
        let total: Price = core::iter::empty::<Price>().sum();
        assert_eq!(total, Price::ZERO);
    }

    #[test]
    fn test_display_two_decimal_places() {
        assert_eq!(price("5").to_string(), "5.00");
        assert_eq!(price("129000").to_string(), "129000.00");
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&price("12.5")).unwrap();
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(back, price("12.5"));
    }
}
