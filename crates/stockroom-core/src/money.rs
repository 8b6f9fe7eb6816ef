//! # Money Module
//!
//! The money codec and the `Money` type.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With f64 prices:                                                       │
//! │    14.99 * 100 = 1498.9999999999998  ❌ WRONG!                          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                     │
//! │    Input "14.99" (exact decimal) ──► to_minor_units ──► 1499           │
//! │    All ledger math on i64                                              │
//! │    1499 ──► to_decimal ──► 14.99 (display only)                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Codec Is The Only Conversion Point
//! [`to_minor_units`] and [`to_decimal`] are the only functions in the
//! workspace that move between decimal currency and minor units. Storage,
//! the mutation engine and the analytics never see a decimal.
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use stockroom_core::money::{to_decimal, to_minor_units, Money};
//!
//! let cents = to_minor_units(Decimal::new(1499, 2)).unwrap();
//! assert_eq!(cents, 1499);
//! assert_eq!(to_decimal(cents), Decimal::new(1499, 2));
//!
//! let price = Money::from_cents(cents);
//! assert_eq!((price * 3).cents(), 4497);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::error::{CoreError, CoreResult};

/// Minor units per major unit (cents per dollar).
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Number of decimal places carried by the minor unit.
const MINOR_UNIT_SCALE: u32 = 2;

// =============================================================================
// Codec
// =============================================================================

/// Converts a decimal currency amount into integer minor units.
///
/// Rounds `amount * 100` to the nearest integer, halves away from zero
/// (`0.005` → `1`, `2.345` → `235`).
///
/// ## Errors
/// - `InvalidAmount` if the amount is negative. Every monetary field the
///   ledger accepts (prices, totals) is non-negative.
/// - `InvalidAmount` if the result does not fit in an `i64`.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use stockroom_core::money::to_minor_units;
///
/// assert_eq!(to_minor_units(Decimal::new(1499, 2)).unwrap(), 1499);
/// assert_eq!(to_minor_units(Decimal::new(10005, 4)).unwrap(), 100);
/// assert!(to_minor_units(Decimal::new(-1, 0)).is_err());
/// ```
pub fn to_minor_units(amount: Decimal) -> CoreResult<i64> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(CoreError::invalid_amount(
            "amount",
            format!("{amount} is negative"),
        ));
    }

    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|rounded| rounded.to_i64())
        .ok_or_else(|| CoreError::invalid_amount("amount", format!("{amount} is out of range")))
}

/// Converts integer minor units back into a decimal amount with two
/// fraction digits.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use stockroom_core::money::to_decimal;
///
/// assert_eq!(to_decimal(1499), Decimal::new(1499, 2));
/// assert_eq!(to_decimal(1499).to_string(), "14.99");
/// ```
pub fn to_decimal(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_UNIT_SCALE)
}

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in minor units (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: de-stock suggestions report freed capital, which
///   the recommendation engine computes from negative order quantities
/// - **Single field tuple struct**: Zero-cost abstraction over i64
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from a decimal amount through the codec.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use stockroom_core::money::Money;
    ///
    /// let price = Money::from_decimal(Decimal::new(1099, 2)).unwrap();
    /// assert_eq!(price.cents(), 1099);
    /// ```
    pub fn from_decimal(amount: Decimal) -> CoreResult<Self> {
        to_minor_units(amount).map(Money)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value as a decimal through the codec (display only).
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        to_decimal(self.0)
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / MINOR_UNITS_PER_MAJOR
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % MINOR_UNITS_PER_MAJOR).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity, failing on overflow.
    ///
    /// Used for line subtotals, where the quantity comes from the caller.
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.checked_times(3).unwrap().cents(), 897);
    /// assert!(Money::from_cents(i64::MAX).checked_times(2).is_none());
    /// ```
    #[inline]
    pub const fn checked_times(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Adds two amounts, failing on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// For debugging and log lines. Localized display is the caller's job.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_codec_scenario() {
        let amount = Decimal::new(1499, 2); // 14.99
        assert_eq!(to_minor_units(amount).unwrap(), 1499);
        assert_eq!(to_decimal(1499), amount);
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        // 0.005 → 0.5 cents → 1
        assert_eq!(to_minor_units(Decimal::new(5, 3)).unwrap(), 1);
        // 2.345 → 234.5 cents → 235
        assert_eq!(to_minor_units(Decimal::new(2345, 3)).unwrap(), 235);
        // 2.344 → 234.4 cents → 234
        assert_eq!(to_minor_units(Decimal::new(2344, 3)).unwrap(), 234);
        // 0.125 → 12.5 cents → 13 (not bankers' 12)
        assert_eq!(to_minor_units(Decimal::new(125, 3)).unwrap(), 13);
    }

    #[test]
    fn test_negative_amount_rejected() {
        let err = to_minor_units(Decimal::new(-100, 2)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount { .. }));

        // Negative zero is still zero
        assert_eq!(to_minor_units(Decimal::new(-0, 2)).unwrap(), 0);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = to_minor_units(Decimal::MAX).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount { .. }));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_checked_overflow() {
        assert!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)).is_none());
        assert_eq!(
            Money::from_cents(400).checked_times(10),
            Some(Money::from_cents(4000))
        );
    }

    proptest! {
        #[test]
        fn prop_round_trip_two_fraction_digits(units in 0i64..1_000_000_000_000, scale in 0u32..=2) {
            let amount = Decimal::new(units, scale);
            let minor = to_minor_units(amount).unwrap();
            prop_assert_eq!(to_decimal(minor), amount);
        }

        #[test]
        fn prop_minor_units_are_exact_integers(cents in 0i64..1_000_000_000_000) {
            prop_assert_eq!(to_minor_units(to_decimal(cents)).unwrap(), cents);
        }
    }
}
