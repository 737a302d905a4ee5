//! Money amounts held in integer minor units.
//!
//! Every monetary figure in the engine is a [`Money`]: a count of cents.
//! Decimal values only appear at the edges (parsing, display, serde) and as
//! the intermediate product of an amount and a rate, which is rounded back
//! to whole cents exactly once.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EngineError, EngineResult};

/// Largest magnitude, in minor units, that the engine accepts.
///
/// Ten trillion major units. Keeps every sum of a handful of amounts well
/// inside `i64`.
pub const MAX_MINOR_UNITS: i64 = 1_000_000_000_000_000;

/// A monetary amount in minor units (cents).
///
/// # Example
///
/// ```
/// use payroll_engine::models::Money;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let relief = Money::from_major(Decimal::from_str("2400.00").unwrap()).unwrap();
/// assert_eq!(relief.minor_units(), 240_000);
/// assert_eq!(relief.to_string(), "2400.00");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero.
    pub const ZERO: Money = Money(0);

    /// Creates an amount from minor units.
    pub const fn from_minor(minor_units: i64) -> Self {
        Money(minor_units)
    }

    /// Creates an amount from whole major units.
    ///
    /// Meant for literals and constants. Amounts from input go through
    /// [`Money::from_major`], which reports out-of-range values as errors.
    ///
    /// # Panics
    ///
    /// Panics if the amount lies outside [`MAX_MINOR_UNITS`].
    pub const fn from_whole(major_units: i64) -> Self {
        assert!(
            major_units >= -MAX_MINOR_UNITS / 100 && major_units <= MAX_MINOR_UNITS / 100,
            "whole amount out of range"
        );
        Money(major_units * 100)
    }

    /// Parses a decimal amount of major units.
    ///
    /// Fails with `InvalidInput` if the amount has sub-cent precision or is
    /// outside [`MAX_MINOR_UNITS`]. The amount is never rounded.
    pub fn from_major(amount: Decimal) -> EngineResult<Self> {
        let minor = amount * Decimal::ONE_HUNDRED;
        if !minor.fract().is_zero() {
            return Err(EngineError::invalid_input(
                "amount",
                format!("{} has more than two decimal places", amount),
            ));
        }
        let minor = minor
            .to_i64()
            .filter(|m| m.abs() <= MAX_MINOR_UNITS)
            .ok_or_else(|| {
                EngineError::invalid_input("amount", format!("{} is out of range", amount))
            })?;
        Ok(Money(minor))
    }

    /// Rounds a minor-unit decimal to whole cents, half away from zero.
    pub fn round_minor(minor_units: Decimal) -> EngineResult<Self> {
        minor_units
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Money)
            .ok_or_else(|| EngineError::CalculationError {
                message: format!("{} minor units does not fit in an amount", minor_units),
            })
    }

    /// The amount in minor units.
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// The amount in major units, with exactly two decimal places.
    pub fn to_major(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Exact product of this amount and a rate, in minor units.
    pub fn times_rate(self, rate: Decimal) -> Decimal {
        Decimal::from(self.0) * rate
    }

    /// Returns true if the amount is below zero.
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Returns true if the amount lies within the accepted range.
    pub const fn in_range(self) -> bool {
        self.0 >= -MAX_MINOR_UNITS && self.0 <= MAX_MINOR_UNITS
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_major())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_major().to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Money::from_major(amount).map_err(serde::de::Error::custom)
    }
}
