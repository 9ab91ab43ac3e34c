//! Fixed-point money types with 2 decimal places precision.
//!
//! `Amount` is the per-record transaction amount as rendered on a data line.
//! `MoneyTotal` is the batch accumulator, kept in integer minor units so the
//! footer total is exact no matter how many records are summed.

use crate::error::{CreditFileError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A transaction amount with at most 2 fraction digits.
///
/// Inputs with more precision are rejected rather than rounded, since the
/// checksum scales the amount by 100 and expects an integer result.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use credit_file::Amount;
///
/// let amount = Amount::from_str("102.18").unwrap();
/// assert_eq!(amount.to_minor_units().unwrap(), 10218);
/// assert_eq!(Amount::from_str("5").unwrap().to_string(), "5.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Amount(Decimal);

impl Amount {
    /// The number of fraction digits carried by an amount.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Amount(Decimal::ZERO);

    /// Creates an `Amount`, rejecting values with more than 2 significant fraction digits.
    pub fn new(value: Decimal) -> Result<Self> {
        if value.normalize().scale() > Self::SCALE {
            return Err(CreditFileError::InvalidAmount {
                value: value.to_string(),
                reason: format!("more than {} fraction digits", Self::SCALE),
            });
        }
        let mut scaled = value;
        scaled.rescale(Self::SCALE);
        Ok(Amount(scaled))
    }

    /// Builds an amount from integer minor units (cents).
    pub fn from_minor_units(cents: i64) -> Self {
        Amount(Decimal::new(cents, Self::SCALE))
    }

    /// Converts to integer minor units by exact decimal rescaling.
    ///
    /// The inner value always has scale 2, so its mantissa is the cent count.
    pub fn to_minor_units(&self) -> Result<i64> {
        i64::try_from(self.0.mantissa()).map_err(|_| CreditFileError::ChecksumOverflow)
    }

    /// Returns the underlying decimal.
    pub fn inner(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Amount {
    type Err = CreditFileError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let decimal = Decimal::from_str(trimmed).map_err(|e| CreditFileError::InvalidAmount {
            value: trimmed.to_string(),
            reason: e.to_string(),
        })?;
        Amount::new(decimal)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Running money total in integer minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoneyTotal {
    cents: i64,
}

impl MoneyTotal {
    /// Empty total.
    pub const ZERO: Self = MoneyTotal { cents: 0 };

    /// Returns the total after adding `amount`, leaving `self` untouched.
    pub fn checked_add(self, amount: Amount) -> Result<Self> {
        let cents = self
            .cents
            .checked_add(amount.to_minor_units()?)
            .ok_or(CreditFileError::ChecksumOverflow)?;
        Ok(MoneyTotal { cents })
    }

    /// Accumulated minor units.
    pub fn minor_units(&self) -> i64 {
        self.cents
    }

    /// Reconstructs the decimal total from the integer accumulator.
    pub fn to_amount(&self) -> Amount {
        Amount::from_minor_units(self.cents)
    }
}

impl fmt::Display for MoneyTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_amount(), f)
    }
}
