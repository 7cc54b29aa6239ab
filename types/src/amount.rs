//! Fixed-point amount types.
//!
//! Amounts are represented as fixed-point integers (u128) to avoid floating-point errors.
//! One whole unit is `AMOUNT_SCALE` raw units, giving 12 fractional digits: enough to
//! hold every conversion-table product exactly (e.g. `1.5 × 0.000025 = 0.0000375`).

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw units per whole unit.
pub const AMOUNT_SCALE: u128 = 1_000_000_000_000;

const SCALE_DIGITS: usize = 12;

/// A non-negative balance or accrual amount.
///
/// Used for the flat balance, the per-interval rate, and every unit balance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// An amount of `whole` full units.
    pub const fn from_whole(whole: u64) -> Self {
        Self(whole as u128 * AMOUNT_SCALE)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Multiply by a whole count (e.g. a number of elapsed intervals).
    pub fn checked_mul_count(self, count: u64) -> Option<Self> {
        self.0.checked_mul(count as u128).map(Self)
    }

    /// Convert into another unit. The product is truncated to the amount scale.
    pub fn checked_convert(self, rate: ConversionRate) -> Option<Self> {
        self.0
            .checked_mul(rate.raw())
            .map(|product| Self(product / AMOUNT_SCALE))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_decimal(f, self.0)
    }
}

impl FromStr for Amount {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_decimal(s).map(Self)
    }
}

/// Units of a target currency credited per one unit of the flat currency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConversionRate(u128);

impl ConversionRate {
    pub const ONE: Self = Self(AMOUNT_SCALE);

    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for ConversionRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_decimal(f, self.0)
    }
}

impl FromStr for ConversionRate {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_decimal(s).map(Self)
    }
}

fn write_decimal(f: &mut fmt::Formatter<'_>, raw: u128) -> fmt::Result {
    let whole = raw / AMOUNT_SCALE;
    let frac = raw % AMOUNT_SCALE;
    if frac == 0 {
        return write!(f, "{whole}");
    }
    let digits = format!("{frac:0width$}", width = SCALE_DIGITS);
    write!(f, "{whole}.{}", digits.trim_end_matches('0'))
}

fn parse_decimal(s: &str) -> Result<u128, TypesError> {
    let s = s.trim();
    let invalid = || TypesError::InvalidAmount(s.to_string());
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > SCALE_DIGITS {
        return Err(TypesError::TooPrecise(s.to_string()));
    }

    let overflow = || TypesError::AmountOverflow(s.to_string());
    let whole_raw = if whole.is_empty() {
        0
    } else {
        whole.parse::<u128>().map_err(|_| overflow())?
    };
    let frac_raw = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = SCALE_DIGITS);
        padded.parse::<u128>().map_err(|_| invalid())?
    };
    whole_raw
        .checked_mul(AMOUNT_SCALE)
        .and_then(|w| w.checked_add(frac_raw))
        .ok_or_else(overflow)
}
