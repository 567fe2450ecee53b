//! Coin amounts.
//!
//! Amounts are represented as fixed-point integers (u64 base units, 10^8 per
//! coin) to avoid floating-point errors when budgets are summed and compared.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;

use crate::TypeError;

/// Base units per coin.
pub const UNITS_PER_COIN: u64 = 100_000_000;

const DECIMALS: usize = 8;

/// A non-negative coin amount.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub fn from_units(units: u64) -> Self {
        Self(units)
    }

    pub fn from_coins(coins: u64) -> Self {
        Self(coins.saturating_mul(UNITS_PER_COIN))
    }

    pub fn units(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Convert a floating point coin value as reported by some RPC calls.
    pub fn from_coins_f64(coins: f64) -> Result<Self, TypeError> {
        if !coins.is_finite() || coins < 0.0 {
            return Err(TypeError::InvalidAmount(coins.to_string()));
        }
        let units = (coins * UNITS_PER_COIN as f64).round();
        if units > u64::MAX as f64 {
            return Err(TypeError::InvalidAmount(coins.to_string()));
        }
        Ok(Self(units as u64))
    }

    /// Parse a plain decimal string such as `"12.5"` or `"0.00000001"`.
    ///
    /// Exponent notation falls back to floating point conversion.
    pub fn parse_decimal(s: &str) -> Result<Self, TypeError> {
        let s = s.trim();
        let invalid = || TypeError::InvalidAmount(s.to_string());
        if s.is_empty() || s.starts_with('-') {
            return Err(invalid());
        }
        if s.contains(['e', 'E']) {
            let coins: f64 = s.parse().map_err(|_| invalid())?;
            return Self::from_coins_f64(coins);
        }

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let significant = frac.trim_end_matches('0');
        if significant.len() > DECIMALS {
            return Err(invalid());
        }

        let whole_units = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<u64>()
                .map_err(|_| invalid())?
                .checked_mul(UNITS_PER_COIN)
                .ok_or_else(invalid)?
        };
        let frac_units = if significant.is_empty() {
            0
        } else {
            let padded = format!("{significant:0<width$}", width = DECIMALS);
            padded.parse::<u64>().map_err(|_| invalid())?
        };
        whole_units
            .checked_add(frac_units)
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl FromStr for Amount {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_decimal(s)
    }
}

/// Always renders exactly eight decimals, e.g. `12.50000000`.
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:08}",
            self.0 / UNITS_PER_COIN,
            self.0 % UNITS_PER_COIN
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_decimals() {
        assert_eq!(Amount::parse_decimal("12.5").unwrap().units(), 1_250_000_000);
        assert_eq!(Amount::parse_decimal("7").unwrap(), Amount::from_coins(7));
        assert_eq!(Amount::parse_decimal(".5").unwrap().units(), 50_000_000);
        assert_eq!(Amount::parse_decimal("0.00000001").unwrap().units(), 1);
        assert_eq!(Amount::parse_decimal("3.10000000000").unwrap().units(), 310_000_000);
    }

    #[test]
    fn parses_exponent_notation() {
        assert_eq!(Amount::parse_decimal("1e-8").unwrap().units(), 1);
        assert_eq!(Amount::parse_decimal("2.5E2").unwrap(), Amount::from_coins(250));
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "-1", "abc", "1.2.3", ".", "0.000000001", "1,5"] {
            assert!(Amount::parse_decimal(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn renders_eight_decimals() {
        assert_eq!(Amount::from_units(1_250_000_000).to_string(), "12.50000000");
        assert_eq!(Amount::ZERO.to_string(), "0.00000000");
        assert_eq!(Amount::from_units(1).to_string(), "0.00000001");
    }

    #[test]
    fn from_f64_rounds_to_units() {
        assert_eq!(Amount::from_coins_f64(0.1 + 0.2).unwrap().units(), 30_000_000);
        assert!(Amount::from_coins_f64(-1.0).is_err());
        assert!(Amount::from_coins_f64(f64::NAN).is_err());
    }
}
