//! Fixed-point price values parsed from advertised page text.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced when a numeric token cannot be read as a price.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceParseError {
    #[error("empty price token")]
    Empty,
    #[error("more than one decimal point")]
    MultipleDecimalPoints,
    #[error("invalid digit {0:?}")]
    InvalidDigit(char),
    #[error("price out of range")]
    Overflow,
}

/// Fixed-point price with 4 decimal places.
/// Equality, ordering and hashing are exact, which the dedup and
/// "same as last alert" checks rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(pub u64);

impl Price {
    /// Number of decimal places kept.
    pub const DECIMALS: u32 = 4;
    /// Scale factor: 10^4
    pub const SCALE: u64 = 10_000;

    /// Create from f64 (config values and tests; page text goes through `FromStr`).
    pub fn from_f64(value: f64) -> Self {
        Self((value * Self::SCALE as f64).round() as u64)
    }

    /// Convert to f64 (for display and ratio math).
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    /// Absolute decrease from `old` to `new`. Negative when the price rose.
    pub fn drop_amount(old: Price, new: Price) -> f64 {
        (old.0 as i128 - new.0 as i128) as f64 / Self::SCALE as f64
    }

    /// Relative decrease from `old` to `new` as a fraction of `old`.
    /// Zero when there is no positive baseline.
    pub fn drop_ratio(old: Price, new: Price) -> f64 {
        if old.0 == 0 {
            return 0.0;
        }
        (old.0 as i128 - new.0 as i128) as f64 / old.0 as f64
    }
}

impl FromStr for Price {
    type Err = PriceParseError;

    /// Accepts `123`, `123.`, `123.45` and `.45`. Digits past the fourth
    /// decimal are rounded half-up.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(PriceParseError::Empty);
        }
        if frac.contains('.') {
            return Err(PriceParseError::MultipleDecimalPoints);
        }
        if let Some(c) = whole.chars().chain(frac.chars()).find(|c| !c.is_ascii_digit()) {
            return Err(PriceParseError::InvalidDigit(c));
        }

        let mut units: u64 = 0;
        for d in whole.bytes() {
            units = units
                .checked_mul(10)
                .and_then(|u| u.checked_add(u64::from(d - b'0')))
                .ok_or(PriceParseError::Overflow)?;
        }
        let mut scaled = units
            .checked_mul(Self::SCALE)
            .ok_or(PriceParseError::Overflow)?;

        let mut place = Self::SCALE / 10;
        let mut digits = frac.bytes();
        for d in digits.by_ref().take(Self::DECIMALS as usize) {
            scaled = scaled
                .checked_add(u64::from(d - b'0') * place)
                .ok_or(PriceParseError::Overflow)?;
            place /= 10;
        }
        if digits.next().is_some_and(|d| d >= b'5') {
            scaled = scaled.checked_add(1).ok_or(PriceParseError::Overflow)?;
        }

        Ok(Self(scaled))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::SCALE;
        let frac = self.0 % Self::SCALE;
        if frac % 100 == 0 {
            write!(f, "{}.{:02}", whole, frac / 100)
        } else {
            let digits = format!("{:04}", frac);
            write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
        }
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_integer_and_decimal() {
        assert_eq!("1299".parse::<Price>().unwrap(), Price(12_990_000));
        assert_eq!("89.90".parse::<Price>().unwrap(), Price(899_000));
        assert_eq!("99.".parse::<Price>().unwrap(), Price(990_000));
        assert_eq!(".5".parse::<Price>().unwrap(), Price(5_000));
    }

    #[test]
    fn test_parse_rejects_malformed_tokens() {
        assert_eq!("".parse::<Price>(), Err(PriceParseError::Empty));
        assert_eq!(".".parse::<Price>(), Err(PriceParseError::Empty));
        assert_eq!(
            "1.2.3".parse::<Price>(),
            Err(PriceParseError::MultipleDecimalPoints)
        );
        assert_eq!("12a".parse::<Price>(), Err(PriceParseError::InvalidDigit('a')));
        assert_eq!(
            "99999999999999999999".parse::<Price>(),
            Err(PriceParseError::Overflow)
        );
    }

    #[test]
    fn test_parse_rounds_extra_decimals() {
        assert_eq!("1.23456".parse::<Price>().unwrap(), Price(12_346));
        assert_eq!("1.23454".parse::<Price>().unwrap(), Price(12_345));
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_f64(90.0).to_string(), "90.00");
        assert_eq!(Price::from_f64(1299.9).to_string(), "1299.90");
        assert_eq!(Price(12_345).to_string(), "1.2345");
        assert_eq!(Price(12_340).to_string(), "1.234");
    }

    #[test]
    fn test_drop_math() {
        let old = Price::from_f64(1000.0);
        let new = Price::from_f64(650.0);
        assert_eq!(Price::drop_amount(old, new), 350.0);
        assert!((Price::drop_ratio(old, new) - 0.35).abs() < 1e-12);

        // Price rose: negative drop
        assert_eq!(Price::drop_amount(new, old), -350.0);

        // No baseline: ratio guarded
        assert_eq!(Price::drop_ratio(Price(0), new), 0.0);
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&Price::from_f64(89.9)).unwrap();
        assert_eq!(json, "89.9");
    }
}
