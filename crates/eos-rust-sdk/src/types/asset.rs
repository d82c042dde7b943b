//! Token quantities such as `"1.0000 EOS"`.

use crate::error::{EosError, EosResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Longest symbol code that fits next to the precision byte.
pub const MAX_SYMBOL_LENGTH: usize = 7;

/// An amount of a token, with the precision taken from the decimal places
/// of its textual form.
///
/// # Example
///
/// ```rust
/// use eos_rust_sdk::types::Asset;
///
/// let asset: Asset = "1.0000 EOS".parse().unwrap();
/// assert_eq!(asset.amount(), 10_000);
/// assert_eq!(asset.precision(), 4);
/// assert_eq!(asset.to_string(), "1.0000 EOS");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Asset {
    amount: i64,
    precision: u8,
    symbol: String,
}

impl Asset {
    /// Creates an asset from a raw amount in the smallest unit.
    pub fn new(amount: i64, precision: u8, symbol: impl Into<String>) -> EosResult<Self> {
        let symbol = symbol.into();
        validate_symbol(&symbol)?;
        if precision > 18 {
            return Err(EosError::serialization(format!(
                "asset precision {precision} is too large"
            )));
        }
        Ok(Self {
            amount,
            precision,
            symbol,
        })
    }

    /// Amount in the smallest unit.
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// Number of decimal places.
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Symbol code, e.g. `EOS`.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Packs the precision and symbol code into the `u64` wire form.
    pub fn symbol_code(&self) -> u64 {
        self.symbol
            .bytes()
            .enumerate()
            .fold(u64::from(self.precision), |acc, (i, c)| {
                acc | (u64::from(c) << (8 * (i + 1)))
            })
    }
}

fn validate_symbol(symbol: &str) -> EosResult<()> {
    if symbol.is_empty()
        || symbol.len() > MAX_SYMBOL_LENGTH
        || !symbol.bytes().all(|c| c.is_ascii_uppercase())
    {
        return Err(EosError::serialization(format!(
            "invalid asset symbol '{symbol}'"
        )));
    }
    Ok(())
}

impl FromStr for Asset {
    type Err = EosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (quantity, symbol) = s
            .trim()
            .split_once(' ')
            .ok_or_else(|| EosError::serialization(format!("invalid asset '{s}'")))?;
        let symbol = symbol.trim();

        let (negative, quantity) = match quantity.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, quantity),
        };
        let (whole, fraction) = quantity.split_once('.').unwrap_or((quantity, ""));
        if whole.is_empty() || !(whole.bytes().chain(fraction.bytes())).all(|c| c.is_ascii_digit())
        {
            return Err(EosError::serialization(format!("invalid asset '{s}'")));
        }

        let precision = u8::try_from(fraction.len())
            .map_err(|_| EosError::serialization(format!("invalid asset '{s}'")))?;
        let digits = format!("{whole}{fraction}");
        let magnitude: i64 = digits
            .parse()
            .map_err(|_| EosError::serialization(format!("asset amount out of range '{s}'")))?;
        let amount = if negative { -magnitude } else { magnitude };

        Self::new(amount, precision, symbol)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let magnitude = self.amount.unsigned_abs();
        if self.precision == 0 {
            return write!(f, "{sign}{magnitude} {}", self.symbol);
        }
        let scale = 10u64.pow(u32::from(self.precision));
        write!(
            f,
            "{sign}{}.{:0width$} {}",
            magnitude / scale,
            magnitude % scale,
            self.symbol,
            width = usize::from(self.precision)
        )
    }
}

impl Serialize for Asset {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let asset: Asset = "1.0000 EOS".parse().unwrap();
        assert_eq!(asset.amount(), 10_000);
        assert_eq!(asset.precision(), 4);
        assert_eq!(asset.symbol(), "EOS");
        assert_eq!(asset.to_string(), "1.0000 EOS");

        let negative: Asset = "-0.5 SYS".parse().unwrap();
        assert_eq!(negative.amount(), -5);
        assert_eq!(negative.to_string(), "-0.5 SYS");

        let whole: Asset = "12 TOK".parse().unwrap();
        assert_eq!(whole.precision(), 0);
        assert_eq!(whole.to_string(), "12 TOK");
    }

    #[test]
    fn test_symbol_code() {
        let asset: Asset = "1.0000 EOS".parse().unwrap();
        let expected = 4u64 | (u64::from(b'E') << 8) | (u64::from(b'O') << 16) | (u64::from(b'S') << 24);
        assert_eq!(asset.symbol_code(), expected);
    }

    #[test]
    fn test_invalid_assets() {
        assert!("1.0000".parse::<Asset>().is_err());
        assert!("1.0000 eos".parse::<Asset>().is_err());
        assert!("abc EOS".parse::<Asset>().is_err());
        assert!("1.0 TOOLONGSYM".parse::<Asset>().is_err());
    }
}
