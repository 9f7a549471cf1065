//! Fixed-point token amounts.
//!
//! An [`Asset`] is a signed integer amount of the smallest unit of a
//! [`Symbol`]; the symbol's precision only affects formatting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest representable asset amount (2^62 - 1).
pub const MAX_ASSET_AMOUNT: i64 = (1 << 62) - 1;

/// Maximum number of characters in a symbol code.
pub const SYMBOL_CODE_MAX_LEN: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("symbol code {0:?} must be 1-7 uppercase letters")]
    InvalidSymbolCode(String),
    #[error("symbol precision {0} exceeds 18")]
    InvalidPrecision(u8),
    #[error("malformed symbol {0:?}, expected \"<precision>,<CODE>\"")]
    MalformedSymbol(String),
    #[error("malformed asset {0:?}")]
    MalformedAsset(String),
    #[error("asset amount out of range")]
    OutOfRange,
    #[error("symbol mismatch: {left} vs {right}")]
    SymbolMismatch { left: Symbol, right: Symbol },
}

/// Token denomination: an uppercase code plus decimal precision, packed into
/// 64 bits (precision in the low byte, code characters above it).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(u64);

impl Symbol {
    pub fn new(code: &str, precision: u8) -> Result<Self, AssetError> {
        if code.is_empty()
            || code.len() > SYMBOL_CODE_MAX_LEN
            || !code.bytes().all(|b| b.is_ascii_uppercase())
        {
            return Err(AssetError::InvalidSymbolCode(code.to_string()));
        }
        if precision > 18 {
            return Err(AssetError::InvalidPrecision(precision));
        }

        let mut raw = 0u64;
        for (i, b) in code.bytes().enumerate() {
            raw |= (b as u64) << (8 * (i + 1));
        }
        Ok(Symbol(raw | precision as u64))
    }

    pub const fn from_raw(raw: u64) -> Self {
        Symbol(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub fn precision(self) -> u8 {
        (self.0 & 0xff) as u8
    }

    pub fn code(self) -> String {
        let mut code = String::with_capacity(SYMBOL_CODE_MAX_LEN);
        let mut tmp = self.0 >> 8;
        while tmp & 0xff != 0 {
            code.push((tmp & 0xff) as u8 as char);
            tmp >>= 8;
        }
        code
    }

    fn unit(self) -> i64 {
        10i64.pow(self.precision() as u32)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision(), self.code())
    }
}

impl FromStr for Symbol {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (precision, code) = s
            .split_once(',')
            .ok_or_else(|| AssetError::MalformedSymbol(s.to_string()))?;
        let precision = precision
            .trim()
            .parse::<u8>()
            .map_err(|_| AssetError::MalformedSymbol(s.to_string()))?;
        Symbol::new(code.trim(), precision)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Symbol {
    type Error = AssetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A signed amount of a given symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Asset {
    pub amount: i64,
    pub symbol: Symbol,
}

impl Asset {
    pub fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }

    pub fn zero(symbol: Symbol) -> Self {
        Self { amount: 0, symbol }
    }

    pub fn is_amount_within_range(&self) -> bool {
        (-MAX_ASSET_AMOUNT..=MAX_ASSET_AMOUNT).contains(&self.amount)
    }

    pub fn checked_add(self, other: Asset) -> Result<Asset, AssetError> {
        self.ensure_same_symbol(&other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .filter(|a| a.abs() <= MAX_ASSET_AMOUNT)
            .ok_or(AssetError::OutOfRange)?;
        Ok(Asset::new(amount, self.symbol))
    }

    pub fn checked_sub(self, other: Asset) -> Result<Asset, AssetError> {
        self.ensure_same_symbol(&other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .filter(|a| a.abs() <= MAX_ASSET_AMOUNT)
            .ok_or(AssetError::OutOfRange)?;
        Ok(Asset::new(amount, self.symbol))
    }

    fn ensure_same_symbol(&self, other: &Asset) -> Result<(), AssetError> {
        if self.symbol != other.symbol {
            return Err(AssetError::SymbolMismatch {
                left: self.symbol,
                right: other.symbol,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = self.symbol.precision();
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        if precision == 0 {
            return write!(f, "{}{} {}", sign, abs, self.symbol.code());
        }
        let unit = self.symbol.unit() as u64;
        write!(
            f,
            "{}{}.{:0width$} {}",
            sign,
            abs / unit,
            abs % unit,
            self.symbol.code(),
            width = precision as usize
        )
    }
}

impl FromStr for Asset {
    type Err = AssetError;

    /// Parse `"12.3400 CELES"`; the number of fractional digits fixes the precision.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || AssetError::MalformedAsset(s.to_string());
        let (number, code) = s.trim().split_once(' ').ok_or_else(malformed)?;
        let (negative, digits) = match number.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, number),
        };
        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() || !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        let precision = u8::try_from(frac.len()).map_err(|_| malformed())?;
        let symbol = Symbol::new(code.trim(), precision)?;
        let whole: i64 = whole.parse().map_err(|_| AssetError::OutOfRange)?;
        let frac: i64 = if frac.is_empty() {
            0
        } else {
            frac.parse().map_err(|_| AssetError::OutOfRange)?
        };
        let amount = whole
            .checked_mul(symbol.unit())
            .and_then(|w| w.checked_add(frac))
            .filter(|a| *a <= MAX_ASSET_AMOUNT)
            .ok_or(AssetError::OutOfRange)?;

        Ok(Asset::new(if negative { -amount } else { amount }, symbol))
    }
}

impl From<Asset> for String {
    fn from(value: Asset) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Asset {
    type Error = AssetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> Symbol {
        Symbol::new("CELES", 4).unwrap()
    }

    #[test]
    fn symbol_packs_code_and_precision() {
        let sym = core();
        assert_eq!(sym.code(), "CELES");
        assert_eq!(sym.precision(), 4);
        assert_eq!(sym.to_string(), "4,CELES");
        assert_eq!("4,CELES".parse::<Symbol>().unwrap(), sym);
    }

    #[test]
    fn symbol_rejects_bad_codes() {
        assert!(Symbol::new("celes", 4).is_err());
        assert!(Symbol::new("TOOLONGX", 4).is_err());
        assert!(Symbol::new("", 0).is_err());
        assert!(Symbol::new("RAM", 19).is_err());
    }

    #[test]
    fn asset_display_and_parse() {
        let asset = Asset::new(12_345, core());
        assert_eq!(asset.to_string(), "1.2345 CELES");
        assert_eq!("1.2345 CELES".parse::<Asset>().unwrap(), asset);

        let bytes = Asset::new(4096, Symbol::new("RAM", 0).unwrap());
        assert_eq!(bytes.to_string(), "4096 RAM");
        assert_eq!("4096 RAM".parse::<Asset>().unwrap(), bytes);

        let negative = Asset::new(-5, core());
        assert_eq!(negative.to_string(), "-0.0005 CELES");
    }

    #[test]
    fn arithmetic_checks_symbols() {
        let a = Asset::new(10, core());
        let b = Asset::new(3, core());
        assert_eq!(a.checked_sub(b).unwrap().amount, 7);
        assert_eq!(a.checked_add(b).unwrap().amount, 13);

        let ram = Asset::new(3, Symbol::new("RAM", 0).unwrap());
        assert!(matches!(
            a.checked_add(ram),
            Err(AssetError::SymbolMismatch { .. })
        ));
        assert_eq!(
            Asset::new(MAX_ASSET_AMOUNT, core()).checked_add(b),
            Err(AssetError::OutOfRange)
        );
    }
}
