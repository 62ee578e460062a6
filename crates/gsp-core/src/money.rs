//! # Money and Quantities — Integer Representations
//!
//! Monetary amounts are integer centavos and quantities are integer
//! hundredths. Floating point never touches an amount: `DECIMAL(12,2)`
//! and `DECIMAL(10,2)` columns round-trip as `i64` values scaled by 100,
//! and display formatting produces the pt-BR forms the proposal
//! documents use (`R$ 1.234,56`, `2,50`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error parsing a decimal string into an integer-scaled value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountParseError {
    /// The string is not a decimal number with at most two fraction digits.
    #[error("invalid amount {0:?}: expected a decimal with up to two fraction digits")]
    Malformed(String),
    /// The value exceeds the representable range.
    #[error("amount {0:?} out of range")]
    OutOfRange(String),
}

/// A BRL amount in centavos.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Money(pub i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// From whole centavos.
    pub fn from_centavos(centavos: i64) -> Self {
        Self(centavos)
    }

    /// Parse a dot-decimal string (`"1234.56"`, `"7"`, `"-0.50"`) into
    /// centavos. This is the form `DECIMAL` columns serialize to.
    pub fn parse(s: &str) -> Result<Self, AmountParseError> {
        parse_scaled(s, 100).map(Self)
    }

    pub fn centavos(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Checked addition.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Checked subtraction.
    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Dot-decimal form with two fraction digits (`"1234.56"`), the
    /// representation written back to `DECIMAL` columns.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }

    /// pt-BR display form with currency symbol: `R$ 1.234,56`.
    pub fn format_brl(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let reais = group_thousands(abs / 100);
        format!("{sign}R$ {reais},{:02}", abs % 100)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_brl())
    }
}

/// An item quantity in hundredths (`250` = 2.50 units).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Quantity(pub i64);

impl Quantity {
    pub const ONE: Quantity = Quantity(100);

    pub fn from_hundredths(hundredths: i64) -> Self {
        Self(hundredths)
    }

    /// Parse a dot-decimal string into hundredths.
    pub fn parse(s: &str) -> Result<Self, AmountParseError> {
        parse_scaled(s, 100).map(Self)
    }

    pub fn hundredths(&self) -> i64 {
        self.0
    }

    /// Line total of this quantity at the given unit price, rounded to
    /// the nearest centavo, half away from zero.
    pub fn line_total(&self, unit_price: Money) -> Money {
        let numer = (self.0 as i128) * (unit_price.0 as i128);
        let rounded = if numer >= 0 {
            (numer + 50) / 100
        } else {
            (numer - 50) / 100
        };
        Money(rounded as i64)
    }

    /// Dot-decimal form (`"2.50"`) for `DECIMAL` columns.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{sign}{}.{:02}", abs / 100, abs % 100)
    }

    /// pt-BR display form with comma separator (`"2,50"`).
    pub fn format_br(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{sign}{},{:02}", abs / 100, abs % 100)
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_br())
    }
}

/// Parse `s` as a decimal with up to two fraction digits, returning the
/// value scaled by `scale` (100 for centavos/hundredths).
fn parse_scaled(s: &str, scale: i64) -> Result<i64, AmountParseError> {
    let trimmed = s.trim();
    let malformed = || AmountParseError::Malformed(s.to_string());

    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    if digits.is_empty() {
        return Err(malformed());
    }

    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(malformed());
    }
    if frac.len() > 2
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !frac.chars().all(|c| c.is_ascii_digit())
    {
        return Err(malformed());
    }

    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| AmountParseError::OutOfRange(s.to_string()))?
    };
    let frac_value: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| malformed())? * 10,
        _ => frac.parse().map_err(|_| malformed())?,
    };

    let magnitude = whole_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(|| AmountParseError::OutOfRange(s.to_string()))?;

    Ok(if negative { -magnitude } else { magnitude })
}

/// Group a non-negative integer with pt-BR thousands separators
/// (`1234567` → `"1.234.567"`).
fn group_thousands(mut value: u64) -> String {
    if value < 1000 {
        return value.to_string();
    }
    let mut groups = Vec::new();
    while value >= 1000 {
        groups.push(format!("{:03}", value % 1000));
        value /= 1000;
    }
    let mut out = value.to_string();
    for group in groups.iter().rev() {
        out.push('.');
        out.push_str(group);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_brl() {
        assert_eq!(Money(123_456).format_brl(), "R$ 1.234,56");
        assert_eq!(Money(0).format_brl(), "R$ 0,00");
        assert_eq!(Money(999).format_brl(), "R$ 9,99");
        assert_eq!(Money(100_000_000).format_brl(), "R$ 1.000.000,00");
        assert_eq!(Money(-2550).format_brl(), "-R$ 25,50");
    }

    #[test]
    fn test_parse_money() {
        assert_eq!(Money::parse("1234.56").unwrap(), Money(123_456));
        assert_eq!(Money::parse("7").unwrap(), Money(700));
        assert_eq!(Money::parse("0.5").unwrap(), Money(50));
        assert_eq!(Money::parse("-0.50").unwrap(), Money(-50));
        assert!(Money::parse("1,50").is_err());
        assert!(Money::parse("1.234").is_err());
        assert!(Money::parse("abc").is_err());
        assert!(Money::parse("").is_err());
    }

    #[test]
    fn test_decimal_string_roundtrip() {
        for centavos in [0_i64, 1, 99, 100, 123_456, -250] {
            let m = Money(centavos);
            assert_eq!(Money::parse(&m.to_decimal_string()).unwrap(), m);
        }
    }

    #[test]
    fn test_quantity_format() {
        assert_eq!(Quantity(250).format_br(), "2,50");
        assert_eq!(Quantity(100).format_br(), "1,00");
        assert_eq!(Quantity(0).format_br(), "0,00");
    }

    #[test]
    fn test_line_total_rounds_to_nearest_centavo() {
        // 2.50 × R$ 10,00 = R$ 25,00
        assert_eq!(Quantity(250).line_total(Money(1000)), Money(2500));
        // 0.33 × R$ 0,50 = R$ 0,165 → R$ 0,17
        assert_eq!(Quantity(33).line_total(Money(50)), Money(17));
        // 1.00 × price is identity
        assert_eq!(Quantity::ONE.line_total(Money(4999)), Money(4999));
    }

    #[test]
    fn test_checked_add() {
        assert_eq!(Money(100).checked_add(Money(50)), Some(Money(150)));
        assert_eq!(Money(i64::MAX).checked_add(Money(1)), None);
    }

    proptest! {
        #[test]
        fn prop_decimal_string_roundtrips(centavos in -1_000_000_000_000_i64..1_000_000_000_000) {
            let m = Money(centavos);
            prop_assert_eq!(Money::parse(&m.to_decimal_string()).unwrap(), m);
        }

        #[test]
        fn prop_line_total_scales_with_whole_quantities(units in 0_i64..10_000, price in 0_i64..1_000_000) {
            let qty = Quantity(units * 100);
            prop_assert_eq!(qty.line_total(Money(price)), Money(units * price));
        }
    }
}
