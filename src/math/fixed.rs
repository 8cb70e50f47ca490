//! Scaled-integer decimal type with six implied digits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Arithmetic failures. Never saturated: a wrong exposure figure is worse
/// than no figure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("fixed-point overflow")]
    Overflow,

    #[error("division by zero")]
    DivisionByZero,

    #[error("cannot parse '{0}' as a fixed-point decimal")]
    Parse(String),
}

/// A signed decimal stored as an integer scaled by 10^6.
///
/// `FixedDecimal::from_raw(1_500_000)` is `1.5`. Addition and subtraction are
/// exact; the only lossy operations are [`FixedDecimal::mul_fraction`] (one
/// truncation toward zero) and the display conversions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FixedDecimal(i128);

impl FixedDecimal {
    /// Number of implied decimal digits.
    pub const DECIMALS: u32 = 6;
    /// Raw units per whole unit.
    pub const SCALE: i128 = 1_000_000;

    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(Self::SCALE);

    /// Wrap an already-scaled integer.
    pub const fn from_raw(raw: i128) -> Self {
        Self(raw)
    }

    /// The scaled integer representation.
    pub const fn raw(self) -> i128 {
        self.0
    }

    /// Whole units, e.g. `from_units(100)` is `100.000000`.
    pub fn from_units(units: i64) -> Self {
        // i64::MAX * 10^6 is far below i128::MAX
        Self(i128::from(units) * Self::SCALE)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, MathError> {
        self.0.checked_add(rhs.0).map(Self).ok_or(MathError::Overflow)
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self, MathError> {
        self.0.checked_sub(rhs.0).map(Self).ok_or(MathError::Overflow)
    }

    pub fn checked_neg(self) -> Result<Self, MathError> {
        self.0.checked_neg().map(Self).ok_or(MathError::Overflow)
    }

    /// Compute `self * numerator / denominator`.
    ///
    /// The numerator and denominator share the same scale, so the scale
    /// cancels and the result keeps `self`'s scale. The product is formed
    /// before dividing and the single division truncates toward zero.
    pub fn mul_fraction(self, numerator: Self, denominator: Self) -> Result<Self, MathError> {
        if denominator.is_zero() {
            return Err(MathError::DivisionByZero);
        }

        let product = self.0.checked_mul(numerator.0).ok_or(MathError::Overflow)?;
        product
            .checked_div(denominator.0)
            .map(Self)
            .ok_or(MathError::Overflow)
    }

    /// Lossy conversion for display and analytics only.
    ///
    /// Results must never be fed back into `FixedDecimal` arithmetic.
    pub fn to_unsafe_float(self) -> f64 {
        let whole = self.0 / Self::SCALE;
        let frac = self.0 % Self::SCALE;
        whole as f64 + frac as f64 / Self::SCALE as f64
    }

    /// Parse a plain decimal string such as `"-1234.5"`.
    ///
    /// Accepts an optional sign, ASCII digits and at most one decimal point.
    /// Digits past the sixth decimal place are truncated toward zero. Every
    /// value this type can hold parses, including `i128::MIN`.
    pub fn parse(input: &str) -> Result<Self, MathError> {
        let trimmed = input.trim();
        let invalid = || MathError::Parse(trimmed.to_string());

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let decimals = Self::DECIMALS as usize;
        let kept = &frac[..frac.len().min(decimals)];
        let padding = std::iter::repeat(b'0').take(decimals - kept.len());

        let mut magnitude: u128 = 0;
        for digit in whole.bytes().chain(kept.bytes()).chain(padding) {
            magnitude = magnitude
                .checked_mul(10)
                .and_then(|m| m.checked_add(u128::from(digit - b'0')))
                .ok_or(MathError::Overflow)?;
        }

        let raw = if negative {
            0i128.checked_sub_unsigned(magnitude)
        } else {
            0i128.checked_add_unsigned(magnitude)
        };
        raw.map(Self).ok_or(MathError::Overflow)
    }

    /// Exact decimal rendering with trailing fractional zeros removed.
    ///
    /// `2.500000` renders as `2.5`, `3.000000` as `3`.
    pub fn to_float_string(self) -> String {
        render_magnitude(self.is_negative(), self.0.unsigned_abs())
    }
}

/// Render an unsigned scaled magnitude with an optional minus sign.
pub(super) fn render_magnitude(negative: bool, magnitude: u128) -> String {
    let scale = FixedDecimal::SCALE.unsigned_abs();
    let whole = magnitude / scale;
    let frac = magnitude % scale;
    let sign = if negative && magnitude != 0 { "-" } else { "" };

    if frac == 0 {
        return format!("{sign}{whole}");
    }

    let digits = format!("{frac:06}");
    format!("{sign}{whole}.{}", digits.trim_end_matches('0'))
}

impl fmt::Display for FixedDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_float_string())
    }
}

impl FromStr for FixedDecimal {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FixedDecimal {
    type Error = MathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FixedDecimal> for String {
    fn from(value: FixedDecimal) -> Self {
        value.to_float_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fd(s: &str) -> FixedDecimal {
        FixedDecimal::parse(s).unwrap()
    }

    #[test]
    fn test_parse() {
        assert_eq!(fd("1000").raw(), 1_000_000_000);
        assert_eq!(fd("1.5").raw(), 1_500_000);
        assert_eq!(fd("-0.000001").raw(), -1);
        assert_eq!(fd(" 42.000000 ").raw(), 42_000_000);
        // Truncated toward zero past six decimals
        assert_eq!(fd("0.0000019").raw(), 1);
        assert_eq!(fd("-0.0000019").raw(), -1);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(FixedDecimal::parse("abc"), Err(MathError::Parse(_))));
        assert!(matches!(FixedDecimal::parse(""), Err(MathError::Parse(_))));
        assert!(matches!(FixedDecimal::parse("1,000"), Err(MathError::Parse(_))));
        assert!(matches!(FixedDecimal::parse("1_000"), Err(MathError::Parse(_))));
        assert!(matches!(FixedDecimal::parse("1e5"), Err(MathError::Parse(_))));
        assert!(matches!(FixedDecimal::parse("1.2.3"), Err(MathError::Parse(_))));
        assert!(matches!(FixedDecimal::parse("-"), Err(MathError::Parse(_))));
        assert!(matches!(FixedDecimal::parse("."), Err(MathError::Parse(_))));
        assert!(matches!(FixedDecimal::parse("--1"), Err(MathError::Parse(_))));
    }

    #[test]
    fn test_parse_truncates_long_fractions() {
        assert_eq!(fd("0.123456789012345678901234567891").raw(), 123_456);
        assert_eq!(fd("-7.9999999999999999999999999999999").raw(), -7_999_999);
        assert_eq!(fd(".5").raw(), 500_000);
        assert_eq!(fd("+2.").raw(), 2_000_000);
    }

    #[test]
    fn test_parse_agrees_with_rust_decimal() {
        for (text, expected) in [
            ("1234.5678", dec!(1234.5678)),
            ("-0.000001", dec!(-0.000001)),
            ("98765432109876543210.5", dec!(98765432109876543210.5)),
        ] {
            assert_eq!(fd(text).to_float_string(), expected.normalize().to_string());
        }
    }

    #[test]
    fn test_parse_full_range() {
        for raw in [i128::MAX, i128::MIN, 10i128.pow(35), -(10i128.pow(35)) + 1, 0] {
            let value = FixedDecimal::from_raw(raw);
            assert_eq!(fd(&value.to_float_string()), value, "raw {raw}");

            let formatted = value.format(6);
            assert_eq!(fd(&formatted).format(6), formatted, "raw {raw}");
        }
        assert_eq!(fd("100000000000000000000000000000").raw(), 10i128.pow(35));
    }

    #[test]
    fn test_parse_out_of_range() {
        // One past i128::MAX / 10^6
        assert_eq!(
            FixedDecimal::parse("170141183460469231731687303715885"),
            Err(MathError::Overflow)
        );
        assert_eq!(
            FixedDecimal::parse("-170141183460469231731687303715885"),
            Err(MathError::Overflow)
        );
        assert_eq!(FixedDecimal::parse(&"9".repeat(50)), Err(MathError::Overflow));
    }

    #[test]
    fn test_add_sub_exact() {
        assert_eq!(fd("0.1").checked_add(fd("0.2")).unwrap(), fd("0.3"));
        assert_eq!(fd("150").checked_sub(fd("50")).unwrap(), fd("100"));
        assert_eq!(fd("50").checked_sub(fd("150")).unwrap(), fd("-100"));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let max = FixedDecimal::from_raw(i128::MAX);
        assert_eq!(max.checked_add(FixedDecimal::from_raw(1)), Err(MathError::Overflow));
        let min = FixedDecimal::from_raw(i128::MIN);
        assert_eq!(min.checked_sub(FixedDecimal::from_raw(1)), Err(MathError::Overflow));
        assert_eq!(min.checked_neg(), Err(MathError::Overflow));
        assert_eq!(
            max.mul_fraction(FixedDecimal::from_units(2), FixedDecimal::ONE),
            Err(MathError::Overflow)
        );
    }

    #[test]
    fn test_mul_fraction() {
        // 100 * 10 / 100 = 10
        assert_eq!(
            fd("100").mul_fraction(fd("10"), fd("100")).unwrap(),
            fd("10")
        );
        // Single truncation at the end: 1 * 2 / 3 = 0.666666
        assert_eq!(fd("1").mul_fraction(fd("2"), fd("3")).unwrap(), fd("0.666666"));
        assert_eq!(fd("-1").mul_fraction(fd("2"), fd("3")).unwrap(), fd("-0.666666"));
    }

    #[test]
    fn test_mul_fraction_keeps_precision_of_small_shares() {
        // Dividing first would truncate 0.000001 / 3 to zero.
        let result = fd("3000000")
            .mul_fraction(fd("0.000001"), fd("3"))
            .unwrap();
        assert_eq!(result, fd("1"));
    }

    #[test]
    fn test_mul_fraction_zero_denominator() {
        assert_eq!(
            fd("1").mul_fraction(fd("1"), FixedDecimal::ZERO),
            Err(MathError::DivisionByZero)
        );
    }

    #[test]
    fn test_to_unsafe_float() {
        assert_eq!(fd("1000").to_unsafe_float(), 1000.0);
        assert!((fd("-2.5").to_unsafe_float() + 2.5).abs() < f64::EPSILON);
        assert!((fd("0.000001").to_unsafe_float() - 1e-6).abs() < 1e-15);
    }

    #[test]
    fn test_to_float_string() {
        assert_eq!(fd("2.5").to_float_string(), "2.5");
        assert_eq!(fd("3").to_float_string(), "3");
        assert_eq!(fd("-1.25").to_float_string(), "-1.25");
        assert_eq!(fd("0.000001").to_float_string(), "0.000001");
        assert_eq!(FixedDecimal::ZERO.to_float_string(), "0");
    }

    #[test]
    fn test_serde_as_decimal_string() {
        let value: FixedDecimal = serde_json::from_str("\"12.75\"").unwrap();
        assert_eq!(value, fd("12.75"));
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"12.75\"");
        assert!(serde_json::from_str::<FixedDecimal>("\"twelve\"").is_err());
    }
}
