//! Human-readable rendering of fixed-point values.

use super::fixed::{render_magnitude, FixedDecimal};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

// Rounding of `FixedDecimal` works on the u128 magnitude rather than
// `Decimal::round_sf_with_strategy`, whose 96-bit mantissa cannot hold the
// full i128 range.

impl FixedDecimal {
    /// Render with at most `significant_figures` significant digits.
    ///
    /// Rounds half away from zero. Trailing fractional zeros are dropped and
    /// no digit grouping is applied, so the output parses back to the rounded
    /// value. Integer digits past the requested precision become zeros
    /// (`123456789` at six figures is `123457000`).
    pub fn format(self, significant_figures: u32) -> String {
        let figures = significant_figures.max(1);
        let magnitude = self.raw().unsigned_abs();
        let digits = count_digits(magnitude);

        if digits <= figures {
            return render_magnitude(self.is_negative(), magnitude);
        }

        let divisor = 10u128.pow(digits - figures);
        let mut kept = magnitude / divisor;
        if (magnitude % divisor) * 2 >= divisor {
            kept += 1;
        }

        render_magnitude(self.is_negative(), kept * divisor)
    }

    /// USD rendering with two decimals and thousands grouping: `$1,234.57`.
    ///
    /// Rounds half away from zero on the exact value.
    pub fn format_usd_price(self) -> String {
        // One cent is 10^4 raw units
        let cent = 10_000u128;
        let cents = (self.raw().unsigned_abs() + cent / 2) / cent;
        let sign = if self.is_negative() && cents != 0 { "-" } else { "" };

        format!(
            "{sign}${}.{:02}",
            group_thousands(&(cents / 100).to_string()),
            cents % 100
        )
    }
}

/// USD rendering for display-only float figures, same layout as
/// [`FixedDecimal::format_usd_price`].
pub fn format_usd_float(value: f64) -> String {
    let Some(decimal) = Decimal::from_f64(value) else {
        // Non-finite, or beyond what `Decimal` holds
        return format!("${value}");
    };

    let cents = decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let rendered = format!("{:.2}", cents.abs());
    let (whole, frac) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));
    let sign = if cents.is_sign_negative() && !cents.is_zero() { "-" } else { "" };

    format!("{sign}${}.{frac}", group_thousands(whole))
}

fn count_digits(mut value: u128) -> u32 {
    let mut digits = 1;
    while value >= 10 {
        value /= 10;
        digits += 1;
    }
    digits
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
