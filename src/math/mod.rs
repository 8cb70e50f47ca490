//! Fixed-point arithmetic for market quantities.
//!
//! Every price, position size, collateral balance and leverage figure is a
//! [`FixedDecimal`]: a signed 128-bit integer with six implied decimal digits.
//! Exact arithmetic lives in `fixed`, human-readable rendering in `format`.

mod fixed;
mod format;

pub use fixed::{FixedDecimal, MathError};
pub use format::format_usd_float;
