//! # Maker Exposure
//!
//! Reports the directional exposure a liquidity provider ("maker") carries in
//! perpetual markets, recomputed whenever the markets update.
//!
//! ## Architecture
//!
//! - `math`: Fixed-point decimal arithmetic and formatting
//! - `exposure`: Snapshot model, snapshot join, and exposure calculation
//! - `report`: Text report rendering
//! - `source`: Snapshot data sources (file, HTTP, in-memory)
//! - `watch`: Update triggers (polling, market log subscriptions)
//! - `monitor`: The recomputation loop
//! - `config`: Configuration management and validation

pub mod config;
pub mod exposure;
pub mod math;
pub mod monitor;
pub mod report;
pub mod source;
pub mod watch;

pub use config::Config;
pub use math::FixedDecimal;
