//! Maker exposure pipeline.
//!
//! Each cycle: a [`SnapshotSet`] from the data source is reduced to the
//! markets the user holds positions in ([`RelevantMarketSet`]), then each
//! market is turned into an [`ExposureResult`] by the [`ExposureCalculator`].

mod calculator;
mod error;
mod reducer;
mod types;

pub use calculator::{
    calc_maker_exposure, calculate_market_statistics, usd_maker_exposure, ExposureCalculator,
    MakerPosition, QUANTITY_SIG_FIGS,
};
pub use error::ExposureError;
pub use reducer::{RelevantMarket, RelevantMarketSet};
pub use types::{
    Address, ExposureResult, MarketId, MarketSnapshot, Position, PositionView, Side, SnapshotSet,
    UserMarketSnapshot,
};
