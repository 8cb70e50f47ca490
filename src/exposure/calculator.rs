//! Maker exposure derivation.
//!
//! A maker absorbs the market's long/short imbalance in proportion to its
//! share of the maker pool:
//!
//! ```text
//! exposure = (global_long - global_short) * user_maker / global_maker
//! ```
//!
//! The result is in payoff units of the underlying. Its USD value is a
//! display-only float.

use super::error::ExposureError;
use super::reducer::{RelevantMarket, RelevantMarketSet};
use super::types::{ExposureResult, MarketId, PositionView, Side};
use crate::math::{FixedDecimal, MathError};
use tracing::{debug, instrument};

/// Significant figures used for quantities in results.
pub const QUANTITY_SIG_FIGS: u32 = 6;

/// Inputs to [`calc_maker_exposure`] for one market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MakerPosition {
    pub user_maker: FixedDecimal,
    pub global_maker: FixedDecimal,
    pub global_long: FixedDecimal,
    pub global_short: FixedDecimal,
}

/// The user's share of the market's net skew.
///
/// Returns zero when the maker pool is empty, since there is no pool to
/// share. Positive means long-side exposure, negative short-side.
pub fn calc_maker_exposure(
    user_maker: FixedDecimal,
    global_maker: FixedDecimal,
    global_long: FixedDecimal,
    global_short: FixedDecimal,
) -> Result<FixedDecimal, MathError> {
    if global_maker.is_zero() {
        return Ok(FixedDecimal::ZERO);
    }

    let net_skew = global_long.checked_sub(global_short)?;
    net_skew.mul_fraction(user_maker, global_maker)
}

/// USD value of an exposure. Display only.
pub fn usd_maker_exposure(exposure: FixedDecimal, price: FixedDecimal) -> f64 {
    exposure.to_unsafe_float() * price.to_unsafe_float()
}

/// Bundle price, position, collateral and leverage into display strings.
pub fn calculate_market_statistics(
    market_id: &MarketId,
    price: FixedDecimal,
    position: &MakerPosition,
    collateral: FixedDecimal,
    leverage: FixedDecimal,
) -> Result<ExposureResult, ExposureError> {
    let exposure = calc_maker_exposure(
        position.user_maker,
        position.global_maker,
        position.global_long,
        position.global_short,
    )?;

    Ok(ExposureResult {
        market_id: market_id.clone(),
        price,
        usd_price: price.format_usd_price(),
        maker_quantity: position.user_maker.format(QUANTITY_SIG_FIGS),
        maker_exposure: exposure.format(QUANTITY_SIG_FIGS),
        usd_maker_exposure: usd_maker_exposure(exposure, price),
        collateral_usd: collateral.format_usd_price(),
        leverage: leverage.to_float_string(),
    })
}

/// Computes [`ExposureResult`]s from reduced snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExposureCalculator {
    view: PositionView,
}

impl ExposureCalculator {
    pub fn new(view: PositionView) -> Self {
        Self { view }
    }

    /// Statistics for one joined market, after checking the pair is usable.
    pub fn market_statistics(
        &self,
        relevant: &RelevantMarket<'_>,
    ) -> Result<ExposureResult, ExposureError> {
        let RelevantMarket { market, user } = *relevant;
        let id = &market.market_id;

        if user.market_id != *id {
            return Err(ExposureError::invalid(
                id,
                format!("user snapshot belongs to market {}", user.market_id),
            ));
        }
        if user.side == Side::None {
            return Err(ExposureError::invalid(id, "user has no open position"));
        }

        let global = market.position(self.view);
        if let Some(field) = global.negative_field() {
            return Err(ExposureError::invalid(id, format!("negative global {field}")));
        }
        if let Some(field) = user.next_position.negative_field() {
            return Err(ExposureError::invalid(id, format!("negative user {field}")));
        }

        let position = MakerPosition {
            user_maker: user.next_position.maker,
            global_maker: global.maker,
            global_long: global.long,
            global_short: global.short,
        };

        let result = calculate_market_statistics(
            id,
            market.latest_price,
            &position,
            user.collateral,
            user.next_leverage,
        )?;

        debug!(
            market = %id,
            maker = %result.maker_quantity,
            exposure = %result.maker_exposure,
            usd_exposure = result.usd_maker_exposure,
            "Computed maker exposure"
        );

        Ok(result)
    }

    /// Statistics for every market in the set, in set order.
    #[instrument(skip_all, fields(markets = relevant.len()))]
    pub fn calculate_all(
        &self,
        relevant: &RelevantMarketSet<'_>,
    ) -> Result<Vec<ExposureResult>, ExposureError> {
        relevant
            .iter()
            .map(|(_, market)| self.market_statistics(market))
            .collect()
    }
}
