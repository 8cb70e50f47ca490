//! Joins the global and per-user snapshots of one cycle.

use super::error::ExposureError;
use super::types::{MarketId, MarketSnapshot, SnapshotSet, UserMarketSnapshot};
use std::collections::BTreeMap;
use tracing::debug;

/// A market the user holds a position in, paired with its global state.
#[derive(Debug, Clone, Copy)]
pub struct RelevantMarket<'a> {
    pub market: &'a MarketSnapshot,
    pub user: &'a UserMarketSnapshot,
}

/// Markets where the user has an open position and global data is known.
///
/// Borrows from the [`SnapshotSet`] it was built from. Iteration is ordered by
/// market id, so repeated reductions of the same input list markets in the
/// same order.
#[derive(Debug, Clone)]
pub struct RelevantMarketSet<'a> {
    markets: BTreeMap<&'a MarketId, RelevantMarket<'a>>,
}

impl<'a> RelevantMarketSet<'a> {
    /// Filter out markets without a user position, then join on market id.
    pub fn reduce(snapshots: &'a SnapshotSet) -> Result<Self, ExposureError> {
        Self::join(&snapshots.market, &snapshots.user)
    }

    pub fn join(
        market: &'a BTreeMap<MarketId, MarketSnapshot>,
        user: &'a BTreeMap<MarketId, UserMarketSnapshot>,
    ) -> Result<Self, ExposureError> {
        let positions: BTreeMap<&MarketId, &UserMarketSnapshot> = user
            .iter()
            .filter(|(_, snapshot)| snapshot.has_position())
            .collect();

        if positions.is_empty() {
            return Err(ExposureError::NoUserPositions);
        }

        let markets: BTreeMap<&MarketId, RelevantMarket<'a>> = market
            .iter()
            .filter_map(|(id, market)| {
                positions
                    .get(id)
                    .map(|&user| (id, RelevantMarket { market, user }))
            })
            .collect();

        if markets.is_empty() {
            return Err(ExposureError::NoRelevantMarkets);
        }

        debug!(
            user_markets = user.len(),
            open_positions = positions.len(),
            relevant = markets.len(),
            "Reduced snapshots"
        );

        Ok(Self { markets })
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    pub fn contains(&self, id: &MarketId) -> bool {
        self.markets.contains_key(id)
    }

    pub fn get(&self, id: &MarketId) -> Option<&RelevantMarket<'a>> {
        self.markets.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a MarketId, &RelevantMarket<'a>)> + '_ {
        self.markets.iter().map(|(id, market)| (*id, market))
    }

    pub fn market_ids(&self) -> impl Iterator<Item = &'a MarketId> + '_ {
        self.markets.keys().copied()
    }
}
