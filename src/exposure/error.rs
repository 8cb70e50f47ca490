//! Error kinds surfaced by the exposure pipeline.

use crate::math::MathError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExposureError {
    /// Malformed or inconsistent input handed to the calculator.
    #[error("invalid snapshot for market {market}: {reason}")]
    InvalidSnapshot { market: String, reason: String },

    /// The user holds no open position in any market.
    #[error("no user positions found")]
    NoUserPositions,

    /// None of the user's markets appear in the global snapshot.
    #[error("no relevant global markets found")]
    NoRelevantMarkets,

    /// The snapshot source could not deliver data for this cycle.
    #[error("snapshot data unavailable: {0}")]
    DataUnavailable(String),

    #[error("arithmetic error: {0}")]
    Math(#[from] MathError),
}

impl ExposureError {
    pub(crate) fn invalid(market: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidSnapshot {
            market: market.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the caller should wait for the next update instead of stopping.
    ///
    /// Empty results and fetch failures only spoil the current cycle.
    /// Arithmetic and validation failures mean the figures cannot be trusted.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NoUserPositions | Self::NoRelevantMarkets | Self::DataUnavailable(_)
        )
    }
}
