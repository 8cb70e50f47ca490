//! Recomputation loop.
//!
//! One fetch → reduce → calculate pass is a cycle. The loop runs a cycle per
//! batch of [`UpdateSignal`]s, so however many triggers fire at once the
//! computation stays single-threaded and each snapshot pair is processed by
//! exactly one cycle.

use crate::exposure::{
    Address, ExposureCalculator, ExposureError, ExposureResult, MarketId, RelevantMarketSet,
};
use crate::source::SnapshotSource;
use crate::watch::UpdateSignal;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};

/// What one cycle produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub results: Vec<ExposureResult>,
    /// Markets the user holds positions in, in report order.
    pub markets: Vec<MarketId>,
    /// Contracts of those markets, for log subscriptions.
    pub market_addresses: Vec<Address>,
}

pub struct ExposureMonitor {
    source: Arc<dyn SnapshotSource>,
    user: Address,
    calculator: ExposureCalculator,
}

impl ExposureMonitor {
    pub fn new(source: Arc<dyn SnapshotSource>, user: Address, calculator: ExposureCalculator) -> Self {
        Self {
            source,
            user,
            calculator,
        }
    }

    /// Fetch, reduce and calculate once.
    #[instrument(skip(self), fields(source = self.source.name(), user = %self.user))]
    pub async fn run_cycle(&self) -> Result<CycleReport, ExposureError> {
        let snapshots = self.source.fetch_snapshots(&self.user).await?;
        let relevant = RelevantMarketSet::reduce(&snapshots)?;
        let results = self.calculator.calculate_all(&relevant)?;

        let markets = relevant.market_ids().cloned().collect();
        let market_addresses = relevant.iter().map(|(_, pair)| pair.user.market).collect();

        info!(markets = results.len(), "Exposure cycle complete");

        Ok(CycleReport {
            results,
            markets,
            market_addresses,
        })
    }

    /// First cycle of a watch session.
    ///
    /// Empty results and fetch failures yield `None` instead of an error, so
    /// the caller can start its triggers and wait for data to appear.
    pub async fn initial_cycle(&self) -> Result<Option<CycleReport>, ExposureError> {
        match self.run_cycle().await {
            Ok(report) => Ok(Some(report)),
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "No report yet, waiting for the first update");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Recompute on every batch of signals until all senders are dropped.
    ///
    /// Empty results and fetch failures are logged and the loop waits for the
    /// next signal. Any other error stops the loop and is returned. On a clean
    /// shutdown, returns the number of cycles that produced a report.
    pub async fn run<F>(
        &self,
        mut updates: mpsc::Receiver<UpdateSignal>,
        mut on_report: F,
    ) -> Result<u64, ExposureError>
    where
        F: FnMut(&CycleReport),
    {
        let mut reports = 0u64;

        while let Some(signal) = updates.recv().await {
            let mut coalesced = 0usize;
            while updates.try_recv().is_ok() {
                coalesced += 1;
            }
            info!(?signal, coalesced, "Detected update, recomputing");

            match self.run_cycle().await {
                Ok(report) => {
                    reports += 1;
                    on_report(&report);
                }
                Err(e) if e.is_recoverable() => {
                    warn!(error = %e, "No report this cycle, waiting for next update");
                }
                Err(e) => {
                    error!(error = %e, "Exposure computation failed");
                    return Err(e);
                }
            }
        }

        info!(reports, "Update channel closed, monitor stopping");
        Ok(reports)
    }
}
