//! The data-source seam.

use crate::exposure::{Address, ExposureError, SnapshotSet};
use async_trait::async_trait;

/// Delivers the global and per-user snapshots of one fetch cycle.
///
/// Failures are reported as [`ExposureError::DataUnavailable`]. Sources do not
/// retry; the next update trigger is the retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    async fn fetch_snapshots(&self, user: &Address) -> Result<SnapshotSet, ExposureError>;
}
