//! JSON snapshot file source.

use super::traits::SnapshotSource;
use crate::exposure::{Address, ExposureError, SnapshotSet};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Reads a [`SnapshotSet`] from a JSON file on every fetch.
///
/// The file is re-read each cycle so an external process can replace it.
/// The user address is not used: the file already holds one user's view.
#[derive(Debug, Clone)]
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotSource for FileSnapshotSource {
    fn name(&self) -> &'static str {
        "file"
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch_snapshots(&self, user: &Address) -> Result<SnapshotSet, ExposureError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ExposureError::DataUnavailable(format!("read {}: {e}", self.path.display()))
        })?;

        let snapshots: SnapshotSet = serde_json::from_str(&raw).map_err(|e| {
            ExposureError::DataUnavailable(format!("decode {}: {e}", self.path.display()))
        })?;

        debug!(
            %user,
            markets = snapshots.market.len(),
            user_markets = snapshots.user.len(),
            "Loaded snapshot file"
        );

        Ok(snapshots)
    }
}
