//! In-memory snapshot source for tests and dry runs.

use super::traits::SnapshotSource;
use crate::exposure::{Address, ExposureError, SnapshotSet};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Serves whatever snapshot was last stored, or fails while none is set.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotSource {
    snapshots: Arc<RwLock<Option<SnapshotSet>>>,
    fetches: Arc<AtomicU64>,
}

impl MemorySnapshotSource {
    pub fn new(snapshots: SnapshotSet) -> Self {
        Self {
            snapshots: Arc::new(RwLock::new(Some(snapshots))),
            fetches: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Replace the served snapshot, as a new fetch cycle would.
    pub async fn set(&self, snapshots: SnapshotSet) {
        *self.snapshots.write().await = Some(snapshots);
    }

    /// Make subsequent fetches fail.
    pub async fn clear(&self) {
        *self.snapshots.write().await = None;
    }

    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSource for MemorySnapshotSource {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch_snapshots(&self, user: &Address) -> Result<SnapshotSet, ExposureError> {
        let count = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(%user, count, "Serving in-memory snapshot");

        self.snapshots
            .read()
            .await
            .clone()
            .ok_or_else(|| ExposureError::DataUnavailable("no snapshot loaded".to_string()))
    }
}
