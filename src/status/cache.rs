//! Single-slot status cache

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use super::StatusSnapshot;
use super::aggregator::Aggregator;

struct CacheEntry {
    timestamp: Instant,
    snapshot: Arc<StatusSnapshot>,
}

/// Memoizes the latest snapshot for the freshness window
///
/// Starts empty and is replaced wholesale on every recomputation. The slot
/// lock is held across a refresh, so requests arriving after expiry wait for
/// the one refresh in flight instead of each hitting the gateway.
pub struct StatusCache {
    aggregator: Aggregator,
    freshness: Duration,
    slot: Mutex<Option<CacheEntry>>,
}

impl StatusCache {
    pub fn new(aggregator: Aggregator, freshness: Duration) -> Self {
        Self {
            aggregator,
            freshness,
            slot: Mutex::new(None),
        }
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// Cached snapshot if still fresh, otherwise a newly computed one
    pub async fn get(&self) -> Arc<StatusSnapshot> {
        let mut slot = self.slot.lock().await;
        // the window starts when the refresh starts, not when it finishes
        let now = Instant::now();

        if let Some(entry) = slot.as_ref() {
            if now.duration_since(entry.timestamp) < self.freshness {
                tracing::debug!("status cache hit");
                return entry.snapshot.clone();
            }
        }

        tracing::debug!("status cache miss, refreshing");
        let snapshot = Arc::new(self.aggregator.refresh().await);
        *slot = Some(CacheEntry {
            timestamp: now,
            snapshot: snapshot.clone(),
        });
        snapshot
    }
}
