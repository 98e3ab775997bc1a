//! Rate caching with TTL and single-flight refresh.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};

use fxwallet_common::{Currency, RateTable, Result, WalletError};

use crate::source::RateSource;

/// Configuration for the rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// Freshness window for a cached snapshot.
    pub ttl: Duration,
    /// Upper bound on a single source fetch.
    pub refresh_timeout: Duration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            refresh_timeout: Duration::from_secs(10),
        }
    }
}

/// An immutable table plus the instant it was fetched. Snapshots are
/// replaced wholesale, never mutated, so a reader always observes a
/// fully-consistent table.
#[derive(Debug)]
struct RateSnapshot {
    table: RateTable,
    taken_at: Instant,
}

/// TTL cache over a rate source.
///
/// Reads inside the freshness window take a shared snapshot read and
/// never touch the source. When the snapshot is stale, exactly one
/// caller refreshes while the rest wait on the gate and then observe
/// the swapped-in snapshot. A failed refresh serves the stale
/// snapshot when one exists; `RateUnavailable` is returned only when
/// no snapshot has ever been populated.
pub struct RateCache {
    source: Arc<dyn RateSource>,
    snapshot: RwLock<Option<Arc<RateSnapshot>>>,
    refresh_gate: Mutex<()>,
    config: RateCacheConfig,
}

impl RateCache {
    /// Create a cache with default configuration.
    pub fn new(source: Arc<dyn RateSource>) -> Self {
        Self::with_config(source, RateCacheConfig::default())
    }

    /// Create a cache with custom configuration.
    pub fn with_config(source: Arc<dyn RateSource>, config: RateCacheConfig) -> Self {
        Self {
            source,
            snapshot: RwLock::new(None),
            refresh_gate: Mutex::new(()),
            config,
        }
    }

    /// Derived conversion rate between two supported currencies.
    pub async fn rate(&self, from: Currency, to: Currency) -> Result<Decimal> {
        let table = self.table().await?;
        Ok(table.cross_rate(from, to))
    }

    /// The full conversion table, refreshed through the cache policy.
    pub async fn table(&self) -> Result<RateTable> {
        if let Some(snapshot) = self.fresh_snapshot() {
            return Ok(snapshot.table);
        }

        // Single-flight: one refresher per stale window. Waiters
        // re-check after the gate opens and serve the new snapshot
        // without issuing their own fetch.
        let _gate = self.refresh_gate.lock().await;
        if let Some(snapshot) = self.fresh_snapshot() {
            return Ok(snapshot.table);
        }

        match timeout(self.config.refresh_timeout, self.source.fetch_rates()).await {
            Ok(Ok(table)) if table.is_positive() => {
                let snapshot = Arc::new(RateSnapshot {
                    table,
                    taken_at: Instant::now(),
                });
                *self.snapshot.write() = Some(snapshot);
                debug!(source = self.source.name(), "Refreshed rate snapshot");
                Ok(table)
            }
            Ok(Ok(_)) => self.stale_or_unavailable("source returned non-positive rates"),
            Ok(Err(err)) => self.stale_or_unavailable(&err.to_string()),
            Err(_) => self.stale_or_unavailable("source fetch timed out"),
        }
    }

    fn fresh_snapshot(&self) -> Option<Arc<RateSnapshot>> {
        self.snapshot
            .read()
            .as_ref()
            .filter(|snapshot| snapshot.taken_at.elapsed() < self.config.ttl)
            .cloned()
    }

    fn stale_or_unavailable(&self, reason: &str) -> Result<RateTable> {
        let stale = self.snapshot.read().clone();
        match stale {
            Some(snapshot) => {
                warn!(
                    reason,
                    age_secs = snapshot.taken_at.elapsed().as_secs(),
                    "Refresh failed, serving stale rate snapshot"
                );
                Ok(snapshot.table)
            }
            None => Err(WalletError::RateUnavailable {
                reason: reason.to_string(),
            }),
        }
    }
}
