//! Rate source trait and test double.

use async_trait::async_trait;
use fxwallet_common::{RateTable, Result};

/// Trait for external rate providers.
///
/// A source returns the full conversion table in one fetch; the cache
/// owns freshness, deduplication, and staleness policy.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &str;

    /// Fetch a full conversion table from the source.
    async fn fetch_rates(&self) -> Result<RateTable>;
}

/// Mock rate source for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateSource {
    name: String,
    table: parking_lot::Mutex<Option<RateTable>>,
    fail: std::sync::atomic::AtomicBool,
    fetch_delay: parking_lot::Mutex<Option<std::time::Duration>>,
    fetch_count: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateSource {
    /// Create a new mock source with no scripted table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: parking_lot::Mutex::new(None),
            fail: std::sync::atomic::AtomicBool::new(false),
            fetch_delay: parking_lot::Mutex::new(None),
            fetch_count: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Script the table returned by subsequent fetches.
    pub fn set_table(&self, table: RateTable) {
        *self.table.lock() = Some(table);
    }

    /// Make subsequent fetches fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Stall subsequent fetches for the given duration.
    pub fn set_fetch_delay(&self, delay: std::time::Duration) {
        *self.fetch_delay.lock() = Some(delay);
    }

    /// Number of fetches issued against this source.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateSource for MockRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rates(&self) -> Result<RateTable> {
        use fxwallet_common::WalletError;

        self.fetch_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let delay = *self.fetch_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(WalletError::RateUnavailable {
                reason: "scripted source failure".to_string(),
            });
        }

        (*self.table.lock()).ok_or_else(|| WalletError::RateUnavailable {
            reason: "no table scripted".to_string(),
        })
    }
}
