//! Synthetic collaborators backing the simulator.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tracing::debug;

use fxwallet_audit::EventChannel;
use fxwallet_common::{RateTable, Result};
use fxwallet_rates::RateSource;

/// Rate source that jitters a base table on every fetch.
pub struct SyntheticRateSource {
    base: RateTable,
    jitter_bps: i64,
    rng: Mutex<StdRng>,
    fetches: AtomicUsize,
}

impl SyntheticRateSource {
    /// Jitter must stay well below 10000 bps so the table remains
    /// strictly positive.
    pub fn new(base: RateTable, jitter_bps: i64, seed: u64) -> Self {
        Self {
            base,
            jitter_bps,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Number of fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateSource for SyntheticRateSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn fetch_rates(&self) -> Result<RateTable> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let mut rng = self.rng.lock();
        let mut jittered = |value: Decimal| {
            let bps = rng.gen_range(-self.jitter_bps..=self.jitter_bps);
            value + value * Decimal::new(bps, 4)
        };

        Ok(RateTable::new(
            jittered(self.base.usd),
            jittered(self.base.rub),
            jittered(self.base.eur),
        ))
    }
}

/// Event channel that counts deliveries instead of sending anywhere.
pub struct CountingChannel {
    published: AtomicUsize,
}

impl CountingChannel {
    pub fn new() -> Self {
        Self {
            published: AtomicUsize::new(0),
        }
    }

    /// Number of events accepted so far.
    pub fn published(&self) -> usize {
        self.published.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventChannel for CountingChannel {
    fn name(&self) -> &str {
        "counting"
    }

    async fn send(&self, routing_key: &str, _payload: &[u8]) -> Result<()> {
        self.published.fetch_add(1, Ordering::SeqCst);
        debug!(routing_key, "Audit event counted");
        Ok(())
    }
}
