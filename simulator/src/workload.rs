//! Randomized workload driver.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{info, warn};

use fxwallet_common::{Balances, Currency, RateTable, Username};
use fxwallet_engine::{EngineConfig, ExchangeEngine};
use fxwallet_ledger::MemoryStore;

use crate::metrics::{SimulationMetrics, WorkloadOp};
use crate::synthetic::{CountingChannel, SyntheticRateSource};

/// Workload settings.
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// Number of accounts.
    pub accounts: usize,
    /// Total operations to drive.
    pub ops: u64,
    /// Concurrent workers.
    pub workers: usize,
    /// Random seed; fresh entropy when absent.
    pub seed: Option<u64>,
    /// Starting balance per currency for each account.
    pub starting_balance: Decimal,
    /// Large-transaction audit threshold.
    pub threshold: Decimal,
    /// Rate cache TTL.
    pub rate_ttl: Duration,
}

/// Drives randomized traffic through the exchange engine.
pub struct WorkloadRunner {
    /// Engine under load.
    engine: Arc<ExchangeEngine>,
    /// Seeded in-memory store behind the engine.
    store: Arc<MemoryStore>,
    /// Synthetic rate source behind the engine.
    source: Arc<SyntheticRateSource>,
    /// Counting audit channel behind the engine.
    channel: Arc<CountingChannel>,
    /// Account names under load.
    accounts: Vec<Username>,
    /// Collected metrics.
    metrics: Arc<RwLock<SimulationMetrics>>,
    /// Resolved seed for this run.
    seed: u64,
    /// Workload settings.
    config: WorkloadConfig,
}

impl WorkloadRunner {
    /// Create a new workload runner.
    pub fn new(config: WorkloadConfig) -> anyhow::Result<Self> {
        let seed = config.seed.unwrap_or_else(rand::random);

        let store = Arc::new(MemoryStore::new());
        let source = Arc::new(SyntheticRateSource::new(base_table(), 50, seed));
        let channel = Arc::new(CountingChannel::new());

        let mut engine_config = EngineConfig::default();
        engine_config.large_transaction_threshold = config.threshold;
        engine_config.rate_cache.ttl = config.rate_ttl;
        engine_config
            .validate()
            .map_err(|reason| anyhow::anyhow!(reason))?;

        let engine = Arc::new(ExchangeEngine::new(
            store.clone(),
            source.clone(),
            channel.clone(),
            engine_config,
        ));

        let accounts = (0..config.accounts)
            .map(|i| Username::new(format!("user_{i}")))
            .collect();

        info!("Workload seed: {}", seed);

        Ok(Self {
            engine,
            store,
            source,
            channel,
            accounts,
            metrics: Arc::new(RwLock::new(SimulationMetrics::new())),
            seed,
            config,
        })
    }

    /// Seed every account with the starting balances.
    pub async fn initialize(&mut self) -> anyhow::Result<()> {
        let balance = self.config.starting_balance;
        for username in &self.accounts {
            self.store.insert_account(
                username.clone(),
                Balances::new(balance, balance, balance),
            );
            info!("Seeded account {} with {} per currency", username, balance);
        }

        Ok(())
    }

    /// Run the workload to completion and return the elapsed time.
    pub async fn run(&self) -> anyhow::Result<Duration> {
        let workers = self.config.workers.max(1);
        let ops_per_worker = self.config.ops / workers as u64;
        let remainder = self.config.ops % workers as u64;

        info!(
            "Driving {} operations across {} workers",
            self.config.ops, workers
        );

        let started = Instant::now();

        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let engine = Arc::clone(&self.engine);
            let accounts = self.accounts.clone();
            let metrics = Arc::clone(&self.metrics);
            let ops = ops_per_worker + u64::from((worker as u64) < remainder);
            // Distinct deterministic stream per worker.
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(worker as u64 + 1));

            handles.push(tokio::spawn(async move {
                for _ in 0..ops {
                    drive_one(&engine, &accounts, &metrics, &mut rng).await;
                }
            }));
        }

        for handle in handles {
            handle.await?;
        }

        Ok(started.elapsed())
    }

    /// Snapshot of the collected metrics.
    pub async fn summary(&self) -> SimulationMetrics {
        self.metrics.read().await.clone()
    }

    /// Audit events accepted by the channel so far.
    pub fn audit_published(&self) -> usize {
        self.channel.published()
    }

    /// Fetches served by the rate source so far.
    pub fn rate_fetches(&self) -> usize {
        self.source.fetch_count()
    }

    /// Accounts under load.
    pub fn accounts(&self) -> &[Username] {
        &self.accounts
    }

    /// The engine under load.
    pub fn engine(&self) -> &ExchangeEngine {
        &self.engine
    }
}

/// Production-flavored base table: one base unit buys 1 USD, 92 RUB,
/// or 0.92 EUR.
fn base_table() -> RateTable {
    RateTable::new(
        Decimal::ONE,
        Decimal::from(92),
        Decimal::new(92, 2),
    )
}

async fn drive_one(
    engine: &ExchangeEngine,
    accounts: &[Username],
    metrics: &RwLock<SimulationMetrics>,
    rng: &mut StdRng,
) {
    let username = &accounts[rng.gen_range(0..accounts.len())];
    let currency = Currency::ALL[rng.gen_range(0..Currency::ALL.len())];
    let amount = Decimal::new(rng.gen_range(100..=4_000_000i64), 2);

    let op = match rng.gen_range(0..10) {
        0..=3 => WorkloadOp::Deposit,
        4..=7 => WorkloadOp::Withdraw,
        _ => WorkloadOp::Exchange,
    };

    let started = Instant::now();
    let outcome = match op {
        WorkloadOp::Deposit => engine
            .deposit(username, currency.code(), amount)
            .await
            .map(|_| ()),
        WorkloadOp::Withdraw => engine
            .withdraw(username, currency.code(), amount)
            .await
            .map(|_| ()),
        WorkloadOp::Exchange => {
            let to = Currency::ALL[rng.gen_range(0..Currency::ALL.len())];
            engine
                .exchange(username, currency.code(), to.code(), amount)
                .await
                .map(|_| ())
        }
    };
    let latency_us = started.elapsed().as_micros() as u64;

    match outcome {
        Ok(()) => metrics.write().await.record_committed(op, latency_us),
        Err(err) if err.is_client_error() => {
            metrics.write().await.record_rejected(op);
        }
        Err(err) => {
            warn!(operation = op.label(), error = %err, "Workload operation failed");
            metrics.write().await.record_rejected(op);
        }
    }
}
