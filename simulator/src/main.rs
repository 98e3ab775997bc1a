//! FxWallet Simulator
//!
//! Workload environment for exercising the exchange engine end to end
//! without external services.

use clap::Parser;
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod metrics;
mod synthetic;
mod workload;

use workload::{WorkloadConfig, WorkloadRunner};

/// FxWallet Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "FxWallet workload and simulation environment")]
struct Args {
    /// Number of simulated accounts to create
    #[arg(short, long, default_value = "5")]
    accounts: usize,

    /// Total number of operations to drive
    #[arg(short, long, default_value = "1000")]
    ops: u64,

    /// Number of concurrent workers
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Starting balance per currency for each account
    #[arg(long, default_value = "100000")]
    starting_balance: Decimal,

    /// Large-transaction audit threshold
    #[arg(long, default_value = "30000")]
    threshold: Decimal,

    /// Rate cache TTL in seconds
    #[arg(long, default_value = "300")]
    rate_ttl_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting FxWallet Simulator");
    info!("Accounts: {}", args.accounts);
    info!("Operations: {}", args.ops);
    info!("Workers: {}", args.workers);

    let config = WorkloadConfig {
        accounts: args.accounts,
        ops: args.ops,
        workers: args.workers,
        seed: args.seed,
        starting_balance: args.starting_balance,
        threshold: args.threshold,
        rate_ttl: std::time::Duration::from_secs(args.rate_ttl_secs),
    };

    let mut runner = WorkloadRunner::new(config)?;
    runner.initialize().await?;

    info!("Simulator initialized with {} accounts", args.accounts);

    let elapsed = runner.run().await?;

    // Print metrics
    let metrics = runner.summary().await;
    info!("Simulation complete in {:.2}s", elapsed.as_secs_f64());
    info!(
        "Deposits: {} committed, {} rejected",
        metrics.deposits.committed, metrics.deposits.rejected
    );
    info!(
        "Withdrawals: {} committed, {} rejected",
        metrics.withdrawals.committed, metrics.withdrawals.rejected
    );
    info!(
        "Exchanges: {} committed, {} rejected",
        metrics.exchanges.committed, metrics.exchanges.rejected
    );
    info!("Commit rate: {:.1}%", metrics.commit_rate() * 100.0);
    info!(
        "Latency: avg {}us, p50 {}us, p99 {}us",
        metrics.average_latency_us(),
        metrics.p50_latency_us(),
        metrics.p99_latency_us()
    );
    info!("Audit events published: {}", runner.audit_published());
    info!("Rate source fetches: {}", runner.rate_fetches());

    Ok(())
}
