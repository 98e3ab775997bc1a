//! Workload metrics.

use std::collections::VecDeque;

/// Operation classes driven by the workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadOp {
    Deposit,
    Withdraw,
    Exchange,
}

impl WorkloadOp {
    pub fn label(&self) -> &'static str {
        match self {
            WorkloadOp::Deposit => "deposit",
            WorkloadOp::Withdraw => "withdraw",
            WorkloadOp::Exchange => "exchange",
        }
    }
}

/// Outcome counters for one operation class.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationCounter {
    /// Operations attempted.
    pub attempted: u64,
    /// Operations committed by the ledger.
    pub committed: u64,
    /// Operations rejected by validation or business rules.
    pub rejected: u64,
}

/// Simulation metrics.
#[derive(Debug, Clone)]
pub struct SimulationMetrics {
    /// Deposit counters.
    pub deposits: OperationCounter,
    /// Withdrawal counters.
    pub withdrawals: OperationCounter,
    /// Exchange counters.
    pub exchanges: OperationCounter,
    /// Latency samples (microseconds).
    latency_samples: VecDeque<u64>,
    /// Maximum samples to keep.
    max_samples: usize,
}

impl SimulationMetrics {
    /// Create new metrics.
    pub fn new() -> Self {
        Self {
            deposits: OperationCounter::default(),
            withdrawals: OperationCounter::default(),
            exchanges: OperationCounter::default(),
            latency_samples: VecDeque::with_capacity(10000),
            max_samples: 10000,
        }
    }

    /// Record a committed operation.
    pub fn record_committed(&mut self, op: WorkloadOp, latency_us: u64) {
        let counter = self.counter_mut(op);
        counter.attempted += 1;
        counter.committed += 1;

        if self.latency_samples.len() >= self.max_samples {
            self.latency_samples.pop_front();
        }
        self.latency_samples.push_back(latency_us);
    }

    /// Record a rejected operation.
    pub fn record_rejected(&mut self, op: WorkloadOp) {
        let counter = self.counter_mut(op);
        counter.attempted += 1;
        counter.rejected += 1;
    }

    /// Total operations attempted across all classes.
    pub fn total_attempted(&self) -> u64 {
        self.deposits.attempted + self.withdrawals.attempted + self.exchanges.attempted
    }

    /// Total operations committed across all classes.
    pub fn total_committed(&self) -> u64 {
        self.deposits.committed + self.withdrawals.committed + self.exchanges.committed
    }

    /// Get average latency in microseconds.
    pub fn average_latency_us(&self) -> u64 {
        if self.latency_samples.is_empty() {
            return 0;
        }

        let sum: u64 = self.latency_samples.iter().sum();
        sum / self.latency_samples.len() as u64
    }

    /// Get p50 latency.
    pub fn p50_latency_us(&self) -> u64 {
        self.percentile_latency(50)
    }

    /// Get p99 latency.
    pub fn p99_latency_us(&self) -> u64 {
        self.percentile_latency(99)
    }

    /// Get commit rate across all attempted operations.
    pub fn commit_rate(&self) -> f64 {
        if self.total_attempted() == 0 {
            return 0.0;
        }

        self.total_committed() as f64 / self.total_attempted() as f64
    }

    fn percentile_latency(&self, percentile: usize) -> u64 {
        if self.latency_samples.is_empty() {
            return 0;
        }

        let mut sorted: Vec<_> = self.latency_samples.iter().copied().collect();
        sorted.sort_unstable();

        let idx = (sorted.len() * percentile / 100).min(sorted.len() - 1);
        sorted[idx]
    }

    fn counter_mut(&mut self, op: WorkloadOp) -> &mut OperationCounter {
        match op {
            WorkloadOp::Deposit => &mut self.deposits,
            WorkloadOp::Withdraw => &mut self.withdrawals,
            WorkloadOp::Exchange => &mut self.exchanges,
        }
    }
}

impl Default for SimulationMetrics {
    fn default() -> Self {
        Self::new()
    }
}
