//! Event channel trait and implementations.

use async_trait::async_trait;
use fxwallet_common::Result;
use tracing::info;

/// Outbound boundary for audit events. Implementations accept a
/// serialized payload plus a routing identifier; no delivery
/// acknowledgment is expected.
#[async_trait]
pub trait EventChannel: Send + Sync {
    /// Get the channel name.
    fn name(&self) -> &str;

    /// Send one payload under a routing key.
    async fn send(&self, routing_key: &str, payload: &[u8]) -> Result<()>;
}

/// Default channel that logs events instead of delivering them.
/// Stands in wherever no broker is wired.
pub struct LoggingChannel;

#[async_trait]
impl EventChannel for LoggingChannel {
    fn name(&self) -> &str {
        "logging"
    }

    async fn send(&self, routing_key: &str, payload: &[u8]) -> Result<()> {
        info!(
            routing_key = %routing_key,
            payload = %String::from_utf8_lossy(payload),
            "Audit event emitted"
        );
        Ok(())
    }
}

/// Recording channel for tests: counts attempts, captures deliveries,
/// and can be scripted to stall or fail.
#[cfg(any(test, feature = "test-utils"))]
pub struct RecordingChannel {
    sent: parking_lot::Mutex<Vec<(String, Vec<u8>)>>,
    attempts: std::sync::atomic::AtomicUsize,
    fail: std::sync::atomic::AtomicBool,
    send_delay: parking_lot::Mutex<Option<std::time::Duration>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl RecordingChannel {
    /// Create a channel that accepts everything immediately.
    pub fn new() -> Self {
        Self {
            sent: parking_lot::Mutex::new(Vec::new()),
            attempts: std::sync::atomic::AtomicUsize::new(0),
            fail: std::sync::atomic::AtomicBool::new(false),
            send_delay: parking_lot::Mutex::new(None),
        }
    }

    /// Make subsequent sends fail.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Stall subsequent sends for the given duration.
    pub fn set_send_delay(&self, delay: std::time::Duration) {
        *self.send_delay.lock() = Some(delay);
    }

    /// Number of send attempts, including failed and timed-out ones.
    pub fn attempt_count(&self) -> usize {
        self.attempts.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Deliveries that completed, as (routing key, payload) pairs.
    pub fn sent(&self) -> Vec<(String, Vec<u8>)> {
        self.sent.lock().clone()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for RecordingChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl EventChannel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, routing_key: &str, payload: &[u8]) -> Result<()> {
        use fxwallet_common::WalletError;

        self.attempts
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let delay = *self.send_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(WalletError::AuditPublish(
                "scripted channel failure".to_string(),
            ));
        }

        self.sent
            .lock()
            .push((routing_key.to_string(), payload.to_vec()));
        Ok(())
    }
}
