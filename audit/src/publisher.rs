//! Bounded, best-effort audit publishing.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use fxwallet_common::{Result, WalletError};

use crate::channel::EventChannel;
use crate::event::AuditEvent;

/// Configuration for the audit publisher.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Upper bound on one publish attempt.
    pub publish_timeout: Duration,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            publish_timeout: Duration::from_secs(5),
        }
    }
}

/// Emits audit events toward an event channel.
///
/// Delivery is at-most-once: one bounded attempt, no retry, and a
/// failed or timed-out attempt only logs before the event is dropped.
/// Publish failures never reach the operation that triggered them.
#[derive(Clone)]
pub struct AuditPublisher {
    channel: Arc<dyn EventChannel>,
    config: AuditConfig,
}

impl AuditPublisher {
    /// Create a publisher with default configuration.
    pub fn new(channel: Arc<dyn EventChannel>) -> Self {
        Self::with_config(channel, AuditConfig::default())
    }

    /// Create a publisher with custom configuration.
    pub fn with_config(channel: Arc<dyn EventChannel>, config: AuditConfig) -> Self {
        Self { channel, config }
    }

    /// Dispatch an event on a detached task and return immediately.
    ///
    /// The task outlives the caller, so cancelling the operation that
    /// triggered the event cannot cancel the publish attempt; only
    /// the publish timeout bounds it.
    pub fn dispatch(&self, event: AuditEvent) {
        let publisher = self.clone();
        tokio::spawn(async move {
            publisher.publish(&event).await;
        });
    }

    /// Publish one event, bounded by the configured timeout.
    pub async fn publish(&self, event: &AuditEvent) {
        match self.try_publish(event).await {
            Ok(()) => debug!(
                event_id = %event.id,
                routing_key = %event.routing_key(),
                channel = self.channel.name(),
                "Audit event published"
            ),
            Err(err) => warn!(
                event_id = %event.id,
                error = %err,
                "Audit publish failed, event dropped"
            ),
        }
    }

    async fn try_publish(&self, event: &AuditEvent) -> Result<()> {
        let payload =
            serde_json::to_vec(event).map_err(|err| WalletError::AuditPublish(err.to_string()))?;

        let routing_key = event.routing_key();
        let send = self.channel.send(&routing_key, &payload);
        match timeout(self.config.publish_timeout, send).await {
            Ok(result) => result,
            Err(_) => Err(WalletError::AuditPublish(format!(
                "attempt exceeded {:?}",
                self.config.publish_timeout
            ))),
        }
    }
}
