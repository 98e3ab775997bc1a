//! FxWallet Audit
//!
//! Best-effort audit-trail emission for large transactions. Events are
//! published on detached tasks with one bounded attempt each; delivery
//! is at-most-once and failures never affect the operation that
//! triggered them.

pub mod channel;
pub mod event;
pub mod publisher;

pub use channel::{EventChannel, LoggingChannel};
pub use event::AuditEvent;
pub use publisher::{AuditConfig, AuditPublisher};

#[cfg(any(test, feature = "test-utils"))]
pub use channel::RecordingChannel;
