//! Audit event wire shape.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fxwallet_common::time::{now, Timestamp};
use fxwallet_common::{EventId, OperationKind, Username};

/// A large-transaction notification.
///
/// Ephemeral: constructed, serialized, handed to the channel, then
/// discarded regardless of delivery outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Globally unique event id.
    pub id: EventId,
    /// Principal the operation executed for.
    pub user: Username,
    /// Operation kind (`deposit` | `withdraw`).
    pub operation_type: OperationKind,
    /// Operation amount.
    pub amount: Decimal,
    /// When the event was constructed, UTC.
    pub timestamp: Timestamp,
}

impl AuditEvent {
    /// Create an event with a fresh id and the current UTC timestamp.
    pub fn new(user: Username, operation_type: OperationKind, amount: Decimal) -> Self {
        Self {
            id: EventId::new(),
            user,
            operation_type,
            amount,
            timestamp: now(),
        }
    }

    /// Routing identifier derived from the operation kind.
    pub fn routing_key(&self) -> String {
        format!("wallet.event.{}", self.operation_type)
    }
}
