//! Single-leg operation kinds.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a single-leg ledger operation. Exchange is not a kind:
/// it is its own dual-leg operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Credit the account.
    Deposit,
    /// Debit the account.
    Withdraw,
}

impl OperationKind {
    /// Get the lowercase wire name (`deposit` | `withdraw`).
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Deposit => "deposit",
            OperationKind::Withdraw => "withdraw",
        }
    }

    /// Turn a positive amount into the signed delta this kind applies.
    pub fn signed_delta(&self, amount: Decimal) -> Decimal {
        match self {
            OperationKind::Deposit => amount,
            OperationKind::Withdraw => -amount,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
