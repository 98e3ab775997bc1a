//! Error types for wallet operations.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::monetary::Currency;
use crate::Username;

/// Main error type for wallet operations.
#[derive(Error, Debug)]
pub enum WalletError {
    /// Currency code outside the supported set.
    #[error("Unsupported currency: {code}")]
    InvalidCurrency { code: String },

    /// Amount must be strictly positive.
    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: Decimal },

    /// Operation would drive a balance negative.
    #[error("Insufficient {currency} funds for {username}")]
    InsufficientFunds {
        username: Username,
        currency: Currency,
    },

    /// No usable rate snapshot and the source fetch failed.
    #[error("Exchange rates unavailable: {reason}")]
    RateUnavailable { reason: String },

    /// Unknown account.
    #[error("Account not found: {username}")]
    NotFound { username: Username },

    /// Storage-layer failure unrelated to business rules.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Audit emission failure. Never surfaced to callers.
    #[error("Audit publish failed: {0}")]
    AuditPublish(String),
}

impl WalletError {
    /// Get a stable error code for service responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            WalletError::InvalidCurrency { .. } => "INVALID_CURRENCY",
            WalletError::InvalidAmount { .. } => "INVALID_AMOUNT",
            WalletError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            WalletError::RateUnavailable { .. } => "RATE_UNAVAILABLE",
            WalletError::NotFound { .. } => "NOT_FOUND",
            WalletError::Persistence(_) => "PERSISTENCE_ERROR",
            WalletError::AuditPublish(_) => "AUDIT_PUBLISH_ERROR",
        }
    }

    /// Check whether the caller's request caused this error, as
    /// opposed to an internal failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            WalletError::InvalidCurrency { .. }
                | WalletError::InvalidAmount { .. }
                | WalletError::InsufficientFunds { .. }
                | WalletError::NotFound { .. }
        )
    }
}

/// Result type alias for wallet operations.
pub type Result<T> = std::result::Result<T, WalletError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        let err = WalletError::InvalidAmount { amount: dec!(-5) };
        assert_eq!(err.error_code(), "INVALID_AMOUNT");

        let err = WalletError::Persistence("pool exhausted".into());
        assert_eq!(err.error_code(), "PERSISTENCE_ERROR");
    }

    #[test]
    fn test_client_error_split() {
        let client = WalletError::InsufficientFunds {
            username: Username::new("alice"),
            currency: Currency::Usd,
        };
        assert!(client.is_client_error());

        let internal = WalletError::RateUnavailable {
            reason: "source unreachable".into(),
        };
        assert!(!internal.is_client_error());
    }

    #[test]
    fn test_display_messages() {
        let err = WalletError::InvalidCurrency { code: "GBP".into() };
        assert_eq!(err.to_string(), "Unsupported currency: GBP");

        let err = WalletError::NotFound {
            username: Username::new("bob"),
        };
        assert_eq!(err.to_string(), "Account not found: bob");
    }
}
