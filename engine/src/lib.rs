//! FxWallet Exchange Engine
//!
//! Orchestrates deposit, withdraw, and exchange operations over the
//! ledger, the rate cache, and the audit publisher.
//!
//! # Features
//!
//! - Validation with a fixed order: amount before currency code
//! - Atomic balance mutation delegated to the ledger store
//! - Exchange pricing through the TTL rate cache
//! - Fire-and-forget audit dispatch for large transactions
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fxwallet_engine::{EngineConfig, ExchangeEngine};
//! use fxwallet_common::Username;
//! use rust_decimal_macros::dec;
//!
//! let engine = ExchangeEngine::new(store, source, channel, EngineConfig::default());
//!
//! let alice = Username::from("alice");
//! let balances = engine.deposit(&alice, "USD", dec!(50)).await?;
//! let outcome = engine.exchange(&alice, "RUB", "EUR", dec!(100)).await?;
//! ```

pub mod config;
pub mod engine;
pub mod response;

pub use config::EngineConfig;
pub use engine::ExchangeEngine;
pub use response::{BalanceView, ExchangeOutcome};
