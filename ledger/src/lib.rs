//! FxWallet Ledger
//!
//! Per-account multi-currency balances with an atomic check-and-apply
//! discipline: every mutation commits as one conditional unit, and the
//! non-negative-balance invariant is enforced at commit time.

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use store::{exchange_credit, BalanceStore};
