//! FxWallet Common Types
//!
//! This crate contains shared types used across the wallet, including
//! identifiers, monetary types, operation kinds, and the error taxonomy.

pub mod error;
pub mod identifiers;
pub mod monetary;
pub mod operation;
pub mod time;

pub use error::*;
pub use identifiers::*;
pub use monetary::*;
pub use operation::*;
pub use time::*;
