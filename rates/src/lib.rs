//! FxWallet Rates
//!
//! TTL-cached exchange rates over a pluggable source.
//!
//! # Features
//!
//! - Whole-table snapshots swapped on refresh, never mutated in place
//! - Single-flight refresh under concurrent callers
//! - Stale snapshot served when the source fails, as long as one was
//!   ever populated
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fxwallet_common::Currency;
//! use fxwallet_rates::RateCache;
//!
//! let cache = RateCache::new(source);
//! let rate = cache.rate(Currency::Rub, Currency::Eur).await?;
//! ```

pub mod cache;
pub mod source;

pub use cache::{RateCache, RateCacheConfig};
pub use source::RateSource;

#[cfg(any(test, feature = "test-utils"))]
pub use source::MockRateSource;
