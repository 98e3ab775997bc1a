//! Engine configuration.

use std::time::Duration;

use rust_decimal::Decimal;

use fxwallet_audit::AuditConfig;
use fxwallet_rates::RateCacheConfig;

/// Main engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Operations at or above this amount are reported to the audit
    /// channel.
    pub large_transaction_threshold: Decimal,
    /// Rate cache configuration.
    pub rate_cache: RateCacheConfig,
    /// Audit publisher configuration.
    pub audit: AuditConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            large_transaction_threshold: Decimal::new(30_000, 0),
            rate_cache: RateCacheConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(threshold) = std::env::var("FXWALLET_LARGE_TRANSACTION_THRESHOLD") {
            if let Ok(threshold) = threshold.parse() {
                config.large_transaction_threshold = threshold;
            }
        }

        if let Ok(secs) = std::env::var("FXWALLET_RATE_TTL_SECS") {
            if let Ok(secs) = secs.parse() {
                config.rate_cache.ttl = Duration::from_secs(secs);
            }
        }

        if let Ok(secs) = std::env::var("FXWALLET_RATE_REFRESH_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.rate_cache.refresh_timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(secs) = std::env::var("FXWALLET_AUDIT_PUBLISH_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.audit.publish_timeout = Duration::from_secs(secs);
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.large_transaction_threshold < Decimal::ZERO {
            return Err("Large transaction threshold cannot be negative".to_string());
        }

        if self.rate_cache.ttl.is_zero() {
            return Err("Rate cache TTL cannot be zero".to_string());
        }

        if self.rate_cache.refresh_timeout.is_zero() {
            return Err("Rate refresh timeout cannot be zero".to_string());
        }

        if self.audit.publish_timeout.is_zero() {
            return Err("Audit publish timeout cannot be zero".to_string());
        }

        Ok(())
    }
}
