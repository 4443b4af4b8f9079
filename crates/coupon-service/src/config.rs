//! Service configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                     | Default | Meaning                          |
//! |------------------------------|---------|----------------------------------|
//! | `COUPON_CACHE_SIZE`          | 100     | coupon snapshots kept (0 = off)  |
//! | `COUPON_CACHE_TTL_SECS`      | 600     | lifetime of every cache entry    |
//! | `COUPON_LISTING_CACHE_SIZE`  | 100     | cached applicable-coupon lists   |
//! | `COUPON_STORAGE_TIMEOUT_MS`  | 5000    | deadline for each storage call   |

use std::env;
use std::time::Duration;

/// Coupon service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Maximum coupon snapshots in the code cache.
    pub cache_size: usize,

    /// Time-to-live of cache entries.
    pub cache_ttl: Duration,

    /// Maximum cached applicable-coupon listings.
    pub listing_cache_size: usize,

    /// Deadline applied to each storage call.
    pub storage_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            cache_size: 100,
            cache_ttl: Duration::from_secs(600),
            listing_cache_size: 100,
            storage_timeout: Duration::from_millis(5000),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse = |key: &str, default: &str| -> Result<u64, ConfigError> {
            lookup(key)
                .unwrap_or_else(|| default.to_string())
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        };

        let config = ServiceConfig {
            cache_size: parse("COUPON_CACHE_SIZE", "100")? as usize,
            cache_ttl: Duration::from_secs(parse("COUPON_CACHE_TTL_SECS", "600")?),
            listing_cache_size: parse("COUPON_LISTING_CACHE_SIZE", "100")? as usize,
            storage_timeout: Duration::from_millis(parse("COUPON_STORAGE_TIMEOUT_MS", "5000")?),
        };

        if config.storage_timeout.is_zero() {
            return Err(ConfigError::InvalidValue("COUPON_STORAGE_TIMEOUT_MS".to_string()));
        }

        Ok(config)
    }

    /// Sets the coupon cache size.
    pub fn cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }

    /// Sets the cache TTL.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Sets the listing cache size.
    pub fn listing_cache_size(mut self, size: usize) -> Self {
        self.listing_cache_size = size;
        self
    }

    /// Sets the storage deadline.
    pub fn storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = timeout;
        self
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
