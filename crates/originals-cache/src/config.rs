//! Cache configuration.

use std::time::Duration;

use originals_core::{env_bool, env_parse, ConfigError};

/// Default entry lifetime in seconds.
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Default capacity.
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// Resolution cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// When false every operation is a no-op miss.
    pub enabled: bool,
    /// Lifetime applied by `set`.
    pub default_ttl: Duration,
    /// Capacity; inserting beyond it evicts the least-recently-accessed entry.
    pub max_size: usize,
    /// Recompute and compare the content hash on every `get`.
    pub verify_hash: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            max_size: DEFAULT_MAX_SIZE,
            verify_hash: true,
        }
    }
}

impl CacheConfig {
    /// Load from environment variables.
    ///
    /// - `ORIGINALS_CACHE_ENABLED` (default: `true`)
    /// - `ORIGINALS_CACHE_TTL_SECS` (default: 300, must be > 0)
    /// - `ORIGINALS_CACHE_MAX_SIZE` (default: 1000, must be >= 1)
    /// - `ORIGINALS_CACHE_VERIFY_HASH` (default: `true`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let ttl_secs: u64 = env_parse("ORIGINALS_CACHE_TTL_SECS", DEFAULT_TTL_SECS)?;
        if ttl_secs == 0 {
            return Err(ConfigError::invalid("ORIGINALS_CACHE_TTL_SECS", "0", "must be > 0"));
        }
        let max_size: usize = env_parse("ORIGINALS_CACHE_MAX_SIZE", DEFAULT_MAX_SIZE)?;
        if max_size == 0 {
            return Err(ConfigError::invalid("ORIGINALS_CACHE_MAX_SIZE", "0", "must be >= 1"));
        }
        Ok(Self {
            enabled: env_bool("ORIGINALS_CACHE_ENABLED", true)?,
            default_ttl: Duration::from_secs(ttl_secs),
            max_size,
            verify_hash: env_bool("ORIGINALS_CACHE_VERIFY_HASH", true)?,
        })
    }

    /// A disabled configuration.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}
