//! Registry configuration with validation.

use shared_types::DEFAULT_CACHE_TTL_SECONDS;
use thiserror::Error;

/// Cache behavior of the schema registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Seconds a cached schema (or name resolution) stays fresh.
    pub cache_ttl_seconds: u64,
    /// Soft bound on cached definitions; expired entries are pruned before an
    /// insert would exceed it.
    pub max_entries: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            max_entries: 1_024,
        }
    }
}

/// Invalid registry configuration.
#[derive(Debug, Error)]
pub enum RegistryConfigError {
    /// TTL of zero would expire entries at insert time.
    #[error("cache_ttl_seconds cannot be 0")]
    ZeroTtl,
    /// A zero bound leaves no room for any entry.
    #[error("max_entries cannot be 0")]
    ZeroCapacity,
}

impl RegistryConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), RegistryConfigError> {
        if self.cache_ttl_seconds == 0 {
            return Err(RegistryConfigError::ZeroTtl);
        }
        if self.max_entries == 0 {
            return Err(RegistryConfigError::ZeroCapacity);
        }
        Ok(())
    }

    /// Loads overrides from `SCHEMA_CACHE_TTL_SECONDS` /
    /// `SCHEMA_CACHE_MAX_ENTRIES`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_ttl_seconds: env_u64("SCHEMA_CACHE_TTL_SECONDS")
                .unwrap_or(defaults.cache_ttl_seconds),
            max_entries: env_u64("SCHEMA_CACHE_MAX_ENTRIES")
                .map(|v| v as usize)
                .unwrap_or(defaults.max_entries),
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.parse().ok()
}
