//! Queue retry configuration.

use thiserror::Error;

/// Retry policy for the in-memory queue.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Attempts before a job is dead-lettered.
    pub max_attempts: u32,
    /// Base delay before a retried job re-enters the queue; scaled linearly
    /// by the attempt count.
    pub retry_backoff_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff_ms: 500,
        }
    }
}

/// Invalid queue configuration.
#[derive(Debug, Error)]
pub enum QueueConfigError {
    /// `max_attempts` must be at least 1.
    #[error("max_attempts cannot be 0")]
    ZeroAttempts,
}

impl QueueConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), QueueConfigError> {
        if self.max_attempts == 0 {
            return Err(QueueConfigError::ZeroAttempts);
        }
        Ok(())
    }

    /// Loads overrides from `QUEUE_MAX_ATTEMPTS` / `QUEUE_RETRY_BACKOFF_MS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: env_u64("QUEUE_MAX_ATTEMPTS")
                .map(|v| v as u32)
                .unwrap_or(defaults.max_attempts),
            retry_backoff_ms: env_u64("QUEUE_RETRY_BACKOFF_MS")
                .unwrap_or(defaults.retry_backoff_ms),
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QueueConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_backoff_ms, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = QueueConfig {
            max_attempts: 0,
            ..QueueConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
