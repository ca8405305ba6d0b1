//! Worker pool configuration.

use thiserror::Error;

/// Sizing of the worker pool.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of jobs processed concurrently.
    pub concurrency: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { concurrency: 2 }
    }
}

/// Invalid worker configuration.
#[derive(Debug, Error)]
pub enum WorkerConfigError {
    /// Zero workers would strand every queued job.
    #[error("concurrency cannot be 0")]
    ZeroConcurrency,
}

impl WorkerConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), WorkerConfigError> {
        if self.concurrency == 0 {
            return Err(WorkerConfigError::ZeroConcurrency);
        }
        Ok(())
    }

    /// Loads overrides from `WORKER_CONCURRENCY`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let concurrency = std::env::var("WORKER_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.concurrency);
        Self { concurrency }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_concurrency_is_two() {
        let config = WorkerConfig::default();
        assert_eq!(config.concurrency, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(WorkerConfig { concurrency: 0 }.validate().is_err());
    }
}
