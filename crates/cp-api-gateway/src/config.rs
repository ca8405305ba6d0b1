//! Gateway configuration.

use thiserror::Error;

/// Listener and request-shaping settings for the HTTP surface.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Upper bound on a request body, multipart uploads included.
    pub max_upload_bytes: usize,
    /// Per-request timeout for outbound webhook posts, in milliseconds.
    pub webhook_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3_000,
            max_upload_bytes: 10 * 1024 * 1024,
            webhook_timeout_ms: 10_000,
        }
    }
}

/// Invalid gateway configuration.
#[derive(Debug, Error)]
pub enum GatewayConfigError {
    /// Port 0 would bind an unpredictable port.
    #[error("port cannot be 0")]
    ZeroPort,
    /// A zero body limit rejects every upload.
    #[error("max_upload_bytes cannot be 0")]
    ZeroUploadLimit,
    /// A zero timeout fails every webhook post.
    #[error("webhook_timeout_ms cannot be 0")]
    ZeroWebhookTimeout,
}

impl GatewayConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), GatewayConfigError> {
        if self.port == 0 {
            return Err(GatewayConfigError::ZeroPort);
        }
        if self.max_upload_bytes == 0 {
            return Err(GatewayConfigError::ZeroUploadLimit);
        }
        if self.webhook_timeout_ms == 0 {
            return Err(GatewayConfigError::ZeroWebhookTimeout);
        }
        Ok(())
    }

    /// Loads overrides from `GATEWAY_HOST`, `GATEWAY_PORT`,
    /// `GATEWAY_MAX_UPLOAD_BYTES`, and `WEBHOOK_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("GATEWAY_HOST").unwrap_or(defaults.host),
            port: env_parse("GATEWAY_PORT").unwrap_or(defaults.port),
            max_upload_bytes: env_parse("GATEWAY_MAX_UPLOAD_BYTES")
                .unwrap_or(defaults.max_upload_bytes),
            webhook_timeout_ms: env_parse("WEBHOOK_TIMEOUT_MS")
                .unwrap_or(defaults.webhook_timeout_ms),
        }
    }

    /// Socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(GatewayConfig {
            port: 0,
            ..GatewayConfig::default()
        }
        .validate()
        .is_err());

        assert!(GatewayConfig {
            max_upload_bytes: 0,
            ..GatewayConfig::default()
        }
        .validate()
        .is_err());
    }
}
