use std::{env, time::Duration};

use nsredis_core::store::DEFAULT_TTL;

/// Time allowed for the initial connection when none is configured: 5 seconds.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Facade configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL (default: "redis://localhost:6379")
    pub redis_url: String,
    /// Prefix prepended to every key (default: "")
    pub prefix: String,
    /// TTL applied to writes that don't specify one, in seconds (default: 86,400)
    pub default_ttl_seconds: u64,
    /// Time allowed for the initial connection, in milliseconds (default: 5,000)
    pub connect_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `REDIS_URL` - Redis connection URL (default: "redis://localhost:6379")
    /// - `REDIS_PREFIX` - Key prefix (default: "")
    /// - `REDIS_TTL_SECONDS` - Default TTL in seconds (default: 86,400)
    /// - `REDIS_CONNECT_TIMEOUT_MS` - Connection timeout in milliseconds (default: 5,000)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any variable source, e.g. a map in tests.
    ///
    /// Unset or unparsable numeric variables fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            redis_url: lookup("REDIS_URL")
                .unwrap_or_else(|| "redis://localhost:6379".to_string()),
            prefix: lookup("REDIS_PREFIX").unwrap_or_default(),
            default_ttl_seconds: lookup("REDIS_TTL_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TTL.as_secs()),
            connect_timeout_ms: lookup("REDIS_CONNECT_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT.as_millis() as u64),
        }
    }

    /// Get the default TTL as a Duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }

    /// Get the connection timeout as a Duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
