//! CLI command definitions.

use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

/// Namespaced Redis client.
#[derive(Debug, Parser)]
#[command(name = "nsredis")]
#[command(version, about = "Namespaced Redis client", long_about = None)]
pub struct Cli {
    /// Redis connection URL.
    #[arg(long, env = "REDIS_URL", default_value = "redis://localhost:6379")]
    pub url: String,

    /// Prefix prepended to every key.
    #[arg(long, env = "REDIS_PREFIX", default_value = "")]
    pub prefix: String,

    /// TTL in seconds for writes without an explicit --ttl.
    #[arg(long, env = "REDIS_TTL_SECONDS", default_value_t = 86_400)]
    pub ttl_seconds: u64,

    /// Milliseconds to wait for the Redis connection.
    #[arg(long, env = "REDIS_CONNECT_TIMEOUT_MS", default_value_t = 5_000)]
    pub connect_timeout_ms: u64,

    /// Output format.
    #[arg(long, default_value = "pretty")]
    pub format: OutputFormat,

    /// Suppress non-essential output.
    #[arg(long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Raw JSON output.
    Json,
    /// Human-readable output.
    #[default]
    Pretty,
}

/// Available commands. Keys are logical keys; the prefix is added automatically.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Get a string value.
    Get {
        /// Key.
        key: String,
    },
    /// Set a string value.
    Set {
        /// Key.
        key: String,
        /// Value.
        value: String,
        /// TTL in seconds (0 never expires).
        #[arg(long)]
        ttl: Option<u64>,
    },
    /// Delete keys.
    Del {
        /// Keys.
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Check whether a key exists.
    Exists {
        /// Key.
        key: String,
    },
    /// Set a TTL on a key.
    Expire {
        /// Key.
        key: String,
        /// TTL in seconds.
        seconds: u64,
    },
    /// Get a hash field.
    Hget {
        /// Hash key.
        key: String,
        /// Field.
        field: String,
    },
    /// Get all fields of a hash.
    Hgetall {
        /// Hash key.
        key: String,
    },
    /// Set a hash field and refresh the hash TTL.
    Hset {
        /// Hash key.
        key: String,
        /// Field.
        field: String,
        /// Value.
        value: String,
        /// TTL in seconds (0 keeps the current expiration).
        #[arg(long)]
        ttl: Option<u64>,
    },
    /// Delete hash fields; the hash is removed once empty.
    Hdel {
        /// Hash key.
        key: String,
        /// Fields.
        #[arg(required = true)]
        fields: Vec<String>,
    },
    /// Publish a message (channels are not prefixed).
    Publish {
        /// Channel.
        channel: String,
        /// Message payload.
        message: String,
    },
    /// Print messages from a channel until the connection closes.
    Subscribe {
        /// Channel, or glob pattern with --pattern.
        channel: String,
        /// Treat the channel as a glob pattern.
        #[arg(long)]
        pattern: bool,
    },
}

/// Converts a `--ttl` flag into the facade's optional TTL.
pub fn ttl_arg(seconds: Option<u64>) -> Option<Duration> {
    seconds.map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_with_ttl() {
        let cli = Cli::try_parse_from([
            "nsredis", "--prefix", "app:", "set", "k", "v", "--ttl", "30",
        ])
        .unwrap();

        assert_eq!(cli.prefix, "app:");
        match cli.command {
            Commands::Set { key, value, ttl } => {
                assert_eq!((key.as_str(), value.as_str()), ("k", "v"));
                assert_eq!(ttl_arg(ttl), Some(Duration::from_secs(30)));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_del_requires_keys() {
        assert!(Cli::try_parse_from(["nsredis", "del"]).is_err());
    }

    #[test]
    fn test_format_flag() {
        let cli = Cli::try_parse_from(["nsredis", "--format", "json", "get", "k"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_subscribe_pattern_flag() {
        let cli = Cli::try_parse_from(["nsredis", "subscribe", "news.*", "--pattern"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Subscribe { pattern: true, .. }
        ));
    }

    #[test]
    fn test_connect_timeout_flag() {
        let cli =
            Cli::try_parse_from(["nsredis", "--connect-timeout-ms", "250", "get", "k"]).unwrap();
        assert_eq!(cli.connect_timeout_ms, 250);
    }
}
