//! nsredis CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;
use nsredis::{Config, RedisClient};
use nsredis_cli::cli::{Cli, Commands};
use nsredis_cli::run::execute;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays machine-readable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nsredis=info,nsredis_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config {
        redis_url: cli.url.clone(),
        prefix: cli.prefix.clone(),
        default_ttl_seconds: cli.ttl_seconds,
        connect_timeout_ms: cli.connect_timeout_ms,
    };

    let client = RedisClient::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to {}", config.redis_url))?;

    tracing::debug!(prefix = %client.prefix(), ttl = ?client.default_ttl(), "Connected");

    let mut stdout = std::io::stdout();
    let subscribing = matches!(cli.command, Commands::Subscribe { .. });
    let command = execute(&client, cli.command, cli.format, cli.quiet, &mut stdout);

    if subscribing {
        // Subscriptions only end on connection teardown; Ctrl+C stops them.
        tokio::select! {
            result = command => result?,
            _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted"),
        }
    } else {
        command.await?;
    }

    Ok(())
}
