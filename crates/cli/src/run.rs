//! Command execution against a store.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use nsredis::{Message, Store};

use crate::cli::{ttl_arg, Commands, OutputFormat};
use crate::output::{format_flag, format_hash, format_message, format_ok, format_value};

/// Runs one command, writing its output to `out`.
///
/// `subscribe` keeps writing one line per message until the subscription
/// ends.
pub async fn execute<S, W>(
    store: &S,
    command: Commands,
    format: OutputFormat,
    quiet: bool,
    out: &mut W,
) -> Result<()>
where
    S: Store + ?Sized,
    W: Write + Send,
{
    match command {
        Commands::Get { key } => {
            let value = store.get(&key).await?;
            writeln!(out, "{}", format_value(&key, &value, format))?;
        }
        Commands::Set { key, value, ttl } => {
            store.set(&key, &value, ttl_arg(ttl)).await?;
            ack(out, format, quiet)?;
        }
        Commands::Del { keys } => {
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            store.del(&keys).await?;
            ack(out, format, quiet)?;
        }
        Commands::Exists { key } => {
            let exists = store.exists(&key).await?;
            writeln!(out, "{}", format_flag("exists", exists, format))?;
        }
        Commands::Expire { key, seconds } => {
            let applied = store.expire(&key, Duration::from_secs(seconds)).await?;
            writeln!(out, "{}", format_flag("applied", applied, format))?;
        }
        Commands::Hget { key, field } => {
            let value = store.hget(&key, &field).await?;
            writeln!(out, "{}", format_value(&key, &value, format))?;
        }
        Commands::Hgetall { key } => {
            let fields = store.hgetall(&key).await?;
            writeln!(out, "{}", format_hash(&key, &fields, format))?;
        }
        Commands::Hset {
            key,
            field,
            value,
            ttl,
        } => {
            store.hset(&key, &field, &value, ttl_arg(ttl)).await?;
            ack(out, format, quiet)?;
        }
        Commands::Hdel { key, fields } => {
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            store.hdel(&key, &fields).await?;
            ack(out, format, quiet)?;
        }
        Commands::Publish { channel, message } => {
            store.publish(&channel, &message).await?;
            ack(out, format, quiet)?;
        }
        Commands::Subscribe { channel, pattern } => {
            let mut write_error = None;
            let mut handler = |message: &Message| {
                if write_error.is_some() {
                    return;
                }
                if let Err(e) = writeln!(out, "{}", format_message(message, format))
                    .and_then(|()| out.flush())
                {
                    write_error = Some(e);
                }
            };

            if pattern {
                store.psubscribe(&channel, &mut handler).await?;
            } else {
                store.subscribe(&channel, &mut handler).await?;
            }

            if let Some(e) = write_error {
                return Err(e.into());
            }
            tracing::info!(channel = %channel, "Subscription closed");
        }
    }

    Ok(())
}

fn ack<W: Write>(out: &mut W, format: OutputFormat, quiet: bool) -> std::io::Result<()> {
    if quiet {
        return Ok(());
    }
    writeln!(out, "{}", format_ok(format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsredis::{MemoryClient, PubSub};

    async fn run(store: &MemoryClient, command: Commands, format: OutputFormat) -> String {
        let mut out = Vec::new();
        execute(store, command, format, false, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemoryClient::new("cli:");

        let ack = run(
            &store,
            Commands::Set {
                key: "k".to_string(),
                value: "v".to_string(),
                ttl: None,
            },
            OutputFormat::Pretty,
        )
        .await;
        assert_eq!(ack, "OK\n");

        let got = run(
            &store,
            Commands::Get {
                key: "k".to_string(),
            },
            OutputFormat::Json,
        )
        .await;
        assert_eq!(got, "{\"key\":\"k\",\"value\":\"v\"}\n");
        assert!(store.contains_physical("cli:k").await);
    }

    #[tokio::test]
    async fn test_quiet_suppresses_ack() {
        let store = MemoryClient::new("cli:");
        let mut out = Vec::new();

        execute(
            &store,
            Commands::Publish {
                channel: "chat".to_string(),
                message: "hi".to_string(),
            },
            OutputFormat::Pretty,
            true,
            &mut out,
        )
        .await
        .unwrap();

        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_hash_commands() {
        let store = MemoryClient::new("cli:");

        for (field, value) in [("a", "1"), ("b", "2")] {
            run(
                &store,
                Commands::Hset {
                    key: "h".to_string(),
                    field: field.to_string(),
                    value: value.to_string(),
                    ttl: Some(60),
                },
                OutputFormat::Pretty,
            )
            .await;
        }

        let all = run(
            &store,
            Commands::Hgetall {
                key: "h".to_string(),
            },
            OutputFormat::Pretty,
        )
        .await;
        assert_eq!(all, "a: 1\nb: 2\n");

        run(
            &store,
            Commands::Hdel {
                key: "h".to_string(),
                fields: vec!["a".to_string(), "b".to_string()],
            },
            OutputFormat::Pretty,
        )
        .await;

        let exists = run(
            &store,
            Commands::Exists {
                key: "h".to_string(),
            },
            OutputFormat::Pretty,
        )
        .await;
        assert_eq!(exists, "false\n");
    }

    #[tokio::test]
    async fn test_subscribe_prints_messages() {
        let store = MemoryClient::new("cli:");
        let subscriber = store.clone();
        let task = tokio::spawn(async move {
            let mut out = Vec::new();
            execute(
                &subscriber,
                Commands::Subscribe {
                    channel: "chat".to_string(),
                    pattern: false,
                },
                OutputFormat::Pretty,
                false,
                &mut out,
            )
            .await
            .map(|()| out)
        });

        while store.subscriber_count().await == 0 {
            tokio::task::yield_now().await;
        }
        store.publish("chat", "hello").await.unwrap();
        store.publish("chat", "again").await.unwrap();
        store.close_channels().await;

        let out = task.await.unwrap().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[chat] hello\n[chat] again\n");
    }
}
