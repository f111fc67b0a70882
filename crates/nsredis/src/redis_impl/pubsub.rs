//! Redis pub/sub for the facade.
//!
//! Channels are global: unlike keys, channel names are sent to the server
//! exactly as given.

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::AsyncCommands;
use tracing::{debug, info};

use nsredis_core::store::{PubSub, Result};
use nsredis_core::Message;

use super::client::RedisClient;
use super::error::{map_publish_error, map_subscribe_error};

#[async_trait]
impl PubSub for RedisClient {
    async fn publish(&self, channel: &str, message: &str) -> Result<()> {
        let mut conn = self.conn.clone();

        let receivers: i64 = conn
            .publish(channel, message)
            .await
            .map_err(map_publish_error)?;

        debug!(channel, receivers, "PUBLISH");
        Ok(())
    }

    async fn subscribe(
        &self,
        channel: &str,
        handler: &mut (dyn for<'m> FnMut(&'m Message) + Send),
    ) -> Result<()> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(map_subscribe_error)?;
        pubsub.subscribe(channel).await.map_err(map_subscribe_error)?;

        info!(channel, "Subscribed");
        let delivered = run_receive_loop(&mut pubsub, handler).await;
        info!(channel, delivered, "Subscription stream ended");

        Ok(())
    }

    async fn psubscribe(
        &self,
        pattern: &str,
        handler: &mut (dyn for<'m> FnMut(&'m Message) + Send),
    ) -> Result<()> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(map_subscribe_error)?;
        pubsub
            .psubscribe(pattern)
            .await
            .map_err(map_subscribe_error)?;

        info!(pattern, "Pattern subscribed");
        let delivered = run_receive_loop(&mut pubsub, handler).await;
        info!(pattern, delivered, "Pattern subscription stream ended");

        Ok(())
    }
}

/// Delivers messages to `handler` in arrival order until the stream ends.
///
/// The pub/sub connection is owned by the caller and closed when it is
/// dropped after this returns. Returns the number of delivered messages.
async fn run_receive_loop(
    pubsub: &mut redis::aio::PubSub,
    handler: &mut (dyn for<'m> FnMut(&'m Message) + Send),
) -> usize {
    let mut stream = pubsub.on_message();
    let mut delivered = 0;

    while let Some(msg) = stream.next().await {
        handler(&to_message(&msg));
        delivered += 1;
    }

    delivered
}

/// Converts a raw pub/sub message. Non UTF-8 payload bytes are replaced.
fn to_message(msg: &redis::Msg) -> Message {
    let payload = String::from_utf8_lossy(msg.get_payload_bytes()).into_owned();
    let message = Message::new(msg.get_channel_name(), payload);

    if !msg.from_pattern() {
        return message;
    }
    match msg.get_pattern::<String>() {
        Ok(pattern) => message.with_pattern(pattern),
        Err(_) => message,
    }
}

#[cfg(test)]
mod tests {
    use super::super::client::tests::get_test_client;
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::task::JoinHandle;
    use uuid::Uuid;

    fn unique_channel(name: &str) -> String {
        format!("test:nsredis:{}:{}", Uuid::new_v4(), name)
    }

    /// Spawns a subscriber that forwards every message to the returned receiver.
    fn spawn_subscriber(
        client: RedisClient,
        channel: String,
    ) -> (JoinHandle<Result<()>>, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            let mut handler = move |msg: &Message| {
                let _ = tx.send(msg.clone());
            };
            client.subscribe(&channel, &mut handler).await
        });
        (task, rx)
    }

    #[tokio::test]
    async fn test_redis_publish_without_subscribers() {
        let Some(client) = get_test_client().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        client
            .publish(&unique_channel("nobody"), "hello")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_redis_publish_and_subscribe_exactly_once() {
        let Some(client) = get_test_client().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let channel = unique_channel("chat");
        let (task, mut rx) = spawn_subscriber(client.clone(), channel.clone());

        // Give the subscription time to establish
        tokio::time::sleep(Duration::from_millis(100)).await;

        client.publish(&channel, "hello").await.unwrap();

        let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("Timeout waiting for message")
            .expect("Subscriber ended early");
        assert_eq!(received, Message::new(channel.clone(), "hello"));

        let extra = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
        assert!(extra.is_err(), "Message delivered more than once");

        task.abort();
    }

    #[tokio::test]
    async fn test_redis_channels_are_not_prefixed() {
        let (Some(publisher), Some(subscriber)) =
            (get_test_client().await, get_test_client().await)
        else {
            eprintln!("Skipping test: Redis not available");
            return;
        };
        assert_ne!(publisher.prefix(), subscriber.prefix());

        let channel = unique_channel("global");
        let (task, mut rx) = spawn_subscriber(subscriber, channel.clone());
        tokio::time::sleep(Duration::from_millis(100)).await;

        publisher.publish(&channel, r#"{"a":1}"#).await.unwrap();

        let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("Timeout waiting for message")
            .expect("Subscriber ended early");
        assert_eq!(received.channel, channel);
        let value: serde_json::Value = received.json().unwrap();
        assert_eq!(value["a"], 1);

        task.abort();
    }

    #[tokio::test]
    async fn test_redis_messages_arrive_in_order() {
        let Some(client) = get_test_client().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let channel = unique_channel("ordered");
        let (task, mut rx) = spawn_subscriber(client.clone(), channel.clone());
        tokio::time::sleep(Duration::from_millis(100)).await;

        for i in 0..5 {
            client.publish(&channel, &i.to_string()).await.unwrap();
        }

        for i in 0..5 {
            let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("Timeout waiting for message")
                .expect("Subscriber ended early");
            assert_eq!(msg.payload, i.to_string());
        }

        task.abort();
    }

    #[tokio::test]
    async fn test_redis_psubscribe_sets_pattern() {
        let Some(client) = get_test_client().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let base = unique_channel("news");
        let pattern = format!("{}.*", base);
        let channel = format!("{}.sport", base);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscriber = client.clone();
        let task_pattern = pattern.clone();
        let task = tokio::spawn(async move {
            let mut handler = move |msg: &Message| {
                let _ = tx.send(msg.clone());
            };
            subscriber.psubscribe(&task_pattern, &mut handler).await
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        client.publish(&channel, "goal").await.unwrap();

        let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("Timeout waiting for message")
            .expect("Subscriber ended early");
        assert_eq!(received, Message::new(channel, "goal").with_pattern(pattern));

        task.abort();
    }
}
