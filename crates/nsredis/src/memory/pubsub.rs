//! In-memory pub/sub.
//!
//! Every channel and every pattern has its own tokio broadcast sender, so a
//! busy channel never makes subscribers of another channel lag. Pattern
//! subscriptions are matched when a message is published. Channel names are
//! never prefixed.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use nsredis_core::pubsub::channel_matches;
use nsredis_core::store::{PubSub, Result};
use nsredis_core::Message;

use super::store::MemoryClient;

/// Per-sender capacity. Subscribers lagging further behind lose the oldest messages.
const CHANNEL_CAPACITY: usize = 1024;

/// Broadcast senders keyed by channel name and by glob pattern.
#[derive(Debug, Default)]
pub(super) struct Channels {
    by_name: HashMap<String, broadcast::Sender<Message>>,
    by_pattern: HashMap<String, broadcast::Sender<Message>>,
}

impl Channels {
    fn senders(&self) -> impl Iterator<Item = &broadcast::Sender<Message>> {
        self.by_name.values().chain(self.by_pattern.values())
    }

    /// Drops senders nobody listens to anymore.
    fn prune(&mut self) {
        self.by_name.retain(|_, sender| sender.receiver_count() > 0);
        self.by_pattern.retain(|_, sender| sender.receiver_count() > 0);
    }
}

/// What a subscription listens to.
#[derive(Clone, Copy)]
enum Target<'a> {
    Channel(&'a str),
    Pattern(&'a str),
}

impl Target<'_> {
    fn lookup<'c>(&self, channels: &'c Channels) -> Option<&'c broadcast::Sender<Message>> {
        match self {
            Target::Channel(name) => channels.by_name.get(*name),
            Target::Pattern(pattern) => channels.by_pattern.get(*pattern),
        }
    }
}

impl MemoryClient {
    /// Ends every active subscription, as a dropped server connection would.
    ///
    /// Messages already published are still delivered before the
    /// subscriptions end. Later subscriptions get fresh senders.
    pub async fn close_channels(&self) {
        let mut channels = self.channels.write().await;
        channels.by_name.clear();
        channels.by_pattern.clear();
        info!("Closed all in-memory subscriptions");
    }

    /// Returns the number of active subscriptions.
    pub async fn subscriber_count(&self) -> usize {
        self.channels
            .read()
            .await
            .senders()
            .map(broadcast::Sender::receiver_count)
            .sum()
    }

    /// Gets or creates the sender for `target` and subscribes to it.
    async fn get_or_create_channel(&self, target: Target<'_>) -> broadcast::Receiver<Message> {
        // Try read lock first to avoid write contention
        {
            let channels = self.channels.read().await;
            if let Some(sender) = target.lookup(&channels) {
                return sender.subscribe();
            }
        }

        let mut channels = self.channels.write().await;

        // Double-check after acquiring write lock
        if let Some(sender) = target.lookup(&channels) {
            return sender.subscribe();
        }

        channels.prune();
        let (sender, receiver) = broadcast::channel(CHANNEL_CAPACITY);
        match target {
            Target::Channel(name) => channels.by_name.insert(name.to_string(), sender),
            Target::Pattern(pattern) => channels.by_pattern.insert(pattern.to_string(), sender),
        };
        receiver
    }

    async fn run_subscription(
        &self,
        target: Target<'_>,
        handler: &mut (dyn for<'m> FnMut(&'m Message) + Send),
    ) -> usize {
        let mut rx = self.get_or_create_channel(target).await;
        let mut delivered = 0;

        loop {
            match rx.recv().await {
                Ok(message) => {
                    handler(&message);
                    delivered += 1;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "In-memory subscriber lagged, messages dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }

        delivered
    }
}

#[async_trait]
impl PubSub for MemoryClient {
    async fn publish(&self, channel: &str, message: &str) -> Result<()> {
        let channels = self.channels.read().await;
        let mut receivers = 0;

        // No receivers is not an error, same as PUBLISH reaching zero clients.
        if let Some(sender) = channels.by_name.get(channel) {
            receivers += sender.send(Message::new(channel, message)).unwrap_or(0);
        }
        for (pattern, sender) in &channels.by_pattern {
            if channel_matches(pattern, channel) {
                let matched = Message::new(channel, message).with_pattern(pattern.as_str());
                receivers += sender.send(matched).unwrap_or(0);
            }
        }

        debug!(channel, receivers, "PUBLISH");
        Ok(())
    }

    async fn subscribe(
        &self,
        channel: &str,
        handler: &mut (dyn for<'m> FnMut(&'m Message) + Send),
    ) -> Result<()> {
        info!(channel, "Subscribed");
        let delivered = self
            .run_subscription(Target::Channel(channel), handler)
            .await;
        info!(channel, delivered, "Subscription stream ended");
        Ok(())
    }

    async fn psubscribe(
        &self,
        pattern: &str,
        handler: &mut (dyn for<'m> FnMut(&'m Message) + Send),
    ) -> Result<()> {
        info!(pattern, "Pattern subscribed");
        let delivered = self
            .run_subscription(Target::Pattern(pattern), handler)
            .await;
        info!(pattern, delivered, "Pattern subscription stream ended");
        Ok(())
    }
}
