use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::pubsub::Message;

use super::Result;

/// String keys with expiration.
///
/// Every `key` argument is a logical key; implementations prefix it with
/// their namespace before touching the store.
#[async_trait]
pub trait KeyValue: Send + Sync {
    /// Sets a TTL on a key. Returns `true` when the key exists.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Gets a string value, distinguishing an absent key (`None`).
    async fn get_opt(&self, key: &str) -> Result<Option<String>>;

    /// Gets a string value. An absent key yields an empty string.
    async fn get(&self, key: &str) -> Result<String> {
        Ok(self.get_opt(key).await?.unwrap_or_default())
    }

    /// Sets a string value. `None` applies the default TTL; a zero TTL never expires.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Deletes keys in a single request.
    async fn del(&self, keys: &[&str]) -> Result<()>;

    /// Returns whether a key exists.
    async fn exists(&self, key: &str) -> Result<bool>;
}

/// Hash keys whose last field removal deletes the key.
#[async_trait]
pub trait HashStore: Send + Sync {
    /// Gets a hash field, distinguishing an absent key or field (`None`).
    async fn hget_opt(&self, key: &str, field: &str) -> Result<Option<String>>;

    /// Gets a hash field. An absent key or field yields an empty string.
    async fn hget(&self, key: &str, field: &str) -> Result<String> {
        Ok(self.hget_opt(key, field).await?.unwrap_or_default())
    }

    /// Gets all fields of a hash. An absent key yields an empty map.
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>>;

    /// Sets a hash field, then applies the TTL to the whole hash.
    ///
    /// Only the field write determines the result; a failing expire is logged.
    async fn hset(&self, key: &str, field: &str, value: &str, ttl: Option<Duration>)
        -> Result<()>;

    /// Deletes fields, then deletes the hash itself once no field remains.
    async fn hdel(&self, key: &str, fields: &[&str]) -> Result<()>;
}

/// Publish/subscribe on global (unprefixed) channels.
#[async_trait]
pub trait PubSub: Send + Sync {
    /// Publishes a message on a channel.
    async fn publish(&self, channel: &str, message: &str) -> Result<()>;

    /// Invokes `handler` for every message on `channel`, in order, until the
    /// subscription's stream closes.
    async fn subscribe(
        &self,
        channel: &str,
        handler: &mut (dyn for<'m> FnMut(&'m Message) + Send),
    ) -> Result<()>;

    /// Like [`PubSub::subscribe`] for every channel matching a glob pattern.
    async fn psubscribe(
        &self,
        pattern: &str,
        handler: &mut (dyn for<'m> FnMut(&'m Message) + Send),
    ) -> Result<()>;
}

/// Backends that support every facade operation.
pub trait Store: KeyValue + HashStore + PubSub {}

impl<T: KeyValue + HashStore + PubSub> Store for T {}
