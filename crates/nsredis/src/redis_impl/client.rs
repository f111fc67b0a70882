//! Key-value and hash operations of the Redis facade.
//!
//! # Multi-command writes
//!
//! `hset` and `hdel` issue more than one command and are not atomic:
//!
//! - **hset**: HSET then PEXPIRE. Both run under the per-key lock so two
//!   writers in this process cannot interleave their TTLs. If PEXPIRE fails
//!   the field is still written; the failure is logged and not returned.
//!
//! - **hdel**: HDEL, HLEN, then DEL when no field remains. Each step only
//!   runs when the previous one succeeded, so a crash between steps can
//!   leave an empty hash reference that the next `hdel` cleans up.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, warn};

use nsredis_core::store::{
    effective_ttl, ttl_millis, HashStore, KeyValue, Namespace, Result, StoreError, DEFAULT_TTL,
};

use super::error::map_redis_error;
use crate::config::{Config, DEFAULT_CONNECT_TIMEOUT};
use crate::locks::KeyLocks;

/// Namespaced facade over a shared Redis connection.
///
/// Cloning is cheap: clones share the connection manager and the per-key
/// write locks.
#[derive(Clone)]
pub struct RedisClient {
    pub(super) client: redis::Client,
    pub(super) conn: redis::aio::ConnectionManager,
    namespace: Namespace,
    default_ttl: Duration,
    locks: Arc<KeyLocks>,
}

impl std::fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisClient")
            .field("prefix", &self.namespace.prefix())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl RedisClient {
    /// Connects to Redis and creates a facade using the given prefix.
    ///
    /// # Arguments
    ///
    /// * `url` - Redis connection URL (e.g., "redis://localhost:6379")
    /// * `prefix` - Prepended to every key
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ConnectionFailed` if the connection cannot be
    /// established within [`DEFAULT_CONNECT_TIMEOUT`].
    pub async fn open(url: &str, prefix: impl Into<String>) -> Result<Self> {
        Self::open_with_timeout(url, prefix, DEFAULT_CONNECT_TIMEOUT).await
    }

    /// Like [`RedisClient::open`], giving up after `timeout`.
    pub async fn open_with_timeout(
        url: &str,
        prefix: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;

        // The connection manager retries the first connection on its own.
        let connecting = redis::aio::ConnectionManager::new(client.clone());
        let conn = tokio::time::timeout(timeout, connecting)
            .await
            .map_err(|_| {
                StoreError::ConnectionFailed(format!(
                    "timed out after {timeout:?} connecting to Redis"
                ))
            })?
            .map_err(map_redis_error)?;

        Ok(Self::new(client, conn, prefix))
    }

    /// Connects using a [`Config`], applying its prefix, default TTL and
    /// connection timeout.
    pub async fn connect(config: &Config) -> Result<Self> {
        let facade = Self::open_with_timeout(
            &config.redis_url,
            config.prefix.clone(),
            config.connect_timeout(),
        )
        .await?;
        Ok(facade.with_default_ttl(config.default_ttl()))
    }

    /// Wraps an existing client and connection.
    ///
    /// The connection manager is shared with the caller; `client` is only
    /// used to open dedicated pub/sub connections.
    pub fn new(
        client: redis::Client,
        conn: redis::aio::ConnectionManager,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            client,
            conn,
            namespace: Namespace::new(prefix),
            default_ttl: DEFAULT_TTL,
            locks: Arc::new(KeyLocks::default()),
        }
    }

    /// Replaces the TTL applied to writes that don't specify one.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Returns the key prefix.
    pub fn prefix(&self) -> &str {
        self.namespace.prefix()
    }

    /// Returns the TTL applied to writes that don't specify one.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns the namespace used to build physical keys.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }
}

#[async_trait]
impl KeyValue for RedisClient {
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let key = self.namespace.key(key);
        let mut conn = self.conn.clone();
        let millis = i64::try_from(ttl_millis(ttl)).unwrap_or(i64::MAX);

        let applied: bool = conn.pexpire(&key, millis).await.map_err(map_redis_error)?;

        debug!(key = %key, ttl_ms = millis, applied, "PEXPIRE");
        Ok(applied)
    }

    async fn get_opt(&self, key: &str) -> Result<Option<String>> {
        let key = self.namespace.key(key);
        let mut conn = self.conn.clone();

        let value: Option<String> = conn.get(&key).await.map_err(map_redis_error)?;

        debug!(key = %key, hit = value.is_some(), "GET");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let key = self.namespace.key(key);
        let mut conn = self.conn.clone();

        // SET with PX is a single atomic command, no local lock needed.
        match effective_ttl(ttl, self.default_ttl) {
            Some(ttl) => {
                let millis = ttl_millis(ttl);
                conn.pset_ex::<_, _, ()>(&key, value, millis)
                    .await
                    .map_err(map_redis_error)?;
                debug!(key = %key, ttl_ms = millis, "SET PX");
            }
            None => {
                conn.set::<_, _, ()>(&key, value)
                    .await
                    .map_err(map_redis_error)?;
                debug!(key = %key, "SET");
            }
        }

        Ok(())
    }

    async fn del(&self, keys: &[&str]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let keys = self.namespace.keys(keys);
        let mut conn = self.conn.clone();

        let deleted: i64 = conn.del(&keys).await.map_err(map_redis_error)?;

        debug!(keys = ?keys, deleted, "DEL");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let key = self.namespace.key(key);
        let mut conn = self.conn.clone();

        conn.exists(&key).await.map_err(map_redis_error)
    }
}

#[async_trait]
impl HashStore for RedisClient {
    async fn hget_opt(&self, key: &str, field: &str) -> Result<Option<String>> {
        let key = self.namespace.key(key);
        let mut conn = self.conn.clone();

        let value: Option<String> = conn.hget(&key, field).await.map_err(map_redis_error)?;

        debug!(key = %key, field, hit = value.is_some(), "HGET");
        Ok(value)
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let key = self.namespace.key(key);
        let mut conn = self.conn.clone();

        // HGETALL on a missing key is an empty reply, never nil.
        let fields: HashMap<String, String> = conn.hgetall(&key).await.map_err(map_redis_error)?;

        debug!(key = %key, fields = fields.len(), "HGETALL");
        Ok(fields)
    }

    async fn hset(
        &self,
        key: &str,
        field: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let key = self.namespace.key(key);
        let mut conn = self.conn.clone();
        let _guard = self.locks.lock(&key).await;

        conn.hset::<_, _, _, ()>(&key, field, value)
            .await
            .map_err(map_redis_error)?;
        debug!(key = %key, field, "HSET");

        // A zero TTL sends no PEXPIRE, so the hash keeps its current expiration.
        let Some(ttl) = effective_ttl(ttl, self.default_ttl) else {
            return Ok(());
        };
        let millis = i64::try_from(ttl_millis(ttl)).unwrap_or(i64::MAX);

        // The field write already succeeded; an expire failure does not fail hset.
        if let Err(e) = conn.pexpire::<_, bool>(&key, millis).await {
            warn!(key = %key, error = %e, "Failed to apply TTL after HSET");
        }

        Ok(())
    }

    async fn hdel(&self, key: &str, fields: &[&str]) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }

        let key = self.namespace.key(key);
        let mut conn = self.conn.clone();

        conn.hdel::<_, _, ()>(&key, fields)
            .await
            .map_err(map_redis_error)?;

        let remaining: usize = conn.hlen(&key).await.map_err(map_redis_error)?;
        debug!(key = %key, fields = ?fields, remaining, "HDEL");

        if remaining == 0 {
            conn.del::<_, ()>(&key).await.map_err(map_redis_error)?;
            debug!(key = %key, "Deleted empty hash");
        }

        Ok(())
    }
}
