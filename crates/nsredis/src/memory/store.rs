//! Key-value and hash operations of the in-memory backend.
//!
//! TTLs expire lazily: an expired entry is dropped the next time its key is
//! accessed, and every `SWEEP_INTERVAL` writes all expired entries are
//! dropped at once. Operating on a key holding the other value type fails
//! with a WRONGTYPE error, as Redis does.

use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use nsredis_core::store::{
    effective_ttl, HashStore, KeyValue, Namespace, Result, StoreError, DEFAULT_TTL,
};

use super::pubsub::Channels;

const WRONGTYPE: &str =
    "WRONGTYPE Operation against a key holding the wrong kind of value";

const INVALID_EXPIRE: &str = "ERR invalid expire time";

/// Writes between two sweeps of expired entries.
const SWEEP_INTERVAL: usize = 256;

/// A stored value.
#[derive(Debug, Clone)]
enum Value {
    String(String),
    Hash(HashMap<String, String>),
}

/// A single entry with optional expiration.
#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value, expires_at: Option<Instant>) -> Self {
        Self { value, expires_at }
    }

    fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}

/// Returns the instant `ttl` from now.
///
/// Fails when that instant cannot be represented, which Redis reports as an
/// invalid expire time.
fn deadline(ttl: Duration) -> Result<Instant> {
    Instant::now()
        .checked_add(ttl)
        .ok_or_else(|| StoreError::OperationFailed(INVALID_EXPIRE.to_string()))
}

#[derive(Debug, Default)]
struct Keyspace {
    entries: HashMap<String, Entry>,
    writes: usize,
}

impl Keyspace {
    /// Drops `key` if it has expired, then returns its live entry.
    fn live(&mut self, key: &str) -> Option<&mut Entry> {
        let now = Instant::now();
        if self.entries.get(key).is_some_and(|e| e.is_expired_at(now)) {
            self.entries.remove(key);
        }
        self.entries.get_mut(key)
    }

    /// Counts a write and sweeps expired entries every `SWEEP_INTERVAL` writes.
    fn record_write(&mut self) {
        self.writes += 1;
        if self.writes < SWEEP_INTERVAL {
            return;
        }
        self.writes = 0;

        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        debug!(swept = before - self.entries.len(), "Swept expired entries");
    }
}

/// In-process facade with the same semantics as the Redis backend.
#[derive(Debug, Clone)]
pub struct MemoryClient {
    keyspace: Arc<RwLock<Keyspace>>,
    pub(super) channels: Arc<RwLock<Channels>>,
    namespace: Namespace,
    default_ttl: Duration,
}

impl MemoryClient {
    /// Creates a client over a new, empty store.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            keyspace: Arc::new(RwLock::new(Keyspace::default())),
            channels: Arc::new(RwLock::new(Channels::default())),
            namespace: Namespace::new(prefix),
            default_ttl: DEFAULT_TTL,
        }
    }

    /// Creates a client sharing this client's store and channels under another prefix.
    pub fn with_prefix(&self, prefix: impl Into<String>) -> Self {
        Self {
            keyspace: Arc::clone(&self.keyspace),
            channels: Arc::clone(&self.channels),
            namespace: Namespace::new(prefix),
            default_ttl: self.default_ttl,
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

    /// Returns whether a physical key holds a live entry, bypassing the namespace.
    pub async fn contains_physical(&self, physical: &str) -> bool {
        self.keyspace.write().await.live(physical).is_some()
    }

    /// Returns the remaining TTL of a live key, `None` when it never expires
    /// or does not exist.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let key = self.namespace.key(key);
        let mut keyspace = self.keyspace.write().await;
        keyspace
            .live(&key)
            .and_then(|entry| entry.expires_at)
            .map(|exp| exp.saturating_duration_since(Instant::now()))
    }
}

impl Default for MemoryClient {
    fn default() -> Self {
        Self::new("")
    }
}

#[async_trait]
impl KeyValue for MemoryClient {
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let key = self.namespace.key(key);
        // A zero TTL expires the key immediately, as PEXPIRE 0 does.
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Some(deadline(ttl)?)
        };
        let mut keyspace = self.keyspace.write().await;

        let Some(entry) = keyspace.live(&key) else {
            return Ok(false);
        };
        match expires_at {
            Some(at) => entry.expires_at = Some(at),
            None => {
                keyspace.entries.remove(&key);
            }
        }
        keyspace.record_write();

        Ok(true)
    }

    async fn get_opt(&self, key: &str) -> Result<Option<String>> {
        let key = self.namespace.key(key);
        let mut keyspace = self.keyspace.write().await;

        match keyspace.live(&key) {
            Some(Entry {
                value: Value::String(s),
                ..
            }) => Ok(Some(s.clone())),
            Some(_) => Err(StoreError::OperationFailed(WRONGTYPE.to_string())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let key = self.namespace.key(key);
        let expires_at = effective_ttl(ttl, self.default_ttl)
            .map(deadline)
            .transpose()?;

        let mut keyspace = self.keyspace.write().await;
        keyspace
            .entries
            .insert(key, Entry::new(Value::String(value.to_string()), expires_at));
        keyspace.record_write();

        Ok(())
    }

    async fn del(&self, keys: &[&str]) -> Result<()> {
        let mut keyspace = self.keyspace.write().await;
        for key in self.namespace.keys(keys) {
            keyspace.entries.remove(&key);
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let key = self.namespace.key(key);
        Ok(self.contains_physical(&key).await)
    }
}

#[async_trait]
impl HashStore for MemoryClient {
    async fn hget_opt(&self, key: &str, field: &str) -> Result<Option<String>> {
        let key = self.namespace.key(key);
        let mut keyspace = self.keyspace.write().await;

        match keyspace.live(&key) {
            Some(Entry {
                value: Value::Hash(fields),
                ..
            }) => Ok(fields.get(field).cloned()),
            Some(_) => Err(StoreError::OperationFailed(WRONGTYPE.to_string())),
            None => Ok(None),
        }
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let key = self.namespace.key(key);
        let mut keyspace = self.keyspace.write().await;

        match keyspace.live(&key) {
            Some(Entry {
                value: Value::Hash(fields),
                ..
            }) => Ok(fields.clone()),
            Some(_) => Err(StoreError::OperationFailed(WRONGTYPE.to_string())),
            None => Ok(HashMap::new()),
        }
    }

    async fn hset(
        &self,
        key: &str,
        field: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let key = self.namespace.key(key);
        let ttl = effective_ttl(ttl, self.default_ttl);
        let mut keyspace = self.keyspace.write().await;

        keyspace.live(&key);
        let entry = match keyspace.entries.entry(key.clone()) {
            MapEntry::Occupied(occupied) => occupied.into_mut(),
            MapEntry::Vacant(vacant) => vacant.insert(Entry::new(Value::Hash(HashMap::new()), None)),
        };
        let Value::Hash(fields) = &mut entry.value else {
            return Err(StoreError::OperationFailed(WRONGTYPE.to_string()));
        };
        fields.insert(field.to_string(), value.to_string());

        // A zero TTL leaves the current expiration untouched. An invalid TTL
        // keeps the field write, like a failed PEXPIRE after HSET.
        if let Some(ttl) = ttl {
            match deadline(ttl) {
                Ok(at) => entry.expires_at = Some(at),
                Err(e) => warn!(key = %key, error = %e, "Failed to apply TTL after HSET"),
            }
        }
        keyspace.record_write();

        Ok(())
    }

    async fn hdel(&self, key: &str, fields: &[&str]) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }

        let key = self.namespace.key(key);
        let mut keyspace = self.keyspace.write().await;

        let remaining = match keyspace.live(&key) {
            Some(Entry {
                value: Value::Hash(hash),
                ..
            }) => {
                for field in fields {
                    hash.remove(*field);
                }
                hash.len()
            }
            Some(_) => return Err(StoreError::OperationFailed(WRONGTYPE.to_string())),
            None => 0,
        };

        if remaining == 0 {
            keyspace.entries.remove(&key);
        }

        Ok(())
    }
}
