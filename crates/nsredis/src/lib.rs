//! Namespaced Redis facade.
//!
//! Wraps a Redis connection so that every key an application uses is
//! transparently prefixed, writes get a default TTL, and "not found" reads
//! come back as empty values instead of errors. Pub/sub channels are global
//! and never prefixed.
//!
//! # Feature Flags
//!
//! - `redis` (default): [`RedisClient`], backed by the `redis` crate
//! - `memory` (default): [`MemoryClient`], an in-process store with the same
//!   semantics, useful for tests and single-process deployments

#[cfg(not(any(feature = "memory", feature = "redis")))]
compile_error!(
    "No store backend selected. Enable 'memory' or 'redis' feature. \
    Example: cargo build -p nsredis --features redis"
);

mod config;
#[cfg(feature = "redis")]
mod locks;

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "redis")]
pub mod redis_impl;

pub use config::{Config, DEFAULT_CONNECT_TIMEOUT};
pub use nsredis_core::store::{
    HashStore, KeyValue, Namespace, PubSub, Store, StoreError, DEFAULT_TTL,
};
pub use nsredis_core::{Message, Result};

#[cfg(feature = "memory")]
pub use memory::MemoryClient;

#[cfg(feature = "redis")]
pub use redis_impl::RedisClient;
