//! Redis backend.
//!
//! [`RedisClient`] is the namespaced facade over a shared
//! `redis::aio::ConnectionManager`. Pub/sub opens a dedicated connection per
//! subscription from the same `redis::Client`.

mod client;
mod error;
mod pubsub;

pub use client::RedisClient;
