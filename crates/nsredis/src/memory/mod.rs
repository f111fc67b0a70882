//! In-memory backend.
//!
//! [`MemoryClient`] mirrors the Redis facade inside the process: the same
//! prefixing, TTL defaults, not-found normalization, empty-hash cleanup and
//! global channels. Clients derived with [`MemoryClient::with_prefix`] share
//! one store, like several facades pointed at one server.

mod pubsub;
mod store;

pub use store::MemoryClient;
