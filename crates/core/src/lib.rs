//! Functional core for nsredis.
//!
//! Everything in this crate is free of I/O: key namespacing, the pub/sub
//! message type, error types and the traits implemented by the backends in
//! the `nsredis` crate.

pub mod pubsub;
pub mod store;

pub use pubsub::Message;
pub use store::{Result, StoreError};
