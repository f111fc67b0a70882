mod error;
mod namespace;
mod traits;
mod ttl;

pub use error::{Result, StoreError};
pub use namespace::Namespace;
pub use traits::{HashStore, KeyValue, PubSub, Store};
pub use ttl::{effective_ttl, ttl_millis, DEFAULT_TTL};
