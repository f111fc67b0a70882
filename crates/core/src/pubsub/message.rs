use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::store::{Result, StoreError};

/// A message received from a pub/sub subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Channel the message was published on.
    pub channel: String,
    /// Pattern that matched the channel, for pattern subscriptions.
    pub pattern: Option<String>,
    /// Raw payload.
    pub payload: String,
}

impl Message {
    /// Creates a message received through a plain channel subscription.
    pub fn new(channel: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            pattern: None,
            payload: payload.into(),
        }
    }

    /// Attaches the subscription pattern that matched the channel.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Decodes the payload as JSON.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Deserialization` when the payload is not valid
    /// JSON or does not match `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use nsredis_core::Message;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Ping { a: i64 }
    ///
    /// let msg = Message::new("chat", r#"{"a":1}"#);
    /// assert_eq!(msg.json::<Ping>().unwrap().a, 1);
    /// ```
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.payload).map_err(|e| StoreError::Deserialization(e.to_string()))
    }
}
