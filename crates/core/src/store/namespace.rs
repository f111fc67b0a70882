//! Key namespacing.
//!
//! A [`Namespace`] turns the logical keys an application uses into the
//! physical keys sent to the server by prepending a fixed prefix. Channel
//! names are never passed through a namespace.

use std::fmt;

/// An immutable key prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Namespace {
    prefix: String,
}

impl Namespace {
    /// Creates a namespace from a prefix. An empty prefix leaves keys untouched.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns the prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the physical key for a logical key.
    ///
    /// # Examples
    ///
    /// ```
    /// use nsredis_core::store::Namespace;
    ///
    /// let ns = Namespace::new("app:");
    /// assert_eq!(ns.key("user:1"), "app:user:1");
    /// ```
    pub fn key(&self, logical: &str) -> String {
        let mut physical = String::with_capacity(self.prefix.len() + logical.len());
        physical.push_str(&self.prefix);
        physical.push_str(logical);
        physical
    }

    /// Returns the physical keys for a list of logical keys, preserving order.
    pub fn keys<S: AsRef<str>>(&self, logical: &[S]) -> Vec<String> {
        logical.iter().map(|k| self.key(k.as_ref())).collect()
    }

    /// Returns the logical key for a physical key, or `None` when the key
    /// lies outside this namespace.
    ///
    /// # Examples
    ///
    /// ```
    /// use nsredis_core::store::Namespace;
    ///
    /// let ns = Namespace::new("app:");
    /// assert_eq!(ns.strip("app:user:1"), Some("user:1"));
    /// assert_eq!(ns.strip("other:user:1"), None);
    /// ```
    pub fn strip<'a>(&self, physical: &'a str) -> Option<&'a str> {
        physical.strip_prefix(self.prefix.as_str())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix)
    }
}

impl From<&str> for Namespace {
    fn from(prefix: &str) -> Self {
        Self::new(prefix)
    }
}

impl From<String> for Namespace {
    fn from(prefix: String) -> Self {
        Self::new(prefix)
    }
}
