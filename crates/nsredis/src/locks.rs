//! Per-key write serialization.
//!
//! Multi-command writes (HSET followed by PEXPIRE) for the same physical key
//! must not interleave within a process. Keys are hashed onto a fixed set of
//! mutexes, so unrelated keys rarely contend and memory stays bounded.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tokio::sync::{Mutex, MutexGuard};

/// Number of stripes when none is given.
pub const DEFAULT_STRIPES: usize = 64;

/// A fixed set of mutexes indexed by key hash.
#[derive(Debug)]
pub struct KeyLocks {
    stripes: Vec<Mutex<()>>,
}

impl KeyLocks {
    /// Creates a lock set with `stripes` mutexes (at least one).
    pub fn new(stripes: usize) -> Self {
        Self {
            stripes: (0..stripes.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Acquires the mutex guarding `key`.
    pub async fn lock(&self, key: &str) -> MutexGuard<'_, ()> {
        self.stripes[self.stripe(key)].lock().await
    }

    fn stripe(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }
}

impl Default for KeyLocks {
    fn default() -> Self {
        Self::new(DEFAULT_STRIPES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_zero_stripes_clamped() {
        let locks = KeyLocks::new(0);
        assert_eq!(locks.stripes.len(), 1);
    }

    #[test]
    fn test_same_key_same_stripe() {
        let locks = KeyLocks::default();
        assert_eq!(locks.stripe("app:user:1"), locks.stripe("app:user:1"));
    }

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(KeyLocks::new(8));
        let guard = locks.lock("k").await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("k").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("contender should acquire the lock")
            .unwrap();
    }
}
