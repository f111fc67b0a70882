use std::time::Duration;

/// Expiration applied when a write does not specify one: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Resolves the TTL for a write.
///
/// `None` falls back to `default`. A zero duration means the value never
/// expires, which is reported as `None`.
pub fn effective_ttl(ttl: Option<Duration>, default: Duration) -> Option<Duration> {
    let ttl = ttl.unwrap_or(default);
    (!ttl.is_zero()).then_some(ttl)
}

/// Converts a TTL to whole milliseconds, rounding sub-millisecond durations
/// up so they still expire rather than persist.
pub fn ttl_millis(ttl: Duration) -> u64 {
    let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
    if millis == 0 && !ttl.is_zero() {
        1
    } else {
        millis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ttl_is_one_day() {
        assert_eq!(DEFAULT_TTL.as_secs(), 86_400);
    }

    #[test]
    fn test_none_uses_default() {
        let default = Duration::from_secs(30);
        assert_eq!(effective_ttl(None, default), Some(default));
    }

    #[test]
    fn test_explicit_ttl_wins() {
        let ttl = Duration::from_millis(1500);
        assert_eq!(effective_ttl(Some(ttl), DEFAULT_TTL), Some(ttl));
    }

    #[test]
    fn test_zero_means_persistent() {
        assert_eq!(effective_ttl(Some(Duration::ZERO), DEFAULT_TTL), None);
        assert_eq!(effective_ttl(None, Duration::ZERO), None);
    }

    #[test]
    fn test_ttl_millis_rounds_up() {
        assert_eq!(ttl_millis(Duration::from_micros(10)), 1);
        assert_eq!(ttl_millis(Duration::from_millis(250)), 250);
        assert_eq!(ttl_millis(Duration::ZERO), 0);
    }
}
