//! Redis error mapping to StoreError.

use nsredis_core::StoreError;

/// Connection-level failures are reported the same way for every command.
fn is_connection_error(err: &redis::RedisError) -> bool {
    err.is_connection_refusal() || err.is_timeout() || err.is_connection_dropped()
}

/// Maps Redis errors from key and hash commands to StoreError.
pub fn map_redis_error(err: redis::RedisError) -> StoreError {
    if is_connection_error(&err) {
        StoreError::ConnectionFailed(err.to_string())
    } else {
        StoreError::OperationFailed(err.to_string())
    }
}

/// Maps a failed PUBLISH.
pub fn map_publish_error(err: redis::RedisError) -> StoreError {
    if is_connection_error(&err) {
        StoreError::ConnectionFailed(err.to_string())
    } else {
        StoreError::PublishFailed(err.to_string())
    }
}

/// Maps a failure while opening a subscription.
pub fn map_subscribe_error(err: redis::RedisError) -> StoreError {
    if is_connection_error(&err) {
        StoreError::ConnectionFailed(err.to_string())
    } else {
        StoreError::SubscribeFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redis::{ErrorKind, RedisError};

    fn type_error() -> RedisError {
        RedisError::from((ErrorKind::TypeError, "WRONGTYPE", "hash".to_string()))
    }

    fn io_error() -> RedisError {
        RedisError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ))
    }

    #[test]
    fn test_command_errors_are_operation_failures() {
        assert!(matches!(
            map_redis_error(type_error()),
            StoreError::OperationFailed(_)
        ));
        assert!(matches!(
            map_publish_error(type_error()),
            StoreError::PublishFailed(_)
        ));
        assert!(matches!(
            map_subscribe_error(type_error()),
            StoreError::SubscribeFailed(_)
        ));
    }

    #[test]
    fn test_connection_refusal_is_connection_failure() {
        assert!(matches!(
            map_redis_error(io_error()),
            StoreError::ConnectionFailed(_)
        ));
        assert!(matches!(
            map_publish_error(io_error()),
            StoreError::ConnectionFailed(_)
        ));
        assert!(matches!(
            map_subscribe_error(io_error()),
            StoreError::ConnectionFailed(_)
        ));
    }
}
