use verify_core::Error;

pub(crate) fn from_redis(err: redis::RedisError) -> Error {
    if err.is_timeout() {
        Error::Timeout(err.to_string())
    } else if err.is_connection_dropped() || err.is_connection_refusal() {
        Error::Transient(err.to_string())
    } else {
        Error::Internal(format!("redis error: {err}"))
    }
}

pub(crate) fn from_json(err: serde_json::Error) -> Error {
    Error::Deserialization(err.to_string())
}
