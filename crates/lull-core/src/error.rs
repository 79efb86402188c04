use thiserror::Error;
use web_time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoalesceError {
    #[error("`{name}` must be a non-negative number of milliseconds, got {value}")]
    InvalidArgument { name: &'static str, value: i64 },

    #[error("no timer host installed on this thread; call `set_host` first")]
    NoTimerHost,
}

pub type Result<T, E = CoalesceError> = std::result::Result<T, E>;

/// Validate a signed millisecond count. Negative values are rejected, never clamped.
pub fn millis(name: &'static str, value: i64) -> Result<Duration> {
    u64::try_from(value)
        .map(Duration::from_millis)
        .map_err(|_| CoalesceError::InvalidArgument { name, value })
}
