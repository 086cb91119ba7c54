//! Pool error types.

use thiserror::Error;

/// Errors surfaced by the connection pool.
///
/// Exhaustion is a normal, expected condition and is reported distinctly
/// from connection establishment failures; callers decide whether and how
/// to back off and retry.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Configuration was rejected before any network activity.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Opening a new connection failed (bad credentials, unreachable host,
    /// timeout).
    #[error("failed to open connection")]
    Connect(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Every populated slot is lent out and the pool is at capacity.
    #[error("no connections available (pool exhausted)")]
    Exhausted,

    /// The pool has been closed.
    #[error("pool is closed")]
    Closed,
}

impl PoolError {
    pub(crate) fn connect<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connect(Box::new(source))
    }
}
