//! Client error types.

use mysql_access_pool::PoolError;
use thiserror::Error;

/// Convenience alias for results in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the database access layer.
#[derive(Debug, Error)]
pub enum Error {
    /// An operation was attempted after `close()` tore the layer down.
    #[error("database access layer is not initialized")]
    NotInitialized,

    /// The connection pool rejected the request.
    #[error("connection pool error")]
    Pool(#[from] PoolError),

    /// The server rejected a statement, or the session failed mid-statement.
    #[error("sql execution failed")]
    Sql(#[from] mysql::Error),

    /// A query builder was asked to render an incomplete statement.
    #[error("invalid query: {0}")]
    Query(String),
}

impl Error {
    /// Whether this is the user-visible "database busy" condition: the pool
    /// was exhausted and the caller should back off and retry externally.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Pool(PoolError::Exhausted))
    }
}
