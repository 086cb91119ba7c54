//! # mysql-access-pool
//!
//! Bounded synchronous connection pool for MySQL.
//!
//! The pool owns a fixed-capacity set of connection slots guarded by a
//! single mutex, grows lazily up to its ceiling, probes liveness with
//! `SELECT 1` before lending a connection out, and replaces stale
//! connections in place. Acquisition never waits: an exhausted pool is
//! reported immediately and the caller applies its own backoff.
//!
//! ## Features
//!
//! - Eagerly opened warm set; creation fails atomically if any warm
//!   connection cannot be opened
//! - Validation before every checkout with transparent in-place
//!   replacement of dead sessions
//! - RAII checkout guards: connections return to the pool on every
//!   success and failure path
//! - Non-blocking exhaustion reporting, distinct from connection errors
//! - Injectable connection factory for driving the pool in tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use mysql_access_pool::{ConnectOptions, Pool, PoolConfig};
//! use mysql::prelude::Queryable;
//!
//! let opts = ConnectOptions::from_connection_string(
//!     "host=127.0.0.1;user=app;password=secret;database=inventory",
//! )?;
//!
//! let pool = Pool::connect(opts, PoolConfig::default())?;
//!
//! let mut conn = pool.acquire()?;
//! conn.query_drop("INSERT INTO audit (event) VALUES ('started')")?;
//! // `conn` returns to the pool when it goes out of scope.
//!
//! let status = pool.status();
//! println!("pool utilization: {:.1}%", status.utilization());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod factory;
pub mod pool;

// Configuration
pub use config::{
    ConnectOptions, DEFAULT_MAX_CONNECTIONS, DEFAULT_MIN_CONNECTIONS, PoolConfig,
};

// Error types
pub use error::PoolError;

// Factory seam
pub use factory::{Connection, ConnectionFactory, MySqlFactory};

// Pool types
pub use pool::{Pool, PoolMetrics, PoolStatus, PooledConnection};
