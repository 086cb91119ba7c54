//! # mysql-access-client
//!
//! Managed MySQL access layer built on [`mysql_access_pool`].
//!
//! One [`Database`] object bundles the two connection resources the layer
//! manages: a bounded pool serving high-frequency CRUD, and a single
//! non-pooled administrative connection for schema DDL. Setup and teardown
//! are each one call; CRUD methods acquire from the pool, execute exactly
//! one statement, and release on every path.
//!
//! Statements are assembled by plain string substitution (see [`query`]);
//! parameterized queries are out of scope for this layer.
//!
//! ## Example
//!
//! ```rust,ignore
//! use mysql_access_client::{ConnectOptions, Database, PoolConfig, SelectQuery};
//!
//! let opts = ConnectOptions::from_connection_string(
//!     "host=127.0.0.1;user=app;password=secret;database=inventory",
//! )?;
//! let mut db = Database::connect(opts, PoolConfig::default())?;
//!
//! db.admin()?.create_table(
//!     "devices",
//!     "id INT PRIMARY KEY AUTO_INCREMENT, name VARCHAR(64) NOT NULL, qty INT",
//! )?;
//!
//! db.insert("devices", &["name", "qty"], vec!["router".into(), 3.into()])?;
//!
//! let rows = db.select(&SelectQuery::new().from("devices"))?;
//! for row in &rows {
//!     println!("{:?} x{:?}", row.get_by_name("name"), row.get_by_name("qty"));
//! }
//!
//! db.close();
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod admin;
pub mod database;
pub mod error;
pub mod query;
pub mod row;

// Re-export commonly used types
pub use admin::AdminConnection;
pub use database::Database;
pub use error::{Error, Result};
pub use mysql_access_pool::{
    ConnectOptions, Pool, PoolConfig, PoolError, PoolMetrics, PoolStatus, PooledConnection,
};
pub use query::{DeleteQuery, InsertQuery, Literal, Order, SelectQuery, UpdateQuery};
pub use row::Row;
