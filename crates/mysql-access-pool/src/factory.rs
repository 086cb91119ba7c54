//! Connection establishment.
//!
//! A factory opens exactly one connection per call and never retries;
//! the pool decides whether and how to retry. The factory seam also lets
//! tests drive the pool with in-memory connections.

use std::time::Duration;

use mysql::prelude::Queryable;

use crate::config::ConnectOptions;

/// Timeout applied uniformly to TCP connect, read, and write.
const NETWORK_TIMEOUT: Duration = Duration::from_secs(60);

/// A live database connection the pool can lend out.
pub trait Connection: Send + 'static {
    /// Lightweight liveness probe. Returns `false` if the session is no
    /// longer usable.
    fn ping(&mut self) -> bool;
}

/// Opens new database connections for the pool.
pub trait ConnectionFactory: Send + Sync + 'static {
    /// Connection type produced by this factory.
    type Conn: Connection;

    /// Error produced when establishment fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open one new connection.
    fn connect(&self) -> Result<Self::Conn, Self::Error>;
}

impl Connection for mysql::Conn {
    fn ping(&mut self) -> bool {
        self.query_drop("SELECT 1").is_ok()
    }
}

/// Factory opening MySQL connections with fixed network timeouts.
#[derive(Debug, Clone)]
pub struct MySqlFactory {
    opts: ConnectOptions,
}

impl MySqlFactory {
    /// Create a factory for the given connection parameters.
    #[must_use]
    pub fn new(opts: ConnectOptions) -> Self {
        Self { opts }
    }
}

impl ConnectionFactory for MySqlFactory {
    type Conn = mysql::Conn;
    type Error = mysql::Error;

    fn connect(&self) -> Result<mysql::Conn, mysql::Error> {
        let builder = mysql::OptsBuilder::new()
            .ip_or_hostname(Some(self.opts.host.clone()))
            .tcp_port(self.opts.port)
            .user(Some(self.opts.user.clone()))
            .pass(Some(self.opts.password.clone()))
            .db_name(Some(self.opts.database.clone()))
            .tcp_connect_timeout(Some(NETWORK_TIMEOUT))
            .read_timeout(Some(NETWORK_TIMEOUT))
            .write_timeout(Some(NETWORK_TIMEOUT));

        mysql::Conn::new(builder)
    }
}
