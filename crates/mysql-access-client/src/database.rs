//! Combined setup/teardown facade over the pool and the administrative
//! connection.

use mysql::prelude::Queryable;

use mysql_access_pool::{ConnectOptions, MySqlFactory, Pool, PoolConfig};

use crate::admin::AdminConnection;
use crate::error::{Error, Result};
use crate::query::{DeleteQuery, InsertQuery, Literal, SelectQuery, UpdateQuery};
use crate::row::Row;

/// Managed access to one MySQL database.
///
/// Owns the administrative connection (DDL) and the connection pool (CRUD)
/// together: one setup step, one teardown step. Explicitly constructed and
/// passed around, never a process-wide singleton.
///
/// Every CRUD method acquires a pooled connection, executes exactly one
/// statement, and returns the connection on all paths, success or failure.
pub struct Database {
    admin: Option<AdminConnection>,
    pool: Pool<MySqlFactory>,
}

impl Database {
    /// One combined setup step: open the administrative connection, then
    /// the pool with its warm set. Either failure fails the whole setup
    /// and releases whatever was opened first.
    pub fn connect(opts: ConnectOptions, config: PoolConfig) -> Result<Self> {
        let admin = AdminConnection::open(&opts)?;
        let pool = Pool::connect(opts, config)?;
        Ok(Self {
            admin: Some(admin),
            pool,
        })
    }

    /// The administrative connection, for schema DDL.
    ///
    /// # Errors
    ///
    /// [`Error::NotInitialized`] once [`Database::close`] has run.
    pub fn admin(&mut self) -> Result<&mut AdminConnection> {
        self.admin.as_mut().ok_or(Error::NotInitialized)
    }

    /// The underlying connection pool, for status and metrics inspection.
    #[must_use]
    pub fn pool(&self) -> &Pool<MySqlFactory> {
        &self.pool
    }

    /// Run a `SELECT` and marshal every row.
    pub fn select(&self, query: &SelectQuery) -> Result<Vec<Row>> {
        let sql = query.build()?;
        let mut conn = self.pool.acquire()?;
        tracing::debug!(sql = %sql, "executing select");
        let rows: Vec<mysql::Row> = conn.query(sql)?;
        Ok(rows.into_iter().map(Row::from).collect())
    }

    /// Run one raw statement on a pooled connection, returning the number
    /// of affected rows.
    pub fn execute(&self, sql: &str) -> Result<u64> {
        let mut conn = self.pool.acquire()?;
        tracing::debug!(sql, "executing statement");
        conn.query_drop(sql)?;
        Ok(conn.affected_rows())
    }

    /// Insert one row.
    pub fn insert(&self, table: &str, columns: &[&str], row: Vec<Literal>) -> Result<u64> {
        let sql = InsertQuery::new(table).columns(columns).row(row).build()?;
        self.execute(&sql)
    }

    /// Insert many rows in a single statement.
    pub fn bulk_insert(
        &self,
        table: &str,
        columns: &[&str],
        rows: Vec<Vec<Literal>>,
    ) -> Result<u64> {
        let mut query = InsertQuery::new(table).columns(columns);
        for row in rows {
            query = query.row(row);
        }
        self.execute(&query.build()?)
    }

    /// Run an `UPDATE`.
    pub fn update(&self, query: &UpdateQuery) -> Result<u64> {
        self.execute(&query.build()?)
    }

    /// Run a `DELETE`.
    pub fn delete(&self, query: &DeleteQuery) -> Result<u64> {
        self.execute(&query.build()?)
    }

    /// Close the administrative connection and the pool.
    ///
    /// Safe to call more than once; subsequent DDL access reports
    /// [`Error::NotInitialized`] and pool acquisition reports the pool as
    /// closed.
    pub fn close(&mut self) {
        if self.admin.take().is_some() {
            tracing::info!("administrative connection closed");
        }
        self.pool.close();
    }
}
