//! Administrative (non-pooled) connection for schema DDL.

use mysql::prelude::Queryable;

use mysql_access_pool::{ConnectOptions, ConnectionFactory, MySqlFactory};

use crate::error::Result;

/// A single long-lived connection for infrequent administrative DDL.
///
/// DDL does not go through the pool: schema changes are rare and
/// administrative, while pooled connections serve high-frequency CRUD.
/// This connection is not validated or reconnected automatically: if the
/// session drops, every operation fails and the caller must open a fresh
/// connection.
pub struct AdminConnection {
    conn: mysql::Conn,
}

impl AdminConnection {
    /// Open the administrative connection, with the same fixed network
    /// timeouts as pooled connections.
    pub fn open(opts: &ConnectOptions) -> Result<Self> {
        opts.validate()?;
        let conn = MySqlFactory::new(opts.clone()).connect()?;
        tracing::info!(
            host = %opts.host,
            database = %opts.database,
            "administrative connection opened"
        );
        Ok(Self { conn })
    }

    /// Execute one raw DDL statement.
    pub fn execute(&mut self, sql: &str) -> Result<()> {
        tracing::debug!(sql, "executing ddl");
        self.conn.query_drop(sql)?;
        Ok(())
    }

    /// Whether `table` exists in the current database.
    pub fn table_exists(&mut self, table: &str) -> Result<bool> {
        let rows: Vec<mysql::Row> = self.conn.query(format!("SHOW TABLES LIKE '{table}'"))?;
        Ok(!rows.is_empty())
    }

    /// Create `table` with the given column definition unless it already
    /// exists. Returns whether the table was created.
    pub fn create_table(&mut self, table: &str, definition: &str) -> Result<bool> {
        if self.table_exists(table)? {
            tracing::debug!(table, "table already exists");
            return Ok(false);
        }
        self.execute(&format!("CREATE TABLE {table} ({definition})"))?;
        tracing::info!(table, "table created");
        Ok(true)
    }

    /// Create a named index on `table` unless an index with that name
    /// already exists. Returns whether the index was created.
    pub fn create_index(&mut self, table: &str, index: &str, columns: &str) -> Result<bool> {
        let rows: Vec<mysql::Row> = self
            .conn
            .query(format!("SHOW INDEX FROM {table} WHERE Key_name = '{index}'"))?;
        if !rows.is_empty() {
            tracing::debug!(table, index, "index already exists");
            return Ok(false);
        }
        self.execute(&format!("CREATE INDEX {index} ON {table} ({columns})"))?;
        tracing::info!(table, index, "index created");
        Ok(true)
    }
}
