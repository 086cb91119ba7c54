//! SQL statement builders.
//!
//! Plain string assembly by substitution; values are rendered as literals
//! directly into the statement text. Parameterized statements are out of
//! scope for this layer.

use std::fmt;

use crate::error::{Error, Result};

/// A SQL literal rendered into generated statements.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// SQL NULL.
    Null,
    /// Integer literal.
    Int(i64),
    /// Floating point literal.
    Float(f64),
    /// Boolean literal, rendered as TRUE/FALSE.
    Bool(bool),
    /// String literal, single-quoted with embedded quotes doubled.
    Str(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(true) => f.write_str("TRUE"),
            Self::Bool(false) => f.write_str("FALSE"),
            Self::Str(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Sort direction for `ORDER BY` clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("ASC"),
            Self::Desc => f.write_str("DESC"),
        }
    }
}

/// Builder for `SELECT` statements.
///
/// # Example
///
/// ```rust
/// use mysql_access_client::{Order, SelectQuery};
///
/// let sql = SelectQuery::new()
///     .columns(&["id", "name"])
///     .from("devices")
///     .where_clause("active = 1")
///     .order_by("name", Order::Asc)
///     .limit(10)
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     sql,
///     "SELECT id, name FROM devices WHERE active = 1 ORDER BY name ASC LIMIT 10;"
/// );
/// ```
#[derive(Debug, Default, Clone)]
pub struct SelectQuery {
    columns: Vec<String>,
    table: String,
    joins: Vec<String>,
    conditions: Vec<String>,
    group_by: Vec<String>,
    having: Vec<String>,
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    native: Option<String>,
}

impl SelectQuery {
    /// Create an empty builder selecting `*`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the given columns instead of `*`.
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.trim().to_string()).collect();
        self
    }

    /// Set the table to select from.
    #[must_use]
    pub fn from(mut self, table: &str) -> Self {
        self.table = table.to_string();
        self
    }

    /// Add a condition, AND-combined with previous ones.
    #[must_use]
    pub fn where_clause(mut self, condition: &str) -> Self {
        self.conditions.push(condition.to_string());
        self
    }

    /// Alias for [`SelectQuery::where_clause`].
    #[must_use]
    pub fn and_where(self, condition: &str) -> Self {
        self.where_clause(condition)
    }

    /// OR-append a condition to the most recent one.
    #[must_use]
    pub fn or_where(mut self, condition: &str) -> Self {
        match self.conditions.last_mut() {
            Some(last) => {
                last.push_str(" OR ");
                last.push_str(condition);
            }
            None => self.conditions.push(condition.to_string()),
        }
        self
    }

    /// Add a plain `JOIN`.
    #[must_use]
    pub fn join(mut self, table: &str, on: &str) -> Self {
        self.joins.push(format!("JOIN {table} ON {on}"));
        self
    }

    /// Add a `LEFT JOIN`.
    #[must_use]
    pub fn left_join(mut self, table: &str, on: &str) -> Self {
        self.joins.push(format!("LEFT JOIN {table} ON {on}"));
        self
    }

    /// Add a `RIGHT JOIN`.
    #[must_use]
    pub fn right_join(mut self, table: &str, on: &str) -> Self {
        self.joins.push(format!("RIGHT JOIN {table} ON {on}"));
        self
    }

    /// Add an `INNER JOIN`.
    #[must_use]
    pub fn inner_join(mut self, table: &str, on: &str) -> Self {
        self.joins.push(format!("INNER JOIN {table} ON {on}"));
        self
    }

    /// Group by the given columns.
    #[must_use]
    pub fn group_by(mut self, columns: &[&str]) -> Self {
        self.group_by = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Add a `HAVING` condition, AND-combined with previous ones.
    #[must_use]
    pub fn having(mut self, condition: &str) -> Self {
        self.having.push(condition.to_string());
        self
    }

    /// Add an `ORDER BY` term.
    #[must_use]
    pub fn order_by(mut self, column: &str, order: Order) -> Self {
        self.order_by.push(format!("{column} {order}"));
        self
    }

    /// Cap the number of returned rows.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first `offset` rows.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Bypass the builder and use `sql` verbatim.
    #[must_use]
    pub fn native(mut self, sql: &str) -> Self {
        self.native = Some(sql.to_string());
        self
    }

    /// Render the statement.
    pub fn build(&self) -> Result<String> {
        if let Some(native) = &self.native {
            return Ok(native.clone());
        }
        if self.table.is_empty() {
            return Err(Error::Query("table name must be set".to_string()));
        }

        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        };

        let mut parts = vec![format!("SELECT {columns}"), format!("FROM {}", self.table)];
        if !self.joins.is_empty() {
            parts.push(self.joins.join(" "));
        }
        if !self.conditions.is_empty() {
            parts.push(format!("WHERE {}", self.conditions.join(" AND ")));
        }
        if !self.group_by.is_empty() {
            parts.push(format!("GROUP BY {}", self.group_by.join(", ")));
        }
        if !self.having.is_empty() {
            parts.push(format!("HAVING {}", self.having.join(" AND ")));
        }
        if !self.order_by.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_by.join(", ")));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            parts.push(format!("OFFSET {offset}"));
        }

        Ok(format!("{};", parts.join(" ")))
    }
}

/// Builder for `INSERT` statements, single and multi-row.
#[derive(Debug, Clone)]
pub struct InsertQuery {
    table: String,
    columns: Vec<String>,
    rows: Vec<Vec<Literal>>,
}

impl InsertQuery {
    /// Start an insert into `table`.
    #[must_use]
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Set the column list.
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Append one row of values.
    #[must_use]
    pub fn row(mut self, values: Vec<Literal>) -> Self {
        self.rows.push(values);
        self
    }

    /// Render the statement.
    pub fn build(&self) -> Result<String> {
        if self.table.is_empty() {
            return Err(Error::Query("table name must be set".to_string()));
        }
        if self.columns.is_empty() {
            return Err(Error::Query("insert requires at least one column".to_string()));
        }
        if self.rows.is_empty() {
            return Err(Error::Query("insert requires at least one row".to_string()));
        }
        for row in &self.rows {
            if row.len() != self.columns.len() {
                return Err(Error::Query(format!(
                    "row has {} values but {} columns are named",
                    row.len(),
                    self.columns.len()
                )));
            }
        }

        let values = self
            .rows
            .iter()
            .map(|row| {
                let rendered = row
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({rendered})")
            })
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!(
            "INSERT INTO {} ({}) VALUES {};",
            self.table,
            self.columns.join(", "),
            values
        ))
    }
}

/// Builder for `UPDATE` statements.
///
/// A condition is mandatory; this layer refuses to render an unbounded
/// update.
#[derive(Debug, Clone)]
pub struct UpdateQuery {
    table: String,
    assignments: Vec<(String, Literal)>,
    conditions: Vec<(String, Literal)>,
}

impl UpdateQuery {
    /// Start an update of `table`.
    #[must_use]
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            assignments: Vec::new(),
            conditions: Vec::new(),
        }
    }

    /// Assign `value` to `column`.
    #[must_use]
    pub fn set(mut self, column: &str, value: impl Into<Literal>) -> Self {
        self.assignments.push((column.to_string(), value.into()));
        self
    }

    /// Add an equality condition, AND-combined with previous ones.
    /// A `Null` value renders as `IS NULL`.
    #[must_use]
    pub fn where_eq(mut self, column: &str, value: impl Into<Literal>) -> Self {
        self.conditions.push((column.to_string(), value.into()));
        self
    }

    /// Render the statement.
    pub fn build(&self) -> Result<String> {
        if self.table.is_empty() {
            return Err(Error::Query("table name must be set".to_string()));
        }
        if self.assignments.is_empty() {
            return Err(Error::Query("update requires at least one assignment".to_string()));
        }
        if self.conditions.is_empty() {
            return Err(Error::Query("update requires at least one condition".to_string()));
        }

        let assignments = self
            .assignments
            .iter()
            .map(|(col, val)| format!("{col} = {val}"))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!(
            "UPDATE {} SET {} WHERE {};",
            self.table,
            assignments,
            render_conditions(&self.conditions)
        ))
    }
}

/// Builder for `DELETE` statements.
///
/// A condition is mandatory; this layer refuses to render an unbounded
/// delete.
#[derive(Debug, Clone)]
pub struct DeleteQuery {
    table: String,
    conditions: Vec<(String, Literal)>,
}

impl DeleteQuery {
    /// Start a delete from `table`.
    #[must_use]
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            conditions: Vec::new(),
        }
    }

    /// Add an equality condition, AND-combined with previous ones.
    /// A `Null` value renders as `IS NULL`.
    #[must_use]
    pub fn where_eq(mut self, column: &str, value: impl Into<Literal>) -> Self {
        self.conditions.push((column.to_string(), value.into()));
        self
    }

    /// Render the statement.
    pub fn build(&self) -> Result<String> {
        if self.table.is_empty() {
            return Err(Error::Query("table name must be set".to_string()));
        }
        if self.conditions.is_empty() {
            return Err(Error::Query("delete requires at least one condition".to_string()));
        }

        Ok(format!(
            "DELETE FROM {} WHERE {};",
            self.table,
            render_conditions(&self.conditions)
        ))
    }
}

fn render_conditions(conditions: &[(String, Literal)]) -> String {
    conditions
        .iter()
        .map(|(col, val)| match val {
            Literal::Null => format!("{col} IS NULL"),
            other => format!("{col} = {other}"),
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_defaults_to_star() {
        let sql = SelectQuery::new().from("devices").build().unwrap();
        assert_eq!(sql, "SELECT * FROM devices;");
    }

    #[test]
    fn select_with_all_clauses() {
        let sql = SelectQuery::new()
            .columns(&["d.id", "d.name", "o.label"])
            .from("devices d")
            .left_join("owners o", "o.id = d.owner_id")
            .where_clause("d.active = 1")
            .and_where("d.qty > 3")
            .group_by(&["d.name"])
            .having("COUNT(*) > 1")
            .order_by("d.name", Order::Desc)
            .limit(20)
            .offset(40)
            .build()
            .unwrap();

        assert_eq!(
            sql,
            "SELECT d.id, d.name, o.label FROM devices d \
             LEFT JOIN owners o ON o.id = d.owner_id \
             WHERE d.active = 1 AND d.qty > 3 \
             GROUP BY d.name HAVING COUNT(*) > 1 \
             ORDER BY d.name DESC LIMIT 20 OFFSET 40;"
        );
    }

    #[test]
    fn or_where_extends_last_condition() {
        let sql = SelectQuery::new()
            .from("devices")
            .where_clause("qty > 3")
            .or_where("qty IS NULL")
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM devices WHERE qty > 3 OR qty IS NULL;");
    }

    #[test]
    fn select_without_table_is_rejected() {
        let err = SelectQuery::new().build().unwrap_err();
        assert!(matches!(err, Error::Query(_)));
    }

    #[test]
    fn native_query_passes_through() {
        let sql = SelectQuery::new()
            .native("SELECT 1 FROM dual")
            .build()
            .unwrap();
        assert_eq!(sql, "SELECT 1 FROM dual");
    }

    #[test]
    fn insert_multi_row() {
        let sql = InsertQuery::new("devices")
            .columns(&["name", "qty"])
            .row(vec!["router".into(), 3.into()])
            .row(vec!["switch".into(), Literal::Null])
            .build()
            .unwrap();

        assert_eq!(
            sql,
            "INSERT INTO devices (name, qty) VALUES ('router', 3), ('switch', NULL);"
        );
    }

    #[test]
    fn insert_arity_mismatch_is_rejected() {
        let err = InsertQuery::new("devices")
            .columns(&["name", "qty"])
            .row(vec!["router".into()])
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Query(_)));
    }

    #[test]
    fn update_with_conditions() {
        let sql = UpdateQuery::new("devices")
            .set("name", "router v2")
            .set("qty", 5)
            .where_eq("id", 7)
            .build()
            .unwrap();

        assert_eq!(
            sql,
            "UPDATE devices SET name = 'router v2', qty = 5 WHERE id = 7;"
        );
    }

    #[test]
    fn unbounded_update_is_rejected() {
        let err = UpdateQuery::new("devices").set("qty", 0).build().unwrap_err();
        assert!(matches!(err, Error::Query(_)));
    }

    #[test]
    fn delete_renders_null_as_is_null() {
        let sql = DeleteQuery::new("devices")
            .where_eq("owner", Literal::Null)
            .where_eq("name", "router")
            .build()
            .unwrap();

        assert_eq!(
            sql,
            "DELETE FROM devices WHERE owner IS NULL AND name = 'router';"
        );
    }

    #[test]
    fn string_literals_escape_quotes() {
        assert_eq!(Literal::from("it's").to_string(), "'it''s'");
        assert_eq!(Literal::from(Option::<i64>::None).to_string(), "NULL");
        assert_eq!(Literal::Bool(true).to_string(), "TRUE");
    }
}
