//! Row representation for query results.

/// A row from a query result, with every value marshalled to text.
///
/// `NULL` cells are `None`. Column lookup by name is case-insensitive.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Option<String>>,
}

impl Row {
    pub(crate) fn new(columns: Vec<String>, values: Vec<Option<String>>) -> Self {
        Self { columns, values }
    }

    /// Get a value by column index. `None` if the cell is NULL or the
    /// index is out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    /// Get a value by column name. `None` if the cell is NULL or no such
    /// column exists.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .and_then(|i| self.get(i))
    }

    /// Whether the cell at `index` is NULL.
    #[must_use]
    pub fn is_null(&self, index: usize) -> bool {
        matches!(self.values.get(index), Some(None))
    }

    /// Get the column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Get the number of columns in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over (column name, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Option::as_deref))
    }
}

impl From<mysql::Row> for Row {
    fn from(row: mysql::Row) -> Self {
        let columns = row
            .columns_ref()
            .iter()
            .map(|c| c.name_str().into_owned())
            .collect();
        let values = row.unwrap().into_iter().map(text_value).collect();
        Self { columns, values }
    }
}

/// Marshal one cell to its text form.
fn text_value(value: mysql::Value) -> Option<String> {
    match value {
        mysql::Value::NULL => None,
        other => Some(
            mysql::from_value_opt::<String>(other)
                .unwrap_or_else(|mysql::FromValueError(v)| v.as_sql(true)),
        ),
    }
}
