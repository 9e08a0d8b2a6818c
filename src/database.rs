use crate::{
    error::DataError,
    DbError,
    Rows,
    Value,
};

/// The SQL seam consumed by every manager in this crate. Implemented by
/// whatever wire driver the embedding application uses; the crate itself
/// never opens connections.
pub trait Database {
    /// Run a mutating statement (DDL, GRANT, REVOKE). Implementations map
    /// server failures through [`DbError::from_server`] so collisions keep
    /// their SQLSTATE classification.
    fn execute_sql(&mut self, sql: &str) -> Result<(), DbError>;

    /// Run a catalog query with `?` placeholders.
    fn query_rows(&mut self, sql: &str, params: &[Value]) -> Result<Rows, DbError>;

    /// Point lookup returning the first column of the only row.
    /// `Ok(None)` is the normal not-found result, never an error.
    fn query_single(&mut self, sql: &str, params: &[Value]) -> Result<Option<Value>, DbError> {
        let mut rows = self.query_rows(sql, params)?;
        match rows.data.len() {
            0 => Ok(None),
            1 => {
                let mut row = rows.data.remove(0);
                if row.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(row.remove(0)))
                }
            }
            _ => Err(DataError::MoreThan1RecordReturned.into()),
        }
    }

    /// Existence probe built on `query_single`.
    fn query_exists(&mut self, sql: &str, params: &[Value]) -> Result<bool, DbError> {
        Ok(self.query_single(sql, params)?.is_some())
    }
}
