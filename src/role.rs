//! Role management. Roles are stored uppercase in the database; every
//! operation folds the name first.

use crate::{
    database::Database,
    ident,
    retry::{
        execute_with_retry,
        RetryPolicy,
    },
    DbError,
};

const ROLE_EXISTS: &str = "SELECT ROLE_NAME FROM EXA_DBA_ROLES WHERE ROLE_NAME = ?";
const ROLE_LIST: &str = "SELECT ROLE_NAME FROM EXA_DBA_ROLES";

pub struct RoleManager<'a> {
    db: &'a mut dyn Database,
    retry: RetryPolicy,
}

impl<'a> RoleManager<'a> {
    pub fn new(db: &'a mut dyn Database) -> Self {
        RoleManager {
            db,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(db: &'a mut dyn Database, retry: RetryPolicy) -> Self {
        RoleManager { db, retry }
    }

    /// Returns the name as stored by the database (uppercase).
    pub fn create(&mut self, name: &str) -> Result<String, DbError> {
        let name = ident::validate_identifier(name)?;
        let sql = format!("CREATE ROLE \"{}\"", name);
        execute_with_retry(self.db, &self.retry, &sql)?;
        Ok(name)
    }

    pub fn exists(&mut self, name: &str) -> Result<bool, DbError> {
        let name = ident::validate_identifier(name)?;
        self.db.query_exists(ROLE_EXISTS, &[name.into()])
    }

    /// All role names known to the database.
    pub fn list(&mut self) -> Result<Vec<String>, DbError> {
        let rows = self.db.query_rows(ROLE_LIST, &[])?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("ROLE_NAME").and_then(|v| v.as_text()))
            .map(|name| name.to_string())
            .collect())
    }

    pub fn rename(&mut self, old: &str, new: &str) -> Result<String, DbError> {
        let old = ident::validate_identifier(old)?;
        let new = ident::validate_identifier(new)?;
        if old != new {
            let sql = format!("RENAME ROLE \"{}\" TO \"{}\"", old, new);
            execute_with_retry(self.db, &self.retry, &sql)?;
        }
        Ok(new)
    }

    pub fn drop_role(&mut self, name: &str) -> Result<(), DbError> {
        let name = ident::validate_identifier(name)?;
        let sql = format!("DROP ROLE \"{}\"", name);
        execute_with_retry(self.db, &self.retry, &sql)
    }
}
