//! Connection management. Connections point IMPORT/EXPORT at external
//! systems; their connection string and credentials are string literals, not
//! identifiers, and the password can never be read back from the catalog.

use crate::{
    database::Database,
    error::ValidationError,
    ident,
    retry::{
        execute_with_retry,
        RetryPolicy,
    },
    DbError,
};
use serde::{Deserialize, Serialize};

const CONNECTION_EXISTS: &str = "SELECT 1 FROM EXA_DBA_CONNECTIONS WHERE CONNECTION_NAME = ?";

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct ConnectionDef {
    pub name: String,
    /// Target address: host:port, URL, JDBC string; comma-separated for
    /// multiple hosts.
    pub to: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

fn build_connection_sql(verb: &str, def: &ConnectionDef) -> Result<String, ValidationError> {
    let name = ident::validate_identifier(&def.name)?;
    let mut sql = format!(
        "{} CONNECTION \"{}\" TO '{}'",
        verb,
        name,
        ident::escape_literal(&def.to)
    );
    if let Some(ref user) = def.user {
        if !user.is_empty() {
            sql += &format!(" USER '{}'", ident::escape_literal(user));
        }
    }
    if let Some(ref password) = def.password {
        if !password.is_empty() {
            sql += &format!(" IDENTIFIED BY '{}'", ident::escape_literal(password));
        }
    }
    Ok(sql)
}

pub struct ConnectionManager<'a> {
    db: &'a mut dyn Database,
    retry: RetryPolicy,
}

impl<'a> ConnectionManager<'a> {
    pub fn new(db: &'a mut dyn Database) -> Self {
        ConnectionManager {
            db,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(db: &'a mut dyn Database, retry: RetryPolicy) -> Self {
        ConnectionManager { db, retry }
    }

    pub fn create(&mut self, def: &ConnectionDef) -> Result<String, DbError> {
        let name = ident::validate_identifier(&def.name)?;
        let sql = build_connection_sql("CREATE", def)?;
        execute_with_retry(self.db, &self.retry, &sql)?;
        Ok(name)
    }

    pub fn alter(&mut self, def: &ConnectionDef) -> Result<(), DbError> {
        let sql = build_connection_sql("ALTER", def)?;
        execute_with_retry(self.db, &self.retry, &sql)
    }

    pub fn exists(&mut self, name: &str) -> Result<bool, DbError> {
        let name = ident::validate_identifier(name)?;
        self.db.query_exists(CONNECTION_EXISTS, &[name.into()])
    }

    pub fn rename(&mut self, old: &str, new: &str) -> Result<String, DbError> {
        let old = ident::validate_identifier(old)?;
        let new = ident::validate_identifier(new)?;
        if old != new {
            let sql = format!("RENAME CONNECTION \"{}\" TO \"{}\"", old, new);
            execute_with_retry(self.db, &self.retry, &sql)?;
        }
        Ok(new)
    }

    pub fn drop_connection(&mut self, name: &str) -> Result<(), DbError> {
        let name = ident::validate_identifier(name)?;
        let sql = format!("DROP CONNECTION \"{}\"", name);
        execute_with_retry(self.db, &self.retry, &sql)
    }
}
