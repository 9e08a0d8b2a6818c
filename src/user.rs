//! User management: create, rename, change authentication, drop. Plain CRUD
//! with no drift subtlety; the catalog probe only answers "does this user
//! still exist".

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

const USER_EXISTS: &str = "SELECT 1 FROM EXA_ALL_USERS WHERE USER_NAME = ?";
const USER_LIST: &str = "SELECT USER_NAME FROM EXA_ALL_USERS";

/// How a user authenticates. Each variant carries exactly the field it
/// needs, so a missing credential is impossible to express.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
#[serde(tag = "auth", rename_all = "snake_case")]
pub enum UserAuth {
    Password { password: String },
    Ldap { dn: String },
    OpenId { subject: String },
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct UserDef {
    pub name: String,
    pub auth: UserAuth,
}

fn auth_clause(auth: &UserAuth) -> String {
    match *auth {
        UserAuth::Password { ref password } => {
            format!("IDENTIFIED BY \"{}\"", ident::escape_identifier(password))
        }
        UserAuth::Ldap { ref dn } => {
            format!("IDENTIFIED AT LDAP AS '{}'", ident::escape_literal(dn))
        }
        UserAuth::OpenId { ref subject } => {
            format!(
                "IDENTIFIED BY OPENID SUBJECT '{}'",
                ident::escape_literal(subject)
            )
        }
    }
}

fn build_create_user(def: &UserDef) -> Result<String, ValidationError> {
    let name = ident::validate_identifier(&def.name)?;
    Ok(format!(
        "CREATE USER \"{}\" {}",
        name,
        auth_clause(&def.auth)
    ))
}

fn build_alter_user(def: &UserDef) -> Result<String, ValidationError> {
    let name = ident::validate_identifier(&def.name)?;
    Ok(format!("ALTER USER \"{}\" {}", name, auth_clause(&def.auth)))
}

pub struct UserManager<'a> {
    db: &'a mut dyn Database,
    retry: RetryPolicy,
}

impl<'a> UserManager<'a> {
    pub fn new(db: &'a mut dyn Database) -> Self {
        UserManager {
            db,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(db: &'a mut dyn Database, retry: RetryPolicy) -> Self {
        UserManager { db, retry }
    }

    /// Create the user and grant CREATE SESSION so the account can actually
    /// log in. Returns the name as stored by the database (uppercase).
    pub fn create(&mut self, def: &UserDef) -> Result<String, DbError> {
        let name = ident::validate_identifier(&def.name)?;
        let sql = build_create_user(def)?;
        execute_with_retry(self.db, &self.retry, &sql)?;
        let grant = format!("GRANT CREATE SESSION TO \"{}\"", name);
        execute_with_retry(self.db, &self.retry, &grant)?;
        Ok(name)
    }

    pub fn exists(&mut self, name: &str) -> Result<bool, DbError> {
        let name = ident::validate_identifier(name)?;
        self.db.query_exists(USER_EXISTS, &[name.into()])
    }

    /// All user names known to the database.
    pub fn list(&mut self) -> Result<Vec<String>, DbError> {
        let rows = self.db.query_rows(USER_LIST, &[])?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("USER_NAME").and_then(|v| v.as_text()))
            .map(|name| name.to_string())
            .collect())
    }

    /// Rename, a no-op when old and new fold to the same name.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<String, DbError> {
        let old = ident::validate_identifier(old)?;
        let new = ident::validate_identifier(new)?;
        if old != new {
            let sql = format!("RENAME USER \"{}\" TO \"{}\"", old, new);
            execute_with_retry(self.db, &self.retry, &sql)?;
        }
        Ok(new)
    }

    pub fn alter_auth(&mut self, def: &UserDef) -> Result<(), DbError> {
        let sql = build_alter_user(def)?;
        execute_with_retry(self.db, &self.retry, &sql)
    }

    pub fn drop_user(&mut self, name: &str) -> Result<(), DbError> {
        let name = ident::validate_identifier(name)?;
        let sql = format!("DROP USER \"{}\"", name);
        execute_with_retry(self.db, &self.retry, &sql)
    }
}
