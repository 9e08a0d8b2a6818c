//! Schema management. Dropping a schema cascades to its objects; the grants
//! on a renamed schema follow it (see the reconciler's rename handling).

use crate::{
    database::Database,
    ident,
    retry::{
        execute_with_retry,
        RetryPolicy,
    },
    DbError,
};

const SCHEMA_EXISTS: &str = "SELECT 1 FROM EXA_ALL_SCHEMAS WHERE SCHEMA_NAME = ?";

pub struct SchemaManager<'a> {
    db: &'a mut dyn Database,
    retry: RetryPolicy,
}

impl<'a> SchemaManager<'a> {
    pub fn new(db: &'a mut dyn Database) -> Self {
        SchemaManager {
            db,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(db: &'a mut dyn Database, retry: RetryPolicy) -> Self {
        SchemaManager { db, retry }
    }

    pub fn create(&mut self, name: &str) -> Result<String, DbError> {
        let name = ident::validate_identifier(name)?;
        let sql = format!("CREATE SCHEMA \"{}\"", name);
        execute_with_retry(self.db, &self.retry, &sql)?;
        Ok(name)
    }

    pub fn exists(&mut self, name: &str) -> Result<bool, DbError> {
        let name = ident::validate_identifier(name)?;
        self.db.query_exists(SCHEMA_EXISTS, &[name.into()])
    }

    pub fn rename(&mut self, old: &str, new: &str) -> Result<String, DbError> {
        let old = ident::validate_identifier(old)?;
        let new = ident::validate_identifier(new)?;
        if old != new {
            let sql = format!("RENAME SCHEMA \"{}\" TO \"{}\"", old, new);
            execute_with_retry(self.db, &self.retry, &sql)?;
        }
        Ok(new)
    }

    pub fn drop_schema(&mut self, name: &str) -> Result<(), DbError> {
        let name = ident::validate_identifier(name)?;
        let sql = format!("DROP SCHEMA \"{}\" CASCADE", name);
        execute_with_retry(self.db, &self.retry, &sql)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mock::MockDb;

    #[test]
    fn lifecycle_statements() {
        let mut db = MockDb::new();
        SchemaManager::new(&mut db).create("staging").unwrap();
        SchemaManager::new(&mut db).rename("staging", "landing").unwrap();
        SchemaManager::new(&mut db).drop_schema("landing").unwrap();
        assert_eq!(
            db.executed,
            vec![
                r#"CREATE SCHEMA "STAGING""#,
                r#"RENAME SCHEMA "STAGING" TO "LANDING""#,
                r#"DROP SCHEMA "LANDING" CASCADE"#,
            ]
        );
    }

    #[test]
    fn exists_probes_the_schema_view() {
        let mut db = MockDb::new();
        db.schemas.push("STAGING".to_string());
        assert!(SchemaManager::new(&mut db).exists("staging").unwrap());
        assert!(!SchemaManager::new(&mut db).exists("missing").unwrap());
    }
}
