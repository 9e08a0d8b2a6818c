//! Declarative resource management for the Exasol analytical database.
//!
//! Callers describe desired state (users, roles, schemas, connections and
//! privilege grants); this crate renders idempotent SQL, executes it through
//! the [`Database`] seam, and reconciles observed catalog state back into the
//! declarative model. Reconciling an unchanged declaration twice
//! issues zero mutating statements.
//!
//! The crate never opens connections itself: implement [`Database`] over
//! whatever wire driver the application uses and hand it to the managers.
//!
//! Identity and statement construction are pure:
//!
//! ```rust
//! use exaform::statement;
//! use exaform::Grant;
//!
//! let grant = Grant::ObjectPrivilege {
//!     grantee: "analyst_role".to_string(),
//!     privileges: vec!["USAGE".to_string(), "SELECT".to_string()],
//!     object_type: "SCHEMA".to_string(),
//!     object_name: "reporting".to_string(),
//! };
//! // case folds, privileges sort: the same grant always keys the same
//! assert_eq!(grant.identity(), "ANALYST_ROLE|SELECT,USAGE|SCHEMA|REPORTING");
//!
//! let statements = statement::build_grant(&grant).unwrap();
//! assert_eq!(
//!     statements,
//!     vec![
//!         r#"GRANT SELECT ON SCHEMA "REPORTING" TO "ANALYST_ROLE""#,
//!         r#"GRANT USAGE ON SCHEMA "REPORTING" TO "ANALYST_ROLE""#,
//!     ]
//! );
//! ```

pub mod catalog;
pub mod config;
pub mod connection;
pub mod database;
pub mod error;
pub mod ident;
pub mod reconcile;
pub mod retry;
pub mod role;
pub mod schema;
pub mod statement;
pub mod user;
pub mod value;

mod grant;

#[cfg(test)]
pub(crate) mod mock;

pub use catalog::{
    CatalogReader,
    Observed,
};
pub use config::DbConfig;
pub use connection::{
    ConnectionDef,
    ConnectionManager,
};
pub use database::Database;
pub use error::{
    ConnectError,
    DbError,
    ExecutionError,
    ParseError,
    ValidationError,
};
pub use grant::Grant;
pub use reconcile::{
    GrantState,
    Reconciler,
};
pub use retry::RetryPolicy;
pub use role::RoleManager;
pub use schema::SchemaManager;
pub use user::{
    UserAuth,
    UserDef,
    UserManager,
};
pub use value::{
    Rows,
    Value,
};
