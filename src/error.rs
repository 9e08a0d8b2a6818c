use crate::ident;
use thiserror::Error;

/// SQLSTATE reported by the server when concurrent transactions touch
/// overlapping catalog rows.
pub const COLLISION_SQLSTATE: &str = "40001";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Database url parse error: {0}")]
    DbUrlParseError(#[from] url::ParseError),
    #[error("Database url is missing {0}")]
    MissingUrlPart(&'static str),
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("{0}")]
    ParseError(#[from] ParseError),
    #[error("Database not supported: {0}")]
    UnsupportedDb(String),
}

/// Rejected input; no SQL has been issued when one of these is returned.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),
    #[error("Invalid privilege name: {0:?}")]
    InvalidPrivilege(String),
    #[error("{kind} requires {field}")]
    MissingCoordinate {
        kind: &'static str,
        field: &'static str,
    },
    #[error("Privilege list must not be empty")]
    EmptyPrivileges,
}

/// A statement the server rejected. The statement is stored redacted so
/// credentials never travel through logs or error chains.
#[derive(Debug, Error)]
#[error("error executing `{statement}`: {message}")]
pub struct ExecutionError {
    pub statement: String,
    pub code: Option<String>,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("More than one record returned")]
    MoreThan1RecordReturned,
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0}")]
    ValidationError(#[from] ValidationError),
    #[error("{0}")]
    ExecutionError(ExecutionError),
    /// Transient catalog collision, eligible for retry. Degrades to
    /// `ExecutionError` once retries are exhausted.
    #[error("transaction collision: {0}")]
    TransactionCollision(ExecutionError),
    #[error("{0}")]
    ConnectError(#[from] ConnectError),
    #[error("{0}")]
    DataError(#[from] DataError),
}

impl DbError {
    /// Classify a server-side failure. Collisions (SQLSTATE 40001) get their
    /// own variant so the retry policy can tell them apart from real failures.
    pub fn from_server(
        statement: &str,
        code: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        let err = ExecutionError {
            statement: ident::redact(statement),
            code: code.map(|c| c.to_string()),
            message: message.into(),
        };
        if code == Some(COLLISION_SQLSTATE) {
            DbError::TransactionCollision(err)
        } else {
            DbError::ExecutionError(err)
        }
    }

    pub fn is_collision(&self) -> bool {
        matches!(self, DbError::TransactionCollision(_))
    }
}
