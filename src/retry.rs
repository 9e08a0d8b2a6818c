//! Bounded retry for transaction collisions. Concurrent revokes against
//! overlapping catalog rows make the server roll one transaction back with
//! SQLSTATE 40001; retrying the loser after a short backoff preserves
//! parallelism everywhere a process-wide lock would not.

use crate::{
    database::Database,
    ident,
    DbError,
};
use log::{
    info,
    warn,
};
use std::{
    thread,
    time::Duration,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries; collisions surface immediately as plain
    /// execution errors.
    pub fn none() -> Self {
        RetryPolicy {
            max_attempts: 1,
            base_delay: Duration::from_millis(0),
        }
    }

    /// Run `op`, retrying only on [`DbError::TransactionCollision`]. Any
    /// other outcome is returned as-is. Once attempts are exhausted the
    /// collision degrades to a normal execution error.
    pub fn run<T, F>(&self, mut op: F) -> Result<T, DbError>
    where
        F: FnMut() -> Result<T, DbError>,
    {
        let mut attempt = 1;
        loop {
            match op() {
                Err(DbError::TransactionCollision(e)) => {
                    if attempt >= self.max_attempts {
                        return Err(DbError::ExecutionError(e));
                    }
                    let delay = self.base_delay * 2u32.saturating_pow(attempt - 1);
                    warn!(
                        "transaction collision (attempt {}/{}), retrying in {:?}: {}",
                        attempt, self.max_attempts, delay, e
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

/// Log (redacted) and execute one mutating statement under the retry policy.
pub(crate) fn execute_with_retry(
    db: &mut dyn Database,
    retry: &RetryPolicy,
    sql: &str,
) -> Result<(), DbError> {
    info!("executing: {}", ident::redact(sql));
    retry.run(|| db.execute_sql(sql))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mock::MockDb;

    fn collision() -> DbError {
        DbError::from_server("REVOKE X FROM \"Y\"", Some("40001"), "collision")
    }

    fn quick_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(0),
        }
    }

    #[test]
    fn succeeds_after_collisions() {
        let mut db = MockDb::new();
        db.fail_executes.push_back(collision());
        db.fail_executes.push_back(collision());
        execute_with_retry(&mut db, &quick_retry(), "DROP ROLE \"R\"").unwrap();
        assert_eq!(db.executed.len(), 3);
    }

    #[test]
    fn exhausted_retries_degrade_to_execution_error() {
        let mut db = MockDb::new();
        for _ in 0..3 {
            db.fail_executes.push_back(collision());
        }
        let err = execute_with_retry(&mut db, &quick_retry(), "DROP ROLE \"R\"").unwrap_err();
        assert!(matches!(err, DbError::ExecutionError(_)));
        assert_eq!(db.executed.len(), 3);
    }

    #[test]
    fn non_collision_errors_are_not_retried() {
        let mut db = MockDb::new();
        db.fail_executes
            .push_back(DbError::from_server("DROP ROLE \"R\"", Some("42500"), "denied"));
        let err = execute_with_retry(&mut db, &quick_retry(), "DROP ROLE \"R\"").unwrap_err();
        assert!(matches!(err, DbError::ExecutionError(_)));
        assert_eq!(db.executed.len(), 1);
    }

    #[test]
    fn none_policy_surfaces_collision_as_execution_error() {
        let mut db = MockDb::new();
        db.fail_executes.push_back(collision());
        let err = execute_with_retry(&mut db, &RetryPolicy::none(), "DROP ROLE \"R\"").unwrap_err();
        assert!(matches!(err, DbError::ExecutionError(_)));
    }
}
