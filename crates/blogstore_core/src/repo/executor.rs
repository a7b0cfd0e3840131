//! Scoped statement execution over provider connections.
//!
//! # Responsibility
//! - Acquire one connection per repository operation and give it back
//!   exactly once, on success, on error and on unwinding panics.
//! - Prepare, bind, run and finalize single statements.
//! - Emit one `repo_call` event per operation.
//!
//! # Invariants
//! - A connection never outlives the operation that acquired it.
//! - Statements and cursors are dropped before their connection.
//! - No retries happen here; faults go straight back to the caller.

use crate::db::ConnectionProvider;
use crate::repo::error::{RepoError, RepoResult};
use log::{debug, error, info};
use rusqlite::{Connection, Params, Row};
use std::time::Instant;

/// Runs repository operations against connections from a provider.
pub struct StatementExecutor<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> StatementExecutor<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Runs `body` with a freshly leased connection.
    ///
    /// The lease is dropped (and the connection released) before this
    /// function returns, whatever `body` does.
    pub fn run<T>(
        &self,
        op: &'static str,
        body: impl FnOnce(&Session<'_>) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let started_at = Instant::now();
        let result = self.lease().and_then(|lease| body(&lease.session()));
        log_outcome(op, started_at, &result);
        result
    }

    fn lease(&self) -> RepoResult<ConnectionLease<'_, P>> {
        let conn = self.provider.acquire()?;
        Ok(ConnectionLease {
            provider: &self.provider,
            conn: Some(conn),
        })
    }
}

/// Connection borrowed from a provider for the duration of one operation.
struct ConnectionLease<'p, P: ConnectionProvider> {
    provider: &'p P,
    conn: Option<Connection>,
}

impl<P: ConnectionProvider> ConnectionLease<'_, P> {
    fn session(&self) -> Session<'_> {
        Session {
            conn: self
                .conn
                .as_ref()
                .expect("lease holds its connection until dropped"),
        }
    }
}

impl<P: ConnectionProvider> Drop for ConnectionLease<'_, P> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.provider.release(conn);
        }
    }
}

/// Statement-level API available inside an executor operation.
///
/// Each call prepares its statement, runs it and finalizes it before
/// returning; nothing is cached between calls.
pub struct Session<'c> {
    conn: &'c Connection,
}

impl Session<'_> {
    /// Executes a write and returns the affected-row count.
    pub fn execute(&self, sql: &str, params: impl Params) -> rusqlite::Result<usize> {
        let mut stmt = self.conn.prepare(sql)?;
        stmt.execute(params)
    }

    /// Executes an `INSERT ... RETURNING id` statement.
    ///
    /// Returns `None` when the insert was conditional and produced no row.
    pub fn insert_returning_id(
        &self,
        sql: &str,
        params: impl Params,
    ) -> rusqlite::Result<Option<i64>> {
        self.query_optional(sql, params, |row| row.get(0))
    }

    /// Returns the first row mapped by `map`, or `None` for an empty result.
    pub fn query_optional<T>(
        &self,
        sql: &str,
        params: impl Params,
        map: impl FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    ) -> rusqlite::Result<Option<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        match rows.next()? {
            Some(row) => Ok(Some(map(row)?)),
            None => Ok(None),
        }
    }

    /// Returns every row mapped by `map`, in result order.
    pub fn query_all<T>(
        &self,
        sql: &str,
        params: impl Params,
        mut map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> rusqlite::Result<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(map(row)?);
        }
        Ok(items)
    }

    /// Evaluates a `SELECT EXISTS(...)` statement.
    pub fn exists(&self, sql: &str, params: impl Params) -> rusqlite::Result<bool> {
        let exists: i64 = self.scalar(sql, params)?;
        Ok(exists == 1)
    }

    /// Evaluates a `SELECT COUNT(...)` statement.
    pub fn count(&self, sql: &str, params: impl Params) -> rusqlite::Result<i64> {
        self.scalar(sql, params)
    }

    fn scalar(&self, sql: &str, params: impl Params) -> rusqlite::Result<i64> {
        self.query_optional(sql, params, |row| row.get(0))?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)
    }
}

fn log_outcome<T>(op: &'static str, started_at: Instant, result: &RepoResult<T>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => debug!("event=repo_call module=repo status=ok op={op} duration_ms={duration_ms}"),
        Err(err @ RepoError::StoreFailure(_)) => error!(
            "event=repo_call module=repo status=error op={} duration_ms={} error_code={} error={}",
            op,
            duration_ms,
            err.code(),
            err
        ),
        Err(err) => info!(
            "event=repo_call module=repo status=rejected op={} duration_ms={} error_code={}",
            op,
            duration_ms,
            err.code()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::StatementExecutor;
    use crate::db::{ConnectionProvider, DbResult, MemoryConnectionProvider};
    use crate::repo::error::{Entity, RepoError};
    use rusqlite::Connection;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        inner: MemoryConnectionProvider,
        acquired: AtomicUsize,
        released: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                inner: MemoryConnectionProvider::new().unwrap(),
                acquired: AtomicUsize::new(0),
                released: AtomicUsize::new(0),
            }
        }

        fn counts(&self) -> (usize, usize) {
            (
                self.acquired.load(Ordering::SeqCst),
                self.released.load(Ordering::SeqCst),
            )
        }
    }

    impl ConnectionProvider for CountingProvider {
        fn acquire(&self) -> DbResult<Connection> {
            self.acquired.fetch_add(1, Ordering::SeqCst);
            self.inner.acquire()
        }

        fn release(&self, conn: Connection) {
            self.released.fetch_add(1, Ordering::SeqCst);
            self.inner.release(conn);
        }
    }

    #[test]
    fn connection_is_released_after_success() {
        let provider = CountingProvider::new();
        let executor = StatementExecutor::new(&provider);

        let count = executor
            .run("test.count", |session| {
                Ok(session.count("SELECT COUNT(*) FROM category;", [])?)
            })
            .unwrap();

        assert_eq!(count, 0);
        assert_eq!(provider.counts(), (1, 1));
    }

    #[test]
    fn connection_is_released_after_logical_error() {
        let provider = CountingProvider::new();
        let executor = StatementExecutor::new(&provider);

        let err = executor
            .run("test.reject", |_| -> Result<(), RepoError> {
                Err(RepoError::not_found(Entity::Category, 1))
            })
            .unwrap_err();

        assert!(matches!(err, RepoError::NotFound { .. }));
        assert_eq!(provider.counts(), (1, 1));
    }

    #[test]
    fn connection_is_released_after_store_fault() {
        let provider = CountingProvider::new();
        let executor = StatementExecutor::new(&provider);

        let err = executor
            .run("test.fault", |session| {
                Ok(session.execute("UPDATE no_such_table SET x = 1;", [])?)
            })
            .unwrap_err();

        assert!(err.is_store_failure());
        assert_eq!(provider.counts(), (1, 1));
    }

    #[test]
    fn connection_is_released_when_body_panics() {
        let provider = CountingProvider::new();
        let executor = StatementExecutor::new(&provider);

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            executor.run("test.panic", |_| -> Result<(), RepoError> {
                panic!("boom");
            })
        }));

        assert!(outcome.is_err());
        assert_eq!(provider.counts(), (1, 1));
    }

    #[test]
    fn insert_returning_id_reports_skipped_conditional_insert() {
        let provider = MemoryConnectionProvider::new().unwrap();
        let executor = StatementExecutor::new(&provider);
        let sql = "INSERT INTO category (name, description)
                   SELECT ?1, NULL
                   WHERE NOT EXISTS (SELECT 1 FROM category WHERE name = ?1)
                   RETURNING id;";

        let first = executor
            .run("test.insert", |session| {
                Ok(session.insert_returning_id(sql, ["Tech"])?)
            })
            .unwrap();
        let second = executor
            .run("test.insert", |session| {
                Ok(session.insert_returning_id(sql, ["Tech"])?)
            })
            .unwrap();

        assert_eq!(first, Some(1));
        assert_eq!(second, None);
    }
}
