//! Connection providers handed to repositories.
//!
//! # Responsibility
//! - Supply one live, migrated connection per repository operation.
//! - Take connections back once the operation is finished.
//!
//! # Invariants
//! - Providers never pool or share a connection between operations.
//! - Every connection returned by `acquire` has migrations applied.

use super::open::{open_db_with_timeout, open_memdb};
use super::{DbResult, DEFAULT_BUSY_TIMEOUT};
use log::{info, warn};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// Source of per-operation connections.
///
/// Repositories call `acquire` at the start of an operation and `release`
/// exactly once when it ends, on every exit path.
pub trait ConnectionProvider: Send + Sync {
    /// Returns a ready-to-use connection.
    fn acquire(&self) -> DbResult<Connection>;

    /// Takes back a connection obtained from `acquire`.
    fn release(&self, conn: Connection) {
        close_connection(conn);
    }
}

impl<P: ConnectionProvider + ?Sized> ConnectionProvider for &P {
    fn acquire(&self) -> DbResult<Connection> {
        (**self).acquire()
    }

    fn release(&self, conn: Connection) {
        (**self).release(conn)
    }
}

/// Opens a fresh connection to a database file for every operation.
#[derive(Debug, Clone)]
pub struct FileConnectionProvider {
    path: PathBuf,
    busy_timeout: Duration,
}

impl FileConnectionProvider {
    /// Creates a provider for `path`, migrating the file up front so schema
    /// errors surface here instead of on the first repository call.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Same as [`FileConnectionProvider::open`] with an explicit busy timeout.
    pub fn open_with_timeout(path: impl AsRef<Path>, busy_timeout: Duration) -> DbResult<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = open_db_with_timeout(&path, busy_timeout)?;
        close_connection(conn);
        info!(
            "event=provider_ready module=db status=ok mode=file busy_timeout_ms={}",
            busy_timeout.as_millis()
        );
        Ok(Self { path, busy_timeout })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConnectionProvider for FileConnectionProvider {
    fn acquire(&self) -> DbResult<Connection> {
        open_db_with_timeout(&self.path, self.busy_timeout)
    }
}

/// Named in-memory database on the `memdb` VFS, one per provider instance.
///
/// Operations get their own connection each time and wait on each other
/// through the busy timeout, like the file provider. The anchor connection
/// keeps the database alive between operations; it is never used for
/// statements, and the mutex only makes the provider `Sync`.
pub struct MemoryConnectionProvider {
    uri: String,
    busy_timeout: Duration,
    _anchor: Mutex<Connection>,
}

impl MemoryConnectionProvider {
    pub fn new() -> DbResult<Self> {
        Self::with_timeout(DEFAULT_BUSY_TIMEOUT)
    }

    pub fn with_timeout(busy_timeout: Duration) -> DbResult<Self> {
        let uri = format!("file:/blogstore-{}?vfs=memdb", Uuid::new_v4());
        let anchor = open_memdb(&uri, busy_timeout)?;
        info!(
            "event=provider_ready module=db status=ok mode=memdb busy_timeout_ms={}",
            busy_timeout.as_millis()
        );
        Ok(Self {
            uri,
            busy_timeout,
            _anchor: Mutex::new(anchor),
        })
    }
}

impl ConnectionProvider for MemoryConnectionProvider {
    fn acquire(&self) -> DbResult<Connection> {
        open_memdb(&self.uri, self.busy_timeout)
    }
}

fn close_connection(conn: Connection) {
    if let Err((_, err)) = conn.close() {
        warn!("event=db_close module=db status=error error_code=db_close_failed error={err}");
    }
}

#[cfg(test)]
mod tests {
    use super::{ConnectionProvider, MemoryConnectionProvider};

    #[test]
    fn memory_provider_keeps_data_between_operations() {
        let provider = MemoryConnectionProvider::new().unwrap();

        let conn = provider.acquire().unwrap();
        conn.execute("INSERT INTO category (name) VALUES ('Tech');", [])
            .unwrap();
        provider.release(conn);

        let conn = provider.acquire().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM category;", [], |row| row.get(0))
            .unwrap();
        provider.release(conn);

        assert_eq!(count, 1);
    }

    #[test]
    fn memory_providers_do_not_share_data() {
        let first = MemoryConnectionProvider::new().unwrap();
        let second = MemoryConnectionProvider::new().unwrap();

        let conn = first.acquire().unwrap();
        conn.execute("INSERT INTO category (name) VALUES ('Tech');", [])
            .unwrap();
        first.release(conn);

        let conn = second.acquire().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM category;", [], |row| row.get(0))
            .unwrap();
        second.release(conn);

        assert_eq!(count, 0);
    }

    #[test]
    fn memory_provider_makes_a_held_write_lock_wait_instead_of_fail() {
        let provider = MemoryConnectionProvider::new().unwrap();
        let holder = provider.acquire().unwrap();
        holder
            .execute_batch("BEGIN IMMEDIATE; INSERT INTO category (name) VALUES ('Tech');")
            .unwrap();

        std::thread::scope(|scope| {
            let waiter = scope.spawn(|| {
                let conn = provider.acquire().unwrap();
                let result = conn.execute("INSERT INTO category (name) VALUES ('News');", []);
                provider.release(conn);
                result
            });
            std::thread::sleep(std::time::Duration::from_millis(100));
            holder.execute_batch("COMMIT;").unwrap();
            assert_eq!(waiter.join().unwrap().unwrap(), 1);
        });
        provider.release(holder);
    }
}
