//! SQLite-backed document store.
//!
//! RULE: Only the store talks to the database.
//! Collections are JSON documents keyed by their identity field; the
//! engine reads them as typed records and writes them through
//! transactional bulk writes.

use crate::error::ReconResult;
use rusqlite::Connection;

mod commit;
mod documents;
mod lock;

pub use commit::{BulkWriteResult, CommitResults};
pub use lock::LockMode;

pub const DEFAULT_COMMIT_MAX_RETRIES: u32 = 3;

pub struct DocStore {
    conn: Connection,
    commit_max_retries: u32,
}

impl DocStore {
    pub fn open(path: &str) -> ReconResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.busy_timeout(std::time::Duration::from_millis(500))?;
        Ok(Self {
            conn,
            commit_max_retries: DEFAULT_COMMIT_MAX_RETRIES,
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ReconResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self {
            conn,
            commit_max_retries: DEFAULT_COMMIT_MAX_RETRIES,
        })
    }

    /// How many times a commit is retried after a transient lock conflict.
    pub fn with_commit_retries(mut self, retries: u32) -> Self {
        self.commit_max_retries = retries;
        self
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> ReconResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_documents.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_job_lock.sql"))?;
        Ok(())
    }

    /// Run `f` inside one read transaction so that several finds see the
    /// same state.
    pub fn with_read_tx<R>(&self, f: impl FnOnce(&Self) -> ReconResult<R>) -> ReconResult<R> {
        let tx = self.conn.unchecked_transaction()?;
        let result = f(self)?;
        tx.commit()?;
        Ok(result)
    }
}
