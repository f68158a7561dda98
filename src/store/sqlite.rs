//! SQLite-backed hash store.
//!
//! One table, hash as primary key, last-access time in integer unix
//! seconds. The schema is created on open if absent, so pointing at a
//! fresh path just works. All statements are single SQL operations, so
//! concurrent callers cannot observe partial rows; a lost timestamp
//! refresh under contention merely shortens retention slightly.

use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection};

use crate::cancel::CancelFlag;
use crate::error::{Error, Result};
use crate::hash::Hash256;
use crate::store::HashStore;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS hashes (
  hash BLOB NOT NULL PRIMARY KEY,
  unix_secs INTEGER NOT NULL
);
";

/// How long to retry when another connection holds the sqlite lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Persistent hash store backed by a SQLite file.
///
/// By default entries are kept forever. With a retention window set via
/// [`SqliteStore::with_retention`], every [`HashStore::add`] also evicts
/// entries whose last-access time is older than the window.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    keep: Option<Duration>,
}

impl SqliteStore {
    /// Open the store at `path`, creating the file and schema if
    /// needed.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        log::debug!("opened hash store at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            keep: None,
        })
    }

    /// Evict entries not accessed for `keep` as part of every `add`.
    #[must_use]
    pub fn with_retention(mut self, keep: Duration) -> Self {
        self.keep = Some(keep);
        self
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::storage("hash store mutex poisoned"))
    }
}

impl HashStore for SqliteStore {
    fn has(&self, cancel: &CancelFlag, hash: &Hash256) -> Result<bool> {
        cancel.check()?;
        let conn = self.lock()?;
        // Membership check and access-time refresh in one statement.
        let affected = conn.execute(
            "UPDATE hashes SET unix_secs = ?1 WHERE hash = ?2",
            params![now_unix()?, hash.as_bytes().as_slice()],
        )?;
        Ok(affected > 0)
    }

    fn add(&self, cancel: &CancelFlag, hash: &Hash256) -> Result<()> {
        cancel.check()?;
        let now = now_unix()?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO hashes (hash, unix_secs) VALUES (?1, ?2)
             ON CONFLICT(hash) DO UPDATE SET unix_secs = excluded.unix_secs",
            params![hash.as_bytes().as_slice(), now],
        )?;
        if let Some(keep) = self.keep {
            let cutoff = now - keep.as_secs() as i64;
            let evicted = conn.execute(
                "DELETE FROM hashes WHERE unix_secs < ?1",
                params![cutoff],
            )?;
            if evicted > 0 {
                log::debug!("evicted {evicted} stale hash store entries");
            }
        }
        Ok(())
    }
}

fn now_unix() -> Result<i64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .map_err(|_| Error::storage("system clock is before the unix epoch"))
}
