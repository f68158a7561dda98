//! Persistent storage of previously-seen content hashes.
//!
//! The store is a set of opaque digests with last-access timestamps and
//! no knowledge of rules or files. It is the only shared mutable state
//! in the system and must tolerate concurrent callers without external
//! locking.
//!
//! * [`sqlite`]: the embedded single-table implementation used in
//!   production, with optional time-based eviction.

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::cancel::CancelFlag;
use crate::error::Result;
use crate::hash::Hash256;

/// A persistent set of content hashes.
///
/// Entries may be expired to save space; expiry is an implementation
/// concern and defaults to never.
pub trait HashStore: Send + Sync {
    /// Whether the store contains `hash`. A hit also refreshes the
    /// entry's last-access time. Absence is `Ok(false)`, not an error.
    fn has(&self, cancel: &CancelFlag, hash: &Hash256) -> Result<bool>;

    /// Insert `hash`, or refresh its last-access time if already
    /// present. Implementations with a retention window additionally
    /// evict stale entries as part of the same operation.
    fn add(&self, cancel: &CancelFlag, hash: &Hash256) -> Result<()>;
}
