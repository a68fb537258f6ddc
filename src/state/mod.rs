//! State module
//!
//! Key/value world-state abstraction the ledger runs on.
//! The store is the single source of truth: nothing is cached between
//! operations, and every mutation reaches it as one atomic change set.

mod error;
pub mod keys;
pub mod memory;
pub mod postgres;
mod unit_of_work;

use async_trait::async_trait;

pub use error::{StoreError, StoreResult};
pub use keys::KeyCodec;
pub use memory::MemoryStore;
pub use postgres::PgStateStore;
pub use unit_of_work::UnitOfWork;

/// A stored value together with the commit version that last wrote it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedValue {
    pub value: Vec<u8>,
    pub version: u64,
}

/// One pending write: `Some` puts bytes, `None` deletes the key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Write {
    pub key: String,
    pub value: Option<Vec<u8>>,
}

/// Version of a key as observed by a unit of work (`None` = absent)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Read {
    pub key: String,
    pub version: Option<u64>,
}

/// Read set and write set of one unit of work, submitted together
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub reads: Vec<Read>,
    pub writes: Vec<Write>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Key/value store provided by the execution host.
///
/// `apply` must be atomic: either every read in the change set still
/// holds its observed version and every write becomes visible, or the
/// call fails with [`StoreError::Conflict`] and nothing changes.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read one key
    async fn get(&self, key: &str) -> StoreResult<Option<VersionedValue>>;

    /// Read all keys in `[start, end)`, ascending byte order
    async fn range_scan(&self, start: &str, end: &str)
        -> StoreResult<Vec<(String, VersionedValue)>>;

    /// Validate the read set and apply the write set atomically.
    ///
    /// Returns the commit version assigned to the writes.
    async fn apply(&self, changes: ChangeSet) -> StoreResult<u64>;
}
