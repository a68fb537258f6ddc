//! Unit of work
//!
//! Records the read set and buffers the write set of one ledger operation,
//! then hands both to the store in a single atomic `apply`.

use std::collections::BTreeMap;

use super::{ChangeSet, Read, StateStore, StoreResult, VersionedValue, Write};

/// A key as first seen by this unit of work
#[derive(Debug, Clone)]
struct Observed {
    value: Option<Vec<u8>>,
    version: Option<u64>,
}

/// Transactional view over a [`StateStore`].
///
/// Reads go to the store once per key and are remembered together with
/// the version seen. Writes stay local until [`UnitOfWork::commit`] and
/// are visible to later reads through this unit. Dropping a unit without
/// committing discards every buffered write.
pub struct UnitOfWork<'a, S: StateStore + ?Sized> {
    store: &'a S,
    reads: BTreeMap<String, Observed>,
    writes: BTreeMap<String, Option<Vec<u8>>>,
}

impl<'a, S: StateStore + ?Sized> UnitOfWork<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            reads: BTreeMap::new(),
            writes: BTreeMap::new(),
        }
    }

    /// Read a key, preferring this unit's own pending write
    pub async fn get(&mut self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        if let Some(pending) = self.writes.get(key) {
            return Ok(pending.clone());
        }
        if let Some(observed) = self.reads.get(key) {
            return Ok(observed.value.clone());
        }

        let stored = self.store.get(key).await?;
        let observed = match stored {
            Some(VersionedValue { value, version }) => Observed {
                value: Some(value),
                version: Some(version),
            },
            None => Observed {
                value: None,
                version: None,
            },
        };
        let value = observed.value.clone();
        self.reads.insert(key.to_string(), observed);
        Ok(value)
    }

    /// Buffer a put
    pub fn put(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.writes.insert(key.into(), Some(value));
    }

    /// Buffer a delete
    pub fn delete(&mut self, key: impl Into<String>) {
        self.writes.insert(key.into(), None);
    }

    /// Scan `[start, end)` with this unit's pending writes laid over the result.
    ///
    /// Range reads are not added to the read set.
    pub async fn range_scan(
        &mut self,
        start: &str,
        end: &str,
    ) -> StoreResult<Vec<(String, Vec<u8>)>> {
        if start >= end {
            return Ok(Vec::new());
        }

        let mut merged: BTreeMap<String, Vec<u8>> = self
            .store
            .range_scan(start, end)
            .await?
            .into_iter()
            .map(|(key, versioned)| (key, versioned.value))
            .collect();

        let pending = self
            .writes
            .range::<str, _>((
                std::ops::Bound::Included(start),
                std::ops::Bound::Excluded(end),
            ));
        for (key, value) in pending {
            match value {
                Some(bytes) => {
                    merged.insert(key.clone(), bytes.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(merged.into_iter().collect())
    }

    /// Whether any write is pending
    pub fn has_writes(&self) -> bool {
        !self.writes.is_empty()
    }

    /// Keys this unit has read so far
    pub fn read_keys(&self) -> impl Iterator<Item = &str> {
        self.reads.keys().map(String::as_str)
    }

    /// Keys this unit will write on commit
    pub fn write_keys(&self) -> impl Iterator<Item = &str> {
        self.writes.keys().map(String::as_str)
    }

    /// Package the read set and write set
    pub fn into_change_set(self) -> ChangeSet {
        ChangeSet {
            reads: self
                .reads
                .into_iter()
                .map(|(key, observed)| Read {
                    key,
                    version: observed.version,
                })
                .collect(),
            writes: self
                .writes
                .into_iter()
                .map(|(key, value)| Write { key, value })
                .collect(),
        }
    }

    /// Submit the unit to the store.
    ///
    /// Returns the commit version, or `None` for a read-only unit, which
    /// never touches the store.
    pub async fn commit(self) -> StoreResult<Option<u64>> {
        if !self.has_writes() {
            return Ok(None);
        }
        let store = self.store;
        let changes = self.into_change_set();
        store.apply(changes).await.map(Some)
    }
}
