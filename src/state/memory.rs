//! In-memory state store
//!
//! Single-process world state with the same optimistic validation as the
//! database backend. Used by tests, the load test and the `memory` backend.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ChangeSet, StateStore, StoreError, StoreResult, VersionedValue};

#[derive(Debug, Default)]
struct Inner {
    entries: BTreeMap<String, VersionedValue>,
    /// Last commit version handed out
    version: u64,
}

/// Ordered map guarded by one async mutex per commit
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last commit version handed out (0 before the first commit)
    pub async fn current_version(&self) -> u64 {
        self.inner.lock().await.version
    }

    /// Write a key outside any unit of work (test fixtures)
    pub async fn seed(&self, key: impl Into<String>, value: Vec<u8>) -> u64 {
        let mut inner = self.inner.lock().await;
        inner.version += 1;
        let version = inner.version;
        inner.entries.insert(key.into(), VersionedValue { value, version });
        version
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<VersionedValue>> {
        Ok(self.inner.lock().await.entries.get(key).cloned())
    }

    async fn range_scan(
        &self,
        start: &str,
        end: &str,
    ) -> StoreResult<Vec<(String, VersionedValue)>> {
        if start >= end {
            return Ok(Vec::new());
        }
        let inner = self.inner.lock().await;
        Ok(inner
            .entries
            .range::<str, _>((
                std::ops::Bound::Included(start),
                std::ops::Bound::Excluded(end),
            ))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn apply(&self, changes: ChangeSet) -> StoreResult<u64> {
        let mut inner = self.inner.lock().await;

        // Validate the whole read set before touching anything
        for read in &changes.reads {
            let current = inner.entries.get(&read.key).map(|v| v.version);
            if current != read.version {
                tracing::warn!(
                    key = ?read.key,
                    expected = ?read.version,
                    found = ?current,
                    "Read set validation failed"
                );
                return Err(StoreError::Conflict {
                    key: read.key.clone(),
                });
            }
        }

        inner.version += 1;
        let version = inner.version;

        for write in changes.writes {
            match write.value {
                Some(value) => {
                    inner
                        .entries
                        .insert(write.key, VersionedValue { value, version });
                }
                None => {
                    inner.entries.remove(&write.key);
                }
            }
        }

        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Read, Write};

    fn put(key: &str, value: &[u8]) -> Write {
        Write {
            key: key.to_string(),
            value: Some(value.to_vec()),
        }
    }

    #[test]
    fn test_apply_assigns_increasing_versions() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();

            let v1 = store
                .apply(ChangeSet {
                    reads: vec![],
                    writes: vec![put("a", b"1")],
                })
                .await
                .unwrap();
            let v2 = store
                .apply(ChangeSet {
                    reads: vec![],
                    writes: vec![put("b", b"2")],
                })
                .await
                .unwrap();

            assert!(v2 > v1);
            assert_eq!(store.get("a").await.unwrap().unwrap().version, v1);
            assert_eq!(store.current_version().await, v2);
        });
    }

    #[tokio::test]
    async fn test_conflicting_apply_changes_nothing() {
        let store = MemoryStore::new();
        let seeded = store.seed("a", b"1".to_vec()).await;

        let result = store
            .apply(ChangeSet {
                reads: vec![Read {
                    key: "a".to_string(),
                    version: Some(seeded + 10),
                }],
                writes: vec![put("a", b"2"), put("b", b"3")],
            })
            .await;

        assert!(matches!(result, Err(StoreError::Conflict { .. })));
        assert_eq!(store.get("a").await.unwrap().unwrap().value, b"1".to_vec());
        assert!(store.get("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_absent_read_conflicts_with_concurrent_insert() {
        let store = MemoryStore::new();
        store.seed("a", b"other".to_vec()).await;

        let result = store
            .apply(ChangeSet {
                reads: vec![Read {
                    key: "a".to_string(),
                    version: None,
                }],
                writes: vec![put("a", b"mine")],
            })
            .await;

        assert!(matches!(result, Err(StoreError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_recreated_key_gets_fresh_version() {
        let store = MemoryStore::new();
        let first = store.seed("a", b"1".to_vec()).await;

        store
            .apply(ChangeSet {
                reads: vec![],
                writes: vec![Write {
                    key: "a".to_string(),
                    value: None,
                }],
            })
            .await
            .unwrap();
        let second = store.seed("a", b"1".to_vec()).await;

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_range_scan_is_ordered_and_half_open() {
        let store = MemoryStore::new();
        for key in ["c", "a", "b", "d"] {
            store.seed(key, key.as_bytes().to_vec()).await;
        }

        let keys: Vec<String> = store
            .range_scan("a", "d")
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();

        assert_eq!(keys, vec!["a", "b", "c"]);
        assert!(store.range_scan("d", "a").await.unwrap().is_empty());
    }
}
