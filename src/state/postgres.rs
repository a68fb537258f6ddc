//! PostgreSQL state store
//!
//! World state kept in one table of raw byte keys. Every change set is
//! validated and applied inside a single SERIALIZABLE transaction.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::{ChangeSet, StateStore, StoreError, StoreResult, VersionedValue};

/// SQLSTATE for serialization_failure
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Statements creating the world-state schema, run by [`crate::db::ensure_schema`]
pub const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS world_state (
        key BYTEA PRIMARY KEY,
        value BYTEA NOT NULL,
        version BIGINT NOT NULL
    )
    "#,
    "CREATE SEQUENCE IF NOT EXISTS world_state_version_seq",
];

/// State store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgStateStore {
    pool: PgPool,
}

impl PgStateStore {
    /// Create a new store with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Current version of a key inside the open transaction, locking its row
    async fn locked_version(
        tx: &mut Transaction<'_, Postgres>,
        key: &str,
    ) -> Result<Option<u64>, sqlx::Error> {
        let version: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT version FROM world_state WHERE key = $1 FOR UPDATE
            "#,
        )
        .bind(key.as_bytes())
        .fetch_optional(&mut **tx)
        .await?;

        Ok(version.map(|v| v as u64))
    }

    async fn try_apply(&self, changes: &ChangeSet) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        // Validate the read set (optimistic concurrency)
        for read in &changes.reads {
            let current = Self::locked_version(&mut tx, &read.key).await?;
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

        let version: i64 = sqlx::query_scalar("SELECT nextval('world_state_version_seq')")
            .fetch_one(&mut *tx)
            .await?;

        for write in &changes.writes {
            match &write.value {
                Some(value) => {
                    sqlx::query(
                        r#"
                        INSERT INTO world_state (key, value, version)
                        VALUES ($1, $2, $3)
                        ON CONFLICT (key)
                        DO UPDATE SET value = EXCLUDED.value, version = EXCLUDED.version
                        "#,
                    )
                    .bind(write.key.as_bytes())
                    .bind(value.as_slice())
                    .bind(version)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    sqlx::query("DELETE FROM world_state WHERE key = $1")
                        .bind(write.key.as_bytes())
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;

        Ok(version as u64)
    }
}

/// Report serialization failures and racing inserts as conflicts
fn classify(error: StoreError, changes: &ChangeSet) -> StoreError {
    let StoreError::Database(sqlx::Error::Database(db_error)) = &error else {
        return error;
    };

    match db_error.code().as_deref() {
        Some(SERIALIZATION_FAILURE) | Some(UNIQUE_VIOLATION) => {
            let key = changes
                .writes
                .first()
                .map(|w| w.key.clone())
                .unwrap_or_default();
            StoreError::Conflict { key }
        }
        _ => error,
    }
}

fn decode_key(bytes: Vec<u8>) -> StoreResult<String> {
    String::from_utf8(bytes).map_err(|e| StoreError::Backend(format!("non UTF-8 key: {e}")))
}

#[async_trait]
impl StateStore for PgStateStore {
    async fn get(&self, key: &str) -> StoreResult<Option<VersionedValue>> {
        let row: Option<(Vec<u8>, i64)> = sqlx::query_as(
            r#"
            SELECT value, version FROM world_state WHERE key = $1
            "#,
        )
        .bind(key.as_bytes())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(value, version)| VersionedValue {
            value,
            version: version as u64,
        }))
    }

    async fn range_scan(
        &self,
        start: &str,
        end: &str,
    ) -> StoreResult<Vec<(String, VersionedValue)>> {
        let rows: Vec<(Vec<u8>, Vec<u8>, i64)> = sqlx::query_as(
            r#"
            SELECT key, value, version
            FROM world_state
            WHERE key >= $1 AND key < $2
            ORDER BY key ASC
            "#,
        )
        .bind(start.as_bytes())
        .bind(end.as_bytes())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(key, value, version)| {
                Ok((
                    decode_key(key)?,
                    VersionedValue {
                        value,
                        version: version as u64,
                    },
                ))
            })
            .collect()
    }

    async fn apply(&self, changes: ChangeSet) -> StoreResult<u64> {
        self.try_apply(&changes)
            .await
            .map_err(|e| classify(e, &changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements() {
        assert!(SCHEMA[0].contains("world_state"));
        assert!(SCHEMA[1].contains("world_state_version_seq"));
    }

    #[test]
    fn test_classify_passes_through_other_errors() {
        let changes = ChangeSet::default();
        let error = classify(StoreError::Backend("boom".to_string()), &changes);
        assert!(matches!(error, StoreError::Backend(_)));

        let error = classify(StoreError::Database(sqlx::Error::RowNotFound), &changes);
        assert!(matches!(error, StoreError::Database(_)));
    }

    #[test]
    fn test_decode_key() {
        assert_eq!(decode_key(b"\0account\0A\0".to_vec()).unwrap(), "\0account\0A\0");
        assert!(decode_key(vec![0xff, 0xfe]).is_err());
    }
}
