//! State Store Errors
//!
//! Error types for world-state operations.

/// Errors that can occur in a state store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A key in the read set changed before the unit of work committed
    #[error("Concurrency conflict on key {key:?}")]
    Conflict { key: String },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Any other backend failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Check if this error is a concurrency conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    /// Check if re-executing the whole unit of work may succeed
    pub fn is_retryable(&self) -> bool {
        self.is_conflict()
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_is_retryable() {
        let conflict = StoreError::Conflict {
            key: "k".to_string(),
        };
        assert!(conflict.is_retryable());
        assert!(conflict.is_conflict());

        let backend = StoreError::Backend("unavailable".to_string());
        assert!(!backend.is_retryable());
    }
}
