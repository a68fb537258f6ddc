//! Ledger Error Types
//!
//! Failure taxonomy returned by every ledger operation.

use thiserror::Error;

use crate::state::StoreError;

use super::AccountStatus;

/// Kind of record a lookup failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Account,
    Transaction,
    Transfer,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Account => write!(f, "Account"),
            RecordKind::Transaction => write!(f, "Transaction"),
            RecordKind::Transfer => write!(f, "Transfer"),
        }
    }
}

/// Errors returned by ledger operations.
///
/// Exactly one kind is reported per call. A call that fails never leaves
/// any write behind in the store.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Record absent from the store
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },

    /// Account id already taken
    #[error("Account already exists: {0}")]
    AlreadyExists(String),

    /// Insufficient balance for debit operation
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    /// Non-positive, unparsable or out-of-range amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Balance mutation attempted on an account that is not active
    #[error("Account {id} is {status}")]
    InactiveAccount { id: String, status: AccountStatus },

    /// Reference number already used on this account
    #[error("Duplicate reference {reference_number} on account {account_id}")]
    Duplicate {
        account_id: String,
        reference_number: String,
    },

    /// Empty identifier or one that cannot be encoded into a key
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Transfer to same account
    #[error("Cannot transfer to the same account")]
    SameAccountTransfer,

    /// Administrative status change not permitted
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: AccountStatus,
        to: AccountStatus,
    },

    /// Record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Passthrough from the state store
    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    pub fn account_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: RecordKind::Account,
            id: id.into(),
        }
    }

    pub fn transaction_not_found(account_id: &str, reference_number: &str) -> Self {
        Self::NotFound {
            kind: RecordKind::Transaction,
            id: format!("{account_id}:{reference_number}"),
        }
    }

    pub fn insufficient_funds(required: u64, available: u64) -> Self {
        Self::InsufficientFunds {
            required,
            available,
        }
    }

    pub fn duplicate(account_id: impl Into<String>, reference_number: impl Into<String>) -> Self {
        Self::Duplicate {
            account_id: account_id.into(),
            reference_number: reference_number.into(),
        }
    }

    /// Check if this is a client error (needs corrected input)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::AlreadyExists(_)
                | Self::InsufficientFunds { .. }
                | Self::InvalidAmount(_)
                | Self::InactiveAccount { .. }
                | Self::InvalidIdentifier(_)
                | Self::SameAccountTransfer
                | Self::InvalidTransition { .. }
        )
    }

    /// Check if this is a conflict error.
    ///
    /// `Duplicate` means the operation was already applied; a store
    /// conflict means the unit of work may be re-executed from scratch.
    pub fn is_conflict_error(&self) -> bool {
        match self {
            Self::Duplicate { .. } => true,
            Self::Storage(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// True when re-running the whole operation in a fresh unit may succeed.
    ///
    /// Unlike [`Self::is_conflict_error`], a `Duplicate` is never retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_retryable())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<super::AmountError> for LedgerError {
    fn from(e: super::AmountError) -> Self {
        Self::InvalidAmount(e.to_string())
    }
}
