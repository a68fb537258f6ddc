//! ledger_core Library
//!
//! Per-account balance ledger with an append-only transaction log over an
//! ordered key/value store. Re-exports modules for the server binary,
//! integration testing and external use.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod handlers;
pub mod ledger;
pub mod state;

mod error;

pub use config::{Config, ConfigError, LogFormat, StorageBackend};
pub use domain::{
    Account, AccountAttributes, AccountStatus, Amount, AmountError, Balance, LedgerError,
    LedgerResult, OperationContext, Transaction, TransactionType, TransferView,
};
pub use error::{AppError, AppResult, ErrorResponse};
pub use handlers::LedgerFacade;
pub use state::{MemoryStore, PgStateStore, StateStore, StoreError};
