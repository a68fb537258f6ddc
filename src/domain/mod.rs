//! Domain module
//!
//! Core domain types and business rules.

pub mod account;
pub mod amount;
pub mod context;
pub mod error;
pub mod transaction;

pub use account::{Account, AccountAttributes, AccountStatus};
pub use amount::{Amount, AmountError, Balance, MAX_AMOUNT, MAX_SCALE};
pub use context::OperationContext;
pub use error::{LedgerError, LedgerResult, RecordKind};
pub use transaction::{Transaction, TransactionType, TransferView};
