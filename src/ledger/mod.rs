//! Ledger module
//!
//! Account lifecycle, the transaction log and the balance mutation
//! protocol. Each component borrows the caller's unit of work; none
//! keeps state between calls.

mod account_store;
mod transaction_ledger;
mod transfer_engine;

pub use account_store::AccountStore;
pub use transaction_ledger::{NewTransaction, TransactionLedger};
pub use transfer_engine::{MovementOutcome, TransferEngine, TransferOutcome};
