//! Command definitions
//!
//! Commands represent intentions to change the ledger. Amounts are carried
//! as raw minor units and validated by the facade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Account, AccountAttributes, Transaction};
use crate::ledger::{MovementOutcome, TransferOutcome};

// =========================================================================
// CreateAccountCommand
// =========================================================================

/// Command to open a new account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountCommand {
    pub account_id: String,
    #[serde(default)]
    pub attributes: AccountAttributes,
    /// Opening balance in minor units; recorded as a deposit when non-zero
    #[serde(default)]
    pub opening_balance: u64,
    pub reference_number: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl CreateAccountCommand {
    pub fn new(account_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            account_id: account_id.into(),
            attributes: AccountAttributes::default(),
            opening_balance: 0,
            reference_number: None,
            timestamp,
        }
    }

    pub fn with_attributes(mut self, attributes: AccountAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_opening_balance(mut self, minor_units: u64) -> Self {
        self.opening_balance = minor_units;
        self
    }

    pub fn with_reference_number(mut self, reference_number: impl Into<String>) -> Self {
        self.reference_number = Some(reference_number.into());
        self
    }
}

// =========================================================================
// DepositCommand / WithdrawCommand
// =========================================================================

/// Command to credit one account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositCommand {
    pub account_id: String,
    /// Amount in minor units
    pub amount: u64,
    pub reference_number: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl DepositCommand {
    pub fn new(account_id: impl Into<String>, amount: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            account_id: account_id.into(),
            amount,
            reference_number: None,
            timestamp,
        }
    }

    pub fn with_reference_number(mut self, reference_number: impl Into<String>) -> Self {
        self.reference_number = Some(reference_number.into());
        self
    }
}

/// Command to debit one account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawCommand {
    pub account_id: String,
    /// Amount in minor units
    pub amount: u64,
    pub reference_number: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl WithdrawCommand {
    pub fn new(account_id: impl Into<String>, amount: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            account_id: account_id.into(),
            amount,
            reference_number: None,
            timestamp,
        }
    }

    pub fn with_reference_number(mut self, reference_number: impl Into<String>) -> Self {
        self.reference_number = Some(reference_number.into());
        self
    }
}

// =========================================================================
// TransferCommand
// =========================================================================

/// Command to move funds between two accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCommand {
    pub sender_id: String,
    pub receiver_id: String,
    /// Amount in minor units
    pub amount: u64,
    pub reference_number: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TransferCommand {
    pub fn new(
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        amount: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            amount,
            reference_number: None,
            timestamp,
        }
    }

    pub fn with_reference_number(mut self, reference_number: impl Into<String>) -> Self {
        self.reference_number = Some(reference_number.into());
        self
    }
}

// =========================================================================
// Results
// =========================================================================

/// Result of a successful deposit or withdrawal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementResult {
    pub account: Account,
    pub transaction: Transaction,
}

impl From<MovementOutcome> for MovementResult {
    fn from(outcome: MovementOutcome) -> Self {
        Self {
            account: outcome.account,
            transaction: outcome.transaction,
        }
    }
}

/// Result of a successful transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResult {
    pub sender: Account,
    pub receiver: Account,
    pub debit: Transaction,
    pub credit: Transaction,
}

impl From<TransferOutcome> for TransferResult {
    fn from(outcome: TransferOutcome) -> Self {
        Self {
            sender: outcome.sender,
            receiver: outcome.receiver,
            debit: outcome.debit,
            credit: outcome.credit,
        }
    }
}
