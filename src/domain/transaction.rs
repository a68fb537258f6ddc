//! Transaction records
//!
//! Immutable entries in an account's transaction log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Amount;

/// Kind of balance movement a transaction records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdraw,
    TransferDebit,
    TransferCredit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdraw => "withdraw",
            TransactionType::TransferDebit => "transfer_debit",
            TransactionType::TransferCredit => "transfer_credit",
        }
    }

    /// Transfer legs carry a counterparty, single-account movements do not
    pub fn is_transfer(&self) -> bool {
        matches!(
            self,
            TransactionType::TransferDebit | TransactionType::TransferCredit
        )
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single immutable transaction on one account.
///
/// `(account_id, reference_number)` identifies at most one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub account_id: String,
    pub reference_number: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty_id: Option<String>,
}

impl Transaction {
    /// Identifier unique within the account's transaction namespace
    pub fn id(&self) -> String {
        format!("{}:{}", self.account_id, self.reference_number)
    }
}

/// Read-only view of a transfer, assembled from its two legs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferView {
    pub sender_id: String,
    pub receiver_id: String,
    pub reference_number: String,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
}

impl TransferView {
    /// Pair a debit leg with its credit leg.
    ///
    /// Returns `None` unless the two records really are the two sides
    /// of the same transfer.
    pub fn from_legs(debit: &Transaction, credit: &Transaction) -> Option<Self> {
        let paired = debit.transaction_type == TransactionType::TransferDebit
            && credit.transaction_type == TransactionType::TransferCredit
            && debit.reference_number == credit.reference_number
            && debit.amount == credit.amount
            && debit.counterparty_id.as_deref() == Some(credit.account_id.as_str())
            && credit.counterparty_id.as_deref() == Some(debit.account_id.as_str());

        paired.then(|| Self {
            sender_id: debit.account_id.clone(),
            receiver_id: credit.account_id.clone(),
            reference_number: debit.reference_number.clone(),
            amount: debit.amount,
            timestamp: debit.timestamp,
        })
    }
}
