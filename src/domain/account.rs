//! Account
//!
//! Account record and its status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Amount, Balance, LedgerError};

/// Account status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Active,
    Suspended,
    Closed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Suspended => "suspended",
            AccountStatus::Closed => "closed",
        }
    }

    /// Whether an administrative move from `self` to `next` is allowed.
    ///
    /// Closed is terminal; no-op transitions are rejected.
    pub fn can_transition_to(&self, next: AccountStatus) -> bool {
        matches!(
            (self, next),
            (AccountStatus::Active, AccountStatus::Suspended)
                | (AccountStatus::Suspended, AccountStatus::Active)
                | (AccountStatus::Active, AccountStatus::Closed)
                | (AccountStatus::Suspended, AccountStatus::Closed)
        )
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity and contact metadata carried with an account.
///
/// Opaque to the ledger: stored and returned, never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Hash of an external identity document, supplied by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_hash: Option<String>,
}

impl AccountAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_identity_hash(mut self, identity_hash: impl Into<String>) -> Self {
        self.identity_hash = Some(identity_hash.into());
        self
    }
}

/// Account record
///
/// Balance changes go through [`Account::debit`] / [`Account::credit`],
/// which check status and funds before returning the updated balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: String,
    balance: Balance,
    status: AccountStatus,
    #[serde(default)]
    attributes: AccountAttributes,
    created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new active account
    pub fn open(
        id: impl Into<String>,
        attributes: AccountAttributes,
        opening_balance: Balance,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            balance: opening_balance,
            status: AccountStatus::Active,
            attributes,
            created_at,
        }
    }

    // =========================================================================
    // Balance mutation
    // =========================================================================

    fn ensure_active(&self) -> Result<(), LedgerError> {
        if self.status != AccountStatus::Active {
            return Err(LedgerError::InactiveAccount {
                id: self.id.clone(),
                status: self.status,
            });
        }
        Ok(())
    }

    /// Withdraw `amount`, returning the new balance
    pub fn debit(&mut self, amount: &Amount) -> Result<Balance, LedgerError> {
        self.ensure_active()?;

        if !self.balance.is_sufficient_for(amount) {
            return Err(LedgerError::insufficient_funds(
                amount.minor_units(),
                self.balance.minor_units(),
            ));
        }

        self.balance = self
            .balance
            .debit(amount)
            .map_err(|e| LedgerError::InvalidAmount(e.to_string()))?;
        Ok(self.balance)
    }

    /// Deposit `amount`, returning the new balance
    pub fn credit(&mut self, amount: &Amount) -> Result<Balance, LedgerError> {
        self.ensure_active()?;

        self.balance = self
            .balance
            .credit(amount)
            .map_err(|e| LedgerError::InvalidAmount(e.to_string()))?;
        Ok(self.balance)
    }

    // =========================================================================
    // Status transitions
    // =========================================================================

    /// Move the account to `next`, rejecting transitions the state machine forbids
    pub fn transition_to(&mut self, next: AccountStatus) -> Result<(), LedgerError> {
        if !self.status.can_transition_to(next) {
            return Err(LedgerError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    pub fn attributes(&self) -> &AccountAttributes {
        &self.attributes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
