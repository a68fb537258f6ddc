//! Transaction Ledger
//!
//! Append-only transaction records keyed by (account, reference number).

use chrono::{DateTime, Utc};

use crate::domain::{Amount, LedgerError, LedgerResult, Transaction, TransactionType};
use crate::state::{KeyCodec, StateStore, UnitOfWork};

/// Fields of a transaction about to be recorded
#[derive(Debug, Clone)]
pub struct NewTransaction<'r> {
    pub account_id: &'r str,
    pub reference_number: &'r str,
    pub transaction_type: TransactionType,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    pub counterparty_id: Option<&'r str>,
}

/// Transaction log bound to one unit of work
pub struct TransactionLedger<'u, 'a, S: StateStore + ?Sized> {
    unit: &'u mut UnitOfWork<'a, S>,
}

impl<'u, 'a, S: StateStore + ?Sized> TransactionLedger<'u, 'a, S> {
    pub fn new(unit: &'u mut UnitOfWork<'a, S>) -> Self {
        Self { unit }
    }

    /// Fail with `Duplicate` if `(account_id, reference_number)` is taken.
    ///
    /// The probe puts the key into the read set, so a concurrent unit
    /// recording the same pair makes one of the two commits conflict.
    pub async fn ensure_unused(
        &mut self,
        account_id: &str,
        reference_number: &str,
    ) -> LedgerResult<()> {
        KeyCodec::validate_identifier("account_id", account_id)?;
        KeyCodec::validate_identifier("reference_number", reference_number)?;

        let key = KeyCodec::transaction(account_id, reference_number);
        if self.unit.get(&key).await?.is_some() {
            tracing::warn!(
                account_id = %account_id,
                reference_number = %reference_number,
                "Duplicate reference number rejected"
            );
            return Err(LedgerError::duplicate(account_id, reference_number));
        }
        Ok(())
    }

    /// Append a transaction record; never overwrites an existing one
    pub async fn record(&mut self, new: NewTransaction<'_>) -> LedgerResult<Transaction> {
        self.ensure_unused(new.account_id, new.reference_number)
            .await?;

        if new.transaction_type.is_transfer() != new.counterparty_id.is_some() {
            return Err(LedgerError::InvalidIdentifier(format!(
                "counterparty_id must be present exactly for transfer legs ({})",
                new.transaction_type
            )));
        }

        let transaction = Transaction {
            account_id: new.account_id.to_string(),
            reference_number: new.reference_number.to_string(),
            transaction_type: new.transaction_type,
            amount: new.amount,
            timestamp: new.timestamp,
            counterparty_id: new.counterparty_id.map(str::to_string),
        };

        let bytes = serde_json::to_vec(&transaction)?;
        self.unit.put(
            KeyCodec::transaction(new.account_id, new.reference_number),
            bytes,
        );

        Ok(transaction)
    }

    /// Load one transaction; `NotFound` if absent
    pub async fn get(
        &mut self,
        account_id: &str,
        reference_number: &str,
    ) -> LedgerResult<Transaction> {
        KeyCodec::validate_identifier("account_id", account_id)?;
        KeyCodec::validate_identifier("reference_number", reference_number)?;

        let bytes = self
            .unit
            .get(&KeyCodec::transaction(account_id, reference_number))
            .await?
            .ok_or_else(|| LedgerError::transaction_not_found(account_id, reference_number))?;

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// All transactions of one account, in key (reference number) order.
    ///
    /// Key order is not chronological.
    pub async fn list_for_account(&mut self, account_id: &str) -> LedgerResult<Vec<Transaction>> {
        KeyCodec::validate_identifier("account_id", account_id)?;
        let (start, end) = KeyCodec::account_transactions(account_id);
        self.scan(&start, &end).await
    }

    /// Every transaction in the store, in key order
    pub async fn list_all(&mut self) -> LedgerResult<Vec<Transaction>> {
        let (start, end) = KeyCodec::all_transactions();
        self.scan(&start, &end).await
    }

    async fn scan(&mut self, start: &str, end: &str) -> LedgerResult<Vec<Transaction>> {
        self.unit
            .range_scan(start, end)
            .await?
            .into_iter()
            .map(|(_, bytes)| serde_json::from_slice(&bytes).map_err(LedgerError::from))
            .collect()
    }
}
