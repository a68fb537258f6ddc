//! Transfer Engine
//!
//! Sequences balance changes and their transaction records inside one
//! unit of work. Owns no state: every account is re-read from the store.

use chrono::{DateTime, Utc};

use crate::domain::{Account, Amount, LedgerError, LedgerResult, Transaction, TransactionType};
use crate::state::{KeyCodec, StateStore, UnitOfWork};

use super::{AccountStore, NewTransaction, TransactionLedger};

/// Both sides of a completed transfer
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub sender: Account,
    pub receiver: Account,
    pub debit: Transaction,
    pub credit: Transaction,
}

/// One account after a deposit or withdrawal
#[derive(Debug, Clone)]
pub struct MovementOutcome {
    pub account: Account,
    pub transaction: Transaction,
}

#[derive(Debug, Clone, Copy)]
enum Movement {
    Deposit,
    Withdraw,
}

impl Movement {
    fn transaction_type(self) -> TransactionType {
        match self {
            Movement::Deposit => TransactionType::Deposit,
            Movement::Withdraw => TransactionType::Withdraw,
        }
    }
}

/// Balance mutation protocol bound to one unit of work
pub struct TransferEngine<'u, 'a, S: StateStore + ?Sized> {
    unit: &'u mut UnitOfWork<'a, S>,
}

impl<'u, 'a, S: StateStore + ?Sized> TransferEngine<'u, 'a, S> {
    pub fn new(unit: &'u mut UnitOfWork<'a, S>) -> Self {
        Self { unit }
    }

    // =========================================================================
    // Transfer
    // =========================================================================

    /// Move `amount` from `sender_id` to `receiver_id`.
    ///
    /// Both accounts are read before either is changed. Checks run in this
    /// order: same account, existence, duplicate reference, status, funds.
    /// Nothing is written to the unit until every check has passed.
    pub async fn transfer(
        &mut self,
        sender_id: &str,
        receiver_id: &str,
        amount: Amount,
        reference_number: &str,
        timestamp: DateTime<Utc>,
    ) -> LedgerResult<TransferOutcome> {
        KeyCodec::validate_identifier("sender_id", sender_id)?;
        KeyCodec::validate_identifier("receiver_id", receiver_id)?;
        KeyCodec::validate_identifier("reference_number", reference_number)?;
        if sender_id == receiver_id {
            return Err(LedgerError::SameAccountTransfer);
        }

        let mut sender = AccountStore::new(self.unit).get(sender_id).await?;
        let mut receiver = AccountStore::new(self.unit).get(receiver_id).await?;

        {
            let mut ledger = TransactionLedger::new(self.unit);
            ledger.ensure_unused(sender_id, reference_number).await?;
            ledger.ensure_unused(receiver_id, reference_number).await?;
        }

        let before = sender.balance().minor_units() + receiver.balance().minor_units();

        // Status of both sides is checked before funds so a closed receiver
        // is reported as such even when the sender is short.
        for account in [&sender, &receiver] {
            if !account.is_active() {
                return Err(LedgerError::InactiveAccount {
                    id: account.id().to_string(),
                    status: account.status(),
                });
            }
        }

        sender.debit(&amount)?;
        receiver.credit(&amount)?;

        debug_assert_eq!(
            before,
            sender.balance().minor_units() + receiver.balance().minor_units()
        );

        {
            let mut accounts = AccountStore::new(self.unit);
            accounts.save(&sender)?;
            accounts.save(&receiver)?;
        }

        let mut ledger = TransactionLedger::new(self.unit);
        let debit = ledger
            .record(NewTransaction {
                account_id: sender_id,
                reference_number,
                transaction_type: TransactionType::TransferDebit,
                amount,
                timestamp,
                counterparty_id: Some(receiver_id),
            })
            .await?;
        let credit = ledger
            .record(NewTransaction {
                account_id: receiver_id,
                reference_number,
                transaction_type: TransactionType::TransferCredit,
                amount,
                timestamp,
                counterparty_id: Some(sender_id),
            })
            .await?;

        Ok(TransferOutcome {
            sender,
            receiver,
            debit,
            credit,
        })
    }

    // =========================================================================
    // Single-account movements
    // =========================================================================

    /// Credit `amount` to one account
    pub async fn deposit(
        &mut self,
        account_id: &str,
        amount: Amount,
        reference_number: &str,
        timestamp: DateTime<Utc>,
    ) -> LedgerResult<MovementOutcome> {
        self.movement(
            account_id,
            amount,
            reference_number,
            timestamp,
            Movement::Deposit,
        )
        .await
    }

    /// Debit `amount` from one account; the balance never goes negative
    pub async fn withdraw(
        &mut self,
        account_id: &str,
        amount: Amount,
        reference_number: &str,
        timestamp: DateTime<Utc>,
    ) -> LedgerResult<MovementOutcome> {
        self.movement(
            account_id,
            amount,
            reference_number,
            timestamp,
            Movement::Withdraw,
        )
        .await
    }

    async fn movement(
        &mut self,
        account_id: &str,
        amount: Amount,
        reference_number: &str,
        timestamp: DateTime<Utc>,
        movement: Movement,
    ) -> LedgerResult<MovementOutcome> {
        KeyCodec::validate_identifier("account_id", account_id)?;
        KeyCodec::validate_identifier("reference_number", reference_number)?;

        let mut account = AccountStore::new(self.unit).get(account_id).await?;
        TransactionLedger::new(self.unit)
            .ensure_unused(account_id, reference_number)
            .await?;

        match movement {
            Movement::Deposit => account.credit(&amount)?,
            Movement::Withdraw => account.debit(&amount)?,
        };

        AccountStore::new(self.unit).save(&account)?;
        let transaction = TransactionLedger::new(self.unit)
            .record(NewTransaction {
                account_id,
                reference_number,
                transaction_type: movement.transaction_type(),
                amount,
                timestamp,
                counterparty_id: None,
            })
            .await?;

        Ok(MovementOutcome {
            account,
            transaction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountAttributes, AccountStatus, Balance, MAX_AMOUNT};
    use crate::state::MemoryStore;

    async fn store_with(accounts: &[(&str, u64)]) -> MemoryStore {
        let store = MemoryStore::new();
        let mut unit = UnitOfWork::new(&store);
        for (id, balance) in accounts {
            AccountStore::new(&mut unit)
                .create(Account::open(
                    *id,
                    AccountAttributes::new(),
                    Balance::new(*balance).unwrap(),
                    Utc::now(),
                ))
                .await
                .unwrap();
        }
        unit.commit().await.unwrap();
        store
    }

    fn amount(value: u64) -> Amount {
        Amount::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_transfer_moves_funds_and_records_both_legs() {
        let store = store_with(&[("A", 500), ("B", 0)]).await;
        let mut unit = UnitOfWork::new(&store);

        let outcome = TransferEngine::new(&mut unit)
            .transfer("A", "B", amount(200), "r2", Utc::now())
            .await
            .unwrap();

        assert_eq!(outcome.sender.balance().minor_units(), 300);
        assert_eq!(outcome.receiver.balance().minor_units(), 200);
        assert_eq!(outcome.debit.transaction_type, TransactionType::TransferDebit);
        assert_eq!(outcome.debit.counterparty_id.as_deref(), Some("B"));
        assert_eq!(outcome.credit.transaction_type, TransactionType::TransferCredit);
        assert_eq!(outcome.credit.counterparty_id.as_deref(), Some("A"));

        // Two account keys and two transaction keys in one write set
        assert_eq!(unit.write_keys().count(), 4);
    }

    #[tokio::test]
    async fn test_transfer_insufficient_funds_writes_nothing() {
        let store = store_with(&[("A", 100), ("B", 0)]).await;
        let mut unit = UnitOfWork::new(&store);

        let result = TransferEngine::new(&mut unit)
            .transfer("A", "B", amount(101), "r1", Utc::now())
            .await;

        assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
        assert!(!unit.has_writes());
    }

    #[tokio::test]
    async fn test_transfer_receiver_overflow_leaves_sender_untouched() {
        let store = store_with(&[("A", 100), ("B", MAX_AMOUNT)]).await;
        let mut unit = UnitOfWork::new(&store);

        let result = TransferEngine::new(&mut unit)
            .transfer("A", "B", amount(1), "r1", Utc::now())
            .await;

        assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
        assert!(!unit.has_writes());

        // The in-memory debit of A never reached the unit
        let sender = AccountStore::new(&mut unit).get("A").await.unwrap();
        assert_eq!(sender.balance().minor_units(), 100);
        assert!(unit.commit().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transfer_to_inactive_receiver_fails() {
        let store = store_with(&[("A", 100), ("B", 0)]).await;
        let mut unit = UnitOfWork::new(&store);
        let mut receiver = AccountStore::new(&mut unit).get("B").await.unwrap();
        receiver.transition_to(AccountStatus::Closed).unwrap();
        AccountStore::new(&mut unit).save(&receiver).unwrap();
        unit.commit().await.unwrap();

        let mut unit = UnitOfWork::new(&store);
        let result = TransferEngine::new(&mut unit)
            .transfer("A", "B", amount(10), "r1", Utc::now())
            .await;

        assert!(matches!(
            result,
            Err(LedgerError::InactiveAccount { ref id, .. }) if id == "B"
        ));
        assert!(!unit.has_writes());
    }

    #[tokio::test]
    async fn test_transfer_missing_receiver() {
        let store = store_with(&[("A", 100)]).await;
        let mut unit = UnitOfWork::new(&store);

        let result = TransferEngine::new(&mut unit)
            .transfer("A", "ghost", amount(10), "r1", Utc::now())
            .await;

        assert!(matches!(result, Err(LedgerError::NotFound { ref id, .. }) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_transfer_to_self_rejected() {
        let store = store_with(&[("A", 100)]).await;
        let mut unit = UnitOfWork::new(&store);

        let result = TransferEngine::new(&mut unit)
            .transfer("A", "A", amount(10), "r1", Utc::now())
            .await;

        assert!(matches!(result, Err(LedgerError::SameAccountTransfer)));
    }

    #[tokio::test]
    async fn test_withdraw_never_goes_negative() {
        let store = store_with(&[("A", 300)]).await;
        let mut unit = UnitOfWork::new(&store);

        let result = TransferEngine::new(&mut unit)
            .withdraw("A", amount(1000), "r3", Utc::now())
            .await;

        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds {
                required: 1000,
                available: 300
            })
        ));
        assert!(!unit.has_writes());
    }

    #[tokio::test]
    async fn test_deposit_records_transaction() {
        let store = store_with(&[("A", 0)]).await;
        let mut unit = UnitOfWork::new(&store);

        let outcome = TransferEngine::new(&mut unit)
            .deposit("A", amount(500), "r1", Utc::now())
            .await
            .unwrap();

        assert_eq!(outcome.account.balance().minor_units(), 500);
        assert_eq!(outcome.transaction.transaction_type, TransactionType::Deposit);
        assert!(outcome.transaction.counterparty_id.is_none());
    }
}
