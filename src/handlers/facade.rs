//! Ledger Facade
//!
//! Public operation surface. Every call opens a fresh unit of work over the
//! shared store, runs the ledger components inside it and commits once.
//! Nothing is cached between calls.

use std::sync::Arc;

use crate::domain::{
    Account, AccountStatus, Amount, Balance, LedgerError, LedgerResult, OperationContext,
    RecordKind, Transaction, TransactionType, TransferView,
};
use crate::ledger::{AccountStore, NewTransaction, TransactionLedger, TransferEngine};
use crate::state::{KeyCodec, StateStore, UnitOfWork};

use super::{
    CreateAccountCommand, DepositCommand, MovementResult, TransferCommand, TransferResult,
    WithdrawCommand,
};

/// Entry point for all ledger operations
pub struct LedgerFacade<S: StateStore + ?Sized = dyn StateStore> {
    store: Arc<S>,
}

impl<S: StateStore + ?Sized> Clone for LedgerFacade<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: StateStore + ?Sized> LedgerFacade<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn unit(&self) -> UnitOfWork<'_, S> {
        UnitOfWork::new(self.store.as_ref())
    }

    // =========================================================================
    // Account lifecycle
    // =========================================================================

    /// Open an account, recording any opening balance as a deposit
    pub async fn create_account(
        &self,
        command: CreateAccountCommand,
        ctx: &OperationContext,
    ) -> LedgerResult<Account> {
        let opening_balance = Balance::new(command.opening_balance)?;
        let reference_number = ctx.reference_or_tx_id(command.reference_number.as_deref());

        let mut unit = self.unit();
        let account = AccountStore::new(&mut unit)
            .create(Account::open(
                command.account_id,
                command.attributes,
                opening_balance,
                command.timestamp,
            ))
            .await?;

        if !opening_balance.is_zero() {
            let amount = Amount::new(opening_balance.minor_units())?;
            TransactionLedger::new(&mut unit)
                .record(NewTransaction {
                    account_id: account.id(),
                    reference_number: &reference_number,
                    transaction_type: TransactionType::Deposit,
                    amount,
                    timestamp: command.timestamp,
                    counterparty_id: None,
                })
                .await?;
        }

        let commit_version = unit.commit().await?;

        tracing::info!(
            account_id = %account.id(),
            opening_balance = opening_balance.minor_units(),
            tx_id = %ctx.tx_id,
            invoker = ?ctx.invoker,
            commit_version = ?commit_version,
            "Account created"
        );

        Ok(account)
    }

    pub async fn get_account(&self, id: &str) -> LedgerResult<Account> {
        let mut unit = self.unit();
        let account = AccountStore::new(&mut unit).get(id).await?;
        Ok(account)
    }

    /// All accounts in key order
    pub async fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        let mut unit = self.unit();
        let accounts = AccountStore::new(&mut unit)
            .list_all()
            .await?
            .collect::<LedgerResult<Vec<_>>>()?;
        Ok(accounts)
    }

    /// Remove the account record. Its transactions stay in the log.
    pub async fn delete_account(&self, id: &str, ctx: &OperationContext) -> LedgerResult<()> {
        let mut unit = self.unit();
        AccountStore::new(&mut unit).delete(id).await?;
        let commit_version = unit.commit().await?;

        tracing::info!(
            account_id = %id,
            tx_id = %ctx.tx_id,
            invoker = ?ctx.invoker,
            commit_version = ?commit_version,
            "Account deleted"
        );

        Ok(())
    }

    pub async fn suspend_account(&self, id: &str, ctx: &OperationContext) -> LedgerResult<Account> {
        self.set_status(id, AccountStatus::Suspended, ctx).await
    }

    pub async fn reactivate_account(
        &self,
        id: &str,
        ctx: &OperationContext,
    ) -> LedgerResult<Account> {
        self.set_status(id, AccountStatus::Active, ctx).await
    }

    pub async fn close_account(&self, id: &str, ctx: &OperationContext) -> LedgerResult<Account> {
        self.set_status(id, AccountStatus::Closed, ctx).await
    }

    async fn set_status(
        &self,
        id: &str,
        next: AccountStatus,
        ctx: &OperationContext,
    ) -> LedgerResult<Account> {
        let mut unit = self.unit();
        let mut accounts = AccountStore::new(&mut unit);

        let mut account = accounts.get(id).await?;
        let previous = account.status();
        account.transition_to(next)?;
        accounts.save(&account)?;

        let commit_version = unit.commit().await?;

        tracing::info!(
            account_id = %id,
            from = %previous,
            to = %next,
            tx_id = %ctx.tx_id,
            invoker = ?ctx.invoker,
            commit_version = ?commit_version,
            "Account status changed"
        );

        Ok(account)
    }

    // =========================================================================
    // Balance operations
    // =========================================================================

    pub async fn deposit(
        &self,
        command: DepositCommand,
        ctx: &OperationContext,
    ) -> LedgerResult<MovementResult> {
        let amount = Amount::new(command.amount)?;
        let reference_number = ctx.reference_or_tx_id(command.reference_number.as_deref());

        let mut unit = self.unit();
        let outcome = TransferEngine::new(&mut unit)
            .deposit(&command.account_id, amount, &reference_number, command.timestamp)
            .await?;
        let commit_version = unit.commit().await?;

        tracing::info!(
            account_id = %command.account_id,
            reference_number = %reference_number,
            amount = amount.minor_units(),
            balance = outcome.account.balance().minor_units(),
            tx_id = %ctx.tx_id,
            commit_version = ?commit_version,
            "Deposit committed"
        );

        Ok(outcome.into())
    }

    pub async fn withdraw(
        &self,
        command: WithdrawCommand,
        ctx: &OperationContext,
    ) -> LedgerResult<MovementResult> {
        let amount = Amount::new(command.amount)?;
        let reference_number = ctx.reference_or_tx_id(command.reference_number.as_deref());

        let mut unit = self.unit();
        let outcome = TransferEngine::new(&mut unit)
            .withdraw(&command.account_id, amount, &reference_number, command.timestamp)
            .await?;
        let commit_version = unit.commit().await?;

        tracing::info!(
            account_id = %command.account_id,
            reference_number = %reference_number,
            amount = amount.minor_units(),
            balance = outcome.account.balance().minor_units(),
            tx_id = %ctx.tx_id,
            commit_version = ?commit_version,
            "Withdrawal committed"
        );

        Ok(outcome.into())
    }

    pub async fn transfer(
        &self,
        command: TransferCommand,
        ctx: &OperationContext,
    ) -> LedgerResult<TransferResult> {
        let amount = Amount::new(command.amount)?;
        let reference_number = ctx.reference_or_tx_id(command.reference_number.as_deref());

        let mut unit = self.unit();
        let outcome = TransferEngine::new(&mut unit)
            .transfer(
                &command.sender_id,
                &command.receiver_id,
                amount,
                &reference_number,
                command.timestamp,
            )
            .await?;
        let commit_version = unit.commit().await?;

        tracing::info!(
            sender_id = %command.sender_id,
            receiver_id = %command.receiver_id,
            reference_number = %reference_number,
            amount = amount.minor_units(),
            tx_id = %ctx.tx_id,
            commit_version = ?commit_version,
            "Transfer committed"
        );

        Ok(outcome.into())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn get_transaction(
        &self,
        account_id: &str,
        reference_number: &str,
    ) -> LedgerResult<Transaction> {
        let mut unit = self.unit();
        let transaction = TransactionLedger::new(&mut unit)
            .get(account_id, reference_number)
            .await?;
        Ok(transaction)
    }

    /// Transactions of an existing account, in reference number order
    pub async fn list_transactions(&self, account_id: &str) -> LedgerResult<Vec<Transaction>> {
        let mut unit = self.unit();
        if !AccountStore::new(&mut unit).exists(account_id).await? {
            return Err(LedgerError::account_not_found(account_id));
        }
        let transactions = TransactionLedger::new(&mut unit)
            .list_for_account(account_id)
            .await?;
        Ok(transactions)
    }

    pub async fn list_all_transactions(&self) -> LedgerResult<Vec<Transaction>> {
        let mut unit = self.unit();
        let transactions = TransactionLedger::new(&mut unit).list_all().await?;
        Ok(transactions)
    }

    /// Both legs of a transfer, joined into one view
    pub async fn get_transfer(
        &self,
        sender_id: &str,
        receiver_id: &str,
        reference_number: &str,
    ) -> LedgerResult<TransferView> {
        KeyCodec::validate_identifier("sender_id", sender_id)?;
        KeyCodec::validate_identifier("receiver_id", receiver_id)?;
        KeyCodec::validate_identifier("reference_number", reference_number)?;

        let not_found = || LedgerError::NotFound {
            kind: RecordKind::Transfer,
            id: format!("{sender_id}->{receiver_id}:{reference_number}"),
        };

        let mut unit = self.unit();
        let mut ledger = TransactionLedger::new(&mut unit);

        let debit = match ledger.get(sender_id, reference_number).await {
            Ok(tx) => tx,
            Err(LedgerError::NotFound { .. }) => return Err(not_found()),
            Err(e) => return Err(e),
        };
        let credit = match ledger.get(receiver_id, reference_number).await {
            Ok(tx) => tx,
            Err(LedgerError::NotFound { .. }) => return Err(not_found()),
            Err(e) => return Err(e),
        };

        TransferView::from_legs(&debit, &credit).ok_or_else(not_found)
    }
}
