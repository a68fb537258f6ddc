//! Account Store
//!
//! CRUD over Account records through the current unit of work.

use crate::domain::{Account, LedgerError, LedgerResult};
use crate::state::{KeyCodec, StateStore, UnitOfWork};

/// Account persistence bound to one unit of work
pub struct AccountStore<'u, 'a, S: StateStore + ?Sized> {
    unit: &'u mut UnitOfWork<'a, S>,
}

impl<'u, 'a, S: StateStore + ?Sized> AccountStore<'u, 'a, S> {
    pub fn new(unit: &'u mut UnitOfWork<'a, S>) -> Self {
        Self { unit }
    }

    /// Persist a new account; fails if the id is already present
    pub async fn create(&mut self, account: Account) -> LedgerResult<Account> {
        KeyCodec::validate_identifier("account_id", account.id())?;

        if self.exists(account.id()).await? {
            return Err(LedgerError::AlreadyExists(account.id().to_string()));
        }

        self.save(&account)?;
        Ok(account)
    }

    /// Load an account; `NotFound` if absent
    pub async fn get(&mut self, id: &str) -> LedgerResult<Account> {
        self.find(id)
            .await?
            .ok_or_else(|| LedgerError::account_not_found(id))
    }

    /// Load an account if present
    pub async fn find(&mut self, id: &str) -> LedgerResult<Option<Account>> {
        KeyCodec::validate_identifier("account_id", id)?;

        let bytes = self.unit.get(&KeyCodec::account(id)).await?;
        let account = bytes
            .map(|b| serde_json::from_slice::<Account>(&b))
            .transpose()?;

        tracing::debug!(account_id = %id, found = account.is_some(), "Account read");
        Ok(account)
    }

    /// Whether an account record exists.
    ///
    /// Store failures come back as `Err`, never as `false`.
    pub async fn exists(&mut self, id: &str) -> LedgerResult<bool> {
        KeyCodec::validate_identifier("account_id", id)?;
        Ok(self.unit.get(&KeyCodec::account(id)).await?.is_some())
    }

    /// Overwrite an account.
    ///
    /// The caller must have loaded the previous version through this same
    /// unit of work so the key sits in its read set.
    pub fn save(&mut self, account: &Account) -> LedgerResult<()> {
        let bytes = serde_json::to_vec(account)?;
        self.unit.put(KeyCodec::account(account.id()), bytes);
        Ok(())
    }

    /// Remove an account record; `NotFound` if absent
    pub async fn delete(&mut self, id: &str) -> LedgerResult<()> {
        if !self.exists(id).await? {
            return Err(LedgerError::account_not_found(id));
        }
        self.unit.delete(KeyCodec::account(id));
        Ok(())
    }

    /// Every account, in key order.
    ///
    /// The range is scanned in full up front; only decoding is deferred to
    /// the iterator, so a corrupt record surfaces when it is reached.
    pub async fn list_all(&mut self) -> LedgerResult<impl Iterator<Item = LedgerResult<Account>>> {
        let (start, end) = KeyCodec::all_accounts();
        let entries = self.unit.range_scan(&start, &end).await?;

        Ok(entries.into_iter().map(|(_, bytes)| {
            serde_json::from_slice::<Account>(&bytes).map_err(LedgerError::from)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountAttributes, AccountStatus, Balance};
    use crate::state::MemoryStore;
    use chrono::Utc;

    fn account(id: &str) -> Account {
        Account::open(id, AccountAttributes::new(), Balance::zero(), Utc::now())
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryStore::new();
        let mut unit = UnitOfWork::new(&store);

        AccountStore::new(&mut unit).create(account("A")).await.unwrap();
        unit.commit().await.unwrap();

        let mut unit = UnitOfWork::new(&store);
        let loaded = AccountStore::new(&mut unit).get("A").await.unwrap();
        assert_eq!(loaded.id(), "A");
        assert_eq!(loaded.status(), AccountStatus::Active);
    }

    #[tokio::test]
    async fn test_create_twice_fails() {
        let store = MemoryStore::new();
        let mut unit = UnitOfWork::new(&store);
        let mut accounts = AccountStore::new(&mut unit);

        accounts.create(account("A")).await.unwrap();
        let result = accounts.create(account("A")).await;

        assert!(matches!(result, Err(LedgerError::AlreadyExists(id)) if id == "A"));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryStore::new();
        let mut unit = UnitOfWork::new(&store);

        let result = AccountStore::new(&mut unit).get("ghost").await;
        assert!(matches!(result, Err(LedgerError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let mut unit = UnitOfWork::new(&store);
        let mut accounts = AccountStore::new(&mut unit);

        accounts.create(account("A")).await.unwrap();
        accounts.delete("A").await.unwrap();

        assert!(!accounts.exists("A").await.unwrap());
        assert!(matches!(
            accounts.delete("A").await,
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_all_in_key_order() {
        let store = MemoryStore::new();
        let mut unit = UnitOfWork::new(&store);
        let mut accounts = AccountStore::new(&mut unit);
        for id in ["carol", "alice", "bob"] {
            accounts.create(account(id)).await.unwrap();
        }
        unit.commit().await.unwrap();

        let mut unit = UnitOfWork::new(&store);
        let ids: Vec<String> = AccountStore::new(&mut unit)
            .list_all()
            .await
            .unwrap()
            .map(|a| a.unwrap().id().to_string())
            .collect();

        assert_eq!(ids, vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_serialization_error() {
        let store = MemoryStore::new();
        store.seed(KeyCodec::account("A"), b"not json".to_vec()).await;

        let mut unit = UnitOfWork::new(&store);
        let result = AccountStore::new(&mut unit).get("A").await;
        assert!(matches!(result, Err(LedgerError::Serialization(_))));
    }
}
