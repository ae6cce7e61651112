//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;

/// In-memory storage implementation for testing and development
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    accounts: Arc<RwLock<HashMap<AccountId, Account>>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.accounts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    /// Number of stored accounts
    pub fn len(&self) -> usize {
        self.accounts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Whether no account has been stored yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> LedgerError {
    LedgerError::Storage("account map lock poisoned".to_string())
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn get_account(&self, account_id: &AccountId) -> LedgerResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .map_err(poisoned)?
            .get(account_id)
            .cloned())
    }

    async fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        let accounts = self.accounts.read().map_err(poisoned)?;
        let mut listed: Vec<Account> = accounts.values().cloned().collect();
        listed.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(listed)
    }

    async fn save_accounts(&mut self, accounts: &[Account]) -> LedgerResult<()> {
        // Single write guard for the whole batch
        let mut stored = self.accounts.write().map_err(poisoned)?;
        for account in accounts {
            stored.insert(account.id, account.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn account(byte: u8, balance: Balance) -> Account {
        let mut account = Account::new(
            AccountId::new([byte; ACCOUNT_ID_LEN]),
            DateTime::from_timestamp(0, 0).unwrap(),
        );
        account.balance = balance;
        account
    }

    #[tokio::test]
    async fn test_save_and_get_batch() {
        let mut storage = MemoryStorage::new();
        assert!(storage.is_empty());

        storage
            .save_accounts(&[account(1, 10), account(2, -5)])
            .await
            .unwrap();

        assert_eq!(storage.len(), 2);
        let stored = storage
            .get_account(&AccountId::new([2; ACCOUNT_ID_LEN]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.balance, -5);
        assert!(storage
            .get_account(&AccountId::new([3; ACCOUNT_ID_LEN]))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let mut storage = MemoryStorage::new();
        let observer = storage.clone();

        storage.save_accounts(&[account(1, 42)]).await.unwrap();
        storage.save_accounts(&[account(1, 43)]).await.unwrap();

        let listed = observer.list_accounts().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].balance, 43);

        observer.clear();
        assert!(storage.is_empty());
    }
}
