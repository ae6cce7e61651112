//! Account store: lazy creation and batched persistence

use chrono::{DateTime, Utc};

use crate::traits::*;
use crate::types::*;

/// Account manager wrapping the storage backend
///
/// Accounts are never created explicitly. [`AccountManager::get_or_default`] is
/// the single creation path: an unknown id yields a zero-initialized record
/// checkpointed at the ledger's creation time, which becomes persistent the
/// first time a mutating operation commits it.
pub struct AccountManager<S: LedgerStorage> {
    storage: S,
    genesis: DateTime<Utc>,
}

impl<S: LedgerStorage> AccountManager<S> {
    /// Create a new account manager
    pub fn new(storage: S, genesis: DateTime<Utc>) -> Self {
        Self { storage, genesis }
    }

    /// Get an account by ID, or a zero-initialized one if it was never stored
    pub async fn get_or_default(&self, account_id: &AccountId) -> LedgerResult<Account> {
        Ok(self
            .storage
            .get_account(account_id)
            .await?
            .unwrap_or_else(|| Account::new(*account_id, self.genesis)))
    }

    /// List all stored accounts
    pub async fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.storage.list_accounts().await
    }

    /// Persist the accounts touched by one operation
    pub async fn commit(&mut self, accounts: &[Account]) -> LedgerResult<()> {
        self.storage.save_accounts(accounts).await
    }
}
