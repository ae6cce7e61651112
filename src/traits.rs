//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::*;

/// Storage abstraction for ledger accounts
///
/// This trait lets the ledger run against any state store. The ledger only
/// ever writes through `save_accounts`, so an implementation must apply each
/// batch atomically: either every record in it becomes visible or none does.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Get an account by ID
    async fn get_account(&self, account_id: &AccountId) -> LedgerResult<Option<Account>>;

    /// List all stored accounts
    async fn list_accounts(&self) -> LedgerResult<Vec<Account>>;

    /// Insert or replace a batch of accounts as one atomic write
    async fn save_accounts(&mut self, accounts: &[Account]) -> LedgerResult<()>;
}

/// Source of the current time
pub trait TimeSource: Send + Sync {
    /// Current timestamp
    fn now(&self) -> DateTime<Utc>;
}

/// Authorization policy for global configuration changes
pub trait AccessControl: Send + Sync {
    /// Check that `caller` may replace the interest rate
    fn authorize_rate_change(&self, config: &LedgerConfig, caller: &AccountId)
        -> LedgerResult<()>;
}
