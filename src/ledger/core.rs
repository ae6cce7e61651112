//! Main ledger orchestrator that coordinates accounts, interest and events

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::events::{EventLog, LedgerEventKind};
use crate::ledger::{AccountManager, InterestAccrualEngine, OwnerOnly};
use crate::traits::*;
use crate::types::*;
use crate::utils::{
    overdraft_floor, validate_account_state, validate_overdraft_floor, validate_positive_amount,
    SystemClock,
};

/// Main ledger system that orchestrates all accounting operations
///
/// Every mutating operation runs the same pipeline on owned copies of the
/// affected accounts: settle pending interest, apply the principal change,
/// validate, commit the accounts in one storage batch, and only then update
/// in-memory counters and append events. A rejected operation therefore
/// leaves storage, counters and the event log untouched. Mutations take
/// `&mut self`, so one ledger value admits a single writer at a time.
pub struct Ledger<S: LedgerStorage, C: TimeSource = SystemClock> {
    account_manager: AccountManager<S>,
    interest_engine: InterestAccrualEngine,
    access_control: Box<dyn AccessControl>,
    clock: C,
    config: LedgerConfig,
    total_held_funds: Amount,
    events: EventLog,
}

/// Accounts and events staged by an operation before commit
struct PendingChanges {
    accounts: Vec<Account>,
    events: Vec<LedgerEventKind>,
}

impl PendingChanges {
    fn new() -> Self {
        Self {
            accounts: Vec::new(),
            events: Vec::new(),
        }
    }
}

impl<S: LedgerStorage> Ledger<S, SystemClock> {
    /// Create a new ledger on the wall clock
    pub fn new(storage: S, config: LedgerConfig) -> Self {
        Self::with_clock(storage, config, SystemClock)
    }
}

impl<S: LedgerStorage, C: TimeSource> Ledger<S, C> {
    /// Create a new ledger with an explicit time source
    ///
    /// The clock is read once here; that instant is the default accrual
    /// checkpoint for every account touched for the first time.
    pub fn with_clock(storage: S, config: LedgerConfig, clock: C) -> Self {
        let genesis = truncate_to_second(clock.now());
        tracing::info!(
            owner = %config.owner,
            interest_rate_bps = config.interest_rate_bps,
            %genesis,
            "Ledger created"
        );
        Self {
            account_manager: AccountManager::new(storage, genesis),
            interest_engine: InterestAccrualEngine::new(),
            access_control: Box::new(OwnerOnly),
            clock,
            config,
            total_held_funds: 0,
            events: EventLog::new(),
        }
    }

    /// Replace the rate-change authorization policy
    pub fn with_access_control(mut self, access_control: Box<dyn AccessControl>) -> Self {
        self.access_control = access_control;
        self
    }

    // Mutating operations

    /// Credit `amount` of new backing funds to `caller`
    pub async fn deposit(&mut self, caller: &AccountId, amount: Amount) -> LedgerResult<()> {
        let now = self.now();
        let result = self.stage_deposit(caller, amount, now).await;
        let (changes, total_held_funds) = self.reject_on_error("deposit", caller, amount, result)?;
        self.commit(changes, total_held_funds, now).await?;
        tracing::info!(account = %caller, amount, "Deposit made");
        Ok(())
    }

    /// Release `amount` of backing funds to `caller`, possibly into overdraft
    pub async fn withdraw(&mut self, caller: &AccountId, amount: Amount) -> LedgerResult<()> {
        let now = self.now();
        let result = self.stage_withdraw(caller, amount, now).await;
        let (changes, total_held_funds) =
            self.reject_on_error("withdraw", caller, amount, result)?;
        self.commit(changes, total_held_funds, now).await?;
        tracing::info!(account = %caller, amount, "Withdrawal made");
        Ok(())
    }

    /// Move `amount` of ledger credit from `caller` to `to`
    pub async fn transfer(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> LedgerResult<()> {
        let now = self.now();
        let result = self.stage_transfer(caller, to, amount, now).await;
        let (changes, total_held_funds) =
            self.reject_on_error("transfer", caller, amount, result)?;
        self.commit(changes, total_held_funds, now).await?;
        tracing::info!(from = %caller, to = %to, amount, "Transfer made");
        Ok(())
    }

    /// Replace the interest rate; only future accrual uses the new rate
    pub fn update_interest_rate(
        &mut self,
        caller: &AccountId,
        new_rate_bps: u32,
    ) -> LedgerResult<()> {
        if let Err(e) = self
            .access_control
            .authorize_rate_change(&self.config, caller)
        {
            tracing::warn!(caller = %caller, new_rate_bps, error = %e, "Rate update rejected");
            return Err(e);
        }

        let now = self.now();
        let previous = self.config.interest_rate_bps;
        self.config.interest_rate_bps = new_rate_bps;
        self.events
            .append_all([LedgerEventKind::InterestRateUpdated { new_rate_bps }], now);
        tracing::info!(previous, new_rate_bps, "Interest rate updated");
        Ok(())
    }

    /// Settle pending interest for `account` without touching its principal
    ///
    /// Returns the interest realized by this call.
    pub async fn accrue_interest(&mut self, account_id: &AccountId) -> LedgerResult<Amount> {
        let now = self.now();
        let mut changes = PendingChanges::new();
        let mut account = self.account_manager.get_or_default(account_id).await?;
        let interest = self.settle(&mut account, now, &mut changes.events)?;
        changes.accounts.push(account);
        let total_held_funds = self.total_held_funds;
        self.commit(changes, total_held_funds, now).await?;
        Ok(interest)
    }

    // Read operations

    /// Balance as of the last settlement; pending interest is not included
    pub async fn get_balance(&self, account_id: &AccountId) -> LedgerResult<Balance> {
        Ok(self.account_manager.get_or_default(account_id).await?.balance)
    }

    /// Lifetime interest credited as of the last settlement
    pub async fn get_total_interest_earned(&self, account_id: &AccountId) -> LedgerResult<Amount> {
        Ok(self
            .account_manager
            .get_or_default(account_id)
            .await?
            .accrued_interest_total)
    }

    /// Current rate in basis points
    pub fn get_interest_rate(&self) -> u32 {
        self.config.interest_rate_bps
    }

    /// Interest that the next settlement of `account` would realize right now
    pub async fn pending_interest(&self, account_id: &AccountId) -> LedgerResult<Amount> {
        let account = self.account_manager.get_or_default(account_id).await?;
        self.interest_engine
            .accrue(&account, self.config.interest_rate_bps, self.now())
    }

    /// Estimate of interest the settled balance would earn over `horizon`
    /// at the current rate
    pub async fn projected_interest(
        &self,
        account_id: &AccountId,
        horizon: Duration,
    ) -> LedgerResult<Amount> {
        let account = self.account_manager.get_or_default(account_id).await?;
        self.interest_engine
            .project(account.balance, self.config.interest_rate_bps, horizon)
    }

    /// Full account record, zero-initialized for unknown ids
    pub async fn get_account(&self, account_id: &AccountId) -> LedgerResult<Account> {
        self.account_manager.get_or_default(account_id).await
    }

    /// Every account that has been touched by a committed operation
    pub async fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.account_manager.list_accounts().await
    }

    /// Identifier authorized to change the rate
    pub fn owner(&self) -> &AccountId {
        &self.config.owner
    }

    /// Current global configuration
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Real backing funds held by the ledger
    pub fn total_held_funds(&self) -> Amount {
        self.total_held_funds
    }

    /// Sum of all signed balances; differs from held funds by overdrafts
    /// and settled interest
    pub async fn total_credit(&self) -> LedgerResult<Balance> {
        self.account_manager
            .list_accounts()
            .await?
            .iter()
            .try_fold(0 as Balance, |sum, account| sum.checked_add(account.balance))
            .ok_or(LedgerError::Overflow)
    }

    /// Event log
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Check the account invariants across the whole ledger
    pub async fn validate_integrity(&self) -> LedgerResult<LedgerIntegrityReport> {
        let checked_at = self.now();
        let accounts = self.account_manager.list_accounts().await?;
        let mut issues = Vec::new();
        let mut total_credit: Balance = 0;
        let mut total_overdraft: Amount = 0;

        for account in &accounts {
            if validate_account_state(account).is_err() {
                issues.push(format!(
                    "Account {} is below the overdraft floor: balance = {}, floor = {}",
                    account.id,
                    account.balance,
                    overdraft_floor()
                ));
            }
            if account.last_accrual_time > checked_at {
                issues.push(format!(
                    "Account {} has a checkpoint in the future: {} > {}",
                    account.id, account.last_accrual_time, checked_at
                ));
            }
            total_credit = total_credit
                .checked_add(account.balance)
                .ok_or(LedgerError::Overflow)?;
            if account.balance < 0 {
                total_overdraft = total_overdraft.saturating_add(account.balance.unsigned_abs());
            }
        }

        Ok(LedgerIntegrityReport {
            checked_at,
            is_valid: issues.is_empty(),
            issues,
            account_count: accounts.len(),
            total_credit,
            total_held_funds: self.total_held_funds,
            total_overdraft,
        })
    }

    // Staging

    async fn stage_deposit(
        &self,
        caller: &AccountId,
        amount: Amount,
        now: DateTime<Utc>,
    ) -> LedgerResult<(PendingChanges, Amount)> {
        validate_positive_amount(amount)?;
        let mut changes = PendingChanges::new();
        let mut account = self.account_manager.get_or_default(caller).await?;

        self.settle(&mut account, now, &mut changes.events)?;
        account.credit(amount)?;
        let total_held_funds = self
            .total_held_funds
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        validate_account_state(&account)?;

        changes.accounts.push(account);
        changes.events.push(LedgerEventKind::DepositMade {
            account: *caller,
            amount,
        });
        Ok((changes, total_held_funds))
    }

    async fn stage_withdraw(
        &self,
        caller: &AccountId,
        amount: Amount,
        now: DateTime<Utc>,
    ) -> LedgerResult<(PendingChanges, Amount)> {
        validate_positive_amount(amount)?;
        let mut changes = PendingChanges::new();
        let mut account = self.account_manager.get_or_default(caller).await?;

        self.settle(&mut account, now, &mut changes.events)?;
        validate_overdraft_floor(&account, amount)?;
        let total_held_funds = self.total_held_funds.checked_sub(amount).ok_or(
            LedgerError::InsufficientReserves {
                held: self.total_held_funds,
                amount,
            },
        )?;
        account.debit(amount)?;
        validate_account_state(&account)?;

        changes.accounts.push(account);
        changes.events.push(LedgerEventKind::WithdrawMade {
            account: *caller,
            amount,
        });
        Ok((changes, total_held_funds))
    }

    async fn stage_transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
        now: DateTime<Utc>,
    ) -> LedgerResult<(PendingChanges, Amount)> {
        validate_positive_amount(amount)?;
        let mut changes = PendingChanges::new();

        let mut sender = self.account_manager.get_or_default(from).await?;
        self.settle(&mut sender, now, &mut changes.events)?;
        validate_overdraft_floor(&sender, amount)?;

        if from == to {
            // Debit and credit cancel out; only the floor check applies
            changes.accounts.push(sender);
        } else {
            let mut recipient = self.account_manager.get_or_default(to).await?;
            self.settle(&mut recipient, now, &mut changes.events)?;
            sender.debit(amount)?;
            recipient.credit(amount)?;
            validate_account_state(&sender)?;
            validate_account_state(&recipient)?;
            changes.accounts.push(sender);
            changes.accounts.push(recipient);
        }

        changes.events.push(LedgerEventKind::TransferMade {
            from: *from,
            to: *to,
            amount,
        });
        Ok((changes, self.total_held_funds))
    }

    /// Fold pending interest into a staged account and advance its checkpoint
    fn settle(
        &self,
        account: &mut Account,
        now: DateTime<Utc>,
        events: &mut Vec<LedgerEventKind>,
    ) -> LedgerResult<Amount> {
        let interest = self
            .interest_engine
            .accrue(account, self.config.interest_rate_bps, now)?;
        account.apply_interest(interest, now)?;

        if interest > 0 {
            tracing::debug!(account = %account.id, interest, "Interest settled");
            events.push(LedgerEventKind::InterestAccrued {
                account: account.id,
                amount: interest,
            });
        }
        Ok(interest)
    }

    async fn commit(
        &mut self,
        changes: PendingChanges,
        total_held_funds: Amount,
        now: DateTime<Utc>,
    ) -> LedgerResult<()> {
        self.account_manager.commit(&changes.accounts).await?;
        self.total_held_funds = total_held_funds;
        self.events.append_all(changes.events, now);
        Ok(())
    }

    fn reject_on_error<T>(
        &self,
        operation: &'static str,
        caller: &AccountId,
        amount: Amount,
        result: LedgerResult<T>,
    ) -> LedgerResult<T> {
        if let Err(ref e) = result {
            tracing::warn!(operation, account = %caller, amount, error = %e, "Operation rejected");
        }
        result
    }

    /// One clock snapshot per operation, at whole-second resolution
    fn now(&self) -> DateTime<Utc> {
        truncate_to_second(self.clock.now())
    }
}

fn truncate_to_second(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.with_nanosecond(0).unwrap_or(instant)
}

/// Report on ledger integrity and validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerIntegrityReport {
    pub checked_at: DateTime<Utc>,
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub account_count: usize,
    pub total_credit: Balance,
    pub total_held_funds: Amount,
    pub total_overdraft: Amount,
}
