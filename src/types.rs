//! Core types and data structures for the interest ledger

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unsigned quantity in the smallest currency unit
pub type Amount = u128;

/// Signed account balance in the smallest currency unit
pub type Balance = i128;

/// Most negative balance an account may reach, as a positive magnitude
pub const OVERDRAFT_LIMIT: Amount = 10;

/// Length of the accrual year (365 days)
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Basis points in 100%
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Length of an account identifier in bytes
pub const ACCOUNT_ID_LEN: usize = 20;

/// Opaque, address-like account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId([u8; ACCOUNT_ID_LEN]);

impl AccountId {
    /// Create an identifier from raw bytes
    pub const fn new(bytes: [u8; ACCOUNT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw identifier bytes
    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for AccountId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| LedgerError::InvalidAccountId(format!("{}: {}", s, e)))?;
        let bytes: [u8; ACCOUNT_ID_LEN] = bytes.try_into().map_err(|_| {
            LedgerError::InvalidAccountId(format!(
                "{}: expected {} bytes",
                s, ACCOUNT_ID_LEN
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for AccountId {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.to_string()
    }
}

impl From<[u8; ACCOUNT_ID_LEN]> for AccountId {
    fn from(bytes: [u8; ACCOUNT_ID_LEN]) -> Self {
        Self(bytes)
    }
}

/// Per-account ledger record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account identifier
    pub id: AccountId,
    /// Signed balance, never below `-OVERDRAFT_LIMIT` once an operation completes
    pub balance: Balance,
    /// Accrual checkpoint: interest up to this moment is already in `balance`
    pub last_accrual_time: DateTime<Utc>,
    /// Lifetime interest credited to this account
    pub accrued_interest_total: Amount,
}

impl Account {
    /// Create a zero-initialized account checkpointed at `checkpoint`
    pub fn new(id: AccountId, checkpoint: DateTime<Utc>) -> Self {
        Self {
            id,
            balance: 0,
            last_accrual_time: checkpoint,
            accrued_interest_total: 0,
        }
    }

    /// Increase the balance by `amount`
    pub fn credit(&mut self, amount: Amount) -> LedgerResult<()> {
        let amount = crate::utils::to_balance(amount)?;
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    /// Decrease the balance by `amount`; the floor is checked by the caller
    pub fn debit(&mut self, amount: Amount) -> LedgerResult<()> {
        let amount = crate::utils::to_balance(amount)?;
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    /// Fold settled interest into the balance and advance the checkpoint
    pub fn apply_interest(&mut self, interest: Amount, at: DateTime<Utc>) -> LedgerResult<()> {
        let accrued_interest_total = self
            .accrued_interest_total
            .checked_add(interest)
            .ok_or(LedgerError::Overflow)?;
        self.credit(interest)?;
        self.accrued_interest_total = accrued_interest_total;
        self.last_accrual_time = at;
        Ok(())
    }

    /// Whether the account is currently in overdraft
    pub fn is_overdrawn(&self) -> bool {
        self.balance < 0
    }
}

/// Global ledger configuration: who may change the rate, and the rate itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Identifier authorized to change the interest rate
    pub owner: AccountId,
    /// Annualized simple interest rate in basis points (500 = 5%/year)
    pub interest_rate_bps: u32,
}

impl LedgerConfig {
    /// Create a configuration owned by `owner`
    pub fn new(owner: AccountId, interest_rate_bps: u32) -> Self {
        Self {
            owner,
            interest_rate_bps,
        }
    }

    /// The interest rate as a percentage (500 bps -> 5.00)
    pub fn rate_percent(&self) -> BigDecimal {
        BigDecimal::new(self.interest_rate_bps.into(), 2)
    }
}

/// Errors that can occur in the ledger system
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Amount must be greater than zero")]
    MinimumNotMet,
    #[error("Insufficient funds in {account}: balance {balance}, requested {amount}")]
    InsufficientFunds {
        account: AccountId,
        balance: Balance,
        amount: Amount,
    },
    #[error("Insufficient reserves: holding {held}, requested {amount}")]
    InsufficientReserves { held: Amount, amount: Amount },
    #[error("Caller {caller} is not the ledger owner")]
    NotOwner { caller: AccountId },
    #[error("Clock regression: checkpoint {last_accrual} is after {now}")]
    InvalidTimestamp {
        last_accrual: DateTime<Utc>,
        now: DateTime<Utc>,
    },
    #[error("Arithmetic overflow")]
    Overflow,
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Invalid account id: {0}")]
    InvalidAccountId(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
