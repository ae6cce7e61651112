//! Validation utilities

use crate::types::*;

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: Amount) -> LedgerResult<()> {
    if amount == 0 {
        Err(LedgerError::MinimumNotMet)
    } else {
        Ok(())
    }
}

/// Convert an unsigned amount into a signed balance delta
pub fn to_balance(amount: Amount) -> LedgerResult<Balance> {
    Balance::try_from(amount).map_err(|_| LedgerError::Overflow)
}

/// The overdraft floor as a signed balance
pub fn overdraft_floor() -> Balance {
    -(OVERDRAFT_LIMIT as Balance)
}

/// Validate that taking `amount` out of `account` keeps it at or above the floor
pub fn validate_overdraft_floor(account: &Account, amount: Amount) -> LedgerResult<()> {
    let insufficient = || LedgerError::InsufficientFunds {
        account: account.id,
        balance: account.balance,
        amount,
    };

    let delta = to_balance(amount).map_err(|_| insufficient())?;
    match account.balance.checked_sub(delta) {
        Some(after) if after >= overdraft_floor() => Ok(()),
        _ => Err(insufficient()),
    }
}

/// Validate that an account satisfies the floor as it stands
pub fn validate_account_state(account: &Account) -> LedgerResult<()> {
    validate_overdraft_floor(account, 0)
}
