//! Interest accrual
//!
//! Simple (non-compounding within a period) interest on the positive part of
//! a balance:
//!
//! ```text
//! interest = max(balance, 0) * rate_bps * elapsed_seconds / (10_000 * SECONDS_PER_YEAR)
//! ```
//!
//! Division truncates toward zero. Overdraft debt is never charged interest.
//! Compounding happens only through settlement: once interest is folded into
//! the balance at a checkpoint, later periods accrue on the larger balance.

use chrono::{DateTime, Duration, Utc};

use crate::types::*;

/// Stateless interest calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct InterestAccrualEngine;

impl InterestAccrualEngine {
    /// Create a new engine
    pub fn new() -> Self {
        Self
    }

    /// Interest owed to `account` since its checkpoint, as of `now`
    ///
    /// Pure: the caller applies the delta and advances the checkpoint.
    pub fn accrue(
        &self,
        account: &Account,
        rate_bps: u32,
        now: DateTime<Utc>,
    ) -> LedgerResult<Amount> {
        if now < account.last_accrual_time {
            return Err(LedgerError::InvalidTimestamp {
                last_accrual: account.last_accrual_time,
                now,
            });
        }
        let elapsed = now
            .signed_duration_since(account.last_accrual_time)
            .num_seconds();
        // Non-negative after the regression check above
        self.interest_for(account.balance, rate_bps, elapsed.unsigned_abs())
    }

    /// Interest a balance would earn over a future `horizon` at `rate_bps`
    pub fn project(&self, balance: Balance, rate_bps: u32, horizon: Duration) -> LedgerResult<Amount> {
        let seconds = horizon.num_seconds().max(0).unsigned_abs();
        self.interest_for(balance, rate_bps, seconds)
    }

    /// Interest `balance` earns over one full year at `rate_bps`
    pub fn annual_interest(&self, balance: Balance, rate_bps: u32) -> LedgerResult<Amount> {
        self.interest_for(balance, rate_bps, SECONDS_PER_YEAR)
    }

    /// The core formula over an explicit number of elapsed seconds
    pub fn interest_for(
        &self,
        balance: Balance,
        rate_bps: u32,
        elapsed_seconds: u64,
    ) -> LedgerResult<Amount> {
        if balance <= 0 || elapsed_seconds == 0 || rate_bps == 0 {
            return Ok(0);
        }

        // rate * seconds < 2^96, so only the product with the principal can overflow
        let factor = Amount::from(rate_bps) * Amount::from(elapsed_seconds);
        mul_div_floor(balance.unsigned_abs(), factor, ACCRUAL_DENOMINATOR)
    }
}

const ACCRUAL_DENOMINATOR: Amount = BPS_DENOMINATOR as Amount * SECONDS_PER_YEAR as Amount;

/// Exact `floor(a * b / d)` without forming `a * b`
///
/// With `a = qa*d + ra` and `b = qb*d + rb`:
/// `a*b/d = qa*b + ra*qb + ra*rb/d`. Every term is at most the true result,
/// and `ra*rb < d^2` fits for `d < 2^64`, so `Overflow` means the result
/// itself does not fit.
fn mul_div_floor(a: Amount, b: Amount, d: Amount) -> LedgerResult<Amount> {
    let (qa, ra) = (a / d, a % d);
    let (qb, rb) = (b / d, b % d);

    qa.checked_mul(b)
        .and_then(|sum| sum.checked_add(ra.checked_mul(qb)?))
        .and_then(|sum| sum.checked_add(ra * rb / d))
        .ok_or(LedgerError::Overflow)
}
