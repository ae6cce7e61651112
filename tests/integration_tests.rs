//! Integration tests for interest-ledger

use chrono::{DateTime, Duration};
use interest_ledger::{
    utils::{ManualClock, MemoryStorage},
    AccessControl, AccountId, Balance, Ledger, LedgerConfig, LedgerError, LedgerEventKind,
    LedgerResult, ACCOUNT_ID_LEN, OVERDRAFT_LIMIT,
};

const INITIAL_DEPOSIT: u128 = 1000;
const INTEREST_RATE: u32 = 500;
const ONE_DAY: i64 = 86_400;

fn id(byte: u8) -> AccountId {
    AccountId::new([byte; ACCOUNT_ID_LEN])
}

fn owner() -> AccountId {
    id(0xee)
}

/// A ledger whose owner has already deposited backing funds
async fn deployed() -> (Ledger<MemoryStorage, ManualClock>, ManualClock) {
    let clock = ManualClock::new(DateTime::from_timestamp(1_704_067_200, 0).unwrap());
    let mut ledger = Ledger::with_clock(
        MemoryStorage::new(),
        LedgerConfig::new(owner(), INTEREST_RATE),
        clock.clone(),
    );
    ledger.deposit(&owner(), INITIAL_DEPOSIT).await.unwrap();
    (ledger, clock)
}

#[tokio::test]
async fn test_unknown_account_reads_zero() {
    let (ledger, _clock) = deployed().await;
    assert_eq!(ledger.get_balance(&id(1)).await.unwrap(), 0);
    assert_eq!(ledger.get_total_interest_earned(&id(1)).await.unwrap(), 0);
    assert_eq!(ledger.get_interest_rate(), INTEREST_RATE);
    assert_eq!(ledger.owner(), &owner());
}

#[tokio::test]
async fn test_deposit_scenario() {
    let (mut ledger, _clock) = deployed().await;
    let alice = id(1);

    ledger.deposit(&alice, 100).await.unwrap();

    assert_eq!(ledger.get_balance(&alice).await.unwrap(), 100);
    assert_eq!(ledger.total_held_funds(), INITIAL_DEPOSIT + 100);
    assert_eq!(
        ledger.events().last().unwrap().kind,
        LedgerEventKind::DepositMade {
            account: alice,
            amount: 100
        }
    );

    ledger.deposit(&alice, 1000).await.unwrap();
    assert_eq!(ledger.get_balance(&alice).await.unwrap(), 1100);
}

#[tokio::test]
async fn test_zero_amounts_are_rejected() {
    let (mut ledger, _clock) = deployed().await;
    let alice = id(1);
    let before = ledger.events().len();

    assert_eq!(ledger.deposit(&alice, 0).await, Err(LedgerError::MinimumNotMet));
    assert_eq!(ledger.withdraw(&alice, 0).await, Err(LedgerError::MinimumNotMet));
    assert_eq!(
        ledger.transfer(&alice, &id(2), 0).await,
        Err(LedgerError::MinimumNotMet)
    );
    assert_eq!(ledger.events().len(), before);
    assert_eq!(ledger.total_held_funds(), INITIAL_DEPOSIT);
}

#[tokio::test]
async fn test_withdraw_past_floor_fails() {
    let (mut ledger, _clock) = deployed().await;
    let alice = id(1);

    let err = ledger.withdraw(&alice, 11).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { amount: 11, .. }));
    assert_eq!(ledger.get_balance(&alice).await.unwrap(), 0);
    assert_eq!(ledger.total_held_funds(), INITIAL_DEPOSIT);
}

#[tokio::test]
async fn test_withdraw_exactly_to_floor() {
    let (mut ledger, _clock) = deployed().await;
    let alice = id(1);

    ledger.withdraw(&alice, 10).await.unwrap();
    assert_eq!(ledger.get_balance(&alice).await.unwrap(), -10);
    assert_eq!(ledger.total_held_funds(), INITIAL_DEPOSIT - 10);

    assert!(matches!(
        ledger.withdraw(&alice, 1).await,
        Err(LedgerError::InsufficientFunds { .. })
    ));
    assert_eq!(ledger.get_balance(&alice).await.unwrap(), -10);
}

#[tokio::test]
async fn test_withdraw_into_overdraft() {
    let (mut ledger, _clock) = deployed().await;
    let alice = id(1);

    ledger.deposit(&alice, 10).await.unwrap();
    ledger.withdraw(&alice, 10).await.unwrap();
    assert_eq!(ledger.get_balance(&alice).await.unwrap(), 0);

    ledger.withdraw(&alice, 5).await.unwrap();
    assert_eq!(ledger.get_balance(&alice).await.unwrap(), -5);
    assert_eq!(ledger.total_held_funds(), INITIAL_DEPOSIT - 5);

    ledger.withdraw(&alice, 5).await.unwrap();
    assert_eq!(
        ledger.events().last().unwrap().kind,
        LedgerEventKind::WithdrawMade {
            account: alice,
            amount: 5
        }
    );
}

#[tokio::test]
async fn test_deposit_then_withdraw_restores_balance() {
    let (mut ledger, _clock) = deployed().await;
    let alice = id(1);
    ledger.deposit(&alice, 37).await.unwrap();
    let before = ledger.get_balance(&alice).await.unwrap();

    ledger.deposit(&alice, 250).await.unwrap();
    ledger.withdraw(&alice, 250).await.unwrap();

    assert_eq!(ledger.get_balance(&alice).await.unwrap(), before);
}

#[tokio::test]
async fn test_transfer_past_floor_fails() {
    let (mut ledger, _clock) = deployed().await;
    let (alice, bob) = (id(1), id(2));

    assert!(matches!(
        ledger.transfer(&alice, &bob, 11).await,
        Err(LedgerError::InsufficientFunds { .. })
    ));
    assert_eq!(ledger.get_balance(&alice).await.unwrap(), 0);
    assert_eq!(ledger.get_balance(&bob).await.unwrap(), 0);
}

#[tokio::test]
async fn test_transfer_into_overdraft_keeps_held_funds() {
    let (mut ledger, _clock) = deployed().await;
    let (alice, bob) = (id(1), id(2));

    ledger.transfer(&alice, &bob, 10).await.unwrap();

    assert_eq!(ledger.get_balance(&alice).await.unwrap(), -10);
    assert_eq!(ledger.get_balance(&bob).await.unwrap(), 10);
    assert_eq!(ledger.total_held_funds(), INITIAL_DEPOSIT);
}

#[tokio::test]
async fn test_transfer_scenario() {
    let (mut ledger, _clock) = deployed().await;
    let (alice, bob) = (id(1), id(2));

    ledger.deposit(&alice, 100).await.unwrap();
    ledger.transfer(&alice, &bob, 40).await.unwrap();
    assert_eq!(ledger.get_balance(&alice).await.unwrap(), 60);
    assert_eq!(ledger.get_balance(&bob).await.unwrap(), 40);

    ledger.transfer(&alice, &bob, 65).await.unwrap();
    assert_eq!(ledger.get_balance(&alice).await.unwrap(), -5);
    assert_eq!(ledger.get_balance(&bob).await.unwrap(), 105);
    assert_eq!(ledger.total_held_funds(), INITIAL_DEPOSIT + 100);

    ledger.transfer(&alice, &bob, 5).await.unwrap();
    assert_eq!(
        ledger.events().last().unwrap().kind,
        LedgerEventKind::TransferMade {
            from: alice,
            to: bob,
            amount: 5
        }
    );

    // Held funds and signed credit diverge once an account is overdrawn
    assert_eq!(
        ledger.total_credit().await.unwrap(),
        (INITIAL_DEPOSIT + 100) as Balance
    );
    let report = ledger.validate_integrity().await.unwrap();
    assert!(report.is_valid);
    assert_eq!(report.total_overdraft, 10);
}

#[tokio::test]
async fn test_transfer_conserves_sum_without_elapsed_time() {
    let (mut ledger, _clock) = deployed().await;
    let (alice, bob) = (id(1), id(2));
    ledger.deposit(&alice, 500).await.unwrap();
    ledger.deposit(&bob, 300).await.unwrap();

    for amount in [1, 120, 77, 305] {
        let before = ledger.get_balance(&alice).await.unwrap() + ledger.get_balance(&bob).await.unwrap();
        ledger.transfer(&alice, &bob, amount).await.unwrap();
        let after = ledger.get_balance(&alice).await.unwrap() + ledger.get_balance(&bob).await.unwrap();
        assert_eq!(before, after);
    }
}

#[tokio::test]
async fn test_interest_after_one_day() {
    let (mut ledger, clock) = deployed().await;
    let alice = id(1);
    let deposit: u128 = 1_000_000_000_000_000_000;

    ledger.deposit(&alice, deposit).await.unwrap();
    clock.advance(Duration::seconds(ONE_DAY));

    let expected = deposit * 500 * 86_400 / (10_000 * 31_536_000);
    assert_eq!(ledger.pending_interest(&alice).await.unwrap(), expected);
    // Not realized until the next mutating call
    assert_eq!(ledger.get_total_interest_earned(&alice).await.unwrap(), 0);

    ledger.deposit(&alice, 100).await.unwrap();
    assert_eq!(ledger.get_total_interest_earned(&alice).await.unwrap(), expected);

    let events = ledger.events().all();
    let n = events.len();
    assert_eq!(
        events[n - 2].kind,
        LedgerEventKind::InterestAccrued {
            account: alice,
            amount: expected
        }
    );
    assert_eq!(
        events[n - 1].kind,
        LedgerEventKind::DepositMade {
            account: alice,
            amount: 100
        }
    );
}

#[tokio::test]
async fn test_interest_applies_on_transfers() {
    let (mut ledger, clock) = deployed().await;
    let (alice, bob) = (id(1), id(2));
    let deposit: u128 = 1_000_000_000_000_000_000;

    ledger.deposit(&alice, deposit).await.unwrap();
    clock.advance(Duration::seconds(ONE_DAY));
    ledger.transfer(&alice, &bob, deposit / 2).await.unwrap();
    clock.advance(Duration::seconds(ONE_DAY));

    ledger.accrue_interest(&alice).await.unwrap();
    ledger.accrue_interest(&bob).await.unwrap();

    assert!(ledger.get_total_interest_earned(&alice).await.unwrap() > 0);
    assert!(ledger.get_total_interest_earned(&bob).await.unwrap() > 0);
}

#[tokio::test]
async fn test_no_interest_on_overdraft() {
    let (mut ledger, clock) = deployed().await;
    let alice = id(1);

    ledger.withdraw(&alice, 10).await.unwrap();
    clock.advance(Duration::days(365));

    assert_eq!(ledger.accrue_interest(&alice).await.unwrap(), 0);
    assert_eq!(ledger.get_balance(&alice).await.unwrap(), -10);
    assert_eq!(ledger.get_total_interest_earned(&alice).await.unwrap(), 0);
}

#[tokio::test]
async fn test_owner_updates_rate() {
    let (mut ledger, _clock) = deployed().await;

    ledger.update_interest_rate(&owner(), 1000).unwrap();

    assert_eq!(ledger.get_interest_rate(), 1000);
    assert_eq!(
        ledger.events().last().unwrap().kind,
        LedgerEventKind::InterestRateUpdated { new_rate_bps: 1000 }
    );
    assert_eq!(ledger.config().rate_percent().to_string(), "10.00");
}

#[tokio::test]
async fn test_non_owner_cannot_update_rate() {
    let (mut ledger, _clock) = deployed().await;
    let before = ledger.events().len();

    assert_eq!(
        ledger.update_interest_rate(&id(1), 1000),
        Err(LedgerError::NotOwner { caller: id(1) })
    );
    assert_eq!(ledger.get_interest_rate(), INTEREST_RATE);
    assert_eq!(ledger.events().len(), before);
}

struct Committee(Vec<AccountId>);

impl AccessControl for Committee {
    fn authorize_rate_change(&self, _config: &LedgerConfig, caller: &AccountId) -> LedgerResult<()> {
        if self.0.contains(caller) {
            Ok(())
        } else {
            Err(LedgerError::NotOwner { caller: *caller })
        }
    }
}

#[tokio::test]
async fn test_custom_access_control() {
    let clock = ManualClock::new(DateTime::from_timestamp(0, 0).unwrap());
    let mut ledger = Ledger::with_clock(
        MemoryStorage::new(),
        LedgerConfig::new(owner(), INTEREST_RATE),
        clock,
    )
    .with_access_control(Box::new(Committee(vec![id(1), id(2)])));

    assert!(ledger.update_interest_rate(&id(2), 250).is_ok());
    assert!(ledger.update_interest_rate(&owner(), 300).is_err());
    assert_eq!(ledger.get_interest_rate(), 250);
}

#[tokio::test]
async fn test_floor_and_monotonic_interest_over_mixed_sequence() {
    let (mut ledger, clock) = deployed().await;
    let accounts = [id(1), id(2), id(3)];
    ledger.deposit(&accounts[0], 5_000_000).await.unwrap();
    ledger.deposit(&accounts[1], 2_000_000).await.unwrap();

    let mut last_interest = [0u128; 3];
    for step in 0..40u32 {
        clock.advance(Duration::hours(7 + i64::from(step % 5)));
        let from = accounts[(step % 3) as usize];
        let to = accounts[((step + 1) % 3) as usize];
        let amount = u128::from(step) * 97_531 + 1;

        // Rejections are fine; invariants must hold either way
        let _ = match step % 4 {
            0 => ledger.deposit(&from, amount).await,
            1 => ledger.withdraw(&from, amount).await,
            _ => ledger.transfer(&from, &to, amount).await,
        };

        for (i, account) in accounts.iter().enumerate() {
            let balance = ledger.get_balance(account).await.unwrap();
            assert!(balance >= -(OVERDRAFT_LIMIT as Balance));
            let interest = ledger.get_total_interest_earned(account).await.unwrap();
            assert!(interest >= last_interest[i]);
            last_interest[i] = interest;
        }
    }

    assert!(ledger.validate_integrity().await.unwrap().is_valid);
}

#[tokio::test]
async fn test_event_cursor_polling() {
    let (mut ledger, _clock) = deployed().await;
    let cursor = ledger.events().len() as u64;

    ledger.deposit(&id(1), 5).await.unwrap();
    ledger.transfer(&id(1), &id(2), 3).await.unwrap();

    let fresh = ledger.events().since(cursor);
    assert_eq!(fresh.len(), 2);
    assert_eq!(fresh[0].sequence, cursor);
    assert_eq!(ledger.events().for_account(&id(2)).count(), 1);
}
