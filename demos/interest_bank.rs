//! Interest ledger walkthrough on a simulated clock

use chrono::{Duration, Utc};
use interest_ledger::utils::{ManualClock, MemoryStorage};
use interest_ledger::{AccountId, Ledger, LedgerConfig, LedgerError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(false).init();

    println!("🏦 Interest Ledger - Walkthrough\n");

    let owner: AccountId = "0x00000000000000000000000000000000000000ee".parse()?;
    let alice: AccountId = "0x00000000000000000000000000000000000000a1".parse()?;
    let bob: AccountId = "0x00000000000000000000000000000000000000b2".parse()?;

    let config: LedgerConfig = serde_json::from_str(&format!(
        r#"{{"owner": "{}", "interest_rate_bps": 500}}"#,
        owner
    ))?;
    let clock = ManualClock::new(Utc::now());
    let mut ledger = Ledger::with_clock(MemoryStorage::new(), config, clock.clone());
    println!(
        "📊 Rate: {}% per year, owner {}\n",
        ledger.config().rate_percent(),
        ledger.owner()
    );

    // 1. Fund the ledger
    println!("💰 Deposits...");
    ledger.deposit(&owner, 1_000).await?;
    ledger.deposit(&alice, 1_000_000_000_000_000_000).await?;
    println!("  ✓ Alice balance: {}", ledger.get_balance(&alice).await?);

    // 2. A day passes
    clock.advance(Duration::days(1));
    println!(
        "\n⏳ One day later, pending interest for Alice: {}",
        ledger.pending_interest(&alice).await?
    );

    // 3. Transfers settle interest first
    ledger.transfer(&alice, &bob, 500_000_000_000_000_000).await?;
    println!(
        "  ✓ Transfer done. Alice: {}, Bob: {}, Alice interest so far: {}",
        ledger.get_balance(&alice).await?,
        ledger.get_balance(&bob).await?,
        ledger.get_total_interest_earned(&alice).await?
    );

    // 4. Overdraft floor
    println!("\n🚫 Overdraft floor...");
    let carol: AccountId = "0x00000000000000000000000000000000000000c3".parse()?;
    ledger.withdraw(&carol, 10).await?;
    match ledger.withdraw(&carol, 1).await {
        Err(LedgerError::InsufficientFunds { balance, .. }) => {
            println!("  ✓ Rejected at balance {}", balance)
        }
        other => println!("  ✗ Unexpected: {:?}", other),
    }

    // 5. Rate governance
    println!("\n⚙️  Rate changes...");
    if let Err(e) = ledger.update_interest_rate(&alice, 2_000) {
        println!("  ✓ {}", e);
    }
    ledger.update_interest_rate(&owner, 1_000)?;
    println!("  ✓ New rate: {} bps", ledger.get_interest_rate());

    let projected = ledger.projected_interest(&bob, Duration::days(30)).await?;
    println!("  Bob's projected interest over 30 days: {}", projected);

    // 6. Integrity and events
    let report = ledger.validate_integrity().await?;
    println!("\n🔍 Integrity");
    println!("  Valid:          {}", report.is_valid);
    println!("  Accounts:       {}", report.account_count);
    println!("  Held funds:     {}", report.total_held_funds);
    println!("  Ledger credit:  {}", report.total_credit);
    println!("  Overdraft:      {}", report.total_overdraft);

    println!("\n📜 Events");
    for event in ledger.events().all() {
        println!("  #{} {:?}", event.sequence, event.kind);
    }

    Ok(())
}
