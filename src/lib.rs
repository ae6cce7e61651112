//! # Interest Ledger
//!
//! An interest-bearing account ledger: per-account signed balances with a
//! bounded overdraft, simple time-based interest accrual, and an owner-gated
//! interest rate.
//!
//! ## Features
//!
//! - **Bounded overdraft**: balances may go negative down to `-OVERDRAFT_LIMIT`, never below
//! - **Interest accrual**: basis-point annual rate, settled on every mutating operation
//! - **Owner-gated configuration**: rate changes pass through an [`AccessControl`] policy
//! - **Event log**: append-only, ordered record of deposits, withdrawals, transfers and accruals
//! - **Storage abstraction**: accounts live behind the [`LedgerStorage`] trait
//!
//! ## Quick Start
//!
//! ```rust
//! use interest_ledger::utils::MemoryStorage;
//! use interest_ledger::{AccountId, Ledger, LedgerConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), interest_ledger::LedgerError> {
//! let owner = AccountId::new([0; 20]);
//! let alice = AccountId::new([1; 20]);
//! let bob = AccountId::new([2; 20]);
//!
//! let mut ledger = Ledger::new(MemoryStorage::new(), LedgerConfig::new(owner, 500));
//! ledger.deposit(&alice, 100).await?;
//! ledger.transfer(&alice, &bob, 105).await?;
//! assert_eq!(ledger.get_balance(&alice).await?, -5);
//! assert_eq!(ledger.get_balance(&bob).await?, 105);
//! # Ok(())
//! # }
//! ```

pub mod events;
pub mod ledger;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use events::*;
pub use ledger::*;
pub use traits::*;
pub use types::*;
