//! Ledger module containing the account store, interest accrual, access
//! control and the operation orchestrator

pub mod access;
pub mod account;
pub mod core;
pub mod interest;

pub use access::*;
pub use account::*;
pub use core::*;
pub use interest::*;
