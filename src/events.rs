//! Append-only log of observable ledger events
//!
//! Every committed operation appends its events here in emission order.
//! External consumers poll with [`EventLog::since`] using the sequence number
//! of the last event they processed as a cursor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::*;

/// What happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEventKind {
    DepositMade {
        account: AccountId,
        amount: Amount,
    },
    WithdrawMade {
        account: AccountId,
        amount: Amount,
    },
    TransferMade {
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },
    InterestRateUpdated {
        new_rate_bps: u32,
    },
    InterestAccrued {
        account: AccountId,
        amount: Amount,
    },
}

impl LedgerEventKind {
    /// Whether the event involves `account`
    pub fn involves(&self, account: &AccountId) -> bool {
        match self {
            LedgerEventKind::DepositMade { account: a, .. }
            | LedgerEventKind::WithdrawMade { account: a, .. }
            | LedgerEventKind::InterestAccrued { account: a, .. } => a == account,
            LedgerEventKind::TransferMade { from, to, .. } => from == account || to == account,
            LedgerEventKind::InterestRateUpdated { .. } => false,
        }
    }
}

/// A recorded event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Unique event identifier
    pub id: Uuid,
    /// Position in the log, starting at zero with no gaps
    pub sequence: u64,
    /// Clock snapshot of the operation that emitted the event
    pub recorded_at: DateTime<Utc>,
    /// Event payload
    #[serde(flatten)]
    pub kind: LedgerEventKind,
}

/// Append-only event sequence
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<LedgerEvent>,
}

impl EventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the events of one operation, in order
    pub(crate) fn append_all(
        &mut self,
        kinds: impl IntoIterator<Item = LedgerEventKind>,
        recorded_at: DateTime<Utc>,
    ) {
        for kind in kinds {
            let sequence = self.events.len() as u64;
            self.events.push(LedgerEvent {
                id: Uuid::new_v4(),
                sequence,
                recorded_at,
                kind,
            });
        }
    }

    /// Every event recorded so far
    pub fn all(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Events with a sequence number at or after `sequence`
    pub fn since(&self, sequence: u64) -> &[LedgerEvent] {
        let start = usize::try_from(sequence)
            .unwrap_or(usize::MAX)
            .min(self.events.len());
        &self.events[start..]
    }

    /// Events involving `account`
    pub fn for_account<'a>(
        &'a self,
        account: &'a AccountId,
    ) -> impl Iterator<Item = &'a LedgerEvent> + 'a {
        self.events.iter().filter(move |e| e.kind.involves(account))
    }

    /// Most recent event
    pub fn last(&self) -> Option<&LedgerEvent> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
