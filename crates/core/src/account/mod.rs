//! Accounts and their balance event streams.
//!
//! An account exclusively owns its ordered sequence of balance events;
//! its balance at any instant is fully determined by replaying those
//! events up to that instant.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use fundledger_shared::types::{AccountId, BalanceEventId};

use crate::ledger::event::BalanceEvent;
use crate::ledger::period::PeriodKey;

/// Account type, controlling which operations are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Ordinary account: opening and transaction postings only.
    Standard,
    /// Investment account: additionally supports revaluations and
    /// fund conversions.
    Investment,
}

impl AccountType {
    /// Returns true if value changes and fund conversions are legal.
    #[must_use]
    pub const fn supports_revaluation(self) -> bool {
        matches!(self, Self::Investment)
    }
}

/// A named holder of per-fund balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Display name, unique across all accounts.
    pub name: String,
    /// The account type.
    pub account_type: AccountType,
    /// The accounting period the account was opened in. Balance queries
    /// targeting earlier periods fail rather than returning zeros.
    pub opened_period: PeriodKey,
    /// The event stream: the opening event pinned first, the rest
    /// sorted by `(event_date, sequence)`.
    events: Vec<BalanceEvent>,
}

impl Account {
    /// Creates an account with an empty event stream.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        account_type: AccountType,
        opened_period: PeriodKey,
    ) -> Self {
        Self {
            id: AccountId::new(),
            name: name.into(),
            account_type,
            opened_period,
            events: Vec::new(),
        }
    }

    /// Returns the events in replay order: the opening event first, the
    /// rest by `(event_date, sequence)`.
    #[must_use]
    pub fn events(&self) -> &[BalanceEvent] {
        &self.events
    }

    /// Returns the next sequence number for an event on the given date:
    /// one past the current maximum among same-date events, starting at 1.
    #[must_use]
    pub fn next_sequence_on(&self, date: NaiveDate) -> i64 {
        self.events
            .iter()
            .filter(|e| e.event_date == date)
            .map(|e| e.sequence)
            .max()
            .map_or(1, |max| max + 1)
    }

    /// Inserts an event at its sorted position in the stream.
    ///
    /// The stream head (the opening event) stays pinned first: an event
    /// back-dated before the opening date replays after the opening, so
    /// the opening funding is always the balance baseline.
    pub fn insert_event(&mut self, event: BalanceEvent) {
        let tail_start = usize::from(!self.events.is_empty());
        let pos = tail_start
            + self.events[tail_start..]
                .partition_point(|e| e.order_key() <= event.order_key());
        self.events.insert(pos, event);
    }

    /// Finds an event by ID.
    #[must_use]
    pub fn event(&self, event_id: BalanceEventId) -> Option<&BalanceEvent> {
        self.events.iter().find(|e| e.id == event_id)
    }

    /// Finds an event by ID, mutably.
    pub fn event_mut(&mut self, event_id: BalanceEventId) -> Option<&mut BalanceEvent> {
        self.events.iter_mut().find(|e| e.id == event_id)
    }

    /// Returns the date of the stream head (the opening event), if any.
    #[must_use]
    pub fn first_event_date(&self) -> Option<NaiveDate> {
        self.events.first().map(|e| e.event_date)
    }
}
