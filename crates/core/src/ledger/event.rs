//! Balance events: dated, sequenced facts that change an account's
//! per-fund balances.
//!
//! The event variants form a closed sum type so that balance computation
//! matches exhaustively; adding a variant without handling its delta is a
//! compile error.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fundledger_shared::types::{BalanceEventId, FundId, TransactionId};

use super::error::LedgerError;
use super::period::PeriodKey;

/// A per-fund amount. Sign conventions depend on the owning event
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundAmount {
    /// The fund the amount applies to.
    pub fund_id: FundId,
    /// The amount.
    pub amount: Decimal,
}

impl FundAmount {
    /// Creates a new fund amount.
    #[must_use]
    pub const fn new(fund_id: FundId, amount: Decimal) -> Self {
        Self { fund_id, amount }
    }
}

/// Validates that a fund amount list contains no duplicate fund IDs.
///
/// # Errors
///
/// Returns `DuplicateFundAmount` naming the first repeated fund.
pub fn validate_no_duplicate_funds(entries: &[FundAmount]) -> Result<(), LedgerError> {
    for (i, entry) in entries.iter().enumerate() {
        if entries[..i].iter().any(|e| e.fund_id == entry.fund_id) {
            return Err(LedgerError::DuplicateFundAmount(entry.fund_id));
        }
    }
    Ok(())
}

/// Validates that a transaction leg's entries are non-empty, free of
/// duplicate funds, and strictly positive.
///
/// # Errors
///
/// Returns `EmptyTransaction`, `DuplicateFundAmount`, `ZeroAmount`, or
/// `NegativeAmount`.
pub fn validate_leg_entries(entries: &[FundAmount]) -> Result<(), LedgerError> {
    if entries.is_empty() {
        return Err(LedgerError::EmptyTransaction);
    }
    validate_no_duplicate_funds(entries)?;
    for entry in entries {
        if entry.amount == Decimal::ZERO {
            return Err(LedgerError::ZeroAmount);
        }
        if entry.amount < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount);
        }
    }
    Ok(())
}

/// The variant payload of a balance event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BalanceEventKind {
    /// Initial funding of an account. Always the logical first event.
    /// Amounts may carry any sign but the list must not repeat a fund.
    AccountOpened {
        /// The opening per-fund amounts.
        fund_amounts: Vec<FundAmount>,
    },
    /// Pure revaluation of a single fund (not a transfer).
    ValueChange {
        /// The signed revaluation amount.
        fund_amount: FundAmount,
    },
    /// Intra-account transfer between two funds, atomic within the event.
    FundConversion {
        /// The fund the amount is taken from.
        from_fund: FundId,
        /// The fund the amount is moved to.
        to_fund: FundId,
        /// The transferred amount (strictly positive).
        amount: Decimal,
    },
    /// One leg of a transaction. Debit legs carry negative amounts,
    /// credit legs positive. While `posted` is false the amounts feed
    /// the pending balance components only.
    TransactionPosting {
        /// The owning transaction.
        transaction_id: TransactionId,
        /// The signed per-fund amounts.
        fund_amounts: Vec<FundAmount>,
        /// Whether the leg has been reconciled into the posted balance.
        posted: bool,
    },
}

/// A balance event in an account's ordered stream.
///
/// `(event_date, sequence)` is unique within the owning account and
/// defines the total order over the stream. The sequence is a dense
/// tie-breaker assigned at insertion among events sharing a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEvent {
    /// Unique identifier.
    pub id: BalanceEventId,
    /// The accounting period containing `event_date`.
    pub period_key: PeriodKey,
    /// The date the event takes effect.
    pub event_date: NaiveDate,
    /// Dense per-(account, date) tie-breaker, starting at 1.
    pub sequence: i64,
    /// The variant payload.
    pub kind: BalanceEventKind,
}

impl BalanceEvent {
    /// Returns the ordering key within the account's stream.
    #[must_use]
    pub const fn order_key(&self) -> (NaiveDate, i64) {
        (self.event_date, self.sequence)
    }

    /// Returns the transaction this event belongs to, if it is a posting.
    #[must_use]
    pub const fn transaction_id(&self) -> Option<TransactionId> {
        match &self.kind {
            BalanceEventKind::TransactionPosting { transaction_id, .. } => Some(*transaction_id),
            _ => None,
        }
    }
}
