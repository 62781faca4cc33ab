//! Transaction aggregate.
//!
//! A transaction is a debit/credit pair of postings against one or two
//! accounts. Each leg owns one `TransactionPosting` balance event in its
//! account's stream; legs are posted (reconciled) independently.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use fundledger_shared::types::{AccountId, BalanceEventId, TransactionId};

use super::error::LedgerError;
use super::event::{FundAmount, validate_leg_entries};

/// Transaction type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Ordinary deposit or payment.
    Standard,
    /// Transfer between two accounts.
    Transfer,
    /// Correction of a prior entry.
    Adjustment,
}

/// Which side of a transaction a leg sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegSide {
    /// Debit leg: decreases the posted balance once posted.
    Debit,
    /// Credit leg: increases the posted balance once posted.
    Credit,
}

/// One leg of a transaction input: an account and its fund amounts.
///
/// Amounts are entered positive; the engine signs them by leg side when
/// it builds the posting event.
#[derive(Debug, Clone)]
pub struct TransactionLeg {
    /// The account this leg posts against.
    pub account_id: AccountId,
    /// Per-fund amounts (non-empty, no duplicate funds, all positive).
    pub entries: Vec<FundAmount>,
}

/// Input for creating a new transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    /// Classification of the transaction.
    pub transaction_type: TransactionType,
    /// The accounting date both posting events are dated with.
    pub accounting_date: NaiveDate,
    /// Optional debit leg.
    pub debit: Option<TransactionLeg>,
    /// Optional credit leg.
    pub credit: Option<TransactionLeg>,
}

impl CreateTransactionInput {
    /// Validates the shape of the input: at least one leg, and each
    /// present leg carries valid entries.
    ///
    /// # Errors
    ///
    /// Returns `EmptyTransaction`, `DuplicateFundAmount`, `ZeroAmount`,
    /// `NegativeAmount`, or `SameAccountLegs` (both legs on one account).
    pub fn validate(&self) -> Result<(), LedgerError> {
        match (&self.debit, &self.credit) {
            (None, None) => Err(LedgerError::EmptyTransaction),
            (Some(leg), None) | (None, Some(leg)) => validate_leg_entries(&leg.entries),
            (Some(debit), Some(credit)) => {
                validate_leg_entries(&debit.entries)?;
                validate_leg_entries(&credit.entries)?;
                if debit.account_id == credit.account_id {
                    return Err(LedgerError::SameAccountLegs(debit.account_id));
                }
                Ok(())
            }
        }
    }
}

/// The stored state of one transaction leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingRef {
    /// The account the leg posts against.
    pub account_id: AccountId,
    /// The posting event in that account's stream.
    pub event_id: BalanceEventId,
    /// Which side of the transaction this leg is.
    pub side: LegSide,
    /// The entries as entered (positive amounts).
    pub entries: Vec<FundAmount>,
    /// Whether this leg has been posted.
    pub posted: bool,
}

/// A debit/credit pair of postings against one or two accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// The accounting date of both posting events.
    pub accounting_date: NaiveDate,
    /// The reconciliation date; `None` until every leg is posted.
    pub statement_date: Option<NaiveDate>,
    /// Classification of the transaction.
    pub transaction_type: TransactionType,
    /// True once every leg has been posted.
    pub is_posted: bool,
    /// The legs (one or two).
    pub legs: Vec<PostingRef>,
}

impl Transaction {
    /// Returns the leg posting against the given account, if any.
    #[must_use]
    pub fn leg_for(&self, account_id: AccountId) -> Option<&PostingRef> {
        self.legs.iter().find(|leg| leg.account_id == account_id)
    }

    /// Returns a mutable handle to the leg for the given account.
    pub fn leg_for_mut(&mut self, account_id: AccountId) -> Option<&mut PostingRef> {
        self.legs.iter_mut().find(|leg| leg.account_id == account_id)
    }

    /// Returns true if every leg has been posted.
    #[must_use]
    pub fn all_legs_posted(&self) -> bool {
        self.legs.iter().all(|leg| leg.posted)
    }

    /// Returns true if the transaction has been reconciled.
    #[must_use]
    pub const fn is_reconciled(&self) -> bool {
        self.statement_date.is_some()
    }
}
