//! The balance event ledger.
//!
//! This module implements the core ledger functionality:
//! - Balance events (the ordered facts behind every balance)
//! - Per-fund balance accumulation and reports
//! - Accounting periods and their Open/Closed state machine
//! - Balance checkpoints at closed period boundaries
//! - Transactions with independently posted debit/credit legs
//! - The engine tying it all together behind a validate-then-commit API
//! - Error types for ledger operations

pub mod balance;
pub mod checkpoint;
pub mod engine;
pub mod error;
pub mod event;
pub mod period;
pub mod transaction;

#[cfg(test)]
mod engine_props;
#[cfg(test)]
mod period_props;

pub use balance::{AsOf, BalanceReport, BalanceSet, FundBalance, FundBalanceLine};
pub use checkpoint::BalanceCheckpoint;
pub use engine::LedgerEngine;
pub use error::LedgerError;
pub use event::{BalanceEvent, BalanceEventKind, FundAmount};
pub use period::{AccountingPeriod, CloseOutcome, PeriodCalendar, PeriodKey};
pub use transaction::{
    CreateTransactionInput, LegSide, Transaction, TransactionLeg, TransactionType,
};
