//! Ledger error types for validation and state errors.
//!
//! This module defines all errors that can occur during ledger operations:
//! naming collisions, accounting period state-machine violations, event
//! insertion failures, and transaction posting failures. All of them are
//! synchronous business-rule violations; none are retryable.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use fundledger_shared::types::{AccountId, FundId, TransactionId};

use super::period::PeriodKey;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Naming Errors ==========
    /// Fund or account name collision.
    #[error("Name already in use: {0}")]
    DuplicateName(String),

    /// Fund or account name is empty.
    #[error("Name must not be empty")]
    EmptyName,

    // ========== Accounting Period Errors ==========
    /// Accounting period cannot be created as requested.
    #[error("Invalid accounting period {key}: {reason}")]
    InvalidPeriod {
        /// The offending period key.
        key: PeriodKey,
        /// Why the period is invalid.
        reason: String,
    },

    /// Cannot close a period while an earlier period is still open.
    #[error("Cannot close period: earlier period {open} is still open")]
    PriorPeriodStillOpen {
        /// The earliest period that is still open.
        open: PeriodKey,
    },

    /// Event dated outside any currently open accounting period.
    #[error("Date {0} does not fall within an open accounting period")]
    OutOfRangeAccountingPeriod(NaiveDate),

    /// Accounting period not found.
    #[error("Accounting period not found: {0}")]
    PeriodNotFound(PeriodKey),

    // ========== Event Insertion Errors ==========
    /// Insertion or posting would drive a fund balance below zero
    /// somewhere in the timeline.
    #[error("Fund {fund_id} balance would become negative ({balance}) on {date}")]
    NegativeFundBalance {
        /// The fund whose balance would go negative.
        fund_id: FundId,
        /// The event date at which the balance first goes negative.
        date: NaiveDate,
        /// The offending balance.
        balance: Decimal,
    },

    /// Balance query targets a period before the account existed.
    #[error("Account {0} was not yet opened at the requested time")]
    AccountNotYetOpened(AccountId),

    // ========== Amount Errors ==========
    /// Amount cannot be zero.
    #[error("Amount cannot be zero")]
    ZeroAmount,

    /// Amount cannot be negative.
    #[error("Amount cannot be negative")]
    NegativeAmount,

    /// Duplicate fund IDs within one fund amount list.
    #[error("Duplicate fund in amount list: {0}")]
    DuplicateFundAmount(FundId),

    // ========== Transaction Errors ==========
    /// Transaction has no legs or a leg with no entries.
    #[error("Transaction must have at least one leg with at least one fund amount")]
    EmptyTransaction,

    /// The account is not one of the transaction's legs.
    #[error("Account {account_id} is not a leg of transaction {transaction_id}")]
    AccountMismatch {
        /// The transaction being posted.
        transaction_id: TransactionId,
        /// The account that is not a leg.
        account_id: AccountId,
    },

    /// Debit and credit legs both target the same account.
    #[error("Debit and credit legs cannot both target account {0}")]
    SameAccountLegs(AccountId),

    /// The posting for this account has already been posted.
    #[error("Transaction {transaction_id} is already posted for account {account_id}")]
    AlreadyPosted {
        /// The transaction being posted.
        transaction_id: TransactionId,
        /// The account whose leg is already posted.
        account_id: AccountId,
    },

    // ========== Account Errors ==========
    /// The account type does not permit this operation.
    #[error("Account {account_id} does not support {operation}")]
    InvalidAccountType {
        /// The account in question.
        account_id: AccountId,
        /// The operation that was attempted.
        operation: &'static str,
    },

    // ========== Lookup Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Fund not found.
    #[error("Fund not found: {0}")]
    FundNotFound(FundId),

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    // ========== Internal Errors ==========
    /// Internal invariant violation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the error code for collaborator-facing surfaces.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateName(_) => "DUPLICATE_NAME",
            Self::EmptyName => "EMPTY_NAME",
            Self::InvalidPeriod { .. } => "INVALID_PERIOD",
            Self::PriorPeriodStillOpen { .. } => "PRIOR_PERIOD_STILL_OPEN",
            Self::OutOfRangeAccountingPeriod(_) => "OUT_OF_RANGE_ACCOUNTING_PERIOD",
            Self::PeriodNotFound(_) => "PERIOD_NOT_FOUND",
            Self::NegativeFundBalance { .. } => "NEGATIVE_FUND_BALANCE",
            Self::AccountNotYetOpened(_) => "ACCOUNT_NOT_YET_OPENED",
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::DuplicateFundAmount(_) => "DUPLICATE_FUND_AMOUNT",
            Self::EmptyTransaction => "EMPTY_TRANSACTION",
            Self::SameAccountLegs(_) => "SAME_ACCOUNT_LEGS",
            Self::AccountMismatch { .. } => "ACCOUNT_MISMATCH",
            Self::AlreadyPosted { .. } => "ALREADY_POSTED",
            Self::InvalidAccountType { .. } => "INVALID_ACCOUNT_TYPE",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::FundNotFound(_) => "FUND_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the error indicates a missing entity rather than
    /// an invalid request.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::AccountNotFound(_)
                | Self::FundNotFound(_)
                | Self::TransactionNotFound(_)
                | Self::PeriodNotFound(_)
        )
    }
}
