//! Per-fund balance accumulation and query results.
//!
//! A `BalanceSet` is the running state produced by replaying balance
//! events in `(event_date, sequence)` order: per-fund posted balances
//! plus pending debit/credit components from unposted transaction legs.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fundledger_shared::types::{AccountId, FundId};

use super::event::BalanceEventKind;

/// Balance components for a single fund.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundBalance {
    /// Posted balance.
    pub balance: Decimal,
    /// Sum of pending debit amounts (stored positive).
    pub pending_debit: Decimal,
    /// Sum of pending credit amounts.
    pub pending_credit: Decimal,
}

impl FundBalance {
    /// Returns the pending net change: credits minus debits.
    #[must_use]
    pub fn pending_change(&self) -> Decimal {
        self.pending_credit - self.pending_debit
    }

    /// Returns true if all components are zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.balance.is_zero() && self.pending_debit.is_zero() && self.pending_credit.is_zero()
    }
}

/// Per-fund balances accumulated by event replay.
///
/// Keyed by `FundId` in a `BTreeMap` so iteration order is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSet {
    funds: BTreeMap<FundId, FundBalance>,
}

impl BalanceSet {
    /// Creates an empty balance set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event's delta to the set.
    pub fn apply(&mut self, kind: &BalanceEventKind) {
        match kind {
            BalanceEventKind::AccountOpened { fund_amounts } => {
                for fa in fund_amounts {
                    self.funds.entry(fa.fund_id).or_default().balance += fa.amount;
                }
            }
            BalanceEventKind::ValueChange { fund_amount } => {
                self.funds.entry(fund_amount.fund_id).or_default().balance += fund_amount.amount;
            }
            BalanceEventKind::FundConversion {
                from_fund,
                to_fund,
                amount,
            } => {
                self.funds.entry(*from_fund).or_default().balance -= *amount;
                self.funds.entry(*to_fund).or_default().balance += *amount;
            }
            BalanceEventKind::TransactionPosting {
                fund_amounts,
                posted,
                ..
            } => {
                for fa in fund_amounts {
                    let entry = self.funds.entry(fa.fund_id).or_default();
                    if *posted {
                        entry.balance += fa.amount;
                    } else if fa.amount < Decimal::ZERO {
                        entry.pending_debit -= fa.amount;
                    } else {
                        entry.pending_credit += fa.amount;
                    }
                }
            }
        }
    }

    /// Returns the first fund whose posted balance is negative, if any.
    #[must_use]
    pub fn first_negative(&self) -> Option<(FundId, Decimal)> {
        self.funds
            .iter()
            .find(|(_, fb)| fb.balance < Decimal::ZERO)
            .map(|(id, fb)| (*id, fb.balance))
    }

    /// Returns the balance components for a fund (zero if untouched).
    #[must_use]
    pub fn get(&self, fund_id: FundId) -> FundBalance {
        self.funds.get(&fund_id).copied().unwrap_or_default()
    }

    /// Iterates over per-fund balances in fund-ID order.
    pub fn iter(&self) -> impl Iterator<Item = (FundId, &FundBalance)> {
        self.funds.iter().map(|(id, fb)| (*id, fb))
    }

    /// Returns true if no fund has any non-zero component.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.funds.values().all(FundBalance::is_zero)
    }
}

/// The as-of marker a balance was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsOf {
    /// The latest state of the ledger.
    Current,
    /// The state as of the end of the given date.
    Date(NaiveDate),
    /// The state immediately after all events of the given period.
    Period(super::period::PeriodKey),
}

/// Per-fund line of a balance report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundBalanceLine {
    /// The fund.
    pub fund_id: FundId,
    /// Posted balance.
    pub balance: Decimal,
    /// Pending net change (credits minus debits).
    pub pending_change: Decimal,
}

/// Result of a balance query: per-fund balances plus aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceReport {
    /// The queried account.
    pub account_id: AccountId,
    /// What instant the report describes.
    pub as_of: AsOf,
    /// Per-fund balances, in fund-ID order.
    pub fund_balances: Vec<FundBalanceLine>,
    /// Aggregate posted balance across all funds.
    pub total_balance: Decimal,
    /// Aggregate pending net change across all funds.
    pub total_pending_change: Decimal,
}

impl BalanceReport {
    /// Builds a report from an accumulated balance set.
    #[must_use]
    pub fn from_set(account_id: AccountId, as_of: AsOf, set: &BalanceSet) -> Self {
        let fund_balances: Vec<FundBalanceLine> = set
            .iter()
            .map(|(fund_id, fb)| FundBalanceLine {
                fund_id,
                balance: fb.balance,
                pending_change: fb.pending_change(),
            })
            .collect();
        let total_balance = fund_balances.iter().map(|l| l.balance).sum();
        let total_pending_change = fund_balances.iter().map(|l| l.pending_change).sum();

        Self {
            account_id,
            as_of,
            fund_balances,
            total_balance,
            total_pending_change,
        }
    }

    /// Returns the line for a fund, if the fund was ever touched.
    #[must_use]
    pub fn fund(&self, fund_id: FundId) -> Option<&FundBalanceLine> {
        self.fund_balances.iter().find(|l| l.fund_id == fund_id)
    }
}
