//! Property-based tests for the ledger engine.
//!
//! These exercise the whole-engine invariants: posted fund balances
//! never go negative anywhere on the timeline, rejected mutations leave
//! the engine untouched, and closing a period never changes the answer
//! of any balance query.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use fundledger_shared::types::{AccountId, FundId};

use crate::account::AccountType;

use super::balance::AsOf;
use super::engine::LedgerEngine;
use super::event::FundAmount;
use super::period::PeriodKey;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Strategy to generate a signed, non-zero revaluation amount with two
/// decimal places.
fn change_amount() -> impl Strategy<Value = Decimal> {
    (-50_000i64..50_000)
        .prop_filter("non-zero", |cents| *cents != 0)
        .prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a day in the two-month window 2025-01-01
/// through 2025-02-28.
fn window_day() -> impl Strategy<Value = NaiveDate> {
    (0i64..59).prop_map(|offset| date(2025, 1, 1) + chrono::Duration::days(offset))
}

/// Engine with open periods 2025-01 and 2025-02 and one funded
/// investment account opened on the first day of the window.
fn funded_engine(opening: Decimal) -> (LedgerEngine, AccountId, FundId) {
    let mut engine = LedgerEngine::default();
    engine.create_accounting_period(2025, 1).expect("period");
    engine.create_accounting_period(2025, 2).expect("period");
    let fund = engine.create_fund("Cash", "").expect("fund");
    let account_id = engine
        .create_account(
            "Brokerage",
            AccountType::Investment,
            date(2025, 1, 1),
            vec![FundAmount::new(fund, opening)],
        )
        .expect("account");
    (engine, account_id, fund)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* sequence of attempted revaluations (accepted or
    /// rejected), every posted fund balance is non-negative at every
    /// day in the window.
    #[test]
    fn prop_posted_balances_never_negative(
        changes in prop::collection::vec((window_day(), change_amount()), 0..30),
    ) {
        let (mut engine, account_id, fund) = funded_engine(Decimal::new(50_000, 2));
        for (day, amount) in changes {
            let _ = engine.record_value_change(account_id, day, FundAmount::new(fund, amount));
        }

        for offset in 0..59 {
            let day = date(2025, 1, 1) + chrono::Duration::days(offset);
            let report = engine.balance(account_id, AsOf::Date(day)).expect("report");
            for line in &report.fund_balances {
                prop_assert!(
                    line.balance >= Decimal::ZERO,
                    "fund {} negative ({}) on {}",
                    line.fund_id,
                    line.balance,
                    day
                );
            }
        }
    }

    /// *For any* rejected revaluation, the engine is exactly the state
    /// it was before the attempt.
    #[test]
    fn prop_rejected_change_leaves_engine_untouched(
        changes in prop::collection::vec((window_day(), change_amount()), 1..30),
    ) {
        let (mut engine, account_id, fund) = funded_engine(Decimal::new(10_000, 2));
        for (day, amount) in changes {
            let snapshot = engine.clone();
            if engine
                .record_value_change(account_id, day, FundAmount::new(fund, amount))
                .is_err()
            {
                prop_assert_eq!(&engine, &snapshot);
            }
        }
    }

    /// *For any* history, closing periods changes where replay starts
    /// but never the answer of any balance query.
    #[test]
    fn prop_close_does_not_change_balance_answers(
        changes in prop::collection::vec((window_day(), change_amount()), 0..20),
    ) {
        let (mut engine, account_id, fund) = funded_engine(Decimal::new(100_000, 2));
        for (day, amount) in changes {
            let _ = engine.record_value_change(account_id, day, FundAmount::new(fund, amount));
        }

        let targets = [
            AsOf::Current,
            AsOf::Date(date(2025, 1, 15)),
            AsOf::Date(date(2025, 1, 31)),
            AsOf::Date(date(2025, 2, 14)),
            AsOf::Period(PeriodKey::new(2025, 1)),
            AsOf::Period(PeriodKey::new(2025, 2)),
        ];
        let before: Vec<_> = targets
            .iter()
            .map(|&as_of| engine.balance(account_id, as_of).expect("report"))
            .collect();

        engine.close_period(PeriodKey::new(2025, 1)).expect("close");
        for (as_of, expected) in targets.iter().zip(&before) {
            prop_assert_eq!(&engine.balance(account_id, *as_of).expect("report"), expected);
        }

        engine.close_period(PeriodKey::new(2025, 2)).expect("close");
        for (as_of, expected) in targets.iter().zip(&before) {
            prop_assert_eq!(&engine.balance(account_id, *as_of).expect("report"), expected);
        }
    }

    /// *For any* insertion order, the event stream stays sorted by
    /// `(event_date, sequence)` and same-date sequences stay dense from 1.
    #[test]
    fn prop_event_stream_stays_sorted_and_dense(
        changes in prop::collection::vec((window_day(), change_amount()), 0..30),
    ) {
        let (mut engine, account_id, fund) = funded_engine(Decimal::new(100_000, 2));
        for (day, amount) in changes {
            let _ = engine.record_value_change(account_id, day, FundAmount::new(fund, amount));
        }

        let account = engine.account(account_id).expect("account");
        let mut prev: Option<(NaiveDate, i64)> = None;
        for event in account.events() {
            match prev {
                Some((day, sequence)) if day == event.event_date => {
                    prop_assert_eq!(event.sequence, sequence + 1);
                }
                Some((day, _)) => {
                    prop_assert!(day < event.event_date);
                    prop_assert_eq!(event.sequence, 1);
                }
                None => prop_assert_eq!(event.sequence, 1),
            }
            prev = Some((event.event_date, event.sequence));
        }
    }
}
