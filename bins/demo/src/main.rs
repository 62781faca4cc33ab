//! Fundledger walkthrough
//!
//! Drives the ledger engine through a representative month: funds and
//! accounts are created, a back-dated revaluation lands in the middle of
//! existing history, a transaction goes from pending to posted, and the
//! period is closed into a checkpoint.

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fundledger_core::account::AccountType;
use fundledger_core::ledger::{
    AsOf, CreateTransactionInput, FundAmount, LedgerEngine, PeriodKey, TransactionLeg,
    TransactionType,
};
use fundledger_shared::LedgerConfig;

fn day(year: i32, month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| anyhow::anyhow!("invalid date {year}-{month:02}-{day:02}"))
}

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fundledger_core=debug,fundledger=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = LedgerConfig::load()?;
    let mut engine = LedgerEngine::new(config);

    engine.create_accounting_period(2025, 1)?;
    engine.create_accounting_period(2025, 2)?;

    let cash = engine.create_fund("Cash", "Liquid holdings")?;
    let stocks = engine.create_fund("Stocks", "Equity holdings")?;

    let checking = engine.create_account(
        "Checking",
        AccountType::Standard,
        day(2025, 1, 5)?,
        vec![FundAmount::new(cash, dec!(1000.00))],
    )?;
    let brokerage = engine.create_account(
        "Brokerage",
        AccountType::Investment,
        day(2025, 1, 15)?,
        vec![FundAmount::new(stocks, dec!(1500.00))],
    )?;

    // A market dip reported late: the event lands before existing
    // history and replays cleanly through it.
    engine.record_value_change(
        brokerage,
        day(2025, 1, 10)?,
        FundAmount::new(stocks, dec!(-100.00)),
    )?;
    let report = engine.balance(brokerage, AsOf::Date(day(2025, 1, 31)?))?;
    info!(total = %report.total_balance, "brokerage after back-dated revaluation");

    // A payment leaves Checking: pending first, posted once it clears.
    let payment = engine.create_transaction(CreateTransactionInput {
        transaction_type: TransactionType::Standard,
        accounting_date: day(2025, 1, 20)?,
        debit: Some(TransactionLeg {
            account_id: checking,
            entries: vec![FundAmount::new(cash, dec!(500.00))],
        }),
        credit: None,
    })?;
    let report = engine.balance(checking, AsOf::Current)?;
    info!(
        balance = %report.total_balance,
        pending = %report.total_pending_change,
        "checking with pending payment"
    );

    engine.post_transaction(payment, checking)?;
    let report = engine.balance(checking, AsOf::Current)?;
    info!(
        balance = %report.total_balance,
        pending = %report.total_pending_change,
        "checking after posting"
    );

    // Month end: close January and show the checkpointed answer.
    let january = PeriodKey::new(2025, 1);
    engine.close_period(january)?;
    let report = engine.balance(brokerage, AsOf::Period(january))?;
    info!(period = %january, total = %report.total_balance, "brokerage at period close");

    Ok(())
}
