//! Balance checkpoints: cached per-account, per-period snapshots.
//!
//! A checkpoint captures an account's balance set immediately after all
//! events of a closed period have been applied. Open periods never have
//! checkpoints; queries into them replay from the latest prior
//! checkpoint. Exactly one checkpoint exists per (account, closed
//! period) pair, and it is immutable once written.

use serde::{Deserialize, Serialize};

use fundledger_shared::types::AccountId;

use super::balance::BalanceSet;
use super::period::PeriodKey;

/// Snapshot of an account's balances at the end of a closed period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceCheckpoint {
    /// The account the snapshot belongs to.
    pub account_id: AccountId,
    /// The closed period the snapshot covers through the end of.
    pub period_key: PeriodKey,
    /// Per-fund balances, pending debits, and pending credits.
    pub balances: BalanceSet,
}

impl BalanceCheckpoint {
    /// Creates a checkpoint from a replayed balance set.
    #[must_use]
    pub const fn new(account_id: AccountId, period_key: PeriodKey, balances: BalanceSet) -> Self {
        Self {
            account_id,
            period_key,
            balances,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::event::{BalanceEventKind, FundAmount};
    use fundledger_shared::types::FundId;
    use rust_decimal_macros::dec;

    #[test]
    fn test_checkpoint_equality_is_structural() {
        let account_id = AccountId::new();
        let fund = FundId::new();
        let key = PeriodKey::new(2025, 1);

        let mut set = BalanceSet::new();
        set.apply(&BalanceEventKind::AccountOpened {
            fund_amounts: vec![FundAmount::new(fund, dec!(100))],
        });

        let a = BalanceCheckpoint::new(account_id, key, set.clone());
        let b = BalanceCheckpoint::new(account_id, key, set.clone());
        assert_eq!(a, b);

        set.apply(&BalanceEventKind::ValueChange {
            fund_amount: FundAmount::new(fund, dec!(1)),
        });
        let c = BalanceCheckpoint::new(account_id, key, set);
        assert_ne!(a, c);
    }
}
