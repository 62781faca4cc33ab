//! Property-based tests for the accounting period calendar.

use proptest::prelude::*;

use fundledger_shared::LedgerConfig;

use super::error::LedgerError;
use super::period::{CloseOutcome, PeriodCalendar, PeriodKey};

/// Strategy to generate a starting period well inside the valid year
/// range, so short extension runs cannot escape it.
fn anchor_key() -> impl Strategy<Value = PeriodKey> {
    (1950i32..2050, 1u32..=12).prop_map(|(year, month)| PeriodKey::new(year, month))
}

/// Builds a calendar with `len` consecutive open months starting at
/// `anchor`, returning the calendar and the keys in order.
fn run_of(anchor: PeriodKey, len: usize) -> (PeriodCalendar, Vec<PeriodKey>) {
    let config = LedgerConfig::default();
    let mut calendar = PeriodCalendar::new();
    let mut keys = Vec::with_capacity(len);
    let mut key = anchor;
    for _ in 0..len {
        calendar
            .create(key.year, key.month, &config)
            .expect("run creation");
        keys.push(key);
        key = key.next();
    }
    (calendar, keys)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* interleaving of forward and backward extensions, the
    /// calendar remains a contiguous run of consecutive months.
    #[test]
    fn prop_calendar_stays_contiguous(
        anchor in anchor_key(),
        steps in prop::collection::vec(any::<bool>(), 0..24),
    ) {
        let config = LedgerConfig::default();
        let mut calendar = PeriodCalendar::new();
        calendar.create(anchor.year, anchor.month, &config).expect("anchor");

        for forward in steps {
            let key = if forward {
                calendar.last_key().expect("non-empty").next()
            } else {
                calendar.first_key().expect("non-empty").prev()
            };
            calendar.create(key.year, key.month, &config).expect("extension");
        }

        let mut expected = calendar.first_key().expect("non-empty");
        for period in calendar.iter() {
            prop_assert_eq!(period.key, expected);
            expected = expected.next();
        }
        prop_assert_eq!(calendar.last_key().expect("non-empty").next(), expected);
    }

    /// *For any* run, creating a period detached from both ends is
    /// rejected and the calendar is unchanged.
    #[test]
    fn prop_gap_creation_rejected(
        anchor in anchor_key(),
        len in 1usize..12,
        skip in 2u32..12,
    ) {
        let config = LedgerConfig::default();
        let (mut calendar, keys) = run_of(anchor, len);

        let mut gap = keys[len - 1];
        for _ in 0..skip {
            gap = gap.next();
        }
        let before = calendar.clone();
        let result = calendar.create(gap.year, gap.month, &config);
        prop_assert!(
            matches!(result, Err(LedgerError::InvalidPeriod { .. })),
            "gap creation should fail, got {:?}",
            result
        );
        prop_assert_eq!(calendar, before);
    }

    /// *For any* run, the closed periods always form a chronological
    /// prefix: closing in order succeeds, skipping ahead fails.
    #[test]
    fn prop_closed_periods_form_prefix(
        anchor in anchor_key(),
        (len, closed) in (2usize..12).prop_flat_map(|len| (Just(len), 0..len)),
    ) {
        let (mut calendar, keys) = run_of(anchor, len);

        for key in &keys[..closed] {
            prop_assert_eq!(calendar.close(*key).expect("in-order close"), CloseOutcome::Closed);
        }
        prop_assert_eq!(calendar.earliest_open(), Some(keys[closed]));

        if closed + 1 < len {
            let result = calendar.close(keys[closed + 1]);
            prop_assert!(
                matches!(
                    result,
                    Err(LedgerError::PriorPeriodStillOpen { open }) if open == keys[closed]
                ),
                "out-of-order close should fail, got {:?}",
                result
            );
        }
    }

    /// *For any* closed period, re-closing reports `AlreadyClosed` and
    /// changes nothing.
    #[test]
    fn prop_reclose_is_a_noop(
        anchor in anchor_key(),
        (len, reclose) in (1usize..12).prop_flat_map(|len| (Just(len), 0..len)),
    ) {
        let (mut calendar, keys) = run_of(anchor, len);
        for key in &keys {
            calendar.close(*key).expect("in-order close");
        }

        let before = calendar.clone();
        prop_assert_eq!(
            calendar.close(keys[reclose]).expect("re-close"),
            CloseOutcome::AlreadyClosed
        );
        prop_assert_eq!(calendar, before);
    }
}
