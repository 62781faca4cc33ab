//! Accounting periods and the period state machine.
//!
//! Accounting periods are calendar months forming a contiguous run with
//! no gaps. Periods are closed strictly in chronological order, so the
//! closed periods always form a prefix of the run. A closed period is
//! immutable: no new balance events may target it.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use fundledger_shared::LedgerConfig;

use super::error::LedgerError;

/// Key identifying an accounting period: a calendar (year, month) pair.
///
/// Ordering is chronological (year first, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
}

impl PeriodKey {
    /// The smallest representable period key.
    pub const MIN: Self = Self {
        year: i32::MIN,
        month: 1,
    };

    /// The largest representable period key.
    pub const MAX: Self = Self {
        year: i32::MAX,
        month: 12,
    };

    /// Creates a period key. The month is not validated here; the
    /// calendar validates it on period creation.
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Returns the period key containing the given date.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Returns the next calendar month.
    #[must_use]
    pub const fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Returns the previous calendar month.
    #[must_use]
    pub const fn prev(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Returns the first day of the period.
    #[must_use]
    pub fn first_day(self) -> NaiveDate {
        // Month is guaranteed 1-12 for calendar-created periods.
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    /// Returns the last day of the period.
    #[must_use]
    pub fn last_day(self) -> NaiveDate {
        let next = self.next();
        next.first_day().pred_opt().unwrap_or(NaiveDate::MAX)
    }

    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl std::fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// An accounting period: a calendar month partitioning the event timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingPeriod {
    /// The (year, month) key.
    pub key: PeriodKey,
    /// Whether the period is open for new balance events.
    pub is_open: bool,
}

impl AccountingPeriod {
    /// Returns true if balance events may still target this period.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }
}

/// Outcome of a close request, distinguishing a real transition from an
/// idempotent re-close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The period transitioned from Open to Closed.
    Closed,
    /// The period was already closed; nothing changed.
    AlreadyClosed,
}

/// The contiguous run of accounting periods.
///
/// Maintains two invariants: the set of periods is always a run of
/// consecutive months, and closed periods form a chronological prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PeriodCalendar {
    periods: BTreeMap<PeriodKey, AccountingPeriod>,
}

impl PeriodCalendar {
    /// Creates an empty calendar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new open accounting period.
    ///
    /// The first period may be any valid month; every later period must
    /// extend the existing run by exactly one month at either end.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod` for out-of-range years, invalid months,
    /// duplicates, or keys that would leave a gap in the run.
    pub fn create(
        &mut self,
        year: i32,
        month: u32,
        config: &LedgerConfig,
    ) -> Result<PeriodKey, LedgerError> {
        let key = PeriodKey::new(year, month);

        if !(1..=12).contains(&month) {
            return Err(LedgerError::InvalidPeriod {
                key,
                reason: "month must be between 1 and 12".to_string(),
            });
        }
        if !config.year_in_range(year) {
            return Err(LedgerError::InvalidPeriod {
                key,
                reason: format!(
                    "year must be between {} and {}",
                    config.min_period_year, config.max_period_year
                ),
            });
        }
        if self.periods.contains_key(&key) {
            return Err(LedgerError::InvalidPeriod {
                key,
                reason: "period already exists".to_string(),
            });
        }
        if let (Some(first), Some(last)) = (self.first_key(), self.last_key()) {
            if key != first.prev() && key != last.next() {
                return Err(LedgerError::InvalidPeriod {
                    key,
                    reason: "period would leave a gap in the calendar".to_string(),
                });
            }
        }

        self.periods.insert(key, AccountingPeriod { key, is_open: true });
        Ok(key)
    }

    /// Closes the given period.
    ///
    /// Closing an already-closed period is an idempotent no-op.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound` if the period does not exist, or
    /// `PriorPeriodStillOpen` if any chronologically earlier period is
    /// still open.
    pub fn close(&mut self, key: PeriodKey) -> Result<CloseOutcome, LedgerError> {
        let Some(period) = self.periods.get(&key) else {
            return Err(LedgerError::PeriodNotFound(key));
        };
        if !period.is_open {
            return Ok(CloseOutcome::AlreadyClosed);
        }

        // Closed periods form a prefix, so the earliest open period must
        // be the one being closed.
        if let Some(open) = self.earliest_open() {
            if open < key {
                return Err(LedgerError::PriorPeriodStillOpen { open });
            }
        }

        if let Some(period) = self.periods.get_mut(&key) {
            period.is_open = false;
        }
        Ok(CloseOutcome::Closed)
    }

    /// Looks up a period by key.
    #[must_use]
    pub fn get(&self, key: PeriodKey) -> Option<&AccountingPeriod> {
        self.periods.get(&key)
    }

    /// Returns the key of the open period containing the given date.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRangeAccountingPeriod` if no period contains the
    /// date or the containing period is closed.
    pub fn open_period_for(&self, date: NaiveDate) -> Result<PeriodKey, LedgerError> {
        let key = PeriodKey::from_date(date);
        match self.periods.get(&key) {
            Some(period) if period.is_open => Ok(key),
            _ => Err(LedgerError::OutOfRangeAccountingPeriod(date)),
        }
    }

    /// Returns true if the period exists and is closed.
    #[must_use]
    pub fn is_closed(&self, key: PeriodKey) -> bool {
        self.periods.get(&key).is_some_and(|p| !p.is_open)
    }

    /// Returns the earliest period that is still open.
    #[must_use]
    pub fn earliest_open(&self) -> Option<PeriodKey> {
        self.periods
            .values()
            .find(|p| p.is_open)
            .map(|p| p.key)
    }

    /// Returns the earliest period in the run.
    #[must_use]
    pub fn first_key(&self) -> Option<PeriodKey> {
        self.periods.keys().next().copied()
    }

    /// Returns the latest period in the run.
    #[must_use]
    pub fn last_key(&self) -> Option<PeriodKey> {
        self.periods.keys().next_back().copied()
    }

    /// Iterates over all periods in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = &AccountingPeriod> {
        self.periods.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn calendar_with(keys: &[(i32, u32)]) -> PeriodCalendar {
        let config = LedgerConfig::default();
        let mut calendar = PeriodCalendar::new();
        for (year, month) in keys {
            calendar.create(*year, *month, &config).unwrap();
        }
        calendar
    }

    #[test]
    fn test_period_key_ordering() {
        assert!(PeriodKey::new(2024, 12) < PeriodKey::new(2025, 1));
        assert!(PeriodKey::new(2025, 1) < PeriodKey::new(2025, 2));
        assert_eq!(PeriodKey::new(2025, 3), PeriodKey::new(2025, 3));
    }

    #[test]
    fn test_period_key_next_prev() {
        assert_eq!(PeriodKey::new(2024, 12).next(), PeriodKey::new(2025, 1));
        assert_eq!(PeriodKey::new(2025, 1).prev(), PeriodKey::new(2024, 12));
        assert_eq!(PeriodKey::new(2025, 6).next(), PeriodKey::new(2025, 7));
    }

    #[rstest]
    #[case(2025, 2, 28)]
    #[case(2024, 2, 29)]
    #[case(2025, 1, 31)]
    #[case(2025, 4, 30)]
    #[case(2025, 12, 31)]
    fn test_period_key_boundaries(#[case] year: i32, #[case] month: u32, #[case] last: u32) {
        let key = PeriodKey::new(year, month);
        assert_eq!(key.first_day(), NaiveDate::from_ymd_opt(year, month, 1).unwrap());
        assert_eq!(key.last_day(), NaiveDate::from_ymd_opt(year, month, last).unwrap());
    }

    #[test]
    fn test_period_key_contains() {
        let key = PeriodKey::new(2025, 1);
        assert!(key.contains(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
        assert!(key.contains(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()));
        assert!(!key.contains(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()));
    }

    #[test]
    fn test_period_key_display() {
        assert_eq!(PeriodKey::new(2025, 3).to_string(), "2025-03");
        assert_eq!(PeriodKey::new(2025, 12).to_string(), "2025-12");
    }

    #[test]
    fn test_create_first_period() {
        let calendar = calendar_with(&[(2025, 1)]);
        assert!(calendar.get(PeriodKey::new(2025, 1)).unwrap().is_open());
    }

    #[test]
    fn test_create_extends_run_forward_and_backward() {
        let calendar = calendar_with(&[(2025, 2), (2025, 3), (2025, 1)]);
        assert_eq!(calendar.first_key(), Some(PeriodKey::new(2025, 1)));
        assert_eq!(calendar.last_key(), Some(PeriodKey::new(2025, 3)));
    }

    #[test]
    fn test_create_rejects_gap() {
        let config = LedgerConfig::default();
        let mut calendar = calendar_with(&[(2025, 1)]);
        let result = calendar.create(2025, 3, &config);
        assert!(matches!(result, Err(LedgerError::InvalidPeriod { .. })));
    }

    #[test]
    fn test_create_rejects_duplicate() {
        let config = LedgerConfig::default();
        let mut calendar = calendar_with(&[(2025, 1)]);
        let result = calendar.create(2025, 1, &config);
        assert!(matches!(result, Err(LedgerError::InvalidPeriod { .. })));
    }

    #[test]
    fn test_create_rejects_invalid_month() {
        let config = LedgerConfig::default();
        let mut calendar = PeriodCalendar::new();
        assert!(matches!(
            calendar.create(2025, 0, &config),
            Err(LedgerError::InvalidPeriod { .. })
        ));
        assert!(matches!(
            calendar.create(2025, 13, &config),
            Err(LedgerError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn test_create_rejects_out_of_range_year() {
        let config = LedgerConfig::default();
        let mut calendar = PeriodCalendar::new();
        assert!(matches!(
            calendar.create(1899, 1, &config),
            Err(LedgerError::InvalidPeriod { .. })
        ));
        assert!(matches!(
            calendar.create(2101, 1, &config),
            Err(LedgerError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn test_close_in_order() {
        let mut calendar = calendar_with(&[(2025, 1), (2025, 2)]);

        // Closing the later period first is rejected.
        let result = calendar.close(PeriodKey::new(2025, 2));
        assert!(matches!(
            result,
            Err(LedgerError::PriorPeriodStillOpen { open }) if open == PeriodKey::new(2025, 1)
        ));

        assert_eq!(
            calendar.close(PeriodKey::new(2025, 1)).unwrap(),
            CloseOutcome::Closed
        );
        assert_eq!(
            calendar.close(PeriodKey::new(2025, 2)).unwrap(),
            CloseOutcome::Closed
        );
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut calendar = calendar_with(&[(2025, 1)]);
        assert_eq!(
            calendar.close(PeriodKey::new(2025, 1)).unwrap(),
            CloseOutcome::Closed
        );
        assert_eq!(
            calendar.close(PeriodKey::new(2025, 1)).unwrap(),
            CloseOutcome::AlreadyClosed
        );
    }

    #[test]
    fn test_close_unknown_period() {
        let mut calendar = PeriodCalendar::new();
        assert!(matches!(
            calendar.close(PeriodKey::new(2025, 1)),
            Err(LedgerError::PeriodNotFound(_))
        ));
    }

    #[test]
    fn test_open_period_for_date() {
        let mut calendar = calendar_with(&[(2025, 1), (2025, 2)]);
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(calendar.open_period_for(date).unwrap(), PeriodKey::new(2025, 1));

        // Closed period rejects new events.
        calendar.close(PeriodKey::new(2025, 1)).unwrap();
        assert!(matches!(
            calendar.open_period_for(date),
            Err(LedgerError::OutOfRangeAccountingPeriod(_))
        ));

        // Date outside the run entirely.
        let outside = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(matches!(
            calendar.open_period_for(outside),
            Err(LedgerError::OutOfRangeAccountingPeriod(_))
        ));
    }

    #[test]
    fn test_earliest_open_tracks_closed_prefix() {
        let mut calendar = calendar_with(&[(2025, 1), (2025, 2), (2025, 3)]);
        assert_eq!(calendar.earliest_open(), Some(PeriodKey::new(2025, 1)));
        calendar.close(PeriodKey::new(2025, 1)).unwrap();
        assert_eq!(calendar.earliest_open(), Some(PeriodKey::new(2025, 2)));
    }
}
