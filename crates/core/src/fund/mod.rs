//! Account-agnostic fund groupings.
//!
//! A fund tags a portion of money for tracking purposes, independent of
//! any account. Identity is immutable; name and description may change.

use serde::{Deserialize, Serialize};

use fundledger_shared::types::FundId;

use crate::ledger::error::LedgerError;

/// A named grouping of money.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fund {
    /// Unique identifier.
    pub id: FundId,
    /// Display name (non-empty).
    pub name: String,
    /// Free-form description.
    pub description: String,
}

impl Fund {
    /// Creates a new fund with a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns `EmptyName` if the name is blank.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Result<Self, LedgerError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(LedgerError::EmptyName);
        }
        Ok(Self {
            id: FundId::new(),
            name,
            description: description.into(),
        })
    }

    /// Renames the fund and replaces its description.
    ///
    /// # Errors
    ///
    /// Returns `EmptyName` if the new name is blank.
    pub fn rename(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<(), LedgerError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(LedgerError::EmptyName);
        }
        self.name = name;
        self.description = description.into();
        Ok(())
    }
}
