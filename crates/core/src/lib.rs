//! Core business logic for Fundledger.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and the balance ledger engine live here.
//!
//! # Modules
//!
//! - `fund` - Account-agnostic fund groupings
//! - `account` - Accounts and their balance event streams
//! - `ledger` - The balance ledger engine: events, periods, checkpoints,
//!   transactions, and balance computation

pub mod account;
pub mod fund;
pub mod ledger;
