//! Shared types and configuration for Fundledger.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Configuration management for the ledger engine

pub mod config;
pub mod types;

pub use config::LedgerConfig;
