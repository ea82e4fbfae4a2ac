//! Tally Core Library
//!
//! Expense classification and budget consistency for Tally:
//! - Database access and migrations (SQLCipher via rusqlite)
//! - Repository ports the engine works against
//! - Bank notification classification with keyword and regex patterns
//! - Budget ledger that keeps allocation and budget totals in step with expenses
//! - Adaptive daily limits with rollover of unspent allowance
//! - Budget alerts for dashboards

pub mod alerts;
pub mod classify;
pub mod config;
pub mod daily_limit;
pub mod db;
pub mod error;
pub mod ledger;
pub mod models;
pub mod store;

pub use alerts::AlertGenerator;
pub use classify::{
    dry_run, NotificationClassifier, NotificationResult, PatternMatcher, PatternTest,
    RecordedNotification, NEUTRAL_CONFIDENCE,
};
pub use config::Config;
pub use db::Database;
pub use error::{Error, ErrorKind, Result};
pub use ledger::BudgetLedger;
pub use models::*;
pub use store::{LedgerRepository, LedgerStore, PatternRepository};
