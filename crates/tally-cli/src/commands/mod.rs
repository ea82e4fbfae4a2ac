//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `budget` - Budget and allocation commands
//! - `catalog` - Category and bank account commands
//! - `core` - Init and shared utilities (open_db, load_config, argument parsing)
//! - `dashboard` - Current budget with alerts
//! - `expenses` - Expense commands (add, list, show, update, delete)
//! - `patterns` - Notification pattern commands and `notify`
//! - `rollover` - Daily rollover and the rollover scheduler

pub mod budget;
pub mod catalog;
pub mod core;
pub mod dashboard;
pub mod expenses;
pub mod patterns;
pub mod rollover;

// Re-export command functions for main.rs
pub use budget::*;
pub use catalog::*;
pub use core::*;
pub use dashboard::*;
pub use expenses::*;
pub use patterns::*;
pub use rollover::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
