//! Error types for Tally
//!
//! Every variant maps to one [`ErrorKind`] and carries a stable [`Error::code`]
//! so callers can translate failures without matching on messages.

use thiserror::Error;

/// Broad error category, used by callers to pick a user-facing status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Permission,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Permission => "permission",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    // ---- validation ----
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(f64),

    #[error("Invalid {field} regex: {source}")]
    InvalidRegex {
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("Allocations total {allocated:.2} exceeds budget total {total:.2}")]
    AllocationsExceedBudget { allocated: f64, total: f64 },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Cannot move pattern from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    // ---- not found ----
    #[error("No budget found for user {user_id} ({year}-{month:02})")]
    BudgetNotFound { user_id: i64, year: i32, month: u32 },

    #[error("Category {category_id} has no allocation in budget {budget_id}")]
    CategoryNotAllocated { budget_id: i64, category_id: i64 },

    #[error("Not found: {0}")]
    NotFound(String),

    // ---- conflict ----
    #[error("Budget for {year}-{month:02} already exists")]
    BudgetExists { year: i32, month: u32 },

    #[error("Allocation of {allocated:.2} is below the {spent:.2} already spent")]
    AllocationBelowSpent { allocated: f64, spent: f64 },

    #[error("Category {0} is already allocated in this budget")]
    DuplicateAllocation(i64),

    #[error("Bank account {bank_account_id} already has a default {channel} pattern")]
    DefaultPatternExists {
        bank_account_id: i64,
        channel: String,
    },

    // ---- permission ----
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // ---- internal ----
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount(_)
            | Self::InvalidRegex { .. }
            | Self::AllocationsExceedBudget { .. }
            | Self::InvalidData(_)
            | Self::InvalidStatusTransition { .. } => ErrorKind::Validation,
            Self::BudgetNotFound { .. } | Self::CategoryNotAllocated { .. } | Self::NotFound(_) => {
                ErrorKind::NotFound
            }
            Self::BudgetExists { .. }
            | Self::AllocationBelowSpent { .. }
            | Self::DuplicateAllocation(_)
            | Self::DefaultPatternExists { .. } => ErrorKind::Conflict,
            Self::PermissionDenied(_) => ErrorKind::Permission,
            Self::Database(_)
            | Self::Pool(_)
            | Self::Encryption(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Config(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InvalidRegex { .. } => "invalid_regex",
            Self::AllocationsExceedBudget { .. } => "allocations_exceed_budget",
            Self::InvalidData(_) => "invalid_data",
            Self::InvalidStatusTransition { .. } => "invalid_status_transition",
            Self::BudgetNotFound { .. } => "budget_not_found",
            Self::CategoryNotAllocated { .. } => "category_not_allocated",
            Self::NotFound(_) => "not_found",
            Self::BudgetExists { .. } => "budget_exists",
            Self::AllocationBelowSpent { .. } => "allocation_below_spent",
            Self::DuplicateAllocation(_) => "duplicate_allocation",
            Self::DefaultPatternExists { .. } => "default_pattern_exists",
            Self::PermissionDenied(_) => "permission_denied",
            Self::Database(_) => "database",
            Self::Pool(_) => "database_pool",
            Self::Encryption(_) => "encryption",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Config(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_follow_taxonomy() {
        assert_eq!(Error::InvalidAmount(0.0).kind(), ErrorKind::Validation);
        assert_eq!(
            Error::BudgetNotFound {
                user_id: 1,
                year: 2024,
                month: 3
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::BudgetExists {
                year: 2024,
                month: 3
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            Error::PermissionDenied("x".into()).kind(),
            ErrorKind::Permission
        );
        assert_eq!(
            Error::Encryption("x".into()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_invalid_regex_code() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = Error::InvalidRegex {
            field: "amount",
            source,
        };
        assert_eq!(err.code(), "invalid_regex");
        assert!(err.to_string().starts_with("Invalid amount regex"));
    }

    #[test]
    fn test_budget_not_found_message() {
        let err = Error::BudgetNotFound {
            user_id: 7,
            year: 2024,
            month: 2,
        };
        assert_eq!(err.to_string(), "No budget found for user 7 (2024-02)");
        assert_eq!(err.code(), "budget_not_found");
    }
}
