//! Repository ports consumed by the engine
//!
//! The ledger and classifier only talk to storage through these traits. They
//! hold no business logic; `db` provides the SQLite implementation.

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{
    BankAccount, Budget, BudgetAllocation, Category, Expense, NewExpense, NewNotificationPattern,
    NotificationChannel, NotificationPattern, PatternRules, PatternStatus,
};

/// Budget, allocation, category and expense access inside one unit of work
pub trait LedgerRepository {
    // ---- budgets ----
    fn find_budget(&self, user_id: i64, year: i32, month: u32) -> Result<Option<Budget>>;
    fn get_budget(&self, id: i64) -> Result<Option<Budget>>;
    fn insert_budget(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
        total_amount: f64,
        auto_create_next: bool,
    ) -> Result<i64>;
    fn update_budget(&self, budget: &Budget) -> Result<()>;

    // ---- allocations ----
    fn list_allocations(&self, budget_id: i64) -> Result<Vec<BudgetAllocation>>;
    fn find_allocation(&self, budget_id: i64, category_id: i64)
        -> Result<Option<BudgetAllocation>>;
    fn get_allocation(&self, id: i64) -> Result<Option<BudgetAllocation>>;
    /// Insert an allocation; `id` on the argument is ignored
    fn insert_allocation(&self, allocation: &BudgetAllocation) -> Result<i64>;
    fn update_allocation(&self, allocation: &BudgetAllocation) -> Result<()>;

    // ---- categories ----
    fn get_category(&self, id: i64) -> Result<Option<Category>>;

    // ---- expenses ----
    fn insert_expense(&self, expense: &NewExpense, budget_id: i64, allocation_id: i64)
        -> Result<i64>;
    fn get_expense(&self, id: i64) -> Result<Option<Expense>>;
    fn update_expense(&self, expense: &Expense) -> Result<()>;
    fn delete_expense(&self, id: i64) -> Result<()>;
    fn list_expenses(&self, budget_id: i64) -> Result<Vec<Expense>>;
    /// Sum of all non-cancelled expenses booked against an allocation
    fn sum_allocation_expenses(&self, allocation_id: i64) -> Result<f64>;
    /// Sum of confirmed expenses of a user in a category on one day
    fn sum_confirmed_expenses_on(&self, user_id: i64, category_id: i64, date: NaiveDate)
        -> Result<f64>;
}

/// Runs ledger work as serialized units
///
/// Implementations must guarantee that two `in_transaction` closures touching
/// the same user never interleave, and that an `Err` from the closure leaves
/// no partial writes behind.
pub trait LedgerStore {
    fn in_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn LedgerRepository) -> Result<T>;

    /// Consistent read-only view
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn LedgerRepository) -> Result<T>;
}

/// Bank accounts and notification patterns
pub trait PatternRepository {
    fn get_bank_account(&self, id: i64) -> Result<Option<BankAccount>>;

    /// Active patterns for an account/channel, ascending priority
    fn list_active_patterns(
        &self,
        bank_account_id: i64,
        channel: NotificationChannel,
    ) -> Result<Vec<NotificationPattern>>;
    fn find_default_pattern(
        &self,
        bank_account_id: i64,
        channel: NotificationChannel,
    ) -> Result<Option<NotificationPattern>>;
    fn list_patterns(&self, bank_account_id: i64) -> Result<Vec<NotificationPattern>>;
    fn get_pattern(&self, id: i64) -> Result<Option<NotificationPattern>>;

    /// Fails with `DefaultPatternExists` when `is_default` collides
    fn insert_pattern(&self, pattern: &NewNotificationPattern) -> Result<i64>;
    fn update_pattern_rules(&self, id: i64, rules: &PatternRules) -> Result<()>;
    fn update_pattern_status(&self, id: i64, status: PatternStatus) -> Result<()>;
    /// Make `id` the only default for its account/channel in one write
    fn set_default_pattern(&self, id: i64) -> Result<()>;
    fn delete_pattern(&self, id: i64) -> Result<()>;
    /// Atomically bump match/success counters
    fn record_pattern_outcome(&self, id: i64, success: bool) -> Result<()>;
}
