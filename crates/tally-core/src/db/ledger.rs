//! Budget, allocation and expense operations

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_date, format_datetime, parse_date, parse_datetime};
use crate::error::Result;
use crate::models::{
    Budget, BudgetAllocation, Category, Expense, ExpenseSource, ExpenseStatus, NewExpense,
};
use crate::store::LedgerRepository;

const BUDGET_COLUMNS: &str = "id, user_id, year, month, total_amount, spent_amount, \
     remaining_amount, is_active, auto_create_next, created_at";

const ALLOCATION_COLUMNS: &str = "id, budget_id, category_id, allocated_amount, spent_amount, \
     remaining_amount, daily_limit, current_daily_limit, last_calculated_at, \
     last_rollover_date, alert_threshold, is_over_budget";

const EXPENSE_COLUMNS: &str = "id, user_id, budget_id, category_id, allocation_id, amount, \
     date, description, status, source, pattern_id, created_at";

fn budget_from_row(row: &Row) -> rusqlite::Result<Budget> {
    let created_at: String = row.get(9)?;
    Ok(Budget {
        id: row.get(0)?,
        user_id: row.get(1)?,
        year: row.get(2)?,
        month: row.get(3)?,
        total_amount: row.get(4)?,
        spent_amount: row.get(5)?,
        remaining_amount: row.get(6)?,
        is_active: row.get(7)?,
        auto_create_next: row.get(8)?,
        created_at: parse_datetime(&created_at),
    })
}

fn allocation_from_row(row: &Row) -> rusqlite::Result<BudgetAllocation> {
    let last_calculated_at: Option<String> = row.get(8)?;
    let last_rollover_date: Option<String> = row.get(9)?;
    Ok(BudgetAllocation {
        id: row.get(0)?,
        budget_id: row.get(1)?,
        category_id: row.get(2)?,
        allocated_amount: row.get(3)?,
        spent_amount: row.get(4)?,
        remaining_amount: row.get(5)?,
        daily_limit: row.get(6)?,
        current_daily_limit: row.get(7)?,
        last_calculated_at: last_calculated_at.as_deref().map(parse_datetime),
        last_rollover_date: last_rollover_date
            .as_deref()
            .map(|s| parse_date(9, s))
            .transpose()?,
        alert_threshold: row.get(10)?,
        is_over_budget: row.get(11)?,
    })
}

fn expense_from_row(row: &Row) -> rusqlite::Result<Expense> {
    let date: String = row.get(6)?;
    let status: String = row.get(8)?;
    let source: String = row.get(9)?;
    let created_at: String = row.get(11)?;
    Ok(Expense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        budget_id: row.get(2)?,
        category_id: row.get(3)?,
        allocation_id: row.get(4)?,
        amount: row.get(5)?,
        date: parse_date(6, &date)?,
        description: row.get(7)?,
        status: status.parse().unwrap_or_default(),
        source: source.parse().unwrap_or(ExpenseSource::Manual),
        pattern_id: row.get(10)?,
        created_at: parse_datetime(&created_at),
    })
}

/// `LedgerRepository` over a single connection (normally an open transaction)
pub struct SqlLedger<'c> {
    conn: &'c Connection,
}

impl<'c> SqlLedger<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl LedgerRepository for SqlLedger<'_> {
    fn find_budget(&self, user_id: i64, year: i32, month: u32) -> Result<Option<Budget>> {
        let budget = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM budgets WHERE user_id = ? AND year = ? AND month = ?",
                    BUDGET_COLUMNS
                ),
                params![user_id, year, month],
                budget_from_row,
            )
            .optional()?;
        Ok(budget)
    }

    fn get_budget(&self, id: i64) -> Result<Option<Budget>> {
        let budget = self
            .conn
            .query_row(
                &format!("SELECT {} FROM budgets WHERE id = ?", BUDGET_COLUMNS),
                params![id],
                budget_from_row,
            )
            .optional()?;
        Ok(budget)
    }

    fn insert_budget(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
        total_amount: f64,
        auto_create_next: bool,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO budgets (user_id, year, month, total_amount, spent_amount, remaining_amount, auto_create_next)
             VALUES (?, ?, ?, ?, 0, ?, ?)",
            params![user_id, year, month, total_amount, total_amount, auto_create_next],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_budget(&self, budget: &Budget) -> Result<()> {
        self.conn.execute(
            "UPDATE budgets
             SET total_amount = ?, spent_amount = ?, remaining_amount = ?, is_active = ?, auto_create_next = ?
             WHERE id = ?",
            params![
                budget.total_amount,
                budget.spent_amount,
                budget.remaining_amount,
                budget.is_active,
                budget.auto_create_next,
                budget.id
            ],
        )?;
        Ok(())
    }

    fn list_allocations(&self, budget_id: i64) -> Result<Vec<BudgetAllocation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM budget_allocations WHERE budget_id = ? ORDER BY id",
            ALLOCATION_COLUMNS
        ))?;
        let allocations = stmt
            .query_map(params![budget_id], allocation_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(allocations)
    }

    fn find_allocation(
        &self,
        budget_id: i64,
        category_id: i64,
    ) -> Result<Option<BudgetAllocation>> {
        let allocation = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM budget_allocations WHERE budget_id = ? AND category_id = ?",
                    ALLOCATION_COLUMNS
                ),
                params![budget_id, category_id],
                allocation_from_row,
            )
            .optional()?;
        Ok(allocation)
    }

    fn get_allocation(&self, id: i64) -> Result<Option<BudgetAllocation>> {
        let allocation = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM budget_allocations WHERE id = ?",
                    ALLOCATION_COLUMNS
                ),
                params![id],
                allocation_from_row,
            )
            .optional()?;
        Ok(allocation)
    }

    fn insert_allocation(&self, a: &BudgetAllocation) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO budget_allocations
                (budget_id, category_id, allocated_amount, spent_amount, remaining_amount,
                 daily_limit, current_daily_limit, last_calculated_at, last_rollover_date,
                 alert_threshold, is_over_budget)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                a.budget_id,
                a.category_id,
                a.allocated_amount,
                a.spent_amount,
                a.remaining_amount,
                a.daily_limit,
                a.current_daily_limit,
                a.last_calculated_at.as_ref().map(format_datetime),
                a.last_rollover_date.map(format_date),
                a.alert_threshold,
                a.is_over_budget
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_allocation(&self, a: &BudgetAllocation) -> Result<()> {
        self.conn.execute(
            "UPDATE budget_allocations
             SET allocated_amount = ?, spent_amount = ?, remaining_amount = ?, daily_limit = ?,
                 current_daily_limit = ?, last_calculated_at = ?, last_rollover_date = ?,
                 alert_threshold = ?, is_over_budget = ?
             WHERE id = ?",
            params![
                a.allocated_amount,
                a.spent_amount,
                a.remaining_amount,
                a.daily_limit,
                a.current_daily_limit,
                a.last_calculated_at.as_ref().map(format_datetime),
                a.last_rollover_date.map(format_date),
                a.alert_threshold,
                a.is_over_budget,
                a.id
            ],
        )?;
        Ok(())
    }

    fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let category = self
            .conn
            .query_row(
                "SELECT id, user_id, name, created_at FROM categories WHERE id = ?",
                params![id],
                |row| {
                    let created_at: String = row.get(3)?;
                    Ok(Category {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        name: row.get(2)?,
                        created_at: parse_datetime(&created_at),
                    })
                },
            )
            .optional()?;
        Ok(category)
    }

    fn insert_expense(
        &self,
        expense: &NewExpense,
        budget_id: i64,
        allocation_id: i64,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO expenses
                (user_id, budget_id, category_id, allocation_id, amount, date, description, status, source, pattern_id)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                expense.user_id,
                budget_id,
                expense.category_id,
                allocation_id,
                expense.amount,
                format_date(expense.date),
                expense.description,
                expense.status.as_str(),
                expense.source.as_str(),
                expense.pattern_id
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_expense(&self, id: i64) -> Result<Option<Expense>> {
        let expense = self
            .conn
            .query_row(
                &format!("SELECT {} FROM expenses WHERE id = ?", EXPENSE_COLUMNS),
                params![id],
                expense_from_row,
            )
            .optional()?;
        Ok(expense)
    }

    fn update_expense(&self, e: &Expense) -> Result<()> {
        self.conn.execute(
            "UPDATE expenses
             SET budget_id = ?, category_id = ?, allocation_id = ?, amount = ?, date = ?,
                 description = ?, status = ?
             WHERE id = ?",
            params![
                e.budget_id,
                e.category_id,
                e.allocation_id,
                e.amount,
                format_date(e.date),
                e.description,
                e.status.as_str(),
                e.id
            ],
        )?;
        Ok(())
    }

    fn delete_expense(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM expenses WHERE id = ?", params![id])?;
        Ok(())
    }

    fn list_expenses(&self, budget_id: i64) -> Result<Vec<Expense>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM expenses WHERE budget_id = ? ORDER BY date DESC, id DESC",
            EXPENSE_COLUMNS
        ))?;
        let expenses = stmt
            .query_map(params![budget_id], expense_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(expenses)
    }

    fn sum_allocation_expenses(&self, allocation_id: i64) -> Result<f64> {
        let sum = self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM expenses WHERE allocation_id = ? AND status != ?",
            params![allocation_id, ExpenseStatus::Cancelled.as_str()],
            |row| row.get(0),
        )?;
        Ok(sum)
    }

    fn sum_confirmed_expenses_on(
        &self,
        user_id: i64,
        category_id: i64,
        date: NaiveDate,
    ) -> Result<f64> {
        let sum = self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM expenses
             WHERE user_id = ? AND category_id = ? AND date = ? AND status = ?",
            params![
                user_id,
                category_id,
                format_date(date),
                ExpenseStatus::Confirmed.as_str()
            ],
            |row| row.get(0),
        )?;
        Ok(sum)
    }
}
