//! Budget ledger
//!
//! Every write follows persist-then-recompute inside one `LedgerStore` unit
//! of work: the fact (expense, allocation, budget) is written first, then the
//! affected allocation and budget aggregates are re-summed from the stored
//! expenses. Aggregates are never adjusted incrementally.

use chrono::{Datelike, NaiveDate, Utc};
use tracing::{debug, info};

use crate::alerts::AlertGenerator;
use crate::config::{BudgetSettings, Config};
use crate::daily_limit;
use crate::error::{Error, Result};
use crate::models::{
    AllocationSummary, AllocationUpdate, Budget, BudgetAllocation, BudgetSummary, BudgetUpdate,
    Category, Dashboard, Expense, ExpenseSummary, ExpenseUpdate, NewAllocation, NewBudget,
    NewExpense, RolloverReport,
};
use crate::store::{LedgerRepository, LedgerStore};

/// Slack for float sums compared against a total
const AMOUNT_EPSILON: f64 = 1e-9;

/// Budget, allocation and expense operations over a [`LedgerStore`]
pub struct BudgetLedger<'a, S: LedgerStore> {
    store: &'a S,
    settings: BudgetSettings,
    alerts: AlertGenerator,
}

impl<'a, S: LedgerStore> BudgetLedger<'a, S> {
    pub fn new(store: &'a S, config: &Config) -> Self {
        Self {
            store,
            settings: config.budget.clone(),
            alerts: AlertGenerator::new(config.alerts.clone()),
        }
    }

    // =========================================================================
    // Budgets
    // =========================================================================

    /// Create a month's budget together with its allocations
    pub fn create_budget(&self, input: &NewBudget, today: NaiveDate) -> Result<BudgetSummary> {
        if !(input.total_amount > 0.0 && input.total_amount.is_finite()) {
            return Err(Error::InvalidAmount(input.total_amount));
        }
        if !(1..=12).contains(&input.month) {
            return Err(Error::InvalidData(format!(
                "Month must be between 1 and 12, got {}",
                input.month
            )));
        }

        let mut seen = Vec::with_capacity(input.allocations.len());
        for a in &input.allocations {
            validate_allocated(a.allocated_amount)?;
            if let Some(t) = a.alert_threshold {
                validate_threshold(t)?;
            }
            if seen.contains(&a.category_id) {
                return Err(Error::DuplicateAllocation(a.category_id));
            }
            seen.push(a.category_id);
        }
        let allocated: f64 = input.allocations.iter().map(|a| a.allocated_amount).sum();
        ensure_within_total(allocated, input.total_amount)?;

        self.store.in_transaction(|repo| {
            for a in &input.allocations {
                owned_category(repo, input.user_id, a.category_id)?;
            }
            if repo
                .find_budget(input.user_id, input.year, input.month)?
                .is_some()
            {
                return Err(Error::BudgetExists {
                    year: input.year,
                    month: input.month,
                });
            }

            let budget_id = repo.insert_budget(
                input.user_id,
                input.year,
                input.month,
                input.total_amount,
                input.auto_create_next,
            )?;
            for a in &input.allocations {
                repo.insert_allocation(&self.fresh_allocation(budget_id, a))?;
            }

            let budget = required_budget(repo, budget_id)?;
            info!(
                "Created budget {} for user {} ({}-{:02}): {:.2} across {} allocations",
                budget_id,
                input.user_id,
                input.year,
                input.month,
                input.total_amount,
                input.allocations.len()
            );
            refresh_summary(repo, budget, today)
        })
    }

    /// Active budget for the month containing `today`, with daily limits refreshed
    ///
    /// A deactivated budget is not current, matching the rollover and the
    /// expense fallback. `get_budget_by_month` still returns it.
    pub fn get_current_budget(&self, user_id: i64, today: NaiveDate) -> Result<BudgetSummary> {
        let (year, month) = (today.year(), today.month());
        self.store.in_transaction(|repo| {
            let budget = repo
                .find_budget(user_id, year, month)?
                .filter(|b| b.is_active)
                .ok_or(Error::BudgetNotFound {
                    user_id,
                    year,
                    month,
                })?;
            refresh_summary(repo, budget, today)
        })
    }

    /// Budget for a given month, with daily limits refreshed
    pub fn get_budget_by_month(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> Result<BudgetSummary> {
        self.store.in_transaction(|repo| {
            let budget = repo
                .find_budget(user_id, year, month)?
                .ok_or(Error::BudgetNotFound {
                    user_id,
                    year,
                    month,
                })?;
            refresh_summary(repo, budget, today)
        })
    }

    /// Change total, active flag or auto-create flag of a budget
    pub fn update_budget(
        &self,
        user_id: i64,
        budget_id: i64,
        update: &BudgetUpdate,
        today: NaiveDate,
    ) -> Result<BudgetSummary> {
        if let Some(total) = update.total_amount {
            if !(total > 0.0 && total.is_finite()) {
                return Err(Error::InvalidAmount(total));
            }
        }

        self.store.in_transaction(|repo| {
            let mut budget = owned_budget(repo, user_id, budget_id)?;
            if let Some(total) = update.total_amount {
                let allocated = allocated_total(&repo.list_allocations(budget_id)?);
                ensure_within_total(allocated, total)?;
                budget.total_amount = total;
            }
            if let Some(active) = update.is_active {
                budget.is_active = active;
            }
            if let Some(auto) = update.auto_create_next {
                budget.auto_create_next = auto;
            }
            repo.update_budget(&budget)?;

            let budget = recompute_budget(repo, budget_id)?;
            debug!(
                "Updated budget {}: total {:.2}, active {}",
                budget.id, budget.total_amount, budget.is_active
            );
            refresh_summary(repo, budget, today)
        })
    }

    /// Add a category allocation to an existing budget
    pub fn add_allocation(
        &self,
        user_id: i64,
        budget_id: i64,
        input: &NewAllocation,
        today: NaiveDate,
    ) -> Result<BudgetSummary> {
        validate_allocated(input.allocated_amount)?;
        if let Some(t) = input.alert_threshold {
            validate_threshold(t)?;
        }

        self.store.in_transaction(|repo| {
            let budget = owned_budget(repo, user_id, budget_id)?;
            owned_category(repo, user_id, input.category_id)?;
            if repo.find_allocation(budget_id, input.category_id)?.is_some() {
                return Err(Error::DuplicateAllocation(input.category_id));
            }

            let allocated =
                allocated_total(&repo.list_allocations(budget_id)?) + input.allocated_amount;
            ensure_within_total(allocated, budget.total_amount)?;

            let id = repo.insert_allocation(&self.fresh_allocation(budget_id, input))?;
            recompute_allocation(repo, id)?;
            let budget = recompute_budget(repo, budget_id)?;
            refresh_summary(repo, budget, today)
        })
    }

    /// Change an allocation's amount or alert threshold
    pub fn update_allocation(
        &self,
        user_id: i64,
        allocation_id: i64,
        update: &AllocationUpdate,
        today: NaiveDate,
    ) -> Result<BudgetSummary> {
        if let Some(amount) = update.allocated_amount {
            validate_allocated(amount)?;
        }
        if let Some(t) = update.alert_threshold {
            validate_threshold(t)?;
        }

        self.store.in_transaction(|repo| {
            let mut allocation = repo
                .get_allocation(allocation_id)?
                .ok_or_else(|| Error::NotFound(format!("allocation {}", allocation_id)))?;
            let budget = owned_budget(repo, user_id, allocation.budget_id)?;

            if let Some(amount) = update.allocated_amount {
                let spent = repo.sum_allocation_expenses(allocation_id)?;
                if amount < spent {
                    return Err(Error::AllocationBelowSpent {
                        allocated: amount,
                        spent,
                    });
                }
                let others: f64 = repo
                    .list_allocations(budget.id)?
                    .iter()
                    .filter(|a| a.id != allocation_id)
                    .map(|a| a.allocated_amount)
                    .sum();
                ensure_within_total(others + amount, budget.total_amount)?;
                allocation.allocated_amount = amount;
            }
            if let Some(t) = update.alert_threshold {
                allocation.alert_threshold = t;
            }
            repo.update_allocation(&allocation)?;

            recompute_allocation(repo, allocation_id)?;
            let budget = recompute_budget(repo, budget.id)?;
            refresh_summary(repo, budget, today)
        })
    }

    /// Re-sum every allocation of a budget and the budget itself
    ///
    /// Running it twice in a row changes nothing.
    pub fn recompute(&self, user_id: i64, budget_id: i64) -> Result<Budget> {
        self.store.in_transaction(|repo| {
            owned_budget(repo, user_id, budget_id)?;
            for allocation in repo.list_allocations(budget_id)? {
                recompute_allocation(repo, allocation.id)?;
            }
            recompute_budget(repo, budget_id)
        })
    }

    fn fresh_allocation(&self, budget_id: i64, input: &NewAllocation) -> BudgetAllocation {
        BudgetAllocation {
            id: 0,
            budget_id,
            category_id: input.category_id,
            allocated_amount: input.allocated_amount,
            spent_amount: 0.0,
            remaining_amount: input.allocated_amount,
            daily_limit: 0.0,
            current_daily_limit: 0.0,
            last_calculated_at: None,
            last_rollover_date: None,
            alert_threshold: input
                .alert_threshold
                .unwrap_or(self.settings.default_alert_threshold),
            is_over_budget: false,
        }
    }

    // =========================================================================
    // Expenses
    // =========================================================================

    /// Record an expense and bring its allocation and budget up to date
    ///
    /// An expense dated in a month without a budget goes to the current one.
    pub fn create_expense(&self, input: &NewExpense, today: NaiveDate) -> Result<ExpenseSummary> {
        validate_amount(input.amount)?;

        self.store.in_transaction(|repo| {
            owned_category(repo, input.user_id, input.category_id)?;
            let (budget, allocation) =
                resolve_allocation(repo, input.user_id, input.category_id, input.date, today)?;

            let id = repo.insert_expense(input, budget.id, allocation.id)?;
            let allocation = recompute_allocation(repo, allocation.id)?;
            let budget = recompute_budget(repo, budget.id)?;
            let expense = required_expense(repo, id)?;

            info!(
                "Recorded expense {} of {:.2} for user {} (allocation {}: {:.2}/{:.2})",
                id,
                expense.amount,
                expense.user_id,
                allocation.id,
                allocation.spent_amount,
                allocation.allocated_amount
            );
            Ok(ExpenseSummary {
                expense,
                allocation,
                budget,
            })
        })
    }

    pub fn get_expense(&self, user_id: i64, expense_id: i64) -> Result<Expense> {
        self.store
            .read(|repo| owned_expense(repo, user_id, expense_id))
    }

    /// Expenses booked against a budget, newest first
    pub fn list_expenses(&self, user_id: i64, budget_id: i64) -> Result<Vec<Expense>> {
        self.store.read(|repo| {
            owned_budget(repo, user_id, budget_id)?;
            repo.list_expenses(budget_id)
        })
    }

    /// Change an expense, moving it to another allocation when its category or month changes
    pub fn update_expense(
        &self,
        user_id: i64,
        expense_id: i64,
        update: &ExpenseUpdate,
        today: NaiveDate,
    ) -> Result<ExpenseSummary> {
        if let Some(amount) = update.amount {
            validate_amount(amount)?;
        }

        self.store.in_transaction(|repo| {
            let mut expense = owned_expense(repo, user_id, expense_id)?;
            let old_budget_id = expense.budget_id;
            let old_allocation_id = expense.allocation_id;
            let old_month = (expense.date.year(), expense.date.month());

            if let Some(amount) = update.amount {
                expense.amount = amount;
            }
            if let Some(date) = update.date {
                expense.date = date;
            }
            if let Some(category_id) = update.category_id {
                owned_category(repo, user_id, category_id)?;
                expense.category_id = category_id;
            }
            if let Some(description) = &update.description {
                expense.description = Some(description.clone());
            }
            if let Some(status) = update.status {
                expense.status = status;
            }

            let moved = update.category_id.is_some()
                || old_month != (expense.date.year(), expense.date.month());
            if moved {
                let (budget, allocation) =
                    resolve_allocation(repo, user_id, expense.category_id, expense.date, today)?;
                expense.budget_id = budget.id;
                expense.allocation_id = allocation.id;
            }
            repo.update_expense(&expense)?;

            if expense.allocation_id != old_allocation_id {
                debug!(
                    "Expense {} moved from allocation {} to {}",
                    expense_id, old_allocation_id, expense.allocation_id
                );
                recompute_allocation(repo, old_allocation_id)?;
            }
            if expense.budget_id != old_budget_id {
                recompute_budget(repo, old_budget_id)?;
            }
            let allocation = recompute_allocation(repo, expense.allocation_id)?;
            let budget = recompute_budget(repo, expense.budget_id)?;

            Ok(ExpenseSummary {
                expense,
                allocation,
                budget,
            })
        })
    }

    /// Delete an expense; the summary holds the deleted row and the recomputed aggregates
    pub fn delete_expense(&self, user_id: i64, expense_id: i64) -> Result<ExpenseSummary> {
        self.store.in_transaction(|repo| {
            let expense = owned_expense(repo, user_id, expense_id)?;
            repo.delete_expense(expense_id)?;
            let allocation = recompute_allocation(repo, expense.allocation_id)?;
            let budget = recompute_budget(repo, expense.budget_id)?;
            info!("Deleted expense {} ({:.2})", expense_id, expense.amount);
            Ok(ExpenseSummary {
                expense,
                allocation,
                budget,
            })
        })
    }

    // =========================================================================
    // Rollover and dashboard
    // =========================================================================

    /// Carry yesterday's unspent daily allowance forward for the current month
    ///
    /// When the month has no budget yet and last month's budget asks for it,
    /// a copy with fresh counters is created first. Each allocation is rolled
    /// at most once per day.
    pub fn process_daily_rollover(&self, user_id: i64, today: NaiveDate) -> Result<RolloverReport> {
        self.store.in_transaction(|repo| {
            let mut report = RolloverReport {
                user_id,
                ..Default::default()
            };

            let budget = match repo.find_budget(user_id, today.year(), today.month())? {
                Some(budget) => budget,
                None => match self.auto_create_from_previous(repo, user_id, today)? {
                    Some(budget) => {
                        report.created_budget = true;
                        budget
                    }
                    None => {
                        debug!("No budget to roll over for user {} on {}", user_id, today);
                        return Ok(report);
                    }
                },
            };
            report.budget_id = Some(budget.id);
            if !budget.is_active {
                debug!("Budget {} is inactive, skipping rollover", budget.id);
                return Ok(report);
            }

            let remaining_days = daily_limit::remaining_days(&budget, today);
            // Day one of the month has no yesterday inside this budget
            let yesterday = today.pred_opt().filter(|d| budget.covers(*d));
            let now = Utc::now();

            for allocation in repo.list_allocations(budget.id)? {
                if allocation.last_rollover_date == Some(today) {
                    report.allocations_skipped += 1;
                    continue;
                }

                let mut allocation = recompute_allocation(repo, allocation.id)?;
                if let Some(day) = yesterday {
                    let spent = repo.sum_confirmed_expenses_on(user_id, allocation.category_id, day)?;
                    let carried = daily_limit::carry_over(&mut allocation, spent);
                    if carried > 0.0 {
                        debug!(
                            "Allocation {}: carried {:.2} into today's limit",
                            allocation.id, carried
                        );
                    }
                    report.total_carried_over += carried;
                }
                daily_limit::refresh(&mut allocation, remaining_days, now);
                allocation.last_rollover_date = Some(today);
                repo.update_allocation(&allocation)?;
                report.allocations_processed += 1;
            }
            recompute_budget(repo, budget.id)?;

            info!(
                "Rollover for user {}: {} allocations, {} skipped, {:.2} carried over",
                user_id,
                report.allocations_processed,
                report.allocations_skipped,
                report.total_carried_over
            );
            Ok(report)
        })
    }

    fn auto_create_from_previous(
        &self,
        repo: &dyn LedgerRepository,
        user_id: i64,
        today: NaiveDate,
    ) -> Result<Option<Budget>> {
        let (year, month) = previous_month(today.year(), today.month());
        let previous = match repo.find_budget(user_id, year, month)? {
            Some(b) if b.auto_create_next && b.is_active => b,
            _ => return Ok(None),
        };

        let budget_id = repo.insert_budget(
            user_id,
            today.year(),
            today.month(),
            previous.total_amount,
            previous.auto_create_next,
        )?;
        for a in repo.list_allocations(previous.id)? {
            let input = NewAllocation {
                category_id: a.category_id,
                allocated_amount: a.allocated_amount,
                alert_threshold: Some(a.alert_threshold),
            };
            repo.insert_allocation(&self.fresh_allocation(budget_id, &input))?;
        }
        info!(
            "Auto-created budget {} for user {} ({}-{:02}) from budget {}",
            budget_id,
            user_id,
            today.year(),
            today.month(),
            previous.id
        );
        required_budget(repo, budget_id).map(Some)
    }

    /// Current budget with refreshed limits and its alerts
    pub fn dashboard(&self, user_id: i64, today: NaiveDate) -> Result<Dashboard> {
        let budget = self.get_current_budget(user_id, today)?;
        let alerts = self.alerts.evaluate_budget(&budget);
        Ok(Dashboard { budget, alerts })
    }
}

// =============================================================================
// Unit-of-work helpers
// =============================================================================

/// Budget and allocation an expense of `category_id` on `date` is booked against
///
/// The budget for the expense's month wins; otherwise the active budget of
/// the month containing `today`.
fn resolve_allocation(
    repo: &dyn LedgerRepository,
    user_id: i64,
    category_id: i64,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<(Budget, BudgetAllocation)> {
    let budget = match repo.find_budget(user_id, date.year(), date.month())? {
        Some(b) => b,
        None => repo
            .find_budget(user_id, today.year(), today.month())?
            .filter(|b| b.is_active)
            .ok_or(Error::BudgetNotFound {
                user_id,
                year: date.year(),
                month: date.month(),
            })?,
    };
    let allocation = repo
        .find_allocation(budget.id, category_id)?
        .ok_or(Error::CategoryNotAllocated {
            budget_id: budget.id,
            category_id,
        })?;
    Ok((budget, allocation))
}

fn recompute_allocation(repo: &dyn LedgerRepository, allocation_id: i64) -> Result<BudgetAllocation> {
    let mut allocation = repo
        .get_allocation(allocation_id)?
        .ok_or_else(|| Error::NotFound(format!("allocation {}", allocation_id)))?;
    let spent = repo.sum_allocation_expenses(allocation_id)?;
    allocation.apply_spent(spent);
    repo.update_allocation(&allocation)?;
    Ok(allocation)
}

fn recompute_budget(repo: &dyn LedgerRepository, budget_id: i64) -> Result<Budget> {
    let mut budget = required_budget(repo, budget_id)?;
    let spent: f64 = repo
        .list_allocations(budget_id)?
        .iter()
        .map(|a| a.spent_amount)
        .sum();
    budget.apply_spent(spent);
    repo.update_budget(&budget)?;
    Ok(budget)
}

/// Refresh daily limits of every allocation and assemble the summary
fn refresh_summary(
    repo: &dyn LedgerRepository,
    budget: Budget,
    today: NaiveDate,
) -> Result<BudgetSummary> {
    let remaining_days = daily_limit::remaining_days(&budget, today);
    let now = Utc::now();

    let mut allocations = Vec::new();
    for mut allocation in repo.list_allocations(budget.id)? {
        daily_limit::refresh(&mut allocation, remaining_days, now);
        repo.update_allocation(&allocation)?;

        let category_name = repo
            .get_category(allocation.category_id)?
            .map(|c| c.name)
            .unwrap_or_default();
        let progress_percent = allocation.progress_percent();
        allocations.push(AllocationSummary {
            allocation,
            category_name,
            progress_percent,
        });
    }

    Ok(BudgetSummary {
        budget,
        allocations,
        remaining_days,
    })
}

fn required_budget(repo: &dyn LedgerRepository, id: i64) -> Result<Budget> {
    repo.get_budget(id)?
        .ok_or_else(|| Error::NotFound(format!("budget {}", id)))
}

fn required_expense(repo: &dyn LedgerRepository, id: i64) -> Result<Expense> {
    repo.get_expense(id)?
        .ok_or_else(|| Error::NotFound(format!("expense {}", id)))
}

fn owned_budget(repo: &dyn LedgerRepository, user_id: i64, id: i64) -> Result<Budget> {
    let budget = required_budget(repo, id)?;
    if budget.user_id != user_id {
        return Err(Error::PermissionDenied(format!(
            "budget {} belongs to another user",
            id
        )));
    }
    Ok(budget)
}

fn owned_category(repo: &dyn LedgerRepository, user_id: i64, id: i64) -> Result<Category> {
    let category = repo
        .get_category(id)?
        .ok_or_else(|| Error::NotFound(format!("category {}", id)))?;
    if category.user_id != user_id {
        return Err(Error::PermissionDenied(format!(
            "category {} belongs to another user",
            id
        )));
    }
    Ok(category)
}

fn owned_expense(repo: &dyn LedgerRepository, user_id: i64, id: i64) -> Result<Expense> {
    let expense = required_expense(repo, id)?;
    if expense.user_id != user_id {
        return Err(Error::PermissionDenied(format!(
            "expense {} belongs to another user",
            id
        )));
    }
    Ok(expense)
}

fn allocated_total(allocations: &[BudgetAllocation]) -> f64 {
    allocations.iter().map(|a| a.allocated_amount).sum()
}

fn ensure_within_total(allocated: f64, total: f64) -> Result<()> {
    if allocated > total + AMOUNT_EPSILON {
        return Err(Error::AllocationsExceedBudget { allocated, total });
    }
    Ok(())
}

fn validate_amount(amount: f64) -> Result<()> {
    if amount > 0.0 && amount.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidAmount(amount))
    }
}

/// Allocations may be zero, never negative
fn validate_allocated(amount: f64) -> Result<()> {
    if amount >= 0.0 && amount.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidAmount(amount))
    }
}

fn validate_threshold(threshold: f64) -> Result<()> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(Error::InvalidData(format!(
            "alert_threshold must be between 0 and 1, got {}",
            threshold
        )))
    }
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}
