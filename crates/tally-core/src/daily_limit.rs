//! Adaptive daily spending limits
//!
//! Each allocation carries two limits:
//! - `daily_limit`: what is left, spread evenly over the rest of the month
//! - `current_daily_limit`: the limit actually shown, which grows by whatever
//!   was left unspent the day before
//!
//! `current_daily_limit` is only seeded from `daily_limit` while it is still
//! exactly zero, so a carried-over allowance is never overwritten by a refresh.
//! It starts over only when a new budget is created for the next month.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::models::{Budget, BudgetAllocation};

/// Number of days in the given month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 0,
    }
}

/// Days left in the budget's month, counting today; 0 unless the budget is for today's month
pub fn remaining_days(budget: &Budget, today: NaiveDate) -> u32 {
    if !budget.covers(today) {
        return 0;
    }
    days_in_month(budget.year, budget.month) - today.day() + 1
}

/// Remaining amount spread over the remaining days, never negative
pub fn daily_limit(remaining_amount: f64, remaining_days: u32) -> f64 {
    if remaining_days == 0 {
        return 0.0;
    }
    (remaining_amount / remaining_days as f64).max(0.0)
}

/// Recompute the base limit and seed the current limit if it was never set
pub fn refresh(allocation: &mut BudgetAllocation, remaining_days: u32, now: DateTime<Utc>) {
    allocation.daily_limit = daily_limit(allocation.remaining_amount, remaining_days);
    if allocation.current_daily_limit == 0.0 {
        allocation.current_daily_limit = allocation.daily_limit;
    }
    allocation.last_calculated_at = Some(now);
}

/// Add yesterday's unspent allowance to the current limit
///
/// Returns the amount carried over (0 when yesterday used up its limit).
pub fn carry_over(allocation: &mut BudgetAllocation, yesterday_spent: f64) -> f64 {
    let unspent = allocation.current_daily_limit - yesterday_spent;
    if unspent > 0.0 {
        allocation.current_daily_limit += unspent;
        unspent
    } else {
        0.0
    }
}
