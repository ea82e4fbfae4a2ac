//! Budget and allocation commands

use anyhow::{Context, Result};
use chrono::Datelike;
use tally_core::models::{AllocationUpdate, BudgetSummary, BudgetUpdate, NewAllocation, NewBudget};
use tally_core::{BudgetLedger, Config, Database};

use super::{parse_month, resolve_category, today};

/// Parse `CATEGORY=AMOUNT` or `CATEGORY=AMOUNT@THRESHOLD`
pub fn parse_allocation(raw: &str) -> Result<(String, f64, Option<f64>)> {
    let (category, rest) = raw
        .split_once('=')
        .with_context(|| format!("Invalid allocation '{}', expected CATEGORY=AMOUNT", raw))?;
    let (amount, threshold) = match rest.split_once('@') {
        Some((amount, threshold)) => (amount, Some(threshold)),
        None => (rest, None),
    };
    let amount: f64 = amount
        .trim()
        .parse()
        .with_context(|| format!("Invalid amount in allocation '{}'", raw))?;
    let threshold = threshold
        .map(|t| t.trim().parse::<f64>())
        .transpose()
        .with_context(|| format!("Invalid threshold in allocation '{}'", raw))?;
    Ok((category.trim().to_string(), amount, threshold))
}

pub fn print_budget(summary: &BudgetSummary) {
    let budget = &summary.budget;
    println!();
    println!(
        "💰 Budget {}-{:02} (id: {}){}",
        budget.year,
        budget.month,
        budget.id,
        if budget.is_active { "" } else { " [inactive]" }
    );
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Spent {:.2} of {:.2}, {:.2} left, {} days to go",
        budget.spent_amount, budget.total_amount, budget.remaining_amount, summary.remaining_days
    );
    println!();

    if summary.allocations.is_empty() {
        println!("   No allocations. Add one with 'tally budget allocate'.");
        return;
    }

    for a in &summary.allocations {
        let marker = if a.allocation.is_over_budget { "🔴" } else { "  " };
        println!(
            "   {} {:<20} {:>9.2} / {:>9.2}  {:>5.1}%  today {:>8.2}  (alloc {})",
            marker,
            a.category_name,
            a.allocation.spent_amount,
            a.allocation.allocated_amount,
            a.progress_percent,
            a.allocation.current_daily_limit,
            a.allocation.id
        );
    }
}

pub fn cmd_budget_show(
    db: &Database,
    config: &Config,
    user_id: i64,
    month: Option<&str>,
    json: bool,
) -> Result<()> {
    let today = today();
    let (year, month) = match month {
        Some(m) => parse_month(m)?,
        None => (today.year(), today.month()),
    };

    let ledger = BudgetLedger::new(db, config);
    let summary = ledger.get_budget_by_month(user_id, year, month, today)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_budget(&summary);
    }
    Ok(())
}

pub fn cmd_budget_create(
    db: &Database,
    config: &Config,
    user_id: i64,
    month: &str,
    total: f64,
    allocations: &[String],
    auto_next: bool,
) -> Result<()> {
    let (year, month) = parse_month(month)?;

    let mut parsed = Vec::with_capacity(allocations.len());
    for raw in allocations {
        let (category, amount, threshold) = parse_allocation(raw)?;
        parsed.push(NewAllocation {
            category_id: resolve_category(db, user_id, &category)?,
            allocated_amount: amount,
            alert_threshold: threshold,
        });
    }

    let ledger = BudgetLedger::new(db, config);
    let summary = ledger.create_budget(
        &NewBudget {
            user_id,
            year,
            month,
            total_amount: total,
            auto_create_next: auto_next,
            allocations: parsed,
        },
        today(),
    )?;

    println!("✅ Created budget {}-{:02} (id: {})", year, month, summary.budget.id);
    print_budget(&summary);
    Ok(())
}

pub fn cmd_budget_update(
    db: &Database,
    config: &Config,
    user_id: i64,
    budget_id: i64,
    total: Option<f64>,
    is_active: Option<bool>,
    auto_next: Option<bool>,
) -> Result<()> {
    let ledger = BudgetLedger::new(db, config);
    let summary = ledger.update_budget(
        user_id,
        budget_id,
        &BudgetUpdate {
            total_amount: total,
            is_active,
            auto_create_next: auto_next,
        },
        today(),
    )?;

    println!("✅ Updated budget {}", budget_id);
    print_budget(&summary);
    Ok(())
}

pub fn cmd_budget_allocate(
    db: &Database,
    config: &Config,
    user_id: i64,
    budget_id: i64,
    category: &str,
    amount: f64,
    threshold: Option<f64>,
) -> Result<()> {
    let category_id = resolve_category(db, user_id, category)?;
    let ledger = BudgetLedger::new(db, config);
    let summary = ledger.add_allocation(
        user_id,
        budget_id,
        &NewAllocation {
            category_id,
            allocated_amount: amount,
            alert_threshold: threshold,
        },
        today(),
    )?;

    println!("✅ Allocated {:.2} to {}", amount, category);
    print_budget(&summary);
    Ok(())
}

pub fn cmd_budget_set_allocation(
    db: &Database,
    config: &Config,
    user_id: i64,
    allocation_id: i64,
    amount: Option<f64>,
    threshold: Option<f64>,
) -> Result<()> {
    let ledger = BudgetLedger::new(db, config);
    let summary = ledger.update_allocation(
        user_id,
        allocation_id,
        &AllocationUpdate {
            allocated_amount: amount,
            alert_threshold: threshold,
        },
        today(),
    )?;

    println!("✅ Updated allocation {}", allocation_id);
    print_budget(&summary);
    Ok(())
}

pub fn cmd_budget_recompute(
    db: &Database,
    config: &Config,
    user_id: i64,
    budget_id: i64,
) -> Result<()> {
    let ledger = BudgetLedger::new(db, config);
    let budget = ledger.recompute(user_id, budget_id)?;
    println!(
        "✅ Budget {}: spent {:.2}, remaining {:.2}",
        budget.id, budget.spent_amount, budget.remaining_amount
    );
    Ok(())
}
