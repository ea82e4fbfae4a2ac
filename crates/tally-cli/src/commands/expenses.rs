//! Expense commands

use anyhow::Result;
use tally_core::models::{
    Expense, ExpenseStatus, ExpenseSummary, ExpenseUpdate, ExpenseSource, NewExpense,
};
use tally_core::{BudgetLedger, Config, Database};

use super::{parse_date_arg, resolve_category, today, truncate};

/// Raw `expense update` arguments
#[derive(Debug, Default)]
pub struct ExpenseChanges {
    pub amount: Option<f64>,
    pub date: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

fn print_expense_summary(summary: &ExpenseSummary) {
    let a = &summary.allocation;
    println!(
        "   Allocation {}: {:.2} / {:.2} spent ({:.1}%){}",
        a.id,
        a.spent_amount,
        a.allocated_amount,
        a.progress_percent(),
        if a.is_over_budget { "  🔴 over budget" } else { "" }
    );
    println!(
        "   Budget {}-{:02}: {:.2} left of {:.2}",
        summary.budget.year,
        summary.budget.month,
        summary.budget.remaining_amount,
        summary.budget.total_amount
    );
}

fn print_expense_row(e: &Expense) {
    println!(
        "   {:>5}  {}  {:>9.2}  {:<10} {:<12} {}",
        e.id,
        e.date,
        e.amount,
        e.status,
        e.source,
        truncate(e.description.as_deref().unwrap_or(""), 40)
    );
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_expense_add(
    db: &Database,
    config: &Config,
    user_id: i64,
    category: &str,
    amount: f64,
    date: Option<&str>,
    description: Option<String>,
    pending: bool,
) -> Result<()> {
    let input = NewExpense {
        user_id,
        category_id: resolve_category(db, user_id, category)?,
        amount,
        date: parse_date_arg(date)?,
        description,
        source: ExpenseSource::Manual,
        status: if pending {
            ExpenseStatus::Pending
        } else {
            ExpenseStatus::Confirmed
        },
        pattern_id: None,
    };

    let ledger = BudgetLedger::new(db, config);
    let summary = ledger.create_expense(&input, today())?;

    println!(
        "✅ Recorded {:.2} in {} on {} (id: {})",
        summary.expense.amount, category, summary.expense.date, summary.expense.id
    );
    print_expense_summary(&summary);
    Ok(())
}

pub fn cmd_expense_list(
    db: &Database,
    config: &Config,
    user_id: i64,
    budget_id: Option<i64>,
) -> Result<()> {
    let ledger = BudgetLedger::new(db, config);
    let budget_id = match budget_id {
        Some(id) => id,
        None => ledger.get_current_budget(user_id, today())?.budget.id,
    };

    let expenses = ledger.list_expenses(user_id, budget_id)?;
    if expenses.is_empty() {
        println!("No expenses in budget {}.", budget_id);
        return Ok(());
    }

    println!();
    println!("🧾 Expenses (budget {})", budget_id);
    println!("   ─────────────────────────────────────────────────────────────");
    for e in &expenses {
        print_expense_row(e);
    }
    Ok(())
}

pub fn cmd_expense_show(db: &Database, config: &Config, user_id: i64, id: i64) -> Result<()> {
    let ledger = BudgetLedger::new(db, config);
    let expense = ledger.get_expense(user_id, id)?;
    println!("{}", serde_json::to_string_pretty(&expense)?);
    Ok(())
}

pub fn cmd_expense_update(
    db: &Database,
    config: &Config,
    user_id: i64,
    id: i64,
    changes: ExpenseChanges,
) -> Result<()> {
    let status = changes
        .status
        .as_deref()
        .map(str::parse::<ExpenseStatus>)
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;
    let date = match changes.date.as_deref() {
        Some(d) => Some(parse_date_arg(Some(d))?),
        None => None,
    };
    let category_id = match changes.category.as_deref() {
        Some(c) => Some(resolve_category(db, user_id, c)?),
        None => None,
    };

    let update = ExpenseUpdate {
        amount: changes.amount,
        date,
        category_id,
        description: changes.description,
        status,
    };

    let ledger = BudgetLedger::new(db, config);
    let summary = ledger.update_expense(user_id, id, &update, today())?;
    println!("✅ Updated expense {}", id);
    print_expense_summary(&summary);
    Ok(())
}

pub fn cmd_expense_delete(db: &Database, config: &Config, user_id: i64, id: i64) -> Result<()> {
    let ledger = BudgetLedger::new(db, config);
    let summary = ledger.delete_expense(user_id, id)?;
    println!("🗑️  Deleted expense {} ({:.2})", id, summary.expense.amount);
    print_expense_summary(&summary);
    Ok(())
}
