//! Integration tests for tally-core
//!
//! These tests exercise the full notification → expense → budget → alert workflow.

use std::thread;

use chrono::NaiveDate;
use tally_core::{
    models::{
        AlertSeverity, BudgetAlertKind, ExpenseSource, ExpenseStatus, NewAllocation, NewBudget,
        NewExpense, NewNotificationPattern, NotificationChannel, PatternRules, PatternStatus,
    },
    BudgetLedger, Config, Database, LedgerStore, NotificationClassifier,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Fresh database with a "Groceries" category and a June 2024 budget of 1000
/// that gives Groceries 300. Returns (db, category_id, budget_id).
fn june_budget() -> (Database, i64, i64) {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    let groceries = db.upsert_category(1, "Groceries").unwrap();
    let config = Config::default();
    let ledger = BudgetLedger::new(&db, &config);

    let summary = ledger
        .create_budget(
            &NewBudget {
                user_id: 1,
                year: 2024,
                month: 6,
                total_amount: 1000.0,
                auto_create_next: false,
                allocations: vec![NewAllocation {
                    category_id: groceries,
                    allocated_amount: 300.0,
                    alert_threshold: None,
                }],
            },
            date(2024, 6, 1),
        )
        .expect("Failed to create budget");

    (db, groceries, summary.budget.id)
}

/// Day the June expenses are entered
fn mid_june() -> NaiveDate {
    date(2024, 6, 15)
}

fn groceries_expense(category_id: i64, amount: f64, on: NaiveDate) -> NewExpense {
    NewExpense {
        user_id: 1,
        category_id,
        amount,
        date: on,
        description: Some("Supermarket".into()),
        source: ExpenseSource::Manual,
        status: ExpenseStatus::Confirmed,
        pattern_id: None,
    }
}

// =============================================================================
// Budget scenarios
// =============================================================================

#[test]
fn test_spending_exactly_the_allocation_is_not_over_budget() {
    let (db, groceries, _) = june_budget();
    let config = Config::default();
    let ledger = BudgetLedger::new(&db, &config);

    for day in [3, 10, 17] {
        ledger
            .create_expense(&groceries_expense(groceries, 100.0, date(2024, 6, day)), mid_june())
            .unwrap();
    }

    let dashboard = ledger.dashboard(1, date(2024, 6, 18)).unwrap();
    let allocation = &dashboard.budget.allocations[0];
    assert_eq!(allocation.allocation.spent_amount, 300.0);
    assert_eq!(allocation.allocation.remaining_amount, 0.0);
    assert_eq!(allocation.progress_percent, 100.0);
    assert!(!allocation.allocation.is_over_budget);

    assert_eq!(dashboard.budget.budget.spent_amount, 300.0);
    assert_eq!(dashboard.budget.budget.remaining_amount, 700.0);

    // 100% is a danger alert, but not an over-budget one
    assert_eq!(dashboard.alerts.len(), 1);
    assert_eq!(dashboard.alerts[0].kind, BudgetAlertKind::NearLimit);
}

#[test]
fn test_spending_past_the_allocation_raises_over_budget_alert() {
    let (db, groceries, _) = june_budget();
    let config = Config::default();
    let ledger = BudgetLedger::new(&db, &config);

    for day in [3, 10, 17] {
        ledger
            .create_expense(&groceries_expense(groceries, 100.0, date(2024, 6, day)), mid_june())
            .unwrap();
    }
    let summary = ledger
        .create_expense(&groceries_expense(groceries, 50.0, date(2024, 6, 20)), mid_june())
        .unwrap();

    assert_eq!(summary.allocation.spent_amount, 350.0);
    assert_eq!(summary.allocation.remaining_amount, -50.0);
    assert!(summary.allocation.is_over_budget);

    let dashboard = ledger.dashboard(1, date(2024, 6, 20)).unwrap();
    let alert = &dashboard.alerts[0];
    assert_eq!(alert.kind, BudgetAlertKind::OverBudget);
    assert_eq!(alert.severity, AlertSeverity::Danger);
    assert_eq!(alert.category_name, "Groceries");
}

#[test]
fn test_budget_spent_matches_allocations_after_mixed_operations() {
    let (db, groceries, budget_id) = june_budget();
    let fuel = db.upsert_category(1, "Fuel").unwrap();
    let config = Config::default();
    let ledger = BudgetLedger::new(&db, &config);
    ledger
        .add_allocation(
            1,
            budget_id,
            &NewAllocation {
                category_id: fuel,
                allocated_amount: 200.0,
                alert_threshold: Some(0.7),
            },
            date(2024, 6, 1),
        )
        .unwrap();

    let a = ledger
        .create_expense(&groceries_expense(groceries, 45.25, date(2024, 6, 2)), mid_june())
        .unwrap();
    ledger
        .create_expense(&groceries_expense(fuel, 60.0, date(2024, 6, 2)), mid_june())
        .unwrap();
    ledger
        .create_expense(&groceries_expense(fuel, 20.0, date(2024, 6, 4)), mid_june())
        .unwrap();
    ledger.delete_expense(1, a.expense.id).unwrap();

    db.read(|repo| {
        let budget = repo.get_budget(budget_id)?.unwrap();
        let allocations = repo.list_allocations(budget_id)?;
        let allocated: f64 = allocations.iter().map(|a| a.allocated_amount).sum();
        let spent: f64 = allocations.iter().map(|a| a.spent_amount).sum();

        assert!(allocated <= budget.total_amount);
        assert_eq!(budget.spent_amount, spent);
        assert_eq!(budget.spent_amount, 80.0);
        for allocation in &allocations {
            assert_eq!(
                allocation.spent_amount,
                repo.sum_allocation_expenses(allocation.id)?
            );
            assert_eq!(
                allocation.remaining_amount,
                allocation.allocated_amount - allocation.spent_amount
            );
        }
        Ok(())
    })
    .unwrap();
}

#[test]
fn test_recompute_twice_changes_nothing() {
    let (db, groceries, budget_id) = june_budget();
    let config = Config::default();
    let ledger = BudgetLedger::new(&db, &config);
    ledger
        .create_expense(&groceries_expense(groceries, 33.3, date(2024, 6, 2)), mid_june())
        .unwrap();

    let first = ledger.recompute(1, budget_id).unwrap();
    let second = ledger.recompute(1, budget_id).unwrap();
    assert_eq!(first.spent_amount, second.spent_amount);
    assert_eq!(first.remaining_amount, second.remaining_amount);
}

#[test]
fn test_rollover_week() {
    let (db, groceries, _) = june_budget();
    let config = Config::default();
    let ledger = BudgetLedger::new(&db, &config);

    // 300 over 30 days: 10 per day
    let start = ledger.get_current_budget(1, date(2024, 6, 1)).unwrap();
    assert_eq!(start.allocations[0].allocation.current_daily_limit, 10.0);

    ledger
        .create_expense(&groceries_expense(groceries, 4.0, date(2024, 6, 1)), mid_june())
        .unwrap();
    let report = ledger.process_daily_rollover(1, date(2024, 6, 2)).unwrap();
    assert_eq!(report.total_carried_over, 6.0);

    let day2 = ledger.get_current_budget(1, date(2024, 6, 2)).unwrap();
    let allocation = &day2.allocations[0].allocation;
    // current >= previous current minus yesterday's spending
    assert!(allocation.current_daily_limit >= 10.0 - 4.0);
    assert_eq!(allocation.current_daily_limit, 16.0);
    assert_eq!(allocation.last_rollover_date, Some(date(2024, 6, 2)));

    // Overspending leaves the limit alone
    ledger
        .create_expense(&groceries_expense(groceries, 30.0, date(2024, 6, 2)), mid_june())
        .unwrap();
    let report = ledger.process_daily_rollover(1, date(2024, 6, 3)).unwrap();
    assert_eq!(report.total_carried_over, 0.0);
}

#[test]
fn test_daily_limit_is_zero_after_the_month() {
    let (db, _, _) = june_budget();
    let config = Config::default();
    let ledger = BudgetLedger::new(&db, &config);

    let july_view = ledger
        .get_budget_by_month(1, 2024, 6, date(2024, 7, 2))
        .unwrap();
    assert_eq!(july_view.remaining_days, 0);
    let allocation = &july_view.allocations[0].allocation;
    assert_eq!(allocation.daily_limit, 0.0);
    // Seeded on creation, untouched afterwards
    assert_eq!(allocation.current_daily_limit, 10.0);
}

// =============================================================================
// Notification workflow
// =============================================================================

#[test]
fn test_notification_to_expense_workflow() {
    let (db, groceries, _) = june_budget();
    let account = db.create_bank_account(1, "Debit", "Banco Uno").unwrap();
    let config = Config::default();
    let ledger = BudgetLedger::new(&db, &config);
    let classifier = NotificationClassifier::new(&db);

    let mut rules = PatternRules::new("Card purchase");
    rules.keywords_trigger = vec!["compra".into()];
    rules.keywords_exclude = vec!["rechazada".into()];
    rules.amount_regex = Some(r"\$([\d.,]+)".into());
    rules.date_regex = Some(r"(\d{2}/\d{2}/\d{4})".into());
    rules.merchant_regex = Some(r"en ([A-Z ]+?) el".into());
    rules.category_id = Some(groceries);
    rules.auto_approve = true;
    rules.requires_validation = false;
    let pattern = classifier
        .create_pattern(
            1,
            &NewNotificationPattern {
                bank_account_id: account,
                channel: NotificationChannel::Sms,
                status: PatternStatus::Active,
                is_default: false,
                rules,
            },
        )
        .unwrap();

    let recorded = classifier
        .process_and_record(
            &ledger,
            1,
            account,
            NotificationChannel::Sms,
            "Compra por $1,234.50 en SUPER MERCADO el 12/06/2024",
            date(2024, 6, 13),
        )
        .unwrap();
    assert!(recorded.result.auto_approve);
    assert!(!recorded.result.requires_validation);
    assert_eq!(recorded.result.date, date(2024, 6, 12));

    let summary = recorded.expense.expect("auto-approved expense");
    assert_eq!(summary.expense.amount, 1234.5);
    assert_eq!(summary.expense.date, date(2024, 6, 12));
    assert_eq!(summary.expense.description.as_deref(), Some("SUPER MERCADO"));
    assert!(summary.allocation.is_over_budget);

    let declined = classifier
        .process_and_record(
            &ledger,
            1,
            account,
            NotificationChannel::Sms,
            "Compra rechazada por $10.00",
            date(2024, 6, 13),
        )
        .unwrap();
    assert!(!declined.result.processed);
    assert!(declined.expense.is_none());

    // The user confirms the first classification was right
    let updated = classifier.record_pattern_outcome(1, pattern.id, true).unwrap();
    assert_eq!(updated.success_rate(), 100.0);
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_expenses_lose_no_updates() {
    let (db, groceries, budget_id) = june_budget();
    let threads = 8;
    let per_thread = 10;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let db = db.clone();
            thread::spawn(move || {
                let config = Config::default();
                let ledger = BudgetLedger::new(&db, &config);
                for i in 0..per_thread {
                    let day = 1 + ((t * per_thread + i) % 28) as u32;
                    ledger
                        .create_expense(&groceries_expense(groceries, 1.0, date(2024, 6, day)), mid_june())
                        .expect("concurrent expense");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let expected = (threads * per_thread) as f64;
    let (budget, allocation) = db
        .read(|repo| {
            let budget = repo.get_budget(budget_id)?.unwrap();
            let allocation = repo.list_allocations(budget_id)?.remove(0);
            Ok((budget, allocation))
        })
        .unwrap();
    assert_eq!(allocation.spent_amount, expected);
    assert_eq!(budget.spent_amount, expected);
    assert_eq!(budget.remaining_amount, 1000.0 - expected);
}

#[test]
fn test_rollover_interleaved_with_expenses() {
    let (db, groceries, budget_id) = june_budget();

    let writer = {
        let db = db.clone();
        thread::spawn(move || {
            let config = Config::default();
            let ledger = BudgetLedger::new(&db, &config);
            for _ in 0..20 {
                ledger
                    .create_expense(&groceries_expense(groceries, 2.0, date(2024, 6, 5)), mid_june())
                    .unwrap();
            }
        })
    };
    let roller = {
        let db = db.clone();
        thread::spawn(move || {
            let config = Config::default();
            let ledger = BudgetLedger::new(&db, &config);
            ledger.process_daily_rollover(1, date(2024, 6, 6)).unwrap()
        })
    };
    writer.join().unwrap();
    roller.join().unwrap();

    let allocation = db
        .read(|repo| Ok(repo.list_allocations(budget_id)?.remove(0)))
        .unwrap();
    assert_eq!(allocation.spent_amount, 40.0);
    assert_eq!(allocation.last_rollover_date, Some(date(2024, 6, 6)));
}
