//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use chrono::{Datelike, NaiveDate};
use tally_core::db::Database;
use tally_core::models::{ExpenseSource, ExpenseStatus, PatternStatus};
use tally_core::{BudgetLedger, Config, NotificationClassifier};

use crate::cli::RuleArgs;
use crate::commands::{self, truncate};

const USER: i64 = 1;

fn setup_test_db() -> Database {
    let db = Database::in_memory().unwrap();
    db.upsert_category(USER, "Groceries").unwrap();
    db.upsert_category(USER, "Transport").unwrap();
    db
}

fn month_of(date: NaiveDate) -> String {
    format!("{}-{:02}", date.year(), date.month())
}

/// Create a budget through the CLI and return its ID
fn create_budget(db: &Database, month: &str) -> i64 {
    let config = Config::default();
    commands::cmd_budget_create(
        db,
        &config,
        USER,
        month,
        1000.0,
        &["Groceries=300".to_string(), "Transport=200@0.5".to_string()],
        false,
    )
    .unwrap();

    let (year, month) = commands::parse_month(month).unwrap();
    let ledger = BudgetLedger::new(db, &config);
    ledger
        .get_budget_by_month(USER, year, month, commands::today())
        .unwrap()
        .budget
        .id
}

fn sms_rules(category: &str) -> RuleArgs {
    RuleArgs {
        trigger: Some("compra, cargo".to_string()),
        exclude: Some("rechazada".to_string()),
        amount_regex: Some(r"\$([\d.,]+)".to_string()),
        merchant_regex: Some(r"en ([A-Z ]+)".to_string()),
        category: Some(category.to_string()),
        threshold: Some(0.5),
        auto_approve: Some(true),
        requires_validation: Some(false),
        ..Default::default()
    }
}

// ========== Setup Command Tests ==========

#[test]
fn test_cmd_init_and_open_db() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tally.db");

    commands::cmd_init(&path, true).unwrap();
    assert!(path.exists());

    let db = commands::open_db(&path, true).unwrap();
    db.upsert_category(USER, "Groceries").unwrap();
    assert_eq!(db.list_categories(USER).unwrap().len(), 1);
}

#[test]
fn test_load_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tally.toml");
    std::fs::write(&path, "[alerts]\ndanger_percent = 95.0\n").unwrap();

    let config = commands::load_config(Some(&path)).unwrap();
    assert_eq!(config.alerts.danger_percent, 95.0);
}

#[test]
fn test_load_config_rejects_bad_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tally.toml");
    std::fs::write(&path, "[alerts\n").unwrap();

    assert!(commands::load_config(Some(&path)).is_err());
}

// ========== Argument Parsing Tests ==========

#[test]
fn test_parse_month() {
    assert_eq!(commands::parse_month("2024-06").unwrap(), (2024, 6));
    assert_eq!(commands::parse_month("2024-12").unwrap(), (2024, 12));
    assert!(commands::parse_month("2024-13").is_err());
    assert!(commands::parse_month("2024").is_err());
    assert!(commands::parse_month("june").is_err());
}

#[test]
fn test_parse_date_arg() {
    assert_eq!(
        commands::parse_date_arg(Some("2024-06-15")).unwrap(),
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    );
    assert_eq!(commands::parse_date_arg(None).unwrap(), commands::today());
    assert!(commands::parse_date_arg(Some("15/06/2024")).is_err());
}

#[test]
fn test_parse_allocation() {
    let (category, amount, threshold) = commands::parse_allocation("Groceries=300").unwrap();
    assert_eq!(category, "Groceries");
    assert_eq!(amount, 300.0);
    assert_eq!(threshold, None);

    let (category, amount, threshold) =
        commands::parse_allocation(" Eating Out = 120.5@0.9").unwrap();
    assert_eq!(category, "Eating Out");
    assert_eq!(amount, 120.5);
    assert_eq!(threshold, Some(0.9));

    assert!(commands::parse_allocation("Groceries").is_err());
    assert!(commands::parse_allocation("Groceries=lots").is_err());
    assert!(commands::parse_allocation("Groceries=10@high").is_err());
}

#[test]
fn test_split_keywords() {
    assert_eq!(
        commands::split_keywords("compra, cargo ,,  pago"),
        vec!["compra", "cargo", "pago"]
    );
    assert!(commands::split_keywords(" , ").is_empty());
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("exactly10!", 10), "exactly10!");
    assert_eq!(truncate("this is a long description", 10), "this is...");
    // Multi-byte characters are counted, not bytes
    assert_eq!(truncate("café au lait", 7), "café...");
}

#[test]
fn test_resolve_category() {
    let db = setup_test_db();
    let by_name = commands::resolve_category(&db, USER, "groceries").unwrap();
    let category = db.find_category(USER, "Groceries").unwrap().unwrap();
    assert_eq!(by_name, category.id);

    assert_eq!(commands::resolve_category(&db, USER, "42").unwrap(), 42);
    assert!(commands::resolve_category(&db, USER, "Nope").is_err());
}

// ========== Catalog Command Tests ==========

#[test]
fn test_cmd_categories_add_and_list() {
    let db = setup_test_db();
    commands::cmd_categories_add(&db, USER, "Rent").unwrap();
    commands::cmd_categories_list(&db, USER).unwrap();

    let names: Vec<String> = db
        .list_categories(USER)
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert!(names.contains(&"Rent".to_string()));
}

#[test]
fn test_cmd_categories_add_empty_fails() {
    let db = setup_test_db();
    assert!(commands::cmd_categories_add(&db, USER, "   ").is_err());
}

#[test]
fn test_cmd_accounts_add_and_list() {
    let db = setup_test_db();
    commands::cmd_accounts_add(&db, USER, "Checking", "BBVA").unwrap();
    commands::cmd_accounts_list(&db, USER).unwrap();

    let accounts = db.list_bank_accounts(USER).unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].bank, "BBVA");
}

// ========== Budget Command Tests ==========

#[test]
fn test_cmd_budget_create_and_show() {
    let db = setup_test_db();
    let config = Config::default();
    let month = month_of(commands::today());
    create_budget(&db, &month);

    assert!(commands::cmd_budget_show(&db, &config, USER, None, false).is_ok());
    assert!(commands::cmd_budget_show(&db, &config, USER, Some(&month), true).is_ok());
}

#[test]
fn test_cmd_budget_create_rejects_overallocation() {
    let db = setup_test_db();
    let config = Config::default();
    let result = commands::cmd_budget_create(
        &db,
        &config,
        USER,
        "2030-03",
        100.0,
        &["Groceries=80".to_string(), "Transport=40".to_string()],
        false,
    );
    assert!(result.is_err());
}

#[test]
fn test_cmd_budget_create_unknown_category() {
    let db = setup_test_db();
    let config = Config::default();
    let result = commands::cmd_budget_create(
        &db,
        &config,
        USER,
        "2030-03",
        100.0,
        &["Rent=50".to_string()],
        false,
    );
    assert!(result.is_err());
}

#[test]
fn test_cmd_budget_show_missing_month() {
    let db = setup_test_db();
    let config = Config::default();
    assert!(commands::cmd_budget_show(&db, &config, USER, Some("1999-01"), false).is_err());
}

#[test]
fn test_cmd_budget_update_and_allocate() {
    let db = setup_test_db();
    let config = Config::default();
    db.upsert_category(USER, "Fun").unwrap();
    let budget_id = create_budget(&db, "2030-03");

    commands::cmd_budget_update(&db, &config, USER, budget_id, Some(1200.0), None, Some(true))
        .unwrap();
    commands::cmd_budget_allocate(&db, &config, USER, budget_id, "Fun", 150.0, Some(0.7))
        .unwrap();

    let ledger = BudgetLedger::new(&db, &config);
    let summary = ledger
        .get_budget_by_month(USER, 2030, 3, commands::today())
        .unwrap();
    assert_eq!(summary.budget.total_amount, 1200.0);
    assert!(summary.budget.auto_create_next);
    assert_eq!(summary.allocations.len(), 3);

    // 300 + 200 + 150 already allocated, 600 more does not fit in 1200
    assert!(
        commands::cmd_budget_allocate(&db, &config, USER, budget_id, "Fun", 600.0, None).is_err()
    );
}

#[test]
fn test_cmd_budget_set_allocation() {
    let db = setup_test_db();
    let config = Config::default();
    let budget_id = create_budget(&db, "2030-03");

    let ledger = BudgetLedger::new(&db, &config);
    let summary = ledger
        .get_budget_by_month(USER, 2030, 3, commands::today())
        .unwrap();
    let groceries = summary
        .allocations
        .iter()
        .find(|a| a.category_name == "Groceries")
        .unwrap()
        .allocation
        .id;

    commands::cmd_budget_set_allocation(&db, &config, USER, groceries, Some(350.0), Some(0.6))
        .unwrap();
    commands::cmd_budget_recompute(&db, &config, USER, budget_id).unwrap();

    let summary = ledger
        .get_budget_by_month(USER, 2030, 3, commands::today())
        .unwrap();
    let updated = summary
        .allocations
        .iter()
        .find(|a| a.allocation.id == groceries)
        .unwrap();
    assert_eq!(updated.allocation.allocated_amount, 350.0);
    assert_eq!(updated.allocation.alert_threshold, 0.6);
}

#[test]
fn test_cmd_budget_other_user_denied() {
    let db = setup_test_db();
    let config = Config::default();
    let budget_id = create_budget(&db, "2030-03");
    assert!(commands::cmd_budget_recompute(&db, &config, 2, budget_id).is_err());
}

// ========== Expense Command Tests ==========

#[test]
fn test_cmd_expense_add_updates_aggregates() {
    let db = setup_test_db();
    let config = Config::default();
    let budget_id = create_budget(&db, "2030-03");

    commands::cmd_expense_add(
        &db,
        &config,
        USER,
        "Groceries",
        42.5,
        Some("2030-03-05"),
        Some("Weekly shop".to_string()),
        false,
    )
    .unwrap();
    commands::cmd_expense_list(&db, &config, USER, Some(budget_id)).unwrap();

    let ledger = BudgetLedger::new(&db, &config);
    let expenses = ledger.list_expenses(USER, budget_id).unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].source, ExpenseSource::Manual);
    assert_eq!(expenses[0].status, ExpenseStatus::Confirmed);

    let budget = ledger.recompute(USER, budget_id).unwrap();
    assert_eq!(budget.spent_amount, 42.5);
    assert_eq!(budget.remaining_amount, 957.5);
}

#[test]
fn test_cmd_expense_add_without_budget_fails() {
    let db = setup_test_db();
    let config = Config::default();
    let result = commands::cmd_expense_add(
        &db,
        &config,
        USER,
        "Groceries",
        10.0,
        Some("1999-01-01"),
        None,
        false,
    );
    assert!(result.is_err());
}

#[test]
fn test_cmd_expense_update_and_delete() {
    let db = setup_test_db();
    let config = Config::default();
    let budget_id = create_budget(&db, "2030-03");

    commands::cmd_expense_add(
        &db,
        &config,
        USER,
        "Groceries",
        50.0,
        Some("2030-03-05"),
        None,
        true,
    )
    .unwrap();
    let ledger = BudgetLedger::new(&db, &config);
    let id = ledger.list_expenses(USER, budget_id).unwrap()[0].id;
    assert_eq!(ledger.get_expense(USER, id).unwrap().status, ExpenseStatus::Pending);

    commands::cmd_expense_update(
        &db,
        &config,
        USER,
        id,
        commands::ExpenseChanges {
            amount: Some(80.0),
            category: Some("Transport".to_string()),
            status: Some("confirmed".to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    commands::cmd_expense_show(&db, &config, USER, id).unwrap();

    let expense = ledger.get_expense(USER, id).unwrap();
    assert_eq!(expense.amount, 80.0);
    assert_eq!(expense.status, ExpenseStatus::Confirmed);
    assert_eq!(
        expense.category_id,
        db.find_category(USER, "Transport").unwrap().unwrap().id
    );

    commands::cmd_expense_delete(&db, &config, USER, id).unwrap();
    assert!(ledger.get_expense(USER, id).is_err());
    assert_eq!(ledger.recompute(USER, budget_id).unwrap().spent_amount, 0.0);
}

#[test]
fn test_cmd_expense_update_bad_status() {
    let db = setup_test_db();
    let config = Config::default();
    let budget_id = create_budget(&db, "2030-03");
    commands::cmd_expense_add(
        &db,
        &config,
        USER,
        "Groceries",
        5.0,
        Some("2030-03-05"),
        None,
        false,
    )
    .unwrap();
    let ledger = BudgetLedger::new(&db, &config);
    let id = ledger.list_expenses(USER, budget_id).unwrap()[0].id;

    let result = commands::cmd_expense_update(
        &db,
        &config,
        USER,
        id,
        commands::ExpenseChanges {
            status: Some("lost".to_string()),
            ..Default::default()
        },
    );
    assert!(result.is_err());
}

// ========== Pattern Command Tests ==========

#[test]
fn test_cmd_patterns_add_list_show() {
    let db = setup_test_db();
    let account = db.create_bank_account(USER, "Checking", "BBVA").unwrap();

    commands::cmd_patterns_add(
        &db,
        USER,
        account,
        "Card purchase",
        "sms",
        true,
        &sms_rules("Groceries"),
    )
    .unwrap();
    commands::cmd_patterns_list(&db, USER, account).unwrap();

    let classifier = NotificationClassifier::new(&db);
    let patterns = classifier.list_patterns(USER, account).unwrap();
    assert_eq!(patterns.len(), 1);
    let pattern = &patterns[0];
    assert!(pattern.is_default);
    assert_eq!(pattern.rules.keywords_trigger, vec!["compra", "cargo"]);
    assert_eq!(pattern.rules.keywords_exclude, vec!["rechazada"]);
    assert!(pattern.rules.auto_approve);
    assert!(!pattern.rules.requires_validation);

    commands::cmd_patterns_show(&db, USER, pattern.id).unwrap();
}

#[test]
fn test_cmd_patterns_add_bad_channel() {
    let db = setup_test_db();
    let account = db.create_bank_account(USER, "Checking", "BBVA").unwrap();
    let result = commands::cmd_patterns_add(
        &db,
        USER,
        account,
        "Pigeon",
        "pigeon",
        false,
        &RuleArgs::default(),
    );
    assert!(result.is_err());
}

#[test]
fn test_cmd_patterns_add_invalid_regex() {
    let db = setup_test_db();
    let account = db.create_bank_account(USER, "Checking", "BBVA").unwrap();
    let rules = RuleArgs {
        amount_regex: Some(r"\$([\d".to_string()),
        ..Default::default()
    };
    let result = commands::cmd_patterns_add(&db, USER, account, "Broken", "sms", false, &rules);
    assert!(result.is_err());
}

#[test]
fn test_cmd_patterns_update_keeps_unset_rules() {
    let db = setup_test_db();
    let account = db.create_bank_account(USER, "Checking", "BBVA").unwrap();
    commands::cmd_patterns_add(
        &db,
        USER,
        account,
        "Card purchase",
        "sms",
        false,
        &sms_rules("Groceries"),
    )
    .unwrap();
    let classifier = NotificationClassifier::new(&db);
    let id = classifier.list_patterns(USER, account).unwrap()[0].id;

    let changes = RuleArgs {
        priority: Some(5),
        ..Default::default()
    };
    commands::cmd_patterns_update(&db, USER, id, Some("Purchases"), &changes).unwrap();

    let pattern = classifier.get_pattern(USER, id).unwrap();
    assert_eq!(pattern.rules.name, "Purchases");
    assert_eq!(pattern.rules.priority, 5);
    assert_eq!(pattern.rules.keywords_trigger, vec!["compra", "cargo"]);
    assert!(pattern.rules.amount_regex.is_some());
}

#[test]
fn test_cmd_patterns_status_default_outcome() {
    let db = setup_test_db();
    let account = db.create_bank_account(USER, "Checking", "BBVA").unwrap();
    for name in ["First", "Second"] {
        commands::cmd_patterns_add(&db, USER, account, name, "sms", false, &RuleArgs::default())
            .unwrap();
    }
    let classifier = NotificationClassifier::new(&db);
    let ids: Vec<i64> = classifier
        .list_patterns(USER, account)
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();

    commands::cmd_patterns_status(&db, USER, ids[0], "learning").unwrap();
    assert_eq!(
        classifier.get_pattern(USER, ids[0]).unwrap().status,
        PatternStatus::Learning
    );
    assert!(commands::cmd_patterns_status(&db, USER, ids[0], "sleeping").is_err());

    commands::cmd_patterns_default(&db, USER, ids[0]).unwrap();
    commands::cmd_patterns_default(&db, USER, ids[1]).unwrap();
    assert!(!classifier.get_pattern(USER, ids[0]).unwrap().is_default);
    assert!(classifier.get_pattern(USER, ids[1]).unwrap().is_default);

    commands::cmd_patterns_outcome(&db, USER, ids[1], true).unwrap();
    commands::cmd_patterns_outcome(&db, USER, ids[1], false).unwrap();
    let pattern = classifier.get_pattern(USER, ids[1]).unwrap();
    assert_eq!(pattern.match_count, 2);
    assert_eq!(pattern.success_count, 1);
}

#[test]
fn test_cmd_patterns_test_and_delete() {
    let db = setup_test_db();
    let account = db.create_bank_account(USER, "Checking", "BBVA").unwrap();
    commands::cmd_patterns_add(
        &db,
        USER,
        account,
        "Card purchase",
        "sms",
        false,
        &sms_rules("Groceries"),
    )
    .unwrap();
    let classifier = NotificationClassifier::new(&db);
    let id = classifier.list_patterns(USER, account).unwrap()[0].id;

    commands::cmd_patterns_test(&db, USER, id, "Compra por $1.250,50 en SUPER LA ESQUINA").unwrap();

    commands::cmd_patterns_delete(&db, USER, id).unwrap();
    assert!(classifier.get_pattern(USER, id).is_err());
    assert!(commands::cmd_patterns_test(&db, USER, id, "Compra").is_err());
}

#[test]
fn test_cmd_patterns_other_user_denied() {
    let db = setup_test_db();
    let account = db.create_bank_account(USER, "Checking", "BBVA").unwrap();
    assert!(commands::cmd_patterns_list(&db, 2, account).is_err());
}

// ========== Notify Command Tests ==========

#[test]
fn test_cmd_notify_without_record() {
    let db = setup_test_db();
    let config = Config::default();
    let account = db.create_bank_account(USER, "Checking", "BBVA").unwrap();
    let budget_id = create_budget(&db, "2030-03");
    commands::cmd_patterns_add(
        &db,
        USER,
        account,
        "Card purchase",
        "sms",
        false,
        &sms_rules("Groceries"),
    )
    .unwrap();

    commands::cmd_notify(
        &db,
        &config,
        USER,
        account,
        "sms",
        "Compra por $500 en SUPER",
        Some("2030-03-07"),
        false,
        false,
    )
    .unwrap();

    let ledger = BudgetLedger::new(&db, &config);
    assert!(ledger.list_expenses(USER, budget_id).unwrap().is_empty());
}

#[test]
fn test_cmd_notify_record_books_expense() {
    let db = setup_test_db();
    let config = Config::default();
    let account = db.create_bank_account(USER, "Checking", "BBVA").unwrap();
    let budget_id = create_budget(&db, "2030-03");
    commands::cmd_patterns_add(
        &db,
        USER,
        account,
        "Card purchase",
        "sms",
        false,
        &sms_rules("Groceries"),
    )
    .unwrap();

    commands::cmd_notify(
        &db,
        &config,
        USER,
        account,
        "sms",
        "Compra por $500 en SUPER",
        Some("2030-03-07"),
        true,
        true,
    )
    .unwrap();

    let ledger = BudgetLedger::new(&db, &config);
    let expenses = ledger.list_expenses(USER, budget_id).unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].amount, 500.0);
    assert_eq!(expenses[0].source, ExpenseSource::Notification);
    assert_eq!(expenses[0].description.as_deref(), Some("SUPER"));
    assert!(expenses[0].pattern_id.is_some());
}

#[test]
fn test_cmd_notify_excluded_message_not_booked() {
    let db = setup_test_db();
    let config = Config::default();
    let account = db.create_bank_account(USER, "Checking", "BBVA").unwrap();
    let budget_id = create_budget(&db, "2030-03");
    commands::cmd_patterns_add(
        &db,
        USER,
        account,
        "Card purchase",
        "sms",
        false,
        &sms_rules("Groceries"),
    )
    .unwrap();

    commands::cmd_notify(
        &db,
        &config,
        USER,
        account,
        "sms",
        "Compra RECHAZADA por $500",
        Some("2030-03-07"),
        true,
        false,
    )
    .unwrap();

    let ledger = BudgetLedger::new(&db, &config);
    assert!(ledger.list_expenses(USER, budget_id).unwrap().is_empty());
}

// ========== Rollover and Dashboard Tests ==========

#[test]
fn test_cmd_rollover_single_user() {
    let db = setup_test_db();
    let config = Config::default();
    create_budget(&db, "2030-03");

    commands::cmd_rollover(&db, &config, USER, false, Some("2030-03-10")).unwrap();
    // Second run the same day is a no-op
    commands::cmd_rollover(&db, &config, USER, false, Some("2030-03-10")).unwrap();

    let ledger = BudgetLedger::new(&db, &config);
    let report = ledger
        .process_daily_rollover(USER, NaiveDate::from_ymd_opt(2030, 3, 10).unwrap())
        .unwrap();
    assert_eq!(report.allocations_processed, 0);
    assert_eq!(report.allocations_skipped, 2);
}

#[test]
fn test_run_rollover_sweep_all_users() {
    let db = setup_test_db();
    let config = Config::default();
    create_budget(&db, "2030-03");
    db.upsert_category(2, "Groceries").unwrap();
    let ledger = BudgetLedger::new(&db, &config);
    ledger
        .create_budget(
            &tally_core::models::NewBudget {
                user_id: 2,
                year: 2030,
                month: 3,
                total_amount: 500.0,
                auto_create_next: false,
                allocations: vec![],
            },
            NaiveDate::from_ymd_opt(2030, 3, 1).unwrap(),
        )
        .unwrap();

    let day = NaiveDate::from_ymd_opt(2030, 3, 10).unwrap();
    let reports = commands::run_rollover_sweep(&db, &config, day).unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.budget_id.is_some()));

    assert!(commands::cmd_rollover(&db, &config, USER, true, Some("2030-03-11")).is_ok());
}

#[test]
fn test_until_next_run_aligns_to_local_midnight() {
    use std::time::Duration;

    let at = |h, m| {
        NaiveDate::from_ymd_opt(2030, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    };

    // Daily sweeps wait for midnight, not for a day after startup
    assert_eq!(commands::until_next_run(at(15, 30), 24), Duration::from_secs(8 * 3600 + 30 * 60));
    assert_eq!(commands::until_next_run(at(0, 0), 24), Duration::from_secs(24 * 3600));

    // Shorter intervals count from midnight
    assert_eq!(commands::until_next_run(at(7, 0), 6), Duration::from_secs(5 * 3600));
    assert_eq!(commands::until_next_run(at(23, 0), 5), Duration::from_secs(3600));

    // Longer intervals still run every midnight
    assert_eq!(commands::until_next_run(at(12, 0), 48), Duration::from_secs(12 * 3600));
}

#[test]
fn test_cmd_dashboard() {
    let db = setup_test_db();
    let config = Config::default();

    // No budget for this month yet
    assert!(commands::cmd_dashboard(&db, &config, USER, false).is_err());

    let today = commands::today();
    create_budget(&db, &month_of(today));
    commands::cmd_expense_add(
        &db,
        &config,
        USER,
        "Groceries",
        290.0,
        Some(&today.format("%Y-%m-%d").to_string()),
        None,
        false,
    )
    .unwrap();

    assert!(commands::cmd_dashboard(&db, &config, USER, false).is_ok());
    assert!(commands::cmd_dashboard(&db, &config, USER, true).is_ok());

    let ledger = BudgetLedger::new(&db, &config);
    let dashboard = ledger.dashboard(USER, today).unwrap();
    assert_eq!(dashboard.alerts.len(), 1);
    assert_eq!(dashboard.alerts[0].category_name, "Groceries");
}
