//! Tally CLI - Expense classification and budget tracking
//!
//! Usage:
//!   tally init                                Initialize database
//!   tally budget create --month 2024-06 ...   Create a monthly budget
//!   tally expense add Groceries 42.50         Record an expense
//!   tally notify --account 1 "Compra $500"    Classify a bank notification
//!   tally daemon                              Run the daily rollover on a schedule

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    if let Commands::Init = cli.command {
        return commands::cmd_init(&cli.db, cli.no_encrypt);
    }

    let db = commands::open_db(&cli.db, cli.no_encrypt)?;
    let config = commands::load_config(cli.config.as_deref())?;
    let user = cli.user;

    match cli.command {
        Commands::Init => Ok(()),
        Commands::Categories { action } => match action {
            None | Some(CategoriesAction::List) => commands::cmd_categories_list(&db, user),
            Some(CategoriesAction::Add { name }) => commands::cmd_categories_add(&db, user, &name),
        },
        Commands::Accounts { action } => match action {
            None | Some(AccountsAction::List) => commands::cmd_accounts_list(&db, user),
            Some(AccountsAction::Add { name, bank }) => {
                commands::cmd_accounts_add(&db, user, &name, &bank)
            }
        },
        Commands::Budget { action } => match action {
            None => commands::cmd_budget_show(&db, &config, user, None, false),
            Some(BudgetAction::Show { month, json }) => {
                commands::cmd_budget_show(&db, &config, user, month.as_deref(), json)
            }
            Some(BudgetAction::Create {
                month,
                total,
                allocations,
                auto_next,
            }) => commands::cmd_budget_create(
                &db,
                &config,
                user,
                &month,
                total,
                &allocations,
                auto_next,
            ),
            Some(BudgetAction::Update {
                id,
                total,
                deactivate,
                activate,
                auto_next,
            }) => {
                let active = match (activate, deactivate) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                };
                commands::cmd_budget_update(&db, &config, user, id, total, active, auto_next)
            }
            Some(BudgetAction::Allocate {
                budget_id,
                category,
                amount,
                threshold,
            }) => commands::cmd_budget_allocate(
                &db, &config, user, budget_id, &category, amount, threshold,
            ),
            Some(BudgetAction::SetAllocation {
                id,
                amount,
                threshold,
            }) => commands::cmd_budget_set_allocation(&db, &config, user, id, amount, threshold),
            Some(BudgetAction::Recompute { id }) => {
                commands::cmd_budget_recompute(&db, &config, user, id)
            }
        },
        Commands::Expense { action } => match action {
            ExpenseAction::Add {
                category,
                amount,
                date,
                description,
                pending,
            } => commands::cmd_expense_add(
                &db,
                &config,
                user,
                &category,
                amount,
                date.as_deref(),
                description,
                pending,
            ),
            ExpenseAction::List { budget } => {
                commands::cmd_expense_list(&db, &config, user, budget)
            }
            ExpenseAction::Show { id } => commands::cmd_expense_show(&db, &config, user, id),
            ExpenseAction::Update {
                id,
                amount,
                date,
                category,
                description,
                status,
            } => commands::cmd_expense_update(
                &db,
                &config,
                user,
                id,
                commands::ExpenseChanges {
                    amount,
                    date,
                    category,
                    description,
                    status,
                },
            ),
            ExpenseAction::Delete { id } => commands::cmd_expense_delete(&db, &config, user, id),
        },
        Commands::Patterns { action } => match action {
            PatternsAction::List { account } => commands::cmd_patterns_list(&db, user, account),
            PatternsAction::Add {
                account,
                name,
                channel,
                default,
                rules,
            } => commands::cmd_patterns_add(&db, user, account, &name, &channel, default, &rules),
            PatternsAction::Update { id, name, rules } => {
                commands::cmd_patterns_update(&db, user, id, name.as_deref(), &rules)
            }
            PatternsAction::Show { id } => commands::cmd_patterns_show(&db, user, id),
            PatternsAction::Delete { id } => commands::cmd_patterns_delete(&db, user, id),
            PatternsAction::Status { id, status } => {
                commands::cmd_patterns_status(&db, user, id, &status)
            }
            PatternsAction::Default { id } => commands::cmd_patterns_default(&db, user, id),
            PatternsAction::Outcome { id, failed } => {
                commands::cmd_patterns_outcome(&db, user, id, !failed)
            }
            PatternsAction::Test { id, message } => {
                commands::cmd_patterns_test(&db, user, id, &message)
            }
        },
        Commands::Notify {
            account,
            channel,
            date,
            record,
            json,
            message,
        } => commands::cmd_notify(
            &db,
            &config,
            user,
            account,
            &channel,
            &message,
            date.as_deref(),
            record,
            json,
        ),
        Commands::Rollover { all, date } => {
            commands::cmd_rollover(&db, &config, user, all, date.as_deref())
        }
        Commands::Daemon => commands::cmd_daemon(db, config).await,
        Commands::Dashboard { json } => commands::cmd_dashboard(&db, &config, user, json),
    }
}
