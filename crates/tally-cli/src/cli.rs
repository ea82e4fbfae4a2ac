//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Tally - Keep every budget in step with what you actually spend
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Expense classification and budget tracking", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "tally.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set TALLY_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// User whose data the command works on
    #[arg(long, default_value = "1", global = true)]
    pub user: i64,

    /// Config file (defaults to ~/.local/share/tally/config/tally.toml, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Manage spending categories
    Categories {
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// Manage bank accounts that send notifications
    Accounts {
        #[command(subcommand)]
        action: Option<AccountsAction>,
    },

    /// Manage monthly budgets and allocations
    Budget {
        #[command(subcommand)]
        action: Option<BudgetAction>,
    },

    /// Record and manage expenses
    Expense {
        #[command(subcommand)]
        action: ExpenseAction,
    },

    /// Manage notification patterns
    Patterns {
        #[command(subcommand)]
        action: PatternsAction,
    },

    /// Classify a bank notification
    Notify {
        /// Bank account the notification came from
        #[arg(short, long)]
        account: i64,

        /// Channel: sms, push, email, app
        #[arg(short, long, default_value = "sms")]
        channel: String,

        /// Day the notification arrived (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Book the expense when the pattern auto-approves
        #[arg(long)]
        record: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Notification text
        message: String,
    },

    /// Carry unspent daily allowance forward
    Rollover {
        /// Run for every user with an active budget
        #[arg(long)]
        all: bool,

        /// Day to roll over to (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Run the rollover on a schedule until interrupted
    Daemon,

    /// Show the current budget with alerts
    Dashboard {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List categories
    List,
    /// Add a category
    Add {
        /// Category name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum AccountsAction {
    /// List bank accounts
    List,
    /// Add a bank account
    Add {
        /// Account name
        name: String,
        /// Bank name
        #[arg(short, long)]
        bank: String,
    },
}

#[derive(Subcommand)]
pub enum BudgetAction {
    /// Show a month's budget (current month by default)
    Show {
        /// Month as YYYY-MM
        #[arg(short, long)]
        month: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a budget for a month
    Create {
        /// Month as YYYY-MM
        #[arg(short, long)]
        month: String,

        /// Total amount for the month
        #[arg(short, long)]
        total: f64,

        /// Allocation as CATEGORY=AMOUNT or CATEGORY=AMOUNT@THRESHOLD (repeatable)
        #[arg(short, long = "alloc")]
        allocations: Vec<String>,

        /// Copy this budget into the next month on rollover
        #[arg(long)]
        auto_next: bool,
    },

    /// Change a budget's total or flags
    Update {
        /// Budget ID
        id: i64,

        /// New total amount
        #[arg(short, long)]
        total: Option<f64>,

        /// Deactivate the budget
        #[arg(long, conflicts_with = "activate")]
        deactivate: bool,

        /// Reactivate the budget
        #[arg(long)]
        activate: bool,

        /// Copy into the next month on rollover (true/false)
        #[arg(long)]
        auto_next: Option<bool>,
    },

    /// Add a category allocation to a budget
    Allocate {
        /// Budget ID
        budget_id: i64,

        /// Category name or ID
        category: String,

        /// Amount to allocate
        amount: f64,

        /// Alert threshold (0-1)
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Change an allocation's amount or alert threshold
    SetAllocation {
        /// Allocation ID
        id: i64,

        /// New allocated amount
        #[arg(short, long)]
        amount: Option<f64>,

        /// New alert threshold (0-1)
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Re-sum all spending of a budget from its expenses
    Recompute {
        /// Budget ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum ExpenseAction {
    /// Record an expense
    Add {
        /// Category name or ID
        category: String,

        /// Amount spent
        amount: f64,

        /// Date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Description
        #[arg(long)]
        description: Option<String>,

        /// Record as pending instead of confirmed
        #[arg(long)]
        pending: bool,
    },

    /// List expenses of a budget (current month by default)
    List {
        /// Budget ID
        #[arg(short, long)]
        budget: Option<i64>,
    },

    /// Show one expense
    Show {
        /// Expense ID
        id: i64,
    },

    /// Change an expense
    Update {
        /// Expense ID
        id: i64,

        #[arg(short, long)]
        amount: Option<f64>,

        /// Date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,

        /// Category name or ID
        #[arg(short, long)]
        category: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Status: pending, confirmed, cancelled
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Delete an expense
    Delete {
        /// Expense ID
        id: i64,
    },
}

/// Matching and extraction rules shared by `patterns add` and `patterns update`
#[derive(Args, Default)]
pub struct RuleArgs {
    /// Keywords that make the pattern a candidate (comma-separated)
    #[arg(long)]
    pub trigger: Option<String>,

    /// Keywords that rule the pattern out (comma-separated)
    #[arg(long)]
    pub exclude: Option<String>,

    /// Regex for the amount (first capture group is used)
    #[arg(long)]
    pub amount_regex: Option<String>,

    /// Regex for the date
    #[arg(long)]
    pub date_regex: Option<String>,

    /// Regex for the description
    #[arg(long)]
    pub description_regex: Option<String>,

    /// Regex for the merchant
    #[arg(long)]
    pub merchant_regex: Option<String>,

    /// Category name or ID that auto-approved expenses are filed under
    #[arg(long)]
    pub category: Option<String>,

    /// Lower runs first
    #[arg(long)]
    pub priority: Option<i32>,

    /// Minimum confidence (0-1) for auto-approval
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Book expenses without review when confident enough (true/false)
    #[arg(long)]
    pub auto_approve: Option<bool>,

    /// Always ask for review (true/false)
    #[arg(long)]
    pub requires_validation: Option<bool>,

    /// Example notification text
    #[arg(long)]
    pub example: Option<String>,
}

#[derive(Subcommand)]
pub enum PatternsAction {
    /// List patterns of a bank account
    List {
        /// Bank account ID
        account: i64,
    },

    /// Add a pattern
    Add {
        /// Bank account ID
        account: i64,

        /// Pattern name
        name: String,

        /// Channel: sms, push, email, app
        #[arg(short, long, default_value = "sms")]
        channel: String,

        /// Use as fallback when no other pattern matches
        #[arg(long)]
        default: bool,

        #[command(flatten)]
        rules: RuleArgs,
    },

    /// Change a pattern's rules
    Update {
        /// Pattern ID
        id: i64,

        /// New name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        rules: RuleArgs,
    },

    /// Show a pattern
    Show {
        /// Pattern ID
        id: i64,
    },

    /// Delete a pattern
    Delete {
        /// Pattern ID
        id: i64,
    },

    /// Set a pattern's status: active, inactive, learning
    Status {
        /// Pattern ID
        id: i64,

        /// New status
        status: String,
    },

    /// Make a pattern the fallback for its account and channel
    Default {
        /// Pattern ID
        id: i64,
    },

    /// Record whether a classification was right
    Outcome {
        /// Pattern ID
        id: i64,

        /// The classification was wrong
        #[arg(long)]
        failed: bool,
    },

    /// Try a pattern against a message without recording anything
    Test {
        /// Pattern ID
        id: i64,

        /// Notification text
        message: String,
    },
}
