//! Domain models for Tally

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A spending category owned by a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A bank account that emits notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub bank: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Budgets
// =============================================================================

/// A user's spending ceiling for one calendar month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub year: i32,
    pub month: u32,
    pub total_amount: f64,
    pub spent_amount: f64,
    pub remaining_amount: f64,
    pub is_active: bool,
    /// Clone this budget into the following month when the month rolls over
    pub auto_create_next: bool,
    pub created_at: DateTime<Utc>,
}

impl Budget {
    /// Set the spent amount and derive the remaining amount from it
    pub fn apply_spent(&mut self, spent: f64) {
        self.spent_amount = spent;
        self.remaining_amount = self.total_amount - spent;
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.year == date.year() && self.month == date.month()
    }
}

/// A category's slice of a budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub id: i64,
    pub budget_id: i64,
    pub category_id: i64,
    pub allocated_amount: f64,
    pub spent_amount: f64,
    pub remaining_amount: f64,
    /// Base daily limit: remaining amount spread over the remaining days
    pub daily_limit: f64,
    /// Rollover-adjusted limit that is actually displayed and enforced
    pub current_daily_limit: f64,
    pub last_calculated_at: Option<DateTime<Utc>>,
    /// Day the last rollover was applied; guards against double application
    pub last_rollover_date: Option<NaiveDate>,
    /// Fraction of the allocation (0..=1) at which a warning is raised
    pub alert_threshold: f64,
    pub is_over_budget: bool,
}

impl BudgetAllocation {
    /// Set the spent amount and derive remaining/over-budget from it
    pub fn apply_spent(&mut self, spent: f64) {
        self.spent_amount = spent;
        self.remaining_amount = self.allocated_amount - spent;
        self.is_over_budget = spent > self.allocated_amount;
    }

    /// Spent as a percentage of allocated (0 when nothing is allocated)
    pub fn progress_percent(&self) -> f64 {
        if self.allocated_amount > 0.0 {
            self.spent_amount / self.allocated_amount * 100.0
        } else {
            0.0
        }
    }

    /// Whether spending has reached the alert threshold
    pub fn should_alert(&self) -> bool {
        self.allocated_amount > 0.0
            && self.spent_amount / self.allocated_amount >= self.alert_threshold
    }
}

/// Input for creating a budget together with its allocations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBudget {
    pub user_id: i64,
    pub year: i32,
    pub month: u32,
    pub total_amount: f64,
    #[serde(default)]
    pub auto_create_next: bool,
    #[serde(default)]
    pub allocations: Vec<NewAllocation>,
}

/// Input for one allocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAllocation {
    pub category_id: i64,
    pub allocated_amount: f64,
    /// Falls back to the configured default when absent
    pub alert_threshold: Option<f64>,
}

/// Partial update of budget settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetUpdate {
    pub total_amount: Option<f64>,
    pub is_active: Option<bool>,
    pub auto_create_next: Option<bool>,
}

/// Partial update of an allocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationUpdate {
    pub allocated_amount: Option<f64>,
    pub alert_threshold: Option<f64>,
}

/// An allocation with presentation details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationSummary {
    #[serde(flatten)]
    pub allocation: BudgetAllocation,
    pub category_name: String,
    pub progress_percent: f64,
}

/// A budget with its allocations, as returned to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSummary {
    #[serde(flatten)]
    pub budget: Budget,
    pub allocations: Vec<AllocationSummary>,
    pub remaining_days: u32,
}

/// Result of the daily rollover for one user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolloverReport {
    pub user_id: i64,
    pub budget_id: Option<i64>,
    /// A budget was auto-created from the previous month before rolling over
    pub created_budget: bool,
    pub allocations_processed: usize,
    /// Allocations already rolled over today
    pub allocations_skipped: usize,
    pub total_carried_over: f64,
}

// =============================================================================
// Expenses
// =============================================================================

/// Expense lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    Pending,
    #[default]
    Confirmed,
    Cancelled,
}

impl ExpenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for ExpenseStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown expense status: {}", s)),
        }
    }
}

impl std::fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an expense was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseSource {
    /// Manually entered
    #[default]
    Manual,
    /// Created from a classified bank notification
    Notification,
    /// Bulk imported
    Import,
}

impl ExpenseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Notification => "notification",
            Self::Import => "import",
        }
    }
}

impl std::str::FromStr for ExpenseSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "notification" => Ok(Self::Notification),
            "import" => Ok(Self::Import),
            _ => Err(format!("Unknown expense source: {}", s)),
        }
    }
}

impl std::fmt::Display for ExpenseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub user_id: i64,
    pub budget_id: i64,
    pub category_id: i64,
    pub allocation_id: i64,
    pub amount: f64,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub status: ExpenseStatus,
    pub source: ExpenseSource,
    /// Pattern that classified the notification this expense came from
    pub pattern_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Input for recording an expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
    pub user_id: i64,
    pub category_id: i64,
    pub amount: f64,
    pub date: NaiveDate,
    pub description: Option<String>,
    #[serde(default)]
    pub source: ExpenseSource,
    #[serde(default)]
    pub status: ExpenseStatus,
    pub pattern_id: Option<i64>,
}

/// Partial update of an expense
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseUpdate {
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub category_id: Option<i64>,
    pub description: Option<String>,
    pub status: Option<ExpenseStatus>,
}

/// An expense together with the aggregates it was booked against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub expense: Expense,
    pub allocation: BudgetAllocation,
    pub budget: Budget,
}

// =============================================================================
// Notification patterns
// =============================================================================

/// Channel a bank notification arrived through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Sms,
    Push,
    Email,
    App,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Push => "push",
            Self::Email => "email",
            Self::App => "app",
        }
    }
}

impl std::str::FromStr for NotificationChannel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sms" => Ok(Self::Sms),
            "push" => Ok(Self::Push),
            "email" => Ok(Self::Email),
            "app" => Ok(Self::App),
            _ => Err(format!("Unknown notification channel: {}", s)),
        }
    }
}

impl std::fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pattern lifecycle status. Only `active` patterns take part in matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PatternStatus {
    #[default]
    Active,
    Inactive,
    Learning,
}

impl PatternStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Learning => "learning",
        }
    }

    /// Allowed moves: active <-> inactive, active <-> learning
    pub fn can_transition_to(&self, next: PatternStatus) -> bool {
        matches!(
            (self, next),
            (Self::Active, Self::Inactive)
                | (Self::Inactive, Self::Active)
                | (Self::Active, Self::Learning)
                | (Self::Learning, Self::Active)
        )
    }
}

impl std::str::FromStr for PatternStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "learning" => Ok(Self::Learning),
            _ => Err(format!("Unknown pattern status: {}", s)),
        }
    }
}

impl std::fmt::Display for PatternStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The user-editable matching and extraction rules of a pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRules {
    pub name: String,
    /// Free-form description of the message shape
    pub message_pattern: Option<String>,
    pub example_message: Option<String>,
    /// Any of these (case-insensitive) makes the pattern a candidate; empty matches all
    #[serde(default)]
    pub keywords_trigger: Vec<String>,
    /// Any of these (case-insensitive) rules the pattern out
    #[serde(default)]
    pub keywords_exclude: Vec<String>,
    pub amount_regex: Option<String>,
    pub date_regex: Option<String>,
    pub description_regex: Option<String>,
    pub merchant_regex: Option<String>,
    /// Category that auto-approved expenses are filed under
    pub category_id: Option<i64>,
    #[serde(default = "default_true")]
    pub requires_validation: bool,
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default)]
    pub auto_approve: bool,
    /// Lower runs first
    #[serde(default)]
    pub priority: i32,
}

fn default_true() -> bool {
    true
}

fn default_confidence_threshold() -> f64 {
    0.8
}

impl PatternRules {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message_pattern: None,
            example_message: None,
            keywords_trigger: Vec::new(),
            keywords_exclude: Vec::new(),
            amount_regex: None,
            date_regex: None,
            description_regex: None,
            merchant_regex: None,
            category_id: None,
            requires_validation: true,
            confidence_threshold: default_confidence_threshold(),
            auto_approve: false,
            priority: 0,
        }
    }
}

/// A stored notification pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPattern {
    pub id: i64,
    pub bank_account_id: i64,
    pub channel: NotificationChannel,
    pub status: PatternStatus,
    pub is_default: bool,
    #[serde(flatten)]
    pub rules: PatternRules,
    pub match_count: i64,
    pub success_count: i64,
    pub created_at: DateTime<Utc>,
}

impl NotificationPattern {
    /// successCount / matchCount as a percentage (0 before the first match)
    pub fn success_rate(&self) -> f64 {
        if self.match_count > 0 {
            self.success_count as f64 / self.match_count as f64 * 100.0
        } else {
            0.0
        }
    }
}

/// Input for creating a pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotificationPattern {
    pub bank_account_id: i64,
    pub channel: NotificationChannel,
    #[serde(default)]
    pub status: PatternStatus,
    #[serde(default)]
    pub is_default: bool,
    #[serde(flatten)]
    pub rules: PatternRules,
}

// =============================================================================
// Alerts
// =============================================================================

/// How urgent a budget alert is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Danger,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which condition raised a budget alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetAlertKind {
    /// Spent more than allocated
    OverBudget,
    /// Progress at or above the danger percentage
    NearLimit,
    /// Progress at or above the allocation's alert threshold
    Threshold,
}

impl BudgetAlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OverBudget => "over_budget",
            Self::NearLimit => "near_limit",
            Self::Threshold => "threshold",
        }
    }
}

/// Alert descriptor for a dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetAlert {
    pub allocation_id: i64,
    pub category_id: i64,
    pub category_name: String,
    pub allocated_amount: f64,
    pub spent_amount: f64,
    pub progress_percent: f64,
    pub kind: BudgetAlertKind,
    pub severity: AlertSeverity,
    pub message: String,
}

/// Current budget plus its alerts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub budget: BudgetSummary,
    pub alerts: Vec<BudgetAlert>,
}
