//! Budget alert evaluation

use crate::config::AlertSettings;
use crate::models::{
    AlertSeverity, BudgetAlert, BudgetAlertKind, BudgetAllocation, BudgetSummary,
};

/// Turns allocation state into dashboard alerts
#[derive(Debug, Clone, Default)]
pub struct AlertGenerator {
    settings: AlertSettings,
}

impl AlertGenerator {
    pub fn new(settings: AlertSettings) -> Self {
        Self { settings }
    }

    /// Alert for one allocation, if any condition holds
    ///
    /// Precedence: over budget, then danger percent, then the allocation's threshold.
    pub fn evaluate(&self, allocation: &BudgetAllocation, category_name: &str) -> Option<BudgetAlert> {
        let progress = allocation.progress_percent();

        let (kind, severity, message) = if allocation.is_over_budget {
            (
                BudgetAlertKind::OverBudget,
                AlertSeverity::Danger,
                format!(
                    "{} is over budget: spent {:.2} of {:.2}",
                    category_name, allocation.spent_amount, allocation.allocated_amount
                ),
            )
        } else if progress >= self.settings.danger_percent {
            (
                BudgetAlertKind::NearLimit,
                AlertSeverity::Danger,
                format!("{} has used {:.0}% of its budget", category_name, progress),
            )
        } else if allocation.should_alert() {
            (
                BudgetAlertKind::Threshold,
                AlertSeverity::Warning,
                format!(
                    "{} reached {:.0}% of its budget (alert at {:.0}%)",
                    category_name,
                    progress,
                    allocation.alert_threshold * 100.0
                ),
            )
        } else {
            return None;
        };

        Some(BudgetAlert {
            allocation_id: allocation.id,
            category_id: allocation.category_id,
            category_name: category_name.to_string(),
            allocated_amount: allocation.allocated_amount,
            spent_amount: allocation.spent_amount,
            progress_percent: progress,
            kind,
            severity,
            message,
        })
    }

    /// Alerts for every allocation of a budget, most urgent first
    pub fn evaluate_budget(&self, summary: &BudgetSummary) -> Vec<BudgetAlert> {
        let mut alerts: Vec<BudgetAlert> = summary
            .allocations
            .iter()
            .filter_map(|a| self.evaluate(&a.allocation, &a.category_name))
            .collect();

        alerts.sort_by(|a, b| {
            let rank = |s: AlertSeverity| match s {
                AlertSeverity::Danger => 0,
                AlertSeverity::Warning => 1,
            };
            rank(a.severity)
                .cmp(&rank(b.severity))
                .then(b.progress_percent.total_cmp(&a.progress_percent))
        });
        alerts
    }
}
