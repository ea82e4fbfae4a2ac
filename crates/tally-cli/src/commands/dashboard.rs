//! Dashboard command

use anyhow::Result;
use tally_core::models::AlertSeverity;
use tally_core::{BudgetLedger, Config, Database};

use super::{print_budget, today};

pub fn cmd_dashboard(db: &Database, config: &Config, user_id: i64, json: bool) -> Result<()> {
    let ledger = BudgetLedger::new(db, config);
    let dashboard = ledger.dashboard(user_id, today())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    print_budget(&dashboard.budget);

    println!();
    if dashboard.alerts.is_empty() {
        println!("✅ No budget alerts");
        return Ok(());
    }

    println!("🚨 Alerts");
    for alert in &dashboard.alerts {
        let icon = match alert.severity {
            AlertSeverity::Danger => "🔴",
            AlertSeverity::Warning => "🟡",
        };
        println!("   {} {}", icon, alert.message);
    }
    Ok(())
}
