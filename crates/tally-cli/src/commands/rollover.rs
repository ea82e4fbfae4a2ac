//! Daily rollover commands and the rollover scheduler
//!
//! `tally daemon` runs the rollover for every user with an active budget at
//! local midnight and every `[scheduler] rollover_interval_hours` after it
//! (or the `TALLY_ROLLOVER_INTERVAL_HOURS` environment variable). The first
//! run happens at startup so a missed day is caught up immediately.

use std::time::Duration;

use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use tally_core::models::RolloverReport;
use tally_core::{BudgetLedger, Config, Database};

use super::{parse_date_arg, today};

/// Roll over every user with an active budget; one user's failure does not stop the others
pub fn run_rollover_sweep(
    db: &Database,
    config: &Config,
    day: NaiveDate,
) -> Result<Vec<RolloverReport>> {
    let ledger = BudgetLedger::new(db, config);
    let mut reports = Vec::new();
    for user_id in db.list_users_with_active_budgets()? {
        match ledger.process_daily_rollover(user_id, day) {
            Ok(report) => reports.push(report),
            Err(e) => error!("Rollover failed for user {}: {}", user_id, e),
        }
    }
    Ok(reports)
}

fn print_report(report: &RolloverReport) {
    let Some(budget_id) = report.budget_id else {
        println!("   User {}: no budget for this month", report.user_id);
        return;
    };
    println!(
        "   User {}: budget {}{}, {} allocations rolled, {} already done, {:.2} carried over",
        report.user_id,
        budget_id,
        if report.created_budget { " (new)" } else { "" },
        report.allocations_processed,
        report.allocations_skipped,
        report.total_carried_over
    );
}

pub fn cmd_rollover(
    db: &Database,
    config: &Config,
    user_id: i64,
    all: bool,
    date: Option<&str>,
) -> Result<()> {
    let day = parse_date_arg(date)?;
    println!("🔄 Rolling over daily limits for {}...", day);

    let reports = if all {
        run_rollover_sweep(db, config, day)?
    } else {
        vec![BudgetLedger::new(db, config).process_daily_rollover(user_id, day)?]
    };

    for report in &reports {
        print_report(report);
    }
    println!("✅ Rollover complete");
    Ok(())
}

/// Time from `now` to the next scheduled sweep
///
/// Sweeps run at local midnight and then every `hours` within the day, so a
/// day's rollover always runs on that day whenever the daemon was started.
pub fn until_next_run(now: NaiveDateTime, hours: u64) -> Duration {
    let midnight = now.date().and_time(NaiveTime::MIN);
    let next_midnight = midnight + TimeDelta::days(1);
    let step = TimeDelta::hours(hours.clamp(1, 24) as i64);

    let mut next = midnight;
    while next <= now {
        next += step;
    }
    (next.min(next_midnight) - now).to_std().unwrap_or_default()
}

async fn run_scheduled_sweep(db: &Database, config: &Config) {
    let db = db.clone();
    let config = config.clone();
    let day = today();
    let sweep = tokio::task::spawn_blocking(move || run_rollover_sweep(&db, &config, day)).await;
    match sweep {
        Ok(Ok(reports)) => {
            let carried: f64 = reports.iter().map(|r| r.total_carried_over).sum();
            info!("Rollover for {}: {} users, {:.2} carried over", day, reports.len(), carried);
        }
        Ok(Err(e)) => error!("Rollover sweep failed: {}", e),
        Err(e) => error!("Rollover task panicked: {}", e),
    }
}

pub async fn cmd_daemon(db: Database, config: Config) -> Result<()> {
    let hours = config.scheduler.rollover_interval_hours;
    if hours == 0 {
        warn!("rollover_interval_hours is 0, nothing to schedule");
        return Ok(());
    }

    info!("Starting rollover scheduler: local midnight, then every {} hours", hours);
    // Catch up on today before waiting for the first boundary
    run_scheduled_sweep(&db, &config).await;

    loop {
        let wait = until_next_run(Local::now().naive_local(), hours);
        debug!("Next rollover sweep in {} minutes", wait.as_secs() / 60);
        tokio::select! {
            _ = sleep(wait) => run_scheduled_sweep(&db, &config).await,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down rollover scheduler");
                return Ok(());
            }
        }
    }
}
