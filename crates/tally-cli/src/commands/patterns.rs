//! Notification pattern and classification commands

use anyhow::Result;
use tally_core::models::{
    NewNotificationPattern, NotificationChannel, NotificationPattern, PatternRules, PatternStatus,
};
use tally_core::{BudgetLedger, Config, Database, NotificationClassifier};

use super::{parse_date_arg, resolve_category, split_keywords, truncate};
use crate::cli::RuleArgs;

fn parse_channel(raw: &str) -> Result<NotificationChannel> {
    raw.parse().map_err(|e: String| anyhow::anyhow!(e))
}

/// Overlay the given rule arguments on `rules`
pub fn apply_rule_args(
    db: &Database,
    user_id: i64,
    rules: &mut PatternRules,
    args: &RuleArgs,
) -> Result<()> {
    if let Some(trigger) = &args.trigger {
        rules.keywords_trigger = split_keywords(trigger);
    }
    if let Some(exclude) = &args.exclude {
        rules.keywords_exclude = split_keywords(exclude);
    }
    if let Some(re) = &args.amount_regex {
        rules.amount_regex = Some(re.clone());
    }
    if let Some(re) = &args.date_regex {
        rules.date_regex = Some(re.clone());
    }
    if let Some(re) = &args.description_regex {
        rules.description_regex = Some(re.clone());
    }
    if let Some(re) = &args.merchant_regex {
        rules.merchant_regex = Some(re.clone());
    }
    if let Some(category) = &args.category {
        rules.category_id = Some(resolve_category(db, user_id, category)?);
    }
    if let Some(priority) = args.priority {
        rules.priority = priority;
    }
    if let Some(threshold) = args.threshold {
        rules.confidence_threshold = threshold;
    }
    if let Some(auto) = args.auto_approve {
        rules.auto_approve = auto;
    }
    if let Some(validate) = args.requires_validation {
        rules.requires_validation = validate;
    }
    if let Some(example) = &args.example {
        rules.example_message = Some(example.clone());
    }
    Ok(())
}

fn print_pattern(p: &NotificationPattern) {
    println!(
        "   {:>4}  {:<24} {:<6} {:<9} prio {:<3} {:>3} matches, {:>5.1}% ok{}",
        p.id,
        truncate(&p.rules.name, 24),
        p.channel,
        p.status,
        p.rules.priority,
        p.match_count,
        p.success_rate(),
        if p.is_default { "  [default]" } else { "" }
    );
}

pub fn cmd_patterns_list(db: &Database, user_id: i64, account: i64) -> Result<()> {
    let classifier = NotificationClassifier::new(db);
    let patterns = classifier.list_patterns(user_id, account)?;

    if patterns.is_empty() {
        println!("No patterns for account {}. Add one with 'tally patterns add'.", account);
        return Ok(());
    }

    println!();
    println!("🔎 Patterns (account {})", account);
    println!("   ─────────────────────────────────────────────────────────────");
    for p in &patterns {
        print_pattern(p);
    }
    Ok(())
}

pub fn cmd_patterns_add(
    db: &Database,
    user_id: i64,
    account: i64,
    name: &str,
    channel: &str,
    is_default: bool,
    args: &RuleArgs,
) -> Result<()> {
    let mut rules = PatternRules::new(name);
    apply_rule_args(db, user_id, &mut rules, args)?;

    let classifier = NotificationClassifier::new(db);
    let pattern = classifier.create_pattern(
        user_id,
        &NewNotificationPattern {
            bank_account_id: account,
            channel: parse_channel(channel)?,
            status: PatternStatus::Active,
            is_default,
            rules,
        },
    )?;

    println!("✅ Created pattern '{}' (id: {})", pattern.rules.name, pattern.id);
    Ok(())
}

pub fn cmd_patterns_update(
    db: &Database,
    user_id: i64,
    id: i64,
    name: Option<&str>,
    args: &RuleArgs,
) -> Result<()> {
    let classifier = NotificationClassifier::new(db);
    let mut rules = classifier.get_pattern(user_id, id)?.rules;
    if let Some(name) = name {
        rules.name = name.to_string();
    }
    apply_rule_args(db, user_id, &mut rules, args)?;

    let pattern = classifier.update_pattern(user_id, id, &rules)?;
    println!("✅ Updated pattern '{}' (id: {})", pattern.rules.name, pattern.id);
    Ok(())
}

pub fn cmd_patterns_show(db: &Database, user_id: i64, id: i64) -> Result<()> {
    let classifier = NotificationClassifier::new(db);
    let pattern = classifier.get_pattern(user_id, id)?;
    println!("{}", serde_json::to_string_pretty(&pattern)?);
    Ok(())
}

pub fn cmd_patterns_delete(db: &Database, user_id: i64, id: i64) -> Result<()> {
    NotificationClassifier::new(db).delete_pattern(user_id, id)?;
    println!("🗑️  Deleted pattern {}", id);
    Ok(())
}

pub fn cmd_patterns_status(db: &Database, user_id: i64, id: i64, status: &str) -> Result<()> {
    let status: PatternStatus = status.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let pattern = NotificationClassifier::new(db).set_pattern_status(user_id, id, status)?;
    println!("✅ Pattern '{}' is now {}", pattern.rules.name, pattern.status);
    Ok(())
}

pub fn cmd_patterns_default(db: &Database, user_id: i64, id: i64) -> Result<()> {
    let pattern = NotificationClassifier::new(db).set_default_pattern(user_id, id)?;
    println!(
        "✅ Pattern '{}' is the default for {} on account {}",
        pattern.rules.name, pattern.channel, pattern.bank_account_id
    );
    Ok(())
}

pub fn cmd_patterns_outcome(db: &Database, user_id: i64, id: i64, success: bool) -> Result<()> {
    let pattern = NotificationClassifier::new(db).record_pattern_outcome(user_id, id, success)?;
    println!(
        "✅ Pattern '{}': {} of {} classifications right ({:.1}%)",
        pattern.rules.name,
        pattern.success_count,
        pattern.match_count,
        pattern.success_rate()
    );
    Ok(())
}

pub fn cmd_patterns_test(db: &Database, user_id: i64, id: i64, message: &str) -> Result<()> {
    let test = NotificationClassifier::new(db).test_pattern(user_id, id, message)?;

    println!();
    println!(
        "🧪 Keywords {}",
        if test.admitted { "admit the message" } else { "do NOT admit the message" }
    );
    println!(
        "   Confidence {:.2} ({}/{} fields), auto-approve: {}, review: {}",
        test.extraction.confidence,
        test.extraction.successes,
        test.extraction.attempts,
        test.extraction.auto_approve,
        test.extraction.requires_validation
    );
    let fields = &test.extraction.fields;
    for (label, value) in [
        ("amount", &fields.amount),
        ("date", &fields.date),
        ("description", &fields.description),
        ("merchant", &fields.merchant),
    ] {
        if let Some(v) = value {
            println!("   {:<12} {}", label, v);
        }
    }
    if let Some(amount) = test.amount {
        println!("   parsed amount {:.2}", amount);
    }
    if let Some(date) = test.date {
        println!("   parsed date   {}", date);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_notify(
    db: &Database,
    config: &Config,
    user_id: i64,
    account: i64,
    channel: &str,
    message: &str,
    date: Option<&str>,
    record: bool,
    json: bool,
) -> Result<()> {
    let channel = parse_channel(channel)?;
    let received_on = parse_date_arg(date)?;
    let classifier = NotificationClassifier::new(db);

    let (result, expense) = if record {
        let ledger = BudgetLedger::new(db, config);
        let recorded =
            classifier.process_and_record(&ledger, user_id, account, channel, message, received_on)?;
        (recorded.result, recorded.expense)
    } else {
        let result =
            classifier.process_notification(user_id, account, channel, message, received_on)?;
        (result, None)
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "result": result,
                "expense": expense,
            }))?
        );
        return Ok(());
    }

    if !result.processed {
        println!("❔ No pattern matched this notification");
        return Ok(());
    }

    println!(
        "📨 Matched '{}' (confidence {:.2}, {} candidate{})",
        result.pattern_name.as_deref().unwrap_or(""),
        result.confidence,
        result.candidates,
        if result.candidates == 1 { "" } else { "s" }
    );
    if let Some(amount) = result.amount {
        println!("   Amount: {:.2} on {}", amount, result.date);
    }
    match expense {
        Some(summary) => println!(
            "   ✅ Booked expense {} against allocation {}",
            summary.expense.id, summary.allocation.id
        ),
        None if result.requires_validation => println!("   ⚠️  Needs review"),
        None => {}
    }
    Ok(())
}
