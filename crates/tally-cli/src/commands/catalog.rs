//! Category and bank account commands

use anyhow::Result;
use tally_core::Database;

pub fn cmd_categories_list(db: &Database, user_id: i64) -> Result<()> {
    let categories = db.list_categories(user_id)?;

    if categories.is_empty() {
        println!("No categories yet. Add one with 'tally categories add <name>'.");
        return Ok(());
    }

    println!();
    println!("📂 Categories");
    println!("   ─────────────────────────────────────────");
    for category in &categories {
        println!("   {:>4}  {}", category.id, category.name);
    }
    Ok(())
}

pub fn cmd_categories_add(db: &Database, user_id: i64, name: &str) -> Result<()> {
    let id = db.upsert_category(user_id, name)?;
    println!("✅ Category '{}' (id: {})", name.trim(), id);
    Ok(())
}

pub fn cmd_accounts_list(db: &Database, user_id: i64) -> Result<()> {
    let accounts = db.list_bank_accounts(user_id)?;

    if accounts.is_empty() {
        println!("No bank accounts yet. Add one with 'tally accounts add <name> --bank <bank>'.");
        return Ok(());
    }

    println!();
    println!("🏦 Bank accounts");
    println!("   ─────────────────────────────────────────");
    for account in &accounts {
        println!("   {:>4}  {} ({})", account.id, account.name, account.bank);
    }
    Ok(())
}

pub fn cmd_accounts_add(db: &Database, user_id: i64, name: &str, bank: &str) -> Result<()> {
    let id = db.create_bank_account(user_id, name, bank)?;
    println!("✅ Bank account '{}' (id: {})", name, id);
    Ok(())
}
