//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` / `load_config` - Shared setup for every command
//! - Argument parsing helpers (dates, months, categories)
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use tally_core::{Config, Database};

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).context("Failed to load config")
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a YYYY-MM-DD argument, defaulting to today
pub fn parse_date_arg(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s)),
        None => Ok(today()),
    }
}

/// Parse a YYYY-MM argument into (year, month)
pub fn parse_month(raw: &str) -> Result<(i32, u32)> {
    let (year, month) = raw
        .split_once('-')
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", raw))?;
    let year: i32 = year
        .parse()
        .with_context(|| format!("Invalid year in '{}'", raw))?;
    let month: u32 = month
        .parse()
        .with_context(|| format!("Invalid month in '{}'", raw))?;
    if !(1..=12).contains(&month) {
        bail!("Month must be between 1 and 12, got {}", month);
    }
    Ok((year, month))
}

/// Resolve a category given by ID or by name
pub fn resolve_category(db: &Database, user_id: i64, arg: &str) -> Result<i64> {
    if let Ok(id) = arg.parse::<i64>() {
        return Ok(id);
    }
    let category = db
        .find_category(user_id, arg)?
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Category not found: {}. Add it with 'tally categories add {}'",
                arg,
                arg
            )
        })?;
    Ok(category.id)
}

/// Split a comma-separated keyword list
pub fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add categories: tally categories add Groceries");
    println!("  2. Create a budget: tally budget create --month 2024-06 --total 1000 --alloc Groceries=300");
    println!("  3. Record spending: tally expense add Groceries 42.50");

    Ok(())
}
