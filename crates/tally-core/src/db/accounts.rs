//! Category and bank account operations

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{BankAccount, Category};

fn category_from_row(row: &Row) -> rusqlite::Result<Category> {
    let created_at: String = row.get(3)?;
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        created_at: parse_datetime(&created_at),
    })
}

pub(super) fn bank_account_from_row(row: &Row) -> rusqlite::Result<BankAccount> {
    let created_at: String = row.get(4)?;
    Ok(BankAccount {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        bank: row.get(3)?,
        created_at: parse_datetime(&created_at),
    })
}

impl Database {
    /// Create or get a category by name
    pub fn upsert_category(&self, user_id: i64, name: &str) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Category name cannot be empty".into()));
        }

        let conn = self.conn()?;
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM categories WHERE user_id = ? AND name = ?",
                params![user_id, name],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        conn.execute(
            "INSERT INTO categories (user_id, name) VALUES (?, ?)",
            params![user_id, name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a user's categories
    pub fn list_categories(&self, user_id: i64) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, created_at FROM categories WHERE user_id = ? ORDER BY name",
        )?;
        let categories = stmt
            .query_map(params![user_id], category_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// Find a user's category by name (case-insensitive)
    pub fn find_category(&self, user_id: i64, name: &str) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                "SELECT id, user_id, name, created_at FROM categories
                 WHERE user_id = ? AND name = ? COLLATE NOCASE",
                params![user_id, name.trim()],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    /// Register a bank account
    pub fn create_bank_account(&self, user_id: i64, name: &str, bank: &str) -> Result<i64> {
        if name.trim().is_empty() {
            return Err(Error::InvalidData("Account name cannot be empty".into()));
        }
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO bank_accounts (user_id, name, bank) VALUES (?, ?, ?)",
            params![user_id, name.trim(), bank.trim()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List a user's bank accounts
    pub fn list_bank_accounts(&self, user_id: i64) -> Result<Vec<BankAccount>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, bank, created_at FROM bank_accounts WHERE user_id = ? ORDER BY name",
        )?;
        let accounts = stmt
            .query_map(params![user_id], bank_account_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(accounts)
    }

    /// Users that own at least one active budget (for the rollover sweep)
    pub fn list_users_with_active_budgets(&self) -> Result<Vec<i64>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT user_id FROM budgets WHERE is_active = TRUE ORDER BY user_id",
        )?;
        let users = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }
}
