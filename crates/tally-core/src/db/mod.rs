//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `accounts` - Categories and bank accounts
//! - `ledger` - Budgets, allocations and expenses (the `LedgerRepository` port)
//! - `patterns` - Notification patterns (the `PatternRepository` port)

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::TransactionBehavior;
use tracing::info;

use crate::error::{Error, Result};
use crate::store::{LedgerRepository, LedgerStore};

mod accounts;
mod ledger;
mod patterns;


pub use ledger::SqlLedger;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "TALLY_DB_KEY";

/// How long a writer waits for the lock held by another unit of work
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Derive an encryption key from a passphrase using Argon2
///
/// Uses a fixed application salt so the same passphrase always produces the same key,
/// regardless of database path.
fn derive_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    // Changing this invalidates every existing encrypted database
    const APP_SALT: &[u8; 16] = b"tally-salt-v1-ok";

    let salt = SaltString::encode_b64(APP_SALT)
        .map_err(|e| Error::Encryption(format!("Failed to create salt: {}", e)))?;

    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Failed to derive key: {}", e)))?;

    let hash_str = hash
        .hash
        .ok_or_else(|| Error::Encryption("No hash output".to_string()))?;
    Ok(hex::encode(hash_str.as_bytes()))
}

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Parse a stored `YYYY-MM-DD` column
pub(crate) fn parse_date(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create a new encrypted database connection pool
    ///
    /// Requires the `TALLY_DB_KEY` environment variable. Use `new_unencrypted()`
    /// for development/testing without encryption.
    pub fn new(path: &str) -> Result<Self> {
        match std::env::var(DB_KEY_ENV).ok() {
            Some(key) => Self::new_with_key(path, Some(&key)),
            None => Err(Error::Encryption(format!(
                "Database encryption required. Set {} environment variable with your passphrase, \
                or use --no-encrypt for unencrypted databases.",
                DB_KEY_ENV
            ))),
        }
    }

    /// Create a new unencrypted database connection pool
    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::new_with_key(path, None)
    }

    /// Create a new database with an explicit encryption key
    pub fn new_with_key(path: &str, passphrase: Option<&str>) -> Result<Self> {
        let key_pragma = passphrase
            .map(derive_key)
            .transpose()?
            .map(|key| format!("PRAGMA key = 'x\"{}\"';", key));

        // Key must be set before anything else touches the connection
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            if let Some(pragma) = &key_pragma {
                conn.execute_batch(pragma)?;
            }
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });

        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self { pool };
        db.run_migrations()?;

        Ok(db)
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a temporary file rather than `:memory:` so every pooled connection
    /// sees the same data.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "tally_test_{}_{}.db",
            std::process::id(),
            id
        ));
        let path = path.to_string_lossy().into_owned();

        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path, suffix));
        }

        Self::new_unencrypted(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block the single writer
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;

            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, name)
            );

            CREATE TABLE IF NOT EXISTS bank_accounts (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                bank TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_bank_accounts_user ON bank_accounts(user_id);

            -- One budget per user and calendar month
            CREATE TABLE IF NOT EXISTS budgets (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                year INTEGER NOT NULL,
                month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
                total_amount REAL NOT NULL CHECK (total_amount >= 0),
                spent_amount REAL NOT NULL DEFAULT 0,
                remaining_amount REAL NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                auto_create_next BOOLEAN NOT NULL DEFAULT FALSE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, year, month)
            );

            CREATE INDEX IF NOT EXISTS idx_budgets_user_active ON budgets(user_id, is_active);

            CREATE TABLE IF NOT EXISTS budget_allocations (
                id INTEGER PRIMARY KEY,
                budget_id INTEGER NOT NULL REFERENCES budgets(id),
                category_id INTEGER NOT NULL REFERENCES categories(id),
                allocated_amount REAL NOT NULL CHECK (allocated_amount >= 0),
                spent_amount REAL NOT NULL DEFAULT 0,
                remaining_amount REAL NOT NULL DEFAULT 0,
                daily_limit REAL NOT NULL DEFAULT 0,
                current_daily_limit REAL NOT NULL DEFAULT 0,
                last_calculated_at DATETIME,
                last_rollover_date DATE,
                alert_threshold REAL NOT NULL CHECK (alert_threshold BETWEEN 0 AND 1),
                is_over_budget BOOLEAN NOT NULL DEFAULT FALSE,
                UNIQUE(budget_id, category_id)
            );

            CREATE TABLE IF NOT EXISTS expenses (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                budget_id INTEGER NOT NULL REFERENCES budgets(id),
                category_id INTEGER NOT NULL REFERENCES categories(id),
                allocation_id INTEGER NOT NULL REFERENCES budget_allocations(id),
                amount REAL NOT NULL CHECK (amount > 0),
                date DATE NOT NULL,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'confirmed',
                source TEXT NOT NULL DEFAULT 'manual',
                pattern_id INTEGER REFERENCES notification_patterns(id) ON DELETE SET NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_expenses_allocation ON expenses(allocation_id, status);
            CREATE INDEX IF NOT EXISTS idx_expenses_budget ON expenses(budget_id);
            CREATE INDEX IF NOT EXISTS idx_expenses_user_category_date
                ON expenses(user_id, category_id, date);

            -- Keyword lists are JSON arrays
            CREATE TABLE IF NOT EXISTS notification_patterns (
                id INTEGER PRIMARY KEY,
                bank_account_id INTEGER NOT NULL REFERENCES bank_accounts(id),
                name TEXT NOT NULL,
                channel TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                message_pattern TEXT,
                example_message TEXT,
                keywords_trigger TEXT NOT NULL DEFAULT '[]',
                keywords_exclude TEXT NOT NULL DEFAULT '[]',
                amount_regex TEXT,
                date_regex TEXT,
                description_regex TEXT,
                merchant_regex TEXT,
                category_id INTEGER REFERENCES categories(id),
                requires_validation BOOLEAN NOT NULL DEFAULT TRUE,
                confidence_threshold REAL NOT NULL DEFAULT 0.8,
                auto_approve BOOLEAN NOT NULL DEFAULT FALSE,
                priority INTEGER NOT NULL DEFAULT 0,
                is_default BOOLEAN NOT NULL DEFAULT FALSE,
                match_count INTEGER NOT NULL DEFAULT 0,
                success_count INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_patterns_lookup
                ON notification_patterns(bank_account_id, channel, status, priority);

            -- At most one default pattern per account and channel
            CREATE UNIQUE INDEX IF NOT EXISTS idx_patterns_single_default
                ON notification_patterns(bank_account_id, channel)
                WHERE is_default = 1;
            "#,
        )?;

        info!("Database migrations complete");
        Ok(())
    }
}

impl LedgerStore for Database {
    /// Runs `f` inside `BEGIN IMMEDIATE`, so the write lock is held from the
    /// first read of the recompute to the commit.
    fn in_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn LedgerRepository) -> Result<T>,
    {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        // An early return drops `tx`, which rolls back
        let value = f(&SqlLedger::new(&tx))?;
        tx.commit()?;
        Ok(value)
    }

    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn LedgerRepository) -> Result<T>,
    {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let value = f(&SqlLedger::new(&tx))?;
        tx.commit()?;
        Ok(value)
    }
}
