//! Notification pattern operations

use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};

use super::accounts::bank_account_from_row;
use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    BankAccount, NewNotificationPattern, NotificationChannel, NotificationPattern, PatternRules,
    PatternStatus,
};
use crate::store::PatternRepository;

const PATTERN_COLUMNS: &str = "id, bank_account_id, channel, status, is_default, name, \
     message_pattern, example_message, keywords_trigger, keywords_exclude, amount_regex, \
     date_regex, description_regex, merchant_regex, category_id, requires_validation, \
     confidence_threshold, auto_approve, priority, match_count, success_count, created_at";

fn conversion_error(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

fn keywords(idx: usize, raw: &str) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| conversion_error(idx, e))
}

fn pattern_from_row(row: &Row) -> rusqlite::Result<NotificationPattern> {
    let channel: String = row.get(2)?;
    let status: String = row.get(3)?;
    let keywords_trigger: String = row.get(8)?;
    let keywords_exclude: String = row.get(9)?;
    let created_at: String = row.get(21)?;

    Ok(NotificationPattern {
        id: row.get(0)?,
        bank_account_id: row.get(1)?,
        channel: channel
            .parse::<NotificationChannel>()
            .map_err(|e| conversion_error(2, e))?,
        status: status
            .parse::<PatternStatus>()
            .map_err(|e| conversion_error(3, e))?,
        is_default: row.get(4)?,
        rules: PatternRules {
            name: row.get(5)?,
            message_pattern: row.get(6)?,
            example_message: row.get(7)?,
            keywords_trigger: keywords(8, &keywords_trigger)?,
            keywords_exclude: keywords(9, &keywords_exclude)?,
            amount_regex: row.get(10)?,
            date_regex: row.get(11)?,
            description_regex: row.get(12)?,
            merchant_regex: row.get(13)?,
            category_id: row.get(14)?,
            requires_validation: row.get(15)?,
            confidence_threshold: row.get(16)?,
            auto_approve: row.get(17)?,
            priority: row.get(18)?,
        },
        match_count: row.get(19)?,
        success_count: row.get(20)?,
        created_at: parse_datetime(&created_at),
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl PatternRepository for Database {
    fn get_bank_account(&self, id: i64) -> Result<Option<BankAccount>> {
        let conn = self.conn()?;
        let account = conn
            .query_row(
                "SELECT id, user_id, name, bank, created_at FROM bank_accounts WHERE id = ?",
                params![id],
                bank_account_from_row,
            )
            .optional()?;
        Ok(account)
    }

    fn list_active_patterns(
        &self,
        bank_account_id: i64,
        channel: NotificationChannel,
    ) -> Result<Vec<NotificationPattern>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notification_patterns
             WHERE bank_account_id = ? AND channel = ? AND status = ?
             ORDER BY priority ASC, id ASC",
            PATTERN_COLUMNS
        ))?;
        let patterns = stmt
            .query_map(
                params![
                    bank_account_id,
                    channel.as_str(),
                    PatternStatus::Active.as_str()
                ],
                pattern_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(patterns)
    }

    fn find_default_pattern(
        &self,
        bank_account_id: i64,
        channel: NotificationChannel,
    ) -> Result<Option<NotificationPattern>> {
        let conn = self.conn()?;
        let pattern = conn
            .query_row(
                &format!(
                    "SELECT {} FROM notification_patterns
                     WHERE bank_account_id = ? AND channel = ? AND is_default = TRUE",
                    PATTERN_COLUMNS
                ),
                params![bank_account_id, channel.as_str()],
                pattern_from_row,
            )
            .optional()?;
        Ok(pattern)
    }

    fn list_patterns(&self, bank_account_id: i64) -> Result<Vec<NotificationPattern>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notification_patterns WHERE bank_account_id = ?
             ORDER BY channel, priority ASC, id ASC",
            PATTERN_COLUMNS
        ))?;
        let patterns = stmt
            .query_map(params![bank_account_id], pattern_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(patterns)
    }

    fn get_pattern(&self, id: i64) -> Result<Option<NotificationPattern>> {
        let conn = self.conn()?;
        let pattern = conn
            .query_row(
                &format!(
                    "SELECT {} FROM notification_patterns WHERE id = ?",
                    PATTERN_COLUMNS
                ),
                params![id],
                pattern_from_row,
            )
            .optional()?;
        Ok(pattern)
    }

    fn insert_pattern(&self, p: &NewNotificationPattern) -> Result<i64> {
        let conn = self.conn()?;
        let rules = &p.rules;
        let result = conn.execute(
            "INSERT INTO notification_patterns
                (bank_account_id, channel, status, is_default, name, message_pattern, example_message,
                 keywords_trigger, keywords_exclude, amount_regex, date_regex, description_regex,
                 merchant_regex, category_id, requires_validation, confidence_threshold, auto_approve, priority)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                p.bank_account_id,
                p.channel.as_str(),
                p.status.as_str(),
                p.is_default,
                rules.name,
                rules.message_pattern,
                rules.example_message,
                serde_json::to_string(&rules.keywords_trigger)?,
                serde_json::to_string(&rules.keywords_exclude)?,
                rules.amount_regex,
                rules.date_regex,
                rules.description_regex,
                rules.merchant_regex,
                rules.category_id,
                rules.requires_validation,
                rules.confidence_threshold,
                rules.auto_approve,
                rules.priority
            ],
        );

        match result {
            Ok(_) => Ok(conn.last_insert_rowid()),
            Err(e) if is_unique_violation(&e) => Err(Error::DefaultPatternExists {
                bank_account_id: p.bank_account_id,
                channel: p.channel.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn update_pattern_rules(&self, id: i64, rules: &PatternRules) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE notification_patterns
             SET name = ?, message_pattern = ?, example_message = ?, keywords_trigger = ?,
                 keywords_exclude = ?, amount_regex = ?, date_regex = ?, description_regex = ?,
                 merchant_regex = ?, category_id = ?, requires_validation = ?,
                 confidence_threshold = ?, auto_approve = ?, priority = ?
             WHERE id = ?",
            params![
                rules.name,
                rules.message_pattern,
                rules.example_message,
                serde_json::to_string(&rules.keywords_trigger)?,
                serde_json::to_string(&rules.keywords_exclude)?,
                rules.amount_regex,
                rules.date_regex,
                rules.description_regex,
                rules.merchant_regex,
                rules.category_id,
                rules.requires_validation,
                rules.confidence_threshold,
                rules.auto_approve,
                rules.priority,
                id
            ],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("pattern {}", id)));
        }
        Ok(())
    }

    fn update_pattern_status(&self, id: i64, status: PatternStatus) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE notification_patterns SET status = ? WHERE id = ?",
            params![status.as_str(), id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("pattern {}", id)));
        }
        Ok(())
    }

    fn set_default_pattern(&self, id: i64) -> Result<()> {
        let mut conn = self.conn()?;
        // Unique checks run per row, so the old default is cleared first
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "UPDATE notification_patterns SET is_default = FALSE
             WHERE is_default = TRUE AND id != ?1
               AND (bank_account_id, channel) =
                   (SELECT bank_account_id, channel FROM notification_patterns WHERE id = ?1)",
            params![id],
        )?;
        let changed = tx.execute(
            "UPDATE notification_patterns SET is_default = TRUE WHERE id = ?",
            params![id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("pattern {}", id)));
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_pattern(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM notification_patterns WHERE id = ?",
            params![id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("pattern {}", id)));
        }
        Ok(())
    }

    fn record_pattern_outcome(&self, id: i64, success: bool) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE notification_patterns
             SET match_count = match_count + 1, success_count = success_count + ?
             WHERE id = ?",
            params![i64::from(success), id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("pattern {}", id)));
        }
        Ok(())
    }
}
