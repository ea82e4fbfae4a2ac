//! Bank notification classification
//!
//! A notification is matched against the account's patterns for its channel
//! (`matcher`), the best candidate's regexes pull out the interesting fields
//! (`extractor`), and the result is scored for confidence. The classifier
//! never touches pattern counters; callers report how a classification turned
//! out through [`NotificationClassifier::record_pattern_outcome`].

pub mod extractor;
pub mod matcher;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::ledger::BudgetLedger;
use crate::models::{
    BankAccount, ExpenseSource, ExpenseStatus, ExpenseSummary, NewExpense,
    NewNotificationPattern, NotificationChannel, NotificationPattern, PatternRules, PatternStatus,
};
use crate::store::{LedgerStore, PatternRepository};

pub use extractor::{
    extract, parse_amount, parse_date, validate_rules, ExtractField, ExtractedFields, Extraction,
    NEUTRAL_CONFIDENCE,
};
pub use matcher::{keywords_admit, PatternMatcher};

/// What the classifier made of one notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    /// A pattern was found and applied
    pub processed: bool,
    pub pattern_id: Option<i64>,
    pub pattern_name: Option<String>,
    /// Category the best pattern files expenses under
    pub category_id: Option<i64>,
    pub confidence: f64,
    pub requires_validation: bool,
    pub auto_approve: bool,
    pub extracted_data: ExtractedFields,
    /// Parsed from the extracted amount text
    pub amount: Option<f64>,
    /// Parsed from the extracted date text, else the day the notification arrived
    pub date: NaiveDate,
    /// Number of patterns that admitted the message
    pub candidates: usize,
}

impl NotificationResult {
    fn unprocessed(date: NaiveDate) -> Self {
        Self {
            processed: false,
            pattern_id: None,
            pattern_name: None,
            category_id: None,
            confidence: 0.0,
            requires_validation: true,
            auto_approve: false,
            extracted_data: ExtractedFields::default(),
            amount: None,
            date,
            candidates: 0,
        }
    }

    /// Enough was extracted to book the expense without a human
    pub fn can_record(&self) -> bool {
        self.processed
            && self.auto_approve
            && !self.requires_validation
            && self.amount.is_some()
            && self.category_id.is_some()
    }
}

/// A classification plus the expense it produced, if any
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedNotification {
    pub result: NotificationResult,
    pub expense: Option<ExpenseSummary>,
}

/// Dry run of one pattern against one message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternTest {
    /// The keywords admit the message
    pub admitted: bool,
    pub extraction: Extraction,
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
}

/// Apply rules to a message without touching storage
pub fn dry_run(rules: &PatternRules, message: &str) -> PatternTest {
    let extraction = extract(rules, message);
    PatternTest {
        admitted: keywords_admit(rules, message),
        amount: extraction.fields.amount.as_deref().and_then(parse_amount),
        date: extraction.fields.date.as_deref().and_then(parse_date),
        extraction,
    }
}

/// Classifies notifications and manages the patterns behind them
pub struct NotificationClassifier<'a, R: PatternRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: PatternRepository + ?Sized> NotificationClassifier<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Classify a notification for one of the user's bank accounts
    ///
    /// `received_on` is used when the pattern extracts no usable date.
    pub fn process_notification(
        &self,
        user_id: i64,
        bank_account_id: i64,
        channel: NotificationChannel,
        message: &str,
        received_on: NaiveDate,
    ) -> Result<NotificationResult> {
        self.owned_account(user_id, bank_account_id)?;

        let candidates =
            PatternMatcher::new(self.repo).candidates(bank_account_id, channel, message)?;
        let Some(best) = candidates.first() else {
            debug!(
                "No {} pattern for account {} matched the message",
                channel, bank_account_id
            );
            return Ok(NotificationResult::unprocessed(received_on));
        };

        let extraction = extract(&best.rules, message);
        let amount = extraction.fields.amount.as_deref().and_then(parse_amount);
        let date = extraction
            .fields
            .date
            .as_deref()
            .and_then(parse_date)
            .unwrap_or(received_on);

        info!(
            "Classified {} notification with pattern '{}' (confidence {:.2}, {}/{} fields)",
            channel, best.rules.name, extraction.confidence, extraction.successes, extraction.attempts
        );

        Ok(NotificationResult {
            processed: true,
            pattern_id: Some(best.id),
            pattern_name: Some(best.rules.name.clone()),
            category_id: best.rules.category_id,
            confidence: extraction.confidence,
            requires_validation: extraction.requires_validation,
            auto_approve: extraction.auto_approve,
            extracted_data: extraction.fields,
            amount,
            date,
            candidates: candidates.len(),
        })
    }

    /// Classify, then book a confirmed expense when the result auto-approves
    pub fn process_and_record<S: LedgerStore>(
        &self,
        ledger: &BudgetLedger<'_, S>,
        user_id: i64,
        bank_account_id: i64,
        channel: NotificationChannel,
        message: &str,
        received_on: NaiveDate,
    ) -> Result<RecordedNotification> {
        let result =
            self.process_notification(user_id, bank_account_id, channel, message, received_on)?;

        let expense = match (result.can_record(), result.amount, result.category_id) {
            (true, Some(amount), Some(category_id)) => {
                let description = result
                    .extracted_data
                    .description
                    .clone()
                    .or_else(|| result.extracted_data.merchant.clone());
                let input = NewExpense {
                    user_id,
                    category_id,
                    amount,
                    date: result.date,
                    description,
                    source: ExpenseSource::Notification,
                    status: ExpenseStatus::Confirmed,
                    pattern_id: result.pattern_id,
                };
                Some(ledger.create_expense(&input, received_on)?)
            }
            _ => {
                debug!("Notification left for review");
                None
            }
        };

        Ok(RecordedNotification { result, expense })
    }

    // =========================================================================
    // Pattern management
    // =========================================================================

    pub fn create_pattern(
        &self,
        user_id: i64,
        pattern: &NewNotificationPattern,
    ) -> Result<NotificationPattern> {
        validate_rules(&pattern.rules)?;
        self.owned_account(user_id, pattern.bank_account_id)?;

        let id = self.repo.insert_pattern(pattern)?;
        info!(
            "Created {} pattern '{}' ({}) for account {}",
            pattern.channel, pattern.rules.name, id, pattern.bank_account_id
        );
        self.required_pattern(id)
    }

    /// Replace the matching and extraction rules of a pattern
    pub fn update_pattern(
        &self,
        user_id: i64,
        pattern_id: i64,
        rules: &PatternRules,
    ) -> Result<NotificationPattern> {
        validate_rules(rules)?;
        self.owned_pattern(user_id, pattern_id)?;
        self.repo.update_pattern_rules(pattern_id, rules)?;
        self.required_pattern(pattern_id)
    }

    pub fn get_pattern(&self, user_id: i64, pattern_id: i64) -> Result<NotificationPattern> {
        self.owned_pattern(user_id, pattern_id)
    }

    pub fn list_patterns(
        &self,
        user_id: i64,
        bank_account_id: i64,
    ) -> Result<Vec<NotificationPattern>> {
        self.owned_account(user_id, bank_account_id)?;
        self.repo.list_patterns(bank_account_id)
    }

    pub fn delete_pattern(&self, user_id: i64, pattern_id: i64) -> Result<()> {
        self.owned_pattern(user_id, pattern_id)?;
        self.repo.delete_pattern(pattern_id)?;
        info!("Deleted pattern {}", pattern_id);
        Ok(())
    }

    /// Move a pattern through its lifecycle
    pub fn set_pattern_status(
        &self,
        user_id: i64,
        pattern_id: i64,
        status: PatternStatus,
    ) -> Result<NotificationPattern> {
        let pattern = self.owned_pattern(user_id, pattern_id)?;
        if !pattern.status.can_transition_to(status) {
            return Err(Error::InvalidStatusTransition {
                from: pattern.status.to_string(),
                to: status.to_string(),
            });
        }
        self.repo.update_pattern_status(pattern_id, status)?;
        debug!("Pattern {}: {} -> {}", pattern_id, pattern.status, status);
        self.required_pattern(pattern_id)
    }

    /// Make a pattern the fallback for its account and channel
    pub fn set_default_pattern(&self, user_id: i64, pattern_id: i64) -> Result<NotificationPattern> {
        self.owned_pattern(user_id, pattern_id)?;
        self.repo.set_default_pattern(pattern_id)?;
        self.required_pattern(pattern_id)
    }

    /// Record whether a classification by this pattern was right
    pub fn record_pattern_outcome(
        &self,
        user_id: i64,
        pattern_id: i64,
        success: bool,
    ) -> Result<NotificationPattern> {
        self.owned_pattern(user_id, pattern_id)?;
        self.repo.record_pattern_outcome(pattern_id, success)?;
        self.required_pattern(pattern_id)
    }

    /// Dry run of a stored pattern
    pub fn test_pattern(&self, user_id: i64, pattern_id: i64, message: &str) -> Result<PatternTest> {
        let pattern = self.owned_pattern(user_id, pattern_id)?;
        Ok(dry_run(&pattern.rules, message))
    }

    fn owned_account(&self, user_id: i64, bank_account_id: i64) -> Result<BankAccount> {
        let account = self
            .repo
            .get_bank_account(bank_account_id)?
            .ok_or_else(|| Error::NotFound(format!("bank account {}", bank_account_id)))?;
        if account.user_id != user_id {
            return Err(Error::PermissionDenied(format!(
                "bank account {} belongs to another user",
                bank_account_id
            )));
        }
        Ok(account)
    }

    fn owned_pattern(&self, user_id: i64, pattern_id: i64) -> Result<NotificationPattern> {
        let pattern = self.required_pattern(pattern_id)?;
        self.owned_account(user_id, pattern.bank_account_id)?;
        Ok(pattern)
    }

    fn required_pattern(&self, pattern_id: i64) -> Result<NotificationPattern> {
        self.repo
            .get_pattern(pattern_id)?
            .ok_or_else(|| Error::NotFound(format!("pattern {}", pattern_id)))
    }
}
