//! Keyword-based candidate selection for notification patterns

use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{NotificationChannel, NotificationPattern, PatternRules, PatternStatus};
use crate::store::PatternRepository;

/// True when any non-blank keyword occurs in `haystack_lower`
fn contains_any(haystack_lower: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .any(|k| haystack_lower.contains(&k))
}

fn has_triggers(rules: &PatternRules) -> bool {
    rules.keywords_trigger.iter().any(|k| !k.trim().is_empty())
}

/// Whether a pattern's keywords admit `message`
///
/// Empty trigger lists admit every message; any exclude keyword rules it out.
pub fn keywords_admit(rules: &PatternRules, message: &str) -> bool {
    let lower = message.to_lowercase();
    let has_match = !has_triggers(rules) || contains_any(&lower, &rules.keywords_trigger);
    let has_exclusion = contains_any(&lower, &rules.keywords_exclude);
    has_match && !has_exclusion
}

/// Keep the patterns whose keywords admit `message`, preserving order
pub fn filter_candidates(
    patterns: Vec<NotificationPattern>,
    message: &str,
) -> Vec<NotificationPattern> {
    patterns
        .into_iter()
        .filter(|p| keywords_admit(&p.rules, message))
        .collect()
}

/// Selects candidate patterns for a bank account and channel
pub struct PatternMatcher<'a, R: PatternRepository + ?Sized> {
    repo: &'a R,
}

impl<'a, R: PatternRepository + ?Sized> PatternMatcher<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Candidates in priority order; the first one is the best pattern
    pub fn match_patterns(
        &self,
        bank_account_id: i64,
        channel: NotificationChannel,
        message: &str,
    ) -> Result<Vec<NotificationPattern>> {
        if self.repo.get_bank_account(bank_account_id)?.is_none() {
            return Err(Error::NotFound(format!("bank account {}", bank_account_id)));
        }
        self.candidates(bank_account_id, channel, message)
    }

    /// Same as `match_patterns` for an account the caller already resolved
    pub(crate) fn candidates(
        &self,
        bank_account_id: i64,
        channel: NotificationChannel,
        message: &str,
    ) -> Result<Vec<NotificationPattern>> {
        if message.trim().is_empty() {
            return Ok(Vec::new());
        }

        let active = self.repo.list_active_patterns(bank_account_id, channel)?;
        let total = active.len();
        let candidates = filter_candidates(active, message);
        debug!(
            "{} of {} active {} patterns admit message for account {}",
            candidates.len(),
            total,
            channel,
            bank_account_id
        );

        if !candidates.is_empty() {
            return Ok(candidates);
        }

        // A deactivated default stays out of matching like any other pattern
        match self.repo.find_default_pattern(bank_account_id, channel)? {
            Some(default) if default.status == PatternStatus::Active => {
                debug!("Falling back to default pattern '{}'", default.rules.name);
                Ok(vec![default])
            }
            _ => Ok(Vec::new()),
        }
    }
}
