//! Field extraction and confidence scoring for notification patterns

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::PatternRules;

/// Confidence assigned when a pattern defines no extraction regexes at all.
///
/// This is a policy value, not a measurement: such a pattern can only say
/// "this message is ours", never how well it understood it. Whether these
/// patterns should ever auto-approve is a product decision; with the default
/// threshold of 0.8 they cannot.
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// Fields a pattern can pull out of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractField {
    Amount,
    Date,
    Description,
    Merchant,
}

impl ExtractField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amount => "amount",
            Self::Date => "date",
            Self::Description => "description",
            Self::Merchant => "merchant",
        }
    }

    pub fn all() -> &'static [ExtractField] {
        &[Self::Amount, Self::Date, Self::Description, Self::Merchant]
    }

    /// The pattern's regex for this field, if one is set
    pub fn regex_of(self, rules: &PatternRules) -> Option<&str> {
        let slot = match self {
            Self::Amount => &rules.amount_regex,
            Self::Date => &rules.date_regex,
            Self::Description => &rules.description_regex,
            Self::Merchant => &rules.merchant_regex,
        };
        slot.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Raw captured text per field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub amount: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub merchant: Option<String>,
}

impl ExtractedFields {
    pub fn get(&self, field: ExtractField) -> Option<&str> {
        match field {
            ExtractField::Amount => self.amount.as_deref(),
            ExtractField::Date => self.date.as_deref(),
            ExtractField::Description => self.description.as_deref(),
            ExtractField::Merchant => self.merchant.as_deref(),
        }
    }

    fn set(&mut self, field: ExtractField, value: String) {
        let slot = match field {
            ExtractField::Amount => &mut self.amount,
            ExtractField::Date => &mut self.date,
            ExtractField::Description => &mut self.description,
            ExtractField::Merchant => &mut self.merchant,
        };
        *slot = Some(value);
    }

    pub fn is_empty(&self) -> bool {
        ExtractField::all().iter().all(|f| self.get(*f).is_none())
    }
}

/// Outcome of applying one pattern to one message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub fields: ExtractedFields,
    pub attempts: u32,
    pub successes: u32,
    pub confidence: f64,
    pub auto_approve: bool,
    pub requires_validation: bool,
}

/// Apply every defined regex of `rules` to `message` and score the result
pub fn extract(rules: &PatternRules, message: &str) -> Extraction {
    let mut fields = ExtractedFields::default();
    let mut attempts = 0;
    let mut successes = 0;

    for &field in ExtractField::all() {
        let Some(pattern) = field.regex_of(rules) else {
            continue;
        };
        attempts += 1;

        // Regexes are validated on save; a bad one here means the row was edited by hand
        let re = match Regex::new(pattern) {
            Ok(re) => re,
            Err(e) => {
                warn!(
                    "Stored {} regex of pattern '{}' does not compile: {}",
                    field.as_str(),
                    rules.name,
                    e
                );
                continue;
            }
        };

        if let Some(caps) = re.captures(message) {
            // First capture group, or the whole match when the regex has none
            let group = if re.captures_len() > 1 { 1 } else { 0 };
            if let Some(m) = caps.get(group) {
                fields.set(field, m.as_str().trim().to_string());
                successes += 1;
            }
        }
    }

    let confidence = confidence(attempts, successes);
    Extraction {
        fields,
        attempts,
        successes,
        confidence,
        auto_approve: rules.auto_approve && confidence >= rules.confidence_threshold,
        requires_validation: rules.requires_validation || confidence < rules.confidence_threshold,
    }
}

/// Share of attempted regexes that matched
pub fn confidence(attempts: u32, successes: u32) -> f64 {
    if attempts == 0 {
        NEUTRAL_CONFIDENCE
    } else {
        successes as f64 / attempts as f64
    }
}

/// Reject rules that cannot be saved
pub fn validate_rules(rules: &PatternRules) -> Result<()> {
    if rules.name.trim().is_empty() {
        return Err(Error::InvalidData("Pattern name cannot be empty".into()));
    }
    if !(0.0..=1.0).contains(&rules.confidence_threshold) {
        return Err(Error::InvalidData(format!(
            "confidence_threshold must be between 0 and 1, got {}",
            rules.confidence_threshold
        )));
    }
    for &field in ExtractField::all() {
        if let Some(pattern) = field.regex_of(rules) {
            Regex::new(pattern).map_err(|source| Error::InvalidRegex {
                field: field.as_str(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Parse an amount as written in a bank message
///
/// Accepts currency symbols and either `1,234.56` or `1.234,56` grouping. A
/// single separator followed by exactly three digits groups thousands.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == ',');
    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, Some(comma)) => {
            let decimals = cleaned.len() - comma - 1;
            if cleaned.matches(',').count() == 1 && decimals <= 2 {
                cleaned.replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (Some(dot), None) => {
            let decimals = cleaned.len() - dot - 1;
            if cleaned.matches('.').count() == 1 && decimals != 3 {
                cleaned.to_string()
            } else {
                cleaned.replace('.', "")
            }
        }
        (None, None) => cleaned.to_string(),
    };

    normalized.parse().ok()
}

// Two-digit years go first: `%Y` would happily read "24" as year 24
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%y", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];

/// Parse a date as written in a bank message
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}
