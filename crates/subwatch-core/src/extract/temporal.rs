//! Date and billing-frequency extraction

use chrono::{Duration, NaiveDate, Utc};
use regex::Regex;

use crate::error::Result;
use crate::models::Frequency;

/// Numeric day/month/year shapes like "15/08/2026" or "15-08-2026"
const DATE_PATTERN: &str = r"\d{1,2}[/-]\d{1,2}[/-]\d{4}";

/// Layouts tried in order against the matched date string; the first one
/// that parses wins. Day-first comes before month-first (home-market bias).
const DATE_LAYOUTS: &[&str] = &["%d/%m/%Y", "%m/%d/%Y", "%Y-%m-%d", "%d-%m-%Y"];

pub(crate) struct TemporalExtractor {
    date_pattern: Regex,
}

impl TemporalExtractor {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            date_pattern: Regex::new(DATE_PATTERN)?,
        })
    }

    /// First parseable date in the text, if any.
    pub(crate) fn date(&self, text: &str) -> Option<NaiveDate> {
        let matched = self.date_pattern.find(text)?.as_str();
        DATE_LAYOUTS
            .iter()
            .find_map(|layout| NaiveDate::parse_from_str(matched, layout).ok())
    }
}

/// Infer billing frequency from keywords, in priority order.
///
/// Quirk kept from the shipped behavior: "week" is checked before the
/// bi-weekly spellings, so "bi-weekly"/"biweekly" text infers `Weekly`.
pub(crate) fn infer_frequency(text: &str) -> Frequency {
    if text.contains("yearly") || text.contains("annual") {
        Frequency::Yearly
    } else if text.contains("quarterly") {
        Frequency::Quarterly
    } else if text.contains("weekly") || text.contains("week") {
        Frequency::Weekly
    } else if text.contains("bi-weekly") || text.contains("biweekly") {
        Frequency::BiWeekly
    } else {
        Frequency::Monthly
    }
}

/// Expected next debit: transaction date plus the frequency's day count.
/// Falls back to thirty days from now if the arithmetic overflows.
pub(crate) fn next_debit_date(date: NaiveDate, frequency: Frequency) -> NaiveDate {
    date.checked_add_signed(Duration::days(frequency.day_count()))
        .unwrap_or_else(|| Utc::now().date_naive() + Duration::days(30))
}
