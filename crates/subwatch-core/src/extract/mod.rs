//! Heuristic text extraction engine
//!
//! Turns unstructured bank SMS and billing-email text into structured
//! transaction/subscription candidates. No merchant database, no external
//! NLP service; curated keyword tiers and currency-anchored patterns only.
//!
//! # Architecture
//!
//! - `amount`: currency-anchored amount match + independent currency scan
//! - `merchant`: curated service tiers, payee patterns, subject cleanup
//! - `temporal`: date layouts and billing-frequency keywords
//! - `classify`: subscription-likelihood keyword sets
//! - `Extractor`: composes the above into the two entry points
//!
//! Every failure is "no result" rather than an error; the caller decides
//! whether to fall back to manual entry.

mod amount;
mod classify;
mod merchant;
mod temporal;

use chrono::Utc;
use tracing::debug;

use crate::error::Result;
use crate::models::{ParsedEmailCandidate, ParsedTransaction};

use amount::{currency_symbol, AmountExtractor};
use merchant::MerchantExtractor;
use temporal::{infer_frequency, next_debit_date, TemporalExtractor};

/// Service name used when an email clears the relevance gate but no
/// merchant tier matches
const UNKNOWN_SERVICE: &str = "Unknown Service";

/// Text extraction engine with pre-compiled patterns.
///
/// Construct once and reuse; extraction itself is pure computation with no
/// I/O and no suspension points.
pub struct Extractor {
    amount: AmountExtractor,
    merchant: MerchantExtractor,
    temporal: TemporalExtractor,
}

impl Extractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            amount: AmountExtractor::new()?,
            merchant: MerchantExtractor::new()?,
            temporal: TemporalExtractor::new()?,
        })
    }

    /// Parse a bank SMS into a transaction candidate.
    ///
    /// Returns `None` when no currency-anchored amount is present; an SMS
    /// without an amount is unusable. Date degrades to today, merchant to
    /// `None`.
    pub fn extract_transaction(&self, sms_text: &str) -> Option<ParsedTransaction> {
        let text = sms_text.to_lowercase();

        let amount = match self.amount.first_amount(&text) {
            Some(amount) => amount,
            None => {
                debug!("No amount in SMS, skipping");
                return None;
            }
        };

        let currency = currency_symbol(&text).to_string();
        let merchant = self.merchant.sms_merchant(&text);
        let date = self
            .temporal
            .date(&text)
            .unwrap_or_else(|| Utc::now().date_naive());
        let is_subscription = classify::is_subscription_sms(&text);

        debug!(
            "Parsed SMS: amount={} merchant={:?} subscription={}",
            amount, merchant, is_subscription
        );

        Some(ParsedTransaction {
            amount,
            currency,
            merchant,
            date,
            description: sms_text.to_string(),
            is_subscription,
        })
    }

    /// Parse a billing email into a subscription candidate.
    ///
    /// The relevance gate rejects non-billing mail outright; past the gate,
    /// an amount is still required. Everything else degrades: date to today,
    /// frequency to monthly, service name to "Unknown Service".
    pub fn extract_subscription(
        &self,
        body: &str,
        subject: Option<&str>,
    ) -> Option<ParsedEmailCandidate> {
        let combined = format!("{} {}", subject.unwrap_or(""), body).to_lowercase();

        if !classify::is_billing_email(&combined) {
            debug!("Email has no billing keyword, skipping");
            return None;
        }

        let amount = self.amount.first_amount(&combined)?;
        let currency = currency_symbol(&combined).to_string();

        let service_name = self
            .merchant
            .email_service(&combined, subject)
            .unwrap_or_else(|| UNKNOWN_SERVICE.to_string());

        let date = self
            .temporal
            .date(&combined)
            .unwrap_or_else(|| Utc::now().date_naive());
        let frequency = infer_frequency(&combined);
        let next_debit = next_debit_date(date, frequency);

        debug!(
            "Parsed email: service={} amount={} frequency={}",
            service_name, amount, frequency
        );

        Some(ParsedEmailCandidate {
            service_name,
            amount,
            currency,
            date,
            frequency,
            next_debit_date: next_debit,
            email_subject: subject.map(str::to_string),
            email_body: body.to_string(),
        })
    }

    /// Judge whether an SMS looks like part of a repeating charge series.
    ///
    /// A subscription keyword decides immediately. Otherwise, with history
    /// supplied, the text is re-extracted and compared: same merchant
    /// (case-insensitive) and an amount within the drift tolerance counts
    /// as recurring.
    pub fn is_recurring(
        &self,
        sms_text: &str,
        previous_amount: Option<f64>,
        previous_merchant: Option<&str>,
    ) -> bool {
        let text = sms_text.to_lowercase();

        if classify::has_recurrence_keyword(&text) {
            return true;
        }

        if let (Some(prev_amount), Some(prev_merchant)) = (previous_amount, previous_merchant) {
            if let Some(parsed) = self.extract_transaction(sms_text) {
                if let Some(merchant) = parsed.merchant {
                    return merchant.to_lowercase() == prev_merchant.to_lowercase()
                        && (parsed.amount - prev_amount).abs()
                            <= classify::RECURRENCE_AMOUNT_TOLERANCE;
                }
            }
        }

        false
    }
}
