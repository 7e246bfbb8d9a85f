//! Amount and currency extraction
//!
//! Amounts are only accepted when anchored by a currency marker, which keeps
//! order numbers, OTPs, and dates from being misread as money.

use regex::Regex;

use crate::error::Result;

/// Currency-anchored decimal amount, e.g. "₹499", "Rs. 150.00", "$9.99".
/// Group 1 captures the numeric part.
const AMOUNT_PATTERN: &str = r"(?:₹|rs\.?|inr|usd|\$)\s*(\d+(?:\.\d{2})?)";

pub(crate) struct AmountExtractor {
    pattern: Regex,
}

impl AmountExtractor {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(AMOUNT_PATTERN)?,
        })
    }

    /// First currency-anchored amount in the text, if any.
    ///
    /// Expects lower-cased input. Returns `None` when no marker+number pair
    /// is present or the number fails to parse.
    pub(crate) fn first_amount(&self, text: &str) -> Option<f64> {
        let caps = self.pattern.captures(text)?;
        caps.get(1)?.as_str().trim().parse::<f64>().ok()
    }
}

/// Determine the currency symbol for the whole message.
///
/// Scanned independently of which marker anchored the amount match, so
/// mixed-signal text falls back to the home-market rupee default.
pub(crate) fn currency_symbol(text: &str) -> &'static str {
    if text.contains('₹') || text.contains("rs") || text.contains("inr") {
        "₹"
    } else if text.contains('$') || text.contains("usd") {
        "$"
    } else {
        "₹"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rupee_amounts() {
        let ex = AmountExtractor::new().unwrap();
        assert_eq!(ex.first_amount("₹499 debited from your account"), Some(499.0));
        assert_eq!(ex.first_amount("rs.150.00 paid to swiggy"), Some(150.0));
        assert_eq!(ex.first_amount("rs 75 debited"), Some(75.0));
        assert_eq!(ex.first_amount("inr 1299 charged"), Some(1299.0));
    }

    #[test]
    fn test_dollar_amounts() {
        let ex = AmountExtractor::new().unwrap();
        assert_eq!(ex.first_amount("$9.99 was charged"), Some(9.99));
        assert_eq!(ex.first_amount("usd 120 billed"), Some(120.0));
    }

    #[test]
    fn test_first_match_wins() {
        let ex = AmountExtractor::new().unwrap();
        assert_eq!(
            ex.first_amount("₹499 debited, balance ₹12000"),
            Some(499.0)
        );
    }

    #[test]
    fn test_unanchored_numbers_rejected() {
        let ex = AmountExtractor::new().unwrap();
        assert_eq!(ex.first_amount("your otp is 482913"), None);
        assert_eq!(ex.first_amount("order 12345 shipped"), None);
        assert_eq!(ex.first_amount("hello, how are you?"), None);
    }

    #[test]
    fn test_currency_detection() {
        assert_eq!(currency_symbol("₹499 debited"), "₹");
        assert_eq!(currency_symbol("rs. 200 paid"), "₹");
        assert_eq!(currency_symbol("$9.99 charged"), "$");
        assert_eq!(currency_symbol("usd 49 billed"), "$");
        // No marker at all falls back to the home market
        assert_eq!(currency_symbol("nothing here"), "₹");
        // Mixed signals prefer the rupee
        assert_eq!(currency_symbol("rs 100 (approx $1.20)"), "₹");
    }
}
