//! Merchant and service-name extraction
//!
//! Lookup runs over curated keyword tiers in priority order; tier order is a
//! contract, not an implementation detail. There is no canonical merchant
//! database to consult, so everything here is best-effort.

use regex::Regex;

use crate::error::Result;

/// Streaming/OTT services seen in bank SMS text
const SMS_OTT_SERVICES: &[&str] = &[
    "netflix",
    "prime video",
    "disney",
    "hotstar",
    "zee5",
    "sonyliv",
    "jiocinema",
    "youtube premium",
    "spotify",
];

/// Common apps and utility services seen in bank SMS text
const SMS_APP_SERVICES: &[&str] = &[
    "swiggy",
    "zomato",
    "amazon prime",
    "apple music",
    "dropbox",
    "onedrive",
    "icloud",
];

/// Streaming/OTT services seen in billing emails (broader than the SMS list)
const EMAIL_OTT_SERVICES: &[&str] = &[
    "netflix",
    "prime video",
    "amazon prime",
    "disney",
    "hotstar",
    "disney+",
    "zee5",
    "sonyliv",
    "jiocinema",
    "youtube premium",
    "spotify",
    "apple music",
    "apple tv",
    "hulu",
    "hbo",
    "max",
];

/// Apps and SaaS services seen in billing emails
const EMAIL_APP_SERVICES: &[&str] = &[
    "swiggy",
    "zomato",
    "uber",
    "uber eats",
    "dropbox",
    "onedrive",
    "icloud",
    "adobe",
    "microsoft",
    "office 365",
    "google workspace",
    "notion",
    "figma",
    "slack",
    "zoom",
    "linkedin premium",
    "medium",
];

/// "paid to <name>" style pattern in UPI/bank SMS; group 1 is the payee,
/// terminated by a trailing on/for/via clause or end of text
const TO_MERCHANT_PATTERN: &str = r"to\s+([a-z0-9\s]+?)(?:\s+on|\s+for|\s+via|$)";

/// Boilerplate words stripped from email subjects before using them as a
/// service name
const SUBJECT_NOISE_PATTERN: &str = r"(?i)invoice|receipt|payment|subscription";

/// Names longer than this are assumed to be sentence fragments, not merchants
const MAX_MERCHANT_LEN: usize = 50;

pub(crate) struct MerchantExtractor {
    to_pattern: Regex,
    subject_noise: Regex,
}

impl MerchantExtractor {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            to_pattern: Regex::new(TO_MERCHANT_PATTERN)?,
            subject_noise: Regex::new(SUBJECT_NOISE_PATTERN)?,
        })
    }

    /// Merchant from SMS text (lower-cased input). Tier order: OTT list,
    /// app list, gym keywords, then the "to <name>" pattern.
    pub(crate) fn sms_merchant(&self, text: &str) -> Option<String> {
        if let Some(name) = match_curated(text, SMS_OTT_SERVICES) {
            return Some(name);
        }
        if let Some(name) = match_curated(text, SMS_APP_SERVICES) {
            return Some(name);
        }
        if text.contains("gym") || text.contains("fitness") {
            return Some("Gym/Fitness".to_string());
        }

        if let Some(caps) = self.to_pattern.captures(text) {
            let extracted = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            if !extracted.is_empty() && extracted.len() < MAX_MERCHANT_LEN {
                return Some(title_case(extracted));
            }
        }

        None
    }

    /// Service name from email text (lower-cased input) and the raw subject.
    /// Tier order: OTT list, app list, gym keywords, cleaned subject line.
    pub(crate) fn email_service(&self, text: &str, subject: Option<&str>) -> Option<String> {
        if let Some(name) = match_curated(text, EMAIL_OTT_SERVICES) {
            return Some(name);
        }
        if let Some(name) = match_curated(text, EMAIL_APP_SERVICES) {
            return Some(name);
        }
        if text.contains("gym") || text.contains("fitness") {
            return Some("Gym/Fitness".to_string());
        }

        if let Some(subject) = subject {
            let cleaned = self.subject_noise.replace_all(subject, "");
            let cleaned = cleaned.trim();
            if !cleaned.is_empty() && cleaned.len() < MAX_MERCHANT_LEN {
                return Some(title_case(cleaned));
            }
        }

        None
    }
}

/// First curated entry contained in the text, title-cased
fn match_curated(text: &str, services: &[&str]) -> Option<String> {
    services
        .iter()
        .find(|service| text.contains(*service))
        .map(|service| title_case(service))
}

/// Uppercase the first letter of each whitespace-separated word
pub(crate) fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curated_tiers_first_match_wins() {
        let ex = MerchantExtractor::new().unwrap();
        assert_eq!(
            ex.sms_merchant("netflix subscription renewed. ₹499 debited"),
            Some("Netflix".to_string())
        );
        // OTT tier outranks the app tier
        assert_eq!(
            ex.sms_merchant("spotify payment via swiggy wallet"),
            Some("Spotify".to_string())
        );
        assert_eq!(
            ex.sms_merchant("₹120 paid for swiggy order"),
            Some("Swiggy".to_string())
        );
    }

    #[test]
    fn test_gym_tier() {
        let ex = MerchantExtractor::new().unwrap();
        assert_eq!(
            ex.sms_merchant("₹1500 debited for gym membership"),
            Some("Gym/Fitness".to_string())
        );
        assert_eq!(
            ex.email_service("your fitness plan was renewed", None),
            Some("Gym/Fitness".to_string())
        );
    }

    #[test]
    fn test_to_pattern_fallback() {
        let ex = MerchantExtractor::new().unwrap();
        assert_eq!(
            ex.sms_merchant("₹250 paid to cult fit on 01/02/2026"),
            Some("Cult Fit".to_string())
        );
        assert_eq!(
            ex.sms_merchant("₹250 paid to local bakery via upi"),
            Some("Local Bakery".to_string())
        );
        // No merchant signal at all
        assert_eq!(ex.sms_merchant("₹250 debited from account"), None);
    }

    #[test]
    fn test_subject_cleanup() {
        let ex = MerchantExtractor::new().unwrap();
        assert_eq!(
            ex.email_service(
                "your monthly charge went through",
                Some("Invoice - Acme Tools")
            ),
            Some("- Acme Tools".to_string())
        );
        assert_eq!(
            ex.email_service("charge went through", Some("Payment Receipt")),
            None
        );
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("netflix"), "Netflix");
        assert_eq!(title_case("prime video"), "Prime Video");
        assert_eq!(title_case("  cult  fit "), "Cult Fit");
    }
}
