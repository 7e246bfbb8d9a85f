//! Domain models for subwatch

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque subscription identifier
pub type SubscriptionId = Uuid;

/// Opaque transaction identifier
pub type TransactionId = Uuid;

/// Billing frequency of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    BiWeekly,
    Monthly,
    Quarterly,
    Yearly,
    Custom,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::BiWeekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
            Self::Custom => "custom",
        }
    }

    /// Canonical number of days between debits for this frequency.
    ///
    /// Custom schedules fall back to a monthly cadence for date arithmetic.
    pub fn day_count(&self) -> i64 {
        match self {
            Self::Weekly => 7,
            Self::BiWeekly => 14,
            Self::Monthly => 30,
            Self::Quarterly => 90,
            Self::Yearly => 365,
            Self::Custom => 30,
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "biweekly" | "bi-weekly" => Ok(Self::BiWeekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" | "annual" => Ok(Self::Yearly),
            "custom" => Ok(Self::Custom),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Spending category for a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Ott,
    Gym,
    App,
    Utility,
    Music,
    Cloud,
    News,
    Software,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ott => "ott",
            Self::Gym => "gym",
            Self::App => "app",
            Self::Utility => "utility",
            Self::Music => "music",
            Self::Cloud => "cloud",
            Self::News => "news",
            Self::Software => "software",
            Self::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Ott => "OTT/Streaming",
            Self::Gym => "Gym/Fitness",
            Self::App => "App Subscription",
            Self::Utility => "Utility",
            Self::Music => "Music",
            Self::Cloud => "Cloud Storage",
            Self::News => "News/Magazine",
            Self::Software => "Software",
            Self::Other => "Other",
        }
    }

    /// Guess a category from a service name.
    ///
    /// Purely keyword-based; unknown names land in `Other`.
    pub fn infer(service_name: &str) -> Self {
        let name = service_name.to_lowercase();
        if name.contains("netflix")
            || name.contains("prime")
            || name.contains("disney")
            || name.contains("hotstar")
            || name.contains("ott")
        {
            Self::Ott
        } else if name.contains("gym") || name.contains("fitness") {
            Self::Gym
        } else if name.contains("spotify") || name.contains("music") {
            Self::Music
        } else if name.contains("dropbox") || name.contains("icloud") || name.contains("cloud") {
            Self::Cloud
        } else if name.contains("app") || name.contains("software") {
            Self::App
        } else {
            Self::Other
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ott" | "streaming" => Ok(Self::Ott),
            "gym" | "fitness" => Ok(Self::Gym),
            "app" => Ok(Self::App),
            "utility" => Ok(Self::Utility),
            "music" => Ok(Self::Music),
            "cloud" => Ok(Self::Cloud),
            "news" => Ok(Self::News),
            "software" => Ok(Self::Software),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recurring financial obligation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub name: String,
    pub amount: f64,
    pub currency: String,
    pub frequency: Frequency,
    /// When the next debit is expected
    pub next_debit_date: NaiveDate,
    pub category: Category,
    pub active: bool,
    pub merchant: Option<String>,
    pub last_debit_date: Option<NaiveDate>,
    pub bank_account: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set exactly once, when the user cancels the subscription
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Whether renewals should be mirrored to the user's calendar
    pub sync_to_calendar: bool,
    /// Identifier of the calendar event owned by this subscription, if any
    pub calendar_event_id: Option<String>,
}

impl Subscription {
    /// Create an active subscription with the home-market currency default.
    pub fn new(
        name: impl Into<String>,
        amount: f64,
        frequency: Frequency,
        next_debit_date: NaiveDate,
        category: Category,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            amount,
            currency: "₹".to_string(),
            frequency,
            next_debit_date,
            category,
            active: true,
            merchant: None,
            last_debit_date: None,
            bank_account: None,
            created_at: Utc::now(),
            cancelled_at: None,
            sync_to_calendar: false,
            calendar_event_id: None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled_at.is_some()
    }

    /// Whole days until the next expected debit. Negative when overdue.
    pub fn days_until_debit(&self) -> i64 {
        (self.next_debit_date - Utc::now().date_naive()).num_days()
    }
}

/// An observed monetary event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub amount: f64,
    pub currency: String,
    pub merchant: Option<String>,
    pub date: NaiveDate,
    pub description: String,
    pub bank_account: Option<String>,
    /// Subscription this debit belongs to, when known
    pub subscription_id: Option<SubscriptionId>,
    pub is_subscription: bool,
}

impl Transaction {
    pub fn new(
        amount: f64,
        currency: impl Into<String>,
        merchant: Option<String>,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount,
            currency: currency.into(),
            merchant,
            date,
            description: description.into(),
            bank_account: None,
            subscription_id: None,
            is_subscription: false,
        }
    }
}

/// Transaction candidate extracted from a bank SMS. Not persisted directly;
/// input to `Ledger::ingest_parsed_transaction`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTransaction {
    pub amount: f64,
    pub currency: String,
    pub merchant: Option<String>,
    pub date: NaiveDate,
    /// The raw SMS text
    pub description: String,
    pub is_subscription: bool,
}

/// Subscription candidate extracted from a billing email. Not persisted
/// directly; input to `Ledger::ingest_email_candidate`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEmailCandidate {
    pub service_name: String,
    pub amount: f64,
    pub currency: String,
    pub date: NaiveDate,
    pub frequency: Frequency,
    pub next_debit_date: NaiveDate,
    pub email_subject: Option<String>,
    pub email_body: String,
}
