//! Runtime configuration
//!
//! All settings are optional and environment-driven:
//!
//! - `SUBWATCH_DATA_DIR`: Directory for the JSON file store (default:
//!   platform data dir + "subwatch")
//! - `SUBWATCH_REMINDER_DAYS`: How many days before a debit the reminder
//!   notification should fire (clamped to 1-30, default: 3)

use std::path::PathBuf;

/// Library-wide configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory used by the JSON file store
    pub data_dir: PathBuf,
    /// Days before the next debit that a reminder fires
    pub reminder_lead_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            reminder_lead_days: 3,
        }
    }
}

impl Config {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("SUBWATCH_DATA_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let reminder_lead_days = std::env::var("SUBWATCH_REMINDER_DAYS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .map(|d| d.clamp(1, 30))
            .unwrap_or(3);

        Self {
            data_dir,
            reminder_lead_days,
        }
    }
}

/// Platform data directory for subwatch
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("subwatch")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.reminder_lead_days, 3);
        assert!(config.data_dir.ends_with("subwatch"));
    }

    #[test]
    fn test_reminder_days_clamped() {
        std::env::set_var("SUBWATCH_REMINDER_DAYS", "90");
        assert_eq!(Config::from_env().reminder_lead_days, 30);
        std::env::set_var("SUBWATCH_REMINDER_DAYS", "0");
        assert_eq!(Config::from_env().reminder_lead_days, 1);
        std::env::set_var("SUBWATCH_REMINDER_DAYS", "not-a-number");
        assert_eq!(Config::from_env().reminder_lead_days, 3);
        std::env::remove_var("SUBWATCH_REMINDER_DAYS");
    }
}
