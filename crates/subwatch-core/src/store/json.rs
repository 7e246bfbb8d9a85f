//! JSON file store

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::Store;
use crate::error::{Error, Result};
use crate::models::{Subscription, Transaction};

const SUBSCRIPTIONS_FILE: &str = "subscriptions.json";
const TRANSACTIONS_FILE: &str = "transactions.json";

/// Persists subscriptions and transactions as two JSON files in a
/// data directory.
pub struct JsonStore {
    data_dir: PathBuf,
}

impl JsonStore {
    /// Create a store rooted at the given directory, creating it if needed.
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();

        if !data_dir.exists() {
            fs::create_dir_all(&data_dir).map_err(|e| {
                Error::SaveFailed(format!(
                    "Failed to create data directory {}: {}",
                    data_dir.display(),
                    e
                ))
            })?;
            info!("Created data directory: {}", data_dir.display());
        }

        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn load_file<T: serde::de::DeserializeOwned>(&self, file: &str) -> Vec<T> {
        let path = self.data_dir.join(file);
        if !path.exists() {
            return Vec::new();
        }

        // A corrupt or unreadable file degrades to an empty collection;
        // persistence is advisory, not authoritative.
        match fs::read_to_string(&path).map_err(Error::from).and_then(|s| {
            serde_json::from_str::<Vec<T>>(&s).map_err(Error::from)
        }) {
            Ok(items) => items,
            Err(e) => {
                warn!("Failed to load {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    fn save_file<T: serde::Serialize>(&self, file: &str, items: &[T]) -> Result<()> {
        let path = self.data_dir.join(file);
        let json = serde_json::to_string_pretty(items)
            .map_err(|e| Error::SaveFailed(format!("{}: {}", file, e)))?;
        fs::write(&path, json).map_err(|e| Error::SaveFailed(format!("{}: {}", file, e)))
    }
}

impl Store for JsonStore {
    fn name(&self) -> &str {
        "json"
    }

    fn load_subscriptions(&self) -> Result<Vec<Subscription>> {
        Ok(self.load_file(SUBSCRIPTIONS_FILE))
    }

    fn save_subscriptions(&self, subscriptions: &[Subscription]) -> Result<()> {
        self.save_file(SUBSCRIPTIONS_FILE, subscriptions)
    }

    fn load_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.load_file(TRANSACTIONS_FILE))
    }

    fn save_transactions(&self, transactions: &[Transaction]) -> Result<()> {
        self.save_file(TRANSACTIONS_FILE, transactions)
    }
}
