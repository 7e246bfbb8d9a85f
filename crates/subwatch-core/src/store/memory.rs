//! In-memory store

use std::sync::Mutex;

use super::Store;
use crate::error::Result;
use crate::models::{Subscription, Transaction};

/// Store that keeps everything in process memory. Nothing survives the
/// process; useful for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    subscriptions: Mutex<Vec<Subscription>>,
    transactions: Mutex<Vec<Transaction>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn load_subscriptions(&self) -> Result<Vec<Subscription>> {
        Ok(self.subscriptions.lock().unwrap().clone())
    }

    fn save_subscriptions(&self, subscriptions: &[Subscription]) -> Result<()> {
        *self.subscriptions.lock().unwrap() = subscriptions.to_vec();
        Ok(())
    }

    fn load_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.transactions.lock().unwrap().clone())
    }

    fn save_transactions(&self, transactions: &[Transaction]) -> Result<()> {
        *self.transactions.lock().unwrap() = transactions.to_vec();
        Ok(())
    }
}
