//! Persistence collaborator for ledger state
//!
//! The ledger only needs a load/save contract, not a storage engine.
//! Contract: best-effort on both sides. A failed load yields an empty
//! collection; a failed save is reported to the caller, who logs it and
//! keeps the in-memory state authoritative.
//!
//! - `Store` trait defines the interface
//! - `JsonStore` persists two JSON files in a data directory
//! - `MemoryStore` keeps everything in process memory (tests, ephemeral use)

use crate::error::Result;
use crate::models::{Subscription, Transaction};

mod json;
mod memory;

pub use json::JsonStore;
pub use memory::MemoryStore;

/// Trait for ledger persistence backends
pub trait Store: Send + Sync {
    /// Human-readable name for this store
    fn name(&self) -> &str;

    fn load_subscriptions(&self) -> Result<Vec<Subscription>>;

    fn save_subscriptions(&self, subscriptions: &[Subscription]) -> Result<()>;

    fn load_transactions(&self) -> Result<Vec<Transaction>>;

    fn save_transactions(&self, transactions: &[Transaction]) -> Result<()>;
}
