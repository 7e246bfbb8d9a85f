//! subwatch Core Library
//!
//! Shared functionality for the subwatch subscription tracker:
//! - Heuristic extraction of transactions/subscriptions from bank SMS and
//!   billing emails (no merchant database, no external NLP)
//! - Subscription & transaction ledger with merge-or-create ingestion,
//!   lifecycle tracking, and aggregate reports
//! - Pluggable persistence (JSON file store, in-memory store)
//! - Fire-and-forget reminder and calendar side effects

pub mod config;
pub mod effects;
pub mod error;
pub mod extract;
pub mod ledger;
pub mod models;
pub mod store;

pub use config::Config;
pub use effects::{
    spawn_effect_worker, Calendar, EffectOutcome, EffectSender, Notifier, SideEffect,
};
pub use error::{Error, Result};
pub use extract::Extractor;
pub use ledger::Ledger;
pub use models::{
    Category, Frequency, ParsedEmailCandidate, ParsedTransaction, Subscription, SubscriptionId,
    Transaction, TransactionId,
};
pub use store::{JsonStore, MemoryStore, Store};
