//! Subscription and transaction ledger
//!
//! Owns the in-memory collections, applies the merge-or-create ingestion
//! policy, maintains each subscription's lifecycle, and answers the
//! aggregate queries (monthly recurring total, upcoming debits, monthly
//! waste).
//!
//! Mutations are serialized through `&mut self`; merge-or-create reads then
//! writes the collection non-atomically, so callers on multi-threaded
//! runtimes must wrap the ledger in a mutex or confine it to one task.
//! Persistence and downstream notifications are best-effort: their failures
//! are logged and never propagated out of a mutation.

use chrono::{Datelike, Duration, Months, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::effects::{EffectSender, SideEffect};
use crate::models::{
    Category, Frequency, ParsedEmailCandidate, ParsedTransaction, Subscription, SubscriptionId,
    Transaction,
};
use crate::store::Store;

/// Average weekly occurrences per month
const WEEKS_PER_MONTH: f64 = 4.33;
/// Average bi-weekly occurrences per month
const BIWEEKS_PER_MONTH: f64 = 2.17;

/// Name given to a subscription created from an SMS with no merchant
const UNKNOWN_SUBSCRIPTION: &str = "Unknown Subscription";

pub struct Ledger {
    subscriptions: Vec<Subscription>,
    transactions: Vec<Transaction>,
    store: Box<dyn Store>,
    effects: Option<EffectSender>,
}

impl Ledger {
    /// Load ledger state from the store.
    ///
    /// A failed load yields empty collections, never an error.
    pub fn load(store: Box<dyn Store>, effects: Option<EffectSender>) -> Self {
        let subscriptions = store.load_subscriptions().unwrap_or_else(|e| {
            warn!("Failed to load subscriptions from {} store: {}", store.name(), e);
            Vec::new()
        });
        let transactions = store.load_transactions().unwrap_or_else(|e| {
            warn!("Failed to load transactions from {} store: {}", store.name(), e);
            Vec::new()
        });

        info!(
            "Loaded {} subscriptions, {} transactions",
            subscriptions.len(),
            transactions.len()
        );

        Self {
            subscriptions,
            transactions,
            store,
            effects,
        }
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn get_subscription(&self, id: SubscriptionId) -> Option<&Subscription> {
        self.subscriptions.iter().find(|s| s.id == id)
    }

    // ========== Subscription management ==========

    pub fn add_subscription(&mut self, subscription: Subscription) {
        info!("Adding subscription: {}", subscription.name);
        self.request_upsert_effects(&subscription);
        self.subscriptions.push(subscription);
        self.persist_subscriptions();
    }

    /// Replace a subscription by identity. No-op for unknown ids.
    pub fn update_subscription(&mut self, subscription: Subscription) {
        match self.subscriptions.iter().position(|s| s.id == subscription.id) {
            Some(index) => {
                self.request_upsert_effects(&subscription);
                self.subscriptions[index] = subscription;
                self.persist_subscriptions();
            }
            None => debug!("Update for unknown subscription {}, ignoring", subscription.id),
        }
    }

    /// Remove a subscription outright.
    ///
    /// Downstream cleanup (reminder cancellation, calendar event removal)
    /// is requested whether or not the id was present.
    pub fn delete_subscription(&mut self, id: SubscriptionId) {
        let calendar_event_id = self
            .get_subscription(id)
            .and_then(|s| s.calendar_event_id.clone());

        self.subscriptions.retain(|s| s.id != id);
        self.persist_subscriptions();

        if let Some(effects) = &self.effects {
            effects.send(SideEffect::SubscriptionRemoved {
                id,
                calendar_event_id,
            });
        }
        info!("Deleted subscription {}", id);
    }

    /// Cancel a subscription: active flag cleared, cancellation timestamp
    /// set, everything else preserved. No-op for unknown ids and for
    /// already-cancelled subscriptions (the original timestamp stands).
    pub fn cancel_subscription(&mut self, id: SubscriptionId) {
        let Some(index) = self.subscriptions.iter().position(|s| s.id == id) else {
            debug!("Cancel for unknown subscription {}, ignoring", id);
            return;
        };

        if self.subscriptions[index].is_cancelled() {
            debug!("Subscription {} already cancelled", id);
            return;
        }

        let mut cancelled = self.subscriptions[index].clone();
        cancelled.active = false;
        cancelled.cancelled_at = Some(Utc::now());

        info!("Cancelled subscription: {}", cancelled.name);
        self.request_upsert_effects(&cancelled);
        self.subscriptions[index] = cancelled;
        self.persist_subscriptions();
    }

    /// Record the calendar event id reported back by the effect worker.
    ///
    /// Does not re-trigger side effects; this is a write-back, not a user
    /// mutation.
    pub fn apply_calendar_update(&mut self, subscription_id: SubscriptionId, event_id: String) {
        if let Some(sub) = self.subscriptions.iter_mut().find(|s| s.id == subscription_id) {
            sub.calendar_event_id = Some(event_id);
            self.persist_subscriptions();
        }
    }

    // ========== Transaction management ==========

    /// Append a transaction. When it references a subscription, that
    /// subscription's debit dates advance: last debit to the transaction
    /// date, next debit one billing period later.
    pub fn add_transaction(&mut self, transaction: Transaction) {
        let linked = transaction
            .subscription_id
            .and_then(|id| self.get_subscription(id).cloned());

        self.transactions.push(transaction.clone());
        self.persist_transactions();

        if let Some(sub) = linked {
            let mut updated = sub;
            updated.last_debit_date = Some(transaction.date);
            updated.next_debit_date =
                transaction.date + Duration::days(updated.frequency.day_count());
            self.update_subscription(updated);
        }
    }

    /// Ingest an SMS extraction result.
    ///
    /// Always records a transaction. When the text looked like a
    /// subscription charge, the matching active subscription is advanced,
    /// or a new monthly one is created if nothing matches.
    pub fn ingest_parsed_transaction(&mut self, parsed: &ParsedTransaction, category: Category) {
        let mut transaction = Transaction::new(
            parsed.amount,
            parsed.currency.clone(),
            parsed.merchant.clone(),
            parsed.date,
            parsed.description.clone(),
        );
        transaction.is_subscription = parsed.is_subscription;
        self.add_transaction(transaction);

        if !parsed.is_subscription {
            return;
        }

        let matched = parsed
            .merchant
            .as_deref()
            .and_then(|merchant| self.match_active_by_name(merchant));

        match matched {
            Some(index) => {
                let mut updated = self.subscriptions[index].clone();
                updated.last_debit_date = Some(parsed.date);
                // The cadence of the existing subscription wins over
                // anything inferred from a single message
                updated.next_debit_date =
                    parsed.date + Duration::days(updated.frequency.day_count());
                debug!("Matched SMS charge to subscription: {}", updated.name);
                self.update_subscription(updated);
            }
            None => {
                let name = parsed
                    .merchant
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_SUBSCRIPTION.to_string());
                let mut subscription = Subscription::new(
                    name,
                    parsed.amount,
                    Frequency::Monthly,
                    parsed.date + Duration::days(30),
                    category,
                );
                subscription.currency = parsed.currency.clone();
                subscription.merchant = parsed.merchant.clone();
                subscription.last_debit_date = Some(parsed.date);
                self.add_subscription(subscription);
            }
        }
    }

    /// Ingest an email extraction result.
    ///
    /// Same merge-or-create policy as the SMS path, but the candidate
    /// carries its own inferred frequency and next debit date, which are
    /// applied directly. A transaction linked to the matched or created
    /// subscription is always recorded.
    pub fn ingest_email_candidate(&mut self, candidate: &ParsedEmailCandidate, category: Category) {
        let subscription_id = match self.match_active_by_name(&candidate.service_name) {
            Some(index) => {
                let mut updated = self.subscriptions[index].clone();
                updated.name = candidate.service_name.clone();
                updated.amount = candidate.amount;
                updated.currency = candidate.currency.clone();
                updated.frequency = candidate.frequency;
                updated.next_debit_date = candidate.next_debit_date;
                updated.category = category;
                updated.merchant = Some(candidate.service_name.clone());
                updated.last_debit_date = Some(candidate.date);
                let id = updated.id;
                debug!("Matched email candidate to subscription: {}", updated.name);
                self.update_subscription(updated);
                id
            }
            None => {
                let mut subscription = Subscription::new(
                    candidate.service_name.clone(),
                    candidate.amount,
                    candidate.frequency,
                    candidate.next_debit_date,
                    category,
                );
                subscription.currency = candidate.currency.clone();
                subscription.merchant = Some(candidate.service_name.clone());
                subscription.last_debit_date = Some(candidate.date);
                let id = subscription.id;
                self.add_subscription(subscription);
                id
            }
        };

        // Appended directly: the candidate's next debit date is already
        // applied above and must not be re-derived from the transaction
        let mut transaction = Transaction::new(
            candidate.amount,
            candidate.currency.clone(),
            Some(candidate.service_name.clone()),
            candidate.date,
            candidate
                .email_subject
                .clone()
                .unwrap_or_else(|| "Email import".to_string()),
        );
        transaction.subscription_id = Some(subscription_id);
        transaction.is_subscription = true;
        self.transactions.push(transaction);
        self.persist_transactions();
    }

    // ========== Aggregate queries ==========

    pub fn active_subscriptions(&self) -> Vec<&Subscription> {
        self.subscriptions
            .iter()
            .filter(|s| s.active && !s.is_cancelled())
            .collect()
    }

    /// Total recurring spend normalized to a monthly figure.
    ///
    /// Weekly and bi-weekly scale by average occurrences per month;
    /// everything else (including quarterly) divides by twelve.
    pub fn total_monthly_recurring(&self) -> f64 {
        self.active_subscriptions()
            .iter()
            .map(|sub| match sub.frequency {
                Frequency::Weekly => sub.amount * WEEKS_PER_MONTH,
                Frequency::BiWeekly => sub.amount * BIWEEKS_PER_MONTH,
                Frequency::Monthly => sub.amount,
                _ => sub.amount / 12.0,
            })
            .sum()
    }

    /// Money freed by cancellations that fell inside the given month.
    /// Any day of the month identifies it.
    pub fn monthly_waste(&self, month: NaiveDate) -> f64 {
        let start = month.with_day(1).unwrap_or(month);
        let end = start
            .checked_add_months(Months::new(1))
            .unwrap_or_else(|| start + Duration::days(31));

        self.subscriptions
            .iter()
            .filter(|sub| match sub.cancelled_at {
                Some(cancelled_at) => {
                    let date = cancelled_at.date_naive();
                    date >= start && date < end
                }
                None => false,
            })
            .map(|sub| sub.amount)
            .sum()
    }

    /// Active subscriptions debiting within the next `days_ahead` days,
    /// soonest first.
    pub fn upcoming_debits(&self, days_ahead: i64) -> Vec<&Subscription> {
        let today = Utc::now().date_naive();
        let cutoff = today + Duration::days(days_ahead);

        let mut upcoming: Vec<&Subscription> = self
            .active_subscriptions()
            .into_iter()
            .filter(|s| s.next_debit_date >= today && s.next_debit_date <= cutoff)
            .collect();
        upcoming.sort_by_key(|s| s.next_debit_date);
        upcoming
    }

    // ========== Internals ==========

    /// Merge-or-create matching policy: case-insensitive name equality
    /// against live subscriptions.
    ///
    /// Known to false-merge unrelated services that share a display name
    /// and to false-split renamed services. A stricter matcher (merchant +
    /// amount range) can replace this function without touching the
    /// ingestion control flow.
    fn match_active_by_name(&self, name: &str) -> Option<usize> {
        let needle = name.to_lowercase();
        self.subscriptions
            .iter()
            .position(|s| s.active && !s.is_cancelled() && s.name.to_lowercase() == needle)
    }

    fn request_upsert_effects(&self, subscription: &Subscription) {
        if let Some(effects) = &self.effects {
            effects.send(SideEffect::SubscriptionUpserted(subscription.clone()));
        }
    }

    fn persist_subscriptions(&self) {
        if let Err(e) = self.store.save_subscriptions(&self.subscriptions) {
            warn!("Failed to save subscriptions: {}", e);
        }
    }

    fn persist_transactions(&self) {
        if let Err(e) = self.store.save_transactions(&self.transactions) {
            warn!("Failed to save transactions: {}", e);
        }
    }
}
