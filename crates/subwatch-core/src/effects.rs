//! Fire-and-forget side effects
//!
//! Ledger mutations stay synchronous; notification scheduling and calendar
//! sync are handed to a background worker over a channel. Collaborator
//! failures are logged and swallowed there; they never reach, block, or
//! roll back the mutation that triggered them.
//!
//! The calendar collaborator can mint an event id for a subscription. To
//! keep all ledger mutation on the single writer, the worker reports that
//! id on an outcome channel instead of touching the ledger itself; the
//! owner drains the channel and applies `Ledger::apply_calendar_update`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Result;
use crate::models::{Subscription, SubscriptionId};

/// Renewal-reminder collaborator (push notifications or similar).
///
/// Both calls are best-effort. Implementations decide delivery mechanics;
/// the worker has already filtered out subscriptions that should not be
/// reminded about.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Schedule a reminder ahead of the subscription's next debit
    async fn schedule(&self, subscription: &Subscription, lead_days: i64) -> Result<()>;

    /// Drop any pending reminder for the subscription
    async fn cancel(&self, subscription_id: SubscriptionId) -> Result<()>;
}

/// Calendar collaborator mirroring renewals as calendar events.
#[async_trait]
pub trait Calendar: Send + Sync {
    /// Create or update the renewal event; returns the event id, if one
    /// now exists
    async fn sync(&self, subscription: &Subscription) -> Result<Option<String>>;

    /// Remove a previously created event
    async fn remove(&self, event_id: &str) -> Result<()>;
}

/// Request handed to the worker after a ledger mutation
#[derive(Debug, Clone)]
pub enum SideEffect {
    /// A subscription was added, updated, or cancelled
    SubscriptionUpserted(Subscription),
    /// A subscription was removed outright
    SubscriptionRemoved {
        id: SubscriptionId,
        calendar_event_id: Option<String>,
    },
}

/// Fact reported back by the worker for the ledger owner to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectOutcome {
    CalendarEventLinked {
        subscription_id: SubscriptionId,
        event_id: String,
    },
}

/// Sending half of the effect channel. Sends never block and never fail
/// the caller; a closed channel is logged and ignored.
#[derive(Clone)]
pub struct EffectSender {
    tx: mpsc::UnboundedSender<SideEffect>,
}

impl EffectSender {
    pub fn send(&self, effect: SideEffect) {
        if self.tx.send(effect).is_err() {
            warn!("Effect worker is gone, dropping side effect");
        }
    }
}

/// Spawn the background worker.
///
/// Returns the sender to hand to the ledger and the outcome receiver for
/// calendar event-id write-backs.
pub fn spawn_effect_worker(
    notifier: Arc<dyn Notifier>,
    calendar: Arc<dyn Calendar>,
    config: Config,
) -> (EffectSender, mpsc::UnboundedReceiver<EffectOutcome>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<SideEffect>();
    let (outcome_tx, outcome_rx) = mpsc::unbounded_channel::<EffectOutcome>();

    tokio::spawn(async move {
        while let Some(effect) = rx.recv().await {
            match effect {
                SideEffect::SubscriptionUpserted(sub) => {
                    handle_upserted(&*notifier, &*calendar, &outcome_tx, &sub, &config).await;
                }
                SideEffect::SubscriptionRemoved {
                    id,
                    calendar_event_id,
                } => {
                    handle_removed(&*notifier, &*calendar, id, calendar_event_id).await;
                }
            }
        }
        debug!("Effect worker shutting down");
    });

    (EffectSender { tx }, outcome_rx)
}

async fn handle_upserted(
    notifier: &dyn Notifier,
    calendar: &dyn Calendar,
    outcome_tx: &mpsc::UnboundedSender<EffectOutcome>,
    sub: &Subscription,
    config: &Config,
) {
    // Reminders only make sense for live subscriptions with a future debit
    if sub.active && !sub.is_cancelled() && sub.days_until_debit() > config.reminder_lead_days {
        if let Err(e) = notifier.schedule(sub, config.reminder_lead_days).await {
            warn!("Failed to schedule reminder for {}: {}", sub.name, e);
        }
    } else if let Err(e) = notifier.cancel(sub.id).await {
        warn!("Failed to cancel reminder for {}: {}", sub.name, e);
    }

    if sub.sync_to_calendar && sub.active && !sub.is_cancelled() {
        match calendar.sync(sub).await {
            Ok(Some(event_id)) => {
                if sub.calendar_event_id.as_deref() != Some(event_id.as_str()) {
                    let _ = outcome_tx.send(EffectOutcome::CalendarEventLinked {
                        subscription_id: sub.id,
                        event_id,
                    });
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Calendar sync failed for {}: {}", sub.name, e),
        }
    } else if let Some(event_id) = &sub.calendar_event_id {
        if let Err(e) = calendar.remove(event_id).await {
            warn!("Calendar event removal failed for {}: {}", sub.name, e);
        }
    }
}

async fn handle_removed(
    notifier: &dyn Notifier,
    calendar: &dyn Calendar,
    id: SubscriptionId,
    calendar_event_id: Option<String>,
) {
    if let Err(e) = notifier.cancel(id).await {
        warn!("Failed to cancel reminder for {}: {}", id, e);
    }
    if let Some(event_id) = calendar_event_id {
        if let Err(e) = calendar.remove(&event_id).await {
            warn!("Calendar event removal failed for {}: {}", id, e);
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Recording collaborators for tests

    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub enum NotifierCall {
        Schedule(SubscriptionId),
        Cancel(SubscriptionId),
    }

    #[derive(Default)]
    pub struct RecordingNotifier {
        pub calls: Mutex<Vec<NotifierCall>>,
        pub fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn schedule(&self, subscription: &Subscription, _lead_days: i64) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(NotifierCall::Schedule(subscription.id));
            if self.fail {
                return Err(crate::error::Error::ApiError("notifier down".into()));
            }
            Ok(())
        }

        async fn cancel(&self, subscription_id: SubscriptionId) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(NotifierCall::Cancel(subscription_id));
            if self.fail {
                return Err(crate::error::Error::ApiError("notifier down".into()));
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum CalendarCall {
        Sync(SubscriptionId),
        Remove(String),
    }

    #[derive(Default)]
    pub struct RecordingCalendar {
        pub calls: Mutex<Vec<CalendarCall>>,
        pub fail: bool,
    }

    #[async_trait]
    impl Calendar for RecordingCalendar {
        async fn sync(&self, subscription: &Subscription) -> Result<Option<String>> {
            self.calls
                .lock()
                .unwrap()
                .push(CalendarCall::Sync(subscription.id));
            if self.fail {
                return Err(crate::error::Error::NotAuthorized);
            }
            Ok(Some(format!("evt-{}", subscription.id)))
        }

        async fn remove(&self, event_id: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(CalendarCall::Remove(event_id.to_string()));
            if self.fail {
                return Err(crate::error::Error::DeleteFailed("calendar down".into()));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::models::{Category, Frequency};
    use chrono::{Duration, Utc};

    fn future_sub(days_ahead: i64) -> Subscription {
        Subscription::new(
            "Netflix",
            499.0,
            Frequency::Monthly,
            Utc::now().date_naive() + Duration::days(days_ahead),
            Category::Ott,
        )
    }

    async fn drain() {
        // Give the worker time to process everything queued so far
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_upsert_schedules_reminder() {
        let notifier = Arc::new(RecordingNotifier::default());
        let calendar = Arc::new(RecordingCalendar::default());
        let (sender, _outcomes) =
            spawn_effect_worker(notifier.clone(), calendar.clone(), Config::default());

        let sub = future_sub(10);
        sender.send(SideEffect::SubscriptionUpserted(sub.clone()));
        drain().await;

        assert_eq!(
            notifier.calls.lock().unwrap().as_slice(),
            &[NotifierCall::Schedule(sub.id)]
        );
        // Calendar untouched: sync_to_calendar is off
        assert!(calendar.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_subscription_cancels_reminder() {
        let notifier = Arc::new(RecordingNotifier::default());
        let calendar = Arc::new(RecordingCalendar::default());
        let (sender, _outcomes) =
            spawn_effect_worker(notifier.clone(), calendar.clone(), Config::default());

        let mut sub = future_sub(10);
        sub.active = false;
        sub.cancelled_at = Some(Utc::now());
        sender.send(SideEffect::SubscriptionUpserted(sub.clone()));
        drain().await;

        assert_eq!(
            notifier.calls.lock().unwrap().as_slice(),
            &[NotifierCall::Cancel(sub.id)]
        );
    }

    #[tokio::test]
    async fn test_imminent_debit_skips_reminder() {
        let notifier = Arc::new(RecordingNotifier::default());
        let calendar = Arc::new(RecordingCalendar::default());
        let (sender, _outcomes) =
            spawn_effect_worker(notifier.clone(), calendar.clone(), Config::default());

        // Debit tomorrow, reminder lead is 3 days: the reminder date is in
        // the past, so nothing is scheduled
        let sub = future_sub(1);
        sender.send(SideEffect::SubscriptionUpserted(sub.clone()));
        drain().await;

        assert_eq!(
            notifier.calls.lock().unwrap().as_slice(),
            &[NotifierCall::Cancel(sub.id)]
        );
    }

    #[tokio::test]
    async fn test_calendar_sync_reports_event_link() {
        let notifier = Arc::new(RecordingNotifier::default());
        let calendar = Arc::new(RecordingCalendar::default());
        let (sender, mut outcomes) =
            spawn_effect_worker(notifier.clone(), calendar.clone(), Config::default());

        let mut sub = future_sub(10);
        sub.sync_to_calendar = true;
        sender.send(SideEffect::SubscriptionUpserted(sub.clone()));
        drain().await;

        assert_eq!(
            calendar.calls.lock().unwrap().as_slice(),
            &[CalendarCall::Sync(sub.id)]
        );
        assert_eq!(
            outcomes.recv().await,
            Some(EffectOutcome::CalendarEventLinked {
                subscription_id: sub.id,
                event_id: format!("evt-{}", sub.id),
            })
        );
    }

    #[tokio::test]
    async fn test_removal_requests_cleanup() {
        let notifier = Arc::new(RecordingNotifier::default());
        let calendar = Arc::new(RecordingCalendar::default());
        let (sender, _outcomes) =
            spawn_effect_worker(notifier.clone(), calendar.clone(), Config::default());

        let sub = future_sub(10);
        sender.send(SideEffect::SubscriptionRemoved {
            id: sub.id,
            calendar_event_id: Some("evt-1".into()),
        });
        drain().await;

        assert_eq!(
            notifier.calls.lock().unwrap().as_slice(),
            &[NotifierCall::Cancel(sub.id)]
        );
        assert_eq!(
            calendar.calls.lock().unwrap().as_slice(),
            &[CalendarCall::Remove("evt-1".into())]
        );
    }

    #[tokio::test]
    async fn test_collaborator_errors_are_swallowed() {
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let calendar = Arc::new(RecordingCalendar {
            fail: true,
            ..Default::default()
        });
        let (sender, _outcomes) =
            spawn_effect_worker(notifier.clone(), calendar.clone(), Config::default());

        let mut sub = future_sub(10);
        sub.sync_to_calendar = true;
        sender.send(SideEffect::SubscriptionUpserted(sub.clone()));
        // Worker keeps running; a second effect is still processed
        sender.send(SideEffect::SubscriptionUpserted(sub.clone()));
        drain().await;

        assert_eq!(notifier.calls.lock().unwrap().len(), 2);
        assert_eq!(calendar.calls.lock().unwrap().len(), 2);
    }
}
