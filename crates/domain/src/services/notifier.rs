//! Live update notifier for subscription changes.
//!
//! Change events are published onto an in-process broadcast channel (fed by
//! the database change feed) and delivered to per-seller listeners. The
//! notifier only signals; recomputation is the listener's business.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Default broadcast buffer size.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Kind of row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeOperation {
    Insert,
    Update,
    Delete,
}

/// A change to a subscription row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionChange {
    pub operation: ChangeOperation,
    pub subscription_id: Uuid,
    pub device_id: Option<String>,
    pub seller_id: Option<Uuid>,
}

/// What a listener is told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveEvent {
    /// A change for the listener's seller.
    Change(SubscriptionChange),
    /// The listener fell behind and `skipped` changes were discarded unseen.
    /// Some may have been for this seller, so state must be reloaded.
    Resync { skipped: u64 },
}

/// Error type for listener registration.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("No async runtime available to run the listener")]
    NoRuntime,
}

/// Fan-out of subscription changes to per-seller listeners.
#[derive(Debug, Clone)]
pub struct EarningsNotifier {
    sender: broadcast::Sender<SubscriptionChange>,
}

impl Default for EarningsNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl EarningsNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish a change. Returns the number of listeners that received it.
    pub fn publish(&self, change: SubscriptionChange) -> usize {
        self.sender.send(change).unwrap_or(0)
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Invoke `on_change` for every change whose `seller_id` matches.
    ///
    /// The callback runs on a spawned task, one event at a time. If the
    /// listener lags behind the channel it receives a single
    /// [`LiveEvent::Resync`] in place of the discarded changes. Dropping or
    /// unsubscribing the returned handle stops delivery.
    pub fn subscribe<F, Fut>(
        &self,
        seller_id: Uuid,
        on_change: F,
    ) -> Result<SubscriptionHandle, NotifierError>
    where
        F: Fn(LiveEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| NotifierError::NoRuntime)?;
        let mut receiver = self.sender.subscribe();
        let active = Arc::new(AtomicBool::new(true));
        let task_active = active.clone();

        let task = runtime.spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(change) => {
                        if !task_active.load(Ordering::SeqCst) {
                            break;
                        }
                        if change.seller_id == Some(seller_id) {
                            debug!(
                                seller_id = %seller_id,
                                subscription_id = %change.subscription_id,
                                operation = ?change.operation,
                                "Delivering subscription change"
                            );
                            on_change(LiveEvent::Change(change)).await;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        if !task_active.load(Ordering::SeqCst) {
                            break;
                        }
                        warn!(seller_id = %seller_id, skipped, "Change listener lagged, resyncing");
                        on_change(LiveEvent::Resync { skipped }).await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(SubscriptionHandle {
            seller_id,
            active,
            task: Mutex::new(Some(task)),
        })
    }
}

/// Registration returned by [`EarningsNotifier::subscribe`].
#[derive(Debug)]
pub struct SubscriptionHandle {
    seller_id: Uuid,
    active: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SubscriptionHandle {
    pub fn seller_id(&self) -> Uuid {
        self.seller_id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop delivery. Calling it again is a no-op.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        let task = self.task.lock().ok().and_then(|mut guard| guard.take());
        if let Some(task) = task {
            task.abort();
        }
        debug!(seller_id = %self.seller_id, "Change listener removed");
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
