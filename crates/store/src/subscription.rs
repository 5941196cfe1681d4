//! Live query subscriptions.
//!
//! A [`Subscription`] is a scoped resource: the backing watcher task runs
//! only while the handle is alive, and is stopped both by an explicit
//! [`Subscription::unsubscribe`] and by dropping the handle, so the
//! provider-side resources are released on every exit path, error paths
//! included.

use log::debug;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle to a live query result set.
///
/// Snapshots of the full matching result set are delivered in order: the
/// current snapshot first, then a fresh one for every observed change.
/// Two snapshots are never coalesced out of order, but there is no
/// ordering guarantee relative to other subscriptions.
pub struct Subscription {
    changes: mpsc::UnboundedReceiver<Vec<Value>>,
    guard: SubscriptionGuard,
}

impl Subscription {
    pub(crate) fn new(
        changes: mpsc::UnboundedReceiver<Vec<Value>>,
        stop: Arc<AtomicBool>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            changes,
            guard: SubscriptionGuard {
                stop,
                task: Some(task),
            },
        }
    }

    /// Wait for the next snapshot. Returns `None` once the subscription
    /// has ended.
    pub async fn next(&mut self) -> Option<Vec<Value>> {
        self.changes.recv().await
    }

    /// Release the subscription deterministically.
    pub fn unsubscribe(self) {
        // Consuming self drops the guard, which stops the watcher.
    }
}

struct SubscriptionGuard {
    stop: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        debug!("subscription released");
    }
}
