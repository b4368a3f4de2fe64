//! Remaining-lock-time ticker for UI display.

use crate::guard::LockoutGuard;
use crate::providers::LockStore;
use crate::state::{Identifier, LockStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Periodically publishes the seconds left on a lock.
///
/// The ticker only reads lock state. It publishes `0` once the lock has
/// expired and then stops. Dropping the handle aborts the task.
#[derive(Debug)]
pub struct LockCountdown {
    receiver: watch::Receiver<u64>,
    handle: JoinHandle<()>,
}

impl LockCountdown {
    /// Start ticking for `identifier` every `tick`.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start<S>(guard: Arc<LockoutGuard<S>>, identifier: &str, tick: Duration) -> Self
    where
        S: LockStore + 'static,
    {
        let id = Identifier::new(identifier);
        let initial = remaining(&guard, &id).await;
        let (sender, receiver) = watch::channel(initial);

        let handle = tokio::spawn(async move {
            if initial == 0 {
                return;
            }

            let mut ticker = tokio::time::interval(tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let left = remaining(&guard, &id).await;
                if sender.send(left).is_err() || left == 0 {
                    break;
                }
            }

            tracing::debug!(key = %id, "Lock countdown finished");
        });

        Self { receiver, handle }
    }

    /// Seconds left at the last tick.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        *self.receiver.borrow()
    }

    /// Wait for the next published value.
    ///
    /// Returns `None` once the countdown has stopped.
    pub async fn changed(&mut self) -> Option<u64> {
        self.receiver.changed().await.ok()?;
        Some(*self.receiver.borrow_and_update())
    }

    /// A receiver for rendering elsewhere.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.receiver.clone()
    }

    /// `true` once the ticker task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop ticking now.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for LockCountdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn remaining<S: LockStore>(guard: &LockoutGuard<S>, id: &Identifier) -> u64 {
    match guard.peek(id).await {
        LockStatus::Locked {
            retry_after_seconds,
            ..
        } => retry_after_seconds,
        LockStatus::Open | LockStatus::Warning { .. } => 0,
    }
}
