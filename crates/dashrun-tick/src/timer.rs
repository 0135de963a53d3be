//! One-shot delayed actions with explicit cancellation.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// A delayed action running on its own Tokio task.
///
/// The action runs once, `delay` after scheduling, unless [`cancel`] is
/// called first. Dropping the handle does NOT cancel the task; owners that
/// need cancellation must keep the handle and call [`cancel`] explicitly.
///
/// Canceling is best-effort once the delay has elapsed: an action that has
/// already started may be interrupted at its next `.await`, or may complete.
/// Callers that mutate shared state from the action should re-validate that
/// the action is still wanted after acquiring their lock.
///
/// [`cancel`]: ScheduledTask::cancel
#[derive(Debug)]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Schedules `action` to run after `delay`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn after<F>(delay: Duration, action: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        });
        Self { handle }
    }

    /// Cancels the action. Idempotent.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Returns `true` once the action has completed or been canceled.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
