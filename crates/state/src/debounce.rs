use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Trailing-edge debounce with a fixed delay.
///
/// Each [`call`](Debouncer::call) cancels the pending one and arms a new timer,
/// so the action runs once, with the last call's arguments, after `delay` of
/// inactivity. Dropping the debouncer cancels a pending action.
///
/// Calls must be made from within a tokio runtime.
pub struct Debouncer<T> {
    delay: Duration,
    action: Arc<dyn Fn(T) + Send + Sync>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F>(delay: Duration, action: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            delay,
            action: Arc::new(action),
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn call(&self, args: T) {
        let action = Arc::clone(&self.action);
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action(args);
        });

        if let Some(previous) = self.pending().replace(task) {
            previous.abort();
        }
    }

    /// Drops the pending call, if any. Returns whether one was cancelled.
    pub fn cancel(&self) -> bool {
        match self.pending().take() {
            Some(task) if !task.is_finished() => {
                task.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending().as_ref().is_some_and(|task| !task.is_finished())
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = pending.take() {
            task.abort();
        }
    }
}

impl<T> fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer").field("delay", &self.delay).finish_non_exhaustive()
    }
}
