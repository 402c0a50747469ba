//! Timer backed by tokio sleep tasks

use super::{FireCallback, Timer, TimerError, TimerHandle, TimerResult};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::trace;

type PendingTasks = Arc<Mutex<HashMap<TimerHandle, AbortHandle>>>;

/// Timer that spawns one sleeping task per alarm on the current runtime.
///
/// Cancelling aborts the task. Must be started from within a tokio runtime.
#[derive(Default)]
pub struct TokioTimer {
    next_id: AtomicU64,
    pending: PendingTasks,
}

impl TokioTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers started but neither fired nor cancelled
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }
}

fn lock(pending: &PendingTasks) -> MutexGuard<'_, HashMap<TimerHandle, AbortHandle>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Timer for TokioTimer {
    fn start(&self, duration: Duration, on_fire: FireCallback) -> TimerResult<TimerHandle> {
        let runtime = Handle::try_current().map_err(|_| TimerError::NoRuntime)?;
        // Sleep registration panics when the runtime has no time driver.
        let sleep = panic::catch_unwind(AssertUnwindSafe(|| tokio::time::sleep(duration)))
            .map_err(|_| TimerError::TimeDriverDisabled)?;
        let handle = TimerHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);

        // Hold the map while spawning so the task cannot remove its entry
        // before it has been inserted.
        let mut pending = lock(&self.pending);
        let tasks = self.pending.clone();
        let task = runtime.spawn(async move {
            sleep.await;
            let still_pending = lock(&tasks).remove(&handle).is_some();
            if still_pending {
                trace!(%handle, "timer fired");
                on_fire();
            }
        });
        pending.insert(handle, task.abort_handle());

        Ok(handle)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        match lock(&self.pending).remove(&handle) {
            Some(task) => {
                task.abort();
                trace!(%handle, "timer cancelled");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting(counter: &Arc<AtomicUsize>) -> FireCallback {
        let counter = counter.clone();
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let timer = TokioTimer::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let result = timer.start(Duration::from_secs(1), counting(&counter));
        assert_eq!(result, Err(TimerError::NoRuntime));
    }

    #[test]
    fn test_start_without_time_driver_fails() {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let timer = TokioTimer::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let result =
            runtime.block_on(async { timer.start(Duration::from_secs(1), counting(&counter)) });

        assert_eq!(result, Err(TimerError::TimeDriverDisabled));
        assert_eq!(timer.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_duration() {
        let timer = TokioTimer::new();
        let counter = Arc::new(AtomicUsize::new(0));
        timer.start(Duration::from_secs(10), counting(&counter)).unwrap();

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(timer.pending_count(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(timer.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let timer = TokioTimer::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = timer.start(Duration::from_secs(10), counting(&counter)).unwrap();

        assert!(timer.cancel(handle));
        assert!(!timer.cancel(handle));

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(timer.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_fire_reports_false() {
        let timer = TokioTimer::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = timer.start(Duration::from_millis(5), counting(&counter)).unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!timer.cancel(handle));
    }
}
