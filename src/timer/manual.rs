//! Timer fired explicitly by its owner

use super::{FireCallback, Timer, TimerHandle, TimerResult};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

struct PendingAlarm {
    handle: TimerHandle,
    duration: Duration,
    on_fire: FireCallback,
}

/// Timer whose alarms only fire when [`ManualTimer::fire_all`] or
/// [`ManualTimer::fire`] is called. Useful for hosts with their own alarm
/// facility and for deterministic tests.
#[derive(Default)]
pub struct ManualTimer {
    next_id: AtomicU64,
    started: AtomicUsize,
    cancelled: AtomicUsize,
    pending: Mutex<Vec<PendingAlarm>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire one pending alarm. Returns false if it is not pending.
    pub fn fire(&self, handle: TimerHandle) -> bool {
        let alarm = {
            let mut pending = self.lock();
            let index = pending.iter().position(|alarm| alarm.handle == handle);
            index.map(|index| pending.remove(index))
        };

        match alarm {
            Some(alarm) => {
                (alarm.on_fire)();
                true
            }
            None => false,
        }
    }

    /// Fire every pending alarm in start order. Returns how many fired.
    pub fn fire_all(&self) -> usize {
        let alarms: Vec<PendingAlarm> = self.lock().drain(..).collect();
        let count = alarms.len();
        for alarm in alarms {
            (alarm.on_fire)();
        }
        count
    }

    /// Durations of the alarms still pending, in start order
    pub fn pending_durations(&self) -> Vec<Duration> {
        self.lock().iter().map(|alarm| alarm.duration).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    /// Total alarms ever started
    pub fn started_count(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Total alarms cancelled before firing
    pub fn cancelled_count(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PendingAlarm>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Timer for ManualTimer {
    fn start(&self, duration: Duration, on_fire: FireCallback) -> TimerResult<TimerHandle> {
        let handle = TimerHandle::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.started.fetch_add(1, Ordering::SeqCst);
        self.lock().push(PendingAlarm {
            handle,
            duration,
            on_fire,
        });
        Ok(handle)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        let mut pending = self.lock();
        match pending.iter().position(|alarm| alarm.handle == handle) {
            Some(index) => {
                pending.remove(index);
                self.cancelled.fetch_add(1, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_alarm_waits_for_fire() {
        let timer = ManualTimer::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        let handle = timer
            .start(
                Duration::from_secs(10),
                Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        assert_eq!(timer.pending_durations(), vec![Duration::from_secs(10)]);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        assert!(timer.fire(handle));
        assert!(!timer.fire(handle));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(timer.started_count(), 1);
    }

    #[test]
    fn test_cancelled_alarm_is_dropped() {
        let timer = ManualTimer::new();
        let handle = timer.start(Duration::from_secs(1), Box::new(|| {})).unwrap();

        assert!(timer.cancel(handle));
        assert!(!timer.cancel(handle));
        assert_eq!(timer.fire_all(), 0);
        assert_eq!(timer.cancelled_count(), 1);
        assert_eq!(timer.pending_count(), 0);
    }
}
