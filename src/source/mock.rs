//! Mock position source for testing and development

use crate::core::Fix;
use crate::source::{FixCallback, PositionSource, SourceError, SourceResult, SubscriptionHandle};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Faults a mock source can be told to produce
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockFailures {
    /// `subscribe` returns an error
    pub refuse_subscribe: bool,
    /// `unsubscribe` returns an error (the listener is still removed)
    pub fail_unsubscribe: bool,
    /// `last_known_fix` returns an error
    pub fail_lookup: bool,
    /// `last_known_fix` panics
    pub panic_on_lookup: bool,
}

struct MockState {
    available: bool,
    cached_fix: Option<Fix>,
    deliver_on_subscribe: Option<Fix>,
    failures: MockFailures,
    listeners: HashMap<SubscriptionHandle, FixCallback>,
    next_handle: u64,
    subscribe_calls: u32,
    unsubscribe_calls: u32,
}

/// Scriptable position source.
///
/// Availability, the cached fix and live fixes are all driven by the test or
/// demo code holding the source.
pub struct MockSource {
    name: String,
    state: Mutex<MockState>,
}

impl MockSource {
    /// Create an available mock source with no cached fix
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Mutex::new(MockState {
                available: true,
                cached_fix: None,
                deliver_on_subscribe: None,
                failures: MockFailures::default(),
                listeners: HashMap::new(),
                next_handle: 0,
                subscribe_calls: 0,
                unsubscribe_calls: 0,
            }),
        }
    }

    /// Create a mock source that reports itself disabled
    pub fn unavailable(name: &str) -> Self {
        let source = Self::new(name);
        source.set_available(false);
        source
    }

    pub fn with_cached_fix(self, fix: Fix) -> Self {
        self.set_cached_fix(Some(fix));
        self
    }

    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    pub fn set_cached_fix(&self, fix: Option<Fix>) {
        self.lock().cached_fix = fix;
    }

    /// Deliver `fix` to each new listener from inside `subscribe`
    pub fn deliver_on_subscribe(&self, fix: Fix) {
        self.lock().deliver_on_subscribe = Some(fix);
    }

    pub fn simulate_failures(&self, failures: MockFailures) {
        self.lock().failures = failures;
    }

    /// Push a live fix to every current listener.
    ///
    /// Listeners run without the internal lock held, so they may unsubscribe
    /// themselves. The pushed fix also becomes the cached fix. Returns the
    /// number of listeners notified.
    pub fn push_fix(&self, fix: Fix) -> usize {
        let listeners: Vec<FixCallback> = {
            let mut state = self.lock();
            state.cached_fix = Some(fix);
            state.listeners.values().cloned().collect()
        };

        for listener in &listeners {
            listener(fix);
        }
        listeners.len()
    }

    /// Number of listeners currently registered
    pub fn active_subscriptions(&self) -> usize {
        self.lock().listeners.len()
    }

    pub fn subscribe_calls(&self) -> u32 {
        self.lock().subscribe_calls
    }

    pub fn unsubscribe_calls(&self) -> u32 {
        self.lock().unsubscribe_calls
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PositionSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.lock().available
    }

    fn subscribe(&self, on_fix: FixCallback) -> SourceResult<SubscriptionHandle> {
        let (handle, immediate) = {
            let mut state = self.lock();
            state.subscribe_calls += 1;

            if state.failures.refuse_subscribe {
                return Err(SourceError::SubscriptionRefused {
                    provider: self.name.clone(),
                    reason: "simulated refusal".to_string(),
                });
            }
            if !state.available {
                return Err(SourceError::Unavailable {
                    provider: self.name.clone(),
                });
            }

            state.next_handle += 1;
            let handle = SubscriptionHandle::new(state.next_handle);
            state.listeners.insert(handle, on_fix.clone());
            (handle, state.deliver_on_subscribe)
        };

        if let Some(fix) = immediate {
            on_fix(fix);
        }
        Ok(handle)
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) -> SourceResult<()> {
        let mut state = self.lock();
        state.unsubscribe_calls += 1;

        let removed = state.listeners.remove(&handle).is_some();
        if state.failures.fail_unsubscribe {
            return Err(SourceError::Platform {
                code: 3001,
                description: "simulated unsubscribe failure".to_string(),
            });
        }
        if removed {
            Ok(())
        } else {
            Err(SourceError::UnknownSubscription { handle })
        }
    }

    fn last_known_fix(&self) -> SourceResult<Option<Fix>> {
        let (failures, cached) = {
            let state = self.lock();
            (state.failures, state.cached_fix)
        };

        if failures.panic_on_lookup {
            panic!("mock source '{}' crashed during lookup", self.name);
        }
        if failures.fail_lookup {
            return Err(SourceError::LookupFailed {
                provider: self.name.clone(),
                reason: "simulated lookup failure".to_string(),
            });
        }
        Ok(cached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_listener(counter: &Arc<AtomicUsize>) -> FixCallback {
        let counter = counter.clone();
        Arc::new(move |_fix| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_mock_source_creation() {
        let source = MockSource::new("gps");
        assert_eq!(source.name(), "gps");
        assert!(source.is_available());
        assert_eq!(source.active_subscriptions(), 0);
        assert_eq!(source.last_known_fix().unwrap(), None);
    }

    #[test]
    fn test_unavailable_source() {
        let source = MockSource::unavailable("network");
        assert!(!source.is_available());

        let counter = Arc::new(AtomicUsize::new(0));
        let result = source.subscribe(counting_listener(&counter));
        assert!(matches!(result, Err(SourceError::Unavailable { .. })));
    }

    #[test]
    fn test_push_reaches_listeners_and_updates_cache() {
        let source = MockSource::new("gps");
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = source.subscribe(counting_listener(&counter)).unwrap();

        let fix = Fix::new(1.0, 2.0, 300);
        assert_eq!(source.push_fix(fix), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(source.last_known_fix().unwrap(), Some(fix));

        source.unsubscribe(handle).unwrap();
        assert_eq!(source.push_fix(fix), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_double_unsubscribe_is_reported() {
        let source = MockSource::new("gps");
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = source.subscribe(counting_listener(&counter)).unwrap();

        source.unsubscribe(handle).unwrap();
        let result = source.unsubscribe(handle);
        assert_eq!(result, Err(SourceError::UnknownSubscription { handle }));
        assert_eq!(source.unsubscribe_calls(), 2);
    }

    #[test]
    fn test_listener_may_unsubscribe_itself() {
        let source = Arc::new(MockSource::new("gps"));
        let slot: Arc<Mutex<Option<SubscriptionHandle>>> = Arc::new(Mutex::new(None));

        let inner_source = source.clone();
        let inner_slot = slot.clone();
        let listener: FixCallback = Arc::new(move |_fix| {
            if let Some(handle) = inner_slot.lock().unwrap().take() {
                inner_source.unsubscribe(handle).unwrap();
            }
        });

        let handle = source.subscribe(listener).unwrap();
        *slot.lock().unwrap() = Some(handle);

        source.push_fix(Fix::new(0.0, 0.0, 1));
        assert_eq!(source.active_subscriptions(), 0);
    }

    #[test]
    fn test_deliver_on_subscribe() {
        let source = MockSource::new("gps");
        source.deliver_on_subscribe(Fix::new(0.0, 0.0, 5));

        let counter = Arc::new(AtomicUsize::new(0));
        source.subscribe(counting_listener(&counter)).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_simulation() {
        let source = MockSource::new("gps").with_cached_fix(Fix::new(0.0, 0.0, 9));
        source.simulate_failures(MockFailures {
            refuse_subscribe: true,
            fail_lookup: true,
            ..MockFailures::default()
        });

        let counter = Arc::new(AtomicUsize::new(0));
        assert!(matches!(
            source.subscribe(counting_listener(&counter)),
            Err(SourceError::SubscriptionRefused { .. })
        ));
        assert!(matches!(
            source.last_known_fix(),
            Err(SourceError::LookupFailed { .. })
        ));
        assert_eq!(source.subscribe_calls(), 1);
    }
}
