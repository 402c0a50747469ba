//! Blocking acquisition for synchronous callers

use crate::api::coordinator::AcquisitionCoordinator;
use crate::api::types::{ApiError, ApiResult, Outcome};
use crate::source::PositionSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Builder, Handle};

impl AcquisitionCoordinator {
    /// Acquire a fix, blocking the calling thread for at most `budget` plus
    /// the cached-fix lookup.
    ///
    /// Runs the race on a private current-thread runtime, so it must not be
    /// called from inside a tokio runtime.
    pub fn acquire_blocking(
        &self,
        sources: &[Arc<dyn PositionSource>],
        budget: Duration,
    ) -> ApiResult<Outcome> {
        if Handle::try_current().is_ok() {
            return Err(ApiError::NestedRuntime);
        }

        let runtime = Builder::new_current_thread().enable_time().build()?;
        Ok(runtime.block_on(self.acquire_within(sources, budget)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::FixOrigin;
    use crate::core::Fix;
    use crate::source::MockSource;
    use std::thread;

    #[test]
    fn test_falls_back_to_cached_fix() {
        let gps = Arc::new(MockSource::new("gps").with_cached_fix(Fix::new(48.85, 2.35, 77)));
        let sources: Vec<Arc<dyn PositionSource>> = vec![gps.clone() as Arc<dyn PositionSource>];
        let coordinator = AcquisitionCoordinator::default();

        let outcome = coordinator
            .acquire_blocking(&sources, Duration::from_millis(20))
            .unwrap();

        assert_eq!(outcome.origin(), Some(FixOrigin::Cached));
        assert_eq!(outcome.fix(), Some(&Fix::new(48.85, 2.35, 77)));
        assert_eq!(gps.active_subscriptions(), 0);
    }

    #[test]
    fn test_live_fix_from_another_thread() {
        let gps = Arc::new(MockSource::new("gps"));
        let sources: Vec<Arc<dyn PositionSource>> = vec![gps.clone() as Arc<dyn PositionSource>];
        let coordinator = AcquisitionCoordinator::default();

        let reporter = {
            let gps = gps.clone();
            thread::spawn(move || {
                while gps.active_subscriptions() == 0 {
                    thread::sleep(Duration::from_millis(1));
                }
                gps.push_fix(Fix::new(1.0, 1.0, 9));
            })
        };

        let outcome = coordinator
            .acquire_blocking(&sources, Duration::from_secs(30))
            .unwrap();
        reporter.join().unwrap();

        assert_eq!(outcome.origin(), Some(FixOrigin::Live));
        assert_eq!(outcome.fix().map(|fix| fix.timestamp_ms()), Some(9));
    }

    #[test]
    fn test_no_sources() {
        let coordinator = AcquisitionCoordinator::default();
        let outcome = coordinator
            .acquire_blocking(&[], Duration::from_secs(30))
            .unwrap();
        assert_eq!(outcome, Outcome::NoSourcesAvailable);
    }

    #[tokio::test]
    async fn test_rejected_inside_runtime() {
        let coordinator = AcquisitionCoordinator::default();
        let result = coordinator.acquire_blocking(&[], Duration::from_secs(1));
        assert!(matches!(result, Err(ApiError::NestedRuntime)));
    }
}
