//! Callback-style acquisition
//!
//! For callers that cannot await: the race is started synchronously and the
//! outcome is delivered to a one-shot callback, either immediately or from a
//! task on the current tokio runtime.

use crate::api::coordinator::AcquisitionCoordinator;
use crate::api::session::Begin;
use crate::api::types::{ApiError, ApiResult, Outcome};
use crate::source::PositionSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::Instrument;

/// Receives the outcome of one acquisition, exactly once
pub type OutcomeCallback = Box<dyn FnOnce(Outcome) + Send + 'static>;

impl AcquisitionCoordinator {
    /// Start an acquisition and report its outcome through `on_outcome`.
    ///
    /// Returns `Ok(true)` if a race was started. Returns `Ok(false)` if no
    /// source was available; `on_outcome` has then already been called with
    /// [`Outcome::NoSourcesAvailable`] before this returns. Must be called
    /// from within a tokio runtime.
    pub fn acquire_with_callback(
        &self,
        sources: &[Arc<dyn PositionSource>],
        budget: Duration,
        on_outcome: OutcomeCallback,
    ) -> ApiResult<bool> {
        let runtime = Handle::try_current().map_err(|_| ApiError::NoRuntime)?;

        let (span, begin) = self.start(sources, budget);
        match begin {
            Begin::Settled(outcome) => {
                self.record(&outcome);
                on_outcome(outcome);
                Ok(false)
            }
            Begin::Racing(session) => {
                let coordinator = self.clone();
                runtime.spawn(async move {
                    let outcome = session.resolve().instrument(span).await;
                    coordinator.record(&outcome);
                    on_outcome(outcome);
                });
                Ok(true)
            }
        }
    }
}
