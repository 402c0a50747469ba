//! Acquisition coordinator
//!
//! Races any number of position sources against a deadline and returns the
//! best location available when the race ends:
//!
//! 1. Sources that report themselves unavailable are skipped. With none left
//!    the call resolves at once with [`Outcome::NoSourcesAvailable`], without
//!    subscribing to anything or arming a timer.
//! 2. The first live fix from any source wins.
//! 3. If the deadline elapses first, every originally-available source is
//!    asked for its last known fix and the newest one wins (equal timestamps
//!    are resolved by the configured [`TieBreak`](crate::api::selection::TieBreak)).
//!
//! In every case the deadline is disarmed and all listeners are released
//! before the outcome is handed back.
//!
//! A source that becomes unavailable mid-race is not detected; the race only
//! ends on a fix or on the deadline.

use crate::api::session::{AcquisitionSession, Begin, SessionParams};
use crate::api::types::{CoordinatorStats, FixOrigin, Outcome};
use crate::source::PositionSource;
use crate::timer::{Timer, TokioTimer};
use crate::utils::config::{AcquisitionConfig, ConfigError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info_span, Instrument, Span};

#[derive(Default)]
struct StatsCounters {
    sessions_started: AtomicU64,
    live_fixes: AtomicU64,
    cached_fixes: AtomicU64,
    no_fix: AtomicU64,
    no_sources: AtomicU64,
}

impl StatsCounters {
    fn snapshot(&self) -> CoordinatorStats {
        CoordinatorStats {
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            live_fixes: self.live_fixes.load(Ordering::Relaxed),
            cached_fixes: self.cached_fixes.load(Ordering::Relaxed),
            no_fix: self.no_fix.load(Ordering::Relaxed),
            no_sources: self.no_sources.load(Ordering::Relaxed),
        }
    }
}

struct CoordinatorInner {
    config: AcquisitionConfig,
    timer: Arc<dyn Timer>,
    counters: StatsCounters,
    next_session: AtomicU64,
}

/// Bounded-latency location acquisition.
///
/// Cheap to clone; clones share configuration, timer and statistics. Each
/// call to an `acquire*` method is an independent session that races exactly
/// once; retrying is up to the caller.
#[derive(Clone)]
pub struct AcquisitionCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl AcquisitionCoordinator {
    /// Create a coordinator whose deadlines run on the ambient tokio runtime
    pub fn new(config: AcquisitionConfig) -> Result<Self, ConfigError> {
        Self::with_timer(config, Arc::new(TokioTimer::new()))
    }

    /// Create a coordinator with a custom deadline timer
    pub fn with_timer(
        config: AcquisitionConfig,
        timer: Arc<dyn Timer>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, timer))
    }

    fn build(config: AcquisitionConfig, timer: Arc<dyn Timer>) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                timer,
                counters: StatsCounters::default(),
                next_session: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.inner.config
    }

    /// Acquire a fix using the configured budget
    pub async fn acquire(&self, sources: &[Arc<dyn PositionSource>]) -> Outcome {
        self.acquire_within(sources, self.inner.config.budget()).await
    }

    /// Acquire a fix within `budget`.
    ///
    /// Dropping the returned future before it completes releases every
    /// subscription and disarms the deadline.
    pub async fn acquire_within(
        &self,
        sources: &[Arc<dyn PositionSource>],
        budget: Duration,
    ) -> Outcome {
        let (span, begin) = self.start(sources, budget);
        let outcome = match begin {
            Begin::Settled(outcome) => outcome,
            Begin::Racing(session) => session.resolve().instrument(span).await,
        };
        self.record(&outcome);
        outcome
    }

    /// Snapshot of the counters accumulated across sessions
    pub fn stats(&self) -> CoordinatorStats {
        self.inner.counters.snapshot()
    }

    /// Open a session: probe, subscribe and arm the deadline synchronously
    pub(crate) fn start(
        &self,
        sources: &[Arc<dyn PositionSource>],
        budget: Duration,
    ) -> (Span, Begin) {
        let session = self.inner.next_session.fetch_add(1, Ordering::Relaxed) + 1;
        self.inner
            .counters
            .sessions_started
            .fetch_add(1, Ordering::Relaxed);

        let span = info_span!("acquisition", session, sources = sources.len());
        let params = SessionParams {
            budget,
            tie_break: self.inner.config.tie_break,
        };
        let begin = span.in_scope(|| {
            AcquisitionSession::begin(sources, params, self.inner.timer.clone())
        });
        (span, begin)
    }

    pub(crate) fn record(&self, outcome: &Outcome) {
        let counters = &self.inner.counters;
        let counter = match outcome {
            Outcome::NoSourcesAvailable => &counters.no_sources,
            Outcome::NoFixObtained => &counters.no_fix,
            Outcome::Fix {
                origin: FixOrigin::Live,
                ..
            } => &counters.live_fixes,
            Outcome::Fix {
                origin: FixOrigin::Cached,
                ..
            } => &counters.cached_fixes,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for AcquisitionCoordinator {
    fn default() -> Self {
        Self::build(AcquisitionConfig::default(), Arc::new(TokioTimer::new()))
    }
}
