//! Acquisition session: one race between position sources and a deadline
//!
//! Every source listener and the deadline timer hold an [`Arbiter`]. Before an
//! arbiter posts its candidate into the session channel it must flip the
//! session's [`SettlementGuard`]; only one party can, so exactly one candidate
//! ever reaches the channel no matter how many threads report at once. The
//! session receives that candidate, tears down the timer and every
//! subscription, and only then produces the [`Outcome`].

use crate::api::selection::{select_latest, CachedCandidate, TieBreak};
use crate::api::types::{FixOrigin, Outcome, SessionState};
use crate::core::Fix;
use crate::source::{FixCallback, PositionSource, SourceResult, SubscriptionHandle};
use crate::timer::{Timer, TimerHandle};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Event proposed for settling a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Candidate {
    /// Live fix from the source at `index` in registration order
    Fix { index: usize, fix: Fix },
    /// Deadline elapsed (or could not be armed)
    Deadline,
}

/// Exactly-once settlement flag
#[derive(Debug, Default)]
pub(crate) struct SettlementGuard {
    settled: AtomicBool,
}

impl SettlementGuard {
    /// Returns true for the single caller that settles; every later call is a no-op
    pub(crate) fn try_settle(&self) -> bool {
        self.settled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }
}

/// Posting side of the arbitration point
#[derive(Clone)]
struct Arbiter {
    guard: Arc<SettlementGuard>,
    tx: mpsc::UnboundedSender<Candidate>,
}

impl Arbiter {
    fn submit(&self, candidate: Candidate) -> bool {
        if !self.guard.try_settle() {
            return false;
        }
        // A closed channel means the session was dropped mid-race.
        self.tx.send(candidate).is_ok()
    }
}

/// Per-session parameters
#[derive(Debug, Clone, Copy)]
pub(crate) struct SessionParams {
    pub budget: Duration,
    pub tie_break: TieBreak,
}

/// What starting a session produced
pub(crate) enum Begin {
    /// Resolved without racing
    Settled(Outcome),
    /// Listeners and deadline are armed
    Racing(AcquisitionSession),
}

/// State of one in-flight acquisition.
///
/// Dropping the session before it resolves releases every subscription and
/// cancels the deadline.
pub(crate) struct AcquisitionSession {
    /// Available sources in registration order
    sources: Vec<Arc<dyn PositionSource>>,
    /// One slot per source; `None` once released or if subscribing failed
    subscriptions: Vec<Option<SubscriptionHandle>>,
    timer: Arc<dyn Timer>,
    timer_handle: Option<TimerHandle>,
    guard: Arc<SettlementGuard>,
    events: mpsc::UnboundedReceiver<Candidate>,
    tie_break: TieBreak,
    state: SessionState,
}

impl AcquisitionSession {
    /// Filter available sources into a session that has not started racing
    fn idle(
        sources: &[Arc<dyn PositionSource>],
        params: SessionParams,
        timer: Arc<dyn Timer>,
    ) -> (Self, Arbiter) {
        let available: Vec<Arc<dyn PositionSource>> = sources
            .iter()
            .filter(|source| probe_available(source.as_ref()))
            .cloned()
            .collect();

        let (tx, events) = mpsc::unbounded_channel();
        let guard = Arc::new(SettlementGuard::default());
        let arbiter = Arbiter {
            guard: guard.clone(),
            tx,
        };

        let session = AcquisitionSession {
            subscriptions: vec![None; available.len()],
            sources: available,
            timer,
            timer_handle: None,
            guard,
            events,
            tie_break: params.tie_break,
            state: SessionState::Idle,
        };
        (session, arbiter)
    }

    /// Filter available sources, subscribe to them and arm the deadline
    pub(crate) fn begin(
        sources: &[Arc<dyn PositionSource>],
        params: SessionParams,
        timer: Arc<dyn Timer>,
    ) -> Begin {
        let (mut session, arbiter) = Self::idle(sources, params, timer);

        if session.sources.is_empty() {
            session.state = SessionState::NoSourcesAvailable;
            info!(offered = sources.len(), "no position sources available");
            return Begin::Settled(Outcome::NoSourcesAvailable);
        }

        for (index, source) in session.sources.iter().enumerate() {
            if session.guard.is_settled() {
                debug!(source = source.name(), "already settled; not subscribing");
                break;
            }
            let listener = arbiter.clone();
            let on_fix: FixCallback = Arc::new(move |fix| {
                listener.submit(Candidate::Fix { index, fix });
            });
            session.subscriptions[index] =
                shielded(source.name(), "subscribe", || source.subscribe(on_fix));
            debug!(
                source = source.name(),
                subscribed = session.subscriptions[index].is_some(),
                "listener registered"
            );
        }
        session.state = SessionState::Racing;

        if session.guard.is_settled() {
            debug!("settled while subscribing; deadline not armed");
            return Begin::Racing(session);
        }

        let deadline = arbiter.clone();
        let armed = session.timer.start(
            params.budget,
            Box::new(move || {
                deadline.submit(Candidate::Deadline);
            }),
        );
        match armed {
            Ok(handle) => {
                debug!(%handle, budget_ms = params.budget.as_millis() as u64, "deadline armed");
                session.timer_handle = Some(handle);
            }
            Err(error) => {
                warn!(%error, "deadline timer unavailable, settling on cached fixes");
                arbiter.submit(Candidate::Deadline);
            }
        }

        Begin::Racing(session)
    }

    /// Wait for the winning candidate, clean up, and produce the outcome
    pub(crate) async fn resolve(mut self) -> Outcome {
        let winner = self.events.recv().await;
        self.guard.try_settle();
        self.cancel_timer();
        self.release_subscriptions();

        match winner {
            Some(Candidate::Fix { index, fix }) => {
                self.state = SessionState::SettledByFix;
                let source = self.sources[index].name().to_string();
                info!(
                    source = %source,
                    latitude = fix.latitude(),
                    longitude = fix.longitude(),
                    timestamp_ms = fix.timestamp_ms(),
                    "settled by live fix"
                );
                Outcome::Fix {
                    fix,
                    source,
                    origin: FixOrigin::Live,
                }
            }
            Some(Candidate::Deadline) => {
                self.state = SessionState::SettledByTimeout;
                self.settle_from_cache()
            }
            None => {
                debug!("every listener and the deadline went away without reporting");
                self.state = SessionState::SettledByTimeout;
                self.settle_from_cache()
            }
        }
    }

    /// Query every originally-available source for its cached fix and pick the newest
    fn settle_from_cache(&self) -> Outcome {
        let candidates: Vec<CachedCandidate> = self
            .sources
            .iter()
            .enumerate()
            .filter_map(|(index, source)| {
                shielded(source.name(), "last_known_fix", || source.last_known_fix())
                    .flatten()
                    .map(|fix| CachedCandidate { index, fix })
            })
            .collect();

        match select_latest(candidates.iter().copied(), self.tie_break) {
            Some(CachedCandidate { index, fix }) => {
                let source = self.sources[index].name().to_string();
                info!(
                    source = %source,
                    cached = candidates.len(),
                    timestamp_ms = fix.timestamp_ms(),
                    "deadline elapsed, using cached fix"
                );
                Outcome::Fix {
                    fix,
                    source,
                    origin: FixOrigin::Cached,
                }
            }
            None => {
                info!(sources = self.sources.len(), "deadline elapsed with no fix");
                Outcome::NoFixObtained
            }
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer_handle.take() {
            let cancelled = self.timer.cancel(handle);
            debug!(%handle, cancelled, "deadline disarmed");
        }
    }

    /// Release every live subscription. Safe to call repeatedly.
    fn release_subscriptions(&mut self) {
        for (source, slot) in self.sources.iter().zip(self.subscriptions.iter_mut()) {
            if let Some(handle) = slot.take() {
                shielded(source.name(), "unsubscribe", || source.unsubscribe(handle));
                debug!(source = source.name(), %handle, "listener released");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    /// Subscriptions not yet released
    #[cfg(test)]
    pub(crate) fn live_subscriptions(&self) -> usize {
        self.subscriptions.iter().filter(|slot| slot.is_some()).count()
    }
}

impl Drop for AcquisitionSession {
    fn drop(&mut self) {
        if !self.state.is_terminal() {
            debug!("session dropped before settlement");
        }
        self.guard.try_settle();
        self.cancel_timer();
        self.release_subscriptions();
    }
}

/// Availability probe; a panicking source counts as unavailable
fn probe_available(source: &dyn PositionSource) -> bool {
    shielded(source.name(), "is_available", || Ok(source.is_available())).unwrap_or(false)
}

/// Run one call into a source, turning errors and panics into `None`
fn shielded<T>(
    source: &str,
    operation: &'static str,
    call: impl FnOnce() -> SourceResult<T>,
) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(error)) => {
            warn!(source, operation, %error, "position source call failed");
            None
        }
        Err(_) => {
            warn!(source, operation, "position source panicked");
            None
        }
    }
}
