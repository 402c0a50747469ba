//! Deadline timer abstraction
//!
//! The coordinator needs exactly one cancellable one-shot alarm per session.
//! [`TokioTimer`] backs it with sleeping tokio tasks; [`ManualTimer`] fires
//! only when told to, which makes deadline handling deterministic.

pub mod tokio_timer;
pub mod manual;

pub use manual::ManualTimer;
pub use tokio_timer::TokioTimer;

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Action run when a timer fires
pub type FireCallback = Box<dyn FnOnce() + Send + 'static>;

/// Handle identifying one started timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub(crate) fn new(id: u64) -> Self {
        TimerHandle(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Timer failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    /// No tokio runtime is running on the calling thread
    #[error("no async runtime available to drive the timer")]
    NoRuntime,
    /// The current runtime was built without its time driver
    #[error("the async runtime has timers disabled")]
    TimeDriverDisabled,
}

/// Result type for timer operations
pub type TimerResult<T> = Result<T, TimerError>;

/// One-shot, cancellable alarm
pub trait Timer: Send + Sync {
    /// Run `on_fire` once after `duration` unless cancelled first
    fn start(&self, duration: Duration, on_fire: FireCallback) -> TimerResult<TimerHandle>;

    /// Cancel a pending timer. Returns false if it already fired or was
    /// already cancelled. A callback that is already running is not interrupted.
    fn cancel(&self, handle: TimerHandle) -> bool;
}
