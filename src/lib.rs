//! Location Poller
//!
//! Bounded-latency location acquisition: several position sources race a
//! deadline, the first live fix wins, and when the deadline passes the newest
//! cached fix is used instead. Each acquisition settles exactly once and
//! releases every listener it registered.

pub mod api;
pub mod core;
pub mod logging;
pub mod source;
pub mod timer;
pub mod utils;

// Re-export commonly used types
pub use api::{
    AcquisitionCoordinator, ApiError, ApiResult, CoordinatorStats, FixOrigin, Outcome,
    OutcomeCallback, SessionState, TieBreak,
};
pub use crate::core::{Fix, DEFAULT_BUDGET_MS};
pub use logging::{init_logging, LogLevel};
pub use source::{
    FixCallback, MockFailures, MockSource, PositionSource, SourceError, SourceResult,
    SubscriptionHandle,
};
pub use timer::{ManualTimer, Timer, TimerError, TimerHandle, TokioTimer};
pub use utils::{AcquisitionConfig, ConfigError};
