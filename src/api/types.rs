//! Common API types and data structures

use crate::core::Fix;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors raised by the acquisition entry points themselves.
///
/// Source failures and missing fixes are never errors; they resolve to an
/// [`Outcome`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// Asynchronous delivery was requested outside a tokio runtime
    #[error("no tokio runtime is running on this thread")]
    NoRuntime,
    /// Blocking acquisition was requested from inside a tokio runtime
    #[error("blocking acquisition cannot run inside an async runtime")]
    NestedRuntime,
    /// Private runtime for blocking acquisition could not be built
    #[error("failed to build acquisition runtime: {0}")]
    RuntimeBuild(#[from] std::io::Error),
}

/// How a delivered fix was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixOrigin {
    /// Pushed by a source while the session was racing
    Live,
    /// Read from a source's last known fix after the deadline
    Cached,
}

/// Result of one acquisition session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// No supplied source reported itself available. Callers should prompt
    /// for location settings rather than retry.
    NoSourcesAvailable,
    /// A fix was obtained
    Fix {
        fix: Fix,
        /// Name of the source that produced it
        source: String,
        origin: FixOrigin,
    },
    /// Sources were available but none produced a live or cached fix in time
    NoFixObtained,
}

impl Outcome {
    /// The delivered fix, if any
    pub fn fix(&self) -> Option<&Fix> {
        match self {
            Outcome::Fix { fix, .. } => Some(fix),
            _ => None,
        }
    }

    /// Name of the winning source, if a fix was delivered
    pub fn source(&self) -> Option<&str> {
        match self {
            Outcome::Fix { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn origin(&self) -> Option<FixOrigin> {
        match self {
            Outcome::Fix { origin, .. } => Some(*origin),
            _ => None,
        }
    }

    pub fn is_fix(&self) -> bool {
        matches!(self, Outcome::Fix { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::NoSourcesAvailable => write!(f, "no position sources available"),
            Outcome::NoFixObtained => write!(f, "no fix obtained before the deadline"),
            Outcome::Fix { fix, source, origin } => write!(
                f,
                "{:?} fix from {}: {:.6}, {:.6} @ {}ms",
                origin,
                source,
                fix.latitude(),
                fix.longitude(),
                fix.timestamp_ms()
            ),
        }
    }
}

/// Lifecycle of an acquisition session.
///
/// `Idle -> Racing -> SettledByFix | SettledByTimeout`, or
/// `Idle -> NoSourcesAvailable` when nothing can be raced. Settled states
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Racing,
    SettledByFix,
    SettledByTimeout,
    NoSourcesAvailable,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::SettledByFix
                | SessionState::SettledByTimeout
                | SessionState::NoSourcesAvailable
        )
    }
}

/// Counters kept by a coordinator across sessions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorStats {
    /// Sessions started, including ones that found no sources
    pub sessions_started: u64,
    /// Sessions settled by a live fix
    pub live_fixes: u64,
    /// Sessions settled by a cached fix after the deadline
    pub cached_fixes: u64,
    /// Sessions that ended without any fix
    pub no_fix: u64,
    /// Sessions that found no available source
    pub no_sources: u64,
}
