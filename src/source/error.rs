//! Position source error types

use super::SubscriptionHandle;
use thiserror::Error;

/// Failures reported by a position source implementation.
///
/// The coordinator never propagates these to its caller; a failing source is
/// simply treated as having no fix.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    /// Source is switched off or its backing service is gone
    #[error("position source '{provider}' is unavailable")]
    Unavailable { provider: String },
    /// Listener registration was refused
    #[error("position source '{provider}' refused subscription: {reason}")]
    SubscriptionRefused { provider: String, reason: String },
    /// Handle was never issued by this source or was already released
    #[error("unknown subscription handle {handle}")]
    UnknownSubscription { handle: SubscriptionHandle },
    /// Cached fix lookup failed
    #[error("last known fix lookup on '{provider}' failed: {reason}")]
    LookupFailed { provider: String, reason: String },
    /// Platform-specific failure
    #[error("platform error {code}: {description}")]
    Platform { code: u32, description: String },
}

/// Result type for position source operations
pub type SourceResult<T> = Result<T, SourceError>;
