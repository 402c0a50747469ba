//! Acquisition API
//!
//! The [`AcquisitionCoordinator`] offers three ways to run a race: async
//! ([`AcquisitionCoordinator::acquire`]), callback-based
//! ([`AcquisitionCoordinator::acquire_with_callback`]) and blocking
//! ([`AcquisitionCoordinator::acquire_blocking`]).

pub mod blocking;
pub mod callback;
pub mod coordinator;
pub mod selection;
pub(crate) mod session;
pub mod types;

// Re-export commonly used API types
pub use callback::OutcomeCallback;
pub use coordinator::AcquisitionCoordinator;
pub use selection::{select_latest, CachedCandidate, TieBreak};
pub use types::{ApiError, ApiResult, CoordinatorStats, FixOrigin, Outcome, SessionState};
