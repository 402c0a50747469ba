//! Position source capability trait and subscription handles

use crate::core::Fix;
use crate::source::SourceResult;
use std::fmt;
use std::sync::Arc;

/// Listener invoked by a source for every fix it produces.
///
/// Sources may call it from any thread, and may call it again while a previous
/// invocation is still running.
pub type FixCallback = Arc<dyn Fn(Fix) + Send + Sync>;

/// Handle identifying one listener registration on one source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    pub fn new(id: u64) -> Self {
        SubscriptionHandle(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Abstraction over anything that can produce location fixes: satellite
/// receivers, network locators, replayed tracks, fused estimators.
///
/// All methods take `&self` because a source is shared between the
/// coordinator and whatever thread delivers its fixes.
pub trait PositionSource: Send + Sync {
    /// Short name used in logs and outcomes (e.g. "gps", "network")
    fn name(&self) -> &str;

    /// Whether the source is currently enabled
    fn is_available(&self) -> bool;

    /// Register a listener for live fixes
    fn subscribe(&self, on_fix: FixCallback) -> SourceResult<SubscriptionHandle>;

    /// Remove a listener.
    ///
    /// Must tolerate being called from inside the listener itself.
    fn unsubscribe(&self, handle: SubscriptionHandle) -> SourceResult<()>;

    /// Most recent fix the source has cached, if any
    fn last_known_fix(&self) -> SourceResult<Option<Fix>>;
}
