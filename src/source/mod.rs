//! Position source abstraction
//!
//! A position source is anything that pushes location fixes asynchronously and
//! can report the last fix it saw. Platform adapters (satellite receivers,
//! network locators) implement [`PositionSource`]; [`MockSource`] is a
//! scriptable implementation for tests and demos.

pub mod provider;
pub mod mock;
pub mod error;

pub use provider::{FixCallback, PositionSource, SubscriptionHandle};
pub use mock::{MockFailures, MockSource};
pub use error::{SourceError, SourceResult};
