//! Timing and coordinate constants

/// Default acquisition budget (milliseconds)
pub const DEFAULT_BUDGET_MS: u64 = 10_000;

/// Largest budget accepted from configuration (milliseconds)
pub const MAX_BUDGET_MS: u64 = 600_000;

/// Scale between decimal degrees and integer micro-degrees
pub const MICRO_DEGREES_PER_DEGREE: f64 = 1e6;
