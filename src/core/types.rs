//! Core data types for location acquisition

use super::constants::MICRO_DEGREES_PER_DEGREE;
use serde::{Deserialize, Serialize};

/// A single location estimate reported by a position source.
///
/// Fixes are immutable once produced. The timestamp is the acquisition instant
/// in milliseconds and is only meaningful for ordering fixes against each other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    latitude: f64,
    longitude: f64,
    timestamp_ms: u64,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: u64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp_ms,
        }
    }

    /// Latitude in decimal degrees
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// True when this fix was acquired strictly after `other`
    pub fn is_newer_than(&self, other: &Fix) -> bool {
        self.timestamp_ms > other.timestamp_ms
    }

    /// Integer micro-degree coordinates (latitude, longitude) as used by map points.
    /// Values are truncated toward zero.
    pub fn to_micro_degrees(&self) -> (i32, i32) {
        (
            (self.latitude * MICRO_DEGREES_PER_DEGREE) as i32,
            (self.longitude * MICRO_DEGREES_PER_DEGREE) as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_accessors() {
        let fix = Fix::new(40.4237, -86.9212, 1_700_000_000_000);
        assert_eq!(fix.latitude(), 40.4237);
        assert_eq!(fix.longitude(), -86.9212);
        assert_eq!(fix.timestamp_ms(), 1_700_000_000_000);
    }

    #[test]
    fn test_newer_than_is_strict() {
        let older = Fix::new(0.0, 0.0, 100);
        let newer = Fix::new(0.0, 0.0, 200);
        let same_time = Fix::new(1.0, 1.0, 200);

        assert!(newer.is_newer_than(&older));
        assert!(!older.is_newer_than(&newer));
        assert!(!same_time.is_newer_than(&newer));
    }

    #[test]
    fn test_micro_degrees() {
        let fix = Fix::new(40.423_705, -86.921_195, 0);
        let (lat, lon) = fix.to_micro_degrees();
        assert!((lat - 40_423_705).abs() <= 1);
        assert!((lon + 86_921_195).abs() <= 1);
    }

    #[test]
    fn test_fix_json_shape() {
        let fix = Fix::new(1.5, -2.5, 42);
        let json = serde_json::to_value(fix).unwrap();
        assert_eq!(json["latitude"], 1.5);
        assert_eq!(json["longitude"], -2.5);
        assert_eq!(json["timestamp_ms"], 42);
    }
}
