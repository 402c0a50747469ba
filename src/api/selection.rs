//! Choosing among cached fixes after the deadline

use crate::core::Fix;
use serde::{Deserialize, Serialize};

/// Which source wins when cached fixes carry identical timestamps.
///
/// Registration order is the order the sources were passed to the coordinator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The source registered first wins
    #[default]
    EarliestRegistered,
    /// The source registered last wins
    LatestRegistered,
}

/// A cached fix together with the registration index of its source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachedCandidate {
    pub index: usize,
    pub fix: Fix,
}

/// Pick the candidate with the latest timestamp, resolving equal timestamps
/// with `tie_break`. The result does not depend on input order.
pub fn select_latest<I>(candidates: I, tie_break: TieBreak) -> Option<CachedCandidate>
where
    I: IntoIterator<Item = CachedCandidate>,
{
    candidates.into_iter().fold(None, |best, candidate| match best {
        None => Some(candidate),
        Some(current) => {
            let newer = candidate.fix.is_newer_than(&current.fix);
            let tied = candidate.fix.timestamp_ms() == current.fix.timestamp_ms();
            let wins_tie = match tie_break {
                TieBreak::EarliestRegistered => candidate.index < current.index,
                TieBreak::LatestRegistered => candidate.index > current.index,
            };
            if newer || (tied && wins_tie) {
                Some(candidate)
            } else {
                Some(current)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(index: usize, timestamp_ms: u64) -> CachedCandidate {
        CachedCandidate {
            index,
            fix: Fix::new(index as f64, 0.0, timestamp_ms),
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(select_latest(Vec::new(), TieBreak::default()), None);
    }

    #[test]
    fn test_single_candidate() {
        let only = candidate(1, 50);
        assert_eq!(select_latest(vec![only], TieBreak::default()), Some(only));
    }

    #[test]
    fn test_latest_timestamp_wins() {
        let gps = candidate(0, 100);
        let network = candidate(1, 200);
        let picked = select_latest(vec![gps, network], TieBreak::default()).unwrap();
        assert_eq!(picked.index, 1);

        let picked = select_latest(vec![network, gps], TieBreak::default()).unwrap();
        assert_eq!(picked.index, 1);
    }

    #[test]
    fn test_tie_prefers_earliest_registered_by_default() {
        let picked = select_latest(
            vec![candidate(2, 500), candidate(0, 500), candidate(1, 500)],
            TieBreak::EarliestRegistered,
        )
        .unwrap();
        assert_eq!(picked.index, 0);
    }

    #[test]
    fn test_tie_prefers_latest_registered_when_configured() {
        let picked = select_latest(
            vec![candidate(0, 500), candidate(2, 500), candidate(1, 400)],
            TieBreak::LatestRegistered,
        )
        .unwrap();
        assert_eq!(picked.index, 2);
    }
}
