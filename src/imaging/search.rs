//! Quality search: the highest quality whose encoded size fits a byte budget.
//!
//! ## Monotonicity assumption
//!
//! [`SearchStrategy::Binary`] assumes encoded size never decreases as quality
//! increases, for a fixed buffer. Under that assumption it converges on the
//! best feasible quality in about seven encodes. Lossy codecs do not promise
//! this for every image; when the assumption is violated the binary search can
//! settle on a lower quality than necessary. [`SearchStrategy::Linear`] scans
//! downward from 99 and stops at the first quality that fits, which is exact
//! without the assumption at the cost of up to 99 encodes.
//!
//! ## Outcomes
//!
//! The search never fails for budget reasons. [`SearchStatus`] tells the
//! caller how much to trust the returned quality:
//!
//! | Status | Meaning |
//! |---|---|
//! | `Converged` | interval closed, result is the best feasible quality |
//! | `Exhausted` | iteration budget ran out first, result is approximate |
//! | `UnreachableTarget` | nothing tested fit, result is the lowest quality tried |
//!
//! Both search strategies work on an already-rendered buffer: rendering does
//! not depend on quality, so it happens once per search, not once per probe.

use super::backend::{BackendError, Encoder, RasterBuffer};
use super::calculations::midpoint;
use super::params::{MAX_QUALITY, MIN_QUALITY, Quality};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;

pub const DEFAULT_MAX_ITERATIONS: usize = 15;

/// Returned when no probe ran at all (an iteration budget of zero).
pub const FALLBACK_QUALITY: u32 = 92;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    #[default]
    Binary,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Upper bound on encodes for the binary strategy.
    pub max_iterations: usize,
    pub strategy: SearchStrategy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            strategy: SearchStrategy::Binary,
        }
    }
}

/// One encode attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Probe {
    pub iteration: usize,
    pub quality: u32,
    pub bytes: u64,
    pub fits: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Converged,
    Exhausted,
    UnreachableTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchOutcome {
    pub quality: Quality,
    pub status: SearchStatus,
    pub target_bytes: u64,
    /// Size at `quality`, when that quality was one of the probes.
    pub encoded_bytes: Option<u64>,
    pub probes: Vec<Probe>,
}

impl SearchOutcome {
    pub fn is_exact(&self) -> bool {
        self.status == SearchStatus::Converged
    }
}

/// Find the highest quality whose encoding of `buffer` fits `target_bytes`.
///
/// Every probe is sent to `events` as it completes.
pub fn find_quality(
    encoder: &impl Encoder,
    buffer: &RasterBuffer,
    target_bytes: u64,
    config: &SearchConfig,
    events: Option<&Sender<Probe>>,
) -> Result<SearchOutcome, BackendError> {
    let mut probes = Vec::new();
    let mut probe = |quality: u32| -> Result<Probe, BackendError> {
        let bytes = encoder.encode(buffer, Quality::new(quality))?.byte_size();
        let result = Probe {
            iteration: probes.len() + 1,
            quality,
            bytes,
            fits: bytes <= target_bytes,
        };
        probes.push(result);
        if let Some(tx) = events {
            tx.send(result).ok();
        }
        Ok(result)
    };

    let (best, closed) = match config.strategy {
        SearchStrategy::Binary => {
            let mut low = MIN_QUALITY;
            let mut high = MAX_QUALITY;
            let mut best = None;
            let mut iterations = 0;
            while iterations < config.max_iterations && high - low > 1 {
                let mid = midpoint(low, high);
                let result = probe(mid)?;
                if result.fits {
                    low = mid;
                    best = Some(result);
                } else {
                    high = mid;
                }
                iterations += 1;
            }
            (best, high - low <= 1)
        }
        SearchStrategy::Linear => {
            let mut best = None;
            for quality in (MIN_QUALITY..MAX_QUALITY).rev() {
                let result = probe(quality)?;
                if result.fits {
                    best = Some(result);
                    break;
                }
            }
            (best, true)
        }
    };

    Ok(resolve(best, closed, target_bytes, probes))
}

fn resolve(best: Option<Probe>, closed: bool, target_bytes: u64, probes: Vec<Probe>) -> SearchOutcome {
    let (quality, status, encoded_bytes) = match best {
        Some(p) if closed => (p.quality, SearchStatus::Converged, Some(p.bytes)),
        Some(p) => (p.quality, SearchStatus::Exhausted, Some(p.bytes)),
        None => match probes.iter().min_by_key(|p| p.quality) {
            Some(lowest) if closed => (
                lowest.quality,
                SearchStatus::UnreachableTarget,
                Some(lowest.bytes),
            ),
            Some(lowest) => (lowest.quality, SearchStatus::Exhausted, Some(lowest.bytes)),
            None => (FALLBACK_QUALITY, SearchStatus::Exhausted, None),
        },
    };
    SearchOutcome {
        quality: Quality::new(quality),
        status,
        target_bytes,
        encoded_bytes,
        probes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;

    fn buffer() -> RasterBuffer {
        RasterBuffer::new(8, 8)
    }

    fn binary(max_iterations: usize) -> SearchConfig {
        SearchConfig {
            max_iterations,
            strategy: SearchStrategy::Binary,
        }
    }

    #[test]
    fn finds_highest_feasible_quality_on_linear_curve() {
        // size = 100 · q, budget 4_250 bytes → q = 42 is the best fit.
        let backend = MockBackend::linear(100);
        let outcome =
            find_quality(&backend, &buffer(), 4_250, &SearchConfig::default(), None).unwrap();

        assert_eq!(outcome.quality.value(), 42);
        assert_eq!(outcome.status, SearchStatus::Converged);
        assert_eq!(outcome.encoded_bytes, Some(4_200));
        assert!(outcome.is_exact());
    }

    #[test]
    fn no_tested_higher_quality_fits() {
        let backend = MockBackend::with_curve(|q| (q as u64).pow(2) * 7);
        for target in [0, 1_000, 12_345, 50_000, 69_000] {
            let outcome =
                find_quality(&backend, &buffer(), target, &SearchConfig::default(), None).unwrap();
            let q = outcome.quality.value();
            if outcome.status == SearchStatus::Converged {
                assert!((q as u64).pow(2) * 7 <= target, "target {target}");
            }
            assert!(
                outcome.probes.iter().all(|p| !p.fits || p.quality <= q),
                "target {target}: {:?}",
                outcome.probes
            );
        }
    }

    #[test]
    fn probe_sequence_matches_midpoints() {
        let backend = MockBackend::linear(100);
        let outcome =
            find_quality(&backend, &buffer(), 4_250, &SearchConfig::default(), None).unwrap();
        let tried: Vec<u32> = outcome.probes.iter().map(|p| p.quality).collect();
        assert_eq!(tried, vec![51, 26, 39, 45, 42, 44, 43]);
    }

    #[test]
    fn huge_target_stops_below_lossless() {
        let backend = MockBackend::linear(1);
        let outcome =
            find_quality(&backend, &buffer(), u64::MAX, &SearchConfig::default(), None).unwrap();
        assert_eq!(outcome.quality.value(), 99);
        assert!(!outcome.quality.is_lossless());
        assert_eq!(outcome.status, SearchStatus::Converged);
    }

    #[test]
    fn zero_target_is_unreachable() {
        let backend = MockBackend::linear(10);
        let outcome = find_quality(&backend, &buffer(), 0, &SearchConfig::default(), None).unwrap();
        assert_eq!(outcome.status, SearchStatus::UnreachableTarget);
        // Lowest tested quality; the interval closes at [1, 2] without probing 1.
        assert_eq!(outcome.quality.value(), 2);
        assert_eq!(outcome.encoded_bytes, Some(20));
    }

    #[test]
    fn terminates_within_iteration_budget() {
        for max in [0, 1, 3, 15] {
            for target in [0, 500, 5_000, u64::MAX] {
                let backend = MockBackend::linear(100);
                find_quality(&backend, &buffer(), target, &binary(max), None).unwrap();
                assert!(backend.encode_count() <= max, "max {max}, target {target}");
            }
        }
    }

    #[test]
    fn exhausted_budget_returns_best_so_far() {
        let backend = MockBackend::linear(100);
        let outcome = find_quality(&backend, &buffer(), 4_250, &binary(2), None).unwrap();
        // Probes 51 (too big) then 26 (fits).
        assert_eq!(outcome.status, SearchStatus::Exhausted);
        assert_eq!(outcome.quality.value(), 26);
        assert!(!outcome.is_exact());
    }

    #[test]
    fn exhausted_without_fit_returns_lowest_probe() {
        let backend = MockBackend::linear(100);
        let outcome = find_quality(&backend, &buffer(), 10, &binary(2), None).unwrap();
        assert_eq!(outcome.status, SearchStatus::Exhausted);
        assert_eq!(outcome.quality.value(), 26);
    }

    #[test]
    fn zero_iterations_falls_back_to_default_quality() {
        let backend = MockBackend::linear(100);
        let outcome = find_quality(&backend, &buffer(), 4_250, &binary(0), None).unwrap();
        assert_eq!(outcome.quality.value(), FALLBACK_QUALITY);
        assert_eq!(outcome.status, SearchStatus::Exhausted);
        assert_eq!(outcome.encoded_bytes, None);
        assert!(outcome.probes.is_empty());
    }

    #[test]
    fn linear_scan_handles_non_monotone_curve() {
        // Size dips at quality 80: binary search never looks there.
        let curve = |q: u32| if q == 80 { 100 } else { 1_000 + q as u64 };
        let config = SearchConfig {
            max_iterations: 15,
            strategy: SearchStrategy::Linear,
        };
        let backend = MockBackend::with_curve(curve);
        let outcome = find_quality(&backend, &buffer(), 500, &config, None).unwrap();
        assert_eq!(outcome.quality.value(), 80);
        assert_eq!(outcome.status, SearchStatus::Converged);

        let backend = MockBackend::with_curve(curve);
        let outcome = find_quality(&backend, &buffer(), 500, &binary(15), None).unwrap();
        assert_ne!(outcome.quality.value(), 80);
    }

    #[test]
    fn linear_scan_unreachable_ends_at_minimum() {
        let config = SearchConfig {
            max_iterations: 15,
            strategy: SearchStrategy::Linear,
        };
        let backend = MockBackend::linear(10);
        let outcome = find_quality(&backend, &buffer(), 5, &config, None).unwrap();
        assert_eq!(outcome.status, SearchStatus::UnreachableTarget);
        assert_eq!(outcome.quality.value(), 1);
        assert_eq!(backend.encode_count(), 99);
    }

    #[test]
    fn probes_are_streamed_to_listener() {
        let (tx, rx) = std::sync::mpsc::channel();
        let backend = MockBackend::linear(100);
        let outcome =
            find_quality(&backend, &buffer(), 4_250, &SearchConfig::default(), Some(&tx)).unwrap();
        drop(tx);
        let streamed: Vec<Probe> = rx.iter().collect();
        assert_eq!(streamed, outcome.probes);
        assert_eq!(streamed[0].iteration, 1);
    }

    #[test]
    fn encoder_errors_propagate() {
        let backend = MockBackend::linear(1);
        let result = find_quality(
            &backend,
            &RasterBuffer::new(0, 3),
            100,
            &SearchConfig::default(),
            None,
        );
        assert!(matches!(result, Err(BackendError::InvalidBuffer { .. })));
    }
}
