use super::sample::Sample;
use std::collections::BTreeMap;

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Elapsed time at or below this is treated as no time at all
const MIN_ELAPSED_SECONDS: f64 = 1e-9;

/// Per-interval deltas and per-second rates between two samples.
///
/// Counters are assumed non-decreasing. A counter that went backwards (module
/// reload, kstat reset) yields a negative delta and rate, it is not corrected.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaSample {
    elapsed_seconds: f64,
    degenerate: bool,
    deltas: BTreeMap<&'static str, i128>,
}

impl DeltaSample {
    /// Compare `current` against `previous`. The caller guarantees ordering.
    pub fn between(previous: &Sample, current: &Sample) -> Self {
        let elapsed_ns = current.timestamp() as i128 - previous.timestamp() as i128;
        let elapsed = elapsed_ns as f64 / NANOS_PER_SECOND;
        let degenerate = elapsed <= MIN_ELAPSED_SECONDS;

        let deltas = current
            .names()
            .map(|name| {
                let delta = current.get(name) as i128 - previous.get(name) as i128;
                (name, delta)
            })
            .collect();

        Self {
            elapsed_seconds: if degenerate { 1.0 } else { elapsed },
            degenerate,
            deltas,
        }
    }

    /// Seconds between the samples, 1.0 for a degenerate pair
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    /// True when the source showed no forward progress in time and the
    /// 1-second floor was substituted, so rates are not real rates.
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    pub fn delta(&self, name: &str) -> i128 {
        self.deltas.get(name).copied().unwrap_or(0)
    }

    pub fn rate(&self, name: &str) -> f64 {
        self.delta(name) as f64 / self.elapsed_seconds
    }

    /// Percentage of `hits` over `hits + misses` in this interval
    pub fn hit_ratio(&self, hits: &str, misses: &str) -> f64 {
        hit_ratio(self.delta(hits), self.delta(misses))
    }
}

/// `100 * hits / (hits + misses)`, 0.0 when there were no lookups
pub fn hit_ratio(hits: i128, misses: i128) -> f64 {
    let total = hits as f64 + misses as f64;
    if total == 0.0 {
        0.0
    } else {
        100.0 * hits as f64 / total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(timestamp: u64, hits: u64, misses: u64) -> Sample {
        Sample::from_values(timestamp, &[("hits", hits), ("misses", misses)])
    }

    #[test]
    fn test_one_second_apart() {
        let previous = sample(1_000_000_000, 100, 50);
        let current = sample(2_000_000_000, 150, 50);
        let delta = DeltaSample::between(&previous, &current);

        assert_eq!(delta.delta("hits"), 50);
        assert_eq!(delta.delta("misses"), 0);
        assert_eq!(delta.elapsed_seconds(), 1.0);
        assert!(!delta.is_degenerate());
        assert_eq!(delta.rate("hits"), 50.0);
        assert_eq!(delta.hit_ratio("hits", "misses"), 100.0);
    }

    #[test]
    fn test_equal_timestamps_use_one_second_floor() {
        let previous = sample(5_000, 10, 10);
        let current = sample(5_000, 30, 10);
        let delta = DeltaSample::between(&previous, &current);

        assert!(delta.is_degenerate());
        assert_eq!(delta.elapsed_seconds(), 1.0);
        assert_eq!(delta.rate("hits"), 20.0);
    }

    #[test]
    fn test_backwards_timestamp_uses_one_second_floor() {
        let previous = sample(9_000_000_000, 0, 0);
        let current = sample(1_000_000_000, 7, 0);
        let delta = DeltaSample::between(&previous, &current);

        assert!(delta.is_degenerate());
        assert_eq!(delta.rate("hits"), 7.0);
    }

    #[test]
    fn test_fractional_interval() {
        let previous = sample(0, 0, 0);
        let current = sample(500_000_000, 100, 0);
        let delta = DeltaSample::between(&previous, &current);

        assert_eq!(delta.elapsed_seconds(), 0.5);
        assert_eq!(delta.rate("hits"), 200.0);
    }

    #[test]
    fn test_counter_reset_goes_negative() {
        let previous = sample(1_000_000_000, 500, 10);
        let current = sample(2_000_000_000, 20, 10);
        let delta = DeltaSample::between(&previous, &current);

        assert_eq!(delta.delta("hits"), -480);
        assert_eq!(delta.rate("hits"), -480.0);
    }

    #[test]
    fn test_rates_non_negative_for_increasing_counters() {
        let pairs = [(0u64, 0u64), (0, 1), (10, 10), (1, u32::MAX as u64), (42, 1 << 40)];
        for (prev, curr) in pairs {
            let delta = DeltaSample::between(&sample(0, prev, 0), &sample(3_000_000_000, curr, 0));
            assert!(delta.rate("hits") >= 0.0, "{} -> {}", prev, curr);
        }
    }

    #[test]
    fn test_counter_above_signed_range() {
        let delta = DeltaSample::between(&sample(0, 0, 0), &sample(1_000_000_000, u64::MAX, 0));
        assert_eq!(delta.delta("hits"), u64::MAX as i128);
        assert_eq!(delta.rate("hits"), u64::MAX as f64);

        let reset = DeltaSample::between(&sample(0, u64::MAX, 0), &sample(1_000_000_000, 0, 0));
        assert_eq!(reset.delta("hits"), -(u64::MAX as i128));
        assert!(reset.rate("hits") < 0.0);
    }

    #[test]
    fn test_hit_ratio_bounds() {
        assert_eq!(hit_ratio(0, 0), 0.0);
        assert_eq!(hit_ratio(0, 10), 0.0);
        assert_eq!(hit_ratio(10, 0), 100.0);
        assert_eq!(hit_ratio(3, 1), 75.0);
        for (hits, misses) in [(1, 2), (1000, 1), (7, 7), (0, 99)] {
            let ratio = hit_ratio(hits, misses);
            assert!((0.0..=100.0).contains(&ratio));
        }
    }

    #[test]
    fn test_unknown_counter_reads_as_zero() {
        let delta = DeltaSample::between(&sample(0, 1, 1), &sample(1_000_000_000, 2, 2));
        assert_eq!(delta.delta("max_streams"), 0);
        assert_eq!(delta.rate("max_streams"), 0.0);
    }
}
