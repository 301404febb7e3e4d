use core::{fmt, time::Duration};
use parking_lot::Mutex;
use std::time::Instant;

/// Wall-clock span of one synchronous submission, in microseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LatencySample(i64);

impl LatencySample {
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Converts a duration, saturating at `i64::MAX` microseconds.
    pub fn from_duration(duration: Duration) -> Self {
        Self(i64::try_from(duration.as_micros()).unwrap_or(i64::MAX))
    }

    /// Measures the time elapsed since `start`.
    pub fn since(start: Instant) -> Self {
        Self::from_duration(start.elapsed())
    }

    pub const fn as_micros(self) -> i64 {
        self.0
    }
}

/// Aggregated view of the recorded latency samples.
///
/// `total` is the number of completed submissions and `average` the mean
/// latency in milliseconds. Renders as the JSON document served on `/stats`:
///
/// ```
/// use hashvault::Snapshot;
///
/// let snapshot = Snapshot::default();
/// assert_eq!(snapshot.to_string(), r#"{"total": 0, "average": 0.000000}"#);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub total: u64,
    pub average: f64,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"{{"total": {}, "average": {:.6}}}"#,
            self.total, self.average
        )
    }
}

/// Collects one [`LatencySample`] per completed submission.
///
/// Because exactly one sample is recorded per submission, the sample count
/// doubles as the submission count and the average can never be computed
/// against a mismatched denominator.
#[derive(Debug, Default)]
pub struct StatsAggregator {
    samples: Mutex<Vec<LatencySample>>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sample. Concurrent appends are serialized; none are lost.
    pub fn record(&self, sample: LatencySample) {
        self.samples.lock().push(sample);
    }

    /// Returns the sample count and mean latency in milliseconds, or an
    /// all-zero snapshot when nothing has been recorded.
    pub fn snapshot(&self) -> Snapshot {
        let (total, sum) = {
            let samples = self.samples.lock();
            let sum: i128 = samples.iter().map(|s| i128::from(s.as_micros())).sum();
            (samples.len() as u64, sum)
        };

        if total == 0 {
            return Snapshot::default();
        }

        Snapshot {
            total,
            average: sum as f64 / total as f64 / 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread::scope};

    #[test]
    fn empty_snapshot_is_zero() {
        let stats = StatsAggregator::new();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot, Snapshot::default());
        assert_eq!(snapshot.to_string(), r#"{"total": 0, "average": 0.000000}"#);
    }

    #[test]
    fn average_is_reported_in_milliseconds() {
        let stats = StatsAggregator::new();
        stats.record(LatencySample::from_micros(1_000));
        stats.record(LatencySample::from_micros(3_000));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total, 2);
        assert!((snapshot.average - 2.0).abs() < f64::EPSILON);
        assert_eq!(snapshot.to_string(), r#"{"total": 2, "average": 2.000000}"#);
    }

    #[test]
    fn sub_millisecond_latency_keeps_precision() {
        let stats = StatsAggregator::new();
        stats.record(LatencySample::from_micros(250));
        assert_eq!(
            stats.snapshot().to_string(),
            r#"{"total": 1, "average": 0.250000}"#
        );
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 2000;

        let stats = Arc::new(StatsAggregator::new());
        scope(|s| {
            for _ in 0..THREADS {
                let stats = Arc::clone(&stats);
                s.spawn(move || {
                    for _ in 0..PER_THREAD {
                        stats.record(LatencySample::from_micros(2_000));
                    }
                });
            }
        });

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total, (THREADS * PER_THREAD) as u64);
        assert!((snapshot.average - 2.0).abs() < 1e-9);
    }

    #[test]
    fn duration_conversion_saturates() {
        assert_eq!(
            LatencySample::from_duration(Duration::from_millis(3)).as_micros(),
            3_000
        );
        assert_eq!(
            LatencySample::from_duration(Duration::MAX).as_micros(),
            i64::MAX
        );
    }
}
