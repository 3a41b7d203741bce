//! Per-Thread Aggregate
//!
//! Owns the ordered iteration records of one worker thread. All statistics
//! are pure derivations over the raw samples, computed on demand and never
//! cached.

use pulsebench_core::IterationResult;
use std::time::Duration;

/// The complete set of iterations one worker thread ran, plus the memory
/// snapshots bracketing the run.
#[derive(Debug, Default)]
pub struct ThreadResult {
    iterations: Vec<IterationResult>,
    /// Number of threads the owning session ran with
    pub thread_count: usize,
    /// Live heap bytes before the thread's run (post reclaim barrier)
    pub initial_size: i64,
    /// Live heap bytes after the thread's run (post reclaim barrier)
    pub end_size: i64,
}

impl ThreadResult {
    /// Create an empty per-thread result
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one iteration's record
    pub fn add(&mut self, iteration: IterationResult) {
        self.iterations.push(iteration);
    }

    /// The raw iteration records, in execution order
    pub fn iterations(&self) -> &[IterationResult] {
        &self.iterations
    }

    /// Number of iterations run on this thread
    pub fn total_iterations(&self) -> u64 {
        self.iterations.len() as u64
    }

    /// Fastest iteration by ticks
    pub fn fastest(&self) -> Option<&IterationResult> {
        self.iterations.iter().min_by_key(|i| i.ticks)
    }

    /// Slowest iteration by ticks
    pub fn slowest(&self) -> Option<&IterationResult> {
        self.iterations.iter().max_by_key(|i| i.ticks)
    }

    /// Integer-truncated average ticks per iteration
    pub fn average_ticks(&self) -> u64 {
        average_ticks(self.iterations.iter())
    }

    /// Integer-truncated average milliseconds per iteration
    pub fn average_millis(&self) -> u64 {
        average_millis(self.iterations.iter())
    }

    /// Average iteration time derived from ticks
    pub fn average_time(&self) -> Duration {
        Duration::from_nanos(self.average_ticks())
    }

    /// Sum of all iteration ticks
    pub fn total_time(&self) -> Duration {
        Duration::from_nanos(self.iterations.iter().map(|i| i.ticks).sum())
    }

    /// Retained memory growth over the thread's run
    pub fn increase(&self) -> i64 {
        self.end_size - self.initial_size
    }
}

/// Truncating tick average over any iteration sequence; 0 when empty.
pub(crate) fn average_ticks<'a>(iter: impl Iterator<Item = &'a IterationResult>) -> u64 {
    let (sum, count) = iter.fold((0u64, 0u64), |(s, c), i| (s + i.ticks, c + 1));
    if count == 0 { 0 } else { sum / count }
}

/// Truncating millisecond average over any iteration sequence; 0 when empty.
pub(crate) fn average_millis<'a>(iter: impl Iterator<Item = &'a IterationResult>) -> u64 {
    let (sum, count) = iter.fold((0u64, 0u64), |(s, c), i| {
        (s + i.duration.as_millis() as u64, c + 1)
    });
    if count == 0 { 0 } else { sum / count }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iteration_with_ticks(ticks: u64) -> IterationResult {
        let mut result = IterationResult::new();
        result.ticks = ticks;
        result.duration = Duration::from_nanos(ticks);
        result
    }

    #[test]
    fn test_fastest_slowest() {
        let mut result = ThreadResult::new();
        for ticks in [50, 10, 90, 30] {
            result.add(iteration_with_ticks(ticks));
        }

        assert_eq!(result.fastest().unwrap().ticks, 10);
        assert_eq!(result.slowest().unwrap().ticks, 90);
    }

    #[test]
    fn test_average_ticks_truncates() {
        let mut result = ThreadResult::new();
        for ticks in [1, 2, 2] {
            result.add(iteration_with_ticks(ticks));
        }

        // 5 / 3 = 1 with truncation, not rounding.
        assert_eq!(result.average_ticks(), 1);
    }

    #[test]
    fn test_total_time_is_tick_sum() {
        let mut result = ThreadResult::new();
        for ticks in [100, 200, 300] {
            result.add(iteration_with_ticks(ticks));
        }

        assert_eq!(result.total_time(), Duration::from_nanos(600));
    }

    #[test]
    fn test_increase() {
        let mut result = ThreadResult::new();
        result.initial_size = 1_000;
        result.end_size = 1_750;

        assert_eq!(result.increase(), 750);
    }

    #[test]
    fn test_empty_statistics_are_zero() {
        let result = ThreadResult::new();

        assert!(result.fastest().is_none());
        assert!(result.slowest().is_none());
        assert_eq!(result.average_ticks(), 0);
        assert_eq!(result.total_time(), Duration::ZERO);
        assert_eq!(result.total_iterations(), 0);
    }
}
