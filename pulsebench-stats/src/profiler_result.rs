//! Per-Session Aggregate
//!
//! Owns the per-thread results of one session and derives the same
//! statistics over the union of all threads' iterations. Session pipeline
//! stages attach named side-channel values (warmup duration, total elapsed
//! time); thread faults from multi-thread runs are recorded here rather
//! than silently dropped.

use crate::thread_result::{average_millis, average_ticks, ThreadResult};
use pulsebench_core::IterationResult;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Well-known result-value keys attached by session stages.
pub mod values {
    /// Duration of the single warmup invocation
    pub const WARMUP: &str = "warmup";
    /// Total elapsed time of the measured run
    pub const ELAPSED: &str = "elapsed";
}

/// A named side-channel value attached by a session stage.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultValue {
    /// A time span
    Duration(Duration),
    /// A free-form text value
    Text(String),
    /// An integer value
    Int(i64),
}

/// Record of a worker thread whose task panicked mid-run.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadFault {
    /// Zero-based worker index
    pub thread_index: usize,
    /// Panic payload rendered as text
    pub message: String,
}

/// The aggregated result of one profiling session.
#[derive(Debug, Default)]
pub struct ProfilerResult {
    results: Vec<ThreadResult>,
    result_values: HashMap<String, ResultValue>,
    thread_faults: Vec<ThreadFault>,
}

impl ProfilerResult {
    /// Create an empty session result
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one thread's result
    pub fn add(&mut self, result: ThreadResult) {
        self.results.push(result);
    }

    /// Record a faulted worker thread
    pub fn add_fault(&mut self, fault: ThreadFault) {
        self.thread_faults.push(fault);
    }

    /// Attach a named side-channel value
    pub fn set_value(&mut self, key: &str, value: ResultValue) {
        self.result_values.insert(key.to_lowercase(), value);
    }

    /// Read a named side-channel value
    pub fn value(&self, key: &str) -> Option<&ResultValue> {
        self.result_values.get(&key.to_lowercase())
    }

    /// The per-thread results
    pub fn threads(&self) -> &[ThreadResult] {
        &self.results
    }

    /// Faults recorded during a multi-thread run; empty on a clean run
    pub fn thread_faults(&self) -> &[ThreadFault] {
        &self.thread_faults
    }

    /// All iterations across all threads
    pub fn iterations(&self) -> impl Iterator<Item = &IterationResult> {
        self.results.iter().flat_map(|r| r.iterations().iter())
    }

    /// Total iterations across all threads
    pub fn total_iterations(&self) -> u64 {
        self.results.iter().map(ThreadResult::total_iterations).sum()
    }

    /// Number of threads the session ran with
    pub fn thread_count(&self) -> usize {
        self.results.first().map(|r| r.thread_count).unwrap_or(0)
    }

    /// Fastest iteration by ticks, across all threads
    pub fn fastest(&self) -> Option<&IterationResult> {
        self.iterations().min_by_key(|i| i.ticks)
    }

    /// Slowest iteration by ticks, across all threads
    pub fn slowest(&self) -> Option<&IterationResult> {
        self.iterations().max_by_key(|i| i.ticks)
    }

    /// Integer-truncated average ticks across all threads' iterations
    pub fn average_ticks(&self) -> u64 {
        average_ticks(self.iterations())
    }

    /// Integer-truncated average milliseconds across all threads' iterations
    pub fn average_millis(&self) -> u64 {
        average_millis(self.iterations())
    }

    /// Average iteration time derived from ticks
    pub fn average_time(&self) -> Duration {
        Duration::from_nanos(self.average_ticks())
    }

    /// Sum of all iteration ticks across all threads
    pub fn total_time(&self) -> Duration {
        Duration::from_nanos(self.iterations().map(|i| i.ticks).sum())
    }

    /// Minimum pre-run memory snapshot across threads
    pub fn initial_size(&self) -> i64 {
        self.results.iter().map(|r| r.initial_size).min().unwrap_or(0)
    }

    /// Maximum post-run memory snapshot across threads
    pub fn end_size(&self) -> i64 {
        self.results.iter().map(|r| r.end_size).max().unwrap_or(0)
    }

    /// Retained memory growth across the session
    pub fn increase(&self) -> i64 {
        self.end_size() - self.initial_size()
    }

    /// Warmup duration, if a warmup stage ran
    pub fn warmup(&self) -> Duration {
        match self.value(values::WARMUP) {
            Some(ResultValue::Duration(d)) => *d,
            _ => Duration::ZERO,
        }
    }

    /// Total elapsed time of the measured run
    pub fn elapsed(&self) -> Duration {
        match self.value(values::ELAPSED) {
            Some(ResultValue::Duration(d)) => *d,
            _ => Duration::ZERO,
        }
    }

    /// Flat, serializable summary for consumers/reporters
    pub fn summary(&self) -> ProfilerSummary {
        ProfilerSummary {
            thread_count: self.thread_count(),
            total_iterations: self.total_iterations(),
            average_ticks: self.average_ticks(),
            average_millis: self.average_millis(),
            fastest_ticks: self.fastest().map(|i| i.ticks).unwrap_or(0),
            slowest_ticks: self.slowest().map(|i| i.ticks).unwrap_or(0),
            total_time_ns: self.total_time().as_nanos() as u64,
            memory_increase: self.increase(),
            warmup_ns: self.warmup().as_nanos() as u64,
            elapsed_ns: self.elapsed().as_nanos() as u64,
            thread_faults: self.thread_faults.clone(),
        }
    }
}

/// Serializable snapshot of a session's derived statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ProfilerSummary {
    /// Number of threads the session ran with
    pub thread_count: usize,
    /// Total iterations across all threads
    pub total_iterations: u64,
    /// Truncated average ticks per iteration
    pub average_ticks: u64,
    /// Truncated average milliseconds per iteration
    pub average_millis: u64,
    /// Ticks of the fastest iteration
    pub fastest_ticks: u64,
    /// Ticks of the slowest iteration
    pub slowest_ticks: u64,
    /// Sum of all iteration ticks
    pub total_time_ns: u64,
    /// Retained memory growth (bytes)
    pub memory_increase: i64,
    /// Warmup duration in nanoseconds (0 when warmup was off)
    pub warmup_ns: u64,
    /// Total elapsed run time in nanoseconds
    pub elapsed_ns: u64,
    /// Worker threads that panicked mid-run
    pub thread_faults: Vec<ThreadFault>,
}
