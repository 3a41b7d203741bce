//! Per-Iteration Measurement Record
//!
//! One `IterationResult` per task invocation. The innermost pipeline stage
//! (the task) creates it; each wrapping stage annotates it on the way back
//! out.

use chrono::{DateTime, Utc};
use std::any::Any;
use std::time::Duration;

/// Measurement record of a single task invocation.
pub struct IterationResult {
    /// Elapsed ticks (nanoseconds) strictly around the task invocation
    pub ticks: u64,
    /// Elapsed duration strictly around the task invocation
    pub duration: Duration,
    /// When the iteration ran
    pub timestamp: DateTime<Utc>,
    /// Live heap bytes before the invocation
    pub initial_size: i64,
    /// Live heap bytes right after the invocation (cheap snapshot, the
    /// task's output is still held)
    pub after_execution: i64,
    /// Live heap bytes after the reclaim barrier (retained growth)
    pub after_reclaim: i64,
    /// Output captured from function tasks; `None` for action tasks
    pub data: Option<Box<dyn Any + Send>>,
    /// Iteration number (1-based)
    pub iteration: u64,
    /// OS id of the worker thread
    pub thread_id: u64,
    /// Process id
    pub process_id: u32,
}

impl IterationResult {
    /// Create an empty record stamped with the current time
    pub fn new() -> Self {
        Self {
            ticks: 0,
            duration: Duration::ZERO,
            timestamp: Utc::now(),
            initial_size: 0,
            after_execution: 0,
            after_reclaim: 0,
            data: None,
            iteration: 0,
            thread_id: 0,
            process_id: 0,
        }
    }

    /// Create a record carrying a function task's output
    pub fn with_data(data: impl Any + Send) -> Self {
        let mut result = Self::new();
        result.data = Some(Box::new(data));
        result
    }

    /// Typed access to the captured output
    pub fn data_ref<T: Any>(&self) -> Option<&T> {
        self.data.as_ref().and_then(|d| d.downcast_ref::<T>())
    }
}

impl Default for IterationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for IterationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IterationResult")
            .field("ticks", &self.ticks)
            .field("duration", &self.duration)
            .field("timestamp", &self.timestamp)
            .field("initial_size", &self.initial_size)
            .field("after_execution", &self.after_execution)
            .field("after_reclaim", &self.after_reclaim)
            .field("has_data", &self.data.is_some())
            .field("iteration", &self.iteration)
            .field("thread_id", &self.thread_id)
            .field("process_id", &self.process_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let result = IterationResult::new();
        assert_eq!(result.ticks, 0);
        assert!(result.data.is_none());
        assert_eq!(result.iteration, 0);
    }

    #[test]
    fn test_data_roundtrip() {
        let result = IterationResult::with_data(42u64);
        assert_eq!(result.data_ref::<u64>(), Some(&42));
        assert!(result.data_ref::<String>().is_none());
    }
}
