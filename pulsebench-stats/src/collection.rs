//! Named Collection of Session Results
//!
//! Insertion-ordered map from session name to [`ProfilerResult`], plus the
//! shared iteration-count setting consumers use for reporting.

use crate::profiler_result::ProfilerResult;

/// The results of a full benchmark run: one [`ProfilerResult`] per session,
/// keyed by session name in registration order.
#[derive(Debug, Default)]
pub struct ProfilerResultCollection {
    iterations: u64,
    results: Vec<(String, ProfilerResult)>,
}

impl ProfilerResultCollection {
    /// Create a collection carrying the shared iteration-count setting
    pub fn new(iterations: u64) -> Self {
        Self {
            iterations,
            results: Vec::new(),
        }
    }

    /// The iteration count the benchmarks were configured with
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Add a session's result; a duplicate name replaces the earlier entry
    pub fn add(&mut self, name: impl Into<String>, result: ProfilerResult) {
        let name = name.into();
        if let Some(slot) = self.results.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = result;
        } else {
            self.results.push((name, result));
        }
    }

    /// Session names in registration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|(n, _)| n.as_str())
    }

    /// Result lookup by session name
    pub fn get(&self, name: &str) -> Option<&ProfilerResult> {
        self.results.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    /// Iterate name/result pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProfilerResult)> {
        self.results.iter().map(|(n, r)| (n.as_str(), r))
    }

    /// Number of sessions
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no sessions were recorded
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
