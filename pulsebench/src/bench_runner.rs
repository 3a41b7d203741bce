//! Benchmark Runner
//!
//! Groups sessions into one comparable run. Sessions execute strictly one
//! after another so they never contend for cores, and the runner's own
//! overrides replay over each session's settings so the whole group is
//! measured under identical conditions.

use crate::error::ProfilerError;
use crate::session::{session_bars, ProfilerSession};
use crate::settings::{merge, ProfilerSettings, SettingsOverride};
use indicatif::{MultiProgress, ProgressBar};
use pulsebench_stats::ProfilerResultCollection;
use std::time::Duration;

/// Runs a group of named sessions sequentially under shared settings.
#[derive(Default)]
pub struct BenchmarkRunner {
    overrides: SettingsOverride,
    sessions: Vec<(String, ProfilerSession)>,
}

impl BenchmarkRunner {
    /// Create an empty runner
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct access to the runner-wide settings overrides
    pub fn settings(&mut self) -> &mut SettingsOverride {
        &mut self.overrides
    }

    /// Run every session a fixed number of iterations
    pub fn set_iterations(&mut self, iterations: u64) -> &mut Self {
        self.overrides.set_iterations(iterations);
        self
    }

    /// Run every session for a fixed duration
    pub fn set_duration(&mut self, duration: Duration) -> &mut Self {
        self.overrides.set_duration(duration);
        self
    }

    /// Switch the warmup invocation on or off for every session
    pub fn run_warmup(&mut self, warmup: bool) -> &mut Self {
        self.overrides.set_warmup(warmup);
        self
    }

    /// Register a session under `name`
    pub fn add_session(&mut self, name: impl Into<String>, session: ProfilerSession) -> &mut Self {
        self.sessions.push((name.into(), session));
        self
    }

    /// Execute all registered sessions in registration order.
    ///
    /// Stops at the first failing session and surfaces its error.
    pub fn run_sessions(&self) -> Result<ProfilerResultCollection, ProfilerError> {
        let effective = merge(&ProfilerSettings::default(), &self.overrides);
        let mut collection = ProfilerResultCollection::new(effective.iterations);

        let multi = MultiProgress::new();
        let bars: Vec<Vec<ProgressBar>> = self
            .sessions
            .iter()
            .map(|(name, session)| session_bars(&multi, name, session.thread_count().max(1)))
            .collect();

        tracing::debug!(sessions = self.sessions.len(), "running benchmark group");

        for ((name, session), session_bars) in self.sessions.iter().zip(bars.iter()) {
            let result = session.run_with(name, &self.overrides, session_bars)?;
            collection.add(name, result);
        }

        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn counting_session(hits: &Arc<AtomicU64>) -> ProfilerSession {
        let task_hits = hits.clone();
        let mut session = ProfilerSession::new();
        session
            .task_fn(move || {
                task_hits.fetch_add(1, Ordering::Relaxed);
            })
            .run_warmup(false);
        session
    }

    #[test]
    fn test_sessions_run_in_registration_order() {
        let first = Arc::new(AtomicU64::new(0));
        let second = Arc::new(AtomicU64::new(0));

        let mut runner = BenchmarkRunner::new();
        runner.set_iterations(3);
        runner.add_session("first", counting_session(&first));
        runner.add_session("second", counting_session(&second));

        let collection = runner.run_sessions().unwrap();

        assert_eq!(collection.keys().collect::<Vec<_>>(), vec!["first", "second"]);
        assert_eq!(collection.iterations(), 3);
        assert_eq!(first.load(Ordering::Relaxed), 3);
        assert_eq!(second.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_runner_overrides_win_over_session_settings() {
        let hits = Arc::new(AtomicU64::new(0));
        let mut session = counting_session(&hits);
        session.set_iterations(100);

        let mut runner = BenchmarkRunner::new();
        runner.set_iterations(2);
        runner.add_session("overridden", session);

        let collection = runner.run_sessions().unwrap();

        assert_eq!(hits.load(Ordering::Relaxed), 2);
        assert_eq!(
            collection.get("overridden").unwrap().total_iterations(),
            2
        );
    }

    #[test]
    fn test_session_settings_apply_when_runner_is_silent() {
        let hits = Arc::new(AtomicU64::new(0));
        let mut session = counting_session(&hits);
        session.set_iterations(4);

        let mut runner = BenchmarkRunner::new();
        runner.add_session("own-settings", session);

        runner.run_sessions().unwrap();

        assert_eq!(hits.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn test_first_failing_session_stops_the_group() {
        let hits = Arc::new(AtomicU64::new(0));

        let mut failing = ProfilerSession::new();
        failing.task_fn(|| {}).assert_named("always fails", |_| false);

        let mut runner = BenchmarkRunner::new();
        runner.set_iterations(1);
        runner.add_session("failing", failing);
        runner.add_session("never-reached", counting_session(&hits));

        let outcome = runner.run_sessions();

        assert!(matches!(
            outcome,
            Err(ProfilerError::AssertionFailed { ref session, .. }) if session == "failing"
        ));
        assert_eq!(hits.load(Ordering::Relaxed), 0);
    }
}
