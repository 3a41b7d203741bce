//! Profiler Settings
//!
//! An immutable base [`ProfilerSettings`] plus an explicit optional-field
//! [`SettingsOverride`], combined through the pure [`merge`] function. Only
//! explicitly-set override fields land on the base, and the last-set of
//! iterations/duration decides which runner strategy is active.

use crate::error::ProfilerError;
use pulsebench_core::{
    DurationRunner, IterationRunner, PacedExecution, SimpleExecution, TaskExecution, TaskRunner,
};
use std::time::Duration;

/// Which runner strategy drives the invocation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerKind {
    /// Iteration-bounded loop
    Iterations,
    /// Duration-bounded loop
    Duration,
}

/// How each dispatch is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionKind {
    /// Inline, synchronous dispatch
    Simple,
    /// Dispatch starts paced to a fixed interval
    Paced(Duration),
}

/// Effective, fully-resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfilerSettings {
    /// Iteration count for the iteration-bounded runner
    pub iterations: u64,
    /// Time window for the duration-bounded runner
    pub duration: Duration,
    /// Active runner strategy
    pub runner: RunnerKind,
    /// Active execution strategy
    pub execution: ExecutionKind,
    /// Whether a warmup invocation precedes the measured run
    pub warmup: bool,
}

impl Default for ProfilerSettings {
    fn default() -> Self {
        Self {
            iterations: 1,
            duration: Duration::ZERO,
            runner: RunnerKind::Iterations,
            execution: ExecutionKind::Simple,
            warmup: true,
        }
    }
}

impl ProfilerSettings {
    /// Reject configurations no run may start with
    pub fn validate(&self) -> Result<(), ProfilerError> {
        if self.runner == RunnerKind::Iterations && self.iterations == 0 {
            return Err(ProfilerError::InvalidIterations(self.iterations));
        }
        Ok(())
    }

    /// Instantiate the active runner strategy
    pub fn build_runner(&self) -> Box<dyn TaskRunner> {
        match self.runner {
            RunnerKind::Iterations => Box::new(IterationRunner::new(self.iterations)),
            RunnerKind::Duration => Box::new(DurationRunner::new(self.duration)),
        }
    }

    /// Instantiate a fresh execution strategy (strategies carry per-run
    /// pacing state, so every worker thread gets its own)
    pub fn build_execution(&self) -> Box<dyn TaskExecution> {
        match self.execution {
            ExecutionKind::Simple => Box::new(SimpleExecution),
            ExecutionKind::Paced(interval) => Box::new(PacedExecution::new(interval)),
        }
    }
}

/// Explicitly-set fields to replay onto a base settings instance.
///
/// Unset fields record nothing and leave the target untouched on merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsOverride {
    iterations: Option<u64>,
    duration: Option<Duration>,
    warmup: Option<bool>,
    execution: Option<ExecutionKind>,
    runner: Option<RunnerKind>,
}

impl SettingsOverride {
    /// An override with no fields set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the iteration count; selects the iteration-bounded runner
    pub fn set_iterations(&mut self, iterations: u64) -> &mut Self {
        self.iterations = Some(iterations);
        self.runner = Some(RunnerKind::Iterations);
        self
    }

    /// Set the run duration; selects the duration-bounded runner
    pub fn set_duration(&mut self, duration: Duration) -> &mut Self {
        self.duration = Some(duration);
        self.runner = Some(RunnerKind::Duration);
        self
    }

    /// Switch the warmup invocation on or off
    pub fn set_warmup(&mut self, warmup: bool) -> &mut Self {
        self.warmup = Some(warmup);
        self
    }

    /// Set the execution strategy
    pub fn set_execution(&mut self, execution: ExecutionKind) -> &mut Self {
        self.execution = Some(execution);
        self
    }

    /// The recorded iteration count, if set
    pub fn iterations(&self) -> Option<u64> {
        self.iterations
    }

    /// The recorded duration, if set
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Whether no field was explicitly set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Replay the explicitly-set fields of `overrides` onto `base`.
pub fn merge(base: &ProfilerSettings, overrides: &SettingsOverride) -> ProfilerSettings {
    ProfilerSettings {
        iterations: overrides.iterations.unwrap_or(base.iterations),
        duration: overrides.duration.unwrap_or(base.duration),
        runner: overrides.runner.unwrap_or(base.runner),
        execution: overrides.execution.unwrap_or(base.execution),
        warmup: overrides.warmup.unwrap_or(base.warmup),
    }
}
