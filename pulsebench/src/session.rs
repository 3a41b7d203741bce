//! Profiler Session
//!
//! The central builder and orchestrator: configures the task, the
//! per-iteration and per-session pipelines, thread fan-out and assertions,
//! then executes the whole arrangement and aggregates the outcome.
//!
//! Assertions are evaluated only after every thread has finished, so a
//! failing predicate never cuts a run short.

use crate::error::ProfilerError;
use crate::output;
use crate::session_pipeline::{
    ElapsedTimeSessionStage, SessionPipeline, SessionRun, SessionStage, SetupStage, WarmupStage,
};
use crate::settings::{merge, ExecutionKind, ProfilerSettings, SettingsOverride};
use crate::threads::{MultiThreadHandler, SingleThreadHandler, ThreadSessionHandler};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use pulsebench_core::{
    ActionTask, ContextTask, DelayStage, ElapsedTimeStage, ExecutionContext, IterationStage,
    MemoryCollectionStage, OutputTask, PostExecutionStage, PreExecutionStage, ProcessDataStage,
    ProcessingPipeline, Task, ValueTask,
};
use pulsebench_stats::{ProfilerResult, ThreadResult};
use std::sync::Arc;
use std::time::Duration;

/// A named predicate checked against every thread's result after the run.
struct Assertion {
    description: String,
    predicate: Box<dyn Fn(&ThreadResult) -> bool + Send + Sync>,
}

/// Builder and executor for one profiling session.
#[derive(Default)]
pub struct ProfilerSession {
    task: Option<Arc<dyn Task>>,
    overrides: SettingsOverride,
    thread_count: usize,
    stages: Vec<Arc<dyn IterationStage>>,
    session_stages: Vec<Arc<dyn SessionStage>>,
    assertions: Vec<Assertion>,
}

impl ProfilerSession {
    /// Create an unconfigured session
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Task ────────────────────────────────────────────────────────────────

    /// Set the task under measurement
    pub fn task(&mut self, task: impl Task + 'static) -> &mut Self {
        self.task = Some(Arc::new(task));
        self
    }

    /// Measure a plain action
    pub fn task_fn(&mut self, action: impl Fn() + Send + Sync + 'static) -> &mut Self {
        self.task(ActionTask::new(action))
    }

    /// Measure an action that receives the execution context
    pub fn task_with_context(
        &mut self,
        action: impl Fn(&mut ExecutionContext) + Send + Sync + 'static,
    ) -> &mut Self {
        self.task(ContextTask::new(action))
    }

    /// Measure a function whose return value is captured per iteration
    pub fn task_with_output<T: Send + 'static>(
        &mut self,
        func: impl Fn(&mut ExecutionContext) -> T + Send + Sync + 'static,
    ) -> &mut Self {
        self.task(OutputTask::new(func))
    }

    /// Measure a value-transforming function seeded with `T::default()`
    pub fn task_with_value<T: Clone + Default + Send + 'static>(
        &mut self,
        func: impl Fn(T) -> T + Send + Sync + 'static,
    ) -> &mut Self {
        self.task(ValueTask::new(func))
    }

    /// Measure a value-transforming function with an explicit seed
    pub fn task_with_seed<T: Clone + Send + 'static>(
        &mut self,
        func: impl Fn(T) -> T + Send + Sync + 'static,
        seed: T,
    ) -> &mut Self {
        self.task(ValueTask::with_seed(func, seed))
    }

    // ─── Settings ────────────────────────────────────────────────────────────

    /// Run the task a fixed number of times per thread
    pub fn set_iterations(&mut self, iterations: u64) -> &mut Self {
        self.overrides.set_iterations(iterations);
        self
    }

    /// Run the task repeatedly until `duration` has elapsed per thread
    pub fn set_duration(&mut self, duration: Duration) -> &mut Self {
        self.overrides.set_duration(duration);
        self
    }

    /// Pace dispatches to a fixed interval
    pub fn set_interval(&mut self, interval: Duration) -> &mut Self {
        self.overrides.set_execution(ExecutionKind::Paced(interval));
        self
    }

    /// Switch the warmup invocation on or off
    pub fn run_warmup(&mut self, warmup: bool) -> &mut Self {
        self.overrides.set_warmup(warmup);
        self
    }

    /// Run the session on `threads` parallel worker threads (0 is treated
    /// as 1)
    pub fn set_threads(&mut self, threads: usize) -> &mut Self {
        self.thread_count = threads.max(1);
        self
    }

    /// Direct access to the session's settings overrides
    pub fn settings(&mut self) -> &mut SettingsOverride {
        &mut self.overrides
    }

    /// Number of worker threads the session will run with
    pub fn thread_count(&self) -> usize {
        self.thread_count.max(1)
    }

    // ─── Pipeline ────────────────────────────────────────────────────────────

    /// Add a custom per-iteration stage, outermost of the built-in chain
    pub fn add_stage(&mut self, stage: impl IterationStage + 'static) -> &mut Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Run an action before every iteration, outside the timed bracket
    pub fn pre_execute(&mut self, action: impl Fn() + Send + Sync + 'static) -> &mut Self {
        self.stages
            .push(Arc::new(PreExecutionStage::new(Arc::new(ActionTask::new(
                action,
            )))));
        self
    }

    /// Run an action after every iteration, outside the timed bracket
    pub fn post_execute(&mut self, action: impl Fn() + Send + Sync + 'static) -> &mut Self {
        self.stages
            .push(Arc::new(PostExecutionStage::new(Arc::new(ActionTask::new(
                action,
            )))));
        self
    }

    /// Pause before every iteration
    pub fn delay(&mut self, duration: Duration) -> &mut Self {
        self.stages.push(Arc::new(DelayStage::new(duration)));
        self
    }

    /// Run an action once before the session starts
    pub fn setup(&mut self, action: impl Fn() + Send + Sync + 'static) -> &mut Self {
        self.session_stages
            .push(Arc::new(SetupStage::new(Arc::new(ActionTask::new(action)))));
        self
    }

    // ─── Assertions ──────────────────────────────────────────────────────────

    /// Check a predicate against every thread's result once the run is done
    pub fn assert(
        &mut self,
        predicate: impl Fn(&ThreadResult) -> bool + Send + Sync + 'static,
    ) -> &mut Self {
        let description = format!("assertion {}", self.assertions.len() + 1);
        self.assert_named(description, predicate)
    }

    /// Check a named predicate against every thread's result
    pub fn assert_named(
        &mut self,
        description: impl Into<String>,
        predicate: impl Fn(&ThreadResult) -> bool + Send + Sync + 'static,
    ) -> &mut Self {
        self.assertions.push(Assertion {
            description: description.into(),
            predicate: Box::new(predicate),
        });
        self
    }

    // ─── Execution ───────────────────────────────────────────────────────────

    /// Run the session standalone under `name`
    pub fn run(&self, name: &str) -> Result<ProfilerResult, ProfilerError> {
        let multi = MultiProgress::new();
        let bars = session_bars(&multi, name, self.thread_count.max(1));
        self.run_with(name, &SettingsOverride::new(), &bars)
    }

    /// Run with runner-level shared overrides and pre-created progress bars.
    ///
    /// Shared overrides replay last, so a runner-wide setting wins over the
    /// session's own.
    pub(crate) fn run_with(
        &self,
        name: &str,
        shared: &SettingsOverride,
        bars: &[ProgressBar],
    ) -> Result<ProfilerResult, ProfilerError> {
        if name.is_empty() {
            return Err(ProfilerError::MissingName);
        }
        let task = self
            .task
            .clone()
            .ok_or_else(|| ProfilerError::MissingTask(name.to_string()))?;

        let settings = merge(&merge(&ProfilerSettings::default(), &self.overrides), shared);
        settings.validate()?;

        let mut pipeline = ProcessingPipeline::new();
        for stage in &self.stages {
            pipeline.append_shared(stage.clone());
        }
        pipeline.append(ProcessDataStage);
        pipeline.append(MemoryCollectionStage);
        pipeline.append(ElapsedTimeStage);
        let compiled = pipeline.compile(Some(task));

        let mut session_pipeline = SessionPipeline::new();
        for stage in &self.session_stages {
            session_pipeline.append_shared(stage.clone());
        }
        if settings.warmup {
            session_pipeline.append(WarmupStage);
        }
        session_pipeline.append(ElapsedTimeSessionStage);

        let threads = self.thread_count.max(1);
        let single = SingleThreadHandler;
        let multi = MultiThreadHandler::new(threads);
        let handler: &dyn ThreadSessionHandler = if threads <= 1 { &single } else { &multi };

        output::serialized(|| {
            tracing::debug!(session = name, threads, ?settings, "starting session");
        });

        let run = SessionRun {
            pipeline: &compiled,
            settings: &settings,
            progress: bars,
        };
        let result = session_pipeline.run(&run, handler);

        for assertion in &self.assertions {
            for (thread_index, thread) in result.threads().iter().enumerate() {
                if !(assertion.predicate)(thread) {
                    return Err(ProfilerError::AssertionFailed {
                        session: name.to_string(),
                        assertion: assertion.description.clone(),
                        thread_index,
                    });
                }
            }
        }

        Ok(result)
    }
}

/// One progress bar per worker thread, attached to a shared draw surface.
pub(crate) fn session_bars(multi: &MultiProgress, name: &str, threads: usize) -> Vec<ProgressBar> {
    let style = ProgressStyle::with_template(
        "{msg} {spinner:.green} [{bar:40.cyan/blue}] {pos}/{len}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());

    (0..threads)
        .map(|index| {
            let bar = multi.add(ProgressBar::new(1));
            bar.set_style(style.clone());
            if threads > 1 {
                bar.set_message(format!("{name} [THREAD {index}]"));
            } else {
                bar.set_message(name.to_string());
            }
            bar
        })
        .collect()
}
