//! Session Pipeline
//!
//! Middleware chain wrapping the whole run of a session, mirroring the
//! per-iteration chain one level up: stages fold into an ordered sequence
//! terminating in the thread handler that fans the work out. Session stages
//! run once per session, not once per iteration, and annotate the
//! aggregated [`ProfilerResult`] on the way back out.

use crate::settings::ProfilerSettings;
use crate::threads::ThreadSessionHandler;
use indicatif::ProgressBar;
use pulsebench_core::{CompiledPipeline, ExecutionContext, Timer};
use pulsebench_stats::{values, ProfilerResult, ResultValue};
use std::sync::Arc;

/// Everything a session stage or thread handler needs to execute the run.
pub struct SessionRun<'a> {
    /// The compiled per-iteration pipeline shared by all worker threads
    pub pipeline: &'a CompiledPipeline,
    /// Effective settings for this run
    pub settings: &'a ProfilerSettings,
    /// One progress bar per worker thread
    pub progress: &'a [ProgressBar],
}

/// A composable once-per-session middleware stage.
pub trait SessionStage: Send + Sync {
    /// Run this stage; `next.call(run)` forwards to the rest of the chain
    fn run(&self, run: &SessionRun<'_>, next: SessionNext<'_>) -> ProfilerResult;
}

/// Continuation of a session pipeline: the remaining stages, terminating in
/// the thread handler.
pub struct SessionNext<'a> {
    stages: &'a [Arc<dyn SessionStage>],
    handler: Option<&'a dyn ThreadSessionHandler>,
}

impl SessionNext<'_> {
    /// Forward to the rest of the chain
    pub fn call(self, run: &SessionRun<'_>) -> ProfilerResult {
        match self.stages.split_first() {
            Some((head, rest)) => head.run(
                run,
                SessionNext {
                    stages: rest,
                    handler: self.handler,
                },
            ),
            None => match self.handler {
                Some(handler) => handler.execute(run),
                None => ProfilerResult::new(),
            },
        }
    }
}

/// Ordered session-stage sequence.
#[derive(Default)]
pub struct SessionPipeline {
    stages: Vec<Arc<dyn SessionStage>>,
}

impl SessionPipeline {
    /// Create an empty session pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage at the tail (runs innermost of the stages so far)
    pub fn append(&mut self, stage: impl SessionStage + 'static) -> &mut Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Append an already-shared stage
    pub fn append_shared(&mut self, stage: Arc<dyn SessionStage>) -> &mut Self {
        self.stages.push(stage);
        self
    }

    /// Execute the full chain down into `handler`
    pub fn run(&self, run: &SessionRun<'_>, handler: &dyn ThreadSessionHandler) -> ProfilerResult {
        SessionNext {
            stages: &self.stages,
            handler: Some(handler),
        }
        .call(run)
    }
}

// ─── Built-in session stages ─────────────────────────────────────────────────

/// Runs a one-time preparation task before the session starts.
pub struct SetupStage {
    task: Arc<dyn pulsebench_core::Task>,
}

impl SetupStage {
    /// Run `task` once before the measured session
    pub fn new(task: Arc<dyn pulsebench_core::Task>) -> Self {
        Self { task }
    }
}

impl SessionStage for SetupStage {
    fn run(&self, run: &SessionRun<'_>, next: SessionNext<'_>) -> ProfilerResult {
        let mut ctx = ExecutionContext::new();
        self.task.run(&mut ctx);
        next.call(run)
    }
}

/// Invokes the task once, untimed by any iteration stage, so lazy
/// initialization and cache warmth do not land in the first measured
/// iteration. The invocation's own duration is attached as the `warmup`
/// result value.
pub struct WarmupStage;

impl SessionStage for WarmupStage {
    fn run(&self, run: &SessionRun<'_>, next: SessionNext<'_>) -> ProfilerResult {
        let warmup = match run.pipeline.task() {
            Some(task) => {
                tracing::debug!("warmup invocation");
                let mut ctx = ExecutionContext::new();
                let timer = Timer::start();
                task.run(&mut ctx);
                let (_, duration) = timer.stop();
                Some(duration)
            }
            None => None,
        };

        let mut result = next.call(run);
        if let Some(duration) = warmup {
            result.set_value(values::WARMUP, ResultValue::Duration(duration));
        }
        result
    }
}

/// Brackets the whole measured run and attaches the total wall-clock time
/// as the `elapsed` result value.
pub struct ElapsedTimeSessionStage;

impl SessionStage for ElapsedTimeSessionStage {
    fn run(&self, run: &SessionRun<'_>, next: SessionNext<'_>) -> ProfilerResult {
        let timer = Timer::start();
        let mut result = next.call(run);
        let (_, duration) = timer.stop();
        result.set_value(values::ELAPSED, ResultValue::Duration(duration));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsebench_core::{ActionTask, ProcessingPipeline};
    use pulsebench_stats::ThreadResult;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    struct CountingHandler {
        hits: Arc<AtomicU64>,
    }

    impl ThreadSessionHandler for CountingHandler {
        fn execute(&self, _run: &SessionRun<'_>) -> ProfilerResult {
            self.hits.fetch_add(1, Ordering::Relaxed);
            let mut profile = ProfilerResult::new();
            let mut thread = ThreadResult::new();
            thread.thread_count = 1;
            profile.add(thread);
            profile
        }
    }

    fn run_parts(
        task_hits: &Arc<AtomicU64>,
    ) -> (CompiledPipeline, ProfilerSettings, Vec<ProgressBar>) {
        let hits = task_hits.clone();
        let compiled = ProcessingPipeline::new().compile(Some(Arc::new(ActionTask::new(
            move || {
                hits.fetch_add(1, Ordering::Relaxed);
            },
        ))));
        (
            compiled,
            ProfilerSettings::default(),
            vec![ProgressBar::hidden()],
        )
    }

    #[test]
    fn test_warmup_attaches_duration_and_invokes_task_once() {
        let task_hits = Arc::new(AtomicU64::new(0));
        let (pipeline, settings, bars) = run_parts(&task_hits);
        let run = SessionRun {
            pipeline: &pipeline,
            settings: &settings,
            progress: &bars,
        };

        let handler_hits = Arc::new(AtomicU64::new(0));
        let handler = CountingHandler {
            hits: handler_hits.clone(),
        };

        let mut stages = SessionPipeline::new();
        stages.append(WarmupStage);
        let result = stages.run(&run, &handler);

        assert_eq!(task_hits.load(Ordering::Relaxed), 1);
        assert_eq!(handler_hits.load(Ordering::Relaxed), 1);
        assert!(result.value(values::WARMUP).is_some());
    }

    #[test]
    fn test_elapsed_covers_handler_time() {
        let task_hits = Arc::new(AtomicU64::new(0));
        let (pipeline, settings, bars) = run_parts(&task_hits);
        let run = SessionRun {
            pipeline: &pipeline,
            settings: &settings,
            progress: &bars,
        };

        struct SlowHandler;
        impl ThreadSessionHandler for SlowHandler {
            fn execute(&self, _run: &SessionRun<'_>) -> ProfilerResult {
                std::thread::sleep(Duration::from_millis(10));
                ProfilerResult::new()
            }
        }

        let mut stages = SessionPipeline::new();
        stages.append(ElapsedTimeSessionStage);
        let result = stages.run(&run, &SlowHandler);

        assert!(result.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_warmup_excluded_from_elapsed() {
        let task_hits = Arc::new(AtomicU64::new(0));
        let hits = task_hits.clone();
        let compiled = ProcessingPipeline::new().compile(Some(Arc::new(ActionTask::new(
            move || {
                hits.fetch_add(1, Ordering::Relaxed);
                std::thread::sleep(Duration::from_millis(20));
            },
        ))));
        let settings = ProfilerSettings::default();
        let bars = vec![ProgressBar::hidden()];
        let run = SessionRun {
            pipeline: &compiled,
            settings: &settings,
            progress: &bars,
        };

        struct NullHandler;
        impl ThreadSessionHandler for NullHandler {
            fn execute(&self, _run: &SessionRun<'_>) -> ProfilerResult {
                ProfilerResult::new()
            }
        }

        // Warmup sits outside the elapsed bracket.
        let mut stages = SessionPipeline::new();
        stages.append(WarmupStage);
        stages.append(ElapsedTimeSessionStage);
        let result = stages.run(&run, &NullHandler);

        assert!(result.warmup() >= Duration::from_millis(15));
        assert!(result.elapsed() < Duration::from_millis(15));
    }

    #[test]
    fn test_setup_runs_before_handler() {
        let task_hits = Arc::new(AtomicU64::new(0));
        let (pipeline, settings, bars) = run_parts(&task_hits);
        let run = SessionRun {
            pipeline: &pipeline,
            settings: &settings,
            progress: &bars,
        };

        let setup_hits = Arc::new(AtomicU64::new(0));
        let hits = setup_hits.clone();
        let mut stages = SessionPipeline::new();
        stages.append(SetupStage::new(Arc::new(ActionTask::new(move || {
            hits.fetch_add(1, Ordering::Relaxed);
        }))));

        let handler_hits = Arc::new(AtomicU64::new(0));
        let handler = CountingHandler {
            hits: handler_hits.clone(),
        };
        stages.run(&run, &handler);

        assert_eq!(setup_hits.load(Ordering::Relaxed), 1);
        assert_eq!(handler_hits.load(Ordering::Relaxed), 1);
    }
}
