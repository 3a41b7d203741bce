//! Worker
//!
//! Runs the full invocation loop of one thread: brackets the loop with
//! reclaim-barrier memory snapshots, seeds the execution context with the
//! thread and process identity, and collects every iteration record into a
//! [`ThreadResult`].

use crate::settings::ProfilerSettings;
use indicatif::ProgressBar;
use pulsebench_core::{current_thread_id, keys, reclaim, CompiledPipeline, ExecutionContext};
use pulsebench_stats::ThreadResult;

/// Executes one worker thread's share of a session.
#[derive(Debug, Default)]
pub struct Worker;

impl Worker {
    /// Create a worker
    pub fn new() -> Self {
        Self
    }

    /// Run the configured loop to completion and return the thread's
    /// aggregate.
    pub fn run(
        &self,
        pipeline: &CompiledPipeline,
        settings: &ProfilerSettings,
        progress: &ProgressBar,
    ) -> ThreadResult {
        let mut result = ThreadResult::new();
        result.initial_size = reclaim();

        let mut ctx = ExecutionContext::new();
        ctx.set(keys::ITERATION, 0u64);
        ctx.set(keys::THREAD_ID, current_thread_id());
        ctx.set(keys::PROCESS_ID, std::process::id());

        let runner = settings.build_runner();
        let mut execution = settings.build_execution();

        runner.run(&mut ctx, execution.as_mut(), progress, &mut |ctx| {
            let iteration = pipeline.run(ctx);
            result.add(iteration);
        });

        result.end_size = reclaim();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsOverride;
    use pulsebench_core::{
        ActionTask, ContextTask, ElapsedTimeStage, ProcessDataStage, ProcessingPipeline,
    };
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn settings_for(iterations: u64) -> ProfilerSettings {
        let mut overrides = SettingsOverride::new();
        overrides.set_iterations(iterations);
        crate::settings::merge(&ProfilerSettings::default(), &overrides)
    }

    #[test]
    fn test_worker_collects_every_iteration() {
        let hits = Arc::new(AtomicU64::new(0));
        let task_hits = hits.clone();

        let mut pipeline = ProcessingPipeline::new();
        pipeline.append(ElapsedTimeStage);
        let compiled = pipeline.compile(Some(Arc::new(ActionTask::new(move || {
            task_hits.fetch_add(1, Ordering::Relaxed);
        }))));

        let result = Worker::new().run(&compiled, &settings_for(8), &ProgressBar::hidden());

        assert_eq!(result.total_iterations(), 8);
        assert_eq!(hits.load(Ordering::Relaxed), 8);
    }

    #[test]
    fn test_worker_seeds_thread_identity() {
        let mut pipeline = ProcessingPipeline::new();
        pipeline.append(ProcessDataStage);
        let compiled = pipeline.compile(Some(Arc::new(ContextTask::new(
            |ctx: &mut pulsebench_core::ExecutionContext| {
                assert!(ctx.contains(keys::THREAD_ID));
                assert!(ctx.contains(keys::PROCESS_ID));
            },
        ))));

        let result = Worker::new().run(&compiled, &settings_for(3), &ProgressBar::hidden());

        let first = &result.iterations()[0];
        assert_eq!(first.process_id, std::process::id());
        assert_eq!(first.iteration, 1);
        assert_eq!(result.iterations()[2].iteration, 3);
    }

    #[test]
    fn test_worker_brackets_memory_snapshots() {
        let pipeline = ProcessingPipeline::new();
        let compiled = pipeline.compile(Some(Arc::new(ActionTask::new(|| {}))));

        let result = Worker::new().run(&compiled, &settings_for(1), &ProgressBar::hidden());

        // Snapshots come from the reclaim barrier on both ends; without the
        // tracking allocator installed the gauge reads zero on each side.
        assert_eq!(result.increase(), result.end_size - result.initial_size);
    }
}
