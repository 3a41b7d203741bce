//! Built-in Processing-Pipeline Stages
//!
//! The default measurement chain, outer to inner:
//! ProcessData → MemoryCollection → ElapsedTime → task. Timing is bracketed
//! strictly around the forward call so annotation work done by outer stages
//! never lands in the measured ticks.

use crate::alloc::{live_bytes, reclaim};
use crate::context::{keys, ExecutionContext};
use crate::measure::{current_thread_id, Timer};
use crate::pipeline::{IterationStage, Next};
use crate::result::IterationResult;
use crate::task::Task;
use std::sync::Arc;
use std::time::Duration;

/// Records thread/process ids into the context and the outgoing record,
/// and copies the runner-maintained iteration number into the record.
pub struct ProcessDataStage;

impl IterationStage for ProcessDataStage {
    fn run(&self, ctx: &mut ExecutionContext, next: Next<'_>) -> IterationResult {
        let thread_id = current_thread_id();
        let process_id = std::process::id();

        ctx.set(keys::THREAD_ID, thread_id);
        ctx.set(keys::PROCESS_ID, process_id);

        let mut result = next.call(ctx);

        result.thread_id = thread_id;
        result.process_id = process_id;
        result.iteration = ctx.get_copied::<u64>(keys::ITERATION).unwrap_or(0);

        result
    }
}

/// Memory bracketing: cheap snapshot before and right after the forward
/// call, then a reclaim barrier for the retained-growth reading.
pub struct MemoryCollectionStage;

impl IterationStage for MemoryCollectionStage {
    fn run(&self, ctx: &mut ExecutionContext, next: Next<'_>) -> IterationResult {
        let initial = live_bytes();

        let mut result = next.call(ctx);

        result.initial_size = initial;
        result.after_execution = live_bytes();
        result.after_reclaim = reclaim();

        result
    }
}

/// Stopwatch bracketing strictly around the forward call.
pub struct ElapsedTimeStage;

impl IterationStage for ElapsedTimeStage {
    fn run(&self, ctx: &mut ExecutionContext, next: Next<'_>) -> IterationResult {
        let timer = Timer::start();

        let mut result = next.call(ctx);

        let (ticks, duration) = timer.stop();
        result.ticks = ticks;
        result.duration = duration;

        result
    }
}

/// Pauses before forwarding; the wait is outside the timed bracket as long
/// as the stage sits outside [`ElapsedTimeStage`].
pub struct DelayStage {
    duration: Duration,
}

impl DelayStage {
    /// Delay each iteration by `duration`
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl IterationStage for DelayStage {
    fn run(&self, ctx: &mut ExecutionContext, next: Next<'_>) -> IterationResult {
        std::thread::sleep(self.duration);
        next.call(ctx)
    }
}

/// Runs a side task before each forward call.
pub struct PreExecutionStage {
    task: Arc<dyn Task>,
}

impl PreExecutionStage {
    /// Run `task` before each iteration
    pub fn new(task: Arc<dyn Task>) -> Self {
        Self { task }
    }
}

impl IterationStage for PreExecutionStage {
    fn run(&self, ctx: &mut ExecutionContext, next: Next<'_>) -> IterationResult {
        self.task.run(ctx);
        next.call(ctx)
    }
}

/// Runs a side task after each forward call.
pub struct PostExecutionStage {
    task: Arc<dyn Task>,
}

impl PostExecutionStage {
    /// Run `task` after each iteration
    pub fn new(task: Arc<dyn Task>) -> Self {
        Self { task }
    }
}

impl IterationStage for PostExecutionStage {
    fn run(&self, ctx: &mut ExecutionContext, next: Next<'_>) -> IterationResult {
        let result = next.call(ctx);
        self.task.run(ctx);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ProcessingPipeline;
    use crate::task::{ActionTask, ContextTask};
    use std::sync::atomic::{AtomicU64, Ordering};

    fn compiled_with_defaults(task: Arc<dyn Task>) -> crate::pipeline::CompiledPipeline {
        let mut pipeline = ProcessingPipeline::new();
        pipeline.append(ProcessDataStage);
        pipeline.append(MemoryCollectionStage);
        pipeline.append(ElapsedTimeStage);
        pipeline.compile(Some(task))
    }

    #[test]
    fn test_process_data_populates_ids() {
        let compiled = compiled_with_defaults(Arc::new(ActionTask::new(|| {})));

        let mut ctx = ExecutionContext::new();
        ctx.set(keys::ITERATION, 5u64);
        let result = compiled.run(&mut ctx);

        assert_eq!(result.iteration, 5);
        assert_eq!(result.process_id, std::process::id());
        assert_eq!(
            ctx.get_copied::<u64>(keys::THREAD_ID),
            Some(result.thread_id)
        );
        assert_eq!(
            ctx.get_copied::<u32>(keys::PROCESS_ID),
            Some(result.process_id)
        );
    }

    #[test]
    fn test_elapsed_time_brackets_task() {
        let compiled = compiled_with_defaults(Arc::new(ActionTask::new(|| {
            std::thread::sleep(Duration::from_millis(5));
        })));

        let mut ctx = ExecutionContext::new();
        let result = compiled.run(&mut ctx);

        assert!(result.ticks >= 2_000_000);
        assert_eq!(result.ticks, result.duration.as_nanos() as u64);
    }

    #[test]
    fn test_pre_and_post_execution_order() {
        let hits = Arc::new(AtomicU64::new(0));

        let pre_hits = hits.clone();
        let pre = ContextTask::new(move |ctx: &mut ExecutionContext| {
            // Task must not have run yet on the first iteration.
            ctx.set("pre_seen", pre_hits.load(Ordering::Relaxed));
        });

        let post_hits = hits.clone();
        let post = ContextTask::new(move |ctx: &mut ExecutionContext| {
            ctx.set("post_seen", post_hits.load(Ordering::Relaxed));
        });

        let task_hits = hits.clone();
        let mut pipeline = ProcessingPipeline::new();
        pipeline.append(PreExecutionStage::new(Arc::new(pre)));
        pipeline.append(PostExecutionStage::new(Arc::new(post)));
        let compiled = pipeline.compile(Some(Arc::new(ActionTask::new(move || {
            task_hits.fetch_add(1, Ordering::Relaxed);
        }))));

        let mut ctx = ExecutionContext::new();
        compiled.run(&mut ctx);

        assert_eq!(ctx.get_copied::<u64>("pre_seen"), Some(0));
        assert_eq!(ctx.get_copied::<u64>("post_seen"), Some(1));
    }

    #[test]
    fn test_delay_stage_waits() {
        let mut pipeline = ProcessingPipeline::new();
        pipeline.append(DelayStage::new(Duration::from_millis(5)));
        let compiled = pipeline.compile(Some(Arc::new(ActionTask::new(|| {}))));

        let start = std::time::Instant::now();
        let mut ctx = ExecutionContext::new();
        compiled.run(&mut ctx);

        assert!(start.elapsed() >= Duration::from_millis(4));
    }

    #[test]
    fn test_memory_snapshots_ordered() {
        let compiled = compiled_with_defaults(Arc::new(ActionTask::new(|| {
            let v: Vec<u8> = Vec::with_capacity(4096);
            std::hint::black_box(v);
        })));

        let mut ctx = ExecutionContext::new();
        let result = compiled.run(&mut ctx);

        // Without the tracking allocator installed all snapshots read the
        // same gauge; with it, after_reclaim must not exceed after_execution
        // by more than concurrent test allocation noise. Just verify the
        // fields were populated in one bracketing pass.
        let _ = (result.initial_size, result.after_execution, result.after_reclaim);
    }
}
