//! Runner Strategies
//!
//! Drives the invocation loop: bounded by iteration count or by elapsed
//! wall-clock duration. The runner keeps the context's `iteration` key
//! current, hands each dispatch to the execution strategy, and advances a
//! per-thread progress bar in whole-percent steps.

use crate::context::{keys, ExecutionContext};
use crate::execution::TaskExecution;
use indicatif::ProgressBar;
use std::time::{Duration, Instant};

/// Strategy controlling how many times, or for how long, the iteration
/// action is invoked.
pub trait TaskRunner: Send + Sync {
    /// Run the full loop for one worker thread
    fn run(
        &self,
        ctx: &mut ExecutionContext,
        execution: &mut dyn TaskExecution,
        progress: &ProgressBar,
        action: &mut dyn FnMut(&mut ExecutionContext),
    );
}

/// Loops exactly N times.
#[derive(Debug, Clone, Copy)]
pub struct IterationRunner {
    iterations: u64,
}

impl IterationRunner {
    /// Run for a fixed iteration count
    pub fn new(iterations: u64) -> Self {
        Self { iterations }
    }
}

impl TaskRunner for IterationRunner {
    fn run(
        &self,
        ctx: &mut ExecutionContext,
        execution: &mut dyn TaskExecution,
        progress: &ProgressBar,
        action: &mut dyn FnMut(&mut ExecutionContext),
    ) {
        progress.set_length(self.iterations);
        let mut last_percent = 0;

        for i in 0..self.iterations {
            ctx.set(keys::ITERATION, i + 1);

            let ctx_ref = &mut *ctx;
            execution.execute(&mut || action(&mut *ctx_ref));

            // Redraw only on whole-percent steps to keep bar updates out of
            // the measured loop's hot path.
            let percent = i * 100 / self.iterations;
            if percent != last_percent {
                last_percent = percent;
                progress.set_position(i);
            }
        }

        progress.set_position(self.iterations);
    }
}

/// Loops until the configured duration has elapsed.
///
/// The deadline is checked only between iterations: an iteration that
/// overruns the deadline completes.
#[derive(Debug, Clone, Copy)]
pub struct DurationRunner {
    duration: Duration,
}

impl DurationRunner {
    /// Run until `duration` has elapsed
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl TaskRunner for DurationRunner {
    fn run(
        &self,
        ctx: &mut ExecutionContext,
        execution: &mut dyn TaskExecution,
        progress: &ProgressBar,
        action: &mut dyn FnMut(&mut ExecutionContext),
    ) {
        tracing::debug!(duration = ?self.duration, "running task for duration");

        let start = Instant::now();
        let total_millis = self.duration.as_millis().max(1) as u64;
        progress.set_length(total_millis);
        let mut last_percent = 0;

        let mut iteration = 1u64;
        loop {
            let elapsed = start.elapsed();
            if elapsed >= self.duration {
                break;
            }

            ctx.set(keys::ITERATION, iteration);

            let ctx_ref = &mut *ctx;
            execution.execute(&mut || action(&mut *ctx_ref));

            iteration += 1;

            let elapsed_millis = elapsed.as_millis() as u64;
            let percent = elapsed_millis * 100 / total_millis;
            if percent != last_percent {
                last_percent = percent;
                progress.set_position(elapsed_millis);
            }
        }

        progress.set_position(total_millis);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::SimpleExecution;

    fn hidden_bar() -> ProgressBar {
        ProgressBar::hidden()
    }

    #[test]
    fn test_iteration_runner_counts_exactly() {
        let runner = IterationRunner::new(10);
        let mut ctx = ExecutionContext::new();
        let mut execution = SimpleExecution;
        let mut seen = Vec::new();

        runner.run(&mut ctx, &mut execution, &hidden_bar(), &mut |ctx| {
            seen.push(ctx.get_copied::<u64>(keys::ITERATION).unwrap());
        });

        assert_eq!(seen, (1..=10).collect::<Vec<u64>>());
    }

    #[test]
    fn test_duration_runner_runs_at_least_once() {
        let runner = DurationRunner::new(Duration::from_millis(50));
        let mut ctx = ExecutionContext::new();
        let mut execution = SimpleExecution;
        let mut count = 0u64;

        let start = Instant::now();
        runner.run(&mut ctx, &mut execution, &hidden_bar(), &mut |_| {
            count += 1;
        });
        let elapsed = start.elapsed();

        assert!(count >= 1);
        // Near-instant task: total elapsed must not exceed the window by
        // much more than one task execution.
        assert!(elapsed < Duration::from_millis(150));
    }

    #[test]
    fn test_duration_runner_lets_overrunning_iteration_finish() {
        let runner = DurationRunner::new(Duration::from_millis(10));
        let mut ctx = ExecutionContext::new();
        let mut execution = SimpleExecution;
        let mut count = 0u64;

        runner.run(&mut ctx, &mut execution, &hidden_bar(), &mut |_| {
            count += 1;
            std::thread::sleep(Duration::from_millis(30));
        });

        // Deadline is only checked between iterations; the long first
        // iteration completes and the loop then stops.
        assert_eq!(count, 1);
    }

    #[test]
    fn test_duration_runner_increments_iteration_key() {
        let runner = DurationRunner::new(Duration::from_millis(20));
        let mut ctx = ExecutionContext::new();
        let mut execution = SimpleExecution;
        let mut last = 0u64;

        runner.run(&mut ctx, &mut execution, &hidden_bar(), &mut |ctx| {
            let i = ctx.get_copied::<u64>(keys::ITERATION).unwrap();
            assert_eq!(i, last + 1);
            last = i;
            std::thread::sleep(Duration::from_millis(2));
        });

        assert!(last >= 1);
    }
}
