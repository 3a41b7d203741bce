#![warn(missing_docs)]
//! # PulseBench
//!
//! Micro-benchmark execution engine with per-iteration measurement.
//!
//! PulseBench runs a task a configured number of times, or for a configured
//! duration, across one or more pinned worker threads and aggregates the
//! per-iteration measurements:
//! - **Per-Iteration Records**: elapsed ticks, wall-clock duration and heap
//!   snapshots for every single invocation
//! - **Thread Fan-Out**: workers pinned to dedicated cores at lowered
//!   priority, results aggregated across threads
//! - **Composable Pipelines**: middleware stages around each iteration and
//!   around the whole session
//! - **Fail-Late Assertions**: predicates checked against every thread's
//!   result only after the full run completed
//! - **Allocation Tracking**: `TrackingAllocator` exposes a live-bytes gauge
//!   the memory stages snapshot through a reclaim barrier
//!
//! ## Quick Start
//!
//! ```ignore
//! use pulsebench::prelude::*;
//!
//! let mut session = ProfilerSession::new();
//! session
//!     .task_fn(|| expensive_operation())
//!     .set_iterations(1_000)
//!     .set_threads(4)
//!     .assert(|t| t.average_millis() < 10);
//!
//! let result = session.run("expensive-op")?;
//! println!("avg: {:?}", result.average_time());
//! ```
//!
//! ## Comparing Several Sessions
//!
//! ```ignore
//! let mut runner = BenchmarkRunner::new();
//! runner.set_iterations(500);
//! runner.add_session("vec", vec_session);
//! runner.add_session("map", map_session);
//! let collection = runner.run_sessions()?;
//! ```

mod bench_runner;
mod config;
mod error;
mod output;
mod session;
mod session_pipeline;
mod settings;
mod threads;
mod worker;

pub use bench_runner::BenchmarkRunner;
pub use config::{parse_duration, ProfilerConfig, PulseConfig};
pub use error::ProfilerError;
pub use output::{window_open, ParallelWindow};
pub use session::ProfilerSession;
pub use session_pipeline::{
    ElapsedTimeSessionStage, SessionNext, SessionPipeline, SessionRun, SessionStage, SetupStage,
    WarmupStage,
};
pub use settings::{merge, ExecutionKind, ProfilerSettings, RunnerKind, SettingsOverride};
pub use threads::{
    core_affinity_for, CoreReservation, MultiThreadHandler, SingleThreadHandler,
    ThreadSessionHandler,
};
pub use worker::Worker;

// Re-export the measurement primitives
pub use pulsebench_core::{
    current_thread_id, keys, live_bytes, logical_cores, reclaim, ActionTask, CompiledPipeline,
    ContextTask, DelayStage, DurationRunner, ElapsedTimeStage, ExecutionContext, IterationResult,
    IterationRunner, IterationStage, MemoryCollectionStage, Next, OutputTask, PacedExecution,
    PostExecutionStage, PreExecutionStage, ProcessDataStage, ProcessingPipeline, SimpleExecution,
    Task, TaskExecution, TaskRunner, Timer, TrackingAllocator, ValueTask,
};

// Re-export the aggregates
pub use pulsebench_stats::{
    values, ProfilerResult, ProfilerResultCollection, ProfilerSummary, ResultValue, ThreadFault,
    ThreadResult,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BenchmarkRunner, ExecutionContext, ProfilerError, ProfilerResult,
        ProfilerResultCollection, ProfilerSession, ProfilerSettings, SettingsOverride, Task,
        ThreadResult,
    };
}
