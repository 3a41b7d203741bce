#![warn(missing_docs)]
//! Pulsebench Core - Measurement Primitives
//!
//! This crate provides the per-iteration machinery of the benchmark engine:
//! - `Task` abstraction for the unit of user work
//! - `ExecutionContext`, the per-thread key-value bag
//! - High-precision timing and OS thread placement (affinity, priority)
//! - Global allocator interceptor for memory tracking
//! - The per-iteration processing pipeline and its built-in stages
//! - Runner strategies (iteration-bounded, duration-bounded) and execution
//!   strategies (inline, paced)

mod alloc;
mod context;
mod execution;
mod measure;
mod pipeline;
mod result;
mod runner;
mod stages;
mod task;

pub use alloc::{live_bytes, reclaim, TrackingAllocator};
pub use context::{keys, ExecutionContext};
pub use execution::{PacedExecution, SimpleExecution, TaskExecution};
pub use measure::{
    current_thread_id, logical_cores, lower_thread_priority, pin_to_cpu, restore_affinity,
    AffinityMask, Instant, Timer,
};
pub use pipeline::{CompiledPipeline, IterationStage, Next, ProcessingPipeline};
pub use result::IterationResult;
pub use runner::{DurationRunner, IterationRunner, TaskRunner};
pub use stages::{
    DelayStage, ElapsedTimeStage, MemoryCollectionStage, PostExecutionStage, PreExecutionStage,
    ProcessDataStage,
};
pub use task::{ActionTask, ContextTask, OutputTask, Task, ValueTask};
