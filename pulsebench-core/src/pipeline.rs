//! Per-Iteration Processing Pipeline
//!
//! Middleware chain wrapping each task invocation. Stages are held as an
//! ordered, immutable sequence and folded into a [`CompiledPipeline`] at
//! session start; appending always extends the tail. Each stage performs
//! onion wrapping: work before forwarding, forward via [`Next`], then
//! post-process the returned record on the way back out.
//!
//! An empty pipeline (no stages, no task) executes to a default record,
//! never an error.

use crate::context::ExecutionContext;
use crate::result::IterationResult;
use crate::task::Task;
use std::sync::Arc;

/// A composable per-iteration middleware stage.
pub trait IterationStage: Send + Sync {
    /// Run this stage; `next.call(ctx)` forwards to the rest of the chain
    fn run(&self, ctx: &mut ExecutionContext, next: Next<'_>) -> IterationResult;
}

/// Continuation of a compiled pipeline: the remaining stages, terminating
/// in the task.
pub struct Next<'a> {
    stages: &'a [Arc<dyn IterationStage>],
    task: Option<&'a Arc<dyn Task>>,
}

impl Next<'_> {
    /// Forward to the rest of the chain
    pub fn call(self, ctx: &mut ExecutionContext) -> IterationResult {
        match self.stages.split_first() {
            Some((head, rest)) => head.run(
                ctx,
                Next {
                    stages: rest,
                    task: self.task,
                },
            ),
            None => match self.task {
                Some(task) => task.run(ctx),
                None => IterationResult::new(),
            },
        }
    }
}

/// Ordered stage sequence; the builder side of the pipeline.
#[derive(Default)]
pub struct ProcessingPipeline {
    stages: Vec<Arc<dyn IterationStage>>,
}

impl ProcessingPipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage at the tail (runs innermost of the stages added so far)
    pub fn append(&mut self, stage: impl IterationStage + 'static) -> &mut Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Append an already-shared stage
    pub fn append_shared(&mut self, stage: Arc<dyn IterationStage>) -> &mut Self {
        self.stages.push(stage);
        self
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether no stages were added
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Fold the stage sequence and the task into one callable.
    ///
    /// `task` is optional so an unconfigured pipeline still executes to a
    /// default record.
    pub fn compile(&self, task: Option<Arc<dyn Task>>) -> CompiledPipeline {
        CompiledPipeline {
            stages: self.stages.clone().into(),
            task,
        }
    }
}

/// The folded, shareable form of a processing pipeline.
///
/// Cheap to clone and safe to run from several worker threads at once;
/// per-thread mutability lives in the `ExecutionContext` each worker owns.
#[derive(Clone)]
pub struct CompiledPipeline {
    stages: Arc<[Arc<dyn IterationStage>]>,
    task: Option<Arc<dyn Task>>,
}

impl CompiledPipeline {
    /// Execute one iteration through the full chain
    pub fn run(&self, ctx: &mut ExecutionContext) -> IterationResult {
        Next {
            stages: &self.stages,
            task: self.task.as_ref(),
        }
        .call(ctx)
    }

    /// The task at the end of the chain, if one was configured
    pub fn task(&self) -> Option<&Arc<dyn Task>> {
        self.task.as_ref()
    }
}
