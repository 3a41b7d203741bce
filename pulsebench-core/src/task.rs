//! Task Abstraction
//!
//! The unit of user work invoked once per iteration. Four shapes:
//! plain actions, context-receiving actions, value-transforming functions
//! (seeded or defaulted) and context-receiving functions whose output is
//! captured into the iteration record.

use crate::context::ExecutionContext;
use crate::result::IterationResult;
use std::sync::Mutex;

/// A unit of work run once per iteration.
///
/// Tasks are shared across worker threads, so implementations must be
/// `Send + Sync`.
pub trait Task: Send + Sync {
    /// Execute the task for one iteration
    fn run(&self, ctx: &mut ExecutionContext) -> IterationResult;
}

/// Task wrapping a no-input action.
pub struct ActionTask<F> {
    action: F,
}

impl<F> ActionTask<F>
where
    F: Fn() + Send + Sync,
{
    /// Wrap an action
    pub fn new(action: F) -> Self {
        Self { action }
    }
}

impl<F> Task for ActionTask<F>
where
    F: Fn() + Send + Sync,
{
    fn run(&self, _ctx: &mut ExecutionContext) -> IterationResult {
        (self.action)();
        IterationResult::new()
    }
}

/// Task wrapping an action that receives the execution context.
pub struct ContextTask<F> {
    action: F,
}

impl<F> ContextTask<F>
where
    F: Fn(&mut ExecutionContext) + Send + Sync,
{
    /// Wrap a context-receiving action
    pub fn new(action: F) -> Self {
        Self { action }
    }
}

impl<F> Task for ContextTask<F>
where
    F: Fn(&mut ExecutionContext) + Send + Sync,
{
    fn run(&self, ctx: &mut ExecutionContext) -> IterationResult {
        (self.action)(ctx);
        IterationResult::new()
    }
}

/// Task wrapping a context-receiving function; the return value is captured
/// as the iteration's data.
pub struct OutputTask<F> {
    func: F,
}

impl<F, T> OutputTask<F>
where
    F: Fn(&mut ExecutionContext) -> T + Send + Sync,
    T: Send + 'static,
{
    /// Wrap an output-producing function
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, T> Task for OutputTask<F>
where
    F: Fn(&mut ExecutionContext) -> T + Send + Sync,
    T: Send + 'static,
{
    fn run(&self, ctx: &mut ExecutionContext) -> IterationResult {
        let output = (self.func)(ctx);
        IterationResult::with_data(output)
    }
}

/// Task wrapping a value-transforming function `T -> T`.
///
/// The carried value is threaded through successive invocations and each
/// iteration's record captures a clone of the latest value. The carried
/// value sits behind a lock because the task itself is shared between
/// worker threads.
pub struct ValueTask<F, T> {
    func: F,
    value: Mutex<T>,
}

impl<F, T> ValueTask<F, T>
where
    F: Fn(T) -> T + Send + Sync,
    T: Clone + Send + 'static,
{
    /// Wrap a transforming function with an explicit seed value
    pub fn with_seed(func: F, seed: T) -> Self {
        Self {
            func,
            value: Mutex::new(seed),
        }
    }
}

impl<F, T> ValueTask<F, T>
where
    F: Fn(T) -> T + Send + Sync,
    T: Clone + Default + Send + 'static,
{
    /// Wrap a transforming function seeded with `T::default()`
    pub fn new(func: F) -> Self {
        Self::with_seed(func, T::default())
    }
}

impl<F, T> Task for ValueTask<F, T>
where
    F: Fn(T) -> T + Send + Sync,
    T: Clone + Send + 'static,
{
    fn run(&self, _ctx: &mut ExecutionContext) -> IterationResult {
        let mut slot = self.value.lock().unwrap_or_else(|e| e.into_inner());
        let next = (self.func)(slot.clone());
        *slot = next.clone();
        IterationResult::with_data(next)
    }
}
