//! Per-Thread Execution Context
//!
//! A mutable key-value bag carried through one worker thread's entire run.
//! Keys are case-normalized to lowercase; values are arbitrary payloads.
//! The worker pre-populates `threadid` and `processid`, the runner keeps
//! `iteration` current.

use std::any::Any;
use std::collections::HashMap;

/// Well-known context keys.
pub mod keys {
    /// Current iteration number (1-based, set by the runner before each call)
    pub const ITERATION: &str = "iteration";
    /// OS id of the worker thread
    pub const THREAD_ID: &str = "threadid";
    /// Process id
    pub const PROCESS_ID: &str = "processid";
}

/// The context carried through one thread's run.
///
/// Created once per worker thread and mutated across iterations; it never
/// crosses threads.
#[derive(Default)]
pub struct ExecutionContext {
    data: HashMap<String, Box<dyn Any>>,
}

impl ExecutionContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under a key (case-insensitive, last write wins)
    pub fn set(&mut self, key: &str, value: impl Any) {
        self.data.insert(key.to_lowercase(), Box::new(value));
    }

    /// Typed access to a stored value
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.data
            .get(&key.to_lowercase())
            .and_then(|v| v.downcast_ref::<T>())
    }

    /// Copy out a stored value
    pub fn get_copied<T: Any + Copy>(&self, key: &str) -> Option<T> {
        self.get::<T>(key).copied()
    }

    /// Remove a value; returns whether the key was present
    pub fn remove(&mut self, key: &str) -> bool {
        self.data.remove(&key.to_lowercase()).is_some()
    }

    /// Clear all values
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Whether a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(&key.to_lowercase())
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the context is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .finish()
    }
}
