//! Error Taxonomy
//!
//! Configuration errors are raised before any work begins; assertion
//! failures only after every iteration on every thread has completed.
//! Resource problems (affinity, priority) are warnings, logged and
//! swallowed, and never appear here.

use thiserror::Error;

/// Fatal errors surfaced by a profiling run.
#[derive(Debug, Error)]
pub enum ProfilerError {
    /// No task was assigned to the session
    #[error("no task was set for session `{0}`")]
    MissingTask(String),

    /// The session name is empty
    #[error("the session name is empty")]
    MissingName,

    /// Iteration count below the allowed minimum
    #[error("iteration count must be at least 1 (got {0})")]
    InvalidIterations(u64),

    /// An assertion predicate rejected a thread's result
    #[error("assertion `{assertion}` failed for thread {thread_index} of session `{session}`")]
    AssertionFailed {
        /// Session the assertion belongs to
        session: String,
        /// Description identifying the failing predicate
        assertion: String,
        /// Zero-based index of the rejected thread result
        thread_index: usize,
    },
}
