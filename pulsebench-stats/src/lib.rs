#![warn(missing_docs)]
//! Pulsebench Stats - Result Aggregation
//!
//! The results layer of the benchmark engine: per-iteration records roll up
//! into a per-thread [`ThreadResult`], per-session [`ProfilerResult`] and a
//! named [`ProfilerResultCollection`]. Every statistic is a lazy derivation
//! over the raw samples; nothing is stored redundantly.

mod collection;
mod profiler_result;
mod thread_result;

pub use collection::ProfilerResultCollection;
pub use profiler_result::{values, ProfilerResult, ProfilerSummary, ResultValue, ThreadFault};
pub use thread_result::ThreadResult;
