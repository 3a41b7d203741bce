//! Thread Session Handlers
//!
//! Fans a session's work out across worker threads. Each worker is pinned
//! to a dedicated core for the run and dropped to a lower scheduling
//! priority; both are best-effort and logged when the OS refuses. A worker
//! that panics mid-run is recorded as a thread fault while the surviving
//! threads' results are still aggregated.

use crate::output::ParallelWindow;
use crate::session_pipeline::SessionRun;
use crate::worker::Worker;
use indicatif::ProgressBar;
use pulsebench_core::{
    logical_cores, lower_thread_priority, pin_to_cpu, restore_affinity, AffinityMask,
};
use pulsebench_stats::{ProfilerResult, ThreadFault};
use std::any::Any;
use std::time::Duration;

/// Terminal of the session pipeline: executes the run on one or many
/// worker threads and aggregates the per-thread results.
pub trait ThreadSessionHandler: Send + Sync {
    /// Execute the session's worker loop(s)
    fn execute(&self, run: &SessionRun<'_>) -> ProfilerResult;
}

// ─── Core placement ──────────────────────────────────────────────────────────

/// RAII hold on a core pinning; restores the previous affinity on drop.
///
/// Acquisition is best-effort: a refused pin is logged and the reservation
/// simply holds nothing.
pub struct CoreReservation {
    prev: Option<AffinityMask>,
}

impl CoreReservation {
    /// Pin the current thread to `cpu` for the reservation's lifetime
    pub fn acquire(cpu: usize) -> Self {
        match pin_to_cpu(cpu) {
            Ok(mask) => Self { prev: Some(mask) },
            Err(err) => {
                tracing::warn!(cpu, %err, "could not pin worker thread to core");
                Self { prev: None }
            }
        }
    }
}

impl Drop for CoreReservation {
    fn drop(&mut self) {
        if let Some(mask) = &self.prev {
            if let Err(err) = restore_affinity(mask) {
                tracing::warn!(%err, "could not restore thread affinity");
            }
        }
    }
}

/// Target core for worker `index` on a machine with `cores` logical cores.
///
/// Workers spread over even cores first, then odd ones, so sibling
/// hyperthreads are shared only once the even set is exhausted.
pub fn core_affinity_for(index: usize, cores: usize) -> usize {
    if cores == 1 {
        return 0;
    }
    let mut affinity = (index * 2) % cores;
    if (index % cores) >= cores / 2 {
        affinity += 1;
    }
    affinity
}

fn lower_priority_logged() {
    if let Err(err) = lower_thread_priority() {
        tracing::warn!(%err, "could not lower worker thread priority");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker thread panicked".to_string()
    }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// Runs the whole session on the calling thread, pinned away from core 0.
#[derive(Debug, Default)]
pub struct SingleThreadHandler;

impl ThreadSessionHandler for SingleThreadHandler {
    fn execute(&self, run: &SessionRun<'_>) -> ProfilerResult {
        let cores = logical_cores();
        let _reservation = CoreReservation::acquire(1.min(cores - 1));
        lower_priority_logged();

        let progress = run
            .progress
            .first()
            .cloned()
            .unwrap_or_else(ProgressBar::hidden);

        let mut result = Worker::new().run(run.pipeline, run.settings, &progress);
        result.thread_count = 1;

        let mut profile = ProfilerResult::new();
        profile.add(result);
        profile
    }
}

/// Spawns one pinned worker per requested thread and aggregates their
/// results once every thread has finished.
#[derive(Debug)]
pub struct MultiThreadHandler {
    thread_count: usize,
}

impl MultiThreadHandler {
    /// Handler for `thread_count` parallel workers
    pub fn new(thread_count: usize) -> Self {
        Self {
            thread_count: thread_count.max(1),
        }
    }
}

impl ThreadSessionHandler for MultiThreadHandler {
    fn execute(&self, run: &SessionRun<'_>) -> ProfilerResult {
        let cores = logical_cores();
        let thread_count = self.thread_count;
        let _window = ParallelWindow::open();
        let mut profile = ProfilerResult::new();

        std::thread::scope(|scope| {
            let mut handles = Vec::with_capacity(thread_count);
            for index in 0..thread_count {
                let progress = run
                    .progress
                    .get(index)
                    .cloned()
                    .unwrap_or_else(ProgressBar::hidden);

                handles.push(scope.spawn(move || {
                    let _reservation = CoreReservation::acquire(core_affinity_for(index, cores));
                    lower_priority_logged();
                    tracing::debug!(index, "worker thread started");

                    let mut result = Worker::new().run(run.pipeline, run.settings, &progress);
                    result.thread_count = thread_count;
                    result
                }));
            }

            // The coordinator waits out all workers before joining any, so a
            // fast thread's result is not consumed while slow ones still run.
            while handles.iter().any(|handle| !handle.is_finished()) {
                std::thread::sleep(Duration::from_millis(1));
            }

            for (index, handle) in handles.into_iter().enumerate() {
                match handle.join() {
                    Ok(result) => profile.add(result),
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        tracing::warn!(index, message = %message, "worker thread panicked");
                        profile.add_fault(ThreadFault {
                            thread_index: index,
                            message,
                        });
                    }
                }
            }
        });

        profile
    }
}
