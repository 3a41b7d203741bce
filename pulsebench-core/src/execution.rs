//! Execution Strategies
//!
//! Controls how each dispatch is issued: inline, or paced to a fixed
//! interval. Strategies carry per-run state (the next scheduled slot), so
//! each worker thread builds its own instance.

use std::time::{Duration, Instant};

/// Dispatch strategy for a single iteration action.
pub trait TaskExecution: Send {
    /// Issue one dispatch of `action`
    fn execute(&mut self, action: &mut dyn FnMut());
}

/// Inline, synchronous dispatch.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleExecution;

impl TaskExecution for SimpleExecution {
    fn execute(&mut self, action: &mut dyn FnMut()) {
        action();
    }
}

/// Paces dispatch starts to a fixed interval.
///
/// Before each dispatch the caller blocks until the scheduled slot; the
/// next slot is anchored on this dispatch's start time. The dispatch runs
/// to completion before returning, keeping at most one in flight, so a task
/// that overruns the interval makes later starts late rather than
/// concurrent.
#[derive(Debug, Clone, Copy)]
pub struct PacedExecution {
    interval: Duration,
    next_dispatch: Option<Instant>,
}

impl PacedExecution {
    /// Pace dispatches to `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_dispatch: None,
        }
    }

    /// The configured pacing interval
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl TaskExecution for PacedExecution {
    fn execute(&mut self, action: &mut dyn FnMut()) {
        if let Some(slot) = self.next_dispatch {
            let now = Instant::now();
            if slot > now {
                std::thread::sleep(slot - now);
            }
        }

        let started = Instant::now();
        action();

        self.next_dispatch = Some(started + self.interval);
    }
}
