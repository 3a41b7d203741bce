//! Process-Wide Output Gate
//!
//! Serializes the engine's own console writes so single-threaded
//! instrumentation never interleaves. A multi-thread session opens a
//! parallel window for the lifetime of its worker threads; while a window
//! is open the gate steps aside and each worker's progress bar owns its own
//! line. The window guard releases on every exit path, including panics.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

static OPEN_WINDOWS: AtomicUsize = AtomicUsize::new(0);
static GATE: Mutex<()> = Mutex::new(());

/// RAII guard for a multi-thread parallel execution window.
pub struct ParallelWindow {
    _not_send: std::marker::PhantomData<*const ()>,
}

impl ParallelWindow {
    /// Open a window; the output gate stays released until the guard drops
    pub fn open() -> Self {
        OPEN_WINDOWS.fetch_add(1, Ordering::SeqCst);
        Self {
            _not_send: std::marker::PhantomData,
        }
    }
}

impl Drop for ParallelWindow {
    fn drop(&mut self) {
        OPEN_WINDOWS.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Whether a parallel window is currently open
pub fn window_open() -> bool {
    OPEN_WINDOWS.load(Ordering::SeqCst) > 0
}

/// Run `f` under the gate, unless a parallel window has released it.
pub fn serialized<T>(f: impl FnOnce() -> T) -> T {
    let _guard: Option<MutexGuard<'_, ()>> = if window_open() {
        None
    } else {
        Some(GATE.lock().unwrap_or_else(|e| e.into_inner()))
    };
    f()
}
