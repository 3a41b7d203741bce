//! High-Precision Timing and OS Thread Placement
//!
//! Tick-based stopwatch bracketing for iteration measurement, plus the
//! best-effort OS integration the thread handlers need: CPU affinity
//! pinning, thread priority lowering and OS thread ids. All OS calls are
//! Linux syscalls with no-op fallbacks on other platforms.

use std::time::Duration;

// ─── Instant ─────────────────────────────────────────────────────────────────

/// Monotonic instant for benchmark bracketing.
#[derive(Debug, Clone, Copy)]
pub struct Instant {
    instant: std::time::Instant,
}

impl Instant {
    /// Capture current instant
    #[inline(always)]
    pub fn now() -> Self {
        Self {
            instant: std::time::Instant::now(),
        }
    }

    /// Compute elapsed time since this instant
    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        self.instant.elapsed()
    }

    /// Elapsed ticks (nanoseconds) since this instant
    #[inline(always)]
    pub fn elapsed_ticks(&self) -> u64 {
        self.instant.elapsed().as_nanos() as u64
    }
}

// ─── Timer ───────────────────────────────────────────────────────────────────

/// Timer for measuring a single iteration.
///
/// `stop` returns elapsed ticks (nanoseconds) and the `Duration`, the two
/// units every downstream statistic is derived from.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer
    #[inline(always)]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Stop the timer and return elapsed ticks and duration
    #[inline(always)]
    pub fn stop(&self) -> (u64, Duration) {
        let elapsed = self.start.elapsed();
        (elapsed.as_nanos() as u64, elapsed)
    }
}

// ─── OS thread placement ─────────────────────────────────────────────────────

/// Number of logical processors visible to this process.
pub fn logical_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Pin the current thread to a specific logical core.
///
/// Improves measurement stability by avoiding core migrations. Returns the
/// previous affinity mask so the caller can restore it.
#[cfg(target_os = "linux")]
pub fn pin_to_cpu(cpu: usize) -> Result<AffinityMask, std::io::Error> {
    use std::mem::MaybeUninit;

    unsafe {
        let mut prev = MaybeUninit::<libc::cpu_set_t>::zeroed();
        if libc::sched_getaffinity(
            0,
            std::mem::size_of::<libc::cpu_set_t>(),
            prev.as_mut_ptr(),
        ) != 0
        {
            return Err(std::io::Error::last_os_error());
        }
        let prev = prev.assume_init();

        let mut set = MaybeUninit::<libc::cpu_set_t>::zeroed();
        let set_ref = set.assume_init_mut();
        libc::CPU_ZERO(set_ref);
        libc::CPU_SET(cpu, set_ref);

        if libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), set_ref) != 0 {
            return Err(std::io::Error::last_os_error());
        }

        Ok(AffinityMask { mask: prev })
    }
}

/// CPU pinning not supported on this platform
#[cfg(not(target_os = "linux"))]
pub fn pin_to_cpu(_cpu: usize) -> Result<AffinityMask, std::io::Error> {
    Ok(AffinityMask {})
}

/// Previous affinity mask captured by [`pin_to_cpu`], restorable via
/// [`restore_affinity`].
#[derive(Clone, Copy)]
pub struct AffinityMask {
    #[cfg(target_os = "linux")]
    mask: libc::cpu_set_t,
}

impl std::fmt::Debug for AffinityMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AffinityMask").finish_non_exhaustive()
    }
}

/// Restore a previously captured affinity mask for the current thread.
#[cfg(target_os = "linux")]
pub fn restore_affinity(mask: &AffinityMask) -> Result<(), std::io::Error> {
    unsafe {
        if libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &mask.mask) != 0 {
            return Err(std::io::Error::last_os_error());
        }
    }
    Ok(())
}

/// No-op on platforms without affinity support
#[cfg(not(target_os = "linux"))]
pub fn restore_affinity(_mask: &AffinityMask) -> Result<(), std::io::Error> {
    Ok(())
}

/// Lower the scheduling priority of the current thread.
///
/// Keeps the measured thread from preempting its siblings; failures are for
/// the caller to log, never fatal.
#[cfg(target_os = "linux")]
pub fn lower_thread_priority() -> Result<(), std::io::Error> {
    // Niceness 10 on the calling thread only (PRIO_PROCESS + tid on Linux).
    let tid = unsafe { libc::syscall(libc::SYS_gettid) } as libc::id_t;
    let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS, tid, 10) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// No-op on platforms without per-thread priority support
#[cfg(not(target_os = "linux"))]
pub fn lower_thread_priority() -> Result<(), std::io::Error> {
    Ok(())
}

/// OS-level id of the current thread.
#[cfg(target_os = "linux")]
pub fn current_thread_id() -> u64 {
    unsafe { libc::syscall(libc::SYS_gettid) as u64 }
}

/// Fallback: hash of the std thread id (stable within one process).
#[cfg(not(target_os = "linux"))]
pub fn current_thread_id() -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    std::thread::current().id().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instant_elapsed() {
        let start = Instant::now();
        std::thread::sleep(Duration::from_millis(10));
        let elapsed = start.elapsed();

        // Should be at least 10ms
        assert!(elapsed >= Duration::from_millis(5));
        // Should be less than 100ms (accounting for scheduling)
        assert!(elapsed < Duration::from_millis(100));
    }

    #[test]
    fn test_timer_ticks_match_duration() {
        let timer = Timer::start();
        std::thread::sleep(Duration::from_millis(10));
        let (ticks, duration) = timer.stop();

        assert!(ticks >= 5_000_000);
        assert_eq!(ticks, duration.as_nanos() as u64);
    }

    #[test]
    fn test_pin_and_restore() {
        // Best-effort: pinning may be denied in constrained environments.
        if let Ok(prev) = pin_to_cpu(0) {
            restore_affinity(&prev).expect("restoring a captured mask should succeed");
        }
    }

    #[test]
    fn test_thread_ids_differ_across_threads() {
        let main_id = current_thread_id();
        let other_id = std::thread::spawn(current_thread_id).join().unwrap();
        assert_ne!(main_id, other_id);
    }
}
