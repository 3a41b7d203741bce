//! Global Allocator Interceptor for Memory Tracking
//!
//! Rust has no collector to force, so the engine tracks retained memory
//! directly: `TrackingAllocator` keeps a process-wide live-bytes gauge
//! (allocated minus freed). A cheap snapshot reads the gauge as-is;
//! [`reclaim`] is the barrier taken once an iteration's transient values
//! have been dropped, so its reading reflects retained growth only.
//!
//! Install it in the benchmark binary to get real numbers:
//!
//! ```ignore
//! #[global_allocator]
//! static ALLOC: TrackingAllocator = TrackingAllocator::new();
//! ```
//!
//! Without the allocator installed every snapshot reads 0 and memory
//! statistics degrade gracefully to zero deltas.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicI64, Ordering};

static LIVE_BYTES: AtomicI64 = AtomicI64::new(0);

/// Allocator wrapper that maintains the live-bytes gauge.
pub struct TrackingAllocator {
    inner: System,
}

impl TrackingAllocator {
    /// Create the tracking allocator (const, usable in statics)
    pub const fn new() -> Self {
        Self { inner: System }
    }
}

impl Default for TrackingAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: delegates all allocation to `System`; only adds relaxed counter
// updates, which are async-signal-safe and never allocate.
unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.inner.alloc(layout) };
        if !ptr.is_null() {
            LIVE_BYTES.fetch_add(layout.size() as i64, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { self.inner.dealloc(ptr, layout) };
        LIVE_BYTES.fetch_sub(layout.size() as i64, Ordering::Relaxed);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { self.inner.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            LIVE_BYTES.fetch_add(new_size as i64 - layout.size() as i64, Ordering::Relaxed);
        }
        new_ptr
    }
}

/// Cheap snapshot of currently live heap bytes.
///
/// Reflects live growth: whatever the task just produced is still counted.
#[inline]
pub fn live_bytes() -> i64 {
    LIVE_BYTES.load(Ordering::Relaxed)
}

/// Reclaim barrier.
///
/// Drops run deterministically, so by the time this is called the
/// iteration's transient values are already gone; the returned gauge value
/// is retained growth.
#[inline]
pub fn reclaim() -> i64 {
    std::sync::atomic::fence(Ordering::SeqCst);
    LIVE_BYTES.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test: the gauge is process-global, and this is the only test
    // in the binary that writes it.
    #[test]
    fn test_gauge_tracks_matched_pairs() {
        let alloc = TrackingAllocator::new();
        let layout = Layout::from_size_align(64, 8).unwrap();

        let before = live_bytes();
        unsafe {
            let ptr = alloc.alloc(layout);
            assert!(!ptr.is_null());
            assert_eq!(live_bytes(), before + 64);
            alloc.dealloc(ptr, layout);
        }
        assert_eq!(reclaim(), before);
    }
}
