//! Heap allocation counting for the real-time paths.
//!
//! A test binary installs [`TrackingAllocator`] as its global allocator and
//! wraps the estimator calls in a [`track`] guard. Only allocations made by
//! the guarding thread while the guard is alive are counted; the harness
//! and other tests keep allocating on their own threads.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

thread_local! {
    static ARMED: Cell<bool> = const { Cell::new(false) };
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

fn record() {
    if ARMED.with(Cell::get) {
        ALLOCATIONS.with(|n| n.set(n.get().saturating_add(1)));
    }
}

/// [`System`] allocator that counts allocations and reallocations on
/// threads holding an [`AllocationGuard`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackingAllocator;

// SAFETY: every call is forwarded unchanged to `System`; the counters are
// const-initialized thread locals and never allocate themselves.
unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        record();
        // SAFETY: same contract as the caller's.
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        // SAFETY: `ptr` came from `System` through `alloc`/`realloc` above.
        unsafe { System.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        record();
        // SAFETY: same contract as the caller's.
        unsafe { System.realloc(ptr, layout, new_size) }
    }
}

/// Live allocation window on the current thread.
#[derive(Debug)]
pub struct AllocationGuard {
    baseline: usize,
}

impl AllocationGuard {
    /// Allocations seen since the guard was created.
    pub fn allocations(&self) -> usize {
        ALLOCATIONS.with(Cell::get).saturating_sub(self.baseline)
    }
}

impl Drop for AllocationGuard {
    fn drop(&mut self) {
        ARMED.with(|armed| armed.set(false));
    }
}

/// Open an allocation window on the current thread.
pub fn track() -> AllocationGuard {
    ARMED.with(|armed| armed.set(true));
    AllocationGuard {
        baseline: ALLOCATIONS.with(Cell::get),
    }
}

/// Panic if `guard` saw an allocation while `path` ran.
#[macro_export]
macro_rules! assert_rt_safe {
    ($guard:expr, $path:expr) => {{
        let allocations = $guard.allocations();
        if allocations > 0 {
            panic!(
                "{} allocated {} time(s) on the real-time path ({}:{})",
                $path,
                allocations,
                file!(),
                line!()
            );
        }
    }};
}
