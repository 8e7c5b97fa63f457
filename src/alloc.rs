//! Allocation tracking for memory leak detection.
//!
//! This module provides a custom global allocator that counts allocations
//! and bytes in flight. The tree's only allocation site is buffer growth,
//! and its teardown contract is that every live pair is dropped exactly
//! once and the buffer released; the tests in `tests/memory_tests.rs` use
//! this allocator to observe that contract from outside.
//!
//! # Usage
//!
//! ```ignore
//! use goatwillow::alloc::TrackingAllocator;
//!
//! #[global_allocator]
//! static ALLOC: TrackingAllocator = TrackingAllocator;
//!
//! #[test]
//! fn buffer_is_released() {
//!     let before = goatwillow::alloc::dealloc_count();
//!
//!     let mut tree = goatwillow::Tree::new();
//!     for i in 0..1000 {
//!         tree.insert(i, i);
//!     }
//!     drop(tree);
//!
//!     assert!(goatwillow::alloc::dealloc_count() > before);
//! }
//! ```
//!
//! # Caveats
//!
//! - The counters are process-global; a multi-threaded test binary sees
//!   every thread's traffic, so assertions should be monotonic (counter
//!   deltas) rather than exact balances.
//! - Tracking adds a pair of atomic operations to every allocation.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};

static ALLOC_COUNT: AtomicUsize = AtomicUsize::new(0);
static DEALLOC_COUNT: AtomicUsize = AtomicUsize::new(0);
static BYTES_IN_FLIGHT: AtomicIsize = AtomicIsize::new(0);
static PEAK_BYTES: AtomicUsize = AtomicUsize::new(0);

/// Total number of allocations since process start.
pub fn alloc_count() -> usize {
	ALLOC_COUNT.load(Ordering::Relaxed)
}

/// Total number of deallocations since process start.
pub fn dealloc_count() -> usize {
	DEALLOC_COUNT.load(Ordering::Relaxed)
}

/// Bytes currently allocated. May be transiently negative when another
/// thread frees memory it allocated before the caller's baseline.
pub fn bytes_in_flight() -> isize {
	BYTES_IN_FLIGHT.load(Ordering::Relaxed)
}

/// Largest value `bytes_in_flight` has reached.
pub fn peak_bytes() -> usize {
	PEAK_BYTES.load(Ordering::Relaxed)
}

fn record_alloc(size: usize) {
	ALLOC_COUNT.fetch_add(1, Ordering::Relaxed);
	let current = BYTES_IN_FLIGHT.fetch_add(size as isize, Ordering::Relaxed) + size as isize;
	// Not atomic with the add; close enough for test observation.
	let peak = PEAK_BYTES.load(Ordering::Relaxed);
	if current > 0 && current as usize > peak {
		PEAK_BYTES.store(current as usize, Ordering::Relaxed);
	}
}

fn record_dealloc(size: usize) {
	DEALLOC_COUNT.fetch_add(1, Ordering::Relaxed);
	BYTES_IN_FLIGHT.fetch_sub(size as isize, Ordering::Relaxed);
}

/// A tracking allocator that counts allocations and deallocations.
///
/// Wraps the system allocator, updating the module counters on each call.
pub struct TrackingAllocator;

unsafe impl GlobalAlloc for TrackingAllocator {
	unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
		record_alloc(layout.size());
		System.alloc(layout)
	}

	unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
		record_dealloc(layout.size());
		System.dealloc(ptr, layout)
	}

	unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
		record_alloc(layout.size());
		System.alloc_zeroed(layout)
	}

	unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
		record_dealloc(layout.size());
		record_alloc(new_size);
		System.realloc(ptr, layout, new_size)
	}
}
