//! Parallel utilities for the merge-back phases.
//!
//! Provides thread-pool construction, the chunk-border computation used to
//! slice the contraction history and the hyperedge range across workers, and
//! a shared-slice handle for the lock-free disjoint-window writes of merge
//! Phase 1.

use std::marker::PhantomData;

use rayon::{ThreadPool, ThreadPoolBuilder};

/// Build a Rayon thread pool for the merge phases.
///
/// If `num_threads` is `None`, Rayon selects its default thread count.
pub fn build_thread_pool(num_threads: Option<usize>) -> ThreadPool {
    let mut builder = ThreadPoolBuilder::new();
    if let Some(n) = num_threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .expect("Failed to build merge thread pool")
}

/// Split `n` items into `chunks` contiguous ranges, spreading the remainder
/// over the leading chunks. Returns `chunks + 1` borders starting at 0 and
/// ending at `n`.
pub fn chunk_borders(n: usize, chunks: usize) -> Vec<usize> {
    let chunks = chunks.max(1);
    let chunk_size = n / chunks;
    let with_extra = n % chunks;
    let mut borders = Vec::with_capacity(chunks + 1);
    borders.push(0);
    let mut assigned = 0;
    for i in 0..chunks {
        assigned += chunk_size + usize::from(i < with_extra);
        borders.push(assigned);
    }
    borders
}

/// A `Send + Sync` handle to a mutable slice that allows raw index writes
/// from multiple workers at once.
///
/// Every writer must stay inside a set of indices disjoint from all other
/// writers'; the merge driver derives that guarantee from the slot planner
/// (incidence windows) and from community membership (hypernode records).
pub(crate) struct SharedSlice<'a, T> {
    ptr: *mut T,
    len: usize,
    _marker: PhantomData<&'a mut [T]>,
}

unsafe impl<T: Send> Send for SharedSlice<'_, T> {}
unsafe impl<T: Send> Sync for SharedSlice<'_, T> {}

impl<T> Clone for SharedSlice<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for SharedSlice<'_, T> {}

impl<'a, T> SharedSlice<'a, T> {
    pub(crate) fn new(slice: &'a mut [T]) -> Self {
        Self {
            ptr: slice.as_mut_ptr(),
            len: slice.len(),
            _marker: PhantomData,
        }
    }

    /// Overwrite the element at `index`, dropping the previous value.
    ///
    /// # Safety
    /// No other thread may read or write `index` for the lifetime of the
    /// handle.
    pub(crate) unsafe fn write(&self, index: usize, value: T) {
        debug_assert!(index < self.len);
        *self.ptr.add(index) = value;
    }
}
