//! Wave sizing and batch partitioning.

use std::num::NonZeroUsize;

/// Worker threads per logical core.
pub const THREADS_PER_CORE: usize = 2;

/// Thread count used when the core count cannot be determined.
pub const FALLBACK_THREAD_COUNT: usize = 2;

/// Estimate how many files to process concurrently.
pub fn estimate_thread_count() -> usize {
    std::thread::available_parallelism()
        .map(|cores| cores.get() * THREADS_PER_CORE)
        .unwrap_or(FALLBACK_THREAD_COUNT)
}

/// Resolve a configured thread count (0 = auto) into a wave size.
pub fn wave_size(configured: usize) -> NonZeroUsize {
    NonZeroUsize::new(configured)
        .or_else(|| NonZeroUsize::new(estimate_thread_count()))
        .unwrap_or(NonZeroUsize::MIN)
}

/// Split `items` into consecutive batches of `size`.
///
/// Every batch holds exactly `size` items except possibly the last.
/// Order is preserved within and across batches; no items yield no batches.
pub fn chunk<T>(items: Vec<T>, size: NonZeroUsize) -> Vec<Vec<T>> {
    let size = size.get();
    let mut batches = Vec::with_capacity(items.len().div_ceil(size));
    let mut current = Vec::with_capacity(size);

    for item in items {
        current.push(item);
        if current.len() == size {
            batches.push(std::mem::replace(&mut current, Vec::with_capacity(size)));
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }

    batches
}
