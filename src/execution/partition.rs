//! Static work partitioning across a fixed set of workers.

use std::ops::Range;

/// Half-open range of units owned by worker `thread_id` out of `thread_count`
/// when `total` units are split as evenly as possible.
///
/// Worker `t` gets `[floor(t*T/n), floor((t+1)*T/n))`, clamped to `T`. The
/// ranges of workers `0..n` are disjoint and cover `0..T` exactly once.
/// Panics if `thread_count` is zero.
pub fn partition(thread_id: usize, thread_count: usize, total: usize) -> Range<usize> {
    assert!(thread_count > 0, "partition over zero workers");
    let bound = |t: usize| ((t as u128 * total as u128) / thread_count as u128) as usize;
    let start = bound(thread_id).min(total);
    let end = bound(thread_id + 1).min(total);
    start..end
}

/// All ranges for `thread_count` workers, in worker order.
pub fn partitions(thread_count: usize, total: usize) -> Vec<Range<usize>> {
    (0..thread_count)
        .map(|t| partition(t, thread_count, total))
        .collect()
}
