//! Tunables fixed at construction time.

use crate::heap::SiftStrategy;
use crate::key::SentinelPolicy;

/// Construction-time configuration of a [`MultiQueue`].
///
/// Every knob has a default that performs well across workloads; most
/// embedders only ever touch `seed`.
///
/// ```
/// use relaq::{Config, MultiQueue};
///
/// let config = Config {
///     seed: 42,
///     queue_factor: 2,
///     ..Config::default()
/// };
/// let pq: MultiQueue<u64, ()> = MultiQueue::with_config(8, config);
/// assert_eq!(16, pq.num_queues());
/// ```
///
/// [`MultiQueue`]: crate::MultiQueue
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Inner queues allocated per thread. The total count is rounded up
    /// to the next power of two so index draws reduce to a bit mask.
    pub queue_factor: usize,
    /// Inner queues sampled per pop attempt; the one with the smallest
    /// cached score is extracted from. Clamped to the queue count.
    pub pop_candidates: usize,
    /// Sampling rounds in which every candidate may report empty before
    /// a pop gives up (or falls back to a scan).
    pub pop_tries: u32,
    /// After `pop_tries` empty rounds, walk the whole queue array once
    /// before returning `None`.
    pub scan_if_empty: bool,
    /// Arity of each inner heap.
    pub heap_degree: usize,
    /// How each inner heap restores itself after a pop.
    pub sift_strategy: SiftStrategy,
    /// Capacity of each inner insertion buffer.
    pub insertion_buffer_size: usize,
    /// Capacity of each inner deletion buffer.
    pub deletion_buffer_size: usize,
    /// Which score value marks an empty inner queue.
    pub sentinel_policy: SentinelPolicy,
    /// Re-check the sampled score under the lock and retry if it changed;
    /// without it only emptiness is re-checked.
    pub compare_strict: bool,
    /// Operations a handle performs on its chosen inner queue(s) before
    /// drawing fresh ones. `1` draws fresh every time.
    pub stickiness: u32,
    /// Entries preallocated in each inner heap so pushes do not grow the
    /// backing array on the hot path.
    pub reserve_per_queue: usize,
    /// Seed for the per-handle generators. Identical seeds reproduce
    /// identical index sequences per handle.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            queue_factor: 4,
            pop_candidates: 2,
            pop_tries: 1,
            scan_if_empty: true,
            heap_degree: 8,
            sift_strategy: SiftStrategy::FullDown,
            insertion_buffer_size: 16,
            deletion_buffer_size: 16,
            sentinel_policy: SentinelPolicy::Implicit,
            compare_strict: true,
            stickiness: 1,
            reserve_per_queue: 0,
            seed: 1,
        }
    }
}
