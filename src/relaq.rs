//! Relaxed concurrent priority queue.
//!
//! `MultiQueue` shares one logical priority queue between many threads by
//! scattering entries over an array of independently guarded sequential
//! queues. Pushes go to one queue drawn at random; pops sample a couple of
//! queues and extract from the one whose cached smallest score wins. No
//! operation ever touches more than one guard at a time, so there is no
//! single point of contention — at the price of *relaxation*: a pop
//! returns one of the currently small entries, not necessarily the global
//! minimum.
//!
//! There are three reasons to reach for this structure over a mutex around
//! `std::collections::BinaryHeap`:
//!
//! 1 - Throughput scales with threads.
//!     * With `c` queues per thread (default 4), the chance of two threads
//!     colliding on a guard stays small, and a collision costs one redraw
//!     rather than a wait on a kernel mutex.
//!
//! 2 - Pops stay cheap under contention.
//!     * Each inner queue publishes its smallest score through an atomic
//!     cell. Picking the better of two sampled queues needs no locks at
//!     all; the guard is taken only for the final extraction.
//!
//! 3 - The relaxation is bounded in practice.
//!     * Sampling two random queues and taking the better one keeps the
//!     rank error of returned entries small with high probability; it
//!     does not degrade as threads are added.
//!
//! Ordering of scores is the natural ascending [`Ord`] over the primitive
//! integers (see [`Key`]), so the smallest score is popped first. There is
//! deliberately no global ordering guarantee between concurrent pops: two
//! threads popping at once may observe each other's results out of score
//! order.
//!
//! # Example
//!
//! ```
//! use std::thread;
//! use relaq::MultiQueue;
//!
//! let queue: MultiQueue<u64, u64> = MultiQueue::new(2);
//!
//! thread::scope(|scope| {
//!     scope.spawn(|| {
//!         let mut handle = queue.handle();
//!         for key in 0..1000 {
//!             queue.push(&mut handle, key, key * 2);
//!         }
//!     });
//!     scope.spawn(|| {
//!         let mut handle = queue.handle();
//!         let mut taken = 0;
//!         while taken < 500 {
//!             if let Some((key, item)) = queue.try_pop(&mut handle) {
//!                 assert_eq!(key * 2, item);
//!                 taken += 1;
//!             }
//!         }
//!     });
//! });
//! ```

extern crate rand;

use std::hint;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

mod buffered;
mod config;
mod handle;
mod heap;
mod inner;
mod key;
mod rawheap;

pub use buffered::BufferedPq;
pub use config::Config;
pub use handle::Handle;
pub use heap::{DaryHeap, SiftStrategy};
pub use key::{Key, SentinelPolicy};

use inner::InnerPq;
use key::Sentinel;

/// A relaxed concurrent priority queue over `(score, item)` pairs.
///
/// The queue is a fixed, cache-line-aligned array of guarded sequential
/// priority queues plus a randomized policy that maps each operation onto
/// one of them. It is constructed once for a known number of threads and
/// then shared by reference; every operating thread obtains its own
/// [`Handle`] and passes it to [`push`] and [`try_pop`].
///
/// Entries are moved in on `push` and moved back out on `try_pop`. The
/// queue itself never blocks and never spawns threads.
///
/// ```
/// use relaq::MultiQueue;
///
/// let queue: MultiQueue<u32, &str> = MultiQueue::new(1);
/// let mut handle = queue.handle();
///
/// queue.push(&mut handle, 2, "two");
/// queue.push(&mut handle, 1, "one");
///
/// let mut drained = Vec::new();
/// while let Some((key, _)) = queue.try_pop(&mut handle) {
///     drained.push(key);
/// }
/// drained.sort();
/// assert_eq!(vec![1, 2], drained);
/// ```
///
/// # Relaxation
///
/// [`try_pop`] extracts from the better of `pop_candidates` sampled inner
/// queues, so it returns a *small* score, not necessarily the smallest.
/// Under a single thread the sampling is still random; force exact
/// min-first order by sampling every queue:
///
/// ```
/// use relaq::{Config, MultiQueue};
///
/// let config = Config { pop_candidates: usize::MAX, ..Config::default() };
/// let queue = MultiQueue::with_config(1, config);
/// let mut handle = queue.handle();
///
/// for key in [5_u32, 2, 9, 1] {
///     queue.push(&mut handle, key, ());
/// }
/// assert_eq!(Some(1), queue.try_pop(&mut handle).map(|(key, _)| key));
/// ```
///
/// [`push`]: MultiQueue::push
/// [`try_pop`]: MultiQueue::try_pop
pub struct MultiQueue<K, V>
where
    K: Key,
{
    queues: Box<[CachePadded<InnerPq<K, V>>]>,
    /// `num_queues - 1`; the count is a power of two.
    mask: usize,
    /// Effective best-of-k, clamped to the queue count.
    pop_candidates: usize,
    sentinel: Sentinel<K>,
    config: Config,
    handle_ids: CachePadded<AtomicU64>,
}

impl<K, V> MultiQueue<K, V>
where
    K: Key,
{
    /// Create a queue for `num_threads` operating threads with the
    /// default [`Config`].
    ///
    /// # Examples
    ///
    /// ```
    /// use relaq::MultiQueue;
    ///
    /// let queue: MultiQueue<u64, String> = MultiQueue::new(8);
    /// assert_eq!(32, queue.num_queues());
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `num_threads` is zero.
    #[must_use]
    pub fn new(num_threads: usize) -> Self {
        Self::with_config(num_threads, Config::default())
    }

    /// Create a queue for `num_threads` operating threads with an
    /// explicit [`Config`].
    ///
    /// The inner queue count is `queue_factor * num_threads` rounded up
    /// to the next power of two.
    ///
    /// # Panics
    ///
    /// Panics if `num_threads` is zero or any configured size is zero.
    #[must_use]
    pub fn with_config(num_threads: usize, config: Config) -> Self {
        assert!(num_threads >= 1, "need at least one thread");
        assert!(config.queue_factor >= 1, "need at least one queue per thread");
        assert!(config.pop_candidates >= 1, "need at least one pop candidate");
        assert!(config.stickiness >= 1, "stickiness of 1 disables reuse; 0 is meaningless");

        let num_queues = (config.queue_factor * num_threads).next_power_of_two();
        let sentinel = Sentinel::new(config.sentinel_policy);
        let queues: Box<[CachePadded<InnerPq<K, V>>]> = (0..num_queues)
            .map(|_| CachePadded::new(InnerPq::new(&config, sentinel)))
            .collect();

        MultiQueue {
            queues,
            mask: num_queues - 1,
            pop_candidates: config.pop_candidates.min(num_queues),
            sentinel,
            config,
            handle_ids: CachePadded::new(AtomicU64::new(0)),
        }
    }

    /// Create a [`Handle`] for the calling thread.
    ///
    /// Handles are cheap and independent; creating one assigns the next
    /// id and seeds the handle's generator from `(config.seed, id)`, so
    /// runs with the same seed and thread schedule draw the same queue
    /// indices.
    #[must_use]
    pub fn handle(&self) -> Handle {
        let id = self.handle_ids.fetch_add(1, Ordering::Relaxed);
        Handle::new(id, self.config.seed, self.pop_candidates)
    }

    /// Insert an entry through `handle`.
    ///
    /// One inner queue is drawn at random and locked; a taken guard costs
    /// a redraw, never a wait. The score must not equal the reserved
    /// sentinel value (checked in debug builds).
    ///
    /// # Examples
    ///
    /// ```
    /// use relaq::MultiQueue;
    ///
    /// let queue: MultiQueue<u32, String> = MultiQueue::new(1);
    /// let mut handle = queue.handle();
    /// queue.push(&mut handle, 7, "entry".to_string());
    /// ```
    pub fn push(&self, handle: &mut Handle, score: K, item: V) {
        debug_assert!(
            !self.sentinel.is_sentinel(score),
            "live scores must not equal the sentinel"
        );

        let mut index = handle.push_index;
        if handle.push_uses == 0 || !self.queues[index].try_lock() {
            index = handle.draw(self.mask);
            while !self.queues[index].try_lock() {
                hint::spin_loop();
                index = handle.draw(self.mask);
            }
            handle.push_index = index;
            handle.push_uses = self.config.stickiness;
        }
        // SAFETY: the guard of `queues[index]` was acquired above and is
        //      released right after.
        unsafe { self.queues[index].locked_push(score, item) };
        self.queues[index].unlock();
        handle.push_uses -= 1;
    }

    /// Extract one of the currently small entries, or `None` if the
    /// sampled queues report empty.
    ///
    /// Each attempt snapshots the cached scores of `pop_candidates`
    /// distinct random inner queues, locks the best one and re-checks it
    /// under the guard. An attempt in which every sample reports empty
    /// consumes one of the `pop_tries`; guard collisions and entries
    /// stolen between snapshot and lock only cost a retry. When the
    /// budget runs out, `scan_if_empty` walks the whole array once, which
    /// makes a `None` under quiescence mean the queue really is empty.
    /// With the scan disabled, `None` may be spurious while other threads
    /// drain concurrently.
    ///
    /// # Examples
    ///
    /// ```
    /// use relaq::MultiQueue;
    ///
    /// let queue: MultiQueue<u32, u32> = MultiQueue::new(1);
    /// let mut handle = queue.handle();
    /// assert_eq!(None, queue.try_pop(&mut handle));
    ///
    /// queue.push(&mut handle, 3, 33);
    /// assert_eq!(Some((3, 33)), queue.try_pop(&mut handle));
    /// assert_eq!(None, queue.try_pop(&mut handle));
    /// ```
    pub fn try_pop(&self, handle: &mut Handle) -> Option<(K, V)> {
        let mut tries = 0;
        while tries < self.config.pop_tries {
            if handle.pop_uses == 0 {
                handle.refill_pop_candidates(self.mask);
                handle.pop_uses = self.config.stickiness;
            }

            let mut best = handle.pop_candidates[0];
            let mut best_key = self.queues[best].top_key();
            for &candidate in &handle.pop_candidates[1..] {
                let key = self.queues[candidate].top_key();
                if self.sentinel.precedes(key, best_key) {
                    best = candidate;
                    best_key = key;
                }
            }

            if self.sentinel.is_sentinel(best_key) {
                handle.pop_uses = 0;
                tries += 1;
                continue;
            }
            let queue = &*self.queues[best];
            if !queue.try_lock() {
                handle.pop_uses = 0;
                hint::spin_loop();
                continue;
            }
            // the snapshot may have gone stale before the guard was won
            let locked_key = queue.top_key();
            if self.sentinel.is_sentinel(locked_key)
                || (self.config.compare_strict && locked_key != best_key)
            {
                queue.unlock();
                handle.pop_uses = 0;
                continue;
            }
            // SAFETY: the guard of `queue` was acquired above and is
            //      released right after.
            let top = unsafe { queue.locked_try_pop(self.sentinel) };
            queue.unlock();
            handle.pop_uses -= 1;
            return top;
        }

        if self.config.scan_if_empty {
            self.scan_pop()
        } else {
            None
        }
    }

    /// Number of inner queues backing this instance.
    #[inline]
    pub fn num_queues(&self) -> usize {
        self.queues.len()
    }

    /// Move every entry out of the queue.
    ///
    /// Exclusive access stands in for quiescence, so no guards are taken
    /// and nothing can race. The returned entries carry no particular
    /// order.
    ///
    /// # Examples
    ///
    /// ```
    /// use relaq::MultiQueue;
    ///
    /// let mut queue: MultiQueue<u32, u32> = MultiQueue::new(1);
    /// let mut handle = queue.handle();
    /// queue.push(&mut handle, 1, 11);
    /// queue.push(&mut handle, 2, 22);
    ///
    /// let mut entries = queue.drain();
    /// entries.sort();
    /// assert_eq!(vec![(1, 11), (2, 22)], entries);
    /// assert!(queue.is_empty());
    /// ```
    pub fn drain(&mut self) -> Vec<(K, V)> {
        let sentinel = self.sentinel;
        let mut out = Vec::new();
        for queue in self.queues.iter_mut() {
            queue.drain_into(sentinel, &mut out);
        }
        out
    }

    /// Total number of entries, counted under exclusive access.
    pub fn len(&mut self) -> usize {
        self.queues.iter_mut().map(|queue| queue.len_mut()).sum()
    }

    /// `true` if no inner queue holds an entry, checked under exclusive
    /// access.
    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// Consume the queue and return every entry sorted ascending by
    /// score.
    ///
    /// # Examples
    ///
    /// ```
    /// use relaq::MultiQueue;
    ///
    /// let queue: MultiQueue<u32, u32> = MultiQueue::new(1);
    /// let mut handle = queue.handle();
    /// for key in [5, 1, 4] {
    ///     queue.push(&mut handle, key, key * 11);
    /// }
    ///
    /// let sorted = queue.into_sorted_vec();
    /// assert_eq!(vec![(1, 11), (4, 44), (5, 55)], sorted);
    /// ```
    #[must_use]
    pub fn into_sorted_vec(mut self) -> Vec<(K, V)> {
        let mut entries = self.drain();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Walk every inner queue once, extracting from the first non-empty
    /// lockable one.
    fn scan_pop(&self) -> Option<(K, V)> {
        for queue in self.queues.iter() {
            if self.sentinel.is_sentinel(queue.top_key()) || !queue.try_lock() {
                continue;
            }
            // SAFETY: the guard of `queue` was acquired above and is
            //      released right after.
            let top = unsafe { queue.locked_try_pop(self.sentinel) };
            queue.unlock();
            if top.is_some() {
                return top;
            }
        }
        None
    }
}

impl<K, V> Default for MultiQueue<K, V>
where
    K: Key,
{
    /// A queue sized for the machine's logical CPU count.
    fn default() -> Self {
        MultiQueue::new(num_cpus::get())
    }
}
