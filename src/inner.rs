//! One lock-guarded inner queue and its lock-free top-score cache.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::buffered::BufferedPq;
use crate::config::Config;
use crate::heap::DaryHeap;
use crate::key::{Key, Sentinel};

/// A buffered priority queue behind a single-word spin guard, publishing
/// its current smallest score through an atomic cell.
///
/// The guard is the only synchronization: whoever wins the
/// compare-and-swap owns the queue until `unlock`. The cached score may
/// be read by anyone at any time and may be stale; callers re-check it
/// after locking. It is written only by the guard holder, with the
/// guard's release store making the write visible to the next holder.
pub(crate) struct InnerPq<K, V>
where
    K: Key,
{
    guard: AtomicBool,
    top_key: K::Atomic,
    pq: UnsafeCell<BufferedPq<K, V>>,
}

// The UnsafeCell is only entered by the guard holder, so the wrapper is
// as shareable as its contents are sendable.
unsafe impl<K: Key, V: Send> Sync for InnerPq<K, V> {}

impl<K, V> InnerPq<K, V>
where
    K: Key,
{
    pub(crate) fn new(config: &Config, sentinel: Sentinel<K>) -> Self {
        let heap = DaryHeap::with_capacity(
            config.heap_degree,
            config.sift_strategy,
            config.reserve_per_queue,
        );
        InnerPq {
            guard: AtomicBool::new(false),
            top_key: sentinel.value().atomic(),
            pq: UnsafeCell::new(BufferedPq::new(
                config.insertion_buffer_size,
                config.deletion_buffer_size,
                heap,
            )),
        }
    }

    /// Try to acquire the guard. Never blocks.
    #[inline]
    pub(crate) fn try_lock(&self) -> bool {
        self.guard
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Release the guard. The caller must hold it.
    #[inline]
    pub(crate) fn unlock(&self) {
        debug_assert!(self.guard.load(Ordering::Relaxed));
        self.guard.store(false, Ordering::Release);
    }

    /// Possibly stale snapshot of the smallest score, readable without
    /// the guard.
    #[inline]
    pub(crate) fn top_key(&self) -> K {
        K::load(&self.top_key)
    }

    /// Insert an entry and refresh the cached score.
    ///
    /// # Safety
    ///
    /// The caller must hold the guard.
    pub(crate) unsafe fn locked_push(&self, score: K, item: V) {
        let pq = &mut *self.pq.get();
        pq.push(score, item);
        // never empty after a push
        if let Some(top) = pq.peek() {
            K::store(&self.top_key, top.0);
        }
    }

    /// Extract the smallest entry, refresh the cached score (to the
    /// sentinel when drained), and return the entry.
    ///
    /// # Safety
    ///
    /// The caller must hold the guard.
    pub(crate) unsafe fn locked_try_pop(&self, sentinel: Sentinel<K>) -> Option<(K, V)> {
        let pq = &mut *self.pq.get();
        let top = pq.pop();
        let key = pq.peek().map_or(sentinel.value(), |entry| entry.0);
        K::store(&self.top_key, key);
        top
    }

    /// Move every entry into `out`. Exclusive access makes the guard
    /// unnecessary.
    pub(crate) fn drain_into(&mut self, sentinel: Sentinel<K>, out: &mut Vec<(K, V)>) {
        let pq = self.pq.get_mut();
        while let Some(entry) = pq.pop() {
            out.push(entry);
        }
        K::store(&self.top_key, sentinel.value());
    }

    /// Entry count under exclusive access.
    pub(crate) fn len_mut(&mut self) -> usize {
        self.pq.get_mut().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::SentinelPolicy;

    fn inner() -> (InnerPq<u32, u32>, Sentinel<u32>) {
        let sentinel = Sentinel::new(SentinelPolicy::Implicit);
        (InnerPq::new(&Config::default(), sentinel), sentinel)
    }

    #[test]
    fn lock_is_exclusive_until_released() {
        let (pq, _) = inner();
        assert!(pq.try_lock());
        assert!(!pq.try_lock());
        pq.unlock();
        assert!(pq.try_lock());
        pq.unlock();
    }

    #[test]
    fn cached_score_tracks_contents() {
        let (pq, sentinel) = inner();
        assert!(sentinel.is_sentinel(pq.top_key()));

        assert!(pq.try_lock());
        unsafe {
            pq.locked_push(30, 300);
            assert_eq!(30, pq.top_key());
            pq.locked_push(10, 100);
            assert_eq!(10, pq.top_key());
            pq.locked_push(20, 200);
            assert_eq!(10, pq.top_key());

            assert_eq!(Some((10, 100)), pq.locked_try_pop(sentinel));
            assert_eq!(20, pq.top_key());
            assert_eq!(Some((20, 200)), pq.locked_try_pop(sentinel));
            assert_eq!(Some((30, 300)), pq.locked_try_pop(sentinel));
            assert!(sentinel.is_sentinel(pq.top_key()));
            assert_eq!(None, pq.locked_try_pop(sentinel));
        }
        pq.unlock();
    }

    #[test]
    fn drain_resets_the_cache() {
        let (mut pq, sentinel) = inner();
        assert!(pq.try_lock());
        unsafe {
            pq.locked_push(5, 50);
            pq.locked_push(1, 10);
        }
        pq.unlock();

        let mut out = Vec::new();
        pq.drain_into(sentinel, &mut out);
        out.sort();
        assert_eq!(vec![(1, 10), (5, 50)], out);
        assert!(sentinel.is_sentinel(pq.top_key()));
        assert_eq!(0, pq.len_mut());
    }
}
