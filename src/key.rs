//! Key types usable in the atomic top-score cache, and the sentinel that
//! marks an empty inner queue in that cache.

use std::sync::atomic::{
    AtomicI16, AtomicI32, AtomicI64, AtomicI8, AtomicIsize, AtomicU16, AtomicU32, AtomicU64,
    AtomicU8, AtomicUsize, Ordering,
};

/// Scores that can be mirrored into a plain atomic word.
///
/// The multiqueue publishes each inner queue's smallest score through an
/// atomic cell so that pop candidates can be compared without taking any
/// lock. That restricts scores to the primitive integers, which all
/// implement this trait. Ordering is the natural ascending [`Ord`]; for
/// max-priority use, transform the score (for example `u32::MAX - k`).
///
/// Loads and stores of the cell are relaxed. The guard lock's
/// acquire/release edge is what orders them across threads.
pub trait Key: Copy + Ord + Default + Send + Sync {
    /// The atomic cell holding a mirrored score.
    type Atomic: Send + Sync;
    /// The largest value of the key domain.
    const EXTREME: Self;

    fn atomic(self) -> Self::Atomic;
    fn load(cell: &Self::Atomic) -> Self;
    fn store(cell: &Self::Atomic, value: Self);
}

macro_rules! impl_key {
    ($($int:ty => $atomic:ty),* $(,)?) => {$(
        impl Key for $int {
            type Atomic = $atomic;
            const EXTREME: Self = <$int>::MAX;

            #[inline]
            fn atomic(self) -> $atomic {
                <$atomic>::new(self)
            }

            #[inline]
            fn load(cell: &$atomic) -> Self {
                cell.load(Ordering::Relaxed)
            }

            #[inline]
            fn store(cell: &$atomic, value: Self) {
                cell.store(value, Ordering::Relaxed)
            }
        }
    )*};
}

impl_key! {
    u8 => AtomicU8,
    u16 => AtomicU16,
    u32 => AtomicU32,
    u64 => AtomicU64,
    usize => AtomicUsize,
    i8 => AtomicI8,
    i16 => AtomicI16,
    i32 => AtomicI32,
    i64 => AtomicI64,
    isize => AtomicIsize,
}

/// Which score value is reserved to mark an empty inner queue.
///
/// Live scores must never equal the reserved value; pushes check this in
/// debug builds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SentinelPolicy {
    /// Reserve the key type's maximum. The reserved value loses every
    /// score comparison under the plain ascending order, so no wrapping
    /// is needed. This is the default.
    Implicit,
    /// Reserve the key type's default value (zero for the integers) and
    /// rank it worse than any live score. Useful when the full upper
    /// range of the key domain is meaningful.
    DefaultConstructed,
}

/// A sentinel instance for a concrete key type: the reserved value plus
/// the wrapped comparison that keeps it from ever winning a snapshot.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Sentinel<K> {
    policy: SentinelPolicy,
    value: K,
}

impl<K: Key> Sentinel<K> {
    pub(crate) fn new(policy: SentinelPolicy) -> Self {
        let value = match policy {
            SentinelPolicy::Implicit => K::EXTREME,
            SentinelPolicy::DefaultConstructed => K::default(),
        };
        Sentinel { policy, value }
    }

    #[inline]
    pub(crate) fn value(&self) -> K {
        self.value
    }

    #[inline]
    pub(crate) fn is_sentinel(&self, key: K) -> bool {
        key == self.value
    }

    /// Strict "comes before" between two cached scores. The sentinel
    /// never precedes anything and every live score precedes it.
    #[inline]
    pub(crate) fn precedes(&self, lhs: K, rhs: K) -> bool {
        match self.policy {
            SentinelPolicy::Implicit => lhs < rhs,
            SentinelPolicy::DefaultConstructed => {
                if lhs == self.value {
                    false
                } else if rhs == self.value {
                    true
                } else {
                    lhs < rhs
                }
            }
        }
    }
}
