//! Per-thread access tokens.

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

/// A per-thread context for operating on a [`MultiQueue`].
///
/// Each handle owns a small generator seeded from the queue's seed and
/// the handle's id, plus the state that lets a thread stick to its
/// previously chosen inner queues for a few operations. Handles are
/// movable and cheap; every operating thread creates exactly one via
/// [`MultiQueue::handle`] and passes it by `&mut`, which is what keeps a
/// handle from being shared between threads.
///
/// [`MultiQueue`]: crate::MultiQueue
/// [`MultiQueue::handle`]: crate::MultiQueue::handle
pub struct Handle {
    rng: SmallRng,
    id: u64,
    pub(crate) push_index: usize,
    pub(crate) push_uses: u32,
    pub(crate) pop_candidates: Vec<usize>,
    pub(crate) pop_uses: u32,
}

impl Handle {
    pub(crate) fn new(id: u64, seed: u64, num_candidates: usize) -> Self {
        let rng = SmallRng::seed_from_u64(seed ^ id.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        Handle {
            rng,
            id,
            push_index: 0,
            push_uses: 0,
            pop_candidates: vec![0; num_candidates],
            pop_uses: 0,
        }
    }

    /// Id assigned at creation, unique within the owning queue.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Uniform index draw; the queue count is a power of two, so masking
    /// the low bits suffices.
    #[inline]
    pub(crate) fn draw(&mut self, mask: usize) -> usize {
        self.rng.next_u32() as usize & mask
    }

    /// Redraw the pop candidate set without replacement. A repeated index
    /// would turn best-of-k into best-of-fewer, so collisions are
    /// redrawn.
    pub(crate) fn refill_pop_candidates(&mut self, mask: usize) {
        for slot in 0..self.pop_candidates.len() {
            let mut index = self.draw(mask);
            while self.pop_candidates[..slot].contains(&index) {
                index = self.draw(mask);
            }
            self.pop_candidates[slot] = index;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_and_id_reproduce_draws() {
        let mut a = Handle::new(3, 99, 2);
        let mut b = Handle::new(3, 99, 2);
        let draws_a: Vec<usize> = (0..100).map(|_| a.draw(0xf)).collect();
        let draws_b: Vec<usize> = (0..100).map(|_| b.draw(0xf)).collect();
        assert_eq!(draws_a, draws_b);
    }

    #[test]
    fn different_ids_diverge() {
        let mut a = Handle::new(0, 7, 2);
        let mut b = Handle::new(1, 7, 2);
        let draws_a: Vec<usize> = (0..64).map(|_| a.draw(0xff)).collect();
        let draws_b: Vec<usize> = (0..64).map(|_| b.draw(0xff)).collect();
        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn candidates_are_distinct() {
        let mut handle = Handle::new(5, 1, 4);
        for _ in 0..1000 {
            handle.refill_pop_candidates(0x7);
            let mut seen = handle.pop_candidates.clone();
            seen.sort();
            seen.dedup();
            assert_eq!(4, seen.len());
        }
    }
}
