//! A d-ary heap fronted by two small buffers that absorb the hot paths.
//!
//! Most pushes carry scores larger than the current top and most pops take
//! a recently seen small score. The *insertion buffer* collects pushes
//! unordered and flushes them into the heap in bulk; the *deletion buffer*
//! keeps a sorted run of the smallest entries so pops rarely touch the
//! heap at all.

use std::cmp;

use crate::heap::DaryHeap;

/// A buffered priority queue over `(score, item)` pairs.
///
/// Three compartments hold the entries:
///
/// * the **deletion buffer**, sorted by descending score so the current
///   top sits at the back and popping it is a truncation;
/// * the **insertion buffer**, an unordered scratch of recent pushes;
/// * the **heap**, holding the bulk.
///
/// Two invariants tie them together: no entry in the heap or insertion
/// buffer has a smaller score than any entry in the deletion buffer, and
/// the queue is empty exactly when the deletion buffer is empty.
///
/// ```
/// use relaq::{BufferedPq, DaryHeap, SiftStrategy};
///
/// let heap = DaryHeap::new(8, SiftStrategy::FullDown);
/// let mut pq: BufferedPq<u32, &str> = BufferedPq::new(16, 16, heap);
///
/// pq.push(20, "late");
/// pq.push(10, "early");
/// assert_eq!(pq.peek().map(|e| e.1), Some("early"));
/// assert_eq!(pq.pop(), Some((10, "early")));
/// assert_eq!(pq.pop(), Some((20, "late")));
/// assert_eq!(pq.pop(), None);
/// ```
pub struct BufferedPq<S, T>
where
    S: Ord,
{
    insertion: Vec<(S, T)>,
    /// Sorted descending; the entry at the back is the queue's top.
    deletion: Vec<(S, T)>,
    heap: DaryHeap<S, T>,
    insertion_cap: usize,
    deletion_cap: usize,
}

impl<S, T> BufferedPq<S, T>
where
    S: Ord,
{
    /// Wrap `heap` with buffers of the given capacities.
    ///
    /// Both buffers are allocated up front and never grow past their
    /// capacity, so pushes and pops only allocate when the heap's backing
    /// array has to expand.
    ///
    /// # Panics
    ///
    /// Panics if either capacity is zero.
    #[must_use]
    pub fn new(insertion_cap: usize, deletion_cap: usize, heap: DaryHeap<S, T>) -> Self {
        assert!(insertion_cap >= 1, "insertion buffer must hold at least 1 entry");
        assert!(deletion_cap >= 1, "deletion buffer must hold at least 1 entry");
        BufferedPq {
            insertion: Vec::with_capacity(insertion_cap),
            deletion: Vec::with_capacity(deletion_cap),
            heap,
            insertion_cap,
            deletion_cap,
        }
    }

    /// Reference to the entry with the smallest score, or `None` when the
    /// queue is empty.
    #[inline]
    pub fn peek(&self) -> Option<&(S, T)> {
        self.deletion.last()
    }

    /// Remove and return the entry with the smallest score.
    ///
    /// Draining the last deletion-buffer entry triggers a refill from the
    /// other compartments before returning.
    pub fn pop(&mut self) -> Option<(S, T)> {
        let top = self.deletion.pop()?;
        if self.deletion.is_empty() {
            self.refill_deletion_buffer();
        }
        Some(top)
    }

    /// Insert an entry.
    ///
    /// Scores smaller than the largest buffered small go into the deletion
    /// buffer, displacing its largest entry when full; everything else
    /// lands in the insertion buffer, which flushes into the heap when it
    /// overflows.
    pub fn push(&mut self, score: S, item: T) {
        if self.deletion.is_empty() {
            self.deletion.push((score, item));
            return;
        }
        if score < self.deletion[0].0 {
            if self.deletion.len() == self.deletion_cap {
                let displaced = self.deletion.remove(0);
                let pos = self.deletion.partition_point(|e| e.0 > score);
                self.deletion.insert(pos, (score, item));
                self.overflow(displaced);
            } else {
                let pos = self.deletion.partition_point(|e| e.0 > score);
                self.deletion.insert(pos, (score, item));
            }
            return;
        }
        self.overflow((score, item));
    }

    /// `true` if the queue holds no entries.
    ///
    /// The deletion buffer is refilled whenever it drains, so it is empty
    /// exactly when all three compartments are.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.deletion.is_empty()
    }

    /// Total number of entries across all three compartments.
    #[inline]
    pub fn len(&self) -> usize {
        self.insertion.len() + self.deletion.len() + self.heap.len()
    }

    /// Drop all entries, keeping the allocations.
    pub fn clear(&mut self) {
        self.insertion.clear();
        self.deletion.clear();
        self.heap.clear();
    }

    /// Grow the heap's backing array to hold at least `cap` entries.
    pub fn reserve(&mut self, cap: usize) {
        self.heap.reserve(cap);
    }

    /// Route an entry that does not belong in the deletion buffer.
    fn overflow(&mut self, value: (S, T)) {
        if self.insertion.len() == self.insertion_cap {
            self.flush_insertion_buffer();
            self.heap.push(value.0, value.1);
        } else {
            self.insertion.push(value);
        }
    }

    fn flush_insertion_buffer(&mut self) {
        for (score, item) in self.insertion.drain(..) {
            self.heap.push(score, item);
        }
    }

    /// Refill the drained deletion buffer with the smallest entries of the
    /// remaining compartments, sorted descending.
    fn refill_deletion_buffer(&mut self) {
        debug_assert!(self.deletion.is_empty());
        self.flush_insertion_buffer();
        let refill = cmp::min(self.deletion_cap, self.heap.len());
        for _ in 0..refill {
            match self.heap.pop() {
                Some(entry) => self.deletion.push(entry),
                None => break,
            }
        }
        // the heap yielded ascending scores; the buffer stores them
        // descending with the smallest at the back
        self.deletion.reverse();
    }
}
