//! Associative queue of pending scheduled entries.

/// An associative container optimized for extraction of the entry with the
/// lowest key, with FIFO ordering for same-key entries.
///
/// Each entry is tagged at insertion with a sequence number taken from a
/// monotonic counter and entries are ordered by their `(key, sequence)` pair.
/// Unlike a conventional binary heap, an entry pulled from the queue can later
/// be re-inserted under its original sequence number, in which case it keeps
/// its rank relative to same-key entries submitted before and after it. This
/// is what makes the fire order of interleaved repeating schedules
/// well-defined: a repeating entry competes at every occurrence with the
/// sequence number of its original submission.
///
/// The queue supports no random deletion; cancelled entries are instead
/// discarded when they reach the front.
pub(crate) struct PendingQueue<K, V>
where
    K: Copy + Ord,
{
    heap: Vec<Item<K, V>>,
    next_seq: u64,
}

impl<K: Copy + Ord, V> PendingQueue<K, V> {
    /// Creates an empty `PendingQueue`.
    pub(crate) fn new() -> Self {
        Self {
            heap: Vec::new(),
            next_seq: 0,
        }
    }

    /// Inserts a new entry under a fresh sequence number and returns that
    /// sequence number.
    pub(crate) fn insert(&mut self, key: K, value: V) -> u64 {
        let seq = self.next_seq;
        assert_ne!(seq, u64::MAX, "too many scheduled entries");
        self.next_seq += 1;
        self.insert_reused(key, seq, value);

        seq
    }

    /// Re-inserts an entry under a sequence number previously returned by
    /// `insert`.
    ///
    /// The caller must guarantee that no live entry currently holds this
    /// sequence number.
    pub(crate) fn insert_reused(&mut self, key: K, seq: u64, value: V) {
        debug_assert!(seq < self.next_seq);

        self.heap.push(Item { key, seq, value });
        self.sift_up(self.heap.len() - 1);
    }

    /// Returns the key, the sequence number and a value reference for the
    /// entry with the lowest `(key, sequence)` pair, if any.
    pub(crate) fn peek(&self) -> Option<(K, u64, &V)> {
        self.heap
            .first()
            .map(|item| (item.key, item.seq, &item.value))
    }

    /// Removes and returns the entry with the lowest `(key, sequence)` pair,
    /// if any.
    pub(crate) fn pull(&mut self) -> Option<(K, u64, V)> {
        if self.heap.is_empty() {
            return None;
        }
        let item = self.heap.swap_remove(0);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }

        Some((item.key, item.seq, item.value))
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx != 0 {
            let parent_idx = (idx - 1) / 2;
            if self.heap[parent_idx].rank() <= self.heap[idx].rank() {
                break;
            }
            self.heap.swap(idx, parent_idx);
            idx = parent_idx;
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        loop {
            let left_idx = 2 * idx + 1;
            let right_idx = left_idx + 1;
            let mut min_idx = idx;
            if left_idx < self.heap.len() && self.heap[left_idx].rank() < self.heap[min_idx].rank()
            {
                min_idx = left_idx;
            }
            if right_idx < self.heap.len()
                && self.heap[right_idx].rank() < self.heap[min_idx].rank()
            {
                min_idx = right_idx;
            }
            if min_idx == idx {
                return;
            }
            self.heap.swap(idx, min_idx);
            idx = min_idx;
        }
    }
}

struct Item<K, V> {
    key: K,
    seq: u64,
    value: V,
}

impl<K: Copy, V> Item<K, V> {
    // Ranks are unique among live entries since sequence numbers are never
    // shared.
    fn rank(&self) -> (K, u64) {
        (self.key, self.seq)
    }
}
