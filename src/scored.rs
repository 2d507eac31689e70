//! `MinScored<K, T>` holds a score and a scored object for use with a
//! `BinaryHeap`, comparing in reverse order by the score so that the heap
//! acts as a min-heap.

use core::cmp::Ordering;

#[derive(Copy, Clone, Debug)]
pub(crate) struct MinScored<K, T>(pub K, pub T);

impl<K: PartialEq, T> PartialEq for MinScored<K, T> {
    #[inline]
    fn eq(&self, other: &MinScored<K, T>) -> bool {
        self.0 == other.0
    }
}

impl<K: PartialEq, T> Eq for MinScored<K, T> {}

impl<K: Ord, T> PartialOrd for MinScored<K, T> {
    #[inline]
    fn partial_cmp(&self, other: &MinScored<K, T>) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord, T> Ord for MinScored<K, T> {
    #[inline]
    fn cmp(&self, other: &MinScored<K, T>) -> Ordering {
        other.0.cmp(&self.0)
    }
}
