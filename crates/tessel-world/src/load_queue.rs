//! Nearest-first queue of chunk requests waiting for meshing capacity.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;
use tessel_voxel::ChunkCoord;

/// Priority queue for chunks awaiting submission, ordered by distance to
/// the viewer.
///
/// Removal is lazy: [`remove`](Self::remove) only forgets the coordinate and
/// [`dequeue`](Self::dequeue) skips heap entries that are no longer pending.
#[derive(Debug, Default)]
pub struct ChunkLoadQueue {
    /// Min-heap: `(distance_squared, coord)`.
    queue: BinaryHeap<Reverse<(i64, ChunkCoord)>>,
    /// Coordinates currently queued (dedup guard).
    pending: FxHashSet<ChunkCoord>,
}

impl ChunkLoadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `coord`. Duplicates are ignored.
    pub fn enqueue(&mut self, coord: ChunkCoord, dist_sq: i64) {
        if self.pending.insert(coord) {
            self.queue.push(Reverse((dist_sq, coord)));
        }
    }

    /// Dequeues the nearest pending chunk.
    pub fn dequeue(&mut self) -> Option<(i64, ChunkCoord)> {
        while let Some(Reverse((dist_sq, coord))) = self.queue.pop() {
            if self.pending.remove(&coord) {
                return Some((dist_sq, coord));
            }
        }
        None
    }

    /// Forgets `coord`. Returns `true` if it was pending.
    pub fn remove(&mut self, coord: ChunkCoord) -> bool {
        self.pending.remove(&coord)
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.pending.contains(&coord)
    }

    /// Drops every pending coordinate for which `keep` returns `false`.
    pub fn retain(&mut self, mut keep: impl FnMut(ChunkCoord) -> bool) {
        self.pending.retain(|&coord| keep(coord));
    }

    /// Recomputes priorities against a new viewer position and drops stale
    /// heap entries.
    pub fn reprioritize(&mut self, center: ChunkCoord) {
        self.queue = self
            .pending
            .iter()
            .map(|&coord| Reverse((coord.distance_sq(center), coord)))
            .collect();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i32) -> ChunkCoord {
        ChunkCoord::new(x, 0, 0)
    }

    #[test]
    fn test_dequeues_nearest_first() {
        let mut queue = ChunkLoadQueue::new();
        queue.enqueue(c(3), 9);
        queue.enqueue(c(1), 1);
        queue.enqueue(c(2), 4);
        assert_eq!(queue.dequeue(), Some((1, c(1))));
        assert_eq!(queue.dequeue(), Some((4, c(2))));
        assert_eq!(queue.dequeue(), Some((9, c(3))));
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn test_duplicates_ignored() {
        let mut queue = ChunkLoadQueue::new();
        queue.enqueue(c(1), 1);
        queue.enqueue(c(1), 0);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.dequeue(), Some((1, c(1))));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_removed_entries_are_skipped() {
        let mut queue = ChunkLoadQueue::new();
        queue.enqueue(c(1), 1);
        queue.enqueue(c(2), 4);
        assert!(queue.remove(c(1)));
        assert!(!queue.remove(c(1)));
        assert!(!queue.contains(c(1)));
        assert_eq!(queue.dequeue(), Some((4, c(2))));
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn test_retain_and_reprioritize() {
        let mut queue = ChunkLoadQueue::new();
        for x in 0..6 {
            queue.enqueue(c(x), i64::from(x * x));
        }
        queue.retain(|coord| coord.x % 2 == 0);
        assert_eq!(queue.len(), 3);

        // The viewer moved to x = 4: chunk 4 is now the nearest.
        queue.reprioritize(c(4));
        assert_eq!(queue.dequeue(), Some((0, c(4))));
        assert_eq!(queue.dequeue(), Some((4, c(2))));
        assert_eq!(queue.dequeue(), Some((16, c(0))));
    }

    #[test]
    fn test_clear() {
        let mut queue = ChunkLoadQueue::new();
        queue.enqueue(c(1), 1);
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.dequeue(), None);
    }
}
