//! Chunk-grid coordinates and the world-block ↔ chunk mapping.

use serde::{Deserialize, Serialize};

use crate::chunk::{CHUNK_BITS, CHUNK_MASK, CHUNK_SIZE};

/// Position of a chunk in chunk units. `z` is the vertical chunk index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the coordinate offset by `(dx, dy, dz)`.
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    /// Squared chunk-space distance to `other`.
    pub fn distance_sq(self, other: Self) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dy * dy + dz * dz
    }

    /// Slot of a unit offset in a 27-entry neighborhood array.
    ///
    /// Each offset must be in `-1..=1`; `(0, 0, 0)` maps to slot 13.
    #[inline]
    pub fn neighbor_index(dx: i32, dy: i32, dz: i32) -> usize {
        debug_assert!(
            (-1..=1).contains(&dx) && (-1..=1).contains(&dy) && (-1..=1).contains(&dz),
            "neighbor offset ({dx}, {dy}, {dz}) out of range"
        );
        ((dz + 1) * 9 + (dy + 1) * 3 + (dx + 1)) as usize
    }

    /// Inverse of [`neighbor_index`](Self::neighbor_index).
    pub fn neighbor_offset(slot: usize) -> (i32, i32, i32) {
        debug_assert!(slot < 27);
        let slot = slot as i32;
        (slot % 3 - 1, (slot / 3) % 3 - 1, slot / 9 - 1)
    }

    /// Render-space translation of the chunk origin.
    ///
    /// Chunk `y` runs into the screen, so it is negated; the half-block shift
    /// centers block corners on integer vertex positions.
    pub fn world_translation(self) -> [f32; 3] {
        let n = CHUNK_SIZE as f32;
        [
            self.x as f32 * n + 0.5,
            self.z as f32 * n + 0.5,
            -(self.y as f32) * n - 0.5,
        ]
    }

    /// Chunk containing the integer world block `[X, Y, Z]` (`Y` up).
    pub fn from_world_block(block: [i32; 3]) -> Self {
        let [x, y, z] = block;
        let depth = -z - 1;
        Self {
            x: x >> CHUNK_BITS,
            y: depth >> CHUNK_BITS,
            z: y >> CHUNK_BITS,
        }
    }

    /// Chunk-local `(h, x, y)` of the integer world block `[X, Y, Z]`.
    pub fn local_of_world_block(block: [i32; 3]) -> (usize, usize, usize) {
        let [x, y, z] = block;
        let depth = -z - 1;
        (
            (y & CHUNK_MASK as i32) as usize,
            (x & CHUNK_MASK as i32) as usize,
            (depth & CHUNK_MASK as i32) as usize,
        )
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbor_index_covers_27_slots() {
        let mut seen = [false; 27];
        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let slot = ChunkCoord::neighbor_index(dx, dy, dz);
                    assert!(!seen[slot]);
                    seen[slot] = true;
                    assert_eq!(ChunkCoord::neighbor_offset(slot), (dx, dy, dz));
                }
            }
        }
        assert_eq!(ChunkCoord::neighbor_index(0, 0, 0), 13);
    }

    #[test]
    fn test_distance_sq() {
        let a = ChunkCoord::new(1, 2, 3);
        assert_eq!(a.distance_sq(a), 0);
        assert_eq!(a.distance_sq(ChunkCoord::new(4, 6, 3)), 25);
        assert_eq!(a.offset(-1, 0, 2), ChunkCoord::new(0, 2, 5));
    }

    #[test]
    fn test_world_translation() {
        assert_eq!(ChunkCoord::new(0, 0, 0).world_translation(), [0.5, 0.5, -0.5]);
        assert_eq!(ChunkCoord::new(1, 2, -1).world_translation(), [32.5, -31.5, -64.5]);
    }

    #[test]
    fn test_world_block_mapping() {
        // World Z = -1 is the first depth row of chunk y = 0.
        assert_eq!(ChunkCoord::from_world_block([0, 0, -1]), ChunkCoord::new(0, 0, 0));
        assert_eq!(ChunkCoord::local_of_world_block([0, 0, -1]), (0, 0, 0));

        assert_eq!(ChunkCoord::from_world_block([-1, 40, 0]), ChunkCoord::new(-1, -1, 1));
        assert_eq!(ChunkCoord::local_of_world_block([-1, 40, 0]), (8, 31, 31));

        assert_eq!(ChunkCoord::from_world_block([33, 5, -33]), ChunkCoord::new(1, 1, 0));
        assert_eq!(ChunkCoord::local_of_world_block([33, 5, -33]), (5, 1, 0));
    }
}
