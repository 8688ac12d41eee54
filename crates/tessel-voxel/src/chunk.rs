//! Dense 32×32×32 block storage for a single chunk.
//!
//! Cells are addressed as `(h, x, y)` where `h` is the vertical axis. The
//! flattened index is `h << 10 | y << 5 | x`, so rows along `x` are
//! contiguous and a full horizontal layer is one 1024-cell slice.

use thiserror::Error;

use crate::registry::BlockId;

/// log2 of the chunk side length.
pub const CHUNK_BITS: usize = 5;

/// Side length of a chunk in blocks.
pub const CHUNK_SIZE: usize = 1 << CHUNK_BITS;

/// Mask extracting a local coordinate from a world coordinate.
pub const CHUNK_MASK: usize = CHUNK_SIZE - 1;

/// Cells in one horizontal layer (32²).
pub const CHUNK_AREA: usize = CHUNK_SIZE * CHUNK_SIZE;

/// Total number of cells in a chunk (32³).
pub const CHUNK_VOLUME: usize = CHUNK_AREA * CHUNK_SIZE;

/// Errors raised when rebuilding a chunk from external data.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// The raw block buffer does not hold exactly [`CHUNK_VOLUME`] cells.
    #[error("raw chunk buffer has {actual} cells, expected {expected}")]
    WrongLength { expected: usize, actual: usize },
}

/// Inclusive index range of the occupied cells of a chunk.
///
/// Arrays are ordered `[h, x, y]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockBounds {
    pub min: [usize; 3],
    pub max: [usize; 3],
}

impl BlockBounds {
    /// Number of cells along each axis.
    pub fn extent(&self) -> [usize; 3] {
        [
            self.max[0] - self.min[0] + 1,
            self.max[1] - self.min[1] + 1,
            self.max[2] - self.min[2] + 1,
        ]
    }
}

/// One chunk's worth of block ids.
#[derive(Clone, PartialEq, Eq)]
pub struct ChunkGrid {
    cells: Vec<BlockId>,
}

impl std::fmt::Debug for ChunkGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkGrid")
            .field("bounds", &self.find_non_empty_bounds())
            .finish()
    }
}

impl ChunkGrid {
    /// Creates an empty chunk.
    pub fn new() -> Self {
        Self::filled(BlockId::EMPTY)
    }

    /// Creates a chunk with every cell set to `id`.
    pub fn filled(id: BlockId) -> Self {
        Self {
            cells: vec![id; CHUNK_VOLUME],
        }
    }

    /// Rebuilds a chunk from a flat buffer in storage order.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::WrongLength`] if `cells` is not exactly
    /// [`CHUNK_VOLUME`] long.
    pub fn from_raw(cells: Vec<BlockId>) -> Result<Self, ChunkError> {
        if cells.len() != CHUNK_VOLUME {
            return Err(ChunkError::WrongLength {
                expected: CHUNK_VOLUME,
                actual: cells.len(),
            });
        }
        Ok(Self { cells })
    }

    #[inline]
    pub fn index(h: usize, x: usize, y: usize) -> usize {
        debug_assert!(
            h < CHUNK_SIZE && x < CHUNK_SIZE && y < CHUNK_SIZE,
            "cell ({h}, {x}, {y}) out of range"
        );
        (h << (2 * CHUNK_BITS)) | (y << CHUNK_BITS) | x
    }

    /// Returns the block at `(h, x, y)`. Each coordinate must be in `0..32`.
    #[inline]
    pub fn get(&self, h: usize, x: usize, y: usize) -> BlockId {
        self.cells[Self::index(h, x, y)]
    }

    /// Sets the block at `(h, x, y)`. Each coordinate must be in `0..32`.
    #[inline]
    pub fn set(&mut self, h: usize, x: usize, y: usize, id: BlockId) {
        self.cells[Self::index(h, x, y)] = id;
    }

    /// Bounds-checked read returning [`BlockId::CHUNK_EDGE`] outside the chunk.
    pub fn get_checked(&self, h: i32, x: i32, y: i32) -> BlockId {
        let range = 0..CHUNK_SIZE as i32;
        if range.contains(&h) && range.contains(&x) && range.contains(&y) {
            self.get(h as usize, x as usize, y as usize)
        } else {
            BlockId::CHUNK_EDGE
        }
    }

    /// Tight inclusive bounds of all non-empty cells, or `None` if the chunk
    /// is empty.
    pub fn find_non_empty_bounds(&self) -> Option<BlockBounds> {
        let mut min = [usize::MAX; 3];
        let mut max = [0usize; 3];
        let mut any = false;

        for (i, id) in self.cells.iter().enumerate() {
            if id.is_empty() {
                continue;
            }
            any = true;
            let cell = [
                i >> (2 * CHUNK_BITS),
                i & CHUNK_MASK,
                (i >> CHUNK_BITS) & CHUNK_MASK,
            ];
            for axis in 0..3 {
                min[axis] = min[axis].min(cell[axis]);
                max[axis] = max[axis].max(cell[axis]);
            }
        }

        any.then_some(BlockBounds { min, max })
    }

    /// Topmost non-empty `h` in column `(x, y)`.
    pub fn peak(&self, x: usize, y: usize) -> Option<usize> {
        (0..CHUNK_SIZE).rev().find(|&h| !self.get(h, x, y).is_empty())
    }

    /// Exclusive upper bound of occupied layers; 0 for an empty chunk.
    pub fn max_height(&self) -> usize {
        self.cells
            .chunks_exact(CHUNK_AREA)
            .rposition(|layer| layer.iter().any(|id| !id.is_empty()))
            .map_or(0, |h| h + 1)
    }

    /// Returns `true` if every cell is empty.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|id| id.is_empty())
    }

    /// Overwrites every cell with `id`.
    pub fn fill(&mut self, id: BlockId) {
        self.cells.fill(id);
    }

    /// Cells in storage order.
    pub fn as_slice(&self) -> &[BlockId] {
        &self.cells
    }

    /// Consumes the chunk and returns its cells in storage order.
    pub fn into_raw(self) -> Vec<BlockId> {
        self.cells
    }
}

impl Default for ChunkGrid {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_is_collision_free_and_monotonic() {
        let mut previous = None;
        for h in 0..CHUNK_SIZE {
            for y in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    let index = ChunkGrid::index(h, x, y);
                    assert!(index < CHUNK_VOLUME);
                    if let Some(prev) = previous {
                        assert_eq!(index, prev + 1);
                    }
                    previous = Some(index);
                }
            }
        }
    }

    #[test]
    fn test_set_and_get_roundtrip() {
        let mut grid = ChunkGrid::new();
        grid.set(3, 7, 11, BlockId::ROCK);
        assert_eq!(grid.get(3, 7, 11), BlockId::ROCK);
        assert_eq!(grid.get(3, 11, 7), BlockId::EMPTY);
        assert_eq!(grid.as_slice()[(3 << 10) | (11 << 5) | 7], BlockId::ROCK);
    }

    #[test]
    fn test_get_checked_returns_edge_outside() {
        let grid = ChunkGrid::filled(BlockId::DIRT);
        assert_eq!(grid.get_checked(0, 0, 0), BlockId::DIRT);
        assert_eq!(grid.get_checked(31, 31, 31), BlockId::DIRT);
        assert_eq!(grid.get_checked(-1, 0, 0), BlockId::CHUNK_EDGE);
        assert_eq!(grid.get_checked(0, 32, 0), BlockId::CHUNK_EDGE);
        assert_eq!(grid.get_checked(0, 0, 40), BlockId::CHUNK_EDGE);
    }

    #[test]
    fn test_bounds_of_empty_chunk() {
        assert_eq!(ChunkGrid::new().find_non_empty_bounds(), None);
        assert!(ChunkGrid::new().is_empty());
    }

    #[test]
    fn test_bounds_are_tight() {
        let mut grid = ChunkGrid::new();
        grid.set(2, 5, 9, BlockId::SAND);
        grid.set(10, 1, 20, BlockId::SAND);
        let bounds = grid.find_non_empty_bounds().expect("non-empty");
        assert_eq!(bounds.min, [2, 1, 9]);
        assert_eq!(bounds.max, [10, 5, 20]);
        assert_eq!(bounds.extent(), [9, 5, 12]);
    }

    #[test]
    fn test_peak_and_max_height() {
        let mut grid = ChunkGrid::new();
        assert_eq!(grid.peak(4, 4), None);
        assert_eq!(grid.max_height(), 0);
        for h in 0..=12 {
            grid.set(h, 4, 4, BlockId::DIRT);
        }
        grid.set(3, 0, 0, BlockId::ROCK);
        assert_eq!(grid.peak(4, 4), Some(12));
        assert_eq!(grid.peak(0, 0), Some(3));
        assert_eq!(grid.max_height(), 13);
    }

    #[test]
    fn test_fill_and_from_raw() {
        let mut grid = ChunkGrid::new();
        grid.fill(BlockId::GRAVEL);
        let raw = grid.clone().into_raw();
        let rebuilt = ChunkGrid::from_raw(raw).expect("correct length");
        assert_eq!(rebuilt, grid);
    }

    #[test]
    fn test_from_raw_rejects_wrong_length() {
        let result = ChunkGrid::from_raw(vec![BlockId::EMPTY; 100]);
        assert!(matches!(
            result,
            Err(ChunkError::WrongLength {
                expected: CHUNK_VOLUME,
                actual: 100
            })
        ));
    }
}
