//! Block lookups that may cross into the 26 chunks surrounding a chunk.
//!
//! The mesher reads one cell beyond every face, edge and corner of the chunk
//! it is meshing. Two accessors serve those reads:
//!
//! - [`NeighborCache`] resolves neighbors lazily from a [`ChunkSource`], one
//!   fetch per neighbor slot per mesh call, with a direct path for the
//!   common fully-inside lookup.
//! - [`ExtendedGrid`] is a materialized `(N+2)³` padded copy, built once and
//!   then read without any offset math.
//!
//! Both implement [`BlockSampler`], which is all the mesher depends on.

use std::cell::OnceCell;
use std::sync::Arc;

use crate::chunk::{CHUNK_BITS, CHUNK_MASK, CHUNK_SIZE, ChunkGrid};
use crate::coords::ChunkCoord;
use crate::registry::BlockId;

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Read access to blocks around one chunk.
///
/// Coordinates are chunk-local `(h, x, y)` and may step up to one chunk
/// outside `0..N` on any axis.
pub trait BlockSampler {
    fn sample(&self, h: i32, x: i32, y: i32) -> BlockId;
}

/// Synchronous chunk provider used to resolve neighbors at mesh time.
///
/// Implementations must always return a chunk; missing data is generated on
/// demand.
pub trait ChunkSource: Send + Sync {
    fn load_chunk(&self, coord: ChunkCoord) -> Arc<ChunkGrid>;
}

/// Fills a chunk from its coordinate. Must be deterministic for a given
/// coordinate and generator configuration.
pub trait ChunkGenerator: Send + Sync {
    fn generate(&self, coord: ChunkCoord) -> ChunkGrid;
}

impl<S: ChunkSource + ?Sized> ChunkSource for Arc<S> {
    fn load_chunk(&self, coord: ChunkCoord) -> Arc<ChunkGrid> {
        (**self).load_chunk(coord)
    }
}

impl<G: ChunkGenerator + ?Sized> ChunkGenerator for Arc<G> {
    fn generate(&self, coord: ChunkCoord) -> ChunkGrid {
        (**self).generate(coord)
    }
}

/// A lone chunk with nothing around it: the shell reads as [`BlockId::CHUNK_EDGE`].
impl BlockSampler for ChunkGrid {
    #[inline]
    fn sample(&self, h: i32, x: i32, y: i32) -> BlockId {
        self.get_checked(h, x, y)
    }
}

#[inline]
fn is_inside(h: i32, x: i32, y: i32) -> bool {
    (h | x | y) & !(CHUNK_MASK as i32) == 0
}

/// Neighbor slot and masked local coordinate of a possibly out-of-chunk cell.
#[inline]
fn split(h: i32, x: i32, y: i32) -> (usize, usize, usize, usize) {
    let bits = CHUNK_BITS as i32;
    let mask = CHUNK_MASK as i32;
    let slot = ChunkCoord::neighbor_index(x >> bits, y >> bits, h >> bits);
    (slot, (h & mask) as usize, (x & mask) as usize, (y & mask) as usize)
}

// ---------------------------------------------------------------------------
// NeighborCache
// ---------------------------------------------------------------------------

/// 27-slot neighborhood cache scoped to a single mesh call.
///
/// Slots are filled on first touch, so a chunk whose faces never look past
/// the `+h` boundary never loads the chunk above it.
pub struct NeighborCache<'a, S: ChunkSource + ?Sized> {
    source: &'a S,
    center: ChunkCoord,
    slots: [OnceCell<Arc<ChunkGrid>>; 27],
}

impl<'a, S: ChunkSource + ?Sized> NeighborCache<'a, S> {
    /// Creates a cache around `center` with every slot unresolved.
    pub fn new(source: &'a S, center: ChunkCoord) -> Self {
        Self {
            source,
            center,
            slots: std::array::from_fn(|_| OnceCell::new()),
        }
    }

    /// Creates a cache whose center slot is already known.
    pub fn with_center(source: &'a S, center: ChunkCoord, chunk: Arc<ChunkGrid>) -> Self {
        let cache = Self::new(source, center);
        let _ = cache.slots[13].set(chunk);
        cache
    }

    pub fn center(&self) -> ChunkCoord {
        self.center
    }

    /// The chunk in `slot`, loading it if this is the first access.
    pub fn chunk(&self, slot: usize) -> &ChunkGrid {
        self.slots[slot].get_or_init(|| {
            let (dx, dy, dz) = ChunkCoord::neighbor_offset(slot);
            self.source.load_chunk(self.center.offset(dx, dy, dz))
        })
    }

    /// Number of slots fetched so far.
    pub fn loaded_slots(&self) -> usize {
        self.slots.iter().filter(|slot| slot.get().is_some()).count()
    }
}

impl<S: ChunkSource + ?Sized> BlockSampler for NeighborCache<'_, S> {
    #[inline]
    fn sample(&self, h: i32, x: i32, y: i32) -> BlockId {
        if is_inside(h, x, y) {
            return self.chunk(13).get(h as usize, x as usize, y as usize);
        }
        let (slot, lh, lx, ly) = split(h, x, y);
        self.chunk(slot).get(lh, lx, ly)
    }
}

// ---------------------------------------------------------------------------
// ExtendedGrid
// ---------------------------------------------------------------------------

/// Side of the padded grid.
pub const EXTENDED_SIZE: usize = CHUNK_SIZE + 2;

/// A chunk plus a one-cell shell copied from its neighbors.
///
/// Extended cell `(h, x, y)` is local cell `(h-1, x-1, y-1)` of the center
/// chunk, or the matching border cell of a neighbor for the shell.
#[derive(Clone)]
pub struct ExtendedGrid {
    cells: Vec<BlockId>,
}

/// Borrowed 27-chunk neighborhood with gaps.
struct NeighborArray<'a>(&'a [Option<Arc<ChunkGrid>>; 27]);

impl BlockSampler for NeighborArray<'_> {
    fn sample(&self, h: i32, x: i32, y: i32) -> BlockId {
        let (slot, lh, lx, ly) = split(h, x, y);
        self.0[slot]
            .as_ref()
            .map_or(BlockId::CHUNK_EDGE, |chunk| chunk.get(lh, lx, ly))
    }
}

impl ExtendedGrid {
    /// Copies the chunk and its shell out of any sampler.
    pub fn from_sampler<S: BlockSampler + ?Sized>(sampler: &S) -> Self {
        let mut cells = Vec::with_capacity(EXTENDED_SIZE * EXTENDED_SIZE * EXTENDED_SIZE);
        for h in 0..EXTENDED_SIZE as i32 {
            for y in 0..EXTENDED_SIZE as i32 {
                for x in 0..EXTENDED_SIZE as i32 {
                    cells.push(sampler.sample(h - 1, x - 1, y - 1));
                }
            }
        }
        Self { cells }
    }

    /// Builds the grid from a neighborhood array indexed by
    /// [`ChunkCoord::neighbor_index`]. Missing chunks contribute
    /// [`BlockId::CHUNK_EDGE`] shell cells.
    pub fn from_neighbors(neighbors: &[Option<Arc<ChunkGrid>>; 27]) -> Self {
        Self::from_sampler(&NeighborArray(neighbors))
    }

    #[inline]
    fn index(h: usize, x: usize, y: usize) -> usize {
        debug_assert!(h < EXTENDED_SIZE && x < EXTENDED_SIZE && y < EXTENDED_SIZE);
        (h * EXTENDED_SIZE + y) * EXTENDED_SIZE + x
    }

    /// Reads extended cell `(h, x, y)`, each in `0..N+2`.
    #[inline]
    pub fn get(&self, h: usize, x: usize, y: usize) -> BlockId {
        self.cells[Self::index(h, x, y)]
    }
}

impl BlockSampler for ExtendedGrid {
    #[inline]
    fn sample(&self, h: i32, x: i32, y: i32) -> BlockId {
        self.get((h + 1) as usize, (x + 1) as usize, (y + 1) as usize)
    }
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// Relative accessor: reads blocks at an offset from a movable position.
pub struct Cursor<'a, S: BlockSampler + ?Sized> {
    sampler: &'a S,
    h: i32,
    x: i32,
    y: i32,
}

impl<'a, S: BlockSampler + ?Sized> Cursor<'a, S> {
    pub fn new(sampler: &'a S) -> Self {
        Self {
            sampler,
            h: 0,
            x: 0,
            y: 0,
        }
    }

    #[inline]
    pub fn set_position(&mut self, h: i32, x: i32, y: i32) {
        self.h = h;
        self.x = x;
        self.y = y;
    }

    pub fn position(&self) -> (i32, i32, i32) {
        (self.h, self.x, self.y)
    }

    /// Block at `position + (dh, dx, dy)`.
    #[inline]
    pub fn get(&self, dh: i32, dx: i32, dy: i32) -> BlockId {
        self.sampler.sample(self.h + dh, self.x + dx, self.y + dy)
    }
}
