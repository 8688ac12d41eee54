//! Block data for the tessel voxel engine: the block registry, dense chunk
//! storage, chunk coordinates, and neighbor-aware block lookups.

pub mod chunk;
pub mod coords;
pub mod neighborhood;
pub mod registry;

pub use chunk::{
    BlockBounds, CHUNK_AREA, CHUNK_BITS, CHUNK_MASK, CHUNK_SIZE, CHUNK_VOLUME, ChunkError,
    ChunkGrid,
};
pub use coords::ChunkCoord;
pub use neighborhood::{
    BlockSampler, ChunkGenerator, ChunkSource, Cursor, EXTENDED_SIZE, ExtendedGrid, NeighborCache,
};
pub use registry::{BlockDef, BlockId, BlockRegistry, BlockShape, RegistryError, default_blocks};
