//! A [`ChunkSource`] that generates chunks on demand and caches them.

use std::sync::Arc;

use dashmap::DashMap;
use tessel_voxel::{ChunkCoord, ChunkGenerator, ChunkGrid, ChunkSource};

/// Generates chunks with `G` and keeps them for later neighbor lookups.
///
/// Meshing a chunk reads up to 26 neighbors, and every neighbor is itself
/// the center of another mesh job. The shared cache makes each chunk get
/// generated once no matter how many workers ask for it.
pub struct GeneratingSource<G> {
    generator: G,
    cache: DashMap<ChunkCoord, Arc<ChunkGrid>>,
}

impl<G: ChunkGenerator> GeneratingSource<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            cache: DashMap::new(),
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Number of chunks currently cached.
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    pub fn is_cached(&self, coord: ChunkCoord) -> bool {
        self.cache.contains_key(&coord)
    }

    /// Drops cached chunks farther than `sqrt(radius_sq)` from `center`.
    /// Returns how many were dropped.
    pub fn evict_outside(&self, center: ChunkCoord, radius_sq: i64) -> usize {
        let before = self.cache.len();
        self.cache.retain(|coord, _| coord.distance_sq(center) <= radius_sq);
        before.saturating_sub(self.cache.len())
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}

impl<G: ChunkGenerator> ChunkSource for GeneratingSource<G> {
    fn load_chunk(&self, coord: ChunkCoord) -> Arc<ChunkGrid> {
        if let Some(cached) = self.cache.get(&coord) {
            return Arc::clone(cached.value());
        }

        // Generate without holding a shard lock; if another worker raced us,
        // keep whichever copy landed first.
        let generated = Arc::new(self.generator.generate(coord));
        let entry = self.cache.entry(coord).or_insert(generated);
        Arc::clone(entry.value())
    }
}
