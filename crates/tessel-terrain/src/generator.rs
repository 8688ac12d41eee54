//! Layered terrain columns built from an fBm heightmap.
//!
//! A column of surface height `s` holds, bottom to top:
//!
//! ```text
//!   h >= s          grass_short (rare, land only) or water up to sea level
//!   h == s - 1      dirtgrass (sand when at or below sea level)
//!   s - d <= h < s  dirt
//!   h <  s - d      rock
//! ```
//!
//! The dirt band thins out with altitude and vanishes at `bare_rock_height`,
//! leaving rocky peaks without a grass cap.

use tessel_config::TerrainConfig;
use tessel_voxel::{BlockId, CHUNK_SIZE, ChunkCoord, ChunkGenerator, ChunkGrid};

use crate::heightmap::{HeightmapParams, HeightmapSampler};

const N: i32 = CHUNK_SIZE as i32;

/// Parameters of [`NoiseTerrainGenerator`].
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainParams {
    pub seed: u64,
    /// Mean surface height in blocks.
    pub base_height: f64,
    /// Maximum deviation from `base_height`.
    pub amplitude: f64,
    pub frequency: f64,
    pub octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    /// Water fills empty cells with `h < sea_level`.
    pub sea_level: i32,
    /// Dirt thickness at height 0.
    pub dirt_depth: i32,
    /// Height at which the dirt band has thinned to nothing.
    pub bare_rock_height: i32,
    /// Probability of short grass on a grassy column.
    pub foliage_chance: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self::from_config(23456, &TerrainConfig::default())
    }
}

impl TerrainParams {
    pub fn from_config(seed: u64, config: &TerrainConfig) -> Self {
        Self {
            seed,
            base_height: config.base_height,
            amplitude: config.amplitude,
            frequency: config.frequency,
            octaves: config.octaves,
            persistence: config.persistence,
            lacunarity: config.lacunarity,
            sea_level: config.sea_level,
            dirt_depth: 10,
            bare_rock_height: 58,
            foliage_chance: config.foliage_chance.clamp(0.0, 1.0),
        }
    }
}

/// One generated column, in absolute block heights.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Column {
    /// Number of solid cells above `-inf`; the surface block sits at `surface - 1`.
    pub surface: i32,
    /// Thickness of the dirt band including the surface block.
    pub dirt: i32,
    pub sea_level: i32,
    /// Whether a grass_short sits on top of the surface.
    pub foliage: bool,
}

impl Column {
    /// Block at absolute height `h`.
    pub fn block(&self, h: i32) -> BlockId {
        let top = self.surface - 1;
        if h < self.surface - self.dirt {
            BlockId::ROCK
        } else if h < top {
            BlockId::DIRT
        } else if h == top {
            if self.dirt == 0 {
                BlockId::ROCK
            } else if top < self.sea_level {
                BlockId::SAND
            } else {
                BlockId::DIRT_GRASS
            }
        } else if h < self.sea_level {
            BlockId::WATER
        } else if h == self.surface && self.foliage {
            BlockId::GRASS_SHORT
        } else {
            BlockId::EMPTY
        }
    }

    /// Exclusive upper bound of non-empty cells.
    pub fn top(&self) -> i32 {
        let land = self.surface + i32::from(self.foliage);
        land.max(self.sea_level)
    }
}

/// Deterministic heightmap terrain.
pub struct NoiseTerrainGenerator {
    heightmap: HeightmapSampler,
    params: TerrainParams,
}

impl NoiseTerrainGenerator {
    pub fn new(params: TerrainParams) -> Self {
        let heightmap = HeightmapSampler::new(HeightmapParams {
            seed: params.seed,
            octaves: params.octaves,
            lacunarity: params.lacunarity,
            persistence: params.persistence,
            base_frequency: params.frequency,
        });
        Self { heightmap, params }
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Surface height of the column at world column `(wx, wy)`.
    pub fn surface_height(&self, wx: i32, wy: i32) -> i32 {
        let n = self.heightmap.sample(f64::from(wx), f64::from(wy));
        (self.params.base_height + n * self.params.amplitude).floor() as i32
    }

    pub fn column(&self, wx: i32, wy: i32) -> Column {
        let surface = self.surface_height(wx, wy);
        let dirt = self.dirt_depth(surface);
        let land = dirt > 0 && surface > self.params.sea_level;
        let foliage = land && column_hash(self.params.seed, wx, wy) < self.params.foliage_chance;
        Column {
            surface,
            dirt,
            sea_level: self.params.sea_level,
            foliage,
        }
    }

    fn dirt_depth(&self, surface: i32) -> i32 {
        let p = &self.params;
        if p.bare_rock_height <= 0 {
            return p.dirt_depth.max(0);
        }
        let thinning = p.dirt_depth * surface.max(0) / p.bare_rock_height;
        (p.dirt_depth - thinning).max(0)
    }
}

impl ChunkGenerator for NoiseTerrainGenerator {
    fn generate(&self, coord: ChunkCoord) -> ChunkGrid {
        let base_h = coord.z * N;
        let mut grid = ChunkGrid::new();

        for y in 0..N {
            for x in 0..N {
                let column = self.column(coord.x * N + x, coord.y * N + y);
                let end = (column.top() - base_h).clamp(0, N);
                for h in 0..end {
                    let id = column.block(base_h + h);
                    if !id.is_empty() {
                        grid.set(h as usize, x as usize, y as usize, id);
                    }
                }
            }
        }

        tracing::trace!(%coord, "chunk generated");
        grid
    }
}

/// Uniform value in `[0, 1)` derived from the seed and a column (splitmix64).
fn column_hash(seed: u64, wx: i32, wy: i32) -> f64 {
    let mut z = seed
        ^ (u64::from(wx as u32) << 32 | u64::from(wy as u32)).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 11) as f64 / (1u64 << 53) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> NoiseTerrainGenerator {
        NoiseTerrainGenerator::new(TerrainParams::default())
    }

    /// Lowest chunk layer that sits fully above all terrain and water.
    fn sky_layer(params: &TerrainParams) -> i32 {
        let max = (params.base_height + params.amplitude).ceil() as i32 + 2;
        max.max(params.sea_level) / N + 1
    }

    #[test]
    fn test_generation_is_deterministic() {
        let coord = ChunkCoord::new(3, -2, 0);
        let a = generator().generate(coord);
        let b = generator().generate(coord);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_give_different_terrain() {
        let a = generator();
        let b = NoiseTerrainGenerator::new(TerrainParams {
            seed: 99,
            ..TerrainParams::default()
        });
        let differing = (0..64)
            .filter(|&i| a.surface_height(i * 5, i * 3) != b.surface_height(i * 5, i * 3))
            .count();
        assert!(differing > 16);
    }

    #[test]
    fn test_column_layering() {
        let column = Column {
            surface: 30,
            dirt: 4,
            sea_level: 20,
            foliage: true,
        };
        assert_eq!(column.block(-100), BlockId::ROCK);
        assert_eq!(column.block(25), BlockId::ROCK);
        assert_eq!(column.block(26), BlockId::DIRT);
        assert_eq!(column.block(28), BlockId::DIRT);
        assert_eq!(column.block(29), BlockId::DIRT_GRASS);
        assert_eq!(column.block(30), BlockId::GRASS_SHORT);
        assert_eq!(column.block(31), BlockId::EMPTY);
        assert_eq!(column.top(), 31);
    }

    #[test]
    fn test_underwater_column_fills_with_water() {
        let column = Column {
            surface: 12,
            dirt: 5,
            sea_level: 20,
            foliage: false,
        };
        assert_eq!(column.block(11), BlockId::SAND);
        assert_eq!(column.block(10), BlockId::DIRT);
        for h in 12..20 {
            assert_eq!(column.block(h), BlockId::WATER);
        }
        assert_eq!(column.block(20), BlockId::EMPTY);
        assert_eq!(column.top(), 20);
    }

    #[test]
    fn test_bare_rock_column() {
        let column = Column {
            surface: 70,
            dirt: 0,
            sea_level: 20,
            foliage: false,
        };
        assert_eq!(column.block(69), BlockId::ROCK);
        assert_eq!(column.block(70), BlockId::EMPTY);
    }

    #[test]
    fn test_dirt_band_thins_with_altitude() {
        let g = generator();
        assert_eq!(g.dirt_depth(0), 10);
        assert_eq!(g.dirt_depth(29), 5);
        assert_eq!(g.dirt_depth(58), 0);
        assert_eq!(g.dirt_depth(200), 0);
        assert_eq!(g.dirt_depth(-40), 10);
    }

    #[test]
    fn test_generated_columns_match_column_model() {
        let g = generator();
        let coord = ChunkCoord::new(-1, 2, 0);
        let grid = g.generate(coord);
        for y in 0..N {
            for x in 0..N {
                let column = g.column(coord.x * N + x, coord.y * N + y);
                for h in 0..N {
                    assert_eq!(
                        grid.get(h as usize, x as usize, y as usize),
                        column.block(h),
                        "column ({x}, {y}) at h = {h}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_deep_chunks_are_solid_rock() {
        let params = TerrainParams::default();
        let depth = ((params.base_height - params.amplitude) as i32 - params.dirt_depth) / N - 2;
        let grid = generator().generate(ChunkCoord::new(0, 0, depth));
        assert_eq!(grid, ChunkGrid::filled(BlockId::ROCK));
    }

    #[test]
    fn test_sky_chunks_are_empty() {
        let params = TerrainParams::default();
        let grid = generator().generate(ChunkCoord::new(4, 4, sky_layer(&params)));
        assert!(grid.is_empty());
    }

    #[test]
    fn test_foliage_only_on_grass() {
        let g = NoiseTerrainGenerator::new(TerrainParams {
            foliage_chance: 0.5,
            ..TerrainParams::default()
        });
        let mut seen = 0;
        for wy in -64..64 {
            for wx in -64..64 {
                let column = g.column(wx, wy);
                if column.foliage {
                    seen += 1;
                    assert_eq!(column.block(column.surface - 1), BlockId::DIRT_GRASS);
                    assert_eq!(column.block(column.surface), BlockId::GRASS_SHORT);
                }
            }
        }
        assert!(seen > 0);
    }

    #[test]
    fn test_no_foliage_when_chance_zero() {
        let g = NoiseTerrainGenerator::new(TerrainParams {
            foliage_chance: 0.0,
            ..TerrainParams::default()
        });
        assert!((-32..32).all(|i| !g.column(i, -i).foliage));
    }

    #[test]
    fn test_column_hash_is_uniform_enough() {
        let hits = (0..10_000).filter(|&i| column_hash(7, i % 100, i / 100) < 0.25).count();
        assert!((2_000..3_000).contains(&hits), "{hits}");
    }

    #[test]
    fn test_params_from_config() {
        let config = TerrainConfig {
            sea_level: 5,
            foliage_chance: 3.0,
            ..TerrainConfig::default()
        };
        let params = TerrainParams::from_config(11, &config);
        assert_eq!(params.seed, 11);
        assert_eq!(params.sea_level, 5);
        assert_eq!(params.foliage_chance, 1.0);
    }
}
