//! Procedural terrain for tessel: fBm simplex heightmaps turned into layered
//! block columns.

pub mod generator;
pub mod heightmap;

pub use generator::{Column, NoiseTerrainGenerator, TerrainParams};
pub use heightmap::{HeightmapParams, HeightmapSampler};
