//! Chunk streaming around a moving viewer.
//!
//! [`World`] keeps every chunk inside a spherical render distance requested,
//! meshes them on a [`MeshingPipeline`](tessel_mesh::MeshingPipeline), and
//! evicts them again once the viewer has moved far enough away.

pub mod load_queue;
pub mod ring;
pub mod source;
pub mod world;

pub use load_queue::ChunkLoadQueue;
pub use ring::RenderRing;
pub use source::GeneratingSource;
pub use world::{
    ChunkState, LoadedChunk, RayHit, UpdateReport, World, WorldSettings, WorldStats,
    default_worker_count,
};
