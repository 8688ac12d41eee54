//! Chunk meshing: greedy merging of block faces into shaded, bit-packed quads,
//! and a worker pool that meshes chunks off the caller's thread.

pub mod ambient_occlusion;
pub mod async_mesh;
pub mod chunk_mesh;
pub mod face_direction;
pub mod merge_layer;
pub mod mesher;
pub mod packed;
pub mod quad;

pub use ambient_occlusion::{face_ao, should_flip_ao_diagonal, vertex_ao};
pub use async_mesh::{MeshingPipeline, MeshingResult, MeshingTask};
pub use chunk_mesh::ChunkMesh;
pub use face_direction::FaceDirection;
pub use merge_layer::{PendingFace, SideLayers, merge_row, merge_vertical};
pub use mesher::{ChunkMesher, MeshScratch};
pub use packed::{MeshData, PackedVertex, pack_attributes};
pub use quad::{Lowering, Quad};
