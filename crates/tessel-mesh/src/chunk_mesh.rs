//! Struct-form mesher output: merged quads, solids first.

use crate::face_direction::FaceDirection;
use crate::packed::MeshData;
use crate::quad::Quad;

/// Quads of one chunk. Quads `[..solid_count]` are opaque or cutout, the
/// rest are liquid surfaces.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    pub quads: Vec<Quad>,
    pub solid_count: usize,
}

impl ChunkMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenates the two quad lists.
    pub fn from_parts(solid: &[Quad], water: &[Quad]) -> Self {
        let mut quads = Vec::with_capacity(solid.len() + water.len());
        quads.extend_from_slice(solid);
        quads.extend_from_slice(water);
        Self {
            quads,
            solid_count: solid.len(),
        }
    }

    pub fn solid_quads(&self) -> &[Quad] {
        &self.quads[..self.solid_count]
    }

    pub fn water_quads(&self) -> &[Quad] {
        &self.quads[self.solid_count..]
    }

    pub fn quad_count(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    pub fn count_quads_for_direction(&self, direction: FaceDirection) -> usize {
        self.quads.iter().filter(|q| q.direction == direction).count()
    }

    /// Total face area (sum of width × height) in one direction.
    pub fn area_for_direction(&self, direction: FaceDirection) -> u32 {
        self.quads
            .iter()
            .filter(|q| q.direction == direction)
            .map(Quad::area)
            .sum()
    }

    /// Packs every quad into six vertices.
    pub fn to_mesh_data(&self, translation: [f32; 3]) -> MeshData {
        let mut vertices = Vec::with_capacity(self.quads.len() * 6);
        for quad in &self.quads {
            vertices.extend_from_slice(&quad.vertices());
        }
        MeshData {
            translation,
            vertices,
            solid_vertex_count: self.solid_count * 6,
        }
    }
}
