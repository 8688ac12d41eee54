//! GPU vertex encoding: two `u32` words per vertex, six vertices per quad.
//!
//! Word 1, position:
//!
//! ```text
//! bits  0..7   x (0..=32)
//! bits  7..14  y (0..=32)
//! bits 14..21  h (0..=32)
//! ```
//!
//! Word 2, attributes:
//!
//! ```text
//! bits  0..7   width offset of this vertex (0 or quad width)
//! bits  7..14  height offset of this vertex (0 or quad height)
//! bits 16..19  face direction
//! bits 19..27  texture id
//! bits 27..29  AO of this vertex's corner
//! bits 29..31  lowering (0 none, 1 foliage, 2 liquid surface)
//! ```
//!
//! The shader interpolates the width/height offsets to tile the texture
//! across merged quads.

use crate::face_direction::FaceDirection;

const FIELD_MASK: u32 = 0x7F;

/// One packed vertex.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PackedVertex {
    pub position: u32,
    pub attributes: u32,
}

static_assertions::assert_eq_size!(PackedVertex, [u32; 2]);

impl PackedVertex {
    /// Packs a vertex from its chunk-local `(x, y, h)` corner and attributes
    /// word.
    pub fn new(corner: [u32; 3], attributes: u32) -> Self {
        debug_assert!(corner.iter().all(|&c| c <= FIELD_MASK), "corner {corner:?} out of range");
        Self {
            position: corner[2] << 14 | corner[1] << 7 | corner[0],
            attributes,
        }
    }

    #[inline]
    pub fn x(&self) -> u32 {
        self.position & FIELD_MASK
    }

    #[inline]
    pub fn y(&self) -> u32 {
        (self.position >> 7) & FIELD_MASK
    }

    #[inline]
    pub fn h(&self) -> u32 {
        (self.position >> 14) & FIELD_MASK
    }

    pub fn width_offset(&self) -> u32 {
        self.attributes & FIELD_MASK
    }

    pub fn height_offset(&self) -> u32 {
        (self.attributes >> 7) & FIELD_MASK
    }

    /// Decodes the direction field. `None` only for corrupt data.
    pub fn direction(&self) -> Option<FaceDirection> {
        FaceDirection::from_index(((self.attributes >> 16) & 0x7) as u8)
    }

    pub fn texture(&self) -> u8 {
        (self.attributes >> 19) as u8
    }

    pub fn ao(&self) -> u8 {
        ((self.attributes >> 27) & 0x3) as u8
    }

    pub fn lowering(&self) -> u8 {
        ((self.attributes >> 29) & 0x3) as u8
    }
}

/// Builds the attributes word for one vertex.
pub fn pack_attributes(
    direction: FaceDirection,
    texture: u8,
    width_offset: u32,
    height_offset: u32,
    ao: u8,
    lowering: u8,
) -> u32 {
    debug_assert!(width_offset <= FIELD_MASK && height_offset <= FIELD_MASK);
    debug_assert!(ao <= 3 && lowering <= 3);
    (lowering as u32) << 29
        | (ao as u32) << 27
        | (texture as u32) << 19
        | (direction as u32) << 16
        | height_offset << 7
        | width_offset
}

/// A chunk's finished vertex buffer plus its world placement.
///
/// Solid vertices come first, translucent (liquid) vertices after
/// `solid_vertex_count`, so the renderer can draw them in separate passes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub translation: [f32; 3],
    pub vertices: Vec<PackedVertex>,
    pub solid_vertex_count: usize,
}

impl MeshData {
    pub fn empty(translation: [f32; 3]) -> Self {
        Self {
            translation,
            vertices: Vec::new(),
            solid_vertex_count: 0,
        }
    }

    /// Vertex data as raw words (two per vertex), without copying.
    pub fn vertex_words(&self) -> &[u32] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Vertex data as bytes for upload, without copying.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 6
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn solid_vertices(&self) -> &[PackedVertex] {
        &self.vertices[..self.solid_vertex_count]
    }

    pub fn water_vertices(&self) -> &[PackedVertex] {
        &self.vertices[self.solid_vertex_count..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_is_8_bytes() {
        assert_eq!(std::mem::size_of::<PackedVertex>(), 8);
    }

    #[test]
    fn test_position_fields() {
        let v = PackedVertex::new([32, 5, 17], 0);
        assert_eq!((v.x(), v.y(), v.h()), (32, 5, 17));
        assert_eq!(v.position, 17 << 14 | 5 << 7 | 32);
    }

    #[test]
    fn test_attribute_fields() {
        let attrs = pack_attributes(FaceDirection::Back, 201, 12, 31, 2, 1);
        let v = PackedVertex::new([0, 0, 0], attrs);
        assert_eq!(v.direction(), Some(FaceDirection::Back));
        assert_eq!(v.texture(), 201);
        assert_eq!(v.width_offset(), 12);
        assert_eq!(v.height_offset(), 31);
        assert_eq!(v.ao(), 2);
        assert_eq!(v.lowering(), 1);
    }

    #[test]
    fn test_mesh_data_zero_copy_views() {
        let mesh = MeshData {
            translation: [0.5, 0.5, -0.5],
            vertices: vec![PackedVertex::new([1, 2, 3], 7); 12],
            solid_vertex_count: 6,
        };
        assert_eq!(mesh.quad_count(), 2);
        assert_eq!(mesh.vertex_words().len(), 24);
        assert_eq!(mesh.vertex_words()[1], 7);
        assert_eq!(mesh.vertex_bytes().len(), 96);
        assert_eq!(mesh.vertex_bytes().as_ptr(), mesh.vertices.as_ptr() as *const u8);
        assert_eq!(mesh.solid_vertices().len(), 6);
        assert_eq!(mesh.water_vertices().len(), 6);
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = MeshData::empty([1.0, 2.0, 3.0]);
        assert!(mesh.is_empty());
        assert_eq!(mesh.quad_count(), 0);
        assert!(mesh.water_vertices().is_empty());
    }
}
