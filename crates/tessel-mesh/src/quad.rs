//! Structured quad produced by the mesher, packed only on output.

use crate::ambient_occlusion::should_flip_ao_diagonal;
use crate::face_direction::FaceDirection;
use crate::packed::{PackedVertex, pack_attributes};

/// Vertex-shader hint for geometry drawn below the block top.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Lowering {
    #[default]
    None = 0,
    Foliage = 1,
    LiquidSurface = 2,
}

/// Triangle index tables, indexed by `flip * 2 + reversed`.
const WINDINGS: [[usize; 6]; 4] = [
    [0, 1, 2, 0, 2, 3],
    [3, 2, 0, 2, 1, 0],
    [1, 2, 3, 1, 3, 0],
    [0, 3, 1, 3, 2, 1],
];

/// Whether each corner sits at the far end of the width / height axis.
const WIDTH_MASK: [u32; 4] = [0, 1, 1, 0];
const HEIGHT_MASK: [u32; 4] = [0, 0, 1, 1];

/// One merged, shaded rectangle.
///
/// `(h, x, y)` is the origin cell of the run: the cell at the start of both
/// the width and the height axis of `direction`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Quad {
    pub direction: FaceDirection,
    pub h: u8,
    pub x: u8,
    pub y: u8,
    pub width: u8,
    pub height: u8,
    pub texture: u8,
    /// AO per corner, in vertex order.
    pub ao: [u8; 4],
    pub lowering: Lowering,
    /// Emit the back side (double-sided foliage).
    pub reversed: bool,
}

impl Quad {
    /// One side of a crossed foliage quad.
    pub fn foliage(direction: FaceDirection, h: u8, x: u8, y: u8, texture: u8, reversed: bool) -> Self {
        debug_assert!(direction.is_diagonal());
        Self {
            direction,
            h,
            x,
            y,
            width: 1,
            height: 1,
            texture,
            ao: [0; 4],
            lowering: Lowering::Foliage,
            reversed,
        }
    }

    /// Surface covered, in block faces.
    pub fn area(&self) -> u32 {
        self.width as u32 * self.height as u32
    }

    /// Split along the 1–3 diagonal when the 0–2 corners are darker.
    pub fn flip(&self) -> bool {
        should_flip_ao_diagonal(self.ao)
    }

    /// The four corners in `(x, y, h)`, in vertex order.
    pub fn corner_positions(&self) -> [[u32; 3]; 4] {
        let origin = self.direction.vertex_origin();
        let w_axis = self.direction.width_axis();
        let h_axis = self.direction.height_axis();
        let base = [
            self.x as i32 + origin[0],
            self.y as i32 + origin[1],
            self.h as i32 + origin[2],
        ];
        std::array::from_fn(|k| {
            let w = (WIDTH_MASK[k] * self.width as u32) as i32;
            let hgt = (HEIGHT_MASK[k] * self.height as u32) as i32;
            std::array::from_fn(|axis| {
                let value = base[axis] + w * w_axis[axis] + hgt * h_axis[axis];
                debug_assert!(value >= 0, "quad corner below chunk origin: {self:?}");
                value.max(0) as u32
            })
        })
    }

    /// The six packed vertices of the two triangles.
    pub fn vertices(&self) -> [PackedVertex; 6] {
        let corners = self.corner_positions();
        let winding = WINDINGS[self.flip() as usize * 2 + self.reversed as usize];
        winding.map(|k| {
            let attributes = pack_attributes(
                self.direction,
                self.texture,
                WIDTH_MASK[k] * self.width as u32,
                HEIGHT_MASK[k] * self.height as u32,
                self.ao[k],
                self.lowering as u8,
            );
            PackedVertex::new(corners[k], attributes)
        })
    }
}
