//! Per-corner voxel ambient occlusion.
//!
//! Each corner of a face looks at three cells in the layer just beyond the
//! face: the two edge neighbors and the diagonal one. The four corners are
//! visited by rotating the starting offsets a quarter turn at a time.

use tessel_voxel::{BlockRegistry, BlockSampler, Cursor};

use crate::face_direction::FaceDirection;

/// Occlusion of one corner from the solidity (0 or 1) of its neighbors.
///
/// Returns a value in `0..=3`, where `3` is fully occluded. Two solid edge
/// neighbors always give `3`, whatever the diagonal holds.
#[inline]
pub fn vertex_ao(side0: u8, side1: u8, corner: u8) -> u8 {
    debug_assert!(side0 <= 1 && side1 <= 1 && corner <= 1);
    if side0 + side1 == 2 {
        3
    } else {
        side0 + side1 + corner
    }
}

/// Whether the quad should be split along its `1–3` diagonal instead of `0–2`.
///
/// Ties keep the `0–2` split.
#[inline]
pub fn should_flip_ao_diagonal(ao: [u8; 4]) -> bool {
    ao[0] + ao[2] > ao[1] + ao[3]
}

#[inline]
fn rotate((a, b): (i32, i32)) -> (i32, i32) {
    (-b, a)
}

/// Computes the four corner AO values of the face of the cell under `cursor`
/// that points toward `direction`.
///
/// Corners come out in quad vertex order: `(0,0)`, `(w,0)`, `(w,h)`, `(0,h)`
/// in the face's width/height space.
pub fn face_ao<S: BlockSampler + ?Sized>(
    cursor: &Cursor<'_, S>,
    direction: FaceDirection,
    registry: &BlockRegistry,
) -> [u8; 4] {
    let (normal, u, v) = direction.ao_frame();
    let solid = |(a, b): (i32, i32)| {
        registry.is_solid_int(cursor.get(
            normal.0 + a * u.0 + b * v.0,
            normal.1 + a * u.1 + b * v.1,
            normal.2 + a * u.2 + b * v.2,
        ))
    };

    let mut side0 = (-1, 0);
    let mut side1 = (0, -1);
    let mut corner = (-1, -1);
    let mut ao = [0u8; 4];
    for value in &mut ao {
        *value = vertex_ao(solid(side0), solid(side1), solid(corner));
        side0 = rotate(side0);
        side1 = rotate(side1);
        corner = rotate(corner);
    }
    ao
}
