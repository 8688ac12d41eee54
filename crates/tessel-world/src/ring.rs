//! Precomputed chunk offsets inside the render distance.

use tessel_voxel::ChunkCoord;

/// Every chunk offset within a sphere of radius `radius`, nearest first.
///
/// Built once and reused each time the viewer changes chunk.
#[derive(Clone, Debug)]
pub struct RenderRing {
    radius: u32,
    offsets: Vec<(i32, i32, i32)>,
}

impl RenderRing {
    pub fn new(radius: u32) -> Self {
        let r = radius as i32;
        let r_sq = i64::from(r) * i64::from(r);
        let mut offsets = Vec::new();
        for dz in -r..=r {
            for dy in -r..=r {
                for dx in -r..=r {
                    if dist_sq((dx, dy, dz)) <= r_sq {
                        offsets.push((dx, dy, dz));
                    }
                }
            }
        }
        offsets.sort_by_key(|&(dx, dy, dz)| (dist_sq((dx, dy, dz)), dz, dy, dx));
        Self { radius, offsets }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn radius_sq(&self) -> i64 {
        i64::from(self.radius) * i64::from(self.radius)
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn offsets(&self) -> &[(i32, i32, i32)] {
        &self.offsets
    }

    /// Ring coordinates around `center`, nearest first.
    pub fn coords_around(&self, center: ChunkCoord) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.offsets
            .iter()
            .map(move |&(dx, dy, dz)| center.offset(dx, dy, dz))
    }
}

fn dist_sq((dx, dy, dz): (i32, i32, i32)) -> i64 {
    let (dx, dy, dz) = (i64::from(dx), i64::from(dy), i64::from(dz));
    dx * dx + dy * dy + dz * dz
}
