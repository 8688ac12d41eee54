//! Greedy chunk mesher.
//!
//! One pass over the chunk in `h`, `y`, `x` order finds every visible face,
//! computes its corner occlusion, and drops it into a merge layer:
//!
//! - up and down faces merge inside one height layer, row by row, using a
//!   ping-pong pair of rows;
//! - side faces merge across height layers, using a ping-pong pair of
//!   four-plane [`SideLayers`];
//! - liquid top faces merge like up faces but in their own rows and end up
//!   in the translucent buffer;
//! - cross-shaped foliage is collected and emitted after the scan.
//!
//! All scratch memory lives in [`MeshScratch`] and is reused between calls.

use std::sync::Arc;

use tessel_voxel::{BlockRegistry, BlockSampler, BlockShape, CHUNK_SIZE, ChunkCoord, Cursor};

use crate::ambient_occlusion::face_ao;
use crate::chunk_mesh::ChunkMesh;
use crate::face_direction::FaceDirection;
use crate::merge_layer::{PendingFace, SideLayers, flush, merge_row, merge_vertical};
use crate::packed::MeshData;
use crate::quad::{Lowering, Quad};

const N: usize = CHUNK_SIZE;

/// Previous/current row of pending faces for in-layer merging.
struct RowPair {
    previous: Vec<PendingFace>,
    current: Vec<PendingFace>,
}

impl RowPair {
    fn new() -> Self {
        Self {
            previous: vec![PendingFace::EMPTY; N],
            current: vec![PendingFace::EMPTY; N],
        }
    }

    /// Merges the row just filled into the open runs and makes it the
    /// previous row.
    fn advance(&mut self, emit: impl FnMut(usize, PendingFace)) {
        merge_row(&mut self.current);
        merge_vertical(&mut self.previous, &mut self.current, emit);
        std::mem::swap(&mut self.previous, &mut self.current);
    }

    /// Emits the runs still open at the end of a layer.
    fn finish(&mut self, emit: impl FnMut(usize, PendingFace)) {
        flush(&mut self.previous, emit);
    }

    fn clear(&mut self) {
        self.previous.fill(PendingFace::EMPTY);
        self.current.fill(PendingFace::EMPTY);
    }
}

#[derive(Clone, Copy)]
struct FoliageCell {
    h: u8,
    x: u8,
    y: u8,
    texture: u8,
}

/// Working memory for one mesher.
///
/// Buffers are cleared, never reallocated, between calls. A scratch arena
/// must not be shared by concurrent mesh calls.
pub struct MeshScratch {
    sides_previous: SideLayers,
    sides_current: SideLayers,
    up: RowPair,
    down: RowPair,
    liquid: RowPair,
    foliage: Vec<FoliageCell>,
    solid: Vec<Quad>,
    water: Vec<Quad>,
}

impl MeshScratch {
    pub fn new() -> Self {
        Self {
            sides_previous: SideLayers::new(),
            sides_current: SideLayers::new(),
            up: RowPair::new(),
            down: RowPair::new(),
            liquid: RowPair::new(),
            foliage: Vec::new(),
            solid: Vec::new(),
            water: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.sides_previous.clear();
        self.sides_current.clear();
        self.up.clear();
        self.down.clear();
        self.liquid.clear();
        self.foliage.clear();
        self.solid.clear();
        self.water.clear();
    }
}

impl Default for MeshScratch {
    fn default() -> Self {
        Self::new()
    }
}

/// A quad for an up, down or liquid-surface run.
fn flat_quad(direction: FaceDirection, h: usize, x: usize, y: usize, face: PendingFace, lowering: Lowering) -> Quad {
    Quad {
        direction,
        h: h as u8,
        x: x as u8,
        y: y as u8,
        width: face.width() as u8,
        height: face.height() as u8,
        texture: face.texture(),
        ao: face.ao(),
        lowering,
        reversed: false,
    }
}

/// A quad for a side run found at flat index `index` of a [`SideLayers`].
fn side_quad(index: usize, face: PendingFace, h: usize) -> Quad {
    let (plane, a, b) = SideLayers::locate(index);
    let direction = FaceDirection::SIDES[plane];
    let (x, y) = direction.from_layer_cell(a, b);
    Quad {
        direction,
        h: h as u8,
        x: x as u8,
        y: y as u8,
        width: face.width() as u8,
        height: face.height() as u8,
        texture: face.texture(),
        ao: face.ao(),
        lowering: Lowering::None,
        reversed: false,
    }
}

/// Turns chunk block data into merged quads.
///
/// Holds its own scratch arena, so meshing takes `&mut self`; run one
/// mesher per thread for parallel meshing.
pub struct ChunkMesher {
    registry: Arc<BlockRegistry>,
    scratch: MeshScratch,
}

impl ChunkMesher {
    pub fn new(registry: Arc<BlockRegistry>) -> Self {
        Self {
            registry,
            scratch: MeshScratch::new(),
        }
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// Meshes the chunk seen through `sampler` and packs it for upload.
    pub fn mesh<S: BlockSampler + ?Sized>(&mut self, coord: ChunkCoord, sampler: &S) -> MeshData {
        self.mesh_quads(sampler).to_mesh_data(coord.world_translation())
    }

    /// Meshes the chunk seen through `sampler` into struct-form quads.
    ///
    /// `sampler` must answer for local coordinates one cell beyond the chunk
    /// on every side.
    pub fn mesh_quads<S: BlockSampler + ?Sized>(&mut self, sampler: &S) -> ChunkMesh {
        self.scratch.reset();
        let registry = &*self.registry;
        let MeshScratch {
            sides_previous,
            sides_current,
            up,
            down,
            liquid,
            foliage,
            solid,
            water,
        } = &mut self.scratch;

        let mut cursor = Cursor::new(sampler);
        for h in 0..N {
            for y in 0..N {
                for x in 0..N {
                    cursor.set_position(h as i32, x as i32, y as i32);
                    let id = cursor.get(0, 0, 0);
                    if id.is_empty() {
                        continue;
                    }
                    debug_assert!(
                        registry.is_registered(id),
                        "unregistered block id {} at ({h}, {x}, {y})",
                        id.0
                    );
                    let Some(def) = registry.get(id) else {
                        continue;
                    };

                    match def.shape {
                        BlockShape::Cross => foliage.push(FoliageCell {
                            h: h as u8,
                            x: x as u8,
                            y: y as u8,
                            texture: def.texture(FaceDirection::Front.index()),
                        }),
                        BlockShape::Liquid => {
                            let above = cursor.get(1, 0, 0);
                            if !registry.is_solid(above) && !registry.is_liquid(above) {
                                let texture = def.texture(FaceDirection::Up.index());
                                liquid.current[x] = PendingFace::new(texture, [0; 4]);
                            }
                        }
                        BlockShape::Cube => {
                            for direction in FaceDirection::CUBE {
                                let (dh, dx, dy) = direction.offset();
                                if registry.is_solid(cursor.get(dh, dx, dy)) {
                                    continue;
                                }
                                let face = PendingFace::new(
                                    def.texture(direction.index()),
                                    face_ao(&cursor, direction, registry),
                                );
                                match direction {
                                    FaceDirection::Up => up.current[x] = face,
                                    FaceDirection::Down => down.current[x] = face,
                                    side => {
                                        if let Some(plane) = side.side_plane() {
                                            let (a, b) = side.to_layer_cell(x, y);
                                            sides_current.set(plane, a, b, face);
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                // Runs closed by this row started `height` rows back.
                up.advance(|i, f| {
                    let start = y - f.height() as usize;
                    solid.push(flat_quad(FaceDirection::Up, h, i, start, f, Lowering::None));
                });
                // Down quads grow toward -y, so their origin is the last row of the run.
                down.advance(|i, f| {
                    solid.push(flat_quad(FaceDirection::Down, h, i, y - 1, f, Lowering::None));
                });
                liquid.advance(|i, f| {
                    let start = y - f.height() as usize;
                    water.push(flat_quad(FaceDirection::Up, h, i, start, f, Lowering::LiquidSurface));
                });
            }

            up.finish(|i, f| {
                let start = N - f.height() as usize;
                solid.push(flat_quad(FaceDirection::Up, h, i, start, f, Lowering::None));
            });
            down.finish(|i, f| {
                solid.push(flat_quad(FaceDirection::Down, h, i, N - 1, f, Lowering::None));
            });
            liquid.finish(|i, f| {
                let start = N - f.height() as usize;
                water.push(flat_quad(FaceDirection::Up, h, i, start, f, Lowering::LiquidSurface));
            });

            sides_current.merge_rows();
            merge_vertical(sides_previous.as_mut_slice(), sides_current.as_mut_slice(), |i, f| {
                solid.push(side_quad(i, f, h - f.height() as usize));
            });
            std::mem::swap(sides_previous, sides_current);
        }

        flush(sides_previous.as_mut_slice(), |i, f| {
            solid.push(side_quad(i, f, N - f.height() as usize));
        });

        for cell in foliage.drain(..) {
            for (direction, reversed) in [
                (FaceDirection::Diagonal0, false),
                (FaceDirection::Diagonal0, true),
                (FaceDirection::Diagonal1, false),
                (FaceDirection::Diagonal1, true),
            ] {
                solid.push(Quad::foliage(direction, cell.h, cell.x, cell.y, cell.texture, reversed));
            }
        }

        let mesh = ChunkMesh::from_parts(&solid[..], &water[..]);
        solid.clear();
        water.clear();
        mesh
    }
}
