//! Face directions of the mesher: six cube faces plus the two diagonals of
//! crossed foliage quads.
//!
//! Cell offsets are `(dh, dx, dy)`, matching the chunk's `(h, x, y)` indexing.
//! Quad geometry tables are `(x, y, h)`, matching the packed vertex position.

use tessel_voxel::CHUNK_SIZE;

/// Direction a quad faces.
///
/// The discriminant is written into every packed vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum FaceDirection {
    /// +h.
    Up = 0,
    /// −y.
    Front = 1,
    /// −x.
    Left = 2,
    /// +y.
    Back = 3,
    /// +x.
    Right = 4,
    /// −h.
    Down = 5,
    /// Foliage quad through the `(0,0)`–`(1,1)` diagonal of the cell.
    Diagonal0 = 6,
    /// Foliage quad through the `(0,1)`–`(1,0)` diagonal of the cell.
    Diagonal1 = 7,
}

/// `(dh, dx, dy)` cell offset.
pub type CellOffset = (i32, i32, i32);

const N: usize = CHUNK_SIZE;

impl FaceDirection {
    /// The six cube faces in texture order.
    pub const CUBE: [FaceDirection; 6] = [
        Self::Up,
        Self::Front,
        Self::Left,
        Self::Back,
        Self::Right,
        Self::Down,
    ];

    /// The four side faces, in merge-plane order.
    pub const SIDES: [FaceDirection; 4] = [Self::Front, Self::Left, Self::Back, Self::Right];

    pub const ALL: [FaceDirection; 8] = [
        Self::Up,
        Self::Front,
        Self::Left,
        Self::Back,
        Self::Right,
        Self::Down,
        Self::Diagonal0,
        Self::Diagonal1,
    ];

    /// Direction index (0–7). For cube faces this is also the texture slot.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn is_side(self) -> bool {
        matches!(self, Self::Front | Self::Left | Self::Back | Self::Right)
    }

    pub fn is_diagonal(self) -> bool {
        matches!(self, Self::Diagonal0 | Self::Diagonal1)
    }

    /// Offset of the cell whose solidity decides whether this face is visible.
    /// Diagonals have no neighbor.
    pub fn offset(self) -> CellOffset {
        match self {
            Self::Up => (1, 0, 0),
            Self::Front => (0, 0, -1),
            Self::Left => (0, -1, 0),
            Self::Back => (0, 0, 1),
            Self::Right => (0, 1, 0),
            Self::Down => (-1, 0, 0),
            Self::Diagonal0 | Self::Diagonal1 => (0, 0, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Front => Self::Back,
            Self::Back => Self::Front,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Diagonal0 => Self::Diagonal0,
            Self::Diagonal1 => Self::Diagonal1,
        }
    }

    /// Occlusion sampling frame `(normal, u, v)`.
    ///
    /// Corner neighbors of a face sit at `normal + a*u + b*v` with
    /// `a, b ∈ {-1, 0, 1}`. `u` runs along the quad width and `v` along its
    /// height, so AO corner `k` lands on quad vertex `k`.
    pub fn ao_frame(self) -> (CellOffset, CellOffset, CellOffset) {
        match self {
            Self::Up => ((1, 0, 0), (0, 1, 0), (0, 0, 1)),
            Self::Down => ((-1, 0, 0), (0, 1, 0), (0, 0, -1)),
            Self::Front => ((0, 0, -1), (0, 1, 0), (1, 0, 0)),
            Self::Left => ((0, -1, 0), (0, 0, -1), (1, 0, 0)),
            Self::Back => ((0, 0, 1), (0, -1, 0), (1, 0, 0)),
            Self::Right => ((0, 1, 0), (0, 0, 1), (1, 0, 0)),
            Self::Diagonal0 | Self::Diagonal1 => ((0, 0, 0), (0, 0, 0), (0, 0, 0)),
        }
    }

    /// Corner of the origin cell where vertex 0 of the quad sits, `(x, y, h)`.
    pub fn vertex_origin(self) -> [i32; 3] {
        match self {
            Self::Up => [0, 0, 1],
            Self::Front => [0, 0, 0],
            Self::Left => [0, 1, 0],
            Self::Back => [1, 1, 0],
            Self::Right => [1, 0, 0],
            Self::Down => [0, 1, 0],
            Self::Diagonal0 => [0, 0, 0],
            Self::Diagonal1 => [0, 1, 0],
        }
    }

    /// Step along the quad width, `(x, y, h)`.
    pub fn width_axis(self) -> [i32; 3] {
        match self {
            Self::Up | Self::Front | Self::Down => [1, 0, 0],
            Self::Left => [0, -1, 0],
            Self::Back => [-1, 0, 0],
            Self::Right => [0, 1, 0],
            Self::Diagonal0 => [1, 1, 0],
            Self::Diagonal1 => [1, -1, 0],
        }
    }

    /// Step along the quad height, `(x, y, h)`.
    pub fn height_axis(self) -> [i32; 3] {
        match self {
            Self::Up => [0, 1, 0],
            Self::Down => [0, -1, 0],
            _ => [0, 0, 1],
        }
    }

    /// Merge-plane index of a side face (0–3).
    #[inline]
    pub fn side_plane(self) -> Option<usize> {
        self.is_side().then(|| self.index() - 1)
    }

    /// Maps a block column `(x, y)` to its cell `(a, b)` in this side's merge
    /// plane. `a` always increases along the quad width, so row merging runs
    /// along `a` and `b` selects the face plane.
    #[inline]
    pub fn to_layer_cell(self, x: usize, y: usize) -> (usize, usize) {
        match self {
            Self::Front => (x, y),
            Self::Left => (N - 1 - y, x),
            Self::Back => (N - 1 - x, N - 1 - y),
            Self::Right => (y, N - 1 - x),
            _ => (x, y),
        }
    }

    /// Inverse of [`to_layer_cell`](Self::to_layer_cell).
    #[inline]
    pub fn from_layer_cell(self, a: usize, b: usize) -> (usize, usize) {
        match self {
            Self::Front => (a, b),
            Self::Left => (b, N - 1 - a),
            Self::Back => (N - 1 - a, N - 1 - b),
            Self::Right => (N - 1 - b, a),
            _ => (a, b),
        }
    }
}
